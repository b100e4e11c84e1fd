//! Token scanner for template strings.
//!
//! Recognises the subset of tera syntax templates are allowed to use:
//!
//! | Syntax                              | Meaning                              |
//! |-------------------------------------|--------------------------------------|
//! | `{{ name }}`, `{{ name \| filter }}`| variable substitution                |
//! | `{% if name == "x" %}` / `!=`       | equality conditional                 |
//! | `{% if name %}`, `{% if not name %}`| truthiness conditional               |
//! | `{% elif … %}`, `{% else %}`, `{% endif %}` | rest of the conditional block |
//! | `{% raw %}…{% endraw %}`            | verbatim block                       |
//! | `{# … #}`                           | comment                              |
//!
//! Trim markers (`{{-`, `-}}`, `{%-`, `-%}`) are accepted everywhere. The
//! scanner only validates and extracts references; evaluation is left to tera.

use std::fmt;

use scaffold_core::manifest::is_identifier;

/// Comparison operator of an `if` / `elif` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// Parsed `if` / `elif` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Truthy(String),
    Falsy(String),
    Compare {
        name: String,
        op: CompareOp,
        literal: String,
    },
}

impl Condition {
    pub fn variable(&self) -> &str {
        match self {
            Condition::Truthy(name) | Condition::Falsy(name) => name,
            Condition::Compare { name, .. } => name,
        }
    }
}

/// Kind of a `{% … %}` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    If(Condition),
    Elif(Condition),
    Else,
    EndIf,
}

/// One lexical unit of a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// Body of a `{% raw %}` block.
    Raw(&'a str),
    Variable {
        name: String,
        line: usize,
        column: usize,
    },
    Tag {
        kind: TagKind,
        line: usize,
        column: usize,
    },
    Comment,
}

/// A variable referenced by a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenErrorKind {
    Unclosed { delimiter: &'static str },
    EmptyExpression,
    InvalidExpression(String),
    InvalidCondition(String),
    UnsupportedTag(String),
    UnexpectedTag(String),
    UnbalancedBlock(&'static str),
}

/// Malformed token, positioned at its opening delimiter (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    pub kind: TokenErrorKind,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenErrorKind::Unclosed { delimiter } => {
                write!(f, "unclosed `{delimiter}`")
            }
            TokenErrorKind::EmptyExpression => write!(f, "empty `{{{{ }}}}` expression"),
            TokenErrorKind::InvalidExpression(expr) => {
                write!(f, "expression `{expr}` is not a variable reference")
            }
            TokenErrorKind::InvalidCondition(cond) => {
                write!(f, "unsupported condition `{cond}`")
            }
            TokenErrorKind::UnsupportedTag(tag) => write!(f, "unsupported tag `{tag}`"),
            TokenErrorKind::UnexpectedTag(tag) => write!(f, "`{tag}` without matching opener"),
            TokenErrorKind::UnbalancedBlock(tag) => write!(f, "`{tag}` block is never closed"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Split `source` into tokens, validating delimiters and block structure.
pub fn scan(source: &str) -> Result<Vec<Token<'_>>, TokenError> {
    Scanner::new(source).run()
}

/// All variables referenced by `source`, in source order (duplicates kept).
pub fn references(source: &str) -> Result<Vec<Reference>, TokenError> {
    let mut refs = Vec::new();
    for token in scan(source)? {
        match token {
            Token::Variable { name, line, column } => refs.push(Reference { name, line, column }),
            Token::Tag {
                kind: TagKind::If(cond) | TagKind::Elif(cond),
                line,
                column,
            } => refs.push(Reference {
                name: cond.variable().to_string(),
                line,
                column,
            }),
            _ => {}
        }
    }
    Ok(refs)
}

/// Whether `source` contains any template syntax at all.
pub fn has_tokens(source: &str) -> bool {
    source.contains("{{") || source.contains("{%") || source.contains("{#")
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct OpenIf {
    line: usize,
    column: usize,
    seen_else: bool,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token<'a>>,
    open_ifs: Vec<OpenIf>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            tokens: Vec::new(),
            open_ifs: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, TokenError> {
        let src = self.src;
        while let Some(start) = next_opener(src, self.pos) {
            if start > self.pos {
                self.tokens.push(Token::Text(&src[self.pos..start]));
            }
            match &src[start..start + 2] {
                "{{" => self.variable(start)?,
                "{%" => self.tag(start)?,
                _ => self.comment(start)?,
            }
        }
        if self.pos < src.len() {
            self.tokens.push(Token::Text(&src[self.pos..]));
        }
        if let Some(open) = self.open_ifs.first() {
            return Err(TokenError {
                kind: TokenErrorKind::UnbalancedBlock("if"),
                line: open.line,
                column: open.column,
            });
        }
        Ok(self.tokens)
    }

    fn err(&self, offset: usize, kind: TokenErrorKind) -> TokenError {
        let (line, column) = line_column(self.src, offset);
        TokenError { kind, line, column }
    }

    /// Returns the trimmed inner text and moves past the closing delimiter.
    fn delimited(
        &mut self,
        start: usize,
        open: &'static str,
        close: &str,
    ) -> Result<&'a str, TokenError> {
        let src = self.src;
        let body_start = start + 2;
        let Some(rel_end) = src[body_start..].find(close) else {
            return Err(self.err(start, TokenErrorKind::Unclosed { delimiter: open }));
        };
        let inner = &src[body_start..body_start + rel_end];
        self.pos = body_start + rel_end + close.len();
        Ok(strip_trim_markers(inner))
    }

    fn variable(&mut self, start: usize) -> Result<(), TokenError> {
        let inner = self.delimited(start, "{{", "}}")?;
        if inner.is_empty() {
            return Err(self.err(start, TokenErrorKind::EmptyExpression));
        }
        let name = parse_expression(inner)
            .ok_or_else(|| self.err(start, TokenErrorKind::InvalidExpression(inner.to_string())))?;
        let (line, column) = line_column(self.src, start);
        self.tokens.push(Token::Variable {
            name: name.to_string(),
            line,
            column,
        });
        Ok(())
    }

    fn comment(&mut self, start: usize) -> Result<(), TokenError> {
        self.delimited(start, "{#", "#}")?;
        self.tokens.push(Token::Comment);
        Ok(())
    }

    fn tag(&mut self, start: usize) -> Result<(), TokenError> {
        let inner = self.delimited(start, "{%", "%}")?;
        let (keyword, rest) = match inner.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (inner, ""),
        };
        let (line, column) = line_column(self.src, start);

        let kind = match keyword {
            "if" => {
                let cond = self.condition(start, rest)?;
                self.open_ifs.push(OpenIf {
                    line,
                    column,
                    seen_else: false,
                });
                TagKind::If(cond)
            }
            "elif" => {
                match self.open_ifs.last() {
                    Some(open) if !open.seen_else => {}
                    _ => return Err(self.err(start, TokenErrorKind::UnexpectedTag("elif".into()))),
                }
                TagKind::Elif(self.condition(start, rest)?)
            }
            "else" => {
                let open_without_else = self.open_ifs.last().is_some_and(|open| !open.seen_else);
                if !open_without_else || !rest.is_empty() {
                    return Err(self.err(start, TokenErrorKind::UnexpectedTag("else".into())));
                }
                if let Some(open) = self.open_ifs.last_mut() {
                    open.seen_else = true;
                }
                TagKind::Else
            }
            "endif" => {
                if self.open_ifs.pop().is_none() || !rest.is_empty() {
                    return Err(self.err(start, TokenErrorKind::UnexpectedTag("endif".into())));
                }
                TagKind::EndIf
            }
            "raw" => return self.raw(start),
            "endraw" => {
                return Err(self.err(start, TokenErrorKind::UnexpectedTag("endraw".into())))
            }
            other => {
                return Err(self.err(start, TokenErrorKind::UnsupportedTag(other.to_string())))
            }
        };
        self.tokens.push(Token::Tag { kind, line, column });
        Ok(())
    }

    fn raw(&mut self, start: usize) -> Result<(), TokenError> {
        let src = self.src;
        let body_start = self.pos;
        let mut search = body_start;
        while let Some(rel) = src[search..].find("{%") {
            let tag_start = search + rel;
            let Some(rel_end) = src[tag_start + 2..].find("%}") else {
                break;
            };
            let inner = strip_trim_markers(&src[tag_start + 2..tag_start + 2 + rel_end]);
            if inner == "endraw" {
                self.tokens.push(Token::Raw(&src[body_start..tag_start]));
                self.pos = tag_start + 2 + rel_end + 2;
                return Ok(());
            }
            search = tag_start + 2;
        }
        Err(self.err(start, TokenErrorKind::UnbalancedBlock("raw")))
    }

    fn condition(&self, start: usize, text: &str) -> Result<Condition, TokenError> {
        parse_condition(text)
            .ok_or_else(|| self.err(start, TokenErrorKind::InvalidCondition(text.to_string())))
    }
}

fn next_opener(src: &str, from: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && matches!(bytes[i + 1], b'{' | b'%' | b'#') {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn strip_trim_markers(inner: &str) -> &str {
    let inner = inner.strip_prefix('-').unwrap_or(inner);
    let inner = inner.strip_suffix('-').unwrap_or(inner);
    inner.trim()
}

/// `name ( | filter [ ( key = literal, … ) ] )*`
///
/// Filter arguments must be literals, so the leading name is the only
/// variable an expression can reference.
fn parse_expression(expr: &str) -> Option<&str> {
    let (name, mut rest) = split_identifier(expr)?;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Some(name);
        }
        let (_filter, after) = split_identifier(rest.strip_prefix('|')?.trim_start())?;
        rest = after.trim_start();
        if let Some(args) = rest.strip_prefix('(') {
            rest = skip_filter_args(args)?;
        }
    }
}

fn split_identifier(text: &str) -> Option<(&str, &str)> {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let (name, rest) = text.split_at(end);
    is_identifier(name).then_some((name, rest))
}

/// Consume `key = literal, …)` and return what follows the `)`.
fn skip_filter_args(text: &str) -> Option<&str> {
    let mut rest = text.trim_start();
    if let Some(after) = rest.strip_prefix(')') {
        return Some(after);
    }
    loop {
        let (_key, after) = split_identifier(rest)?;
        rest = after.trim_start().strip_prefix('=')?.trim_start();
        rest = skip_literal(rest)?.trim_start();
        if let Some(after) = rest.strip_prefix(')') {
            return Some(after);
        }
        rest = rest.strip_prefix(',')?.trim_start();
    }
}

/// String, number or boolean literal at the start of `text`.
fn skip_literal(text: &str) -> Option<&str> {
    let first = text.chars().next()?;
    if matches!(first, '"' | '\'' | '`') {
        let body = &text[1..];
        let close = body.find(first)?;
        return Some(&body[close + 1..]);
    }
    if first.is_ascii_digit() || first == '-' {
        let digits = text[1..]
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .map_or(text.len(), |i| i + 1);
        if digits == 1 && first == '-' {
            return None;
        }
        return Some(&text[digits..]);
    }
    let (word, after) = split_identifier(text)?;
    matches!(word, "true" | "false").then_some(after)
}

fn parse_condition(text: &str) -> Option<Condition> {
    if let Some(name) = text.strip_prefix("not ") {
        let name = name.trim();
        return is_identifier(name).then(|| Condition::Falsy(name.to_string()));
    }

    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let (name, rest) = text.split_at(end);
    if !is_identifier(name) {
        return None;
    }
    let rest = rest.trim();
    if rest.is_empty() {
        return Some(Condition::Truthy(name.to_string()));
    }

    let (op, literal) = if let Some(lit) = rest.strip_prefix("==") {
        (CompareOp::Eq, lit.trim())
    } else if let Some(lit) = rest.strip_prefix("!=") {
        (CompareOp::Ne, lit.trim())
    } else {
        return None;
    };
    let literal = parse_string_literal(literal)?;
    Some(Condition::Compare {
        name: name.to_string(),
        op,
        literal: literal.to_string(),
    })
}

fn parse_string_literal(text: &str) -> Option<&str> {
    let quote = text.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let body = text.strip_prefix(quote)?.strip_suffix(quote)?;
    (!body.contains(quote)).then_some(body)
}

/// 1-based line and column (in chars) of byte `offset`.
fn line_column(src: &str, offset: usize) -> (usize, usize) {
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = src[line_start..offset].chars().count() + 1;
    (line, column)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn names(src: &str) -> Vec<String> {
        references(src)
            .expect("scan")
            .into_iter()
            .map(|r| r.name)
            .collect()
    }

    fn error_kind(src: &str) -> TokenErrorKind {
        scan(src).expect_err("should fail").kind
    }

    #[test]
    fn plain_text_is_one_token() {
        let tokens = scan("no tokens here").unwrap();
        assert_eq!(tokens, vec![Token::Text("no tokens here")]);
    }

    #[test]
    fn variable_references_in_order() {
        assert_eq!(
            names("# {{ project_name }} by {{author}} ({{ project_name }})"),
            vec!["project_name", "author", "project_name"]
        );
    }

    #[test]
    fn filters_and_trim_markers_are_accepted() {
        assert_eq!(
            names("{{- project_name | slugify | replace(from=\"-\", to=\"_\") -}}"),
            vec!["project_name"]
        );
    }

    #[test]
    fn conditions_reference_their_variable() {
        let src = "{% if license != \"None\" %}badge{% elif author %}x{% else %}y{% endif %}";
        assert_eq!(names(src), vec!["license", "author"]);
    }

    #[test]
    fn single_braces_and_stray_closers_are_text() {
        let src = "shell: \"bwa mem {input.ref} > {output}\"  }} %}";
        assert!(names(src).is_empty());
    }

    #[test]
    fn raw_block_hides_tokens() {
        let src = "{% raw %}awk '{{print $1}}' {{ nope }}{% endraw %} {{ author }}";
        let tokens = scan(src).unwrap();
        assert!(tokens.contains(&Token::Raw("awk '{{print $1}}' {{ nope }}")));
        assert_eq!(names(src), vec!["author"]);
    }

    #[test]
    fn comments_are_skipped() {
        assert!(names("{# {{ hidden }} #}text").is_empty());
    }

    #[test]
    fn unclosed_variable_reports_position() {
        let err = scan("line one\n  {{ project_name ").unwrap_err();
        assert_eq!(err.kind, TokenErrorKind::Unclosed { delimiter: "{{" });
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn unclosed_tag_and_comment() {
        assert_eq!(error_kind("{% if x"), TokenErrorKind::Unclosed { delimiter: "{%" });
        assert_eq!(error_kind("{# note"), TokenErrorKind::Unclosed { delimiter: "{#" });
    }

    #[test]
    fn empty_and_invalid_expressions() {
        assert_eq!(error_kind("{{ }}"), TokenErrorKind::EmptyExpression);
        assert!(matches!(error_kind("{{ 1 + 2 }}"), TokenErrorKind::InvalidExpression(_)));
        assert!(matches!(error_kind("{{ a b }}"), TokenErrorKind::InvalidExpression(_)));
        assert!(matches!(error_kind("{{ a | }}"), TokenErrorKind::InvalidExpression(_)));
    }

    #[test]
    fn filter_arguments_must_be_literals() {
        assert_eq!(
            names("{{ license | replace(from='-', to=\"--\") | truncate(length=10, end=``) }}"),
            vec!["license"]
        );
        assert_eq!(names("{{ a | round(precision=-2) | default(value=true) }}"), vec!["a"]);
        assert!(matches!(
            error_kind("{{ author | replace(from=\"a\", to=other) }}"),
            TokenErrorKind::InvalidExpression(_)
        ));
        assert!(matches!(
            error_kind("{{ author | replace(from=\"a\" to=\"b\") }}"),
            TokenErrorKind::InvalidExpression(_)
        ));
        assert!(matches!(
            error_kind("{{ author | replace(from=\"a\""),
            TokenErrorKind::Unclosed { .. } | TokenErrorKind::InvalidExpression(_)
        ));
    }

    #[test]
    fn trailing_syntax_after_filters_is_rejected() {
        let err = scan("x\n {{ author | upper ~ other }}").unwrap_err();
        assert!(matches!(err.kind, TokenErrorKind::InvalidExpression(_)));
        assert_eq!((err.line, err.column), (2, 2));
    }

    #[test]
    fn unsupported_tags_are_rejected() {
        assert_eq!(
            error_kind("{% for s in samples %}{% endfor %}"),
            TokenErrorKind::UnsupportedTag("for".into())
        );
        assert_eq!(
            error_kind("{% include \"x\" %}"),
            TokenErrorKind::UnsupportedTag("include".into())
        );
    }

    #[test]
    fn unsupported_conditions_are_rejected() {
        assert!(matches!(error_kind("{% if a > 1 %}{% endif %}"), TokenErrorKind::InvalidCondition(_)));
        assert!(matches!(error_kind("{% if a == b %}{% endif %}"), TokenErrorKind::InvalidCondition(_)));
        assert!(matches!(error_kind("{% if a == \"x' %}{% endif %}"), TokenErrorKind::InvalidCondition(_)));
    }

    #[test]
    fn unbalanced_blocks() {
        assert_eq!(error_kind("{% if a %}open"), TokenErrorKind::UnbalancedBlock("if"));
        assert_eq!(error_kind("{% endif %}"), TokenErrorKind::UnexpectedTag("endif".into()));
        assert_eq!(error_kind("{% else %}"), TokenErrorKind::UnexpectedTag("else".into()));
        assert_eq!(
            error_kind("{% if a %}{% else %}{% elif b %}{% endif %}"),
            TokenErrorKind::UnexpectedTag("elif".into())
        );
        assert_eq!(error_kind("{% raw %}never closed"), TokenErrorKind::UnbalancedBlock("raw"));
        assert_eq!(error_kind("{% endraw %}"), TokenErrorKind::UnexpectedTag("endraw".into()));
    }

    #[test]
    fn nested_ifs_balance() {
        let src = "{% if a %}{% if not b %}x{% endif %}{% endif %}";
        assert_eq!(names(src), vec!["a", "b"]);
    }

    #[test]
    fn unbalanced_if_points_at_opener() {
        let err = scan("ok\n{% if a %}{% if b %}{% endif %}").unwrap_err();
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn has_tokens_detects_any_opener() {
        assert!(has_tokens("{{ a }}"));
        assert!(has_tokens("{% raw %}"));
        assert!(!has_tokens("{sample}.bam"));
    }
}
