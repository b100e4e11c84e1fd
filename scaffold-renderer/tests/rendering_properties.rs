use std::collections::BTreeMap;
use std::path::Path;

use rstest::rstest;
use scaffold_renderer::{
    resolve_variables, OutputTree, RenderError, Renderer, Template, TemplateVariables,
};
use tempfile::TempDir;

fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn builtin_vars(license: &str) -> TemplateVariables {
    let template = Template::builtin().expect("builtin");
    resolve_variables(
        &template.manifest,
        &[overrides(&[
            ("project_name", "Tumour Evolution"),
            ("author", "Rosalind Franklin"),
            ("github_username", "rfranklin"),
            ("license", license),
        ])],
    )
    .expect("resolve")
}

fn render_builtin(license: &str) -> OutputTree {
    let renderer = Renderer::new(Template::builtin().expect("builtin")).expect("renderer");
    renderer.render(&builtin_vars(license)).expect("render")
}

fn text<'a>(tree: &'a OutputTree, path: &str) -> &'a str {
    tree.get(path)
        .and_then(|f| f.as_text())
        .unwrap_or_else(|| panic!("{path} missing from output"))
}

#[test]
fn builtin_defaults_derive_package_and_url() {
    let vars = builtin_vars("MIT");
    assert_eq!(vars.get("package_name"), Some("tumour_evolution"));
    assert_eq!(
        vars.get("project_url"),
        Some("https://github.com/rfranklin/tumour_evolution")
    );
}

#[test]
fn rendering_is_idempotent() {
    let renderer = Renderer::new(Template::builtin().unwrap()).unwrap();
    let vars = builtin_vars("Apache-2.0");
    let first = renderer.render(&vars).expect("render #1");
    let second = renderer.render(&vars).expect("render #2");
    assert_eq!(first, second);
}

#[rstest]
#[case("MIT")]
#[case("BSD-3-Clause")]
#[case("Apache-2.0")]
#[case("GPL-3.0-only")]
#[case("None")]
fn rendering_is_total(#[case] license: &str) {
    let tree = render_builtin(license);
    assert!(!tree.is_empty());
    for (path, file) in tree.iter() {
        let shown = path.to_string_lossy();
        assert!(!shown.contains("{{") && !shown.contains("{%"), "residual token in path {shown}");
        if shown.starts_with("workflow/scripts/") {
            continue;
        }
        if let Some(content) = file.as_text() {
            for opener in ["{{", "{%", "{#"] {
                assert!(
                    !content.contains(opener),
                    "residual `{opener}` in {shown} (license {license})"
                );
            }
        }
    }
}

#[test]
fn verbatim_scripts_keep_their_braces() {
    let tree = render_builtin("MIT");
    let script = text(&tree, "workflow/scripts/summarize_flagstat.py");
    assert!(script.contains("{{total:"));
}

#[rstest]
#[case("MIT", "MIT License")]
#[case("BSD-3-Clause", "BSD 3-Clause License")]
#[case("Apache-2.0", "Apache License, Version 2.0")]
#[case("GPL-3.0-only", "GNU General Public License")]
fn concrete_license_includes_file_and_badge(#[case] license: &str, #[case] marker: &str) {
    let tree = render_builtin(license);
    let readme = text(&tree, "README.md");
    assert!(readme.contains("img.shields.io/badge/License-"), "badge missing:\n{readme}");
    let body = text(&tree, "LICENSE");
    assert!(body.contains(marker), "LICENSE for {license} lacks '{marker}':\n{body}");
    assert!(body.contains("Rosalind Franklin"));
    assert!(text(&tree, "pyproject.toml").contains(&format!("license = {{ text = \"{license}\" }}")));
}

#[test]
fn license_none_omits_badge_and_file() {
    let tree = render_builtin("None");
    assert!(tree.get("LICENSE").is_none());
    let readme = text(&tree, "README.md");
    assert!(!readme.contains("img.shields.io"));
    assert!(readme.starts_with("# Tumour Evolution\n\nAnalysis repository"), "got:\n{readme}");
    assert!(!text(&tree, "pyproject.toml").contains("license ="));
}

#[test]
fn package_name_substitutes_into_paths() {
    let tree = render_builtin("MIT");
    assert!(tree.get("src/tumour_evolution/__init__.py").is_some());
    assert!(tree.get("src/tumour_evolution/samples.py").is_some());
    assert!(tree.get("tests/test_tumour_evolution.py").is_some());
    assert!(text(&tree, "tests/test_tumour_evolution.py")
        .contains("from tumour_evolution.samples import"));
}

#[test]
fn generated_tasks_are_all_present() {
    let tree = render_builtin("MIT");
    let pyproject = text(&tree, "pyproject.toml");
    for task in [
        "setup-dirs", "pipeline-dry", "pipeline", "pipeline-slurm", "clean", "fmt", "lint",
        "types", "test", "snkfmt", "all",
    ] {
        assert!(pyproject.contains(&format!("\n{task} = ")), "task {task} missing");
    }
}

#[test]
fn snakemake_wildcards_survive_rendering() {
    let tree = render_builtin("MIT");
    let rules = text(&tree, "workflow/rules/align.smk");
    assert!(rules.contains("\"results/aligned/{sample}.sorted.bam\""));
    assert!(rules.contains("{params.read_group}"));
}

#[test]
fn coverage_uses_a_checkpoint_with_aggregation() {
    let tree = render_builtin("MIT");
    let snakefile = text(&tree, "workflow/Snakefile");
    assert!(snakefile.contains("include: \"rules/coverage.smk\""));
    assert!(snakefile.contains("results/coverage/{sample}.mean_depth.tsv"));

    let coverage = text(&tree, "workflow/rules/coverage.smk");
    assert!(coverage.contains("checkpoint split_contigs:"));
    assert!(coverage.contains("directory(\"results/coverage/{sample}/contigs\")"));
    assert!(coverage.contains("        aggregate_depth,"));

    let common = text(&tree, "workflow/rules/common.smk");
    assert!(common.contains("checkpoints.split_contigs.get(sample=wildcards.sample)"));
    assert!(common.contains("glob_wildcards(os.path.join(contigs_dir, \"{contig}.bed\"))"));
    assert!(text(&tree, "workflow/scripts/mean_depth.py").contains("{{positions:"));
}

#[test]
fn heavy_rules_declare_resources() {
    let tree = render_builtin("MIT");
    let align = text(&tree, "workflow/rules/align.smk");
    assert!(align.contains("mem_mb=config[\"align\"][\"mem_mb\"]"));
    assert!(align.contains("runtime=config[\"align\"][\"runtime\"]"));
    assert!(text(&tree, "config/config.yaml").contains("mem_mb: 16000"));
    assert!(text(&tree, "schemas/config.schema.yaml").contains("runtime:"));
}

#[test]
fn execution_profiles_cover_local_and_cluster() {
    let tree = render_builtin("MIT");
    let local = text(&tree, "workflow/profiles/default/config.yaml");
    assert!(local.starts_with("# Local execution profile for Tumour Evolution."));
    assert!(local.contains("executor: local"));
    assert!(local.contains("default-resources:"));

    let slurm = text(&tree, "workflow/profiles/slurm/config.yaml");
    assert!(slurm.contains("executor: slurm"));
    assert!(slurm.contains("set-resources:"));
    assert!(text(&tree, "pyproject.toml").contains("--workflow-profile workflow/profiles/slurm"));
}

#[test]
fn reads_are_handled_per_file_for_single_and_paired_end() {
    let tree = render_builtin("MIT");
    let common = text(&tree, "workflow/rules/common.smk");
    assert!(common.contains("return [row[\"fq1\"], row[\"fq2\"]]"));
    assert!(common.contains("return [row[\"fq1\"]]"));

    let align = text(&tree, "workflow/rules/align.smk");
    assert!(align.contains("reads=get_reads,"));
    assert!(align.contains(" {input.reads} | samtools view"));
    assert!(!align.contains("input.r2"));

    let qc = text(&tree, "workflow/rules/qc.smk");
    assert!(qc.contains("html=\"results/qc/{sample}_{read}_fastqc.html\""));
    assert!(qc.contains("--outdir {params.outdir} {input}"));
    assert!(qc.contains("fastqc_reports(),"));
}

#[test]
fn missing_variable_fails_naming_it() {
    let template = Template::builtin().unwrap();
    let vars = resolve_variables(&template.manifest, &[]).expect("resolve");
    let mut map = vars.to_string_map();
    map.remove("author");
    let vars: TemplateVariables = map.into_iter().collect();

    let renderer = Renderer::new(template).unwrap();
    let first = renderer.render(&vars).unwrap_err();
    let second = renderer.render(&vars).unwrap_err();
    match (&first, &second) {
        (
            RenderError::MissingVariable { name, path },
            RenderError::MissingVariable { name: n2, path: p2 },
        ) => {
            assert_eq!(name, "author");
            assert_eq!((name, path), (n2, p2), "failure must be deterministic");
            assert_eq!(path, "LICENSE", "first entry in path order referencing author");
        }
        other => panic!("expected MissingVariable twice, got {other:?}"),
    }
}

#[test]
fn on_disk_template_renders_like_builtin() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/bioinformatics");
    let renderer = Renderer::new(Template::from_dir(&dir).expect("from_dir")).unwrap();
    assert_eq!(renderer.render(&builtin_vars("MIT")).unwrap(), render_builtin("MIT"));
}

#[test]
fn custom_template_directory_renders() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("scaffold.yaml"),
        "name: tiny\nroot: \"{{ slug }}\"\nvariables:\n  - name: title\n  - name: slug\n    default: \"{{ title | slugify }}\"\n",
    )
    .unwrap();
    std::fs::create_dir_all(dir.path().join("{{ slug }}")).unwrap();
    std::fs::write(dir.path().join("{{ slug }}/NOTES.md"), "{{ title | upper }}\n").unwrap();

    let template = Template::from_dir(dir.path()).expect("load");
    let vars = resolve_variables(&template.manifest, &[overrides(&[("title", "Hi There")])]).unwrap();
    let renderer = Renderer::new(template).unwrap();
    assert_eq!(renderer.render_root(&vars).unwrap(), "hi-there");
    let tree = renderer.render(&vars).unwrap();
    assert_eq!(text(&tree, "hi-there/NOTES.md"), "HI THERE\n");
}

#[test]
fn values_with_many_shapes_render_verbatim() {
    let renderer = Renderer::new(Template::builtin().unwrap()).unwrap();
    for author in [
        "",
        "O'Brien \"Pat\"",
        "emoji 🚀",
        "braces {{ not a token }}",
        "日本語",
        "<b>&amp;</b>",
    ] {
        let mut map = builtin_vars("MIT").to_string_map();
        map.insert("author".into(), author.into());
        let vars: TemplateVariables = map.into_iter().collect();
        let tree = renderer.render(&vars).expect("render");
        assert!(text(&tree, "LICENSE").contains(&format!("Copyright (c) {author}\n")));
    }
}
