//! Roundtrip serialisation tests for `scaffold-core` manifest types.
//!
//! Each `#[case]` is isolated — no shared state.

use scaffold_core::{
    PathCondition, Predicate, TemplateManifest, TemplateVariables, VariableName, VariableSpec,
};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn minimal_manifest() -> TemplateManifest {
    TemplateManifest {
        name: "minimal".to_string(),
        description: String::new(),
        root: "{{ package_name }}".to_string(),
        variables: vec![],
        conditional_paths: vec![],
        copy_without_render: vec![],
    }
}

fn full_manifest() -> TemplateManifest {
    TemplateManifest {
        name: "bioinformatics".to_string(),
        description: "Snakemake analysis repository".to_string(),
        root: "{{ package_name }}".to_string(),
        variables: vec![
            VariableSpec {
                name: VariableName::from("project_name"),
                description: Some("Human readable name".to_string()),
                default: Some("My Analysis".to_string()),
                choices: vec![],
            },
            VariableSpec {
                name: VariableName::from("license"),
                description: None,
                default: None,
                choices: vec!["MIT".to_string(), "None".to_string()],
            },
        ],
        conditional_paths: vec![PathCondition {
            path: "LICENSE".to_string(),
            when: Predicate::not_equals("license", "None"),
        }],
        copy_without_render: vec!["data/**/*.fastq.gz".to_string()],
    }
}

fn unicode_manifest() -> TemplateManifest {
    TemplateManifest {
        name: "ゲノム-геном-基因组".to_string(),
        description: "émojis 🧬 & spéçïal chars: <>&\"'".to_string(),
        root: "{{ project_name | slugify }}".to_string(),
        variables: vec![VariableSpec {
            name: VariableName::from("author"),
            description: Some("日本語・한국어・العربية".to_string()),
            default: Some("Zoë Ångström".to_string()),
            choices: vec![],
        }],
        conditional_paths: vec![],
        copy_without_render: vec![],
    }
}

// ---------------------------------------------------------------------------
// Parameterised roundtrip test
// ---------------------------------------------------------------------------

#[rstest]
#[case("minimal", minimal_manifest())]
#[case("all_fields", full_manifest())]
#[case("unicode_strings", unicode_manifest())]
fn manifest_roundtrip(#[case] label: &str, #[case] manifest: TemplateManifest) {
    let yaml = serde_yaml::to_string(&manifest)
        .unwrap_or_else(|e| panic!("[{label}] serialize failed: {e}"));
    let back: TemplateManifest = serde_yaml::from_str(&yaml)
        .unwrap_or_else(|e| panic!("[{label}] deserialize failed: {e}"));
    assert_eq!(manifest, back, "[{label}] manifest");
}

// ---------------------------------------------------------------------------
// Predicate evaluation table
// ---------------------------------------------------------------------------

#[rstest]
#[case(Predicate::equals("license", "MIT"), "MIT", Some(true))]
#[case(Predicate::equals("license", "MIT"), "None", Some(false))]
#[case(Predicate::not_equals("license", "None"), "None", Some(false))]
#[case(Predicate::not_equals("license", "None"), "Apache-2.0", Some(true))]
fn predicate_evaluation(
    #[case] predicate: Predicate,
    #[case] license: &str,
    #[case] expected: Option<bool>,
) {
    let vars: TemplateVariables = [("license", license)].into_iter().collect();
    assert_eq!(predicate.evaluate(&vars), expected);
}
