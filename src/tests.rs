use proptest::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;
use std::fs;

use crate::classifier::{classify_text, extname, Verdict};
use crate::config::{Config, RewriteConfig};
use crate::emit::{rewrite_file, rewrite_source};

fn rewrite_ts(code: &str, config: &RewriteConfig) -> String {
    rewrite_source(code, &PathBuf::from("test.ts"), config).unwrap().code
}

fn arb_quote() -> impl Strategy<Value = char> {
    prop_oneof![Just('\''), Just('"')]
}

/// Statements paired with their expected rewrite. `ID` is replaced per
/// statement so bindings never collide.
fn arb_statement() -> impl Strategy<Value = (String, String)> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(|n| (
            format!("import {{ ID{} }} from './{}';", n, n),
            format!("import {{ ID{} }} from './{}.js';", n, n),
        )),
        "[a-z]{1,6}".prop_map(|n| (
            format!("import ID{} from '{}';", n, n),
            format!("import ID{} from '{}';", n, n),
        )),
        "[a-z]{1,6}".prop_map(|n| (
            format!("export * from '../{}';", n),
            format!("export * from '../{}.js';", n),
        )),
        "[a-z]{1,6}".prop_map(|n| (
            format!("export {{ ID{} }} from './{}.json';", n, n),
            format!("export {{ ID{} }} from './{}.json';", n, n),
        )),
    ]
}

fn render(stmts: &[(String, String)], expected: bool) -> String {
    stmts
        .iter()
        .enumerate()
        .map(|(k, (input, output))| {
            let text = if expected { output } else { input };
            text.replace("ID", &format!("m{}_", k))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_relative_specifier_gets_extension(name in "[a-z][a-z0-9_-]{0,8}", quote in arb_quote()) {
        let code = format!("import x from {q}./{name}{q};", q = quote, name = name);
        let expected = format!("import x from {q}./{name}.js{q};", q = quote, name = name);
        prop_assert_eq!(rewrite_ts(&code, &RewriteConfig::default()), expected);
    }

    #[test]
    fn prop_statements_rewritten_independently(stmts in prop::collection::vec(arb_statement(), 1..6)) {
        let input = render(&stmts, false);
        let expected = render(&stmts, true);
        prop_assert_eq!(rewrite_ts(&input, &RewriteConfig::default()), expected);
    }

    #[test]
    fn prop_rewrite_is_stable(stmts in prop::collection::vec(arb_statement(), 1..6)) {
        let input = render(&stmts, false);
        let once = rewrite_ts(&input, &RewriteConfig::default());
        let twice = rewrite_source(&once, &PathBuf::from("test.ts"), &RewriteConfig::default()).unwrap();
        prop_assert!(!twice.changed());
    }

    #[test]
    fn prop_extension_never_changes(name in "[a-z]{1,8}", ext in "[a-z]{1,4}") {
        let specifier = format!("./{}.{}", name, ext);
        let ext_with_dot = format!(".{}", ext);
        prop_assert_eq!(extname(&specifier), ext_with_dot.as_str());
        prop_assert_eq!(classify_text(&specifier, &RewriteConfig::default()), Verdict::HasExtension);
    }

    #[test]
    fn prop_bare_specifiers_untouched(name in "[a-z@][a-z/-]{0,10}") {
        prop_assert_eq!(classify_text(&name, &RewriteConfig::default()), Verdict::NotRelative);
    }

    #[test]
    fn prop_force_exclude_wins(suffix in "[a-z/]{0,8}") {
        let config = RewriteConfig::new(&["^my-pkg"], &["^my-pkg/internal"]).unwrap();
        let excluded = format!("my-pkg/internal{}", suffix);
        prop_assert!(!classify_text(&excluded, &config).should_rewrite());
        let included = format!("my-pkg{}", suffix);
        if !included.starts_with("my-pkg/internal") {
            prop_assert_eq!(classify_text(&included, &config), Verdict::ForceIncluded);
        }
    }
}

#[test]
fn test_force_include_from_rc_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".jsextrc.json"),
        r#"{ "forceInclude": "^my-pkg", "forceExclude": ["^my-pkg/internal", 3] }"#,
    )
    .unwrap();
    let file = temp.path().join("index.ts");
    fs::write(&file, "import a from 'my-pkg';\nimport b from 'my-pkg/internal';\n").unwrap();

    let rewrite = Config::load(temp.path()).unwrap().rewrite_config().unwrap();
    let output = rewrite_file(&file, &rewrite).unwrap();
    assert_eq!(output.code, "import a from 'my-pkg.js';\nimport b from 'my-pkg/internal';\n");
}

#[test]
fn test_force_included_relative_path_keeps_its_extension() {
    let config = RewriteConfig::new(&["^\\./"], &[]).unwrap();
    assert_eq!(
        rewrite_ts("import a from './x.json';\nimport b from './y';", &config),
        "import a from './x.json';\nimport b from './y.js';"
    );
}

#[test]
fn test_dynamic_import_with_computed_specifier() {
    let config = RewriteConfig::default().with_dynamic_imports(true);
    let code = "const a = import('./a');\nconst b = import('./' + name);\n";
    assert_eq!(
        rewrite_ts(code, &config),
        "const a = import('./a.js');\nconst b = import('./' + name);\n"
    );
}

#[test]
fn test_parent_directory_specifier() {
    assert_eq!(
        rewrite_ts("import a from '..';\nimport b from '../';", &RewriteConfig::default()),
        "import a from '..';\nimport b from '../.js';"
    );
}
