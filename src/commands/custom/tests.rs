use super::*;
use crate::providers::ProviderRegistry;
use crate::testing::MockExecutor;
use std::sync::Arc;

fn test_context(executor: Arc<MockExecutor>) -> Context {
    Context::with_executor(Config::default(), ProviderRegistry::with_defaults(), executor)
}

#[test]
fn parses_a_full_command_definition() {
    let defs = parse_file(
        r#"
        command "deploy" {
            description "Build and publish the app image"
            alias "ship"
            arg "tag" required=#true help="Image tag"
            option "registry" value="URL" help="Registry to push to"
            service "app"
            run "scripts/deploy.sh {tag} {registry}"
        }
        "#,
    )
    .unwrap();

    assert_eq!(defs.len(), 1);
    let def = &defs[0];
    assert_eq!(def.name, "deploy");
    assert_eq!(def.about, "Build and publish the app image");
    assert_eq!(def.aliases, vec!["ship"]);
    assert_eq!(def.args.len(), 1);
    assert!(def.args[0].required);
    assert_eq!(def.options.len(), 1);
    assert!(def.action.is_some());
    assert!(def.validate().is_ok());
}

#[test]
fn command_without_run_or_subcommands_is_dropped() {
    let defs = parse_file(
        r#"
        command "broken" {
            description "nothing to do"
        }
        command "fine" {
            run "echo ok"
        }
        "#,
    )
    .unwrap();

    // The invalid definition is dropped; the valid sibling survives.
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].name, "fine");
}

#[test]
fn nested_subcommands_parse_recursively() {
    let defs = parse_file(
        r#"
        command "release" {
            command "patch" { run "scripts/release.sh patch" }
            command "minor" { run "scripts/release.sh minor" }
        }
        "#,
    )
    .unwrap();

    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].subcommands.len(), 2);
    assert!(defs[0].action.is_none());
    assert!(defs[0].validate().is_ok());
}

#[test]
fn template_substitutes_args_and_options() {
    let defs = parse_file(
        r#"
        command "greet" {
            arg "who" required=#true
            option "greeting" value="WORD"
            run "echo {greeting} {who}"
        }
        "#,
    )
    .unwrap();

    let executor = Arc::new(MockExecutor::new());
    let ctx = test_context(executor.clone());

    let mut inv = Invocation::default();
    inv.args.push("world".to_string());
    inv.set_value("greeting", "hello".to_string());

    (defs[0].action.as_ref().unwrap())(&inv, &ctx).unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].command, "echo");
    assert_eq!(calls[0].args, vec!["hello".to_string(), "world".to_string()]);
}

#[test]
fn template_routes_to_service_when_declared() {
    let defs = parse_file(
        r#"
        command "cache-clear" {
            service "app"
            run "rm -rf var/cache"
        }
        "#,
    )
    .unwrap();

    let executor = Arc::new(MockExecutor::new());
    let ctx = test_context(executor.clone());
    (defs[0].action.as_ref().unwrap())(&Invocation::default(), &ctx).unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].op, "run_in_service");
    assert_eq!(calls[0].service.as_deref(), Some("app"));
    assert_eq!(calls[0].command, "rm");
}

#[test]
fn failing_template_command_becomes_an_error() {
    let defs = parse_file(r#"command "fail" { run "false" }"#).unwrap();

    let executor = Arc::new(MockExecutor::new().respond("false", MockExecutor::failing(2, "")));
    let ctx = test_context(executor);

    let err = (defs[0].action.as_ref().unwrap())(&Invocation::default(), &ctx)
        .expect_err("non-zero exit");
    assert!(err.to_string().contains("status 2"));
}

#[test]
fn load_path_warns_on_missing_path() {
    let config = Config {
        root: std::path::PathBuf::from("/nonexistent-root"),
        ..Config::default()
    };
    let defs = load_path(&config, Path::new("missing/commands"));
    assert!(defs.is_empty());
}

#[test]
fn load_dir_recurses_and_skips_non_kdl() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("nested")).unwrap();
    std::fs::write(
        dir.path().join("a.kdl"),
        r#"command "one" { run "echo 1" }"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("nested/b.kdl"),
        r#"command "two" { run "echo 2" }"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("README.md"), "not a command").unwrap();

    let config = Config {
        root: dir.path().to_path_buf(),
        ..Config::default()
    };
    let mut names: Vec<String> = load_path(&config, Path::new("."))
        .into_iter()
        .map(|d| d.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["one", "two"]);
}
