use super::*;
use crate::commands::definition::{ArgSpec, OptSpec};
use crate::config::Config;
use crate::plugins::{PluginDescriptor, PluginHooks, PluginManifest};
use crate::providers::ProviderRegistry;
use crate::testing::MockExecutor;
use std::sync::{Arc, Mutex};

fn test_context() -> Context {
    Context::with_executor(
        Config::default(),
        ProviderRegistry::with_defaults(),
        Arc::new(MockExecutor::new()),
    )
}

fn capture_def(
    name: &str,
    slot: Arc<Mutex<Option<Invocation>>>,
) -> CommandDefinition {
    CommandDefinition::new(name, "capture invocation")
        .option(OptSpec::value("greeting", None, "WORD", "greeting word"))
        .option(OptSpec::flag("loud", None, "shout"))
        .arg(ArgSpec::required("who", "target"))
        .action(move |inv, _ctx| {
            *slot.lock().unwrap() = Some(inv.clone());
            Ok(())
        })
}

fn parse_and_dispatch(defs: &[CommandDefinition], argv: &[&str]) -> Result<()> {
    let cli = build_cli(defs);
    let matches = cli.try_get_matches_from(argv.iter().copied()).expect("parse");
    let (name, sub) = matches.subcommand().expect("subcommand chosen");
    let def = defs.iter().find(|d| d.matches_name(name)).unwrap();
    dispatch(def, sub, &test_context(), &PluginManager::new())
}

#[test]
fn options_and_args_reach_the_action() {
    let slot = Arc::new(Mutex::new(None));
    let defs = vec![capture_def("greet", slot.clone())];

    parse_and_dispatch(
        &defs,
        &["stackctl", "greet", "--greeting", "hello", "--loud", "world"],
    )
    .unwrap();

    let inv = slot.lock().unwrap().clone().unwrap();
    assert_eq!(inv.value("greeting"), Some("hello"));
    assert!(inv.flag("loud"));
    assert_eq!(inv.arg(0), Some("world"));
}

#[test]
fn aliases_resolve_to_the_same_definition() {
    let slot = Arc::new(Mutex::new(None));
    let mut def = capture_def("status", slot.clone());
    def = def.alias("st");

    parse_and_dispatch(&[def], &["stackctl", "st", "anyone"]).unwrap();
    assert!(slot.lock().unwrap().is_some());
}

#[test]
fn parent_without_subcommand_is_a_parse_error_not_a_noop() {
    let defs = vec![
        CommandDefinition::new("db", "database commands").subcommand(
            CommandDefinition::new("backup", "dump").action(|_, _| Ok(())),
        ),
    ];
    let cli = build_cli(&defs);

    // Selecting the parent alone must show help, never silently succeed.
    let err = cli
        .try_get_matches_from(["stackctl", "db"])
        .expect_err("parent requires subcommand");
    let rendered = err.to_string();
    assert!(rendered.contains("backup") || rendered.contains("Usage"));
}

#[test]
fn nested_subcommands_dispatch_recursively() {
    let slot = Arc::new(Mutex::new(None));
    let inner = capture_def("patch", slot.clone());
    let defs = vec![
        CommandDefinition::new("release", "release commands")
            .subcommand(CommandDefinition::new("cut", "cut a release").subcommand(inner)),
    ];

    parse_and_dispatch(&defs, &["stackctl", "release", "cut", "patch", "v1"]).unwrap();
    let inv = slot.lock().unwrap().clone().unwrap();
    assert_eq!(inv.arg(0), Some("v1"));
}

#[test]
fn allow_unknown_forwards_hyphen_arguments() {
    let slot = Arc::new(Mutex::new(None));
    let slot_in_action = slot.clone();
    let defs = vec![
        CommandDefinition::new("wp", "wp passthrough")
            .arg(ArgSpec::variadic("args", "forwarded"))
            .allow_unknown()
            .action(move |inv, _ctx| {
                *slot_in_action.lock().unwrap() = Some(inv.clone());
                Ok(())
            }),
    ];

    parse_and_dispatch(
        &defs,
        &["stackctl", "wp", "plugin", "list", "--status=active"],
    )
    .unwrap();

    let inv = slot.lock().unwrap().clone().unwrap();
    assert_eq!(
        inv.args,
        vec!["plugin".to_string(), "list".to_string(), "--status=active".to_string()]
    );
}

#[test]
fn failing_before_hook_does_not_stop_the_action() {
    fn exploding_hook(_: &Context, _: &str) -> Result<()> {
        Err(StackctlError::PluginError("boom".to_string()))
    }
    fn hooked_manifest() -> Result<PluginManifest> {
        Ok(PluginManifest {
            name: "hooked".to_string(),
            version: "0.0.1".to_string(),
            about: String::new(),
            commands: Vec::new,
            config_keys: vec![],
            hooks: PluginHooks {
                before_command: Some(exploding_hook),
                after_command: Some(exploding_hook),
            },
        })
    }

    let mut plugins = PluginManager::with_descriptors(vec![PluginDescriptor {
        name: "hooked",
        load: hooked_manifest,
    }]);
    plugins.load_plugin("hooked").unwrap();

    let ran = Arc::new(Mutex::new(false));
    let ran_in_action = ran.clone();
    let def = CommandDefinition::new("touchy", "runs despite hook failures").action(
        move |_inv, _ctx| {
            *ran_in_action.lock().unwrap() = true;
            Ok(())
        },
    );

    let inv = Invocation::default();
    execute(&def, &inv, &test_context(), &plugins).unwrap();
    assert!(*ran.lock().unwrap());
}

#[test]
fn action_error_propagates_after_the_after_hook() {
    let def = CommandDefinition::new("doomed", "always fails")
        .action(|_inv, _ctx| Err(StackctlError::Other("nope".to_string())));

    let err = execute(&def, &Invocation::default(), &test_context(), &PluginManager::new())
        .expect_err("action failed");
    assert_eq!(err.to_string(), "nope");
}

#[test]
fn overview_groups_without_panicking() {
    let defs = vec![
        CommandDefinition::new("up", "start")
            .category(crate::commands::definition::Category::Stack)
            .action(|_, _| Ok(())),
        CommandDefinition::new("deploy", "ship it")
            .category(crate::commands::definition::Category::Other("Deploy".to_string()))
            .action(|_, _| Ok(())),
    ];
    print_overview(&defs);
}
