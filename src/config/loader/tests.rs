use super::*;

fn parse(content: &str) -> Config {
    parse_config(content, PathBuf::from("/proj")).expect("config parses")
}

#[test]
fn parse_compose_executor() {
    let config = parse(
        r#"
        project "shop"
        executor "compose" {
            compose-file "docker/compose.yaml"
            services {
                app "shop_app"
                db "shop_db"
            }
            reloadable "app"
        }
        "#,
    );

    assert_eq!(config.project, "shop");
    match config.executor {
        ExecutorConfig::Compose {
            compose_file,
            services,
            reloadable,
        } => {
            assert_eq!(compose_file, Some(PathBuf::from("docker/compose.yaml")));
            assert_eq!(services.get("app").map(String::as_str), Some("shop_app"));
            assert_eq!(services.get("db").map(String::as_str), Some("shop_db"));
            assert_eq!(reloadable, vec!["app"]);
        }
        other => panic!("expected compose executor, got {:?}", other),
    }
}

#[test]
fn parse_remote_requires_host() {
    let err = parse_config(r#"executor "remote" { user "deploy" }"#, PathBuf::from("."))
        .expect_err("missing host should fail");
    assert!(err.to_string().contains("host"));
}

#[test]
fn parse_database_and_storage() {
    let config = parse(
        r#"
        database {
            driver "postgres"
            service "db"
            name "shop"
            user "shop"
            password-env "SHOP_DB_PASSWORD"
            backup-dir "var/backups"
        }
        storage {
            driver "bucket"
            alias "minio"
            bucket "shop-media"
        }
        "#,
    );

    assert_eq!(config.database.driver, "postgres");
    assert!(config.database.enabled());
    assert_eq!(config.database.service.as_deref(), Some("db"));
    assert_eq!(
        config.database.password_env.as_deref(),
        Some("SHOP_DB_PASSWORD")
    );
    assert_eq!(config.database.backup_dir, PathBuf::from("var/backups"));

    assert_eq!(config.storage.driver, "bucket");
    assert_eq!(config.storage.alias, "minio");
    assert_eq!(config.storage.bucket, "shop-media");
}

#[test]
fn parse_hosts_entries() {
    let config = parse(
        r#"
        hosts {
            manage #true
            sudo #false
            entry "shop.test" "127.0.0.1"
            entry "api.shop.test" "127.0.0.1"
        }
        "#,
    );

    assert!(config.hosts.manage);
    assert!(!config.hosts.use_sudo);
    assert_eq!(config.hosts.entries.len(), 2);
    assert_eq!(
        config.hosts.entries.get("shop.test").map(String::as_str),
        Some("127.0.0.1")
    );
}

#[test]
fn parse_plugins_inline_and_block() {
    let inline = parse(r#"plugins "wordpress" "laravel""#);
    assert_eq!(inline.plugins, vec!["wordpress", "laravel"]);

    let block = parse(
        r#"
        plugins {
            wordpress
            laravel
        }
        "#,
    );
    assert_eq!(block.plugins, vec!["wordpress", "laravel"]);
}

#[test]
fn parse_custom_command_paths() {
    let config = parse(r#"commands "tools/commands" "deploy.kdl""#);
    assert_eq!(
        config.custom_commands,
        vec![PathBuf::from("tools/commands"), PathBuf::from("deploy.kdl")]
    );
}

#[test]
fn parse_group_toggles() {
    let config = parse(
        r#"
        groups {
            hosts #false
            storage #false
        }
        "#,
    );
    assert!(config.groups.stack);
    assert!(config.groups.database);
    assert!(!config.groups.storage);
    assert!(!config.groups.hosts);
}

#[test]
fn unknown_executor_mode_fails() {
    let err = parse_config(r#"executor "kubernetes""#, PathBuf::from("."))
        .expect_err("unknown mode should fail");
    assert!(err.to_string().contains("kubernetes"));
}

#[test]
fn defaults_when_sections_missing() {
    let config = parse(r#"project "bare""#);
    assert_eq!(config.executor.mode(), "local");
    assert!(!config.database.enabled());
    assert!(!config.storage.enabled());
    assert!(!config.hosts.manage);
}
