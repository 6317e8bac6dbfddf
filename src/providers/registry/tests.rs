use super::*;
use crate::testing::MockExecutor;

fn config_with_database(driver: &str) -> Config {
    let mut config = Config::default();
    config.database.driver = driver.to_string();
    config.database.name = "shop".to_string();
    config.database.user = "shop".to_string();
    config
}

#[test]
fn defaults_register_all_builtin_drivers() {
    let registry = ProviderRegistry::with_defaults();
    assert_eq!(registry.database_drivers(), vec!["mysql", "postgres", "sqlite"]);
    assert_eq!(registry.storage_drivers(), vec!["bucket", "local"]);
    assert_eq!(registry.hosts_drivers(), vec!["file"]);
}

#[test]
fn resolving_none_driver_yields_no_provider() {
    let registry = ProviderRegistry::with_defaults();
    let executor: Arc<dyn Executor> = Arc::new(MockExecutor::new());

    let provider = registry
        .resolve_database(&config_with_database("none"), executor)
        .unwrap();
    assert!(provider.is_none());
}

#[test]
fn resolving_same_pair_twice_returns_same_instance() {
    let registry = ProviderRegistry::with_defaults();
    let executor: Arc<dyn Executor> = Arc::new(MockExecutor::new());
    let config = config_with_database("postgres");

    let first = registry
        .resolve_database(&config, executor.clone())
        .unwrap()
        .unwrap();
    let second = registry
        .resolve_database(&config, executor)
        .unwrap()
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn unregistered_driver_error_lists_known_drivers() {
    let registry = ProviderRegistry::with_defaults();
    let executor: Arc<dyn Executor> = Arc::new(MockExecutor::new());

    let err = registry
        .resolve_database(&config_with_database("oracle"), executor)
        .expect_err("unregistered driver");

    let msg = err.to_string();
    assert!(msg.contains("oracle"));
    assert!(msg.contains("mysql"));
    assert!(msg.contains("postgres"));
    assert!(msg.contains("sqlite"));
}

#[test]
fn empty_registry_rejects_every_driver() {
    let registry = ProviderRegistry::new();
    let executor: Arc<dyn Executor> = Arc::new(MockExecutor::new());

    let err = registry
        .resolve_database(&config_with_database("postgres"), executor)
        .expect_err("nothing registered");
    assert!(matches!(err, StackctlError::DriverNotRegistered { .. }));
}

#[test]
fn storage_resolution_caches_like_database() {
    let registry = ProviderRegistry::with_defaults();
    let executor: Arc<dyn Executor> = Arc::new(MockExecutor::new());
    let mut config = Config::default();
    config.storage.driver = "local".to_string();

    let first = registry
        .resolve_storage(&config, executor.clone())
        .unwrap()
        .unwrap();
    let second = registry.resolve_storage(&config, executor).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn hosts_resolution_gates_on_manage_flag() {
    let registry = ProviderRegistry::with_defaults();
    let executor: Arc<dyn Executor> = Arc::new(MockExecutor::new());

    let config = Config::default();
    assert!(registry
        .resolve_hosts(&config, executor.clone())
        .unwrap()
        .is_none());

    let mut config = Config::default();
    config.hosts.manage = true;
    assert!(registry.resolve_hosts(&config, executor).unwrap().is_some());
}

#[test]
fn custom_registration_is_visible() {
    let mut registry = ProviderRegistry::new();
    registry.register_database("postgres", |config, executor| {
        Ok(Arc::new(PostgresProvider::new(config, executor)))
    });

    assert_eq!(registry.database_drivers(), vec!["postgres"]);
    assert_eq!(registry.drivers(ProviderKind::Database), vec!["postgres"]);
}
