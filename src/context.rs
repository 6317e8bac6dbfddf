//! The per-invocation context.
//!
//! One `Context` exists per process run. It owns the configuration and
//! the provider registry, and lazily builds the executor and providers on
//! first access, memoizing them so at most one executor and one provider
//! per kind ever exist in a process.

use crate::config::Config;
use crate::error::Result;
use crate::exec::{Executor, build_executor};
use crate::providers::registry::ProviderRegistry;
use crate::providers::traits::{DatabaseProvider, HostsProvider, StorageProvider};
use std::sync::{Arc, OnceLock};

pub struct Context {
    config: Config,
    registry: ProviderRegistry,
    executor: OnceLock<Arc<dyn Executor>>,
}

impl Context {
    pub fn new(config: Config, registry: ProviderRegistry) -> Self {
        Self {
            config,
            registry,
            executor: OnceLock::new(),
        }
    }

    /// A context with a pre-built executor, bypassing configuration-based
    /// construction. Used by tests to swap in doubles.
    pub fn with_executor(
        config: Config,
        registry: ProviderRegistry,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(executor);
        Self {
            config,
            registry,
            executor: cell,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The executor, built once from the configuration.
    pub fn executor(&self) -> Result<Arc<dyn Executor>> {
        if let Some(executor) = self.executor.get() {
            return Ok(executor.clone());
        }
        let executor = build_executor(&self.config)?;
        // A racing initialization would have produced the same value;
        // whichever landed first wins.
        let _ = self.executor.set(executor);
        Ok(self.executor.get().expect("executor just set").clone())
    }

    /// The configured database provider, or `None` when the driver is
    /// unset or "none". Memoized per driver by the registry.
    pub fn database(&self) -> Result<Option<Arc<dyn DatabaseProvider>>> {
        if !self.config.database.enabled() {
            return Ok(None);
        }
        let executor = self.executor()?;
        self.registry.resolve_database(&self.config, executor)
    }

    pub fn storage(&self) -> Result<Option<Arc<dyn StorageProvider>>> {
        if !self.config.storage.enabled() {
            return Ok(None);
        }
        let executor = self.executor()?;
        self.registry.resolve_storage(&self.config, executor)
    }

    pub fn hosts(&self) -> Result<Option<Arc<dyn HostsProvider>>> {
        if !self.config.hosts.manage {
            return Ok(None);
        }
        let executor = self.executor()?;
        self.registry.resolve_hosts(&self.config, executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;

    #[test]
    fn database_is_none_without_subprocess_calls_when_driver_none() {
        let executor = Arc::new(MockExecutor::new());
        let ctx = Context::with_executor(
            Config::default(),
            ProviderRegistry::with_defaults(),
            executor.clone(),
        );

        assert!(ctx.database().unwrap().is_none());
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn executor_is_memoized() {
        let executor: Arc<dyn Executor> = Arc::new(MockExecutor::new());
        let ctx = Context::with_executor(
            Config::default(),
            ProviderRegistry::with_defaults(),
            executor.clone(),
        );

        let first = ctx.executor().unwrap();
        let second = ctx.executor().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &executor));
    }

    #[test]
    fn provider_is_memoized_through_context() {
        let mut config = Config::default();
        config.database.driver = "postgres".to_string();
        config.database.name = "shop".to_string();
        config.database.user = "shop".to_string();

        let ctx = Context::with_executor(
            config,
            ProviderRegistry::with_defaults(),
            Arc::new(MockExecutor::new()),
        );

        let first = ctx.database().unwrap().unwrap();
        let second = ctx.database().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
