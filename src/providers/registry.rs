//! Provider registry.
//!
//! Maps `(kind, driver name)` to a factory and caches the constructed
//! instance, so resolving the same pair twice in one process returns the
//! same provider. The registry is an owned value built once at startup
//! and handed to the [`Context`](crate::context::Context); tests build
//! fresh registries instead of resetting a global.

use crate::config::Config;
use crate::error::{Result, StackctlError};
use crate::exec::Executor;
use crate::providers::database::{MysqlProvider, PostgresProvider, SqliteProvider};
use crate::providers::hosts::HostsFileProvider;
use crate::providers::storage::{BucketStorageProvider, LocalStorageProvider};
use crate::providers::traits::{DatabaseProvider, HostsProvider, ProviderKind, StorageProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub type DatabaseFactory =
    Box<dyn Fn(&Config, Arc<dyn Executor>) -> Result<Arc<dyn DatabaseProvider>> + Send + Sync>;
pub type StorageFactory =
    Box<dyn Fn(&Config, Arc<dyn Executor>) -> Result<Arc<dyn StorageProvider>> + Send + Sync>;
pub type HostsFactory =
    Box<dyn Fn(&Config, Arc<dyn Executor>) -> Result<Arc<dyn HostsProvider>> + Send + Sync>;

#[derive(Default)]
pub struct ProviderRegistry {
    database: HashMap<String, DatabaseFactory>,
    storage: HashMap<String, StorageFactory>,
    hosts: HashMap<String, HostsFactory>,

    database_cache: Mutex<HashMap<String, Arc<dyn DatabaseProvider>>>,
    storage_cache: Mutex<HashMap<String, Arc<dyn StorageProvider>>>,
    hosts_cache: Mutex<HashMap<String, Arc<dyn HostsProvider>>>,
}

impl ProviderRegistry {
    /// An empty registry, for tests and custom wiring.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with all built-in drivers registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    pub fn register_database<F>(&mut self, driver: &str, factory: F)
    where
        F: Fn(&Config, Arc<dyn Executor>) -> Result<Arc<dyn DatabaseProvider>>
            + Send
            + Sync
            + 'static,
    {
        self.database.insert(driver.to_string(), Box::new(factory));
    }

    pub fn register_storage<F>(&mut self, driver: &str, factory: F)
    where
        F: Fn(&Config, Arc<dyn Executor>) -> Result<Arc<dyn StorageProvider>>
            + Send
            + Sync
            + 'static,
    {
        self.storage.insert(driver.to_string(), Box::new(factory));
    }

    pub fn register_hosts<F>(&mut self, driver: &str, factory: F)
    where
        F: Fn(&Config, Arc<dyn Executor>) -> Result<Arc<dyn HostsProvider>>
            + Send
            + Sync
            + 'static,
    {
        self.hosts.insert(driver.to_string(), Box::new(factory));
    }

    /// Register all built-in drivers.
    pub fn register_defaults(&mut self) {
        self.register_database("postgres", |config, executor| {
            Ok(Arc::new(PostgresProvider::new(config, executor)))
        });
        self.register_database("mysql", |config, executor| {
            Ok(Arc::new(MysqlProvider::new(config, executor)))
        });
        self.register_database("sqlite", |config, executor| {
            Ok(Arc::new(SqliteProvider::new(config, executor)?))
        });

        self.register_storage("local", |config, executor| {
            Ok(Arc::new(LocalStorageProvider::new(config, executor)))
        });
        self.register_storage("bucket", |config, executor| {
            Ok(Arc::new(BucketStorageProvider::new(config, executor)?))
        });

        self.register_hosts("file", |config, executor| {
            Ok(Arc::new(HostsFileProvider::new(config, executor)))
        });
    }

    /// Resolve the configured database provider. `None` when the driver
    /// is unset or "none"; an unregistered name is a configuration error.
    pub fn resolve_database(
        &self,
        config: &Config,
        executor: Arc<dyn Executor>,
    ) -> Result<Option<Arc<dyn DatabaseProvider>>> {
        let driver = &config.database.driver;
        if !config.database.enabled() {
            return Ok(None);
        }

        let mut cache = self
            .database_cache
            .lock()
            .map_err(|e| StackctlError::Other(format!("registry lock poisoned: {}", e)))?;
        if let Some(instance) = cache.get(driver) {
            return Ok(Some(instance.clone()));
        }

        let factory = self.database.get(driver).ok_or_else(|| {
            StackctlError::DriverNotRegistered {
                kind: ProviderKind::Database.as_str(),
                driver: driver.clone(),
                known: self.database_drivers(),
            }
        })?;
        let instance = factory(config, executor)?;
        cache.insert(driver.clone(), instance.clone());
        Ok(Some(instance))
    }

    pub fn resolve_storage(
        &self,
        config: &Config,
        executor: Arc<dyn Executor>,
    ) -> Result<Option<Arc<dyn StorageProvider>>> {
        let driver = &config.storage.driver;
        if !config.storage.enabled() {
            return Ok(None);
        }

        let mut cache = self
            .storage_cache
            .lock()
            .map_err(|e| StackctlError::Other(format!("registry lock poisoned: {}", e)))?;
        if let Some(instance) = cache.get(driver) {
            return Ok(Some(instance.clone()));
        }

        let factory = self.storage.get(driver).ok_or_else(|| {
            StackctlError::DriverNotRegistered {
                kind: ProviderKind::Storage.as_str(),
                driver: driver.clone(),
                known: self.storage_drivers(),
            }
        })?;
        let instance = factory(config, executor)?;
        cache.insert(driver.clone(), instance.clone());
        Ok(Some(instance))
    }

    /// Resolve the hosts provider. Gated on `hosts.manage`; the driver is
    /// currently always "file".
    pub fn resolve_hosts(
        &self,
        config: &Config,
        executor: Arc<dyn Executor>,
    ) -> Result<Option<Arc<dyn HostsProvider>>> {
        if !config.hosts.manage {
            return Ok(None);
        }
        let driver = "file";

        let mut cache = self
            .hosts_cache
            .lock()
            .map_err(|e| StackctlError::Other(format!("registry lock poisoned: {}", e)))?;
        if let Some(instance) = cache.get(driver) {
            return Ok(Some(instance.clone()));
        }

        let factory =
            self.hosts
                .get(driver)
                .ok_or_else(|| StackctlError::DriverNotRegistered {
                    kind: ProviderKind::Hosts.as_str(),
                    driver: driver.to_string(),
                    known: self.hosts_drivers(),
                })?;
        let instance = factory(config, executor)?;
        cache.insert(driver.to_string(), instance.clone());
        Ok(Some(instance))
    }

    pub fn database_drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.database.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn storage_drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.storage.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn hosts_drivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hosts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered driver names for one kind, for diagnostics.
    pub fn drivers(&self, kind: ProviderKind) -> Vec<String> {
        match kind {
            ProviderKind::Database => self.database_drivers(),
            ProviderKind::Storage => self.storage_drivers(),
            ProviderKind::Hosts => self.hosts_drivers(),
        }
    }
}

#[cfg(test)]
mod tests;
