pub mod database;
pub mod hosts;
pub mod registry;
pub mod storage;
pub mod traits;

pub use registry::ProviderRegistry;
pub use traits::{
    BackupEntry, DatabaseProvider, EntryOutcome, HostEntry, HostsProvider, ObjectInfo,
    ProviderKind, SizeReport, StorageProvider, UsageReport,
};
