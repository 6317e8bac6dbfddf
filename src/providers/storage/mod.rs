//! Object storage providers.
//!
//! The `local` driver speaks POSIX file utilities through the executor,
//! so the same commands work against a directory tree on this machine, in
//! a container, or on a remote host. The `bucket` driver speaks the `mc`
//! S3-compatible client the same way.

mod bucket;
mod local;

pub use bucket::BucketStorageProvider;
pub use local::LocalStorageProvider;

#[cfg(test)]
mod tests;
