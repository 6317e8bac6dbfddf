//! Hosts-file provider.
//!
//! Owns a marker-delimited block inside the hosts file and never touches
//! lines outside it. Reads and writes go through the executor, so the
//! managed file can live on this machine or wherever the backend runs.

mod file;

pub use file::HostsFileProvider;

#[cfg(test)]
mod tests;
