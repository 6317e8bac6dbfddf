use super::*;
use crate::config::Config;
use crate::providers::traits::{EntryOutcome, HostEntry, HostsProvider};
use crate::testing::{MockExecutor, RecordedCall};
use std::sync::{Arc, Mutex};

const BASE_FILE: &str = "127.0.0.1 localhost\n::1 localhost\n";

/// Mock executor emulating a hosts file: `cat` reads it, the `tee` write
/// line replaces it, so consecutive provider calls see their own effects.
fn hosts_executor(initial: &str) -> (Arc<MockExecutor>, Arc<Mutex<String>>) {
    let file = Arc::new(Mutex::new(initial.to_string()));
    let file_for_handler = file.clone();

    let executor = MockExecutor::new().with_handler(move |call: &RecordedCall| {
        if call.command == "cat" {
            return Some(MockExecutor::ok(&file_for_handler.lock().unwrap()));
        }
        if call.command == "sh"
            && call.args.iter().any(|a| a.contains("tee"))
        {
            let content = call
                .stdin
                .as_ref()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            *file_for_handler.lock().unwrap() = content;
            return Some(MockExecutor::ok(""));
        }
        None
    });

    (Arc::new(executor), file)
}

fn provider(executor: Arc<MockExecutor>, use_sudo: bool) -> HostsFileProvider {
    let mut config = Config::default();
    config.hosts.manage = true;
    config.hosts.use_sudo = use_sudo;
    HostsFileProvider::new(&config, executor)
}

fn entry(hostname: &str, ip: &str) -> HostEntry {
    HostEntry {
        hostname: hostname.to_string(),
        ip: ip.to_string(),
    }
}

#[test]
fn add_creates_managed_block_and_preserves_rest() {
    let (executor, file) = hosts_executor(BASE_FILE);
    let provider = provider(executor, false);

    let outcomes = provider
        .add_entries(&[entry("shop.test", "127.0.0.1")])
        .unwrap();
    assert_eq!(outcomes[0].1, EntryOutcome::Added);

    let written = file.lock().unwrap().clone();
    assert!(written.starts_with(BASE_FILE.trim_end()));
    assert!(written.contains("# BEGIN stackctl managed"));
    assert!(written.contains("127.0.0.1 shop.test"));
    assert!(written.contains("# END stackctl managed"));
}

#[test]
fn adding_identical_entry_twice_is_skipped_and_count_stable() {
    let (executor, _file) = hosts_executor(BASE_FILE);
    let provider = provider(executor, false);
    let e = entry("shop.test", "127.0.0.1");

    let first = provider.add_entries(std::slice::from_ref(&e)).unwrap();
    assert_eq!(first[0].1, EntryOutcome::Added);

    let second = provider.add_entries(std::slice::from_ref(&e)).unwrap();
    assert_eq!(second[0].1, EntryOutcome::Skipped);

    assert_eq!(provider.list_entries().unwrap().len(), 1);
}

#[test]
fn same_hostname_new_ip_updates_in_place() {
    let (executor, _file) = hosts_executor(BASE_FILE);
    let provider = provider(executor, false);

    provider
        .add_entries(&[entry("shop.test", "127.0.0.1")])
        .unwrap();
    let outcomes = provider
        .add_entries(&[entry("shop.test", "10.0.0.5")])
        .unwrap();
    assert_eq!(outcomes[0].1, EntryOutcome::Updated);

    let entries = provider.list_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].ip, "10.0.0.5");
}

#[test]
fn removing_missing_entry_reports_not_found() {
    let (executor, _file) = hosts_executor(BASE_FILE);
    let provider = provider(executor, false);

    let outcomes = provider
        .remove_entries(&["ghost.test".to_string()])
        .unwrap();
    assert_eq!(outcomes[0].1, EntryOutcome::NotFound);
}

#[test]
fn remove_only_touches_managed_block() {
    let (executor, file) = hosts_executor(BASE_FILE);
    let provider = provider(executor, false);

    provider
        .add_entries(&[entry("shop.test", "127.0.0.1"), entry("api.test", "127.0.0.1")])
        .unwrap();
    let outcomes = provider
        .remove_entries(&["shop.test".to_string()])
        .unwrap();
    assert_eq!(outcomes[0].1, EntryOutcome::Removed);

    let written = file.lock().unwrap().clone();
    assert!(written.contains("localhost"));
    assert!(!written.contains("shop.test"));
    assert!(written.contains("api.test"));
}

#[test]
fn check_matches_hostname_and_ip_pair() {
    let (executor, _file) = hosts_executor(BASE_FILE);
    let provider = provider(executor, false);
    provider
        .add_entries(&[entry("shop.test", "127.0.0.1")])
        .unwrap();

    let checks = provider
        .check_entries(&[entry("shop.test", "127.0.0.1"), entry("shop.test", "10.0.0.9")])
        .unwrap();
    assert!(checks[0].1);
    assert!(!checks[1].1);
}

#[test]
fn write_uses_sudo_when_configured() {
    let (executor, _file) = hosts_executor(BASE_FILE);
    let provider = provider(executor.clone(), true);

    provider
        .add_entries(&[entry("shop.test", "127.0.0.1")])
        .unwrap();

    let write_call = executor
        .calls()
        .into_iter()
        .find(|c| c.command == "sh")
        .expect("write call");
    assert!(write_call.args[1].starts_with("sudo tee"));
}

#[test]
fn unreadable_file_is_a_command_failure() {
    let executor = Arc::new(
        MockExecutor::new().respond("cat", MockExecutor::failing(1, "Permission denied")),
    );
    let provider = provider(executor, false);

    let err = provider.list_entries().expect_err("read failed");
    assert!(err.to_string().contains("Permission denied"));
}
