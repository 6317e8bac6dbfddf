use crate::config::Config;
use crate::error::{Result, StackctlError};
use crate::exec::{ExecOptions, Executor, StdinSource};
use crate::providers::traits::{EntryOutcome, HostEntry, HostsProvider};
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;

const BEGIN_MARKER: &str = "# BEGIN stackctl managed";
const END_MARKER: &str = "# END stackctl managed";

static ENTRY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9A-Fa-f:.]+)\s+(\S+)").expect("valid entry pattern"));

pub struct HostsFileProvider {
    executor: Arc<dyn Executor>,
    file: String,
    use_sudo: bool,
}

impl HostsFileProvider {
    pub fn new(config: &Config, executor: Arc<dyn Executor>) -> Self {
        Self {
            file: config.hosts.file.clone(),
            use_sudo: config.hosts.use_sudo,
            executor,
        }
    }

    fn read(&self) -> Result<String> {
        let result = self.executor.run(
            "cat",
            &[self.file.clone()],
            &ExecOptions::default(),
        )?;
        if !result.success() {
            return Err(StackctlError::SystemCommandFailed {
                command: format!("cat {}", self.file),
                reason: result.stderr.trim().to_string(),
            });
        }
        Ok(result.stdout)
    }

    fn write(&self, content: &str) -> Result<()> {
        let line = if self.use_sudo {
            format!("sudo tee {} > /dev/null", self.file)
        } else {
            format!("tee {} > /dev/null", self.file)
        };
        let opts = ExecOptions::default()
            .with_stdin(StdinSource::Bytes(content.as_bytes().to_vec()));
        let result = self.executor.run(
            "sh",
            &["-c".to_string(), line],
            &opts,
        )?;
        if !result.success() {
            return Err(StackctlError::SystemCommandFailed {
                command: format!("write {}", self.file),
                reason: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    fn managed_entries(&self, content: &str) -> Vec<HostEntry> {
        parse_managed_block(content)
    }

    /// Replace the managed block (or append one) and keep everything
    /// outside it byte-for-byte.
    fn render(&self, content: &str, entries: &[HostEntry]) -> String {
        let mut out = Vec::new();
        let mut in_block = false;
        let mut had_block = false;

        for line in content.lines() {
            if line.trim() == BEGIN_MARKER {
                in_block = true;
                had_block = true;
                out.push(BEGIN_MARKER.to_string());
                for entry in entries {
                    out.push(format!("{} {}", entry.ip, entry.hostname));
                }
                continue;
            }
            if line.trim() == END_MARKER {
                in_block = false;
                out.push(END_MARKER.to_string());
                continue;
            }
            if !in_block {
                out.push(line.to_string());
            }
        }

        if !had_block && !entries.is_empty() {
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push(String::new());
            }
            out.push(BEGIN_MARKER.to_string());
            for entry in entries {
                out.push(format!("{} {}", entry.ip, entry.hostname));
            }
            out.push(END_MARKER.to_string());
        }

        let mut rendered = out.join("\n");
        rendered.push('\n');
        rendered
    }
}

fn parse_managed_block(content: &str) -> Vec<HostEntry> {
    let mut entries = Vec::new();
    let mut in_block = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == BEGIN_MARKER {
            in_block = true;
            continue;
        }
        if trimmed == END_MARKER {
            in_block = false;
            continue;
        }
        if in_block
            && let Some(caps) = ENTRY_REGEX.captures(line)
        {
            entries.push(HostEntry {
                ip: caps[1].to_string(),
                hostname: caps[2].to_string(),
            });
        }
    }
    entries
}

impl HostsProvider for HostsFileProvider {
    fn driver(&self) -> &'static str {
        "file"
    }

    fn add_entries(&self, entries: &[HostEntry]) -> Result<Vec<(HostEntry, EntryOutcome)>> {
        let content = self.read()?;
        let mut managed = self.managed_entries(&content);
        let mut outcomes = Vec::new();
        let mut changed = false;

        for entry in entries {
            match managed.iter_mut().find(|e| e.hostname == entry.hostname) {
                // Same hostname and IP: idempotent, report skipped.
                Some(existing) if existing.ip == entry.ip => {
                    outcomes.push((entry.clone(), EntryOutcome::Skipped));
                }
                // Same hostname, different IP: take the new address.
                Some(existing) => {
                    existing.ip = entry.ip.clone();
                    outcomes.push((entry.clone(), EntryOutcome::Updated));
                    changed = true;
                }
                None => {
                    managed.push(entry.clone());
                    outcomes.push((entry.clone(), EntryOutcome::Added));
                    changed = true;
                }
            }
        }

        if changed {
            self.write(&self.render(&content, &managed))?;
        }
        Ok(outcomes)
    }

    fn remove_entries(&self, hostnames: &[String]) -> Result<Vec<(String, EntryOutcome)>> {
        let content = self.read()?;
        let mut managed = self.managed_entries(&content);
        let mut outcomes = Vec::new();
        let mut changed = false;

        for hostname in hostnames {
            let before = managed.len();
            managed.retain(|e| &e.hostname != hostname);
            if managed.len() < before {
                outcomes.push((hostname.clone(), EntryOutcome::Removed));
                changed = true;
            } else {
                // Absent already; not an error.
                outcomes.push((hostname.clone(), EntryOutcome::NotFound));
            }
        }

        if changed {
            self.write(&self.render(&content, &managed))?;
        }
        Ok(outcomes)
    }

    fn check_entries(&self, entries: &[HostEntry]) -> Result<Vec<(HostEntry, bool)>> {
        let managed = self.managed_entries(&self.read()?);
        Ok(entries
            .iter()
            .map(|entry| {
                let present = managed
                    .iter()
                    .any(|e| e.hostname == entry.hostname && e.ip == entry.ip);
                (entry.clone(), present)
            })
            .collect())
    }

    fn list_entries(&self) -> Result<Vec<HostEntry>> {
        Ok(self.managed_entries(&self.read()?))
    }
}
