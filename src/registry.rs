//! Registry-backed service configuration.
//!
//! The served daemons read their effective configuration from a registry
//! store that is only reachable through the `net` tool. The reconciler
//! reads the current state with `net conf list`, computes the declared
//! sections, and issues one `net conf setparm` per missing or differing
//! key - never a wholesale replace, so keys added outside the declarative
//! model survive.

use std::collections::BTreeMap;
use std::io::Write;

use reconcile::{Result, ToolRunner, runner};

use crate::config::IdentityConfig;

const NET: &str = "net";

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Reconciler for the registry configuration store.
pub struct RegistryConfig<'a, R: ToolRunner> {
    runner: &'a R,
}

impl<'a, R: ToolRunner> RegistryConfig<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Import declared settings, returning the number of keys written.
    ///
    /// Safe to invoke repeatedly: with an unchanged declarative source the
    /// second run issues no `setparm` at all.
    pub fn import(&self, config: &IdentityConfig) -> Result<usize> {
        let desired = desired_sections(config);
        let current = self.current_sections()?;

        let mut writes = 0;
        for (section, params) in &desired {
            let existing = current.get(section);
            for (key, value) in params {
                if existing.and_then(|params| params.get(key)) == Some(value) {
                    continue;
                }
                self.set_param(section, key, value)?;
                writes += 1;
            }
        }
        log::info!("registry import applied {writes} settings");
        Ok(writes)
    }

    fn current_sections(&self) -> Result<Sections> {
        let args = ["conf", "list"];
        let output = self
            .runner
            .run(NET, &args)?
            .require_success(&runner::command_line(NET, &args))?;
        Ok(parse_sections(&output.stdout_str()))
    }

    // setparm creates a missing section implicitly, so shares never need a
    // separate addshare call.
    fn set_param(&self, section: &str, key: &str, value: &str) -> Result<()> {
        log::debug!("net conf setparm [{section}] {key} = {value}");
        let args = ["conf", "setparm", section, key, value];
        self.runner
            .run(NET, &args)?
            .require_success(&runner::command_line(NET, &args))?;
        Ok(())
    }
}

/// Sections the declarative config wants present.
fn desired_sections(config: &IdentityConfig) -> Sections {
    let mut sections = Sections::new();
    sections.insert("global".to_string(), config.global_options());
    for share in &config.shares {
        sections.insert(share.name.clone(), share.options.clone());
    }
    sections
}

/// Parse `net conf list` output: `[section]` headers followed by
/// `key = value` lines.
fn parse_sections(text: &str) -> Sections {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        if let (Some(section), Some((key, value))) = (&current, line.split_once('=')) {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    sections
}

/// Render the declared configuration as smb.conf text.
pub fn render(config: &IdentityConfig, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "[global]")?;
    for (key, value) in config.global_options() {
        writeln!(out, "\t{key} = {value}")?;
    }
    for share in &config.shares {
        writeln!(out)?;
        writeln!(out, "[{}]", share.name)?;
        for (key, value) in &share.options {
            writeln!(out, "\t{key} = {value}")?;
        }
    }
    Ok(())
}
