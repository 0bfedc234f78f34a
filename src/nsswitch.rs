//! Name-service switch configuration.
//!
//! The most conservative reconciler: it only ever adds the winbind module
//! to the passwd and group lookup directives. Existing modules, their
//! order, and every other line are preserved byte for byte.

use std::path::{Path, PathBuf};

use reconcile::Result;

use crate::textfile;

/// Databases that must list the winbind module for domain accounts to
/// resolve.
const DATABASES: &[&str] = &["passwd", "group"];

const MODULE: &str = "winbind";

#[derive(Debug)]
pub struct NameServiceSwitch {
    path: PathBuf,
    lines: Vec<String>,
    dirty: bool,
}

impl NameServiceSwitch {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            lines: textfile::read_lines(path)?,
            dirty: false,
        })
    }

    /// Whether every required database already lists winbind.
    pub fn winbind_enabled(&self) -> bool {
        DATABASES.iter().all(|db| self.has_module(db))
    }

    /// Append winbind to each required directive missing it; a database
    /// with no directive at all gets one. Returns the number of edited
    /// directives.
    pub fn ensure_winbind(&mut self) -> usize {
        let mut edits = 0;
        for &db in DATABASES {
            if self.has_module(db) {
                continue;
            }
            if let Some(line) = self
                .lines
                .iter_mut()
                .find(|line| directive_name(line) == Some(db))
            {
                *line = format!("{} {MODULE}", line.trim_end());
            } else {
                self.lines.push(format!("{db}: files {MODULE}"));
            }
            log::debug!("enabling {MODULE} for {db} lookups");
            edits += 1;
            self.dirty = true;
        }
        edits
    }

    /// Rewrite the store if any directive was edited. Returns whether a
    /// write happened.
    pub fn write_if_changed(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        textfile::write_lines(&self.path, &self.lines)?;
        self.dirty = false;
        Ok(true)
    }

    fn has_module(&self, db: &str) -> bool {
        self.lines.iter().any(|line| {
            directive_name(line) == Some(db) && directive_modules(line).any(|m| m == MODULE)
        })
    }
}

/// Database name of a directive line, if it is one.
fn directive_name(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') {
        return None;
    }
    line.split(':').next().map(str::trim).filter(|n| !n.is_empty())
}

/// Module tokens after the database name.
fn directive_modules(line: &str) -> impl Iterator<Item = &str> {
    line.split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or("")
        .split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn nss_file(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsswitch.conf");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn appends_winbind_to_existing_directives() {
        let (_dir, path) = nss_file("passwd: files\ngroup: files\nhosts: files dns\n");

        let mut nss = NameServiceSwitch::load(&path).unwrap();
        assert!(!nss.winbind_enabled());
        assert_eq!(nss.ensure_winbind(), 2);
        assert!(nss.write_if_changed().unwrap());

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "passwd: files winbind\ngroup: files winbind\nhosts: files dns\n"
        );
    }

    #[test]
    fn rerun_is_a_no_op() {
        let (_dir, path) = nss_file("passwd: files\ngroup: files\n");

        let mut nss = NameServiceSwitch::load(&path).unwrap();
        nss.ensure_winbind();
        nss.write_if_changed().unwrap();

        let mut nss = NameServiceSwitch::load(&path).unwrap();
        assert!(nss.winbind_enabled());
        assert_eq!(nss.ensure_winbind(), 0);
        assert!(!nss.write_if_changed().unwrap());

        // winbind appears exactly once per directive.
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("winbind").count(), 2);
    }

    #[test]
    fn missing_directive_is_created() {
        let (_dir, path) = nss_file("hosts: files dns\n");

        let mut nss = NameServiceSwitch::load(&path).unwrap();
        assert_eq!(nss.ensure_winbind(), 2);
        nss.write_if_changed().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "hosts: files dns\npasswd: files winbind\ngroup: files winbind\n"
        );
    }

    #[test]
    fn comments_and_unrelated_lines_survive() {
        let (_dir, path) = nss_file("# managed by hand\npasswd: files sss\ngroup: files winbind\n");

        let mut nss = NameServiceSwitch::load(&path).unwrap();
        assert_eq!(nss.ensure_winbind(), 1);
        nss.write_if_changed().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "# managed by hand\npasswd: files sss winbind\ngroup: files winbind\n"
        );
    }

    #[test]
    fn missing_store_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(NameServiceSwitch::load(&dir.path().join("absent")).is_err());
    }
}
