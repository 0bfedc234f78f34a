//! OS identity stores: the colon-delimited passwd and group files.
//!
//! Declarative config only *adds* missing identities. A record whose name
//! already exists in the store is left untouched, whatever its fields say -
//! manually managed accounts always win over the declarative source.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use reconcile::Result;

use crate::config::{Group, User};
use crate::textfile;

/// Shared mechanics of both stores: whole read, append by name, whole
/// write on change.
#[derive(Debug)]
struct LineStore {
    path: PathBuf,
    lines: Vec<String>,
    names: HashSet<String>,
    dirty: bool,
}

impl LineStore {
    fn load(path: &Path) -> Result<Self> {
        let lines = textfile::read_lines(path)?;
        let names = lines
            .iter()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split(':').next())
            .map(str::to_string)
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            lines,
            names,
            dirty: false,
        })
    }

    fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn append(&mut self, name: &str, record: String) {
        self.lines.push(record);
        self.names.insert(name.to_string());
        self.dirty = true;
    }

    fn write_if_changed(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        textfile::write_lines(&self.path, &self.lines)?;
        self.dirty = false;
        Ok(true)
    }
}

/// The passwd store.
#[derive(Debug)]
pub struct PasswdFile(LineStore);

impl PasswdFile {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self(LineStore::load(path)?))
    }

    /// Append a record for `user` unless one with the same name exists.
    /// Returns whether a record was added.
    pub fn ensure_user(&mut self, user: &User) -> bool {
        if self.0.has(&user.name) {
            log::debug!("user {} already present, leaving record alone", user.name);
            return false;
        }
        self.0.append(&user.name, passwd_record(user));
        true
    }

    /// Rewrite the store if any record was appended. Returns whether a
    /// write happened.
    pub fn write_if_changed(&mut self) -> Result<bool> {
        self.0.write_if_changed()
    }
}

/// The group store.
#[derive(Debug)]
pub struct GroupFile(LineStore);

impl GroupFile {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self(LineStore::load(path)?))
    }

    /// Append a record for `group` unless one with the same name exists.
    /// Returns whether a record was added.
    pub fn ensure_group(&mut self, group: &Group) -> bool {
        if self.0.has(&group.name) {
            log::debug!("group {} already present, leaving record alone", group.name);
            return false;
        }
        self.0.append(&group.name, group_record(group));
        true
    }

    pub fn write_if_changed(&mut self) -> Result<bool> {
        self.0.write_if_changed()
    }
}

// Service accounts do not log in: no home, no shell.
fn passwd_record(user: &User) -> String {
    format!(
        "{}:x:{}:{}:{}:{}:{}",
        user.name,
        user.uid,
        user.gid,
        user.gecos.as_deref().unwrap_or(""),
        user.dir.as_deref().unwrap_or("/invalid"),
        user.shell.as_deref().unwrap_or("/bin/false"),
    )
}

fn group_record(group: &Group) -> String {
    format!("{}:x:{}:{}", group.name, group.gid, group.members.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn user(name: &str, uid: u32) -> User {
        User {
            name: name.to_string(),
            uid,
            gid: uid,
            gecos: None,
            dir: None,
            shell: None,
            password: None,
        }
    }

    #[test]
    fn appends_missing_user() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        fs::write(&path, "root:x:0:0:root:/root:/bin/bash\n").unwrap();

        let mut passwd = PasswdFile::load(&path).unwrap();
        assert!(passwd.ensure_user(&user("bob", 2001)));
        assert!(passwd.write_if_changed().unwrap());

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "root:x:0:0:root:/root:/bin/bash\nbob:x:2001:2001::/invalid:/bin/false\n"
        );
    }

    #[test]
    fn never_overwrites_existing_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        fs::write(&path, "alice:x:1000:1000::/home/alice:/bin/bash\n").unwrap();

        let mut passwd = PasswdFile::load(&path).unwrap();
        // Declared with a different uid; the store record wins.
        assert!(!passwd.ensure_user(&user("alice", 2000)));
        assert!(!passwd.write_if_changed().unwrap());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("alice:x:1000:1000"));
        assert!(!text.contains("2000"));
    }

    #[test]
    fn no_write_when_nothing_added() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        fs::write(&path, "bob:x:2001:2001::/invalid:/bin/false\n").unwrap();

        let mut passwd = PasswdFile::load(&path).unwrap();
        assert!(!passwd.ensure_user(&user("bob", 2001)));
        assert!(!passwd.write_if_changed().unwrap());
    }

    #[test]
    fn group_record_carries_members() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("group");
        fs::write(&path, "wheel:x:10:root\n").unwrap();

        let mut groups = GroupFile::load(&path).unwrap();
        let added = groups.ensure_group(&Group {
            name: "bobgrp".to_string(),
            gid: 2001,
            members: vec!["bob".to_string(), "alice".to_string()],
        });
        assert!(added);
        groups.write_if_changed().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "wheel:x:10:root\nbobgrp:x:2001:bob,alice\n");
    }

    #[test]
    fn declared_fields_flow_into_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwd");
        fs::write(&path, "").unwrap();

        let mut passwd = PasswdFile::load(&path).unwrap();
        passwd.ensure_user(&User {
            name: "carol".to_string(),
            uid: 3000,
            gid: 3000,
            gecos: Some("Carol".to_string()),
            dir: Some("/home/carol".to_string()),
            shell: Some("/bin/sh".to_string()),
            password: None,
        });
        passwd.write_if_changed().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "carol:x:3000:3000:Carol:/home/carol:/bin/sh\n");
    }

    #[test]
    fn missing_store_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(PasswdFile::load(&dir.path().join("absent")).is_err());
    }
}
