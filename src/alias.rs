//! Persistent alias table.
//!
//! Entries are kept in insertion order and mirrored to a plain text file with one
//! `key=value` entry per line. Every mutation rewrites the whole file through a
//! temporary file in the same directory that is then renamed over the original.

use crate::error::AliasError;
use crate::lexer::strip_quotes;
use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ALIAS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.:+-]+$").expect("alias name pattern is valid")
});

/// Checks that `name` can be stored and read back unambiguously.
pub fn is_valid_name(name: &str) -> bool {
    ALIAS_NAME.is_match(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub name: String,
    pub value: String,
}

/// Alias table backed by a file.
#[derive(Debug)]
pub struct AliasTable {
    path: PathBuf,
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    /// Loads the table stored at `path`. A missing file is an empty table.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AliasError> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(AliasError::Load { path, source }),
        };
        let entries = parse_entries(&content, &path);
        log::debug!("loaded {} aliases from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// All replacement commands stored for `name`, in table order.
    ///
    /// A hand-edited file may carry the same key twice; every copy is returned.
    pub fn lookup<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.name == name)
            .map(|e| e.value.as_str())
    }

    /// Inserts `name` or replaces its value in place, then persists the table.
    ///
    /// One layer of surrounding quotes is removed from both fields. When the file
    /// can't be written, neither the file nor the in-memory table changes.
    pub fn upsert(&mut self, name: &str, value: &str) -> Result<(), AliasError> {
        let name = strip_quotes(name);
        let value = strip_quotes(value);
        if !is_valid_name(&name) {
            return Err(AliasError::InvalidName(name));
        }

        let mut updated = self.entries.clone();
        match updated.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.value = value,
            None => updated.push(AliasEntry { name, value }),
        }

        save_entries(&self.path, &updated).map_err(|source| AliasError::Save {
            path: self.path.clone(),
            source,
        })?;
        self.entries = updated;
        Ok(())
    }
}

fn parse_entries(content: &str, path: &Path) -> Vec<AliasEntry> {
    let mut entries = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once('=') {
            Some((name, value)) => entries.push(AliasEntry {
                name: strip_quotes(name),
                value: value.to_string(),
            }),
            None => log::warn!(
                "{}:{}: skipping alias line without '='",
                path.display(),
                lineno + 1
            ),
        }
    }
    entries
}

fn save_entries(path: &Path, entries: &[AliasEntry]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    for entry in entries {
        writeln!(tmp, "{}={}", entry.name, entry.value)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(table: &AliasTable) -> Vec<&str> {
        table.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = AliasTable::load(dir.path().join("aliases.txt")).unwrap();
        assert!(table.entries().is_empty());
    }

    #[test]
    fn test_upsert_strips_quotes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.txt");
        let mut table = AliasTable::load(&path).unwrap();

        table.upsert("\"ll\"", "\"ls -la\"").unwrap();

        assert_eq!(table.lookup("ll").collect::<Vec<_>>(), vec!["ls -la"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "ll=ls -la\n");

        let reloaded = AliasTable::load(&path).unwrap();
        assert_eq!(reloaded.entries(), table.entries());
    }

    #[test]
    fn test_redefinition_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.txt");
        let mut table = AliasTable::load(&path).unwrap();

        table.upsert("a", "echo a").unwrap();
        table.upsert("b", "echo b").unwrap();
        table.upsert("c", "echo c").unwrap();
        table.upsert("b", "echo B").unwrap();

        assert_eq!(names(&table), vec!["a", "b", "c"]);
        assert_eq!(table.lookup("b").collect::<Vec<_>>(), vec!["echo B"]);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a=echo a\nb=echo B\nc=echo c\n"
        );
    }

    #[test]
    fn test_value_may_contain_equals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.txt");
        let mut table = AliasTable::load(&path).unwrap();
        table.upsert("col", "ls --color=auto").unwrap();

        let reloaded = AliasTable::load(&path).unwrap();
        assert_eq!(
            reloaded.lookup("col").collect::<Vec<_>>(),
            vec!["ls --color=auto"]
        );
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = AliasTable::load(dir.path().join("aliases.txt")).unwrap();
        assert!(matches!(
            table.upsert("bad name", "ls"),
            Err(AliasError::InvalidName(_))
        ));
        assert!(matches!(
            table.upsert("a=b", "ls"),
            Err(AliasError::InvalidName(_))
        ));
        assert!(table.entries().is_empty());
    }

    #[test]
    fn test_failed_save_leaves_table_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("aliases.txt");
        let mut table = AliasTable::load(&path).unwrap();

        let res = table.upsert("ll", "ls -la");

        assert!(matches!(res, Err(AliasError::Save { .. })));
        assert!(table.entries().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_duplicate_keys_in_file_all_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.txt");
        fs::write(&path, "x=echo one\ngarbage line\nx=echo two\n").unwrap();

        let table = AliasTable::load(&path).unwrap();

        assert_eq!(
            table.lookup("x").collect::<Vec<_>>(),
            vec!["echo one", "echo two"]
        );
    }
}
