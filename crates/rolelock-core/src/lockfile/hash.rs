//! Declaration content hashing.

use crate::compat::InterpreterSpec;
use crate::types::EntityKind;

/// One `<kind>:<name>:<constraint>` line of hash input.
///
/// Roles with a source locator append `:<src>:<scm>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct HashRecord {
    pub kind: EntityKind,
    pub name: String,
    pub constraint: String,
    pub locator: Option<(String, String)>,
}

impl HashRecord {
    pub fn new(kind: EntityKind, name: &str, constraint: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            constraint: constraint.to_string(),
            locator: None,
        }
    }

    /// Attach a role's source and scm. Nothing is attached when both are absent.
    pub fn with_locator(mut self, src: Option<&str>, scm: Option<&str>) -> Self {
        if src.is_some() || scm.is_some() {
            self.locator = Some((
                src.unwrap_or_default().to_string(),
                scm.unwrap_or_default().to_string(),
            ));
        }
        self
    }

    fn line(&self) -> String {
        match &self.locator {
            Some((src, scm)) => format!(
                "{}:{}:{}:{}:{}",
                self.kind, self.name, self.constraint, src, scm
            ),
            None => format!("{}:{}:{}", self.kind, self.name, self.constraint),
        }
    }
}

/// BLAKE3 hex digest over the interpreter line followed by every record.
///
/// Records are sorted by kind then name, so input order does not matter.
pub fn content_hash(python: &InterpreterSpec, records: impl IntoIterator<Item = HashRecord>) -> String {
    let mut records: Vec<HashRecord> = records.into_iter().collect();
    records.sort();

    let python = format!("python:{}:{}:{}", python.min, python.max, python.pinned);
    digest_lines(std::iter::once(python).chain(records.iter().map(HashRecord::line)))
}

/// BLAKE3 hex digest of newline-terminated lines, in the given order.
pub fn digest_lines(lines: impl IntoIterator<Item = String>) -> String {
    let mut hasher = blake3::Hasher::new();
    for line in lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python(pinned: &str) -> InterpreterSpec {
        InterpreterSpec {
            min: "3.10".to_string(),
            max: "3.13".to_string(),
            pinned: pinned.to_string(),
            additional: Vec::new(),
        }
    }

    #[test]
    fn test_hash_is_order_independent() {
        let a = HashRecord::new(EntityKind::Collection, "community.general", ">=8.0.0");
        let b = HashRecord::new(EntityKind::Tool, "ansible", "latest");
        let first = content_hash(&python("3.13.1"), vec![a.clone(), b.clone()]);
        let second = content_hash(&python("3.13.1"), vec![b, a]);
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_hash_changes_with_inputs() {
        let record = |c: &str| vec![HashRecord::new(EntityKind::Tool, "ansible", c)];
        let base = content_hash(&python("3.13.1"), record(">=10.0.0"));
        assert_ne!(base, content_hash(&python("3.13.1"), record(">=11.0.0")));
        assert_ne!(base, content_hash(&python("3.12.8"), record(">=10.0.0")));
    }

    #[test]
    fn test_hash_matches_blake3_of_records() {
        let expected = blake3::hash(b"python:3.10:3.13:3.13.1\nrole:base:latest\n")
            .to_hex()
            .to_string();
        let actual = content_hash(
            &python("3.13.1"),
            vec![HashRecord::new(EntityKind::Role, "base", "latest")],
        );
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_role_locator_changes_hash() {
        let role = |src: &str| {
            vec![HashRecord::new(EntityKind::Role, "base", "latest")
                .with_locator(Some(src), Some("git"))]
        };
        let before = content_hash(&python("3.13.1"), role("https://git.example.com/a/base.git"));
        let after = content_hash(&python("3.13.1"), role("https://mirror.example.com/b/base.git"));
        assert_ne!(before, after);
    }

    #[test]
    fn test_empty_locator_keeps_plain_line() {
        let plain = HashRecord::new(EntityKind::Role, "base", "latest");
        assert_eq!(plain.clone().with_locator(None, None), plain);
    }
}
