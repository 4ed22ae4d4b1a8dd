//! A user's known spells, stored as a JSON array in a single text column

use serde::{Deserialize, Serialize};

use super::spell::SpellId;

/// Ordered list of known spell ids.
///
/// Entries are not checked against the spell catalog; any integer is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellList(Vec<SpellId>);

impl SpellList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the stored column value. NULL and blank text decode as empty.
    pub fn decode(raw: Option<&str>) -> Result<Self, serde_json::Error> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::new()),
            Some(text) => serde_json::from_str(text),
        }
    }

    /// Encode for storage, e.g. `[5,12]`; the empty list is `[]`.
    pub fn encode(&self) -> String {
        serde_json::Value::from(self.0.clone()).to_string()
    }

    pub fn contains(&self, spell: SpellId) -> bool {
        self.0.contains(&spell)
    }

    /// Append `spell` unless already present. Returns whether the list changed.
    pub fn add(&mut self, spell: SpellId) -> bool {
        if self.contains(spell) {
            return false;
        }
        self.0.push(spell);
        true
    }

    /// Remove the first occurrence of `spell`. Returns whether the list changed.
    pub fn remove(&mut self, spell: SpellId) -> bool {
        match self.0.iter().position(|&s| s == spell) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[SpellId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SpellId>> for SpellList {
    fn from(spells: Vec<SpellId>) -> Self {
        Self(spells)
    }
}

/// Membership change applied to a stored spell list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellEdit {
    Add(SpellId),
    Remove(SpellId),
}

impl SpellEdit {
    /// Apply the edit in place. Returns whether the list changed.
    pub fn apply(self, list: &mut SpellList) -> bool {
        match self {
            Self::Add(spell) => list.add(spell),
            Self::Remove(spell) => list.remove(spell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_blank_decode_as_empty() {
        assert_eq!(SpellList::decode(None).unwrap(), SpellList::new());
        assert_eq!(SpellList::decode(Some("")).unwrap(), SpellList::new());
        assert_eq!(SpellList::decode(Some("  ")).unwrap(), SpellList::new());
        assert_eq!(SpellList::decode(Some("[]")).unwrap(), SpellList::new());
    }

    #[test]
    fn decodes_spaced_json() {
        let list = SpellList::decode(Some("[5, 12,3]")).unwrap();
        assert_eq!(list.as_slice(), &[5, 12, 3]);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(SpellList::decode(Some("5,12")).is_err());
        assert!(SpellList::decode(Some(r#"["5"]"#)).is_err());
    }

    #[test]
    fn empty_encodes_as_brackets() {
        assert_eq!(SpellList::new().encode(), "[]");
        assert_eq!(SpellList::from(vec![5, 12]).encode(), "[5,12]");
    }

    #[test]
    fn add_is_idempotent() {
        let mut list = SpellList::new();
        assert!(list.add(5));
        assert!(!list.add(5));
        assert_eq!(list.as_slice(), &[5]);
    }

    #[test]
    fn remove_first_occurrence_only() {
        // Duplicates can only come from rows written outside this service.
        let mut list = SpellList::decode(Some("[1,2,1]")).unwrap();
        assert!(list.remove(1));
        assert_eq!(list.as_slice(), &[2, 1]);
        assert!(!list.remove(9));
        assert_eq!(list.as_slice(), &[2, 1]);
    }

    #[test]
    fn edit_reports_change() {
        let mut list = SpellList::new();
        assert!(SpellEdit::Add(3).apply(&mut list));
        assert!(!SpellEdit::Add(3).apply(&mut list));
        assert!(SpellEdit::Remove(3).apply(&mut list));
        assert!(list.is_empty());
    }
}
