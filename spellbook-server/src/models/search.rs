//! Spell name search terms

/// A non-empty, case-insensitive spell name search.
///
/// By default the term must match the start of the name; `anywhere`
/// widens it to a substring match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellSearch {
    term: String,
    anywhere: bool,
}

impl SpellSearch {
    /// Build a search from the raw `q` parameter.
    ///
    /// Returns `None` for an absent or empty term, in which case no query
    /// should be issued at all.
    pub fn new(term: Option<&str>, anywhere: bool) -> Option<Self> {
        let term = term.filter(|t| !t.is_empty())?;
        Some(Self {
            term: term.to_owned(),
            anywhere,
        })
    }

    /// `ILIKE` pattern for this search.
    ///
    /// LIKE metacharacters in the term are escaped with `\` (the Postgres
    /// default escape character) so they match literally.
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.term.len() + 2);
        if self.anywhere {
            pattern.push('%');
        }
        for c in self.term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }

    /// In-process equivalent of `name ILIKE like_pattern()`.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        let term = self.term.to_lowercase();
        if self.anywhere {
            name.contains(&term)
        } else {
            name.starts_with(&term)
        }
    }
}
