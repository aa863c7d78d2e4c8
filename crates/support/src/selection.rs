use crate::error::{FormError, Result};
use std::collections::BTreeSet;

const EXCLUDE_PREFIX: char = '!';

/// Split a comma, space or tab delimited list, dropping empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ' ', '\t'])
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Which contracts a request selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContractFilter {
    #[default]
    All,
    Include(BTreeSet<String>),
    Exclude(BTreeSet<String>),
}

impl ContractFilter {
    /// Parse a list where plain names include and `!name` excludes.
    /// A list may not mix both.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut include = BTreeSet::new();
        let mut exclude = BTreeSet::new();
        for item in split_list(raw) {
            match item.strip_prefix(EXCLUDE_PREFIX) {
                Some("") => {}
                Some(name) => {
                    exclude.insert(name.to_string());
                }
                None => {
                    include.insert(item);
                }
            }
        }

        match (include.is_empty(), exclude.is_empty()) {
            (true, true) => Ok(Self::All),
            (false, true) => Ok(Self::Include(include)),
            (true, false) => Ok(Self::Exclude(exclude)),
            (false, false) => Err(FormError::MixedSelection {
                include: join(&include),
                exclude: join(&exclude),
            }),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether a contract known by any of `names` (short name, full id) is
    /// selected.
    pub fn selects<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        match self {
            Self::All => true,
            Self::Include(set) => names.into_iter().any(|name| set.contains(name)),
            Self::Exclude(set) => !names.into_iter().any(|name| set.contains(name)),
        }
    }

    /// Included names that match none of `known`.
    pub fn unknown_includes<'a>(&self, known: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let Self::Include(set) = self else {
            return Vec::new();
        };
        let known: BTreeSet<&str> = known.into_iter().collect();
        set.iter()
            .filter(|name| !known.contains(name.as_str()))
            .cloned()
            .collect()
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
