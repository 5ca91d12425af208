use serde::{
    Deserialize,
    Serialize,
};
use std::cmp::Ordering;

/// Annotation details for a compound candidate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompoundInfo {
    pub name: String,
    pub id: Option<String>,
    pub formula: Option<String>,
    pub database_url: Option<String>,
    pub identification_method: Option<String>,
}

/// Candidate chemical identity of a peak list row.
///
/// Identities compare and order by name, [`CompoundIdentity::Unknown`]
/// always sorts last.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum CompoundIdentity {
    Known(CompoundInfo),
    #[default]
    Unknown,
}

impl CompoundIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Known(CompoundInfo {
            name: name.into(),
            ..Default::default()
        })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Known(info) => Some(&info.name),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl PartialEq for CompoundIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CompoundIdentity {}

impl PartialOrd for CompoundIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompoundIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Unknown, Self::Unknown) => Ordering::Equal,
            (Self::Unknown, _) => Ordering::Greater,
            (_, Self::Unknown) => Ordering::Less,
            (Self::Known(a), Self::Known(b)) => a.name.cmp(&b.name),
        }
    }
}

impl std::fmt::Display for CompoundIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(info) => write!(f, "{}", info.name),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
