//! Team identifiers.

use serde::{Deserialize, Serialize};

/// Key for per-team state.
///
/// Input events without a team belong to [`TeamKey::Default`]; it sorts
/// before every named team.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum TeamKey {
    /// The implicit team of single-team timelines
    #[default]
    Default,
    /// A named team
    Named(String),
}

impl TeamKey {
    /// Create a key from an optional team name.
    pub fn new(name: Option<&str>) -> Self {
        match name {
            Some(name) => Self::Named(name.to_string()),
            None => Self::Default,
        }
    }

    /// Team name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Named(name) => Some(name),
        }
    }

    /// Whether this is the implicit default team.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl From<Option<String>> for TeamKey {
    fn from(name: Option<String>) -> Self {
        match name {
            Some(name) => Self::Named(name),
            None => Self::Default,
        }
    }
}

impl From<TeamKey> for Option<String> {
    fn from(key: TeamKey) -> Self {
        match key {
            TeamKey::Default => None,
            TeamKey::Named(name) => Some(name),
        }
    }
}

impl From<&str> for TeamKey {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl std::fmt::Display for TeamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str("(default)"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sorts_first() {
        let mut keys = vec![TeamKey::from("beta"), TeamKey::Default, TeamKey::from("alpha")];
        keys.sort();
        assert_eq!(keys, vec![TeamKey::Default, TeamKey::from("alpha"), TeamKey::from("beta")]);
    }

    #[test]
    fn test_empty_name_is_not_default() {
        assert_ne!(TeamKey::new(Some("")), TeamKey::Default);
        assert!(TeamKey::new(None).is_default());
    }

    #[test]
    fn test_serde_as_optional_name() {
        assert_eq!(serde_json::to_string(&TeamKey::Default).unwrap(), "null");
        assert_eq!(serde_json::to_string(&TeamKey::from("web")).unwrap(), "\"web\"");
        let key: TeamKey = serde_json::from_str("\"web\"").unwrap();
        assert_eq!(key.name(), Some("web"));
    }
}
