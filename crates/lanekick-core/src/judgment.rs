use serde::{Deserialize, Serialize};

/// Discrete outcome of one intercept action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    Miss,
    Hit,
    Perfect,
}

impl Judgment {
    /// Hits and perfects keep the combo alive.
    pub fn is_success(self) -> bool {
        !matches!(self, Judgment::Miss)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Judgment::Miss => "miss",
            Judgment::Hit => "hit",
            Judgment::Perfect => "perfect",
        }
    }
}

impl std::fmt::Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What produced a judged action.
///
/// A `Kick` is a player intercept attempt. A `Drop` is an entity that left
/// the play area unhandled; it is always judged as a miss and does not count
/// as an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[default]
    Kick,
    Drop,
}
