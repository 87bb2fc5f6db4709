use serde::{Deserialize, Serialize};

/// Ordinal phase identifier. Phase 1 is the first phase.
pub type PhaseId = u32;

/// Static tuning row for one difficulty tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Multiplier on base enemy speed.
    pub speed_multiplier: f64,
    /// Multiplier on spawn frequency (higher = more frequent).
    pub spawn_rate: f64,
    /// Multiplier applied to awarded points.
    pub points_multiplier: f64,
    /// Cumulative score required to enter this phase.
    pub required_score: u64,
    /// Enemy archetypes eligible to spawn.
    pub enemy_types: Vec<String>,
}

/// Reasons a phase table is rejected at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseTableError {
    Empty,
    NonContiguousIds { position: usize, found: PhaseId },
    FirstThresholdNotZero(u64),
    ThresholdNotIncreasing { id: PhaseId },
    BadMultiplier { id: PhaseId },
    NoEnemyTypes { id: PhaseId },
    Parse(String),
}

impl std::fmt::Display for PhaseTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "phase table is empty"),
            Self::NonContiguousIds { position, found } => {
                write!(f, "phase at position {position} has id {found}, expected {}", position + 1)
            },
            Self::FirstThresholdNotZero(t) => {
                write!(f, "first phase must require score 0, found {t}")
            },
            Self::ThresholdNotIncreasing { id } => {
                write!(f, "phase {id} threshold must exceed the previous phase's")
            },
            Self::BadMultiplier { id } => write!(f, "phase {id} has a non-positive multiplier"),
            Self::NoEnemyTypes { id } => write!(f, "phase {id} has no enemy types"),
            Self::Parse(m) => write!(f, "invalid phase table: {m}"),
        }
    }
}

impl std::error::Error for PhaseTableError {}

/// Ordered, validated list of phases. Read-only at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseTable {
    phases: Vec<Phase>,
}

impl TryFrom<Vec<Phase>> for PhaseTable {
    type Error = PhaseTableError;

    fn try_from(phases: Vec<Phase>) -> Result<Self, Self::Error> {
        Self::new(phases)
    }
}

impl From<PhaseTable> for Vec<Phase> {
    fn from(table: PhaseTable) -> Self {
        table.phases
    }
}

#[derive(Deserialize)]
struct PhaseFile {
    phases: Vec<Phase>,
}

impl PhaseTable {
    pub fn new(phases: Vec<Phase>) -> Result<Self, PhaseTableError> {
        let Some(first) = phases.first() else {
            return Err(PhaseTableError::Empty);
        };
        if first.required_score != 0 {
            return Err(PhaseTableError::FirstThresholdNotZero(first.required_score));
        }
        for (i, phase) in phases.iter().enumerate() {
            if phase.id as usize != i + 1 {
                return Err(PhaseTableError::NonContiguousIds {
                    position: i,
                    found: phase.id,
                });
            }
            if !(phase.speed_multiplier > 0.0
                && phase.spawn_rate > 0.0
                && phase.points_multiplier > 0.0)
            {
                return Err(PhaseTableError::BadMultiplier { id: phase.id });
            }
            if phase.enemy_types.is_empty() {
                return Err(PhaseTableError::NoEnemyTypes { id: phase.id });
            }
            if i > 0 && phase.required_score <= phases[i - 1].required_score {
                return Err(PhaseTableError::ThresholdNotIncreasing { id: phase.id });
            }
        }
        Ok(Self { phases })
    }

    /// Parse a `[[phases]]` TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, PhaseTableError> {
        let file: PhaseFile =
            toml::from_str(contents).map_err(|e| PhaseTableError::Parse(e.to_string()))?;
        Self::new(file.phases)
    }

    /// Load from a TOML file, falling back to the seeded table when the path
    /// is missing or invalid.
    pub fn load(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml(&contents) {
                Ok(table) => {
                    tracing::info!(path, phases = table.len(), "Loaded phase table");
                    table
                },
                Err(e) => {
                    tracing::warn!(path, "Rejected phase table: {e}, using defaults");
                    Self::default()
                },
            },
            Err(e) => {
                tracing::warn!(path, "Could not read phase table: {e}, using defaults");
                Self::default()
            },
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, id: PhaseId) -> Option<&Phase> {
        let idx = (id as usize).checked_sub(1)?;
        self.phases.get(idx)
    }

    /// The phase for `id`, clamped into the configured range.
    pub fn get_clamped(&self, id: PhaseId) -> &Phase {
        let idx = (id.max(1) as usize - 1).min(self.phases.len() - 1);
        &self.phases[idx]
    }

    pub fn first(&self) -> &Phase {
        &self.phases[0]
    }

    pub fn last_id(&self) -> PhaseId {
        self.phases.len() as PhaseId
    }

    pub fn is_terminal(&self, id: PhaseId) -> bool {
        id >= self.last_id()
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        #[allow(clippy::too_many_arguments)]
        fn phase(
            id: PhaseId,
            name: &str,
            description: &str,
            speed: f64,
            spawn: f64,
            points: f64,
            required: u64,
            enemies: &[&str],
        ) -> Phase {
            Phase {
                id,
                name: name.to_string(),
                description: description.to_string(),
                speed_multiplier: speed,
                spawn_rate: spawn,
                points_multiplier: points,
                required_score: required,
                enemy_types: enemies.iter().map(|e| e.to_string()).collect(),
            }
        }

        Self {
            phases: vec![
                phase(1, "Street", "The streets where it all began", 1.0, 1.0, 1.0, 0, &["biker"]),
                phase(
                    2,
                    "Highway",
                    "Fast lanes, faster bikers",
                    1.2,
                    1.1,
                    1.2,
                    1000,
                    &["biker", "fast_biker"],
                ),
                phase(
                    3,
                    "City Center",
                    "Downtown chaos",
                    1.4,
                    1.2,
                    1.5,
                    3000,
                    &["biker", "fast_biker", "armored_biker"],
                ),
                phase(
                    4,
                    "Beach Road",
                    "Sunny showdown",
                    1.5,
                    1.3,
                    1.8,
                    6000,
                    &["fast_biker", "armored_biker"],
                ),
                phase(
                    5,
                    "Night City",
                    "Neon-lit battles",
                    1.7,
                    1.4,
                    2.0,
                    10000,
                    &["fast_biker", "armored_biker", "boss"],
                ),
                phase(
                    6,
                    "Endless Mode",
                    "How far can you go?",
                    2.0,
                    1.5,
                    2.5,
                    15000,
                    &["fast_biker", "armored_biker", "boss"],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_table_is_valid() {
        let table = PhaseTable::default();
        assert!(PhaseTable::new(table.phases().to_vec()).is_ok());
        assert_eq!(table.len(), 6);
        assert_eq!(table.first().name, "Street");
        assert_eq!(table.get(2).unwrap().required_score, 1000);
        assert!(table.get(0).is_none());
        assert!(table.get(7).is_none());
        assert!(table.is_terminal(6));
        assert!(!table.is_terminal(5));
    }

    #[test]
    fn get_clamped_stays_in_range() {
        let table = PhaseTable::default();
        assert_eq!(table.get_clamped(0).id, 1);
        assert_eq!(table.get_clamped(99).id, 6);
        assert_eq!(table.get_clamped(3).id, 3);
    }

    #[test]
    fn rejects_gaps_and_bad_thresholds() {
        let mut phases = PhaseTable::default().phases().to_vec();
        phases[2].id = 7;
        assert!(matches!(
            PhaseTable::new(phases),
            Err(PhaseTableError::NonContiguousIds { position: 2, .. })
        ));

        let mut phases = PhaseTable::default().phases().to_vec();
        phases[3].required_score = phases[2].required_score;
        assert_eq!(
            PhaseTable::new(phases),
            Err(PhaseTableError::ThresholdNotIncreasing { id: 4 })
        );

        let mut phases = PhaseTable::default().phases().to_vec();
        phases[0].required_score = 10;
        assert_eq!(
            PhaseTable::new(phases),
            Err(PhaseTableError::FirstThresholdNotZero(10))
        );

        assert_eq!(PhaseTable::new(vec![]), Err(PhaseTableError::Empty));
    }

    #[test]
    fn rejects_non_positive_multiplier() {
        let mut phases = PhaseTable::default().phases().to_vec();
        phases[1].points_multiplier = 0.0;
        assert_eq!(
            PhaseTable::new(phases),
            Err(PhaseTableError::BadMultiplier { id: 2 })
        );
    }

    #[test]
    fn parses_toml_table() {
        let doc = r#"
[[phases]]
id = 1
name = "Warmup"
speed_multiplier = 1.0
spawn_rate = 1.0
points_multiplier = 1.0
required_score = 0
enemy_types = ["biker"]

[[phases]]
id = 2
name = "Rush"
description = "Go"
speed_multiplier = 1.5
spawn_rate = 1.5
points_multiplier = 2.0
required_score = 500
enemy_types = ["biker", "boss"]
"#;
        let table = PhaseTable::from_toml(doc).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(2).unwrap().name, "Rush");
        assert_eq!(table.get(1).unwrap().description, "");
    }

    #[test]
    fn load_without_path_uses_seed() {
        assert_eq!(PhaseTable::load(None), PhaseTable::default());
        assert_eq!(
            PhaseTable::load(Some("/nonexistent/phases.toml")),
            PhaseTable::default()
        );
    }

    #[test]
    fn serializes_as_plain_list() {
        let json = serde_json::to_value(PhaseTable::default()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[1]["name"], "Highway");

        let back: PhaseTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, PhaseTable::default());
        assert!(serde_json::from_str::<PhaseTable>("[]").is_err());
    }

    #[test]
    fn shipped_phase_file_matches_seed() {
        let table = PhaseTable::from_toml(include_str!("../../../config/phases.toml")).unwrap();
        assert_eq!(table, PhaseTable::default());
    }
}
