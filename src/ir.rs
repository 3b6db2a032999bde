use serde::{Deserialize, Deserializer, Serialize};

/// Reserved id prefix for synthetic level-gate nodes.
pub const LEVEL_GATE_PREFIX: &str = "LEVEL_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    LeftRight,
    TopBottom,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "LR" | "RIGHT" => Some(Self::LeftRight),
            "TB" | "TD" | "DOWN" => Some(Self::TopBottom),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::LeftRight => "LR",
            Self::TopBottom => "TB",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::LeftRight => Self::TopBottom,
            Self::TopBottom => Self::LeftRight,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight)
    }
}

/// One entry of the quest data feed, as delivered. Every field tolerates
/// absence or a wrong shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Quest {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(rename = "type", deserialize_with = "lenient_opt_string")]
    pub quest_type: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub icon: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub recommended_level: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub required_level: Option<i64>,
    #[serde(deserialize_with = "lenient_int")]
    pub zone_id: Option<i64>,
    #[serde(deserialize_with = "lenient_strings")]
    pub rewards: Vec<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub prerequisites: Vec<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub not_prerequisites: Vec<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub repeatable: bool,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub achievement_id: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub required_achievements_expr: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestFeed {
    #[serde(deserialize_with = "lenient_string")]
    pub generated_at: String,
    #[serde(deserialize_with = "lenient_count")]
    pub quest_count: usize,
    #[serde(deserialize_with = "lenient_count")]
    pub edge_count: usize,
    #[serde(deserialize_with = "lenient_quests")]
    pub quests: Vec<Quest>,
}

/// Known quest categories, in descending display importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestCategory {
    MainStory,
    Objective,
    Journey,
    SkillProgression,
    SeasonQuest,
    FactionStory,
    MountUnlock,
    MountRace,
    Event,
}

impl QuestCategory {
    const TABLE: [(&'static str, QuestCategory); 9] = [
        ("main story", QuestCategory::MainStory),
        ("objective", QuestCategory::Objective),
        ("journey", QuestCategory::Journey),
        ("skill progression", QuestCategory::SkillProgression),
        ("season quest", QuestCategory::SeasonQuest),
        ("faction story", QuestCategory::FactionStory),
        ("mount unlock", QuestCategory::MountUnlock),
        ("mount race", QuestCategory::MountRace),
        ("event", QuestCategory::Event),
    ];

    /// Case-insensitive containment match, first table hit wins.
    pub fn from_type(quest_type: &str) -> Option<Self> {
        let lower = quest_type.to_lowercase();
        Self::TABLE
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, category)| *category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Quest,
    LevelGate { level: u32 },
}

/// Derived, layout-only attributes. Not part of a node's identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayAttrs {
    pub priority: i32,
    pub band: i32,
    pub completed: bool,
    pub dimmed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestNode {
    pub id: String,
    pub kind: NodeKind,
    pub title: String,
    pub description: String,
    pub quest_type: String,
    pub required_level: u32,
    pub recommended_level: Option<u32>,
    pub zone_id: Option<i64>,
    pub prerequisites: Vec<String>,
    pub not_prerequisites: Vec<String>,
    pub icon: Option<String>,
    pub rewards: Vec<String>,
    pub repeatable: bool,
    pub display: DisplayAttrs,
}

impl QuestNode {
    pub fn level_gate(level: u32) -> Self {
        Self {
            id: level_gate_id(level),
            kind: NodeKind::LevelGate { level },
            title: format!("Level {level}"),
            description: format!("Reach level {level}"),
            quest_type: "Level".to_string(),
            required_level: level,
            recommended_level: None,
            zone_id: None,
            prerequisites: Vec::new(),
            not_prerequisites: Vec::new(),
            icon: None,
            rewards: Vec::new(),
            repeatable: false,
            display: DisplayAttrs::default(),
        }
    }

    pub fn is_level_gate(&self) -> bool {
        matches!(self.kind, NodeKind::LevelGate { .. })
    }

    pub fn category(&self) -> Option<QuestCategory> {
        QuestCategory::from_type(&self.quest_type)
    }
}

pub fn level_gate_id(level: u32) -> String {
    format!("{LEVEL_GATE_PREFIX}{level}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgePolarity {
    /// Prerequisite. Drives layering and alignment.
    Positive,
    /// Exclusion. Drawn, never laid out.
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub polarity: EdgePolarity,
}

impl Edge {
    pub fn positive(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            polarity: EdgePolarity::Positive,
        }
    }

    pub fn negative(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            polarity: EdgePolarity::Negative,
        }
    }

    pub fn key(&self) -> String {
        match self.polarity {
            EdgePolarity::Positive => format!("{}->{}", self.from, self.to),
            EdgePolarity::Negative => format!("not:{}->{}", self.from, self.to),
        }
    }
}

fn value_to_int(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        serde_json::Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_int(&value))
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(value).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(value))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
        }
        other => value_to_int(&other).is_some_and(|n| n != 0),
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_int(&value)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0))
}

/// Rows that are not objects are skipped; object rows never fail.
fn lenient_quests<'de, D>(deserializer: D) -> Result<Vec<Quest>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(rows) = value else {
        return Ok(Vec::new());
    };
    Ok(rows
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect())
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::String(s) if !s.trim().is_empty() => {
            return Ok(vec![s.trim().to_string()]);
        }
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect())
}
