use crate::ir::QuestFeed;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("quest feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("override table is not valid JSON5: {0}")]
    Json5(#[from] json5::Error),
}

/// Parses the quest feed. Only a document that is not JSON at all is an
/// error; missing or mistyped fields fall back to defaults.
pub fn parse_feed(input: &str) -> Result<QuestFeed, FeedError> {
    let mut feed: QuestFeed = serde_json::from_str(input)?;
    feed.quests.retain(|quest| !quest.id.trim().is_empty());
    for quest in &mut feed.quests {
        quest.id = quest.id.trim().to_string();
    }
    if feed.quest_count == 0 {
        feed.quest_count = feed.quests.len();
    }
    Ok(feed)
}

pub fn load_feed(path: &Path) -> Result<QuestFeed, FeedError> {
    let contents = read(path)?;
    let feed = parse_feed(&contents)?;
    tracing::info!(
        quests = feed.quests.len(),
        generated_at = %feed.generated_at,
        "loaded quest feed"
    );
    Ok(feed)
}

/// Hand-maintained fallbacks for values the feed does not carry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualOverrides {
    pub required_levels: HashMap<String, u32>,
}

impl ManualOverrides {
    pub fn required_level(&self, id: &str) -> Option<u32> {
        self.required_levels.get(id).copied().filter(|level| *level > 0)
    }
}

pub fn parse_overrides(input: &str) -> Result<ManualOverrides, FeedError> {
    Ok(json5::from_str(input)?)
}

pub fn load_overrides(path: Option<&Path>) -> Result<ManualOverrides, FeedError> {
    let Some(path) = path else {
        return Ok(ManualOverrides::default());
    };
    let overrides = parse_overrides(&read(path)?)?;
    tracing::debug!(entries = overrides.required_levels.len(), "loaded manual overrides");
    Ok(overrides)
}

fn read(path: &Path) -> Result<String, FeedError> {
    std::fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_with_missing_fields() {
        let feed = parse_feed(
            r#"{"generated_at":"2024-05-01T00:00:00Z","quests":[
                {"id":"Q1","title":"Find the Sword","prerequisites":[]},
                {"id":"  ","title":"blank id"},
                {"id":"Q2"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(feed.quests.len(), 2);
        assert_eq!(feed.quest_count, 2);
        assert_eq!(feed.quests[1].id, "Q2");
        assert!(feed.quests[1].not_prerequisites.is_empty());
    }

    #[test]
    fn malformed_rows_never_fail_the_feed() {
        let feed = parse_feed(
            r#"{"generated_at":null,"quest_count":"3","quests":[
                {"id":"Q1","title":null},
                {"id":"Q2","repeatable":null},
                {"id":42,"title":"Numeric id"},
                null,
                "not a quest"
            ]}"#,
        )
        .unwrap();
        let ids: Vec<&str> = feed.quests.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["Q1", "Q2", "42"]);
        assert_eq!(feed.quests[0].title, "");
        assert!(!feed.quests[1].repeatable);
        assert_eq!(feed.quest_count, 3);
        assert_eq!(feed.generated_at, "");

        let feed = parse_feed(r#"{"quests":{"id":"Q1"}}"#).unwrap();
        assert!(feed.quests.is_empty());
    }

    #[test]
    fn rejects_non_json_feed() {
        assert!(matches!(parse_feed("not json"), Err(FeedError::Json(_))));
    }

    #[test]
    fn parses_json5_overrides() {
        let overrides = parse_overrides(
            r#"{
                // levels missing from the export
                requiredLevels: { "Q7": 20, "Q8": 0, },
            }"#,
        )
        .unwrap();
        assert_eq!(overrides.required_level("Q7"), Some(20));
        assert_eq!(overrides.required_level("Q8"), None);
        assert_eq!(overrides.required_level("missing"), None);
    }
}
