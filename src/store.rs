use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access completion store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode completion store: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no character with id {0}")]
    UnknownCharacter(Uuid),
    #[error("completion store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub completed: BTreeMap<String, bool>,
}

impl Character {
    pub fn is_completed(&self, quest_id: &str) -> bool {
        self.completed.get(quest_id).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSnapshot {
    pub characters: Vec<Character>,
    pub active_id: Option<Uuid>,
}

/// Where the store's state lives between runs.
pub trait StorePersistence: Send + Sync {
    fn load(&self) -> Result<StoreSnapshot, StoreError>;
    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: Mutex<StoreSnapshot>,
}

impl MemoryPersistence {
    pub fn new(initial: StoreSnapshot) -> Self {
        Self {
            saved: Mutex::new(initial),
        }
    }
}

impl StorePersistence for MemoryPersistence {
    fn load(&self) -> Result<StoreSnapshot, StoreError> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let mut saved = self.saved.lock().map_err(|_| StoreError::Poisoned)?;
        *saved = snapshot.clone();
        Ok(())
    }
}

/// JSON file on disk. A missing or unreadable file starts an empty store.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorePersistence for JsonFilePersistence {
    fn load(&self) -> Result<StoreSnapshot, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreSnapshot::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_str(&contents) {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "corrupt completion store, starting empty");
                Ok(StoreSnapshot::default())
            }
        }
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = File::create(&self.path).map_err(io_err)?;
        serde_json::to_writer_pretty(BufWriter::new(file), snapshot)?;
        Ok(())
    }
}

/// Per-character completion state. Every mutation is written through to the
/// injected persistence.
pub struct CompletionStore {
    snapshot: StoreSnapshot,
    persistence: Box<dyn StorePersistence>,
}

impl std::fmt::Debug for CompletionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStore")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl Default for CompletionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl CompletionStore {
    pub fn open(persistence: Box<dyn StorePersistence>) -> Result<Self, StoreError> {
        let mut snapshot = persistence.load()?;
        let active_known = snapshot
            .active_id
            .is_some_and(|id| snapshot.characters.iter().any(|c| c.id == id));
        if !active_known {
            snapshot.active_id = snapshot.characters.first().map(|c| c.id);
        }
        Ok(Self {
            snapshot,
            persistence,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            snapshot: StoreSnapshot::default(),
            persistence: Box::new(MemoryPersistence::default()),
        }
    }

    pub fn characters(&self) -> &[Character] {
        &self.snapshot.characters
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.snapshot.active_id
    }

    pub fn active(&self) -> Option<&Character> {
        let id = self.snapshot.active_id?;
        self.snapshot.characters.iter().find(|c| c.id == id)
    }

    /// Ids the active character has completed. Empty without one.
    pub fn completed_ids(&self) -> HashSet<String> {
        self.active()
            .map(|c| {
                c.completed
                    .iter()
                    .filter(|(_, done)| **done)
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_completed(&self, quest_id: &str) -> bool {
        self.active().is_some_and(|c| c.is_completed(quest_id))
    }

    /// Adds a character and makes it active.
    pub fn add_character(&mut self, name: &str) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.snapshot.characters.push(Character {
            id,
            name: name.trim().to_string(),
            completed: BTreeMap::new(),
        });
        self.snapshot.active_id = Some(id);
        self.persist()?;
        Ok(id)
    }

    pub fn rename_character(&mut self, id: Uuid, name: &str) -> Result<(), StoreError> {
        let character = self
            .snapshot
            .characters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::UnknownCharacter(id))?;
        character.name = name.trim().to_string();
        self.persist()
    }

    /// Removes a character. If it was active, the first remaining one takes
    /// over.
    pub fn remove_character(&mut self, id: Uuid) -> Result<(), StoreError> {
        let before = self.snapshot.characters.len();
        self.snapshot.characters.retain(|c| c.id != id);
        if self.snapshot.characters.len() == before {
            return Err(StoreError::UnknownCharacter(id));
        }
        if self.snapshot.active_id == Some(id) {
            self.snapshot.active_id = self.snapshot.characters.first().map(|c| c.id);
        }
        self.persist()
    }

    pub fn set_active(&mut self, id: Uuid) -> Result<(), StoreError> {
        if !self.snapshot.characters.iter().any(|c| c.id == id) {
            return Err(StoreError::UnknownCharacter(id));
        }
        self.snapshot.active_id = Some(id);
        self.persist()
    }

    /// Flips one quest for the active character and returns the new state,
    /// or `None` when no character is active.
    pub fn toggle_quest(&mut self, quest_id: &str) -> Result<Option<bool>, StoreError> {
        let Some(active) = self.snapshot.active_id else {
            return Ok(None);
        };
        let Some(character) = self.snapshot.characters.iter_mut().find(|c| c.id == active) else {
            return Ok(None);
        };
        let entry = character.completed.entry(quest_id.to_string()).or_insert(false);
        *entry = !*entry;
        let now = *entry;
        self.persist()?;
        Ok(Some(now))
    }

    fn persist(&self) -> Result<(), StoreError> {
        self.persistence.save(&self.snapshot)
    }
}
