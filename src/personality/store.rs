//! Trait storage backends.
//!
//! A [`TraitStore`] persists one [`TraitSet`] per character and owns the
//! [`NudgeRule`] applied by the pipeline. Each `load` and `save` is atomic on
//! its own; the read-modify-write done by the pipeline is not, so two
//! concurrent updates for the same character can interleave and the later
//! `save` wins.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};

use super::nudge::{DefaultNudgeRule, NudgeRule};
use super::traits::TraitSet;
use crate::emotion::Emotion;
use crate::utilities::errors::StoreError;

/// Persistence contract for per-character trait sets.
#[async_trait]
pub trait TraitStore: Send + Sync {
    /// Load the traits of `character_id`. Unknown characters yield the
    /// store's seed set (empty unless configured), which averages to 50.
    async fn load(&self, character_id: &str) -> Result<TraitSet, StoreError>;

    /// Replace the traits of `character_id`. Either the whole set is written
    /// or nothing is. Non-finite scores are not stored.
    async fn save(&self, character_id: &str, traits: &TraitSet) -> Result<(), StoreError>;

    /// Apply this store's nudge rule. Defaults to [`DefaultNudgeRule`].
    fn nudge(&self, emotion: Emotion, text: &str, traits: &TraitSet) -> TraitSet {
        DefaultNudgeRule::default().nudge(emotion, text, traits)
    }
}

// ---------------------------------------------------------------------------
// InMemoryTraitStore
// ---------------------------------------------------------------------------

/// Process-local store, mainly for tests and the simulation harness.
pub struct InMemoryTraitStore {
    traits: RwLock<HashMap<String, TraitSet>>,
    seed: TraitSet,
    rule: Box<dyn NudgeRule>,
    available: AtomicBool,
}

impl Default for InMemoryTraitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryTraitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTraitStore")
            .field("characters", &self.traits.read().len())
            .field("seed", &self.seed)
            .field("available", &self.is_available())
            .finish()
    }
}

impl InMemoryTraitStore {
    pub fn new() -> Self {
        Self {
            traits: RwLock::new(HashMap::new()),
            seed: TraitSet::new(),
            rule: Box::new(DefaultNudgeRule::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Traits handed out for characters that were never saved.
    pub fn with_seed(mut self, seed: TraitSet) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rule(mut self, rule: impl NudgeRule + 'static) -> Self {
        self.rule = Box::new(rule);
        self
    }

    /// Store `traits` for `character_id` directly.
    pub fn insert(&self, character_id: impl Into<String>, traits: TraitSet) {
        self.traits.write().insert(character_id.into(), traits);
    }

    /// The saved traits of `character_id`, without the seed fallback.
    pub fn get(&self, character_id: &str) -> Option<TraitSet> {
        self.traits.read().get(character_id).cloned()
    }

    /// Simulate an outage: while unavailable, every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::unavailable("in-memory store switched off"))
        }
    }
}

#[async_trait]
impl TraitStore for InMemoryTraitStore {
    async fn load(&self, character_id: &str) -> Result<TraitSet, StoreError> {
        self.ensure_available()?;
        Ok(self
            .traits
            .read()
            .get(character_id)
            .cloned()
            .unwrap_or_else(|| self.seed.clone()))
    }

    async fn save(&self, character_id: &str, traits: &TraitSet) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.insert(character_id, traits.finite());
        Ok(())
    }

    fn nudge(&self, emotion: Emotion, text: &str, traits: &TraitSet) -> TraitSet {
        self.rule.nudge(emotion, text, traits)
    }
}

// ---------------------------------------------------------------------------
// SqliteTraitStore
// ---------------------------------------------------------------------------

/// SQLite-backed store: one row per character, traits encoded as JSON.
pub struct SqliteTraitStore {
    /// Path of the database file, or `:memory:`.
    pub db_path: String,
    conn: Mutex<Connection>,
    seed: TraitSet,
    rule: Box<dyn NudgeRule>,
}

impl std::fmt::Debug for SqliteTraitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTraitStore")
            .field("db_path", &self.db_path)
            .field("seed", &self.seed)
            .finish()
    }
}

impl SqliteTraitStore {
    /// Open (or create) the database at `path` and initialise its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::unavailable(format!(
                        "cannot create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn, path.display().to_string())
    }

    /// A private in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, db_path: String) -> Result<Self, StoreError> {
        let store = Self {
            db_path,
            conn: Mutex::new(conn),
            seed: TraitSet::new(),
            rule: Box::new(DefaultNudgeRule::default()),
        };
        store.init_db()?;
        Ok(store)
    }

    pub fn with_seed(mut self, seed: TraitSet) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rule(mut self, rule: impl NudgeRule + 'static) -> Self {
        self.rule = Box::new(rule);
        self
    }

    fn init_db(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS character_traits (
                character_id TEXT PRIMARY KEY,
                traits_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Identifiers of every stored character, sorted.
    pub fn characters(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT character_id FROM character_traits ORDER BY character_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

#[async_trait]
impl TraitStore for SqliteTraitStore {
    async fn load(&self, character_id: &str) -> Result<TraitSet, StoreError> {
        let stored: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT traits_json FROM character_traits WHERE character_id = ?1",
                params![character_id],
                |row| row.get(0),
            )
            .optional()?
        };
        match stored {
            Some(json) => {
                let value: serde_json::Value = serde_json::from_str(&json)?;
                Ok(TraitSet::from_value(&value))
            }
            None => Ok(self.seed.clone()),
        }
    }

    async fn save(&self, character_id: &str, traits: &TraitSet) -> Result<(), StoreError> {
        let json = serde_json::to_string(&traits.finite())?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO character_traits (character_id, traits_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(character_id) DO UPDATE SET
                traits_json = excluded.traits_json,
                updated_at = excluded.updated_at",
            params![character_id, json, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn nudge(&self, emotion: Emotion, text: &str, traits: &TraitSet) -> TraitSet {
        self.rule.nudge(emotion, text, traits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(pairs: &[(&str, f64)]) -> TraitSet {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[tokio::test]
    async fn test_in_memory_unknown_character_uses_seed() {
        let store = InMemoryTraitStore::new();
        assert!(store.load("nobody").await.unwrap().is_empty());

        let store = InMemoryTraitStore::new().with_seed(traits(&[("warmth", 50.0)]));
        assert_eq!(store.load("nobody").await.unwrap(), traits(&[("warmth", 50.0)]));
        assert!(store.get("nobody").is_none());
    }

    #[tokio::test]
    async fn test_in_memory_save_then_load() {
        let store = InMemoryTraitStore::new();
        store.save("char1", &traits(&[("openness", 61.0)])).await.unwrap();
        assert_eq!(
            store.load("char1").await.unwrap(),
            traits(&[("openness", 61.0)])
        );
    }

    #[tokio::test]
    async fn test_in_memory_outage() {
        let store = InMemoryTraitStore::new();
        store.insert("char1", traits(&[("warmth", 40.0)]));
        store.set_available(false);

        assert!(matches!(
            store.load("char1").await,
            Err(StoreError::Unavailable { .. })
        ));
        assert!(store.save("char1", &TraitSet::new()).await.is_err());

        store.set_available(true);
        assert_eq!(store.load("char1").await.unwrap(), traits(&[("warmth", 40.0)]));
    }

    #[test]
    fn test_custom_rule_is_used() {
        let flatten = |_: Emotion, _: &str, t: &TraitSet| -> TraitSet {
            t.iter().map(|(k, _)| (k, 0.0)).collect()
        };
        let store = InMemoryTraitStore::new().with_rule(flatten);
        let out = store.nudge(Emotion::Romantic, "", &traits(&[("warmth", 50.0)]));
        assert_eq!(out.get("warmth"), Some(0.0));
    }

    #[tokio::test]
    async fn test_sqlite_roundtrip() {
        let store = SqliteTraitStore::in_memory().unwrap();
        assert!(store.load("char1").await.unwrap().is_empty());

        store
            .save("char1", &traits(&[("openness", 50.0), ("warmth", 53.5)]))
            .await
            .unwrap();
        store.save("char1", &traits(&[("openness", 52.0), ("warmth", 55.0)])).await.unwrap();
        store.save("char2", &traits(&[("warmth", 10.0)])).await.unwrap();

        assert_eq!(
            store.load("char1").await.unwrap(),
            traits(&[("openness", 52.0), ("warmth", 55.0)])
        );
        assert_eq!(store.characters().unwrap(), vec!["char1", "char2"]);
    }

    #[tokio::test]
    async fn test_sqlite_file_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("traits.db");

        {
            let store = SqliteTraitStore::open(&path).unwrap();
            store.save("char1", &traits(&[("warmth", 70.0)])).await.unwrap();
        }

        let reopened = SqliteTraitStore::open(&path)
            .unwrap()
            .with_seed(traits(&[("warmth", 50.0)]));
        assert_eq!(reopened.load("char1").await.unwrap(), traits(&[("warmth", 70.0)]));
        assert_eq!(reopened.load("char2").await.unwrap(), traits(&[("warmth", 50.0)]));
    }

    #[test]
    fn test_sqlite_custom_rule_blocking() {
        let store = SqliteTraitStore::in_memory()
            .unwrap()
            .with_seed(traits(&[("shyness", 50.0)]))
            .with_rule(DefaultNudgeRule::new(0.5));
        let loaded = tokio_test::block_on(store.load("char1")).unwrap();
        let nudged = store.nudge(Emotion::Shy, "um", &loaded);
        // 50 + (80 - 50) * 0.5
        assert_eq!(nudged.get("shyness"), Some(65.0));
        tokio_test::block_on(store.save("char1", &nudged)).unwrap();
        assert_eq!(store.characters().unwrap(), vec!["char1"]);
    }

    #[tokio::test]
    async fn test_stores_agree_on_non_finite_scores() {
        let input = traits(&[("warmth", 60.0), ("mood", f64::NAN), ("zeal", f64::INFINITY)]);
        let memory = InMemoryTraitStore::new();
        let sqlite = SqliteTraitStore::in_memory().unwrap();

        memory.save("char1", &input).await.unwrap();
        sqlite.save("char1", &input).await.unwrap();

        let expected = traits(&[("warmth", 60.0)]);
        assert_eq!(memory.load("char1").await.unwrap(), expected);
        assert_eq!(sqlite.load("char1").await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_sqlite_corrupt_row_is_an_error() {
        let store = SqliteTraitStore::in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO character_traits VALUES ('bad', 'not json', 'now')",
                [],
            )
            .unwrap();
        assert!(matches!(
            store.load("bad").await,
            Err(StoreError::Serialization(_))
        ));
    }
}
