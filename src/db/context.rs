//! Context repository for the personal fact store

use super::DbPool;
use crate::{Error, Result};

/// A stored personal context fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub key: String,
    pub value: String,
}

/// Context repository
///
/// Reads are concurrent at serve time; writes (seeding) run exclusively at
/// startup or maintenance time.
#[derive(Clone)]
pub struct ContextRepo {
    pool: DbPool,
}

impl ContextRepo {
    /// Create a new context repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all facts, ordered by key for deterministic output
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn all(&self) -> Result<Vec<Fact>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM user_contexts ORDER BY key")
            .map_err(|e| Error::Database(e.to_string()))?;

        let facts = stmt
            .query_map([], |row| {
                Ok(Fact {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(facts)
    }

    /// Get a specific fact value
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM user_contexts WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .ok();

        Ok(value)
    }

    /// Set a fact value (last write for a key wins)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO user_contexts (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            [key, value],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// Replace the whole store with the given facts
    ///
    /// Clears old rows, then inserts, in one transaction. Running it twice
    /// with the same facts leaves exactly one row per distinct key.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn seed(&self, facts: &[(&str, &str)]) -> Result<()> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        tx.execute("DELETE FROM user_contexts", [])
            .map_err(|e| Error::Database(e.to_string()))?;

        for (key, value) in facts {
            tx.execute(
                "INSERT INTO user_contexts (key, value) VALUES (?1, ?2)",
                [key, value],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        }

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;

        tracing::info!(count = facts.len(), "context store seeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn setup() -> ContextRepo {
        let pool = init_memory().unwrap();
        ContextRepo::new(pool)
    }

    #[test]
    fn test_all_empty() {
        let repo = setup();
        assert!(repo.all().unwrap().is_empty());
    }

    #[test]
    fn test_all_is_ordered_by_key() {
        let repo = setup();

        repo.set("spouse_name", "Sarah").unwrap();
        repo.set("dog_name", "Buster").unwrap();
        repo.set("home_address", "42 Wallaby Way, Sydney").unwrap();

        let keys: Vec<String> = repo.all().unwrap().into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["dog_name", "home_address", "spouse_name"]);
    }

    #[test]
    fn test_set_last_write_wins() {
        let repo = setup();

        repo.set("dog_name", "Buster").unwrap();
        repo.set("dog_name", "Rex").unwrap();

        assert_eq!(repo.get("dog_name").unwrap(), Some("Rex".to_string()));
        assert_eq!(repo.all().unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let repo = setup();
        assert_eq!(repo.get("spouse_name").unwrap(), None);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let repo = setup();
        let facts = [
            ("spouse_name", "Sarah"),
            ("dog_name", "Buster"),
        ];

        repo.seed(&facts).unwrap();
        repo.seed(&facts).unwrap();

        let stored = repo.all().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(repo.get("spouse_name").unwrap(), Some("Sarah".to_string()));
    }

    #[test]
    fn test_seed_replaces_old_data() {
        let repo = setup();

        repo.seed(&[("dog_name", "Buster"), ("cat_name", "Mia")]).unwrap();
        repo.seed(&[("dog_name", "Rex")]).unwrap();

        let stored = repo.all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, "Rex");
    }
}
