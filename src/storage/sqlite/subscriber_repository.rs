use std::collections::BTreeMap;

use rusqlite::OptionalExtension;

use crate::domain::{Category, Subscriber};
use crate::errors::{AlertError, AlertResult};
use crate::storage::sqlite::connection::snowflake_from_row;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::SubscriberRepository;

pub struct SqliteSubscriberRepository {
    storage: SqliteStorage,
}

impl SqliteSubscriberRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn load_preferences(
        conn: &rusqlite::Connection,
        user_id: u64,
    ) -> AlertResult<BTreeMap<Category, bool>> {
        let mut stmt = conn.prepare(
            "SELECT category, enabled FROM subscriber_preferences WHERE user_id = ?1",
        )?;

        let rows = stmt.query_map([user_id.to_string()], |row| {
            let category: String = row.get(0)?;
            let enabled: bool = row.get(1)?;
            Ok((category, enabled))
        })?;

        let mut preferences = BTreeMap::new();
        for row in rows {
            let (category, enabled) = row?;
            // Rows for categories this build no longer knows are ignored
            if let Ok(category) = category.parse::<Category>() {
                preferences.insert(category, enabled);
            }
        }

        Ok(preferences)
    }
}

impl SubscriberRepository for SqliteSubscriberRepository {
    fn add(&self, subscriber: &Subscriber) -> AlertResult<bool> {
        let mut conn = self.storage.connection()?;
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO subscribers (user_id) VALUES (?1)",
            [subscriber.user_id.to_string()],
        )?;

        if inserted == 0 {
            return Ok(false);
        }

        for (category, enabled) in &subscriber.preferences {
            tx.execute(
                "INSERT INTO subscriber_preferences (user_id, category, enabled) VALUES (?1, ?2, ?3)",
                (subscriber.user_id.to_string(), category.as_str(), enabled),
            )?;
        }

        tx.commit()?;
        Ok(true)
    }

    fn remove(&self, user_id: u64) -> AlertResult<bool> {
        let conn = self.storage.connection()?;
        let removed = conn.execute(
            "DELETE FROM subscribers WHERE user_id = ?1",
            [user_id.to_string()],
        )?;
        Ok(removed > 0)
    }

    fn get(&self, user_id: u64) -> AlertResult<Option<Subscriber>> {
        let conn = self.storage.connection()?;

        let created_at: Option<String> = conn
            .query_row(
                "SELECT created_at FROM subscribers WHERE user_id = ?1",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(created_at) = created_at else {
            return Ok(None);
        };

        let preferences = Self::load_preferences(&conn, user_id)?;

        Ok(Some(Subscriber {
            user_id,
            preferences,
            created_at: Some(created_at),
        }))
    }

    fn get_all(&self) -> AlertResult<Vec<Subscriber>> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare("SELECT user_id, created_at FROM subscribers ORDER BY created_at, user_id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((snowflake_from_row(row, 0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(user_id, created_at)| {
                Ok(Subscriber {
                    user_id,
                    preferences: Self::load_preferences(&conn, user_id)?,
                    created_at: Some(created_at),
                })
            })
            .collect()
    }

    fn set_preference(&self, user_id: u64, category: Category, enabled: bool) -> AlertResult<()> {
        let conn = self.storage.connection()?;

        let known: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM subscribers WHERE user_id = ?1)",
            [user_id.to_string()],
            |row| row.get(0),
        )?;

        if !known {
            return Err(AlertError::SubscriberNotFound(user_id));
        }

        conn.execute(
            "INSERT INTO subscriber_preferences (user_id, category, enabled) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, category) DO UPDATE SET enabled = excluded.enabled",
            (user_id.to_string(), category.as_str(), enabled),
        )?;

        Ok(())
    }

    fn subscribed_to(&self, category: Category) -> AlertResult<Vec<u64>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT p.user_id FROM subscriber_preferences p
             JOIN subscribers s ON s.user_id = p.user_id
             WHERE p.category = ?1 AND p.enabled = 1
             ORDER BY s.created_at, p.user_id",
        )?;

        let ids = stmt.query_map([category.as_str()], |row| snowflake_from_row(row, 0))?;

        ids.collect::<Result<Vec<_>, _>>().map_err(AlertError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> SqliteSubscriberRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteSubscriberRepository::new(storage)
    }

    #[test]
    fn test_add_and_get_subscriber() {
        let repo = setup_repo();
        let subscriber = Subscriber::new(1_424_712_212_823_543_859, &[]);

        assert!(repo.add(&subscriber).unwrap());

        let stored = repo.get(subscriber.user_id).unwrap().unwrap();
        assert_eq!(stored.user_id, 1_424_712_212_823_543_859);
        assert!(stored.wants(Category::Global));
        assert!(stored.wants(Category::Regional));
        assert!(stored.created_at.is_some());
    }

    #[test]
    fn test_duplicate_add_keeps_one_row() {
        let repo = setup_repo();

        assert!(repo.add(&Subscriber::new(7, &[Category::Global])).unwrap());
        assert!(!repo.add(&Subscriber::new(7, &[])).unwrap());

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        // First opt-in wins; the second call does not touch preferences
        assert!(!all[0].wants(Category::Regional));
    }

    #[test]
    fn test_remove_subscriber() {
        let repo = setup_repo();
        repo.add(&Subscriber::new(7, &[])).unwrap();

        assert!(repo.remove(7).unwrap());
        assert!(!repo.remove(7).unwrap());
        assert!(repo.get(7).unwrap().is_none());
        assert!(repo.subscribed_to(Category::Global).unwrap().is_empty());
    }

    #[test]
    fn test_set_preference() {
        let repo = setup_repo();
        repo.add(&Subscriber::new(7, &[])).unwrap();

        repo.set_preference(7, Category::Global, false).unwrap();

        let stored = repo.get(7).unwrap().unwrap();
        assert!(!stored.wants(Category::Global));
        assert!(stored.wants(Category::Regional));
    }

    #[test]
    fn test_set_preference_unknown_user() {
        let repo = setup_repo();
        let result = repo.set_preference(99, Category::Global, true);

        assert!(matches!(result, Err(AlertError::SubscriberNotFound(99))));
    }

    #[test]
    fn test_subscribed_to_filters_by_preference() {
        let repo = setup_repo();
        repo.add(&Subscriber::new(1, &[])).unwrap();
        repo.add(&Subscriber::new(2, &[Category::Regional])).unwrap();
        repo.add(&Subscriber::new(3, &[Category::Global])).unwrap();

        let mut regional = repo.subscribed_to(Category::Regional).unwrap();
        regional.sort_unstable();
        assert_eq!(regional, vec![1, 2]);

        let mut global = repo.subscribed_to(Category::Global).unwrap();
        global.sort_unstable();
        assert_eq!(global, vec![1, 3]);
    }
}
