use rusqlite::OptionalExtension;

use crate::domain::{Category, ChannelBinding};
use crate::errors::{AlertError, AlertResult};
use crate::storage::sqlite::connection::snowflake_from_row;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ChannelBindingRepository;

pub struct SqliteChannelBindingRepository {
    storage: SqliteStorage,
}

impl SqliteChannelBindingRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl ChannelBindingRepository for SqliteChannelBindingRepository {
    fn set(&self, category: Category, channel_id: u64) -> AlertResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "INSERT INTO channel_bindings (category, channel_id) VALUES (?1, ?2)
             ON CONFLICT(category) DO UPDATE SET channel_id = excluded.channel_id, updated_at = datetime('now')",
            (category.as_str(), channel_id.to_string()),
        )?;
        Ok(())
    }

    fn remove(&self, category: Category) -> AlertResult<bool> {
        let conn = self.storage.connection()?;
        let removed = conn.execute(
            "DELETE FROM channel_bindings WHERE category = ?1",
            [category.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn get(&self, category: Category) -> AlertResult<Option<u64>> {
        let conn = self.storage.connection()?;
        let channel_id = conn
            .query_row(
                "SELECT channel_id FROM channel_bindings WHERE category = ?1",
                [category.as_str()],
                |row| snowflake_from_row(row, 0),
            )
            .optional()?;
        Ok(channel_id)
    }

    fn get_all(&self) -> AlertResult<Vec<ChannelBinding>> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare("SELECT category, channel_id FROM channel_bindings ORDER BY category")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, snowflake_from_row(row, 1)?))
        })?;

        let mut bindings = Vec::new();
        for row in rows {
            let (category, channel_id) = row.map_err(AlertError::from)?;
            if let Ok(category) = category.parse::<Category>() {
                bindings.push(ChannelBinding {
                    category,
                    channel_id,
                });
            }
        }

        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> SqliteChannelBindingRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteChannelBindingRepository::new(storage)
    }

    #[test]
    fn test_set_and_get_binding() {
        let repo = setup_repo();

        assert!(repo.get(Category::Global).unwrap().is_none());
        repo.set(Category::Global, 1_100_000_000_000_000_001).unwrap();
        assert_eq!(
            repo.get(Category::Global).unwrap(),
            Some(1_100_000_000_000_000_001)
        );
    }

    #[test]
    fn test_rebinding_replaces_channel() {
        let repo = setup_repo();

        repo.set(Category::Regional, 10).unwrap();
        repo.set(Category::Regional, 20).unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].channel_id, 20);
    }

    #[test]
    fn test_remove_binding() {
        let repo = setup_repo();
        repo.set(Category::Regional, 10).unwrap();

        assert!(repo.remove(Category::Regional).unwrap());
        assert!(!repo.remove(Category::Regional).unwrap());
        assert!(repo.get(Category::Regional).unwrap().is_none());
    }
}
