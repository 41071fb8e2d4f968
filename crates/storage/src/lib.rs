//! Sqlite-backed persistence.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context as _;
use openshelf_core::{Settings, Theme};
use rusqlite::{Connection, OptionalExtension as _};

/// The one key-value entry favorites live under: a JSON array of titles.
pub const FAVORITES_KEY: &str = "library-favorites";

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                theme TEXT NOT NULL,
                search_limit INTEGER NOT NULL
            );
            INSERT OR IGNORE INTO settings (id, theme, search_limit)
            VALUES (1, 'dark', 50);

            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT theme, search_limit FROM settings WHERE id = 1",
                [],
                |row| {
                    let theme: String = row.get(0)?;
                    let search_limit: i64 = row.get(1)?;
                    Ok((theme, search_limit))
                },
            )
            .optional()?;

        let (theme, search_limit) = match row {
            Some(value) => value,
            None => ("dark".to_string(), 50),
        };

        let theme = theme.parse::<Theme>().unwrap_or(Theme::Dark);
        let search_limit = usize::try_from(search_limit).unwrap_or(50);

        let mut settings = Settings {
            theme,
            search_limit,
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        self.conn.execute(
            "UPDATE settings SET theme = ?, search_limit = ? WHERE id = 1",
            (settings.theme.as_str(), settings.search_limit as i64),
        )?;
        Ok(())
    }

    /// Loads the favorites set. Never errors: an absent entry or an
    /// unparseable value both degrade to the empty set.
    pub fn load_favorites(&self) -> BTreeSet<String> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?",
                [FAVORITES_KEY],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten();

        let Some(value) = value else {
            return BTreeSet::new();
        };
        let titles: Vec<String> = serde_json::from_str(&value).unwrap_or_default();
        titles.into_iter().collect()
    }

    pub fn save_favorites(&self, favorites: &BTreeSet<String>) -> anyhow::Result<()> {
        let titles: Vec<&String> = favorites.iter().collect();
        let json = serde_json::to_string(&titles)?;
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            (FAVORITES_KEY, json),
        )?;
        Ok(())
    }

    /// The only favorites mutator: removes the title if present, adds it if
    /// absent, and persists the full resulting set before returning it.
    pub fn toggle_favorite(
        &self,
        current: &BTreeSet<String>,
        title: &str,
    ) -> anyhow::Result<BTreeSet<String>> {
        let mut next = current.clone();
        if !next.remove(title) {
            next.insert(title.to_string());
        }
        self.save_favorites(&next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_in_memory() -> anyhow::Result<Storage> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.migrate()?;
        Ok(storage)
    }

    #[test]
    fn settings_roundtrip() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let mut settings = storage.load_settings()?;
        settings.theme = Theme::Light;
        settings.search_limit = 25;
        storage.save_settings(&settings)?;

        let settings2 = storage.load_settings()?;
        assert_eq!(settings2.theme, Theme::Light);
        assert_eq!(settings2.search_limit, 25);
        Ok(())
    }

    #[test]
    fn favorites_start_empty() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        assert!(storage.load_favorites().is_empty());
        Ok(())
    }

    #[test]
    fn toggle_adds_and_persists_exact_set() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let next = storage.toggle_favorite(&BTreeSet::new(), "Suç ve Ceza")?;
        assert_eq!(next, ["Suç ve Ceza".to_string()].into());
        assert_eq!(storage.load_favorites(), next);

        let value: String = storage.conn.query_row(
            "SELECT value FROM kv WHERE key = ?",
            [FAVORITES_KEY],
            |row| row.get(0),
        )?;
        assert_eq!(value, r#"["Suç ve Ceza"]"#);
        Ok(())
    }

    #[test]
    fn toggle_is_its_own_inverse() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let start: BTreeSet<String> =
            ["Dune".to_string(), "Emma".to_string()].into();
        storage.save_favorites(&start)?;

        let once = storage.toggle_favorite(&start, "Dune")?;
        assert!(!once.contains("Dune"));
        let twice = storage.toggle_favorite(&once, "Dune")?;
        assert_eq!(twice, start);
        assert_eq!(storage.load_favorites(), start);
        Ok(())
    }

    #[test]
    fn unparseable_favorites_degrade_to_empty() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        storage.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?, ?)",
            (FAVORITES_KEY, "{not json"),
        )?;
        assert!(storage.load_favorites().is_empty());
        Ok(())
    }
}
