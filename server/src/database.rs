// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use taskflow_common::{MemoryStore, UserProfile};
use tracing::{debug, info};

/// Establishes the database connection pool.
/// If the database does not exist, it creates it (and its directory).
/// It also ensures every table exists.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        if let Some(dir) = database_dir(database_url) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database directory {:?}", dir))?;
        }
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Directory holding the database file of a `sqlite:` URL, if any.
fn database_dir(database_url: &str) -> Option<&Path> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Creates the `users`, `sessions` and `collections` tables.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create 'users' table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create 'sessions' table")?;

    // One JSON array per user and collection key.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            PRIMARY KEY (user_id, key)
        );
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create 'collections' table")?;

    info!("Database schema is ready.");
    Ok(())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
}

/// Inserts a user. Returns `None` when the username or email is taken.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<Option<UserProfile>> {
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now())
    .execute(pool)
    .await;

    match result {
        Ok(done) => {
            let id = done.last_insert_rowid();
            info!("Created user {} with ID: {}", username, id);
            Ok(Some(UserProfile {
                id,
                username: username.to_string(),
                email: email.to_string(),
            }))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("User {} or email {} already exists", username, email);
            Ok(None)
        }
        Err(e) => Err(anyhow::Error::new(e).context("Failed to insert user into DB")),
    }
}

/// Looks a user up by email, together with the stored password hash.
pub async fn find_user_credentials(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<(UserProfile, String)>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to look up user by email")?;

    Ok(row.map(|row| {
        (
            UserProfile {
                id: row.id,
                username: row.username,
                email: row.email,
            },
            row.password_hash,
        )
    }))
}

pub async fn create_session(
    pool: &SqlitePool,
    user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at.timestamp())
        .execute(pool)
        .await
        .context("Failed to insert session into DB")?;
    Ok(())
}

/// The user owning a session token, if the session is still valid at `now`.
pub async fn find_session_user(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<UserProfile>> {
    let user = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT users.id, users.username, users.email
        FROM sessions JOIN users ON users.id = sessions.user_id
        WHERE sessions.token = ? AND sessions.expires_at > ?
        "#,
    )
    .bind(token)
    .bind(now.timestamp())
    .fetch_optional(pool)
    .await
    .context("Failed to look up session")?;

    Ok(user)
}

/// Deletes a session. Returns true if it existed.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;
    Ok(result.rows_affected() > 0)
}

/// Deletes every session expired at `now`.
pub async fn prune_expired_sessions(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now.timestamp())
        .execute(pool)
        .await
        .context("Failed to prune expired sessions")?;

    let pruned = result.rows_affected();
    debug!("Pruned {} expired sessions", pruned);
    Ok(pruned)
}

/// Reads all collections of a user into a clean in-memory store.
pub async fn load_store(pool: &SqlitePool, user_id: i64) -> Result<MemoryStore> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT key, value FROM collections WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to load collections for user {}", user_id))?;

    Ok(MemoryStore::from_entries(rows))
}

/// Upserts the keys written to `store` since it was loaded, in one
/// transaction. Returns how many keys were saved.
pub async fn save_store(pool: &SqlitePool, user_id: i64, store: &MemoryStore) -> Result<usize> {
    let entries = store.dirty_entries();
    if entries.is_empty() {
        return Ok(0);
    }

    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for (key, value) in &entries {
        sqlx::query(
            r#"
            INSERT INTO collections (user_id, key, value, updated_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(*key)
        .bind(*value)
        .bind(now)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to save collection '{}' for user {}", key, user_id))?;
    }
    tx.commit().await.context("Failed to commit collections")?;

    debug!("Saved {} collections for user {}", entries.len(), user_id);
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;
    use taskflow_common::KeyValueStore;

    /// Helper function to set up an in-memory SQLite database for testing.
    /// A single connection keeps every query on the same in-memory database.
    async fn setup_test_db() -> Result<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        init_schema(&pool).await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn test_create_user_and_find_credentials() {
        let pool = setup_test_db().await.unwrap();

        // Act
        let user = create_user(&pool, "alice", "alice@example.com", "salt$hash")
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert!(user.id > 0);
        let (found, hash) = find_user_credentials(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, user);
        assert_eq!(hash, "salt$hash");
        assert!(
            find_user_credentials(&pool, "bob@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_user_is_rejected() {
        let pool = setup_test_db().await.unwrap();
        create_user(&pool, "alice", "alice@example.com", "h")
            .await
            .unwrap();

        let same_email = create_user(&pool, "alice2", "alice@example.com", "h")
            .await
            .unwrap();
        let same_name = create_user(&pool, "alice", "other@example.com", "h")
            .await
            .unwrap();

        assert!(same_email.is_none());
        assert!(same_name.is_none());
    }

    #[tokio::test]
    async fn test_sessions_expire_and_prune() {
        let pool = setup_test_db().await.unwrap();
        let user = create_user(&pool, "alice", "alice@example.com", "h")
            .await
            .unwrap()
            .unwrap();
        let now = Utc::now();
        create_session(&pool, user.id, "live", now + Duration::days(1))
            .await
            .unwrap();
        create_session(&pool, user.id, "stale", now - Duration::minutes(1))
            .await
            .unwrap();

        // Assert: only the live token resolves
        let found = find_session_user(&pool, "live", now).await.unwrap();
        assert_eq!(found, Some(user));
        assert!(find_session_user(&pool, "stale", now).await.unwrap().is_none());

        // Act
        let pruned = prune_expired_sessions(&pool, now).await.unwrap();

        // Assert
        assert_eq!(pruned, 1);
        assert!(delete_session(&pool, "live").await.unwrap());
        assert!(!delete_session(&pool, "live").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_round_trip_saves_dirty_keys_only() {
        let pool = setup_test_db().await.unwrap();
        let user = create_user(&pool, "alice", "alice@example.com", "h")
            .await
            .unwrap()
            .unwrap();

        let mut store = load_store(&pool, user.id).await.unwrap();
        store.set("tasks", "[]".to_string()).unwrap();
        store.set("lists", "[]".to_string()).unwrap();
        assert_eq!(save_store(&pool, user.id, &store).await.unwrap(), 2);

        // Act: reload, change one key
        let mut store = load_store(&pool, user.id).await.unwrap();
        assert!(!store.is_dirty());
        store.set("tasks", r#"[{"id":"1","title":"x"}]"#.to_string()).unwrap();
        let saved = save_store(&pool, user.id, &store).await.unwrap();

        // Assert
        assert_eq!(saved, 1);
        let reloaded = load_store(&pool, user.id).await.unwrap();
        assert_eq!(
            reloaded.get("tasks").unwrap().as_deref(),
            Some(r#"[{"id":"1","title":"x"}]"#)
        );
        assert_eq!(reloaded.get("lists").unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_collections_are_per_user() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_user(&pool, "alice", "alice@example.com", "h")
            .await
            .unwrap()
            .unwrap();
        let bob = create_user(&pool, "bob", "bob@example.com", "h")
            .await
            .unwrap()
            .unwrap();

        let mut store = MemoryStore::new();
        store.set("tasks", "[1]".to_string()).unwrap();
        save_store(&pool, alice.id, &store).await.unwrap();

        let bobs = load_store(&pool, bob.id).await.unwrap();
        assert!(bobs.get("tasks").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_establish_connection_pool_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/nested/taskflow.db", dir.path().display());

        // Act
        let pool = establish_connection_pool(&url).await.unwrap();
        create_user(&pool, "alice", "alice@example.com", "h")
            .await
            .unwrap();
        pool.close().await;

        // Assert: a second start reuses the existing file
        assert!(dir.path().join("nested/taskflow.db").exists());
        let pool = establish_connection_pool(&url).await.unwrap();
        assert!(
            find_user_credentials(&pool, "alice@example.com")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_database_dir() {
        assert_eq!(
            database_dir("sqlite://database/taskflow.db"),
            Some(Path::new("database"))
        );
        assert_eq!(database_dir("sqlite::memory:"), None);
        assert_eq!(database_dir("sqlite://taskflow.db"), None);
    }
}
