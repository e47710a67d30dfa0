// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::Mutex;
use sqlx::SqlitePool;
use taskflow_common::{CoreError, Workspace};
use tracing::debug;

use crate::database;
use crate::handlers::AppError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub session_ttl: Duration,
    // One async lock per user; requests of the same user run one at a time.
    locks: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AppState {
    pub fn new(pool: SqlitePool, session_ttl: Duration) -> Self {
        Self {
            pool,
            session_ttl,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn user_lock(&self, user_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock().entry(user_id).or_default().clone()
    }

    /// Drops the user's lock once no request holds or waits on it.
    fn release_user_lock(&self, user_id: i64, lock: Arc<tokio::sync::Mutex<()>>) {
        drop(lock);
        let mut locks = self.locks.lock();
        // Clones are only handed out under this mutex, so a count of one
        // means the registry holds the last reference.
        if locks
            .get(&user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&user_id);
        }
    }

    /// Number of users with a lock in the registry.
    pub fn tracked_users(&self) -> usize {
        self.locks.lock().len()
    }

    /// Loads the user's workspace, runs `op` on it and saves what changed.
    ///
    /// Nothing is saved when `op` fails.
    pub async fn with_workspace<T>(
        &self,
        user_id: i64,
        op: impl FnOnce(&mut Workspace) -> Result<T, CoreError>,
    ) -> Result<T, AppError> {
        let lock = self.user_lock(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.run_workspace_op(user_id, op).await
        };
        self.release_user_lock(user_id, lock);
        result
    }

    async fn run_workspace_op<T>(
        &self,
        user_id: i64,
        op: impl FnOnce(&mut Workspace) -> Result<T, CoreError>,
    ) -> Result<T, AppError> {
        let mut store = database::load_store(&self.pool, user_id).await?;
        let mut workspace = Workspace::load(&store);
        let value = op(&mut workspace)?;

        let flushed = workspace.flush(&mut store)?;
        if flushed > 0 {
            database::save_store(&self.pool, user_id, &store).await?;
        }
        debug!("Workspace of user {} done ({} collections saved)", user_id, flushed);
        Ok(value)
    }

    /// Read-only access. Load-time migrations are still written back.
    pub async fn read_workspace<T>(
        &self,
        user_id: i64,
        op: impl FnOnce(&Workspace) -> T,
    ) -> Result<T, AppError> {
        self.with_workspace(user_id, |workspace| Ok(op(workspace)))
            .await
    }
}
