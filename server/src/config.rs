// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/taskflow.db";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Server settings, read from `TASKFLOW_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub addr: SocketAddr,
    pub session_ttl: Duration,
    pub cors_origin: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the settings from any variable source. Unset variables take
    /// their default, malformed ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url =
            lookup("TASKFLOW_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let addr = lookup("TASKFLOW_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("Invalid TASKFLOW_ADDR '{}'", addr))?;

        let session_ttl_days = match lookup("TASKFLOW_SESSION_TTL_DAYS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .with_context(|| format!("Invalid TASKFLOW_SESSION_TTL_DAYS '{}'", raw))?,
            None => DEFAULT_SESSION_TTL_DAYS,
        };

        let cors_origin =
            lookup("TASKFLOW_CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        Ok(Self {
            database_url,
            addr,
            session_ttl: Duration::days(session_ttl_days),
            cors_origin,
        })
    }
}
