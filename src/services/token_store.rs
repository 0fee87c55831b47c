//! Durable storage for the access/refresh token pair
//!
//! Both tokens live in one JSON file under two fixed keys and are always
//! written and removed together.

use crate::model::session::Session;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(rename = "access_token")]
    access: Option<String>,
    #[serde(rename = "refresh_token")]
    refresh: Option<String>,
}

/// File-backed token storage
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<StoredTokens> {
        let contents = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Load the stored pair; `None` unless a non-empty access token exists
    pub fn load(&self) -> Option<Session> {
        let stored = self.read()?;
        let access = stored.access.filter(|t| !t.is_empty())?;
        Some(Session {
            access,
            refresh: stored.refresh.unwrap_or_default(),
        })
    }

    /// Current access token, read fresh from disk
    pub fn access_token(&self) -> Option<String> {
        self.load().map(|s| s.access)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        let stored = StoredTokens {
            access: Some(session.access.clone()),
            refresh: Some(session.refresh.clone()),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}
