/// Broker session tokens for Angel One SmartAPI
///
/// Logging in is out of scope here: the session file is written by whatever
/// performed the login, and this module only reads and checks it.
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{Result, TradingError};
use crate::utils::read_json;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub jwt_token: String,
    #[serde(default)]
    pub feed_token: String,
    pub jwt_expiry: DateTime<Utc>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn is_jwt_expired(&self) -> bool {
        Utc::now() >= self.jwt_expiry
    }

    pub fn minutes_until_jwt_expiry(&self) -> i64 {
        (self.jwt_expiry - Utc::now()).num_minutes()
    }
}

/// Session manager with thread-safe access
pub struct SessionManager {
    tokens: Arc<RwLock<Option<SessionTokens>>>,
    session_file_path: PathBuf,
}

impl SessionManager {
    pub fn new(session_file_path: PathBuf) -> Self {
        SessionManager {
            tokens: Arc::new(RwLock::new(None)),
            session_file_path,
        }
    }

    /// Get current tokens (clone)
    pub async fn get_tokens(&self) -> Option<SessionTokens> {
        let tokens = self.tokens.read().await;
        tokens.clone()
    }

    /// Load tokens from file
    pub async fn load_from_file(&self) -> Result<()> {
        let tokens: SessionTokens = read_json(&self.session_file_path).await?;

        let mut t = self.tokens.write().await;
        *t = Some(tokens);

        debug!("Session tokens loaded from {}", self.session_file_path.display());
        Ok(())
    }

    /// Check if tokens are valid
    pub async fn is_valid(&self) -> bool {
        if let Some(tokens) = self.get_tokens().await {
            !tokens.is_jwt_expired()
        } else {
            false
        }
    }

    /// JWT for an authenticated request, or `TokenExpired`
    pub async fn bearer(&self) -> Result<String> {
        match self.get_tokens().await {
            Some(tokens) if !tokens.is_jwt_expired() => Ok(tokens.jwt_token),
            Some(_) => Err(TradingError::TokenExpired("Session JWT has expired".to_string())),
            None => Err(TradingError::TokenExpired("No session loaded".to_string())),
        }
    }

    /// Forget the in-memory session (the file is left for the login tool)
    pub async fn clear(&self) {
        let mut t = self.tokens.write().await;
        *t = None;
        warn!("Session tokens cleared");
    }
}
