//! Session file storage
//!
//! Holds at most one session (access token, refresh token, expiry) in a JSON
//! file. Writes go through a temp file + rename so a crash never leaves a
//! truncated session behind. A tokio Mutex serializes writes from refreshes
//! and logouts.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Tokens for the signed-in user.
///
/// `expires` is a unix timestamp in milliseconds, computed from the token
/// endpoint's `expires_in` at storage time.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for API calls
    pub access: String,
    /// Refresh token for obtaining new access tokens
    pub refresh: String,
    /// Expiration as unix timestamp in milliseconds
    pub expires: u64,
}

impl Session {
    pub fn is_expired(&self, now_millis: u64) -> bool {
        self.expires <= now_millis
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .field("expires", &self.expires)
            .finish()
    }
}

/// Session file manager.
pub struct SessionStore {
    path: PathBuf,
    state: Mutex<Option<Session>>,
}

impl SessionStore {
    /// Load the session from `path`.
    ///
    /// A missing file means logged out; nothing is created until a session is
    /// stored.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading session file: {e}")))?;
            let session: Session = serde_json::from_str(&contents)
                .map_err(|e| Error::SessionParse(format!("parsing session file: {e}")))?;
            info!(path = %path.display(), "loaded session");
            Some(session)
        } else {
            info!(path = %path.display(), "session file not found, starting logged out");
            None
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self) -> Option<Session> {
        self.state.lock().await.clone()
    }

    /// Store a new session and persist it.
    pub async fn replace(&self, session: Session) -> Result<()> {
        let mut state = self.state.lock().await;
        write_atomic(&self.path, &session).await?;
        *state = Some(session);
        debug!("stored session");
        Ok(())
    }

    /// Update tokens after a refresh.
    ///
    /// When the token endpoint does not rotate the refresh token, `refresh`
    /// is `None` and the stored one is kept. Fails with `NoSession` if the
    /// session was cleared in the meantime.
    pub async fn update_token(
        &self,
        access: String,
        refresh: Option<String>,
        expires: u64,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let current = state.as_ref().ok_or(Error::NoSession)?;
        let updated = Session {
            access,
            refresh: refresh.unwrap_or_else(|| current.refresh.clone()),
            expires,
        };
        write_atomic(&self.path, &updated).await?;
        *state = Some(updated);
        debug!("updated session tokens");
        Ok(())
    }

    /// Drop the session and delete the file. Safe to call when already logged out.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(format!("removing session file: {e}"))),
        }
    }
}

/// Write the session to a file atomically.
///
/// Writes a sibling temp file, then renames it over the target. Permissions
/// are 0600 on unix since the file holds tokens.
async fn write_atomic(path: &Path, session: &Session) -> Result<()> {
    let json = serde_json::to_string_pretty(session)
        .map_err(|e| Error::SessionParse(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;
    if !dir.as_os_str().is_empty() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Io(format!("creating session directory: {e}")))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".into());
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
