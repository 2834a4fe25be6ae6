//! Redundant token persistence.
//!
//! The session token survives process restarts in an ordered stack of
//! storage channels. Reads take the first channel that yields a token;
//! logins write to every channel (primary first, backups best-effort).
//! Losing the primary file therefore does not lose the session — a
//! deliberate resilience strategy, not incidental duplication.

use anyhow::Result;
use std::path::PathBuf;

/// One place a token can be kept.
pub trait TokenStorage: Send {
    /// Channel name for logs.
    fn label(&self) -> &str;
    /// Read the stored token, if any. Errors degrade to `None`.
    fn load(&self) -> Option<String>;
    /// Persist the token.
    fn store(&self, token: &str) -> Result<()>;
    /// Remove the stored token. Removing a missing token is fine.
    fn clear(&self) -> Result<()>;
}

/// File-backed channel.
pub struct FileTokenStore {
    label: String,
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

impl TokenStorage for FileTokenStore {
    fn label(&self) -> &str {
        &self.label
    }

    fn load(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let token = contents.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn store(&self, token: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Ordered list of channels with defined read precedence.
pub struct TokenStorageStack {
    channels: Vec<Box<dyn TokenStorage>>,
}

impl TokenStorageStack {
    /// Build from an ordered channel list; the first entry is the primary.
    pub fn new(channels: Vec<Box<dyn TokenStorage>>) -> Self {
        Self { channels }
    }

    /// The standard two-channel layout under a data directory: a primary
    /// session file plus a backup in a sibling location.
    pub fn standard(data_dir: &std::path::Path) -> Self {
        Self::new(vec![
            Box::new(FileTokenStore::new("primary", data_dir.join("session.token"))),
            Box::new(FileTokenStore::new(
                "backup",
                data_dir.join("backup").join("session.token"),
            )),
        ])
    }

    /// First non-empty channel wins.
    pub fn load(&self) -> Option<String> {
        for channel in &self.channels {
            if let Some(token) = channel.load() {
                tracing::debug!(channel = channel.label(), "Loaded session token");
                return Some(token);
            }
        }
        None
    }

    /// Write to every channel. The primary must succeed; backups are
    /// best-effort and only logged on failure.
    pub fn store(&self, token: &str) -> Result<()> {
        let mut channels = self.channels.iter();
        if let Some(primary) = channels.next() {
            primary.store(token)?;
        }
        for backup in channels {
            if let Err(e) = backup.store(token) {
                tracing::warn!(channel = backup.label(), "Backup token write failed: {e}");
            }
        }
        Ok(())
    }

    /// Best-effort clear of every channel.
    pub fn clear(&self) {
        for channel in &self.channels {
            if let Err(e) = channel.clear() {
                tracing::warn!(channel = channel.label(), "Token clear failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = FileTokenStore::new("primary", tmp.path().join("session.token"));

        assert!(store.load().is_none());
        store.store("tok_abc").unwrap();
        assert_eq!(store.load().as_deref(), Some("tok_abc"));
        store.clear().unwrap();
        assert!(store.load().is_none());
        // Clearing again is a no-op
        store.clear().unwrap();
    }

    #[test]
    fn stack_writes_all_channels() {
        let tmp = TempDir::new().unwrap();
        let stack = TokenStorageStack::standard(tmp.path());

        stack.store("tok_abc").unwrap();
        assert!(tmp.path().join("session.token").exists());
        assert!(tmp.path().join("backup").join("session.token").exists());
    }

    #[test]
    fn read_falls_back_to_backup() {
        let tmp = TempDir::new().unwrap();
        let stack = TokenStorageStack::standard(tmp.path());

        stack.store("tok_abc").unwrap();
        // Simulate primary channel loss
        std::fs::remove_file(tmp.path().join("session.token")).unwrap();
        assert_eq!(stack.load().as_deref(), Some("tok_abc"));
    }

    #[test]
    fn primary_wins_over_backup() {
        let tmp = TempDir::new().unwrap();
        let stack = TokenStorageStack::new(vec![
            Box::new(FileTokenStore::new("primary", tmp.path().join("a"))),
            Box::new(FileTokenStore::new("backup", tmp.path().join("b"))),
        ]);

        std::fs::write(tmp.path().join("a"), "tok_primary").unwrap();
        std::fs::write(tmp.path().join("b"), "tok_backup").unwrap();
        assert_eq!(stack.load().as_deref(), Some("tok_primary"));
    }

    #[test]
    fn clear_empties_every_channel() {
        let tmp = TempDir::new().unwrap();
        let stack = TokenStorageStack::standard(tmp.path());

        stack.store("tok_abc").unwrap();
        stack.clear();
        assert!(stack.load().is_none());
    }
}
