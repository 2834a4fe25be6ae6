//! SQLite-backed identity store.
//!
//! Tables:
//! - `users`: email (unique, case-insensitive), fullname, password_hash, salt,
//!   created_at, last_login_at
//! - `contacts`: per-user contact list
//! - `messages`: per-contact message thread
//!
//! Contacts and messages cascade-delete with their owning account, so
//! deleting a user removes every piece of data it owns in one operation.

use parking_lot::Mutex;
use rand::rand_core::UnwrapErr;
use rand::rngs::SysRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::StoreError;

/// Salt byte length for password hashing.
const SALT_BYTES: usize = 16;

/// Number of SHA-256 iterations for password stretching.
const HASH_ITERATIONS: u32 = 100_000;

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub fullname: String,
    pub created_at: i64,
    pub last_login_at: Option<i64>,
}

/// A contact owned by an account.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub phone_number: String,
}

/// One message in a contact's thread. `sent_by` is either `"user"` or
/// `"contact"`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sent_at: i64,
    pub sent_by: String,
}

/// SQLite-backed identity store. Writes serialize on the connection mutex;
/// each statement is atomic, keyed by the owning account id.
#[derive(Debug)]
pub struct UserStore {
    conn: Mutex<rusqlite::Connection>,
}

impl UserStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        let conn = rusqlite::Connection::open(db_path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                fullname TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                last_login_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_contacts_user ON contacts(user_id);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                contact_id TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                sent_at INTEGER NOT NULL,
                sent_by TEXT NOT NULL CHECK (sent_by IN ('user', 'contact'))
            );
            CREATE INDEX IF NOT EXISTS idx_messages_contact ON messages(contact_id);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lightweight liveness probe.
    pub fn ping(&self) -> bool {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    // ── Account Management ──────────────────────────────────────────

    /// Insert a new account. The email must already be trimmed and
    /// lowercased by the caller. Returns the created record.
    pub fn create_user(
        &self,
        email: &str,
        fullname: &str,
        password: &str,
    ) -> Result<User, StoreError> {
        let user_id = uuid::Uuid::new_v4().to_string();
        let salt = generate_salt();
        let password_hash = hash_password(password, &salt);
        let now = epoch_secs() as i64;

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (id, email, fullname, password_hash, salt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![user_id, email, fullname, password_hash, salt, now],
        );

        match result {
            Ok(_) => Ok(User {
                id: user_id,
                email: email.to_string(),
                fullname: fullname.to_string(),
                created_at: now,
                last_login_at: None,
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials for an account. Returns `None` on unknown email or
    /// hash mismatch — callers cannot tell the two apart.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        let row: Result<(String, String, String, String, i64, Option<i64>), _> = conn.query_row(
            "SELECT id, fullname, password_hash, salt, created_at, last_login_at
             FROM users WHERE email = ?1 COLLATE NOCASE",
            rusqlite::params![email],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        );

        match row {
            Ok((id, fullname, stored_hash, salt, created_at, last_login_at)) => {
                let attempt_hash = hash_password(password, &salt);
                if !constant_time_eq(stored_hash.as_bytes(), attempt_hash.as_bytes()) {
                    return Ok(None);
                }
                Ok(Some(User {
                    id,
                    email: email.to_string(),
                    fullname,
                    created_at,
                    last_login_at,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                // Perform dummy hash to prevent timing side-channel
                let _ = hash_password(password, "0000000000000000");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up an account by id.
    pub fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT id, email, fullname, created_at, last_login_at
             FROM users WHERE id = ?1",
            rusqlite::params![user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    fullname: row.get(2)?,
                    created_at: row.get(3)?,
                    last_login_at: row.get(4)?,
                })
            },
        );

        match row {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up an account by normalized email.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT id, email, fullname, created_at, last_login_at
             FROM users WHERE email = ?1 COLLATE NOCASE",
            rusqlite::params![email],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    fullname: row.get(2)?,
                    created_at: row.get(3)?,
                    last_login_at: row.get(4)?,
                })
            },
        );

        match row {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Record a successful authentication.
    pub fn touch_last_login(&self, user_id: &str) -> Result<(), StoreError> {
        let now = epoch_secs() as i64;
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
            rusqlite::params![now, user_id],
        )?;
        Ok(())
    }

    /// Delete an account and everything it owns. Returns false when no such
    /// account exists.
    pub fn delete_user(&self, user_id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM users WHERE id = ?1",
            rusqlite::params![user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Count registered accounts.
    pub fn user_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ── Contacts ────────────────────────────────────────────────────

    /// List an account's contacts, oldest first.
    pub fn list_contacts(&self, user_id: &str) -> Result<Vec<Contact>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, phone_number FROM contacts
             WHERE user_id = ?1 ORDER BY created_at ASC",
        )?;
        let contacts = stmt
            .query_map(rusqlite::params![user_id], |row| {
                Ok(Contact {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    phone_number: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contacts)
    }

    /// Add a contact to an account.
    pub fn create_contact(
        &self,
        user_id: &str,
        name: &str,
        phone_number: &str,
    ) -> Result<Contact, StoreError> {
        let contact_id = uuid::Uuid::new_v4().to_string();
        let now = epoch_secs() as i64;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO contacts (id, user_id, name, phone_number, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![contact_id, user_id, name, phone_number, now],
        )?;
        Ok(Contact {
            id: contact_id,
            name: name.to_string(),
            phone_number: phone_number.to_string(),
        })
    }

    /// Remove a contact (and its thread). Scoped to the owning account.
    pub fn delete_contact(&self, user_id: &str, contact_id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM contacts WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![contact_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    // ── Messages ────────────────────────────────────────────────────

    /// List a contact's thread, oldest first. Returns `None` when the
    /// contact does not belong to this account.
    pub fn list_messages(
        &self,
        user_id: &str,
        contact_id: &str,
    ) -> Result<Option<Vec<Message>>, StoreError> {
        let conn = self.conn.lock();
        if !contact_exists(&conn, user_id, contact_id)? {
            return Ok(None);
        }
        let mut stmt = conn.prepare(
            "SELECT id, text, sent_at, sent_by FROM messages
             WHERE contact_id = ?1 AND user_id = ?2 ORDER BY sent_at ASC, id ASC",
        )?;
        let messages = stmt
            .query_map(rusqlite::params![contact_id, user_id], |row| {
                Ok(Message {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    sent_at: row.get(2)?,
                    sent_by: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(messages))
    }

    /// Append a message to a contact's thread. Returns `None` when the
    /// contact does not belong to this account.
    pub fn append_message(
        &self,
        user_id: &str,
        contact_id: &str,
        text: &str,
        sent_by: &str,
    ) -> Result<Option<Message>, StoreError> {
        let conn = self.conn.lock();
        if !contact_exists(&conn, user_id, contact_id)? {
            return Ok(None);
        }
        let message_id = uuid::Uuid::new_v4().to_string();
        let now = epoch_secs() as i64;
        conn.execute(
            "INSERT INTO messages (id, contact_id, user_id, text, sent_at, sent_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![message_id, contact_id, user_id, text, now, sent_by],
        )?;
        Ok(Some(Message {
            id: message_id,
            text: text.to_string(),
            sent_at: now,
            sent_by: sent_by.to_string(),
        }))
    }
}

fn contact_exists(
    conn: &rusqlite::Connection,
    user_id: &str,
    contact_id: &str,
) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contacts WHERE id = ?1 AND user_id = ?2",
        rusqlite::params![contact_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ── Cryptographic Helpers ───────────────────────────────────────────

/// Generate a random salt (hex-encoded).
fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    UnwrapErr(SysRng).fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with salt using iterated SHA-256.
fn hash_password(password: &str, salt: &str) -> String {
    let mut hash = Sha256::new();
    hash.update(salt.as_bytes());
    hash.update(password.as_bytes());
    let mut result = hash.finalize();

    // Iterated hashing for key stretching
    for _ in 1..HASH_ITERATIONS {
        let mut h = Sha256::new();
        h.update(result);
        h.update(salt.as_bytes());
        result = h.finalize();
    }

    hex::encode(result)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ── Tests ───────────────────────────────────────────────────────────
