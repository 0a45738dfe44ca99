//! Round-robin credential pool for the primary text provider.

use std::fmt;

use super::text::TextError;

/// Ordered API keys plus a rotation cursor.
///
/// The cursor is always in `0..len()` and only moves forward (mod `len()`),
/// so consecutive calls on one client spread load across keys.
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: usize,
}

/// A key handed out by [`CredentialPool::next_credential`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// 1-based position of the key in the pool. Safe to log.
    pub ordinal: usize,
    key: String,
}

impl Credential {
    /// The raw key. Never log this.
    pub fn secret(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(#{})", self.ordinal)
    }
}

impl CredentialPool {
    /// Build a pool from `keys`, dropping blank entries.
    ///
    /// # Errors
    ///
    /// Returns `TextError::MissingApiKey` if no usable key remains.
    pub fn new<I, S>(keys: I) -> Result<Self, TextError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(Into::into)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(TextError::MissingApiKey);
        }

        Ok(Self { keys, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; an empty pool cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the key the next call will try first.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Take the key under the cursor and advance it.
    pub fn next_credential(&mut self) -> Credential {
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.keys.len();
        Credential {
            ordinal: index + 1,
            key: self.keys[index].clone(),
        }
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.keys.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
