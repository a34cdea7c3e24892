use crate::errors::ConfigError;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One upstream API key. The secret is only reachable through `expose`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Ordered, non-empty set of interchangeable keys plus the index of the one
/// currently preferred.
///
/// `current` is advisory. Two overlapping calls that both fail over may
/// overwrite each other's store; the worst outcome is one extra 429 on a
/// later call, so a plain store is enough.
#[derive(Debug)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    current: AtomicUsize,
}

impl CredentialPool {
    pub fn new<I, S>(secrets: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials: Vec<Credential> = secrets
            .into_iter()
            .map(Into::into)
            .filter(|secret: &String| !secret.trim().is_empty())
            .map(Credential::new)
            .collect();
        if credentials.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        Ok(Self {
            credentials,
            current: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    /// Index `offset` positions after the current one, wrapping.
    pub fn index_at(&self, offset: usize) -> usize {
        (self.current_index() + offset) % self.len()
    }

    /// Credential `offset` positions after the current one, wrapping.
    pub fn next(&self, offset: usize) -> &Credential {
        &self.credentials[self.index_at(offset)]
    }

    pub fn get(&self, index: usize) -> &Credential {
        &self.credentials[index % self.len()]
    }

    pub fn advance(&self, to_index: usize) {
        self.current.store(to_index % self.len(), Ordering::Relaxed);
    }
}
