// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for gn2bp tools.
//! The service owns serialization; stores only move bytes.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod fs;

pub use fs::FsConfigStore;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Where config documents live. Implementations deal in bytes only; keys are
/// logical names such as `"resolver"`, never paths.
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Whether anything is stored under `key`.
    fn exists(&self, key: &str) -> bool {
        self.load_raw(key).is_ok()
    }
}

/// Failure reading or writing a config document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("no config stored under `{key}`")]
    NotFound {
        /// The missing key.
        key: String,
    },
    /// The backing store failed.
    #[error("config storage failed: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document is not valid JSON for the requested type.
    #[error("malformed config document: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure without a more precise variant.
    #[error("{0}")]
    Other(String),
}

impl ConfigError {
    pub(crate) fn not_found(key: &str) -> Self {
        Self::NotFound {
            key: key.to_owned(),
        }
    }
}

/// Typed access to a [`ConfigStore`]: values go in and out as pretty JSON.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Decodes the document under `key`. A missing or empty document is `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Decodes the document under `key`, or `T::default()` when there is none.
    pub fn load_or_default<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Encodes `value` as pretty JSON and stores it under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemStore {
        blobs: RefCell<BTreeMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.blobs
                .borrow()
                .get(key)
                .cloned()
                .ok_or_else(|| ConfigError::not_found(key))
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Knobs {
        prefix: String,
        depth: u32,
    }

    #[test]
    fn missing_key_is_none() {
        let svc = ConfigService::new(MemStore::default());
        assert_eq!(svc.load::<Knobs>("knobs").unwrap(), None);
        assert_eq!(svc.load_or_default::<Knobs>("knobs").unwrap(), Knobs::default());
        assert!(!svc.store().exists("knobs"));
    }

    #[test]
    fn save_then_load() {
        let svc = ConfigService::new(MemStore::default());
        let knobs = Knobs {
            prefix: "//gn".into(),
            depth: 3,
        };
        svc.save("knobs", &knobs).unwrap();
        assert_eq!(svc.load::<Knobs>("knobs").unwrap(), Some(knobs));
    }

    #[test]
    fn empty_blob_is_none() {
        let store = MemStore::default();
        store.save_raw("knobs", b"").unwrap();
        let svc = ConfigService::new(store);
        assert_eq!(svc.load::<Knobs>("knobs").unwrap(), None);
    }

    #[test]
    fn garbage_is_a_serde_error() {
        let store = MemStore::default();
        store.save_raw("knobs", b"{ nope").unwrap();
        let svc = ConfigService::new(store);
        assert!(matches!(svc.load::<Knobs>("knobs"), Err(ConfigError::Serde(_))));
    }

    #[test]
    fn not_found_names_the_key() {
        let err = MemStore::default().load_raw("resolver").unwrap_err();
        assert_eq!(err.to_string(), "no config stored under `resolver`");
    }
}
