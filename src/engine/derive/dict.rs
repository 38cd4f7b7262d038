//! Ordered option accumulator with explicit per-write semantics.

use std::fmt;

use serde::Serialize;

use crate::engine::error::ProfileError;
use crate::engine::library::{CodecLibrary, LibCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace an existing value in place
    Overwrite,
    /// First writer wins; later writes are dropped
    DontOverwrite,
    /// Concatenate onto an existing value (`flags`)
    Append,
}

/// One key/value instruction for the codec library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub key: String,
    pub value: String,
}

/// Final, ordered directive list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Directives(Vec<Directive>);

impl Directives {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|d| d.key == key).map(|d| d.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|d| d.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Directives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.0 {
            writeln!(f, "{}={}", d.key, d.value)?;
        }
        Ok(())
    }
}

/// Accumulates directives for one codec, validating each write with the library.
pub struct OptionDict<'a> {
    library: &'a dyn CodecLibrary,
    codec: &'a LibCodec,
    entries: Vec<Directive>,
}

impl<'a> OptionDict<'a> {
    pub fn new(library: &'a dyn CodecLibrary, codec: &'a LibCodec) -> Self {
        Self {
            library,
            codec,
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|d| d.key == key).map(|d| d.value.as_str())
    }

    /// Write `key`. A library rejection aborts with [`ProfileError::Derivation`].
    pub fn set(&mut self, key: &str, value: impl ToString, mode: WriteMode) -> Result<(), ProfileError> {
        let value = value.to_string();
        let existing = self.entries.iter().position(|d| d.key == key);
        if mode == WriteMode::DontOverwrite && existing.is_some() {
            return Ok(());
        }

        self.library
            .check_option(self.codec, key, &value)
            .map_err(|cause| {
                tracing::debug!(codec = %self.codec.name, key, value = %value, error = %cause, "option rejected");
                ProfileError::Derivation {
                    key: key.to_string(),
                    cause,
                }
            })?;

        match (existing, mode) {
            (Some(i), WriteMode::Append) => self.entries[i].value.push_str(&value),
            (Some(i), _) => self.entries[i].value = value,
            (None, _) => self.entries.push(Directive {
                key: key.to_string(),
                value,
            }),
        }
        Ok(())
    }

    pub fn finish(self) -> Directives {
        Directives(self.entries)
    }
}
