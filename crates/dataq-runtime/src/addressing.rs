//! Queue naming and key padding.
//!
//! Data queues live in the host's integrated file system under
//! `/QSYS.LIB/<LIBRARY>.LIB/<QUEUE>.DTAQ`. Keys on keyed queues have a fixed
//! length and the host compares them byte for byte, so every key sent must be
//! blank-padded (or cut) to exactly that length.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "addressing_tests.rs"]
mod tests;

/// Root of the library file system on the host
pub const LIBRARY_BASE_PATH: &str = "/QSYS.LIB/";

/// Data queue name plus the library that holds it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueIdentity {
    pub name: String,
    pub library: String,
}

impl QueueIdentity {
    pub fn new(name: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            library: library.into(),
        }
    }

    /// Fully-qualified path, recomputed on every call
    pub fn path(&self) -> String {
        build_path(&self.name, &self.library)
    }
}

impl std::fmt::Display for QueueIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.library, self.name)
    }
}

/// Build the host path of a data queue. Case is preserved and nothing is
/// validated; the host rejects bad names when the queue is used.
pub fn build_path(name: &str, library: &str) -> String {
    format!("{LIBRARY_BASE_PATH}{library}.LIB/{name}.DTAQ")
}

/// Right-pad `input` with blanks, or truncate it, to exactly `length`
/// characters.
pub fn pad(input: &str, length: usize) -> String {
    let mut padded: String = input.chars().take(length).collect();
    let missing = length - padded.chars().count();
    padded.extend(std::iter::repeat(' ').take(missing));
    padded
}
