use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An ordered mapping from relative file path to source text.
///
/// A `Codebase` is never edited in place: every change produces a new value,
/// so two variants never share (and never alias) file contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Codebase {
    files: BTreeMap<String, String>,
}

impl Codebase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a codebase from `(path, source)` pairs. Later duplicates win.
    pub fn from_files<P, S>(files: impl IntoIterator<Item = (P, S)>) -> Self
    where
        P: Into<String>,
        S: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(path, source)| (path.into(), source.into()))
                .collect(),
        }
    }

    /// Return a copy of this codebase with `path` set to `source`.
    pub fn with_file(&self, path: impl Into<String>, source: impl Into<String>) -> Self {
        let mut files = self.files.clone();
        files.insert(path.into(), source.into());
        Self { files }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, s)| (p.as_str(), s.as_str()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|(p, s)| p.len() + s.len()).sum()
    }

    /// Content hash of this codebase.
    pub fn content_id(&self) -> VariantId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.files.len() as u64).to_le_bytes());
        for (path, source) in &self.files {
            hasher.update(&(path.len() as u64).to_le_bytes());
            hasher.update(path.as_bytes());
            hasher.update(&(source.len() as u64).to_le_bytes());
            hasher.update(source.as_bytes());
        }
        VariantId(*hasher.finalize().as_bytes())
    }
}

/// Content-addressed variant identifier (BLAKE3, 32 bytes).
///
/// `id = blake3(len(files) || for each file in path order: len(path) || path || len(source) || source)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantId(pub [u8; 32]);

impl VariantId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_hex(hex: &str) -> Result<Self, VariantIdError> {
        if hex.len() != 64 {
            return Err(VariantIdError::InvalidLength(hex.len()));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = hex
                .get(i * 2..i * 2 + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or(VariantIdError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VariantId({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl Serialize for VariantId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VariantId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        VariantId::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VariantIdError {
    #[error("invalid hex length: {0} (expected 64)")]
    InvalidLength(usize),
    #[error("invalid hex character")]
    InvalidHex,
}
