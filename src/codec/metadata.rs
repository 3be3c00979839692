//! Tagged metadata blob.
//!
//! Format (all integers big-endian u32):
//!   "MD2_"
//!   repeated until fewer than 4 bytes remain:
//!     keyLen, key bytes, typeCount,
//!     typeCount × (type, valueLen, value bytes)
//!
//! Type 0 is raw binary, type 1 is a one-byte-per-character string. Other
//! tags are kept and written back untouched.
//!
//! Blobs without the magic are the legacy layout: repeated
//! `keyLen, key, valueLen, value` with every value a string.
//!
//! Keys are stored one byte per character as well, so they are reduced to
//! Latin-1 (anything above U+00FF becomes `?`) as they enter the map.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

use super::writer::latin1_byte;
use super::{BinaryReader, BinaryWriter};
use crate::error::MetadataError;

pub const MAGIC: &[u8; 4] = b"MD2_";

pub const TYPE_BINARY: u32 = 0;
pub const TYPE_STRING: u32 = 1;

/// Key → (type tag → payload). At most one payload per (key, tag).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    entries: BTreeMap<String, BTreeMap<u32, Vec<u8>>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<u32, Vec<u8>>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(stored_key(key).as_ref())
    }

    pub fn other_data(&self, key: &str, tag: u32) -> Option<&[u8]> {
        self.entries.get(stored_key(key).as_ref())?.get(&tag).map(Vec::as_slice)
    }

    pub fn set_other_data(&mut self, key: impl Into<String>, tag: u32, value: Vec<u8>) {
        let key = key.into();
        let key = stored_key(&key).into_owned();
        self.entries.entry(key).or_default().insert(tag, value);
    }

    pub fn bin_data(&self, key: &str) -> Option<&[u8]> {
        self.other_data(key, TYPE_BINARY)
    }

    pub fn set_bin_data(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.set_other_data(key, TYPE_BINARY, value);
    }

    pub fn str_data(&self, key: &str) -> Option<String> {
        self.other_data(key, TYPE_STRING)
            .map(|raw| raw.iter().map(|&b| b as char).collect())
    }

    pub fn set_str_data(&mut self, key: impl Into<String>, value: &str) {
        let raw = value.chars().map(latin1_byte).collect();
        self.set_other_data(key, TYPE_STRING, raw);
    }

    /// Drop every payload stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<BTreeMap<u32, Vec<u8>>> {
        self.entries.remove(stored_key(key).as_ref())
    }

    /// Move every entry whose key starts with `prefix` into a new map, with
    /// the prefix stripped.
    pub fn split_prefixed(&mut self, prefix: &str) -> Metadata {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        let mut out = Metadata::new();
        for key in keys {
            if let Some(types) = self.entries.remove(&key) {
                out.entries.insert(key[prefix.len()..].to_string(), types);
            }
        }
        out
    }

    /// Copy every entry of `other` in under `prefix`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: &Metadata) {
        for (key, types) in &other.entries {
            let key = stored_key(&format!("{prefix}{key}")).into_owned();
            self.entries.insert(key, types.clone());
        }
    }

    /// Decode either layout. Empty input is simply no metadata.
    pub fn decode(data: &[u8]) -> Result<Self, MetadataError> {
        if data.is_empty() {
            return Ok(Self::new());
        }
        if data.len() >= 4 && &data[..4] == MAGIC {
            Self::decode_tagged(&data[4..])
        } else {
            Self::decode_legacy(data)
        }
    }

    fn decode_tagged(body: &[u8]) -> Result<Self, MetadataError> {
        let mut reader = BinaryReader::new(body);
        let mut out = Self::new();
        let truncated = |r: &BinaryReader| MetadataError::Truncated { offset: r.position() + 4 };

        while reader.remaining() >= 4 {
            let key_len = reader.read_u32().map_err(|_| truncated(&reader))? as usize;
            let key = read_latin1(&mut reader, key_len).ok_or_else(|| truncated(&reader))?;
            let type_count = reader.read_u32().map_err(|_| truncated(&reader))?;

            let types = out.entries.entry(key).or_default();
            for _ in 0..type_count {
                let tag = reader.read_u32().map_err(|_| truncated(&reader))?;
                let len = reader.read_u32().map_err(|_| truncated(&reader))? as usize;
                let value = reader.read_bytes(len).map_err(|_| truncated(&reader))?;
                types.insert(tag, value.to_vec());
            }
        }
        Ok(out)
    }

    fn decode_legacy(data: &[u8]) -> Result<Self, MetadataError> {
        let mut reader = BinaryReader::new(data);
        let mut out = Self::new();
        while !reader.is_empty() {
            let key_len = reader.read_u32().map_err(|_| MetadataError::LegacyUnreadable)? as usize;
            let key = read_latin1(&mut reader, key_len).ok_or(MetadataError::LegacyUnreadable)?;
            let value_len =
                reader.read_u32().map_err(|_| MetadataError::LegacyUnreadable)? as usize;
            let value = reader
                .read_bytes(value_len)
                .map_err(|_| MetadataError::LegacyUnreadable)?;
            out.set_other_data(key, TYPE_STRING, value.to_vec());
        }

        if !out.contains_key("Website") {
            if let Some(page) = out.other_data("Webpage", TYPE_STRING) {
                let page = page.to_vec();
                out.set_other_data("Website", TYPE_STRING, page);
            }
        }
        Ok(out)
    }

    /// Canonical encoding: keys in byte order, tags ascending.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_bytes(MAGIC);
        for (key, types) in &self.entries {
            // already Latin-1, see `stored_key`
            let key_bytes: Vec<u8> = key.chars().map(latin1_byte).collect();
            writer.write_u32(key_bytes.len() as u32);
            writer.write_bytes(&key_bytes);
            writer.write_u32(types.len() as u32);
            for (tag, value) in types {
                writer.write_u32(*tag);
                writer.write_u32(value.len() as u32);
                writer.write_bytes(value);
            }
        }
        writer.into_vec()
    }
}

/// The key as it will be written: one byte per character.
fn stored_key(key: &str) -> Cow<'_, str> {
    if key.chars().all(|c| u32::from(c) <= 0xFF) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(key.chars().map(|c| char::from(latin1_byte(c))).collect())
    }
}

fn read_latin1(reader: &mut BinaryReader, len: usize) -> Option<String> {
    reader
        .read_bytes(len)
        .ok()
        .map(|raw| raw.iter().map(|&b| b as char).collect())
}
