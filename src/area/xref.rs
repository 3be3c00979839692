//! Tileset cross-references.
//!
//! A placement names its object through a 4-bit tileset selector and a
//! 12-bit index. Selector 0 is always the primary tileset. For the other
//! slots an area may carry a compacted table: the slot's own embedded
//! objects keep their positions and every shared-library object in use is
//! appended after them in first-seen order. Slots without a table map
//! indices straight onto their embedded tileset. A stored index the table
//! does not cover falls back to object 0 of that slot.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::trace;

use super::ObjectPlacement;
use crate::codec::records::object::MAX_OBJECT_INDEX;
use crate::codec::records::tileset::TILESET_SLOTS;
use crate::codec::{BinaryReader, BinaryWriter, Metadata};
use crate::error::{push_warning, CodecWarning, MetadataError};
use crate::library::ObjectLibrary;

/// Where a placed object's definition lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TilesetRef {
    Primary(u16),
    Embedded { slot: u8, index: u16 },
    Shared(String),
}

/// One compacted table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XrefEntry {
    Embedded(u16),
    Shared(String),
}

const KIND_EMBEDDED: u8 = 0;
const KIND_SHARED: u8 = 1;

/// Compacted index tables, keyed by tileset selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XrefTable {
    slots: BTreeMap<u8, Vec<XrefEntry>>,
}

impl XrefTable {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn entries(&self, selector: u8) -> Option<&[XrefEntry]> {
        self.slots.get(&selector).map(Vec::as_slice)
    }

    pub fn insert(&mut self, selector: u8, entries: Vec<XrefEntry>) {
        self.slots.insert(selector, entries);
    }

    /// Resolve a stored (selector, index) pair.
    pub fn resolve(
        &self,
        selector: u8,
        index: u16,
        layer: usize,
        library: &dyn ObjectLibrary,
        warnings: &mut Vec<CodecWarning>,
    ) -> TilesetRef {
        if selector == 0 {
            return TilesetRef::Primary(index);
        }
        let Some(entries) = self.slots.get(&selector) else {
            return TilesetRef::Embedded { slot: selector, index };
        };
        match entries.get(usize::from(index)) {
            Some(XrefEntry::Embedded(i)) => TilesetRef::Embedded { slot: selector, index: *i },
            Some(XrefEntry::Shared(key)) => {
                if !library.contains(key) {
                    push_warning(
                        warnings,
                        CodecWarning::MissingSharedObject { layer, key: key.clone() },
                    );
                }
                TilesetRef::Shared(key.clone())
            }
            None => {
                push_warning(warnings, CodecWarning::MissingXref { layer, selector, index });
                TilesetRef::Embedded { slot: selector, index: 0 }
            }
        }
    }

    /// Serialise as metadata: key `Pa{selector}`, binary payload of
    /// `{kind: u8, index: u16}` or `{kind: u8, keyLen: u32, key}` entries.
    pub fn to_metadata(&self) -> Metadata {
        let mut md = Metadata::new();
        for (selector, entries) in &self.slots {
            let mut writer = BinaryWriter::new();
            for entry in entries {
                match entry {
                    XrefEntry::Embedded(index) => {
                        writer.write_u8(KIND_EMBEDDED);
                        writer.write_u16(*index);
                    }
                    XrefEntry::Shared(key) => {
                        writer.write_u8(KIND_SHARED);
                        writer.write_u32(key.len() as u32);
                        writer.write_bytes(key.as_bytes());
                    }
                }
            }
            md.set_bin_data(format!("Pa{selector}"), writer.into_vec());
        }
        md
    }

    /// Inverse of [`XrefTable::to_metadata`]. Keys that are not `Pa{n}` are ignored.
    pub fn from_metadata(md: &Metadata) -> Result<Self, MetadataError> {
        let mut table = Self::default();
        for key in md.keys() {
            let Some(selector) = key.strip_prefix("Pa").and_then(|n| n.parse::<u8>().ok()) else {
                continue;
            };
            let Some(payload) = md.bin_data(key) else {
                continue;
            };

            let mut reader = BinaryReader::new(payload);
            let truncated = |r: &BinaryReader| MetadataError::Truncated { offset: r.position() };
            let mut entries = Vec::new();
            while !reader.is_empty() {
                let kind = reader.read_u8().map_err(|_| truncated(&reader))?;
                let entry = if kind == KIND_SHARED {
                    let len = reader.read_u32().map_err(|_| truncated(&reader))? as usize;
                    let raw = reader.read_bytes(len).map_err(|_| truncated(&reader))?;
                    XrefEntry::Shared(String::from_utf8_lossy(raw).into_owned())
                } else {
                    XrefEntry::Embedded(reader.read_u16().map_err(|_| truncated(&reader))?)
                };
                entries.push(entry);
            }
            table.slots.insert(selector, entries);
        }
        Ok(table)
    }
}

/// Save-time index assignment for one area.
#[derive(Debug, Clone)]
pub struct CompactedLayout {
    pub table: XrefTable,
    shared_slot: u8,
    embedded_count: usize,
    shared: IndexSet<String>,
}

impl CompactedLayout {
    /// Scan layers 0, 1, 2 in order and lay out the shared slot's table.
    pub fn build(
        layers: &[Vec<ObjectPlacement>; 3],
        shared_slot: u8,
        library: &dyn ObjectLibrary,
        warnings: &mut Vec<CodecWarning>,
    ) -> Self {
        let mut embedded_count = 0usize;
        let mut shared = IndexSet::new();

        for (layer, placements) in layers.iter().enumerate() {
            for placement in placements {
                match &placement.tileset {
                    TilesetRef::Embedded { slot, index } if *slot == shared_slot => {
                        embedded_count = embedded_count.max(usize::from(*index) + 1);
                    }
                    TilesetRef::Shared(key) => {
                        if shared.insert(key.clone()) {
                            let position = shared.len() - 1;
                            trace!(layer, key = key.as_str(), position, "shared object");
                            if !library.contains(key) {
                                push_warning(
                                    warnings,
                                    CodecWarning::MissingSharedObject { layer, key: key.clone() },
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut table = XrefTable::default();
        if !shared.is_empty() {
            let entries = (0..embedded_count)
                .map(|i| XrefEntry::Embedded(i as u16))
                .chain(shared.iter().cloned().map(XrefEntry::Shared))
                .collect();
            table.insert(shared_slot, entries);
        }

        Self { table, shared_slot, embedded_count, shared }
    }

    /// Stored (selector, index) for a reference, or the warning that
    /// explains why the placement cannot be written.
    ///
    /// Selectors are limited to the four tileset slots, so a packed pair
    /// never collides with the 0xFFFF end-of-layer marker.
    pub fn locate(&self, tileset: &TilesetRef) -> Result<(u8, u16), CodecWarning> {
        let (selector, index) = match tileset {
            TilesetRef::Primary(index) => (0, usize::from(*index)),
            TilesetRef::Embedded { slot, index } => (*slot, usize::from(*index)),
            TilesetRef::Shared(key) => {
                let position = self.shared.get_index_of(key).unwrap_or_default();
                (self.shared_slot, self.embedded_count + position)
            }
        };
        if usize::from(selector) >= TILESET_SLOTS {
            return Err(CodecWarning::InvalidTilesetSlot { slot: selector, index });
        }
        if index > usize::from(MAX_OBJECT_INDEX) {
            return Err(CodecWarning::CompactedIndexOverflow { slot: selector, index });
        }
        Ok((selector, index as u16))
    }
}
