//! Course block directory.
//!
//! Layout:
//!   Bytes 0-119:  15 × {offset: u32, length: u32} (big-endian)
//!   Bytes 120+:   optional auxiliary prefix, then slot payloads in order
//!
//! A zero-length slot carries an arbitrary offset and is never dereferenced.

use tracing::debug;

use super::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

pub const SLOT_COUNT: usize = 15;
pub const HEADER_SIZE: usize = SLOT_COUNT * 8;

/// Fixed slot assignment of the course format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Slot {
    Tilesets = 0,
    Options = 1,
    Boundings = 2,
    Reserved = 3,
    BackgroundA = 4,
    BackgroundB = 5,
    Entrances = 6,
    Sprites = 7,
    LoadedSprites = 8,
    Zones = 9,
    Locations = 10,
    CameraProfiles = 11,
    Paths = 12,
    PathNodes = 13,
    Metadata = 14,
}

impl Slot {
    pub const ALL: [Slot; SLOT_COUNT] = [
        Slot::Tilesets,
        Slot::Options,
        Slot::Boundings,
        Slot::Reserved,
        Slot::BackgroundA,
        Slot::BackgroundB,
        Slot::Entrances,
        Slot::Sprites,
        Slot::LoadedSprites,
        Slot::Zones,
        Slot::Locations,
        Slot::CameraProfiles,
        Slot::Paths,
        Slot::PathNodes,
        Slot::Metadata,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockEntry {
    pub offset: u32,
    pub length: u32,
}

impl BlockEntry {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.length as usize
    }
}

/// Decoded directory plus borrowed slot payloads.
#[derive(Debug)]
pub struct BlockTable<'a> {
    pub entries: [BlockEntry; SLOT_COUNT],
    slots: [&'a [u8]; SLOT_COUNT],
}

impl<'a> BlockTable<'a> {
    /// Read the header and slice out every slot, validating bounds and overlap.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::HeaderTooShort { len: data.len() });
        }

        let mut reader = BinaryReader::new(&data[..HEADER_SIZE]);
        let mut entries = [BlockEntry::default(); SLOT_COUNT];
        for entry in entries.iter_mut() {
            entry.offset = reader.read_u32()?;
            entry.length = reader.read_u32()?;
        }

        let mut slots: [&'a [u8]; SLOT_COUNT] = [&[]; SLOT_COUNT];
        for (slot, entry) in entries.iter().enumerate() {
            if entry.length == 0 {
                continue;
            }
            let range = entry.range();
            if range.end > data.len() {
                return Err(Error::SlotOutOfBounds {
                    slot,
                    offset: range.start,
                    length: range.len(),
                    buffer_len: data.len(),
                });
            }
            slots[slot] = &data[range];
        }

        check_overlap(&entries)?;

        debug!(
            lengths = ?entries.iter().map(|e| e.length).collect::<Vec<_>>(),
            "parsed block table"
        );
        Ok(Self { entries, slots })
    }

    pub fn slot(&self, slot: Slot) -> &'a [u8] {
        self.slots[slot.index()]
    }
}

fn check_overlap(entries: &[BlockEntry; SLOT_COUNT]) -> Result<()> {
    let mut live: Vec<(usize, std::ops::Range<usize>)> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.length > 0)
        .map(|(i, e)| (i, e.range()))
        .collect();
    live.sort_by_key(|(_, r)| r.start);

    for pair in live.windows(2) {
        let (a, ra) = &pair[0];
        let (b, rb) = &pair[1];
        if rb.start < ra.end {
            return Err(Error::SlotOverlap {
                first: (*a).min(*b),
                second: (*a).max(*b),
            });
        }
    }
    Ok(())
}

/// Serialise slot payloads behind a freshly computed header.
///
/// `extra_prefix` reserves that many zero bytes between the header and the
/// first payload; offsets account for it.
pub fn encode(slots: &[Vec<u8>; SLOT_COUNT], extra_prefix: usize) -> Vec<u8> {
    let body_len: usize = slots.iter().map(Vec::len).sum();
    let mut writer = BinaryWriter::with_capacity(HEADER_SIZE + extra_prefix + body_len);

    let mut offset = HEADER_SIZE + extra_prefix;
    for slot in slots {
        writer.write_u32(offset as u32);
        writer.write_u32(slot.len() as u32);
        offset += slot.len();
    }
    writer.write_zeros(extra_prefix);
    for slot in slots {
        writer.write_bytes(slot);
    }

    debug!(total = writer.len(), "encoded block table");
    writer.into_vec()
}
