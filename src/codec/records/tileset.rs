use serde::Serialize;

use super::Record;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

pub const NAME_WIDTH: usize = 32;
pub const TILESET_SLOTS: usize = 4;

/// One 32-byte NUL-padded tileset name. Slot 0 holds four of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TilesetName(pub String);

impl Record for TilesetName {
    const KIND: &'static str = "tileset name";
    const STRIDE: usize = NAME_WIDTH;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self(reader.read_fixed_string(NAME_WIDTH)?))
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_fixed_string(&self.0, NAME_WIDTH);
    }
}

/// Spread decoded names over the four tileset slots, blank for any missing.
pub fn names_from_records(records: Vec<TilesetName>) -> [String; TILESET_SLOTS] {
    let mut names: [String; TILESET_SLOTS] = Default::default();
    for (slot, name) in names.iter_mut().zip(records) {
        *slot = name.0;
    }
    names
}

pub fn records_from_names(names: &[String; TILESET_SLOTS]) -> Vec<TilesetName> {
    names.iter().cloned().map(TilesetName).collect()
}
