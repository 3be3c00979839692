//! Object placements (layer files, 16 bytes each, closed by 0xFFFF).
//!
//!   0x00  u16     tileset/object: nibble 0 selects the tileset slot,
//!                 nibbles 1-3 hold the object index
//!   0x02  i16 x2  x, y (tiles)
//!   0x06  u16 x2  width, height (tiles)
//!   0x0A  u8      contents
//!   0x0B  5 bytes padding

use super::Record;
use crate::codec::{bitfield, BinaryReader, BinaryWriter};
use crate::error::Result;

pub const MAX_OBJECT_INDEX: u16 = 0x0FFF;

/// A placement as stored, before the tileset selector is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPlacement {
    pub selector: u8,
    pub index: u16,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub contents: u8,
}

impl Record for RawPlacement {
    const KIND: &'static str = "object";
    const STRIDE: usize = 16;
    const TERMINATOR: &'static [u8] = &[0xFF, 0xFF];

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let packed: [u8; 2] = reader.read_array()?;
        Ok(Self {
            selector: bitfield::get(&packed, 0, 1) as u8,
            index: bitfield::get(&packed, 1, 4) as u16,
            x: reader.read_i16()?,
            y: reader.read_i16()?,
            width: reader.read_u16()?,
            height: reader.read_u16()?,
            contents: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        let mut packed = [0u8; 2];
        bitfield::set(&mut packed, 0, 1, u64::from(self.selector));
        bitfield::set(&mut packed, 1, 4, u64::from(self.index));
        writer.write_bytes(&packed);
        writer.write_i16(self.x);
        writer.write_i16(self.y);
        writer.write_u16(self.width);
        writer.write_u16(self.height);
        writer.write_u8(self.contents);
    }

    fn is_terminator(chunk: &[u8]) -> bool {
        chunk.starts_with(Self::TERMINATOR)
    }
}
