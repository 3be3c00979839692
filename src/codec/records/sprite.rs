//! Sprites (slot 7, 24 bytes each, closed by 0xFFFFFFFF).
//!
//!   0x00  u16     sprite type
//!   0x02  u16 x2  x, y (sub-tile units)
//!   0x06  10 bytes  parameters 0..10
//!   0x10  u8      zone (recomputed on save)
//!   0x11  u8      padding
//!   0x12  2 bytes   parameters 10..12
//!   0x14  4 bytes padding
//!
//! Slot 8 lists every distinct sprite type in the area, 4 bytes each.

use serde::Serialize;

use super::Record;
use crate::codec::{bitfield, BinaryReader, BinaryWriter};
use crate::error::Result;

/// Sprite type reserved for the end-of-list marker.
pub const END_OF_LIST: u16 = 0xFFFF;
pub const PARAM_LEN: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sprite {
    pub kind: u16,
    pub x: u16,
    pub y: u16,
    pub params: [u8; PARAM_LEN],
    pub zone: u8,
}

impl Sprite {
    /// Read a nibble-addressed parameter field.
    pub fn nibbles(&self, start: usize, end: usize) -> u64 {
        bitfield::get(&self.params, start, end)
    }

    pub fn set_nibbles(&mut self, start: usize, end: usize, value: u64) {
        bitfield::set(&mut self.params, start, end, value);
    }
}

impl Record for Sprite {
    const KIND: &'static str = "sprite";
    const STRIDE: usize = 24;
    const TERMINATOR: &'static [u8] = &[0xFF; 4];

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let kind = reader.read_u16()?;
        let x = reader.read_u16()?;
        let y = reader.read_u16()?;
        let mut params = [0u8; PARAM_LEN];
        params[..10].copy_from_slice(reader.read_bytes(10)?);
        let zone = reader.read_u8()?;
        reader.skip(1)?;
        params[10..].copy_from_slice(reader.read_bytes(2)?);
        Ok(Self { kind, x, y, params, zone })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.kind);
        writer.write_u16(self.x);
        writer.write_u16(self.y);
        writer.write_bytes(&self.params[..10]);
        writer.write_u8(self.zone);
        writer.write_zeros(1);
        writer.write_bytes(&self.params[10..]);
    }

    fn is_terminator(chunk: &[u8]) -> bool {
        chunk.starts_with(&END_OF_LIST.to_be_bytes())
    }
}

/// Entry of the loaded-sprite list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadedSprite(pub u16);

impl Record for LoadedSprite {
    const KIND: &'static str = "loaded sprite";
    const STRIDE: usize = 4;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self(reader.read_u16()?))
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.0);
    }
}

/// Ascending, de-duplicated sprite types used by `sprites`.
pub fn loaded_sprites(sprites: &[Sprite]) -> Vec<LoadedSprite> {
    let mut kinds: Vec<LoadedSprite> = sprites.iter().map(|s| LoadedSprite(s.kind)).collect();
    kinds.sort_unstable();
    kinds.dedup();
    kinds
}
