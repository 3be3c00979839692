//! Area options (slot 1, one 24-byte record).
//!
//!   0x00  u32 x2  default event mask
//!   0x08  u16     wrap flags (bit 0: horizontal wrap)
//!   0x0A  u16     time limit
//!   0x0C  u8      padding
//!   0x0D  u8      unk1
//!   0x0E  u8      start entrance id
//!   0x0F  u8 x2   unk2, unk3
//!   0x11  u8 x2   padding
//!   0x13  u8      unk4
//!   0x14  u16 x2  unk5, unk6
//!
//! The unk fields are not understood and are carried through verbatim.

use serde::Serialize;

use super::Record;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaOptions {
    pub default_events: u64,
    pub wrap_flags: u16,
    pub time_limit: u16,
    pub start_entrance: u8,
    pub unk1: u8,
    pub unk2: u8,
    pub unk3: u8,
    pub unk4: u8,
    pub unk5: u16,
    pub unk6: u16,
}

impl AreaOptions {
    pub const SIZE: usize = 24;

    pub fn wrap_edges(&self) -> bool {
        self.wrap_flags & 1 != 0
    }

    pub fn set_wrap_edges(&mut self, wrap: bool) {
        self.wrap_flags = (self.wrap_flags & !1) | u16::from(wrap);
    }

    /// Decode from a possibly short slot; missing trailing fields read as 0.
    pub fn from_slot(data: &[u8]) -> Result<Self> {
        let mut padded = [0u8; Self::SIZE];
        let n = data.len().min(Self::SIZE);
        padded[..n].copy_from_slice(&data[..n]);
        Self::read(&mut BinaryReader::new(&padded))
    }
}

impl Record for AreaOptions {
    const KIND: &'static str = "options";
    const STRIDE: usize = Self::SIZE;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let events_hi = reader.read_u32()?;
        let events_lo = reader.read_u32()?;
        let wrap_flags = reader.read_u16()?;
        let time_limit = reader.read_u16()?;
        reader.skip(1)?;
        let unk1 = reader.read_u8()?;
        let start_entrance = reader.read_u8()?;
        let unk2 = reader.read_u8()?;
        let unk3 = reader.read_u8()?;
        reader.skip(2)?;
        let unk4 = reader.read_u8()?;
        let unk5 = reader.read_u16()?;
        let unk6 = reader.read_u16()?;
        Ok(Self {
            default_events: (u64::from(events_hi) << 32) | u64::from(events_lo),
            wrap_flags,
            time_limit,
            start_entrance,
            unk1,
            unk2,
            unk3,
            unk4,
            unk5,
            unk6,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u32((self.default_events >> 32) as u32);
        writer.write_u32(self.default_events as u32);
        writer.write_u16(self.wrap_flags);
        writer.write_u16(self.time_limit);
        writer.write_zeros(1);
        writer.write_u8(self.unk1);
        writer.write_u8(self.start_entrance);
        writer.write_u8(self.unk2);
        writer.write_u8(self.unk3);
        writer.write_zeros(2);
        writer.write_u8(self.unk4);
        writer.write_u16(self.unk5);
        writer.write_u16(self.unk6);
    }
}
