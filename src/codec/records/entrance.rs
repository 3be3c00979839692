//! Entrance (slot 6, 24 bytes).
//!
//!   0x00  u16 x2  x, y (sub-tile units)
//!   0x04  u8 x4   unk1..unk4
//!   0x08  u8      entrance id
//!   0x09  u8 x2   destination area, destination entrance
//!   0x0B  u8      entrance type
//!   0x0C  u8      unk5
//!   0x0D  u8      zone (recomputed on save)
//!   0x0E  u8      layer
//!   0x0F  u8      path id
//!   0x10  u8      settings
//!   0x11  u8 x2   unk6, unk7
//!   0x13  5 bytes padding

use bitflags::bitflags;
use serde::Serialize;

use super::Record;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

bitflags! {
    /// Entrance settings byte. Unknown bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct EntranceSettings: u8 {
        const FORWARD_PIPE = 0x01;
        const CONNECTED_PIPE = 0x08;
        const NOT_ENTERABLE = 0x80;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entrance {
    pub x: u16,
    pub y: u16,
    pub id: u8,
    pub dest_area: u8,
    pub dest_entrance: u8,
    pub kind: u8,
    pub zone: u8,
    pub layer: u8,
    pub path_id: u8,
    pub settings: EntranceSettings,
    pub unk1: u8,
    pub unk2: u8,
    pub unk3: u8,
    pub unk4: u8,
    pub unk5: u8,
    pub unk6: u8,
    pub unk7: u8,
}

impl Entrance {
    pub fn is_enterable(&self) -> bool {
        !self.settings.contains(EntranceSettings::NOT_ENTERABLE)
    }
}

impl Record for Entrance {
    const KIND: &'static str = "entrance";
    const STRIDE: usize = 24;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let x = reader.read_u16()?;
        let y = reader.read_u16()?;
        let [unk1, unk2, unk3, unk4] = reader.read_array()?;
        let id = reader.read_u8()?;
        let dest_area = reader.read_u8()?;
        let dest_entrance = reader.read_u8()?;
        let kind = reader.read_u8()?;
        let unk5 = reader.read_u8()?;
        let zone = reader.read_u8()?;
        let layer = reader.read_u8()?;
        let path_id = reader.read_u8()?;
        let settings = EntranceSettings::from_bits_retain(reader.read_u8()?);
        let unk6 = reader.read_u8()?;
        let unk7 = reader.read_u8()?;
        Ok(Self {
            x,
            y,
            id,
            dest_area,
            dest_entrance,
            kind,
            zone,
            layer,
            path_id,
            settings,
            unk1,
            unk2,
            unk3,
            unk4,
            unk5,
            unk6,
            unk7,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.x);
        writer.write_u16(self.y);
        writer.write_bytes(&[self.unk1, self.unk2, self.unk3, self.unk4]);
        writer.write_u8(self.id);
        writer.write_u8(self.dest_area);
        writer.write_u8(self.dest_entrance);
        writer.write_u8(self.kind);
        writer.write_u8(self.unk5);
        writer.write_u8(self.zone);
        writer.write_u8(self.layer);
        writer.write_u8(self.path_id);
        writer.write_u8(self.settings.bits());
        writer.write_u8(self.unk6);
        writer.write_u8(self.unk7);
    }
}
