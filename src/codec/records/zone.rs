//! Zone records and the two record kinds zones point at.
//!
//! Zone (slot 9, 28 bytes):
//!   0x00  u16 x4  x, y, width, height (tiles)
//!   0x08  u16 x2  object shading, terrain shading
//!   0x0C  u8      zone id
//!   0x0D  u8      bounding record id
//!   0x0E  u8 x2   camera mode, camera zoom
//!   0x10  u8      padding
//!   0x11  u8      visibility
//!   0x12  u8 x2   background A id, background B id
//!   0x14  u8      unk1
//!   0x15  u8      padding
//!   0x16  u8 x2   music, sound modifier
//!   0x18  u8 x4   unk2 (opaque)
//!
//! Bounding (slot 2, 28 bytes):
//!   i32 x4 upper, lower, upper2, lower2; u16 id; u16 flags; 8 padding
//!
//! Background (slots 4 and 5, 28 bytes):
//!   u16 id; pad; u8 unk1; 4 pad; 16-byte name; u16 unk2; 2 pad

use serde::Serialize;

use super::Record;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

/// Background id written by zones that have no background on that layer.
pub const NO_BACKGROUND: u8 = 0xFF;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneRecord {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub object_shading: u16,
    pub terrain_shading: u16,
    pub id: u8,
    pub bounding_id: u8,
    pub camera_mode: u8,
    pub camera_zoom: u8,
    pub visibility: u8,
    pub background_a_id: u8,
    pub background_b_id: u8,
    pub unk1: u8,
    pub music: u8,
    pub sound_modifier: u8,
    pub unk2: [u8; 4],
}

impl Record for ZoneRecord {
    const KIND: &'static str = "zone";
    const STRIDE: usize = 28;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let x = reader.read_u16()?;
        let y = reader.read_u16()?;
        let width = reader.read_u16()?;
        let height = reader.read_u16()?;
        let object_shading = reader.read_u16()?;
        let terrain_shading = reader.read_u16()?;
        let id = reader.read_u8()?;
        let bounding_id = reader.read_u8()?;
        let camera_mode = reader.read_u8()?;
        let camera_zoom = reader.read_u8()?;
        reader.skip(1)?;
        let visibility = reader.read_u8()?;
        let background_a_id = reader.read_u8()?;
        let background_b_id = reader.read_u8()?;
        let unk1 = reader.read_u8()?;
        reader.skip(1)?;
        let music = reader.read_u8()?;
        let sound_modifier = reader.read_u8()?;
        let unk2 = reader.read_array()?;
        Ok(Self {
            x,
            y,
            width,
            height,
            object_shading,
            terrain_shading,
            id,
            bounding_id,
            camera_mode,
            camera_zoom,
            visibility,
            background_a_id,
            background_b_id,
            unk1,
            music,
            sound_modifier,
            unk2,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.x);
        writer.write_u16(self.y);
        writer.write_u16(self.width);
        writer.write_u16(self.height);
        writer.write_u16(self.object_shading);
        writer.write_u16(self.terrain_shading);
        writer.write_u8(self.id);
        writer.write_u8(self.bounding_id);
        writer.write_u8(self.camera_mode);
        writer.write_u8(self.camera_zoom);
        writer.write_zeros(1);
        writer.write_u8(self.visibility);
        writer.write_u8(self.background_a_id);
        writer.write_u8(self.background_b_id);
        writer.write_u8(self.unk1);
        writer.write_zeros(1);
        writer.write_u8(self.music);
        writer.write_u8(self.sound_modifier);
        writer.write_bytes(&self.unk2);
    }
}

/// Vertical camera bounds of a zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneBounds {
    pub upper: i32,
    pub lower: i32,
    pub upper2: i32,
    pub lower2: i32,
    pub id: u16,
    pub flags: u16,
}

impl Record for ZoneBounds {
    const KIND: &'static str = "bounding";
    const STRIDE: usize = 28;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            upper: reader.read_i32()?,
            lower: reader.read_i32()?,
            upper2: reader.read_i32()?,
            lower2: reader.read_i32()?,
            id: reader.read_u16()?,
            flags: reader.read_u16()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_i32(self.upper);
        writer.write_i32(self.lower);
        writer.write_i32(self.upper2);
        writer.write_i32(self.lower2);
        writer.write_u16(self.id);
        writer.write_u16(self.flags);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Background {
    pub id: u16,
    pub unk1: u8,
    pub name: String,
    pub unk2: u16,
}

impl Background {
    pub const NAME_WIDTH: usize = 16;
}

impl Record for Background {
    const KIND: &'static str = "background";
    const STRIDE: usize = 28;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let id = reader.read_u16()?;
        reader.skip(1)?;
        let unk1 = reader.read_u8()?;
        reader.skip(4)?;
        let name = reader.read_fixed_string(Self::NAME_WIDTH)?;
        let unk2 = reader.read_u16()?;
        Ok(Self { id, unk1, name, unk2 })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.id);
        writer.write_zeros(1);
        writer.write_u8(self.unk1);
        writer.write_zeros(4);
        writer.write_fixed_string(&self.name, Self::NAME_WIDTH);
        writer.write_u16(self.unk2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::records::{decode_slot, encode_slot};

    #[test]
    fn test_zone_record_layout() {
        let zone = ZoneRecord {
            x: 256,
            y: 512,
            width: 1024,
            height: 480,
            id: 3,
            bounding_id: 1,
            background_a_id: 1,
            background_b_id: NO_BACKGROUND,
            music: 4,
            unk2: [1, 2, 3, 4],
            ..Default::default()
        };
        let data = encode_slot([&zone]);
        assert_eq!(data.len(), 28);
        assert_eq!(data[12], 3);
        assert_eq!(data[13], 1);
        assert_eq!(data[19], 0xFF);
        assert_eq!(data[22], 4);
        assert_eq!(&data[24..], &[1, 2, 3, 4]);

        let mut warnings = Vec::new();
        assert_eq!(decode_slot::<ZoneRecord>(&data, true, &mut warnings).unwrap(), vec![zone]);
    }

    #[test]
    fn test_bounds_are_signed() {
        let bounds =
            ZoneBounds { upper: -64, lower: 96, upper2: 0, lower2: -1, id: 2, flags: 0x0F };
        let data = encode_slot([&bounds]);
        assert_eq!(&data[0..4], &(-64i32).to_be_bytes());
        assert_eq!(&data[20..28], &[0u8; 8]);

        let mut warnings = Vec::new();
        assert_eq!(decode_slot::<ZoneBounds>(&data, true, &mut warnings).unwrap(), vec![bounds]);
    }

    #[test]
    fn test_background_name_field() {
        let bg = Background { id: 7, unk1: 2, name: "bgA_4001".into(), unk2: 0x10 };
        let data = encode_slot([&bg]);
        assert_eq!(data.len(), 28);
        assert_eq!(data[3], 2);
        assert_eq!(&data[8..16], b"bgA_4001");
        assert_eq!(&data[24..26], &[0x00, 0x10]);

        let mut warnings = Vec::new();
        assert_eq!(decode_slot::<Background>(&data, true, &mut warnings).unwrap(), vec![bg]);
    }
}
