use serde::Serialize;

use super::Record;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

/// Location rectangle (slot 10, 12 bytes): x, y, width, height, id, 3 padding.
/// Duplicate ids are representable and written back as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub id: u8,
}

impl Record for Location {
    const KIND: &'static str = "location";
    const STRIDE: usize = 12;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_u16()?,
            y: reader.read_u16()?,
            width: reader.read_u16()?,
            height: reader.read_u16()?,
            id: reader.read_u8()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.x);
        writer.write_u16(self.y);
        writer.write_u16(self.width);
        writer.write_u16(self.height);
        writer.write_u8(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::records::{decode_slot, encode_slot};

    #[test]
    fn test_duplicate_ids_round_trip() {
        let locs = vec![
            Location { x: 16, y: 32, width: 64, height: 48, id: 1 },
            Location { x: 100, y: 0, width: 8, height: 8, id: 1 },
        ];
        let data = encode_slot(&locs);
        assert_eq!(data.len(), 24);
        assert_eq!(data[8], 1);
        assert_eq!(&data[9..12], &[0, 0, 0]);

        let mut warnings = Vec::new();
        assert_eq!(decode_slot::<Location>(&data, true, &mut warnings).unwrap(), locs);
    }
}
