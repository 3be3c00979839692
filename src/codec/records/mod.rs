//! Fixed-stride record codecs.
//!
//! Every slot is a flat array of equally sized records, optionally closed by
//! a sentinel. Decoding walks `len / STRIDE` records and stops early at the
//! sentinel; encoding writes each record, zero-fills it to `STRIDE` and
//! appends the sentinel.

pub mod entrance;
pub mod location;
pub mod object;
pub mod options;
pub mod path;
pub mod sprite;
pub mod tileset;
pub mod zone;

pub use entrance::{Entrance, EntranceSettings};
pub use location::Location;
pub use object::RawPlacement;
pub use options::AreaOptions;
pub use path::{Path, PathHeader, PathNode};
pub use sprite::{LoadedSprite, Sprite};
pub use tileset::TilesetName;
pub use zone::{Background, ZoneBounds, ZoneRecord};

use super::{BinaryReader, BinaryWriter};
use crate::error::{push_warning, CodecWarning, Error, Result};

/// A fixed-size on-disk record.
pub trait Record: Sized {
    const KIND: &'static str;
    const STRIDE: usize;
    /// Bytes appended after the last record, if the slot is sentinel-terminated.
    const TERMINATOR: &'static [u8] = &[];

    fn read(reader: &mut BinaryReader) -> Result<Self>;
    fn write(&self, writer: &mut BinaryWriter);

    /// Whether `chunk` is the end-of-list marker rather than a record.
    fn is_terminator(_chunk: &[u8]) -> bool {
        false
    }
}

/// Decode every record in a slot.
///
/// A length that is neither a whole number of records nor whole records
/// plus the sentinel is a structural error when `strict`, otherwise the
/// trailing partial record is dropped with a warning.
pub fn decode_slot<R: Record>(
    data: &[u8],
    strict: bool,
    warnings: &mut Vec<CodecWarning>,
) -> Result<Vec<R>> {
    let rem = data.len() % R::STRIDE;
    if rem != 0 && rem != R::TERMINATOR.len() {
        if strict {
            return Err(Error::BadStride { kind: R::KIND, len: data.len(), stride: R::STRIDE });
        }
        push_warning(
            warnings,
            CodecWarning::TruncatedSlot { kind: R::KIND, len: data.len(), stride: R::STRIDE },
        );
    }

    let count = data.len() / R::STRIDE;
    let mut records = Vec::with_capacity(count);
    for chunk in data.chunks_exact(R::STRIDE) {
        if R::is_terminator(chunk) {
            break;
        }
        records.push(R::read(&mut BinaryReader::new(chunk))?);
    }
    Ok(records)
}

/// Encode records back to back, then the sentinel.
pub fn encode_slot<'a, R: Record + 'a>(records: impl IntoIterator<Item = &'a R>) -> Vec<u8> {
    let mut writer = BinaryWriter::new();
    for record in records {
        let start = writer.len();
        record.write(&mut writer);
        debug_assert!(writer.len() - start <= R::STRIDE, "{} overran its stride", R::KIND);
        writer.pad_to(start + R::STRIDE);
    }
    writer.write_bytes(R::TERMINATOR);
    writer.into_vec()
}
