//! NSMB Level Codec
//!
//! Reads and writes the area files of a console platformer's level
//! container: the block-table course file, its object layers and the
//! metadata and tileset cross-reference tables that ride along.

pub mod area;
pub mod codec;
pub mod error;
pub mod library;

pub use area::{
    Area, CodecConfig, LoadedArea, ObjectPlacement, SavedArea, TilesetRef, Zone,
};
pub use codec::{BlockTable, Metadata, Slot};
pub use error::{CodecWarning, Error, MetadataError, Result};
pub use library::{EmptyLibrary, MemoryLibrary, ObjectLibrary};
