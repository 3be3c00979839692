pub mod bitfield;
pub mod block_table;
pub mod metadata;
pub mod reader;
pub mod records;
pub mod writer;

pub use block_table::{BlockEntry, BlockTable, Slot, HEADER_SIZE, SLOT_COUNT};
pub use metadata::Metadata;
pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use records::{
    AreaOptions, Background, Entrance, EntranceSettings, Location, Path, PathNode,
    RawPlacement, Sprite, ZoneBounds, ZoneRecord,
};
