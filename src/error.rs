/// Fatal decode failures. Anything in here aborts the whole area load.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof { offset: usize, need: usize, have: usize },

    #[error("block header too short: {len} bytes (need 120)")]
    HeaderTooShort { len: usize },

    #[error("slot {slot} range {offset:#x}+{length:#x} exceeds buffer of {buffer_len} bytes")]
    SlotOutOfBounds { slot: usize, offset: usize, length: usize, buffer_len: usize },

    #[error("slots {first} and {second} overlap")]
    SlotOverlap { first: usize, second: usize },

    #[error("{kind} slot length {len} is not a multiple of {stride}")]
    BadStride { kind: &'static str, len: usize, stride: usize },

    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a metadata blob could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("entry at offset {offset:#x} runs past the end of the blob")]
    Truncated { offset: usize },

    #[error("legacy metadata could not be read")]
    LegacyUnreadable,
}

/// Recoverable problems found while loading or saving an area.
///
/// These never abort the operation; a placeholder is substituted and the
/// warning is handed back to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecWarning {
    /// A placement resolved to a shared-library object the library does not know.
    #[error("layer {layer}: shared object {key:?} not found in library")]
    MissingSharedObject { layer: usize, key: String },

    /// A placement's (selector, index) pair has no entry in the cross-reference table.
    #[error("layer {layer}: tileset {selector} object {index} has no cross-reference, using 0")]
    MissingXref { layer: usize, selector: u8, index: u16 },

    #[error("zone {zone}: bounding record {bounding_id} not found")]
    MissingBounding { zone: usize, bounding_id: u8 },

    #[error("zone {zone}: background {layer} record {background_id} not found")]
    MissingBackground { zone: usize, layer: char, background_id: u8 },

    /// The metadata slot was unreadable and an empty map was used instead.
    #[error("metadata discarded: {0}")]
    MetadataDiscarded(MetadataError),

    /// A compacted tileset index did not fit into 12 bits; the placement was dropped.
    #[error("tileset slot {slot}: compacted index {index} exceeds 0xFFF")]
    CompactedIndexOverflow { slot: u8, index: usize },

    /// A placement names a tileset slot that does not exist; it was dropped.
    #[error("tileset slot {slot} does not exist, object {index} dropped")]
    InvalidTilesetSlot { slot: u8, index: usize },

    /// A sprite whose type is the end-of-list marker; it was not written.
    #[error("sprite {position} has the end-of-list type, skipped")]
    SentinelSpriteSkipped { position: usize },

    #[error("path {path_id} has no nodes, skipped")]
    EmptyPathSkipped { path_id: u8 },

    /// A slot was truncated to whole records because its length was off-stride.
    #[error("{kind} slot length {len} truncated to a multiple of {stride}")]
    TruncatedSlot { kind: &'static str, len: usize, stride: usize },
}

/// Log a warning and hand it back to the caller.
pub(crate) fn push_warning(warnings: &mut Vec<CodecWarning>, warning: CodecWarning) {
    tracing::warn!("{warning}");
    warnings.push(warning);
}
