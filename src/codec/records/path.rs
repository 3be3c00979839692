//! Paths (slot 12, 12-byte headers) and their nodes (slot 13, 20 bytes each).
//!
//! Header: u8 id, u8 unk, u16 first node index, u16 node count,
//!         u16 flags (bit 1: loop), 4 padding.
//! Node:   u16 x, u16 y, f32 speed, f32 acceleration, u16 delay, 6 padding.
//!
//! The node slot is one flat array shared by all paths; each header names
//! the contiguous run it owns.

use serde::Serialize;
use tracing::warn;

use super::Record;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::{push_warning, CodecWarning, Result};

const LOOP_FLAG: u16 = 0x0002;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathHeader {
    pub id: u8,
    pub unk: u8,
    pub node_start: u16,
    pub node_count: u16,
    pub flags: u16,
}

impl Record for PathHeader {
    const KIND: &'static str = "path";
    const STRIDE: usize = 12;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            id: reader.read_u8()?,
            unk: reader.read_u8()?,
            node_start: reader.read_u16()?,
            node_count: reader.read_u16()?,
            flags: reader.read_u16()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.id);
        writer.write_u8(self.unk);
        writer.write_u16(self.node_start);
        writer.write_u16(self.node_count);
        writer.write_u16(self.flags);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathNode {
    pub x: u16,
    pub y: u16,
    pub speed: f32,
    pub accel: f32,
    pub delay: u16,
}

impl Record for PathNode {
    const KIND: &'static str = "path node";
    const STRIDE: usize = 20;

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_u16()?,
            y: reader.read_u16()?,
            speed: reader.read_f32()?,
            accel: reader.read_f32()?,
            delay: reader.read_u16()?,
        })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16(self.x);
        writer.write_u16(self.y);
        writer.write_f32(self.speed);
        writer.write_f32(self.accel);
        writer.write_u16(self.delay);
    }
}

/// A path owns its nodes; a node's index is its position in `nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path {
    pub id: u8,
    pub unk: u8,
    pub looped: bool,
    /// Header flag bits other than the loop bit, kept as read.
    pub flags: u16,
    pub nodes: Vec<PathNode>,
}

impl Path {
    /// Remove a node, returning `false` once the path has none left and
    /// should itself be removed.
    pub fn remove_node(&mut self, index: usize) -> bool {
        if index < self.nodes.len() {
            self.nodes.remove(index);
        }
        !self.nodes.is_empty()
    }
}

/// Attach each header's node run. Runs past the end of the node array are
/// clamped to what exists.
pub fn assemble_paths(headers: Vec<PathHeader>, nodes: &[PathNode]) -> Vec<Path> {
    headers
        .into_iter()
        .map(|h| {
            let start = usize::from(h.node_start).min(nodes.len());
            let end = (start + usize::from(h.node_count)).min(nodes.len());
            if end - start != usize::from(h.node_count) {
                warn!(
                    path = h.id,
                    start = h.node_start,
                    count = h.node_count,
                    "path node run clamped"
                );
            }
            Path {
                id: h.id,
                unk: h.unk,
                looped: h.flags & LOOP_FLAG != 0,
                flags: h.flags & !LOOP_FLAG,
                nodes: nodes[start..end].to_vec(),
            }
        })
        .collect()
}

/// Flatten paths into headers with freshly computed node runs. Paths
/// without nodes are left out.
pub fn flatten_paths<'a>(
    paths: &'a [Path],
    warnings: &mut Vec<CodecWarning>,
) -> (Vec<PathHeader>, Vec<&'a PathNode>) {
    let mut headers = Vec::with_capacity(paths.len());
    let mut nodes = Vec::new();
    for path in paths {
        if path.nodes.is_empty() {
            push_warning(warnings, CodecWarning::EmptyPathSkipped { path_id: path.id });
            continue;
        }
        headers.push(PathHeader {
            id: path.id,
            unk: path.unk,
            node_start: nodes.len() as u16,
            node_count: path.nodes.len() as u16,
            flags: (path.flags & !LOOP_FLAG) | if path.looped { LOOP_FLAG } else { 0 },
        });
        nodes.extend(path.nodes.iter());
    }
    (headers, nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::records::{decode_slot, encode_slot};

    fn node(x: u16) -> PathNode {
        PathNode { x, y: x * 2, speed: 1.5, accel: 0.0625, delay: 0 }
    }

    #[test]
    fn test_node_layout() {
        let data = encode_slot([&node(16)]);
        assert_eq!(data.len(), 20);
        assert_eq!(&data[4..8], &1.5f32.to_be_bytes());
        assert_eq!(&data[14..], &[0u8; 6]);
    }

    #[test]
    fn test_flatten_recomputes_starts() {
        let paths = vec![
            Path { id: 1, unk: 0, looped: true, flags: 0, nodes: vec![node(1), node(2)] },
            Path { id: 2, unk: 0, looped: false, flags: 0, nodes: vec![] },
            Path { id: 3, unk: 7, looped: false, flags: 0, nodes: vec![node(3)] },
        ];
        let mut warnings = Vec::new();
        let (headers, nodes) = flatten_paths(&paths, &mut warnings);

        assert_eq!(headers.len(), 2);
        assert_eq!((headers[0].node_start, headers[0].node_count, headers[0].flags), (0, 2, 2));
        assert_eq!((headers[1].node_start, headers[1].node_count), (2, 1));
        assert_eq!(nodes.len(), 3);
        assert_eq!(warnings, vec![CodecWarning::EmptyPathSkipped { path_id: 2 }]);
    }

    #[test]
    fn test_assemble_from_slots() {
        let paths = vec![
            Path { id: 4, unk: 0, looped: false, flags: 0, nodes: vec![node(9)] },
            Path { id: 1, unk: 2, looped: true, flags: 0, nodes: vec![node(1), node(2), node(3)] },
        ];
        let mut warnings = Vec::new();
        let (headers, nodes) = flatten_paths(&paths, &mut warnings);
        let header_bytes = encode_slot(&headers);
        let node_bytes = encode_slot(nodes);

        let headers = decode_slot::<PathHeader>(&header_bytes, true, &mut warnings).unwrap();
        let nodes = decode_slot::<PathNode>(&node_bytes, true, &mut warnings).unwrap();
        assert_eq!(assemble_paths(headers, &nodes), paths);
    }

    #[test]
    fn test_other_flag_bits_survive() {
        let header = PathHeader { id: 1, unk: 0, node_start: 0, node_count: 1, flags: 0x8003 };
        let paths = assemble_paths(vec![header.clone()], &[node(1)]);
        assert!(paths[0].looped);
        assert_eq!(paths[0].flags, 0x8001);

        let mut warnings = Vec::new();
        let (headers, _) = flatten_paths(&paths, &mut warnings);
        assert_eq!(headers, vec![header]);
    }

    #[test]
    fn test_out_of_range_run_is_clamped() {
        let header = PathHeader { id: 1, unk: 0, node_start: 1, node_count: 5, flags: 0 };
        let paths = assemble_paths(vec![header], &[node(1), node(2)]);
        assert_eq!(paths[0].nodes, vec![node(2)]);
    }

    #[test]
    fn test_removing_last_node_empties_path() {
        let mut path =
            Path { id: 1, unk: 0, looped: false, flags: 0, nodes: vec![node(1), node(2)] };
        assert!(path.remove_node(0));
        assert!(!path.remove_node(0));
    }
}
