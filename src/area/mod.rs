//! One course area: the aggregate that load and save operate on.
//!
//! # Files
//!
//! An area is spread over several named blobs:
//!   course{N}.bin           block table + 15 slots (see [`Slot`])
//!   course{N}_bgdatL{L}.bin object placements of layer L (absent when empty)
//!   course{N}_xref.bin      compacted tileset table, only when saved with
//!                           separate tilesets and shared objects are in use
//!
//! # Save order
//!
//! 1. renumber zone bounding/background references to the zone's index
//! 2. drop sprites typed as the end-of-list marker
//! 3. stamp entrances and sprites with their zone, group sprites by zone
//! 4. compact tileset indices across all layers, dropping unwritable objects
//! 5. encode every slot and lay out the block table

pub mod xref;
pub mod zone_assign;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::codec::block_table::{self, BlockTable, Slot, SLOT_COUNT};
use crate::codec::records::path::{assemble_paths, flatten_paths, PathHeader};
use crate::codec::records::sprite::{loaded_sprites, END_OF_LIST};
use crate::codec::records::tileset::{self, TILESET_SLOTS};
use crate::codec::records::zone::NO_BACKGROUND;
use crate::codec::records::{decode_slot, encode_slot};
use crate::codec::{
    AreaOptions, Background, Entrance, Location, Metadata, Path, PathNode, RawPlacement, Sprite,
    ZoneBounds, ZoneRecord,
};
use crate::error::{push_warning, CodecWarning, Result};
use crate::library::{EmptyLibrary, ObjectLibrary};

pub use xref::{CompactedLayout, TilesetRef, XrefEntry, XrefTable};
pub use zone_assign::{assign_zone, sort_by_zone, ZoneRect};

/// Sprite and entrance coordinates are this many units per tile.
pub const SUBTILES_PER_TILE: i64 = 16;

/// Metadata keys under this prefix hold the compacted tileset table.
pub const XREF_PREFIX: &str = "xref:";

pub const LAYER_COUNT: usize = 3;

pub fn course_file_name(area: u8) -> String {
    format!("course{area}.bin")
}

pub fn layer_file_name(area: u8, layer: usize) -> String {
    format!("course{area}_bgdatL{layer}.bin")
}

pub fn xref_file_name(area: u8) -> String {
    format!("course{area}_xref.bin")
}

/// Codec knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Zero bytes reserved between the block header and the first slot.
    pub extra_prefix_bytes: usize,
    /// Tileset slot (1..=3) whose table receives shared-library objects.
    pub shared_slot: u8,
    /// Reject off-stride slots instead of truncating them.
    pub strict_strides: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            extra_prefix_bytes: 0,
            shared_slot: 1,
            strict_strides: true,
        }
    }
}

/// An object placed on one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectPlacement {
    pub tileset: TilesetRef,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub contents: u8,
    /// Stacking order inside the layer. Not stored; rebuilt from file order.
    pub z: usize,
}

impl ObjectPlacement {
    fn from_raw(raw: &RawPlacement, tileset: TilesetRef, z: usize) -> Self {
        Self {
            tileset,
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
            contents: raw.contents,
            z,
        }
    }

    fn to_raw(&self, selector: u8, index: u16) -> RawPlacement {
        RawPlacement {
            selector,
            index,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            contents: self.contents,
        }
    }
}

/// A zone together with the records it references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub record: ZoneRecord,
    pub bounds: ZoneBounds,
    pub background_a: Option<Background>,
    pub background_b: Option<Background>,
}

impl Zone {
    /// Rectangle in sub-tile units, tagged with the zone's sequence index.
    pub fn rect(&self, index: u8) -> ZoneRect {
        ZoneRect {
            id: index,
            x: i64::from(self.record.x) * SUBTILES_PER_TILE,
            y: i64::from(self.record.y) * SUBTILES_PER_TILE,
            width: i64::from(self.record.width) * SUBTILES_PER_TILE,
            height: i64::from(self.record.height) * SUBTILES_PER_TILE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Area {
    /// 1-based area number.
    pub index: u8,
    pub tilesets: [String; TILESET_SLOTS],
    pub options: AreaOptions,
    pub zones: Vec<Zone>,
    pub entrances: Vec<Entrance>,
    pub sprites: Vec<Sprite>,
    pub locations: Vec<Location>,
    pub paths: Vec<Path>,
    pub layers: [Vec<ObjectPlacement>; LAYER_COUNT],
    pub metadata: Metadata,
    /// Slot 3, carried verbatim.
    pub reserved: Vec<u8>,
    /// Slot 11, carried verbatim.
    pub camera_profiles: Vec<u8>,
}

/// Result of a load: the area plus everything that had to be patched up.
#[derive(Debug, Clone)]
pub struct LoadedArea {
    pub area: Area,
    pub warnings: Vec<CodecWarning>,
}

/// Result of a save: the course blob and the side files that go with it.
#[derive(Debug, Clone)]
pub struct SavedArea {
    pub course: Vec<u8>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub warnings: Vec<CodecWarning>,
}

impl Area {
    pub fn new(index: u8) -> Self {
        Self { index, ..Default::default() }
    }

    /// Decode a course blob on its own (no layer or side files).
    pub fn load(course: &[u8], area_index: u8) -> Result<LoadedArea> {
        let config = CodecConfig::default();
        Self::load_with_files(course, &BTreeMap::new(), area_index, &EmptyLibrary, &config)
    }

    /// Decode a course blob plus whatever side files `files` holds for this
    /// area, keyed by the names [`Area::save`] produces.
    pub fn load_with_files(
        course: &[u8],
        files: &BTreeMap<String, Vec<u8>>,
        area_index: u8,
        library: &dyn ObjectLibrary,
        config: &CodecConfig,
    ) -> Result<LoadedArea> {
        let table = BlockTable::parse(course)?;
        let strict = config.strict_strides;
        let mut warnings = Vec::new();

        let names = decode_slot(table.slot(Slot::Tilesets), strict, &mut warnings)?;
        let tilesets = tileset::names_from_records(names);
        let options = match table.slot(Slot::Options) {
            [] => AreaOptions::default(),
            data => AreaOptions::from_slot(data)?,
        };

        let boundings: Vec<ZoneBounds> =
            decode_slot(table.slot(Slot::Boundings), strict, &mut warnings)?;
        let backgrounds_a: Vec<Background> =
            decode_slot(table.slot(Slot::BackgroundA), strict, &mut warnings)?;
        let backgrounds_b: Vec<Background> =
            decode_slot(table.slot(Slot::BackgroundB), strict, &mut warnings)?;
        let zone_records: Vec<ZoneRecord> =
            decode_slot(table.slot(Slot::Zones), strict, &mut warnings)?;
        let zones = zone_records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let backgrounds = (backgrounds_a.as_slice(), backgrounds_b.as_slice());
                resolve_zone(i, record, &boundings, backgrounds, &mut warnings)
            })
            .collect();

        let entrances = decode_slot(table.slot(Slot::Entrances), strict, &mut warnings)?;
        let sprites = decode_slot(table.slot(Slot::Sprites), strict, &mut warnings)?;
        let locations = decode_slot(table.slot(Slot::Locations), strict, &mut warnings)?;

        let headers: Vec<PathHeader> = decode_slot(table.slot(Slot::Paths), strict, &mut warnings)?;
        let nodes: Vec<PathNode> = decode_slot(table.slot(Slot::PathNodes), strict, &mut warnings)?;
        let paths = assemble_paths(headers, &nodes);

        let mut metadata = Metadata::decode(table.slot(Slot::Metadata)).unwrap_or_else(|e| {
            push_warning(&mut warnings, CodecWarning::MetadataDiscarded(e));
            Metadata::new()
        });
        let mut xref_md = metadata.split_prefixed(XREF_PREFIX);
        if let Some(data) = files.get(&xref_file_name(area_index)) {
            match Metadata::decode(data) {
                Ok(md) => xref_md.merge_prefixed("", &md),
                Err(e) => push_warning(&mut warnings, CodecWarning::MetadataDiscarded(e)),
            }
        }
        let xref = XrefTable::from_metadata(&xref_md).unwrap_or_else(|e| {
            push_warning(&mut warnings, CodecWarning::MetadataDiscarded(e));
            XrefTable::default()
        });

        let mut layers: [Vec<ObjectPlacement>; LAYER_COUNT] = Default::default();
        for (layer, placements) in layers.iter_mut().enumerate() {
            let Some(data) = files.get(&layer_file_name(area_index, layer)) else {
                continue;
            };
            let raws: Vec<RawPlacement> = decode_slot(data, strict, &mut warnings)?;
            *placements = raws
                .iter()
                .enumerate()
                .map(|(z, raw)| {
                    let tileset =
                        xref.resolve(raw.selector, raw.index, layer, library, &mut warnings);
                    ObjectPlacement::from_raw(raw, tileset, z)
                })
                .collect();
        }

        let area = Area {
            index: area_index,
            tilesets,
            options,
            zones,
            entrances,
            sprites,
            locations,
            paths,
            layers,
            metadata,
            reserved: table.slot(Slot::Reserved).to_vec(),
            camera_profiles: table.slot(Slot::CameraProfiles).to_vec(),
        };
        debug!(
            area = area_index,
            zones = area.zones.len(),
            entrances = area.entrances.len(),
            sprites = area.sprites.len(),
            objects = area.layers.iter().map(Vec::len).sum::<usize>(),
            warnings = warnings.len(),
            "loaded area"
        );
        Ok(LoadedArea { area, warnings })
    }

    /// Zone rectangles in sub-tile units, ids being sequence indices.
    pub fn zone_rects(&self) -> Vec<ZoneRect> {
        self.zones
            .iter()
            .enumerate()
            .map(|(i, zone)| zone.rect(i as u8))
            .collect()
    }

    /// Recompute every entrance's and sprite's zone from its position and
    /// group sprites into per-zone runs. With no zones everything gets 0.
    pub fn stamp_zones(&mut self) {
        let rects = self.zone_rects();
        for entrance in &mut self.entrances {
            entrance.zone = assign_zone(&rects, entrance.x.into(), entrance.y.into()).unwrap_or(0);
        }
        for sprite in &mut self.sprites {
            sprite.zone = assign_zone(&rects, sprite.x.into(), sprite.y.into()).unwrap_or(0);
        }
        sort_by_zone(&mut self.sprites, |s| Some(s.zone));
    }

    /// A sprite typed 0xFFFF would read back as the end of the list.
    fn drop_sentinel_sprites(&mut self, warnings: &mut Vec<CodecWarning>) {
        let mut position = 0;
        self.sprites.retain(|sprite| {
            let keep = sprite.kind != END_OF_LIST;
            if !keep {
                push_warning(warnings, CodecWarning::SentinelSpriteSkipped { position });
            }
            position += 1;
            keep
        });
    }

    fn renumber_zone_refs(&mut self) {
        for (i, zone) in self.zones.iter_mut().enumerate() {
            let r = i as u8;
            zone.record.bounding_id = r;
            zone.bounds.id = u16::from(r);
            zone.record.background_a_id = match &mut zone.background_a {
                Some(bg) => {
                    bg.id = u16::from(r);
                    r
                }
                None => NO_BACKGROUND,
            };
            zone.record.background_b_id = match &mut zone.background_b {
                Some(bg) => {
                    bg.id = u16::from(r);
                    r
                }
                None => NO_BACKGROUND,
            };
        }
    }

    /// Encode the area. Derived fields (zone stamps, sprite order, zone
    /// references, stacking order) are refreshed in place first, and records
    /// that cannot be written are removed with a warning, so the area
    /// compares equal to what loading the output gives back.
    pub fn save(
        &mut self,
        separate_tilesets: bool,
        library: &dyn ObjectLibrary,
        config: &CodecConfig,
    ) -> SavedArea {
        let mut warnings = Vec::new();
        let mut files = BTreeMap::new();

        self.renumber_zone_refs();
        self.drop_sentinel_sprites(&mut warnings);
        self.stamp_zones();

        let layout =
            CompactedLayout::build(&self.layers, config.shared_slot, library, &mut warnings);
        for (layer, placements) in self.layers.iter_mut().enumerate() {
            placements.sort_by_key(|p| p.z);
            let mut raws = Vec::with_capacity(placements.len());
            placements.retain(|placement| match layout.locate(&placement.tileset) {
                Ok((selector, index)) => {
                    raws.push(placement.to_raw(selector, index));
                    true
                }
                Err(warning) => {
                    push_warning(&mut warnings, warning);
                    false
                }
            });
            for (z, placement) in placements.iter_mut().enumerate() {
                placement.z = z;
            }
            if !raws.is_empty() {
                files.insert(layer_file_name(self.index, layer), encode_slot(&raws));
            }
        }

        let mut metadata = self.metadata.clone();
        if !layout.table.is_empty() {
            let xref_md = layout.table.to_metadata();
            if separate_tilesets {
                files.insert(xref_file_name(self.index), xref_md.encode());
            } else {
                metadata.merge_prefixed(XREF_PREFIX, &xref_md);
            }
        }

        let (headers, nodes) = flatten_paths(&self.paths, &mut warnings);

        let mut slots: [Vec<u8>; SLOT_COUNT] = Default::default();
        slots[Slot::Tilesets.index()] = encode_slot(&tileset::records_from_names(&self.tilesets));
        slots[Slot::Options.index()] = encode_slot([&self.options]);
        slots[Slot::Boundings.index()] = encode_slot(self.zones.iter().map(|z| &z.bounds));
        slots[Slot::Reserved.index()] = self.reserved.clone();
        slots[Slot::BackgroundA.index()] =
            encode_slot(self.zones.iter().filter_map(|z| z.background_a.as_ref()));
        slots[Slot::BackgroundB.index()] =
            encode_slot(self.zones.iter().filter_map(|z| z.background_b.as_ref()));
        slots[Slot::Entrances.index()] = encode_slot(&self.entrances);
        slots[Slot::Sprites.index()] = encode_slot(&self.sprites);
        slots[Slot::LoadedSprites.index()] = encode_slot(&loaded_sprites(&self.sprites));
        slots[Slot::Zones.index()] = encode_slot(self.zones.iter().map(|z| &z.record));
        slots[Slot::Locations.index()] = encode_slot(&self.locations);
        slots[Slot::CameraProfiles.index()] = self.camera_profiles.clone();
        slots[Slot::Paths.index()] = encode_slot(&headers);
        slots[Slot::PathNodes.index()] = encode_slot(nodes);
        if !metadata.is_empty() {
            slots[Slot::Metadata.index()] = metadata.encode();
        }

        let course = block_table::encode(&slots, config.extra_prefix_bytes);
        debug!(
            area = self.index,
            course = course.len(),
            files = files.len(),
            warnings = warnings.len(),
            "saved area"
        );
        SavedArea { course, files, warnings }
    }
}

fn resolve_zone(
    index: usize,
    record: ZoneRecord,
    boundings: &[ZoneBounds],
    (backgrounds_a, backgrounds_b): (&[Background], &[Background]),
    warnings: &mut Vec<CodecWarning>,
) -> Zone {
    let bounds = match boundings.iter().find(|b| b.id == u16::from(record.bounding_id)) {
        Some(b) => b.clone(),
        None => {
            let bounding_id = record.bounding_id;
            push_warning(warnings, CodecWarning::MissingBounding { zone: index, bounding_id });
            ZoneBounds::default()
        }
    };
    let background_a = find_background(index, 'A', record.background_a_id, backgrounds_a, warnings);
    let background_b = find_background(index, 'B', record.background_b_id, backgrounds_b, warnings);
    Zone { record, bounds, background_a, background_b }
}

fn find_background(
    zone: usize,
    layer: char,
    id: u8,
    backgrounds: &[Background],
    warnings: &mut Vec<CodecWarning>,
) -> Option<Background> {
    if id == NO_BACKGROUND {
        return None;
    }
    let found = backgrounds.iter().find(|bg| bg.id == u16::from(id)).cloned();
    if found.is_none() {
        push_warning(warnings, CodecWarning::MissingBackground { zone, layer, background_id: id });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EntranceSettings;
    use crate::library::MemoryLibrary;
    use proptest::prelude::*;

    fn zone(x: u16, y: u16, width: u16, height: u16) -> Zone {
        Zone {
            record: ZoneRecord { x, y, width, height, music: 3, ..Default::default() },
            bounds: ZoneBounds { upper: -64, lower: 64, ..Default::default() },
            background_a: Some(Background { name: "bg_sky".into(), ..Default::default() }),
            background_b: None,
        }
    }

    fn placed(tileset: TilesetRef, x: i16) -> ObjectPlacement {
        ObjectPlacement { tileset, x, y: 4, width: 2, height: 1, contents: 0, z: 0 }
    }

    fn sample_area() -> Area {
        let mut area = Area::new(1);
        area.tilesets = ["Pa0_jyotyu".into(), "Pa1_nohara".into(), String::new(), String::new()];
        area.options.time_limit = 300;
        area.options.set_wrap_edges(true);
        area.zones = vec![zone(0, 0, 10, 10), zone(20, 0, 10, 10)];
        area.entrances = vec![Entrance {
            x: 16,
            y: 32,
            id: 0,
            settings: EntranceSettings::NOT_ENTERABLE,
            ..Default::default()
        }];
        area.sprites = vec![
            Sprite { kind: 20, x: 21 * 16, y: 16, ..Default::default() },
            Sprite { kind: 3, x: 16, y: 16, ..Default::default() },
        ];
        area.locations = vec![Location { x: 1, y: 2, width: 3, height: 4, id: 1 }];
        area.paths = vec![Path {
            id: 1,
            unk: 0,
            looped: true,
            flags: 0x0100,
            nodes: vec![PathNode { x: 0, y: 0, speed: 1.5, accel: 0.25, delay: 0 }; 2],
        }];
        area.layers[1] = vec![
            placed(TilesetRef::Primary(7), 0),
            placed(TilesetRef::Embedded { slot: 1, index: 3 }, 2),
        ];
        area.metadata.set_str_data("Author", "someone");
        area.camera_profiles = vec![0xAB; 20];
        area
    }

    fn reload(saved: &SavedArea, index: u8, library: &dyn ObjectLibrary) -> LoadedArea {
        Area::load_with_files(&saved.course, &saved.files, index, library, &CodecConfig::default())
            .unwrap()
    }

    #[test]
    fn test_new_area_round_trip() {
        let mut area = Area::new(2);
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert!(saved.files.is_empty());
        assert!(saved.warnings.is_empty());

        let loaded = Area::load(&saved.course, 2).unwrap();
        assert_eq!(loaded.area, area);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut area = sample_area();
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert!(saved.warnings.is_empty());
        assert_eq!(saved.files.keys().collect::<Vec<_>>(), vec!["course1_bgdatL1.bin"]);

        let loaded = reload(&saved, 1, &EmptyLibrary);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.area, area);
        assert!(loaded.area.options.wrap_edges());
        assert!(!loaded.area.entrances[0].is_enterable());
    }

    #[test]
    fn test_save_is_stable() {
        let mut area = sample_area();
        let first = area.save(false, &EmptyLibrary, &CodecConfig::default());
        let second = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert_eq!(first.course, second.course);
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn test_save_stamps_zones_and_groups_sprites() {
        let mut area = sample_area();
        area.save(false, &EmptyLibrary, &CodecConfig::default());

        assert_eq!(area.entrances[0].zone, 0);
        // the zone-1 sprite was listed first; grouping moves it behind zone 0
        let order: Vec<_> = area.sprites.iter().map(|s| (s.kind, s.zone)).collect();
        assert_eq!(order, vec![(3, 0), (20, 1)]);
    }

    #[test]
    fn test_save_renumbers_zone_refs() {
        let mut area = sample_area();
        area.zones[1].record.bounding_id = 9;
        area.zones[1].bounds.id = 9;
        area.zones[1].background_a.as_mut().unwrap().id = 40;
        area.save(false, &EmptyLibrary, &CodecConfig::default());

        let second = &area.zones[1];
        assert_eq!(second.record.bounding_id, 1);
        assert_eq!(second.bounds.id, 1);
        assert_eq!(second.record.background_a_id, 1);
        assert_eq!(second.record.background_b_id, NO_BACKGROUND);
    }

    #[test]
    fn test_stamp_zones_without_zones() {
        let mut area = sample_area();
        area.zones.clear();
        area.sprites[0].zone = 5;
        area.stamp_zones();
        assert!(area.sprites.iter().all(|s| s.zone == 0));
        assert_eq!(area.entrances[0].zone, 0);
    }

    #[test]
    fn test_layer_z_follows_file_order() {
        let mut area = sample_area();
        area.layers[1][0].z = 9;
        area.layers[1][1].z = 4;
        area.save(false, &EmptyLibrary, &CodecConfig::default());

        assert_eq!(area.layers[1][0].tileset, TilesetRef::Embedded { slot: 1, index: 3 });
        assert_eq!(area.layers[1].iter().map(|p| p.z).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_shared_objects_in_metadata() {
        let library: MemoryLibrary = [("rock", vec![1u8, 2, 3])].into_iter().collect();
        let mut area = sample_area();
        area.layers[0] = vec![placed(TilesetRef::Shared("rock".into()), 1)];

        let saved = area.save(false, &library, &CodecConfig::default());
        assert!(!saved.files.contains_key(&xref_file_name(1)));

        let loaded = reload(&saved, 1, &library);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.area, area);
        assert!(!loaded.area.metadata.keys().any(|k| k.starts_with(XREF_PREFIX)));
    }

    #[test]
    fn test_shared_objects_in_separate_file() {
        let library: MemoryLibrary = [("rock", vec![1u8])].into_iter().collect();
        let mut area = sample_area();
        area.layers[2] = vec![placed(TilesetRef::Shared("rock".into()), 1)];

        let saved = area.save(true, &library, &CodecConfig::default());
        assert!(saved.files.contains_key(&xref_file_name(1)));

        let loaded = reload(&saved, 1, &library);
        assert_eq!(loaded.area, area);
    }

    #[test]
    fn test_shared_object_unknown_to_library() {
        let mut area = sample_area();
        area.layers[0] = vec![placed(TilesetRef::Shared("ghost".into()), 1)];
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert_eq!(
            saved.warnings,
            vec![CodecWarning::MissingSharedObject { layer: 0, key: "ghost".into() }]
        );

        let loaded = reload(&saved, 1, &EmptyLibrary);
        assert_eq!(loaded.area.layers[0][0].tileset, TilesetRef::Shared("ghost".into()));
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn test_missing_xref_entry() {
        let mut table = XrefTable::default();
        table.insert(2, vec![XrefEntry::Embedded(0)]);
        let mut area = Area::new(1);
        area.metadata.merge_prefixed(XREF_PREFIX, &table.to_metadata());
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());

        let raw = RawPlacement { selector: 2, index: 5, width: 1, height: 1, ..Default::default() };
        let mut files = BTreeMap::new();
        files.insert(layer_file_name(1, 0), encode_slot([&raw]));

        let loaded =
            Area::load_with_files(&saved.course, &files, 1, &EmptyLibrary, &CodecConfig::default())
                .unwrap();
        assert_eq!(loaded.area.layers[0][0].tileset, TilesetRef::Embedded { slot: 2, index: 0 });
        assert_eq!(
            loaded.warnings,
            vec![CodecWarning::MissingXref { layer: 0, selector: 2, index: 5 }]
        );
    }

    #[test]
    fn test_missing_bounding_uses_default() {
        let record = ZoneRecord {
            bounding_id: 7,
            background_a_id: NO_BACKGROUND,
            background_b_id: NO_BACKGROUND,
            ..Default::default()
        };
        let mut slots: [Vec<u8>; SLOT_COUNT] = Default::default();
        slots[Slot::Zones.index()] = encode_slot([&record]);
        let course = block_table::encode(&slots, 0);

        let loaded = Area::load(&course, 1).unwrap();
        assert_eq!(loaded.area.zones[0].bounds, ZoneBounds::default());
        assert_eq!(
            loaded.warnings,
            vec![CodecWarning::MissingBounding { zone: 0, bounding_id: 7 }]
        );
    }

    #[test]
    fn test_missing_background() {
        let mut slots: [Vec<u8>; SLOT_COUNT] = Default::default();
        let record =
            ZoneRecord { background_a_id: 3, background_b_id: NO_BACKGROUND, ..Default::default() };
        slots[Slot::Boundings.index()] = encode_slot([&ZoneBounds::default()]);
        slots[Slot::Zones.index()] = encode_slot([&record]);
        let course = block_table::encode(&slots, 0);

        let loaded = Area::load(&course, 1).unwrap();
        assert_eq!(loaded.area.zones[0].background_a, None);
        assert_eq!(
            loaded.warnings,
            vec![CodecWarning::MissingBackground { zone: 0, layer: 'A', background_id: 3 }]
        );
    }

    #[test]
    fn test_unreadable_metadata_is_discarded() {
        let mut slots: [Vec<u8>; SLOT_COUNT] = Default::default();
        slots[Slot::Metadata.index()] = vec![0, 0, 0, 9, b'a'];
        let course = block_table::encode(&slots, 0);

        let loaded = Area::load(&course, 1).unwrap();
        assert!(loaded.area.metadata.is_empty());
        assert_eq!(
            loaded.warnings,
            vec![CodecWarning::MetadataDiscarded(crate::error::MetadataError::LegacyUnreadable)]
        );
    }

    #[test]
    fn test_extra_prefix_bytes() {
        let config = CodecConfig { extra_prefix_bytes: 8, ..Default::default() };
        let mut area = sample_area();
        let saved = area.save(false, &EmptyLibrary, &config);
        let table = BlockTable::parse(&saved.course).unwrap();
        assert_eq!(table.entries[0].offset, (block_table::HEADER_SIZE + 8) as u32);

        let loaded = reload(&saved, 1, &EmptyLibrary);
        assert_eq!(loaded.area, area);
    }

    #[test]
    fn test_empty_path_dropped_on_save() {
        let mut area = sample_area();
        area.paths.push(Path { id: 2, ..Default::default() });
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert_eq!(saved.warnings, vec![CodecWarning::EmptyPathSkipped { path_id: 2 }]);

        let loaded = reload(&saved, 1, &EmptyLibrary);
        assert_eq!(loaded.area.paths.len(), 1);
    }

    #[test]
    fn test_missing_xref_placeholder_survives_resave() {
        let mut table = XrefTable::default();
        table.insert(1, vec![XrefEntry::Embedded(0)]);
        let mut area = Area::new(1);
        area.metadata.merge_prefixed(XREF_PREFIX, &table.to_metadata());
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());

        let raw = RawPlacement { selector: 1, index: 9, width: 1, height: 1, ..Default::default() };
        let mut files = BTreeMap::new();
        files.insert(layer_file_name(1, 0), encode_slot([&raw]));
        let library: MemoryLibrary = [("rock", vec![1u8])].into_iter().collect();
        let config = CodecConfig::default();
        let mut loaded =
            Area::load_with_files(&saved.course, &files, 1, &library, &config).unwrap().area;
        loaded.metadata = Metadata::new();
        loaded.layers[0].push(placed(TilesetRef::Shared("rock".into()), 3));

        let resaved = loaded.save(false, &library, &config);
        assert!(resaved.warnings.is_empty());
        let reloaded = reload(&resaved, 1, &library);
        assert_eq!(reloaded.area, loaded);
        assert_eq!(reloaded.area.layers[0][0].tileset, TilesetRef::Embedded { slot: 1, index: 0 });
    }

    #[test]
    fn test_end_of_list_sprite_is_skipped() {
        let mut area = Area::new(1);
        area.sprites = vec![
            Sprite { kind: END_OF_LIST, ..Default::default() },
            Sprite { kind: 5, ..Default::default() },
            Sprite { kind: 6, ..Default::default() },
        ];
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert_eq!(saved.warnings, vec![CodecWarning::SentinelSpriteSkipped { position: 0 }]);
        assert_eq!(area.sprites.len(), 2);

        let loaded = reload(&saved, 1, &EmptyLibrary);
        assert_eq!(loaded.area.sprites.iter().map(|s| s.kind).collect::<Vec<_>>(), vec![5, 6]);
        assert_eq!(loaded.area, area);
    }

    #[test]
    fn test_placement_in_unknown_slot_is_skipped() {
        let mut area = Area::new(1);
        area.layers[0] = vec![
            placed(TilesetRef::Embedded { slot: 15, index: 0xFFF }, 0),
            placed(TilesetRef::Primary(1), 1),
        ];
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert_eq!(
            saved.warnings,
            vec![CodecWarning::InvalidTilesetSlot { slot: 15, index: 0xFFF }]
        );

        let loaded = reload(&saved, 1, &EmptyLibrary);
        assert_eq!(loaded.area.layers[0].len(), 1);
        assert_eq!(loaded.area.layers[0][0].tileset, TilesetRef::Primary(1));
        assert_eq!(loaded.area, area);
    }

    #[test]
    fn test_index_overflow_drops_placement() {
        let mut area = Area::new(1);
        area.layers[0] = vec![
            placed(TilesetRef::Primary(0x1000), 0),
            placed(TilesetRef::Primary(1), 1),
        ];
        let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
        assert_eq!(
            saved.warnings,
            vec![CodecWarning::CompactedIndexOverflow { slot: 0, index: 0x1000 }]
        );

        let loaded = reload(&saved, 1, &EmptyLibrary);
        assert_eq!(loaded.area.layers[0].len(), 1);
    }

    fn arb_tileset_ref() -> impl Strategy<Value = TilesetRef> {
        prop_oneof![
            (0u16..0x1000).prop_map(TilesetRef::Primary),
            (1u8..4, 0u16..0x1000).prop_map(|(slot, index)| TilesetRef::Embedded { slot, index }),
        ]
    }

    fn arb_placement() -> impl Strategy<Value = ObjectPlacement> {
        let fields = (any::<i16>(), any::<i16>(), any::<u16>(), any::<u16>(), any::<u8>());
        (arb_tileset_ref(), fields).prop_map(|(tileset, (x, y, width, height, contents))| {
            ObjectPlacement { tileset, x, y, width, height, contents, z: 0 }
        })
    }

    fn arb_area() -> impl Strategy<Value = Area> {
        (
            prop::collection::vec((0u16..100, 0u16..100, 1u16..50, 1u16..50, any::<bool>()), 0..4),
            prop::collection::vec(
                (any::<u16>(), any::<u16>(), any::<u16>(), any::<[u8; 12]>()),
                0..8,
            ),
            prop::collection::vec((any::<u16>(), any::<u16>(), any::<u8>()), 0..4),
            prop::collection::vec(arb_placement(), 0..6),
            prop::collection::vec(arb_placement(), 0..6),
        )
            .prop_map(|(zones, sprites, entrances, layer0, layer2)| {
                let mut area = Area::new(1);
                area.zones = zones
                    .into_iter()
                    .map(|(x, y, w, h, bg)| {
                        let mut z = zone(x, y, w, h);
                        if !bg {
                            z.background_a = None;
                        }
                        z
                    })
                    .collect();
                area.sprites = sprites
                    .into_iter()
                    .map(|(kind, x, y, params)| Sprite {
                        kind: kind % END_OF_LIST,
                        x,
                        y,
                        params,
                        zone: 0,
                    })
                    .collect();
                area.entrances = entrances
                    .into_iter()
                    .map(|(x, y, id)| Entrance { x, y, id, ..Default::default() })
                    .collect();
                area.layers[0] = layer0;
                area.layers[2] = layer2;
                area
            })
    }

    proptest! {
        #[test]
        fn test_round_trip_after_save(mut area in arb_area()) {
            let saved = area.save(false, &EmptyLibrary, &CodecConfig::default());
            let loaded = reload(&saved, 1, &EmptyLibrary);
            prop_assert!(loaded.warnings.is_empty());
            prop_assert_eq!(loaded.area, area);
        }
    }
}
