//! Level container archives.
//!
//! A level ships as a zip of named blobs. Area files live under `course/`
//! (`course1.bin`, `course1_bgdatL1.bin`, ...); anything else is carried
//! through untouched. Entries may individually be zlib or zstd compressed.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use anyhow::{bail, Context, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::{debug, trace};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Directory holding the per-area files.
pub const COURSE_DIR: &str = "course/";

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// How a single entry is packed inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Packing {
    #[default]
    Raw,
    Zlib,
    Zstd,
}

/// A zlib stream header: deflate method, 32K window at most, check bits.
fn is_zlib_header(b0: u8, b1: u8) -> bool {
    b0 & 0x0F == 8 && b0 >> 4 <= 7 && (u16::from(b0) << 8 | u16::from(b1)) % 31 == 0
}

/// Inflate zlib or zstd data, detected by its leading bytes. Anything else
/// is returned as is, as is data that only looks like a zlib stream.
pub fn decompress_if_needed(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 {
        return Ok(data.to_vec());
    }

    if is_zlib_header(data[0], data[1]) {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::new();
        match decoder.read_to_end(&mut out) {
            Ok(_) => return Ok(out),
            Err(e) => debug!(error = %e, "zlib-like header but not a zlib stream, keeping raw"),
        }
        return Ok(data.to_vec());
    }

    if data.starts_with(&ZSTD_MAGIC) {
        return zstd::decode_all(data).context("zstd");
    }

    Ok(data.to_vec())
}

pub fn compress(data: &[u8], packing: Packing) -> Result<Vec<u8>> {
    match packing {
        Packing::Raw => Ok(data.to_vec()),
        Packing::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Packing::Zstd => Ok(zstd::encode_all(data, 0)?),
    }
}

/// An in-memory level archive: entry name to decompressed contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelArchive {
    files: BTreeMap<String, Vec<u8>>,
}

impl LevelArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_zip(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data)).context("opening level archive")?;
        let mut files = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut raw = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut raw).with_context(|| format!("reading {name}"))?;
            let contents = decompress_if_needed(&raw).with_context(|| format!("inflating {name}"))?;
            trace!(
                name = name.as_str(),
                stored = raw.len(),
                size = contents.len(),
                "archive entry"
            );
            files.insert(name, contents);
        }
        debug!(entries = files.len(), "opened level archive");
        Ok(Self { files })
    }

    /// Write every entry deflated, in name order.
    pub fn to_zip(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in &self.files {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(contents)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(name.into(), contents);
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.files.remove(name)
    }

    /// Area numbers that have a course file, ascending.
    pub fn areas(&self) -> Vec<u8> {
        self.names()
            .filter_map(|name| {
                name.strip_prefix(COURSE_DIR)?.strip_prefix("course")?.strip_suffix(".bin")
            })
            .filter_map(|n| n.parse().ok())
            .collect()
    }

    /// The course file of an area.
    pub fn course(&self, area: u8) -> Result<&[u8]> {
        let name = format!("{COURSE_DIR}course{area}.bin");
        match self.get(&name) {
            Some(data) => Ok(data),
            None => bail!("archive has no {name}"),
        }
    }

    /// Every file of an area (course, layers, side tables), keyed by bare
    /// file name.
    pub fn area_files(&self, area: u8) -> BTreeMap<String, Vec<u8>> {
        let stem = format!("course{area}");
        self.files
            .iter()
            .filter_map(|(name, contents)| {
                let bare = name.strip_prefix(COURSE_DIR)?;
                let rest = bare.strip_prefix(&stem)?;
                let owned = rest.starts_with('.') || rest.starts_with('_');
                owned.then(|| (bare.to_string(), contents.clone()))
            })
            .collect()
    }

    /// Replace every file of an area with `files` (bare names).
    pub fn set_area_files(&mut self, area: u8, files: BTreeMap<String, Vec<u8>>) {
        let stale: Vec<String> = self.area_files(area).into_keys().collect();
        for name in stale {
            self.files.remove(&format!("{COURSE_DIR}{name}"));
        }
        for (name, contents) in files {
            self.files.insert(format!("{COURSE_DIR}{name}"), contents);
        }
    }
}
