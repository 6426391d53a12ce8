//! Level persistence and the file-backed change history.
//!
//! A level is saved to `<world>/<name>.vtl`, a gzip stream of:
//!
//! ```text
//! "VTL1" | width u16 | height u16 | length u16 | physics u8
//! | base blocks (width*height*length bytes)
//! | section count u32 | { slot u32 | 4096 low bytes }*
//! ```
//!
//! All integers are little-endian. Saves go to a temp file that is renamed
//! over the old one, so a crash mid-save leaves the previous save intact.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use voxtick_engine::sink::{ChangeHistory, ChangeRecord, HistoryError};
use voxtick_engine::world::chunk::SECTION_VOLUME;
use voxtick_engine::world::{BlockId, VoxelGrid};

use crate::level::Level;

const MAGIC: &[u8; 4] = b"VTL1";
/// Bytes per history record.
pub const RECORD_SIZE: usize = 20;

pub fn level_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.vtl", name))
}

pub fn history_path(dir: &Path, name: &str) -> PathBuf {
    dir.join("history").join(format!("{}.vth", name))
}

// ── Save ─────────────────────────────────────────────────────────────────────

/// Write `level` to `<dir>/<name>.vtl` if it changed since the last save.
/// Returns whether anything was written.
pub fn save_level(level: &mut Level, dir: &Path) -> Result<bool> {
    if !level.is_dirty() {
        return Ok(false);
    }
    let start = Instant::now();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = level_path(dir, &level.name);
    let tmp = path.with_extension("vtl.tmp");

    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let mut out = GzEncoder::new(BufWriter::new(file), Compression::default());
    write_grid(&mut out, level.grid(), level.physics())
        .with_context(|| format!("writing level '{}'", level.name))?;
    out.finish()?.flush()?;
    fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;

    level.flush_history();
    level.mark_saved();
    tracing::info!(
        "Level '{}' saved to {} ({:.2?})",
        level.name,
        path.display(),
        start.elapsed()
    );
    Ok(true)
}

fn write_grid<W: Write>(out: &mut W, grid: &VoxelGrid, physics: u8) -> std::io::Result<()> {
    out.write_all(MAGIC)?;
    out.write_all(&grid.width().to_le_bytes())?;
    out.write_all(&grid.height().to_le_bytes())?;
    out.write_all(&grid.length().to_le_bytes())?;
    out.write_all(&[physics])?;
    out.write_all(grid.raw_blocks())?;

    let sections: Vec<_> = grid.extended_sections().collect();
    out.write_all(&(sections.len() as u32).to_le_bytes())?;
    for (slot, section) in sections {
        out.write_all(&(slot as u32).to_le_bytes())?;
        out.write_all(section.as_bytes())?;
    }
    Ok(())
}

// ── Load ─────────────────────────────────────────────────────────────────────

/// A level file's contents.
pub struct SavedLevel {
    pub grid: VoxelGrid,
    pub physics: u8,
}

/// Read `<dir>/<name>.vtl`. `Ok(None)` when there is no save.
pub fn load_level(dir: &Path, name: &str) -> Result<Option<SavedLevel>> {
    let path = level_path(dir, name);
    if !path.is_file() {
        return Ok(None);
    }
    let start = Instant::now();
    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut input = GzDecoder::new(BufReader::new(file));
    let saved = read_grid(&mut input).with_context(|| format!("reading {}", path.display()))?;
    tracing::info!(
        "Level '{}' loaded: {}x{}x{}, {} extended sections ({:.2?})",
        name,
        saved.grid.width(),
        saved.grid.height(),
        saved.grid.length(),
        saved.grid.extended_section_count(),
        start.elapsed()
    );
    Ok(Some(saved))
}

fn read_u16<R: Read>(input: &mut R) -> std::io::Result<u16> {
    let mut buf = [0u8; 2];
    input.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(input: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_grid<R: Read>(input: &mut R) -> Result<SavedLevel> {
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        bail!("not a level file (magic {:?})", magic);
    }
    let width = read_u16(input)?;
    let height = read_u16(input)?;
    let length = read_u16(input)?;
    let mut physics = [0u8; 1];
    input.read_exact(&mut physics)?;

    let volume = width as u64 * height as u64 * length as u64;
    if volume == 0 || volume > u32::MAX as u64 {
        bail!("bad level dimensions {}x{}x{}", width, height, length);
    }
    let volume = volume as usize;
    // Grows with the data actually present, not with the header's claim.
    let mut blocks = Vec::new();
    (&mut *input).take(volume as u64).read_to_end(&mut blocks)?;
    if blocks.len() != volume {
        bail!("level data truncated: {} of {} blocks", blocks.len(), volume);
    }
    let mut grid = VoxelGrid::from_raw(width, height, length, blocks)?;

    let count = read_u32(input)?;
    for _ in 0..count {
        let slot = read_u32(input)? as usize;
        let mut bytes = Box::new([0u8; SECTION_VOLUME]);
        input.read_exact(&mut bytes[..])?;
        grid.restore_section(slot, bytes);
    }
    Ok(SavedLevel {
        grid,
        physics: physics[0].min(5),
    })
}

// ── Change history ───────────────────────────────────────────────────────────

/// Appends fixed-size records to `<world>/history/<name>.vth`:
/// index u32 | old u16 | new u16 | requester u32 | timestamp u32 | flags u8
/// | 3 zero bytes.
pub struct FileHistory {
    out: Option<BufWriter<File>>,
    path: PathBuf,
}

impl FileHistory {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening history {}", path.display()))?;
        Ok(Self {
            out: Some(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and stop accepting records.
    pub fn close(&mut self) -> Result<(), HistoryError> {
        match self.out.take() {
            Some(mut out) => Ok(out.flush()?),
            None => Ok(()),
        }
    }
}

pub fn encode_record(record: &ChangeRecord) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..4].copy_from_slice(&record.index.to_le_bytes());
    buf[4..6].copy_from_slice(&record.old.0.to_le_bytes());
    buf[6..8].copy_from_slice(&record.new.0.to_le_bytes());
    buf[8..12].copy_from_slice(&record.requester.to_le_bytes());
    buf[12..16].copy_from_slice(&(record.timestamp.min(u32::MAX as u64) as u32).to_le_bytes());
    buf[16] = record.flags;
    buf
}

pub fn decode_record(buf: &[u8; RECORD_SIZE]) -> ChangeRecord {
    let u16_at = |i: usize| u16::from_le_bytes([buf[i], buf[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
    ChangeRecord {
        index: u32_at(0),
        old: BlockId(u16_at(4)),
        new: BlockId(u16_at(6)),
        requester: u32_at(8),
        timestamp: u32_at(12) as u64,
        flags: buf[16],
    }
}

/// Every record in a history file, oldest first.
pub fn read_history(path: &Path) -> Result<Vec<ChangeRecord>> {
    let bytes = fs::read(path).with_context(|| format!("reading history {}", path.display()))?;
    if bytes.len() % RECORD_SIZE != 0 {
        tracing::warn!(
            "History {} has a truncated tail ({} stray bytes)",
            path.display(),
            bytes.len() % RECORD_SIZE
        );
    }
    Ok(bytes
        .chunks_exact(RECORD_SIZE)
        .filter_map(|chunk| <&[u8; RECORD_SIZE]>::try_from(chunk).ok())
        .map(decode_record)
        .collect())
}

impl ChangeHistory for FileHistory {
    fn append(&mut self, record: ChangeRecord) -> Result<(), HistoryError> {
        let out = self.out.as_mut().ok_or(HistoryError::Closed)?;
        out.write_all(&encode_record(&record))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), HistoryError> {
        match self.out.as_mut() {
            Some(out) => Ok(out.flush()?),
            None => Err(HistoryError::Closed),
        }
    }
}

impl Drop for FileHistory {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!("Failed to flush history {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{self, BlockRegistry};
    use crate::change::Requester;
    use crate::level::LevelSettings;
    use std::sync::Arc;
    use voxtick_engine::world::BlockPos;

    #[test]
    fn test_record_encoding_roundtrip() {
        let record = ChangeRecord {
            index: 123_456,
            old: block::STONE,
            new: BlockId(700),
            requester: 42,
            timestamp: 1_700_000_000,
            flags: 3,
        };
        assert_eq!(decode_record(&encode_record(&record)), record);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = std::env::temp_dir().join("voxtick_test_persistence");
        let _ = fs::remove_dir_all(&tmp);

        let grid = VoxelGrid::new(20, 8, 20).unwrap();
        let mut level = Level::new(
            "roundtrip",
            grid,
            Arc::new(BlockRegistry::default_set()),
            LevelSettings::default(),
        );
        level
            .request_change(BlockPos::new(1, 2, 3), block::GOLD, Requester::Command)
            .unwrap();
        level
            .request_change(BlockPos::new(17, 7, 19), BlockId(600), Requester::Command)
            .unwrap();

        assert!(save_level(&mut level, &tmp).unwrap());
        assert!(!level.is_dirty());
        // Nothing changed since: no rewrite.
        assert!(!save_level(&mut level, &tmp).unwrap());

        let saved = load_level(&tmp, "roundtrip").unwrap().expect("level file");
        assert_eq!(saved.physics, 1);
        assert_eq!(saved.grid.get(BlockPos::new(1, 2, 3)), block::GOLD);
        assert_eq!(saved.grid.get(BlockPos::new(17, 7, 19)), BlockId(600));
        assert_eq!(saved.grid.get(BlockPos::new(0, 0, 0)), block::AIR);
        assert_eq!(saved.grid.extended_section_count(), 1);

        assert!(load_level(&tmp, "missing").unwrap().is_none());
        let _ = fs::remove_dir_all(&tmp);
    }

    fn write_raw_level(dir: &Path, name: &str, header: &[u8]) {
        fs::create_dir_all(dir).unwrap();
        let file = File::create(level_path(dir, name)).unwrap();
        let mut out = GzEncoder::new(file, Compression::default());
        out.write_all(header).unwrap();
        out.finish().unwrap();
    }

    #[test]
    fn test_corrupt_headers_are_errors() {
        let tmp = std::env::temp_dir().join("voxtick_test_corrupt");
        let _ = fs::remove_dir_all(&tmp);

        // Claims 65535^3 blocks with nothing behind it.
        let mut huge = MAGIC.to_vec();
        for _ in 0..3 {
            huge.extend_from_slice(&u16::MAX.to_le_bytes());
        }
        huge.push(1);
        write_raw_level(&tmp, "huge", &huge);
        assert!(load_level(&tmp, "huge").is_err());

        let mut empty = MAGIC.to_vec();
        empty.extend_from_slice(&[0, 0, 8, 0, 8, 0, 1]);
        write_raw_level(&tmp, "empty", &empty);
        assert!(load_level(&tmp, "empty").is_err());

        // 4x4x4 header, only ten blocks of data.
        let mut short = MAGIC.to_vec();
        short.extend_from_slice(&[4, 0, 4, 0, 4, 0, 1]);
        short.extend_from_slice(&[1; 10]);
        write_raw_level(&tmp, "short", &short);
        assert!(load_level(&tmp, "short").is_err());

        write_raw_level(&tmp, "alien", b"NOPE");
        assert!(load_level(&tmp, "alien").is_err());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn test_file_history_appends() {
        let tmp = std::env::temp_dir().join("voxtick_test_history");
        let _ = fs::remove_dir_all(&tmp);
        let path = history_path(&tmp, "h");

        {
            let mut history = FileHistory::open(&path).unwrap();
            for i in 0..3 {
                history
                    .append(ChangeRecord {
                        index: i,
                        old: block::AIR,
                        new: block::STONE,
                        requester: 7,
                        timestamp: 10,
                        flags: 0,
                    })
                    .unwrap();
            }
        }
        let records = read_history(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].index, 2);
        assert_eq!(records[0].requester, 7);
        let _ = fs::remove_dir_all(&tmp);
    }
}
