use std::{
    fs,
    ops::{Range, RangeInclusive},
    path::Path,
};

use byteorder::{BigEndian, ByteOrder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    chunk::{self, ChunkData},
    error::{DecodeError, LoadError, Result},
    nbt::{self, Tag},
    selection::Batch,
};

/// Chunks along one edge of a region.
pub const REGION_WIDTH: i32 = 32;
pub const SLOT_COUNT: usize = (REGION_WIDTH * REGION_WIDTH) as usize;
pub const SECTOR_BYTES: usize = 4096;
/// Location table followed by the timestamp table.
pub const HEADER_BYTES: usize = 2 * SECTOR_BYTES;

/// Absolute chunk coordinates. Written as an `[x, z]` pair on the wire.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> ChunkPos {
        ChunkPos { x, z }
    }

    /// The region holding this chunk.
    pub fn region(self) -> RegionPos {
        RegionPos {
            x: self.x.div_euclid(REGION_WIDTH),
            z: self.z.div_euclid(REGION_WIDTH),
        }
    }

    /// Position inside the region, 0-31 on each axis.
    pub fn local(self) -> (u8, u8) {
        (
            self.x.rem_euclid(REGION_WIDTH) as u8,
            self.z.rem_euclid(REGION_WIDTH) as u8,
        )
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from((x, z): (i32, i32)) -> ChunkPos {
        ChunkPos { x, z }
    }
}

impl From<ChunkPos> for (i32, i32) {
    fn from(pos: ChunkPos) -> (i32, i32) {
        (pos.x, pos.z)
    }
}

/// Region coordinates, as found in `r.<x>.<z>.mca`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn chunk(self, local_x: u8, local_z: u8) -> ChunkPos {
        ChunkPos {
            x: self.x * REGION_WIDTH + local_x as i32,
            z: self.z * REGION_WIDTH + local_z as i32,
        }
    }
}

/// Parses a region file name of the form `r.<int>.<int>.mca`.
pub fn parse_region_file_name(name: &str) -> Option<RegionPos> {
    let coords = name.strip_prefix("r.")?.strip_suffix(".mca")?;
    let (x, z) = coords.split_once('.')?;
    Some(RegionPos {
        x: parse_coord(x)?,
        z: parse_coord(z)?,
    })
}

/// Blocks along one edge of a region.
const REGION_BLOCKS: i32 = REGION_WIDTH * 16;

/// Region coordinates whose every block coordinate fits in an `i32`.
const REGION_COORDS: RangeInclusive<i32> = i32::MIN / REGION_BLOCKS..=i32::MAX / REGION_BLOCKS;

fn parse_coord(s: &str) -> Option<i32> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i32>().ok().filter(|c| REGION_COORDS.contains(c))
}

/// One entry of the location table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChunkSlot {
    pub local_x: u8,
    pub local_z: u8,
    /// First sector of the chunk; 0 when the chunk was never written.
    pub offset: u32,
    pub sectors: u8,
    /// Last modification, seconds since the epoch.
    pub timestamp: u32,
}

impl ChunkSlot {
    pub fn is_present(&self) -> bool {
        self.offset != 0 && self.sectors != 0
    }

    pub fn byte_range(&self) -> Range<usize> {
        let start = self.offset as usize * SECTOR_BYTES;
        start..start + self.sectors as usize * SECTOR_BYTES
    }
}

/// A region file held in memory: 32x32 chunk slots plus the raw bytes.
#[derive(Clone)]
pub struct RegionFile {
    name: String,
    region: RegionPos,
    slots: Vec<ChunkSlot>,
    data: Vec<u8>,
}

impl RegionFile {
    /// Parses the header of a region file. Region coordinates come from the
    /// file name when it follows `r.<x>.<z>.mca` and default to `(0, 0)`.
    pub fn open(name: impl Into<String>, data: Vec<u8>) -> Result<RegionFile> {
        let name = name.into();
        if data.len() < HEADER_BYTES {
            return Err(DecodeError::TooShort { len: data.len() });
        }

        let mut slots = Vec::with_capacity(SLOT_COUNT);
        for index in 0..SLOT_COUNT {
            let location = BigEndian::read_u32(&data[index * 4..]);
            let slot = ChunkSlot {
                local_x: (index % REGION_WIDTH as usize) as u8,
                local_z: (index / REGION_WIDTH as usize) as u8,
                offset: location >> 8,
                sectors: (location & 0xff) as u8,
                timestamp: BigEndian::read_u32(&data[SECTOR_BYTES + index * 4..]),
            };
            if slot.is_present() {
                let range = slot.byte_range();
                if range.start < HEADER_BYTES || range.end > data.len() {
                    return Err(DecodeError::BadSlot {
                        x: slot.local_x,
                        z: slot.local_z,
                        offset: slot.offset,
                        sectors: slot.sectors,
                        len: data.len(),
                    });
                }
            }
            slots.push(slot);
        }

        let region = parse_region_file_name(&name).unwrap_or_default();
        let region_file = RegionFile {
            name,
            region,
            slots,
            data,
        };
        info!(
            name = %region_file.name,
            chunks = region_file.slots.iter().filter(|s| s.is_present()).count(),
            "opened region file"
        );
        Ok(region_file)
    }

    /// Reads a region file from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<RegionFile, LoadError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = fs::read(path).map_err(|source| LoadError::Io {
            name: name.clone(),
            source,
        })?;
        RegionFile::open(name.clone(), data).map_err(|source| LoadError::Decode { name, source })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> RegionPos {
        self.region
    }

    /// All 1024 slots, z-major.
    pub fn slots(&self) -> &[ChunkSlot] {
        &self.slots
    }

    pub fn slot(&self, local_x: u8, local_z: u8) -> &ChunkSlot {
        let index = (local_x as usize % 32) + (local_z as usize % 32) * 32;
        &self.slots[index]
    }

    /// Absolute positions of every chunk present in the file, in slot order.
    pub fn available_chunks(&self) -> Vec<ChunkPos> {
        self.slots
            .iter()
            .filter(|s| s.is_present())
            .map(|s| self.region.chunk(s.local_x, s.local_z))
            .collect()
    }

    /// The bytes a present slot points at.
    pub fn chunk_bytes(&self, slot: &ChunkSlot) -> &[u8] {
        &self.data[slot.byte_range()]
    }

    fn present_slot(&self, pos: ChunkPos) -> Option<&ChunkSlot> {
        if pos.region() != self.region {
            return None;
        }
        let (x, z) = pos.local();
        Some(self.slot(x, z)).filter(|s| s.is_present())
    }

    /// Decompresses and parses one chunk. `None` when the chunk is absent
    /// or lies outside this region.
    pub fn decode_chunk(&self, pos: ChunkPos) -> Result<Option<Tag>> {
        match self.present_slot(pos) {
            Some(slot) => nbt::decode_payload(self.chunk_bytes(slot)).map(Some),
            None => Ok(None),
        }
    }

    /// Decodes and voxelizes one chunk.
    pub fn read_chunk(&self, pos: ChunkPos) -> Result<Option<ChunkData>> {
        match self.decode_chunk(pos)? {
            Some(root) => chunk::voxelize(&root, pos).map(Some),
            None => Ok(None),
        }
    }

    /// Reads the given chunks into one batch. Chunks that are absent or fail
    /// to decode are left out; the others keep their requested order.
    pub fn read_chunks(&self, chunks: &[ChunkPos], parallel: bool) -> Batch {
        let decode = |pos: &ChunkPos| match self.read_chunk(*pos) {
            Ok(Some(chunk)) => Some(chunk),
            Ok(None) => {
                debug!(x = pos.x, z = pos.z, "chunk not present");
                None
            }
            Err(e) => {
                warn!(x = pos.x, z = pos.z, "failed to decode chunk: {}", e);
                None
            }
        };
        let decoded: Vec<ChunkData> = if parallel {
            chunks.par_iter().filter_map(&decode).collect()
        } else {
            chunks.iter().filter_map(&decode).collect()
        };
        Batch::from_chunks(decoded)
    }

    /// Reads every available chunk.
    pub fn load_all(&self, parallel: bool) -> Batch {
        self.read_chunks(&self.available_chunks(), parallel)
    }
}
