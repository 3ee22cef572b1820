use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    biome::BiomeId,
    block::{self, Block, BlockId},
    bounds::Aabb,
    error::{DecodeError, Result},
    nbt::{Compound, Tag},
    region::ChunkPos,
};

/// Blocks along one edge of a section.
pub const SECTION_WIDTH: usize = 16;
/// Blocks in one 16x16x16 section.
pub const SECTION_VOLUME: usize = SECTION_WIDTH * SECTION_WIDTH * SECTION_WIDTH;
const NIBBLE_ARRAY_LEN: usize = SECTION_VOLUME / 2;
/// 4x4x4 biome cells per section.
const BIOME_CELLS: usize = 64;
const LEGACY_BIOME_COLUMNS: usize = 256;
const LEGACY_BIOME_CELLS: usize = 1024;

/// One renderable block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voxel {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub block_id: BlockId,
    pub biome_id: BiomeId,
}

/// A 16x16x16 cube of blocks, stored as indices into a palette.
///
/// Local coordinates are `0..16` on every axis; the block index is
/// `y * 256 + z * 16 + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Vertical index; the section covers world `y * 16 .. y * 16 + 16`.
    pub y: i32,
    palette: Vec<BlockId>,
    blocks: Vec<u16>,
    block_light: Option<Vec<i8>>,
    biome_palette: Vec<BiomeId>,
    biomes: Option<Vec<u16>>,
}

impl Section {
    fn index(x: usize, y: usize, z: usize) -> Option<usize> {
        if x < SECTION_WIDTH && y < SECTION_WIDTH && z < SECTION_WIDTH {
            Some(y * SECTION_WIDTH * SECTION_WIDTH + z * SECTION_WIDTH + x)
        } else {
            None
        }
    }

    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Option<&BlockId> {
        let index = Section::index(x, y, z)?;
        Some(&self.palette[self.blocks[index] as usize])
    }

    /// Block light level, when the section stored it.
    pub fn light_at(&self, x: usize, y: usize, z: usize) -> Option<u8> {
        let index = Section::index(x, y, z)?;
        self.block_light.as_deref().map(|light| nibble(light, index))
    }

    pub fn biome_at(&self, x: usize, y: usize, z: usize) -> Option<&BiomeId> {
        let index = Section::index(x, y, z)?;
        self.biome_by_index(index)
    }

    fn biome_by_index(&self, index: usize) -> Option<&BiomeId> {
        self.biomes
            .as_ref()
            .map(|cells| &self.biome_palette[cells[index] as usize])
    }

    /// Distinct block ids present in the section.
    pub fn palette(&self) -> &[BlockId] {
        &self.palette
    }
}

/// The decoded contents of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkData {
    /// Absolute chunk coordinates.
    pub pos: ChunkPos,
    /// Generation state, `full` once the chunk is completely generated.
    pub status: Option<String>,
    /// Valid sections, lowest first.
    pub sections: Vec<Section>,
    /// Every block that contributes to the picture, in section order.
    pub voxels: Vec<Voxel>,
    /// Box around `voxels`; empty when there are none.
    pub bounds: Aabb,
}

impl ChunkData {
    pub fn empty(pos: ChunkPos) -> ChunkData {
        ChunkData {
            pos,
            status: None,
            sections: Vec::new(),
            voxels: Vec::new(),
            bounds: Aabb::EMPTY,
        }
    }

    pub fn block_count(&self) -> usize {
        self.voxels.len()
    }

    /// Returns the section with vertical index `y`.
    pub fn section(&self, y: i32) -> Option<&Section> {
        self.sections.iter().find(|s| s.y == y)
    }

    /// Returns the block at local `x`, `z` (0-15) and world height `y`.
    /// Positions outside any stored section are air.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use anvil_view::region::{ChunkPos, RegionFile};
    /// let region = RegionFile::from_file("r.0.0.mca").unwrap();
    /// let chunk = region.read_chunk(ChunkPos::new(0, 0)).unwrap().unwrap();
    /// let block = chunk.block(5, -12, 11);
    /// println!("{}", block);
    /// ```
    pub fn block(&self, x: usize, y: i32, z: usize) -> BlockId {
        self.section(y.div_euclid(16))
            .and_then(|s| s.block_at(x, y.rem_euclid(16) as usize, z))
            .cloned()
            .unwrap_or(BlockId::AIR)
    }

    /// Returns the biome at local `x`, `z` (0-15) and world height `y`,
    /// or ocean where nothing was stored.
    pub fn biome(&self, x: usize, y: i32, z: usize) -> BiomeId {
        self.section(y.div_euclid(16))
            .and_then(|s| s.biome_at(x, y.rem_euclid(16) as usize, z))
            .cloned()
            .unwrap_or(BiomeId::OCEAN)
    }
}

/// Turns a decoded chunk tree into sections and voxels.
///
/// Sections without a Y index or with unusable block data are skipped. A
/// chunk without any usable section yields an empty `ChunkData`.
pub fn voxelize(root: &Tag, pos: ChunkPos) -> Result<ChunkData> {
    let root = root.as_compound().ok_or(DecodeError::NotCompound)?;
    // Chunks written before 1.18 wrap everything in a `Level` compound.
    let level = root.get("Level").and_then(Tag::as_compound).unwrap_or(root);

    let mut chunk = ChunkData::empty(pos);
    chunk.status = level.get("Status").and_then(Tag::as_str).map(str::to_owned);

    let entries = match find_sections(level) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(x = pos.x, z = pos.z, "{}", e);
            return Ok(chunk);
        }
    };

    let legacy_biomes = LegacyBiomes::read(level);
    for entry in entries {
        match parse_section(entry, legacy_biomes.as_ref()) {
            Ok(section) => chunk.sections.push(section),
            Err(e) => debug!(x = pos.x, z = pos.z, "skipping section: {}", e),
        }
    }
    chunk.sections.sort_by_key(|s| s.y);

    let (base_x, base_z) = (pos.x * 16, pos.z * 16);
    for section in &chunk.sections {
        let visible: Vec<bool> = section.palette.iter().map(block::contributes).collect();
        for (index, &entry) in section.blocks.iter().enumerate() {
            if !visible[entry as usize] {
                continue;
            }
            let x = base_x + (index % SECTION_WIDTH) as i32;
            let z = base_z + (index / SECTION_WIDTH % SECTION_WIDTH) as i32;
            let y = section.y * 16 + (index / (SECTION_WIDTH * SECTION_WIDTH)) as i32;
            chunk.bounds.include(x, y, z);
            chunk.voxels.push(Voxel {
                x,
                y,
                z,
                block_id: section.palette[entry as usize].clone(),
                biome_id: section
                    .biome_by_index(index)
                    .cloned()
                    .unwrap_or(BiomeId::OCEAN),
            });
        }
    }
    Ok(chunk)
}

fn find_sections(level: &Compound) -> Result<&[Tag]> {
    level
        .get("sections")
        .or_else(|| level.get("Sections"))
        .and_then(Tag::as_list)
        .ok_or(DecodeError::MissingSections)
}

/// Chunk level biome arrays used before biomes moved into sections.
enum LegacyBiomes {
    /// One id per column, `z * 16 + x`.
    Columns(Vec<i32>),
    /// 4x4x4 cells stacked from y = 0, `y * 16 + z * 4 + x` in cell units.
    Cells(Vec<i32>),
}

impl LegacyBiomes {
    fn read(level: &Compound) -> Option<LegacyBiomes> {
        match level.get("Biomes")? {
            Tag::ByteArray(ids) if ids.len() == LEGACY_BIOME_COLUMNS => Some(LegacyBiomes::Columns(
                ids.iter().map(|&b| b as u8 as i32).collect(),
            )),
            Tag::IntArray(ids) if ids.len() == LEGACY_BIOME_COLUMNS => {
                Some(LegacyBiomes::Columns(ids.clone()))
            }
            Tag::IntArray(ids) if ids.len() == LEGACY_BIOME_CELLS => {
                Some(LegacyBiomes::Cells(ids.clone()))
            }
            _ => None,
        }
    }

    /// Spreads the chunk level ids over the blocks of section `section_y`.
    fn for_section(&self, section_y: i32) -> (Vec<BiomeId>, Vec<u16>) {
        let mut interner = Interner::default();
        let cells = (0..SECTION_VOLUME)
            .map(|index| {
                let x = index % SECTION_WIDTH;
                let z = index / SECTION_WIDTH % SECTION_WIDTH;
                let id = match self {
                    LegacyBiomes::Columns(ids) => ids[z * SECTION_WIDTH + x],
                    LegacyBiomes::Cells(ids) => {
                        let world_y = section_y * 16 + (index / (SECTION_WIDTH * SECTION_WIDTH)) as i32;
                        let cell_y = (world_y / 4).clamp(0, 63) as usize;
                        ids[cell_y * 16 + (z / 4) * 4 + x / 4]
                    }
                };
                interner.index_of(id)
            })
            .collect();
        let palette = interner.values.into_iter().map(BiomeId::Legacy).collect();
        (palette, cells)
    }
}

/// Assigns palette indices to values in order of first appearance.
struct Interner<T> {
    values: Vec<T>,
    lookup: HashMap<T, u16>,
}

impl<T> Default for Interner<T> {
    fn default() -> Self {
        Interner {
            values: Vec::new(),
            lookup: HashMap::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> Interner<T> {
    fn index_of(&mut self, value: T) -> u16 {
        if let Some(&index) = self.lookup.get(&value) {
            return index;
        }
        let index = self.values.len() as u16;
        self.values.push(value);
        self.lookup.insert(value, index);
        index
    }
}

fn parse_section(entry: &Tag, legacy_biomes: Option<&LegacyBiomes>) -> Result<Section> {
    let malformed = |y: Option<i32>, reason: &'static str| DecodeError::MalformedSection { y, reason };

    let section = entry
        .as_compound()
        .ok_or_else(|| malformed(None, "section is not a compound"))?;
    let y = section
        .get("Y")
        .and_then(Tag::as_i64)
        .ok_or_else(|| malformed(None, "missing Y index"))?;
    // Section indices are stored as a byte; anything wider cannot address a real section.
    let y = i8::try_from(y).map_err(|_| malformed(None, "Y index out of range"))? as i32;

    let (palette, blocks) = read_blocks(section).map_err(|reason| malformed(Some(y), reason))?;

    let block_light = section
        .get("BlockLight")
        .and_then(Tag::as_byte_array)
        .filter(|light| light.len() == NIBBLE_ARRAY_LEN)
        .map(<[i8]>::to_vec);

    let (biome_palette, biomes) = match section.get("biomes").map(read_section_biomes) {
        Some(Ok((palette, cells))) => (palette, Some(cells)),
        Some(Err(reason)) => {
            debug!(y, "ignoring section biomes: {}", reason);
            (Vec::new(), None)
        }
        None => match legacy_biomes {
            Some(legacy) => {
                let (palette, cells) = legacy.for_section(y);
                (palette, Some(cells))
            }
            None => (Vec::new(), None),
        },
    };

    Ok(Section {
        y,
        palette,
        blocks,
        block_light,
        biome_palette,
        biomes,
    })
}

type Paletted<T> = (Vec<T>, Vec<u16>);

fn read_blocks(section: &Compound) -> std::result::Result<Paletted<BlockId>, &'static str> {
    // 1.18 and later
    if let Some(states) = section.get("block_states") {
        let palette = states
            .get("palette")
            .and_then(Tag::as_list)
            .ok_or("block_states without a palette")?;
        let palette = block_palette(palette)?;
        let data = states.get("data").and_then(Tag::as_long_array);
        let blocks = palette_indices(palette.len(), data, SECTION_VOLUME, 4)?;
        return Ok((palette, blocks));
    }
    // 1.13 to 1.17
    if let Some(palette) = section.get("Palette").and_then(Tag::as_list) {
        let palette = block_palette(palette)?;
        let data = section.get("BlockStates").and_then(Tag::as_long_array);
        let blocks = palette_indices(palette.len(), data, SECTION_VOLUME, 4)?;
        return Ok((palette, blocks));
    }
    // Numeric ids from before the flattening.
    if let Some(ids) = section.get("Blocks").and_then(Tag::as_byte_array) {
        if ids.len() != SECTION_VOLUME {
            return Err("Blocks array is not 4096 entries");
        }
        let add = match section.get("Add").and_then(Tag::as_byte_array) {
            Some(add) if add.len() != NIBBLE_ARRAY_LEN => return Err("Add array is not 2048 bytes"),
            other => other,
        };
        let mut interner = Interner::default();
        let blocks = ids
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let high = add.map_or(0, |add| nibble(add, index) as u16);
                interner.index_of(high << 8 | id as u8 as u16)
            })
            .collect();
        let palette = interner.values.into_iter().map(BlockId::Legacy).collect();
        return Ok((palette, blocks));
    }
    Err("no block data")
}

fn block_palette(entries: &[Tag]) -> std::result::Result<Vec<BlockId>, &'static str> {
    entries
        .iter()
        .map(|entry| {
            Block::from_palette(entry)
                .map(|block| BlockId::named(&block.name()))
                .ok_or("palette entry without a name")
        })
        .collect()
}

/// Reads the 1.18+ per-section `biomes` compound, expanded to one palette
/// index per block.
fn read_section_biomes(biomes: &Tag) -> std::result::Result<Paletted<BiomeId>, &'static str> {
    let palette = biomes
        .get("palette")
        .and_then(Tag::as_list)
        .ok_or("biomes without a palette")?
        .iter()
        .map(|name| name.as_str().map(BiomeId::named).ok_or("biome name is not a string"))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let data = biomes.get("data").and_then(Tag::as_long_array);
    let cells = palette_indices(palette.len(), data, BIOME_CELLS, 0)?;
    let blocks = (0..SECTION_VOLUME)
        .map(|index| {
            let x = index % SECTION_WIDTH;
            let z = index / SECTION_WIDTH % SECTION_WIDTH;
            let y = index / (SECTION_WIDTH * SECTION_WIDTH);
            cells[(y / 4) * 16 + (z / 4) * 4 + x / 4]
        })
        .collect();
    Ok((palette, blocks))
}

/// Unpacks `count` palette indices from a packed long array.
///
/// A one entry palette needs no data. Entries use
/// `max(min_bits, bits needed for palette_len - 1)` bits each. Arrays sized
/// for entries packed across long boundaries (written by 1.13 to 1.15) and
/// arrays with padding at the top of every long (1.16 onwards) are both
/// accepted, told apart by their length.
pub fn palette_indices(
    palette_len: usize,
    data: Option<&[i64]>,
    count: usize,
    min_bits: u32,
) -> std::result::Result<Vec<u16>, &'static str> {
    match palette_len {
        0 => return Err("empty palette"),
        1 => return Ok(vec![0; count]),
        len if len > u16::MAX as usize => return Err("palette too large"),
        _ => {}
    }
    let data = data.ok_or("palette without packed data")?;
    let bits = bit_length(palette_len - 1).max(min_bits);
    let mask = (1u64 << bits) - 1;
    let per_long = (64 / bits) as usize;
    let bits = bits as usize;

    let indices: Vec<u16> = if data.len() == count.div_ceil(per_long) {
        (0..count)
            .map(|i| {
                let long = data[i / per_long] as u64;
                ((long >> ((i % per_long) * bits)) & mask) as u16
            })
            .collect()
    } else if data.len() == (count * bits).div_ceil(64) {
        (0..count)
            .map(|i| {
                let start = i * bits;
                let (word, offset) = (start / 64, start % 64);
                let mut value = (data[word] as u64) >> offset;
                if offset + bits > 64 {
                    value |= (data[word + 1] as u64) << (64 - offset);
                }
                (value & mask) as u16
            })
            .collect()
    } else {
        return Err("packed array has the wrong length");
    };

    if indices.iter().any(|&i| i as usize >= palette_len) {
        return Err("palette index out of range");
    }
    Ok(indices)
}

/// Number of bits needed to write `num`.
fn bit_length(num: usize) -> u32 {
    usize::BITS - num.leading_zeros()
}

/// Four bit value `index` of a nibble array, low nibble first.
fn nibble(array: &[i8], index: usize) -> u8 {
    let byte = array[index / 2] as u8;
    if index % 2 == 0 {
        byte & 0x0f
    } else {
        byte >> 4
    }
}
