#![allow(dead_code)]

use std::io::Write;

use flate2::write::{GzEncoder, ZlibEncoder};
use nbt::{Blob, Value};

pub const SECTOR: usize = 4096;
pub const GZIP: u8 = 1;
pub const ZLIB: u8 = 2;
pub const UNCOMPRESSED: u8 = 3;

pub fn compound(entries: Vec<(&str, Value)>) -> Value {
    Value::Compound(
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

/// Packs palette indices the way 1.16+ writes them: no entry crosses a long.
pub fn pack(indices: &[u16], bits: usize) -> Vec<i64> {
    let per_long = 64 / bits;
    let mut longs = vec![0u64; indices.len().div_ceil(per_long)];
    for (i, &index) in indices.iter().enumerate() {
        longs[i / per_long] |= (index as u64) << ((i % per_long) * bits);
    }
    longs.into_iter().map(|l| l as i64).collect()
}

/// A 1.18+ section. `blocks` holds palette indices in `y * 256 + z * 16 + x`
/// order; `None` leaves the data array out.
pub fn modern_section(y: i8, palette: &[&str], blocks: Option<&[u16]>, biome: &str) -> Value {
    let palette = palette
        .iter()
        .map(|name| compound(vec![("Name", Value::String(name.to_string()))]))
        .collect();
    let mut states = vec![("palette", Value::List(palette))];
    if let Some(blocks) = blocks {
        states.push(("data", Value::LongArray(pack(blocks, 4))));
    }
    compound(vec![
        ("Y", Value::Byte(y)),
        ("block_states", compound(states)),
        (
            "biomes",
            compound(vec![(
                "palette",
                Value::List(vec![Value::String(biome.to_string())]),
            )]),
        ),
    ])
}

/// A pre-flattening section with numeric ids.
pub fn legacy_section(y: i8, ids: Vec<i8>) -> Value {
    compound(vec![("Y", Value::Byte(y)), ("Blocks", Value::ByteArray(ids))])
}

pub fn modern_chunk(sections: Vec<Value>) -> Blob {
    let mut blob = Blob::new();
    blob.insert("DataVersion", Value::Int(3120)).unwrap();
    blob.insert("Status", Value::String("full".to_string())).unwrap();
    blob.insert("sections", Value::List(sections)).unwrap();
    blob
}

pub fn legacy_chunk(sections: Vec<Value>, biomes: Option<Vec<i8>>) -> Blob {
    let mut level = vec![
        ("Status", Value::String("postprocessed".to_string())),
        ("Sections", Value::List(sections)),
    ];
    if let Some(biomes) = biomes {
        level.push(("Biomes", Value::ByteArray(biomes)));
    }
    let mut blob = Blob::new();
    blob.insert("DataVersion", Value::Int(1343)).unwrap();
    blob.insert("Level", compound(level)).unwrap();
    blob
}

/// A chunk with a single block of numeric id `id` at local `x`, `z` and
/// world height `y`.
pub fn single_block_chunk(x: usize, y: i32, z: usize, id: i8) -> Blob {
    let mut ids = vec![0i8; 4096];
    ids[(y.rem_euclid(16) as usize) * 256 + z * 16 + x] = id;
    legacy_chunk(vec![legacy_section(y.div_euclid(16) as i8, ids)], None)
}

/// Serializes `blob` and wraps it in the length and compression prefix of
/// a chunk slot.
pub fn payload(blob: &Blob, scheme: u8) -> Vec<u8> {
    let mut raw = Vec::new();
    blob.to_writer(&mut raw).unwrap();
    let body = match scheme {
        GZIP => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw).unwrap();
            encoder.finish().unwrap()
        }
        ZLIB => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw).unwrap();
            encoder.finish().unwrap()
        }
        _ => raw,
    };
    raw_payload(scheme, &body)
}

pub fn raw_payload(scheme: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 5);
    out.extend_from_slice(&(body.len() as u32 + 1).to_be_bytes());
    out.push(scheme);
    out.extend_from_slice(body);
    out
}

/// Assembles region file bytes from chunk payloads placed in local slots.
#[derive(Default)]
pub struct RegionBuilder {
    chunks: Vec<(u8, u8, Vec<u8>)>,
}

impl RegionBuilder {
    pub fn new() -> RegionBuilder {
        RegionBuilder::default()
    }

    pub fn chunk(mut self, local_x: u8, local_z: u8, payload: Vec<u8>) -> RegionBuilder {
        self.chunks.push((local_x, local_z, payload));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = vec![0u8; 2 * SECTOR];
        for (x, z, payload) in self.chunks {
            let index = x as usize + z as usize * 32;
            let offset = (data.len() / SECTOR) as u32;
            let sectors = payload.len().div_ceil(SECTOR) as u32;
            data[index * 4..index * 4 + 4].copy_from_slice(&(offset << 8 | sectors).to_be_bytes());
            data[SECTOR + index * 4..SECTOR + index * 4 + 4]
                .copy_from_slice(&1_700_000_000u32.to_be_bytes());
            data.extend_from_slice(&payload);
            data.resize((offset + sectors) as usize * SECTOR, 0);
        }
        data
    }
}
