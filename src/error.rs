use std::io;

use thiserror::Error;

/// Failures while decoding a region file or one of its chunks.
///
/// Every variant except `MalformedSection` is fatal to the file or chunk being
/// decoded. `MalformedSection` only ever drops the section it names.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("region file too short: {len} bytes, header needs 8192")]
    TooShort { len: usize },
    #[error("chunk slot ({x}, {z}) points at sectors {offset}+{sectors}, outside a {len} byte file")]
    BadSlot {
        x: u8,
        z: u8,
        offset: u32,
        sectors: u8,
        len: usize,
    },
    #[error("compression scheme ({0}) was not recognised for chunk")]
    UnknownCompression(u8),
    #[error("corrupt chunk payload: {0}")]
    CorruptPayload(#[source] io::Error),
    #[error("tag tree ended early")]
    TruncatedTree,
    #[error("unknown tag type {0}")]
    UnknownTag(u8),
    #[error("root tag is not a compound")]
    NotCompound,
    #[error("chunk has no sections list")]
    MissingSections,
    #[error("malformed section (y = {y:?}): {reason}")]
    MalformedSection { y: Option<i32>, reason: &'static str },
}

impl DecodeError {
    pub(crate) fn corrupt(msg: &'static str) -> DecodeError {
        DecodeError::CorruptPayload(io::Error::new(io::ErrorKind::InvalidData, msg))
    }
}

/// Failures surfaced to the user when a file is dropped or loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read {0}. Please use an mca file.")]
    InvalidFileName(String),
    #[error("Error loading file: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
    #[error("Reading {name} Error: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
