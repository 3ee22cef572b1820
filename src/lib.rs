//! # Overview
//!
//! This crate reads Minecraft region files (.mca) and turns their chunks into
//! flat lists of visible voxels for a viewer. It decodes the region header,
//! the compressed tag tree of each chunk and every section layout from the
//! pre-1.13 id arrays to the 1.18+ palettes, then merges chunks into a single
//! selection with a bounding box and a camera placement. Nothing is written
//! back to disk.
//!
//! # Example:
//!
//! ```rust,no_run
//! use anvil_view::region::{ChunkPos, RegionFile};
//! use anvil_view::selection::Selection;
//! use anvil_view::view::Viewport;
//!
//! fn main() -> Result<(), anvil_view::error::LoadError> {
//!     let region = RegionFile::from_file("r.0.0.mca")?;
//!     let batch = region.read_chunks(&[ChunkPos::new(2, 3)], true);
//!     let selection = Selection::new().merged(batch);
//!
//!     println!("{} blocks", selection.block_count());
//!     if let Some(placement) = selection.placement(Viewport::default()) {
//!         println!("look at {:?}", placement.center);
//!     }
//!     Ok(())
//! }
//! ```

/// Biome ids and the temperature/humidity table used to tint blocks.
pub mod biome;

/// Block ids and the opacity table deciding which blocks become voxels.
pub mod block;

/// Integer axis-aligned bounding boxes with an empty identity element.
pub mod bounds;

/// Turns a decoded chunk tree into sections and voxels. Handles every section layout from the pre-flattening id arrays to the 1.18+ paletted containers.
pub mod chunk;

/// Viewer settings loaded from TOML.
pub mod config;

/// Error types for decoding and loading.
pub mod error;

/// The 32x32 overview of which chunks a region holds.
pub mod minimap;

/// A reader for the compressed tag trees chunks are stored as.
pub mod nbt;

/// A representation of a region file: the slot header plus the raw bytes, with functions to decode single chunks or many at once.
pub mod region;

/// Merges batches of chunk data into one growing selection, and the streaming session around it.
pub mod selection;

/// Messages exchanged with a chunk streaming server.
pub mod transport;

/// Camera placement and slicing of a selection.
pub mod view;

/// Ties a loaded region file to the selection shown from it.
pub mod viewer;
