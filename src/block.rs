use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::nbt::Tag;

const DEFAULT_NAMESPACE: &str = "minecraft";

/// Identifies the block at one position. Worlds written before the flattening
/// store numeric ids, later ones store namespaced names.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    Legacy(u16),
    Named(Arc<str>),
}

impl BlockId {
    pub const AIR: BlockId = BlockId::Legacy(0);

    pub fn named(name: &str) -> BlockId {
        BlockId::Named(Arc::from(name))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockId::Legacy(id) => write!(f, "{}", id),
            BlockId::Named(name) => f.write_str(name),
        }
    }
}

/// A namespaced block name, split into its two parts.
#[derive(Debug, Eq, PartialEq)]
pub struct Block {
    namespace: String,
    pub id: String,
}

impl Block {
    pub fn name(&self) -> String {
        format!("{}:{}", self.namespace, self.id)
    }

    /// Splits `namespace:id`; a bare id gets the `minecraft` namespace.
    pub fn from_name(name: &str) -> Block {
        match name.split_once(':') {
            Some((namespace, id)) => Block {
                namespace: namespace.to_owned(),
                id: id.to_owned(),
            },
            None => Block {
                namespace: DEFAULT_NAMESPACE.to_owned(),
                id: name.to_owned(),
            },
        }
    }

    /// Reads the `Name` of one block state palette entry.
    pub fn from_palette(tag: &Tag) -> Option<Block> {
        tag.get("Name").and_then(Tag::as_str).map(Block::from_name)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}

/// How much a block blocks the view.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Opacity {
    /// Air and friends. Never turned into a voxel.
    Invisible,
    Translucent,
    Opaque,
}

/// Classifies a block. Unknown blocks are opaque so they still get drawn.
pub fn opacity(block: &BlockId) -> Opacity {
    match block {
        BlockId::Legacy(id) => legacy_opacity(*id),
        BlockId::Named(name) => named_opacity(name),
    }
}

pub fn is_opaque(block: &BlockId) -> bool {
    opacity(block) == Opacity::Opaque
}

/// Whether the block produces a voxel at all.
pub fn contributes(block: &BlockId) -> bool {
    opacity(block) != Opacity::Invisible
}

/// Numeric ids from before the flattening that do not fill their cube.
const LEGACY_TRANSLUCENT: &[u16] = &[
    6, 8, 9, 18, 20, 26, 27, 28, 30, 31, 32, 37, 38, 39, 40, 50, 51, 55, 59, 63, 64, 65, 66,
    68, 69, 70, 71, 72, 75, 76, 77, 78, 79, 81, 83, 85, 90, 92, 93, 94, 95, 96, 101, 102, 104,
    105, 106, 107, 111, 113, 115, 117, 118, 119, 122, 127, 131, 132, 140, 141, 142, 143, 144,
    145, 147, 148, 149, 150, 157, 160, 161, 165, 167, 171, 175, 176, 177, 183, 184, 185, 186,
    187, 188, 189, 190, 191, 192, 193, 194, 195, 196, 197, 198, 207, 212,
];

fn legacy_opacity(id: u16) -> Opacity {
    match id {
        // 166 is the barrier block, 217 the structure void.
        0 | 166 | 217 => Opacity::Invisible,
        id if LEGACY_TRANSLUCENT.binary_search(&id).is_ok() => Opacity::Translucent,
        _ => Opacity::Opaque,
    }
}

const INVISIBLE_NAMES: &[&str] = &["air", "cave_air", "void_air", "structure_void", "light", "barrier"];

const TRANSLUCENT_NAMES: &[&str] = &[
    "water", "ice", "frosted_ice", "grass", "short_grass", "tall_grass", "fern", "large_fern",
    "dead_bush", "dandelion", "poppy", "blue_orchid", "allium", "azure_bluet", "oxeye_daisy",
    "cornflower", "lily_of_the_valley", "wither_rose", "sunflower", "lilac", "rose_bush", "peony",
    "vine", "lily_pad", "sugar_cane", "kelp", "kelp_plant", "seagrass", "tall_seagrass", "cobweb",
    "ladder", "lever", "redstone_wire", "repeater", "comparator", "tripwire", "tripwire_hook",
    "wheat", "carrots", "potatoes", "beetroots", "snow", "iron_bars", "chain", "bamboo",
    "scaffolding", "fire", "soul_fire", "nether_portal", "end_portal", "cake", "flower_pot",
    "cocoa", "brown_mushroom", "red_mushroom", "nether_wart", "pumpkin_stem", "melon_stem",
    "sweet_berry_bush", "slime_block", "honey_block", "torch", "rail", "bubble_column",
];

const TRANSLUCENT_SUFFIXES: &[&str] = &[
    "glass", "_pane", "_leaves", "_sapling", "_torch", "_button", "_pressure_plate", "_carpet",
    "_sign", "_door", "_trapdoor", "_fence", "_fence_gate", "_tulip", "_coral", "_coral_fan",
    "_rail", "_bed", "_banner", "_candle", "_flower_pot", "_roots", "_fungus", "_vines",
];

fn named_opacity(name: &str) -> Opacity {
    let short = name
        .strip_prefix(DEFAULT_NAMESPACE)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(name);
    if INVISIBLE_NAMES.contains(&short) {
        Opacity::Invisible
    } else if TRANSLUCENT_NAMES.contains(&short)
        || TRANSLUCENT_SUFFIXES.iter().any(|suffix| short.ends_with(suffix))
    {
        Opacity::Translucent
    } else {
        Opacity::Opaque
    }
}
