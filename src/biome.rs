use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifies the biome of one block. Older chunks store numeric ids, newer
/// ones namespaced names.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BiomeId {
    Legacy(i32),
    Named(Arc<str>),
}

impl BiomeId {
    /// Used when a chunk carries no biome data at all.
    pub const OCEAN: BiomeId = BiomeId::Legacy(0);

    pub fn named(name: &str) -> BiomeId {
        BiomeId::Named(Arc::from(name))
    }
}

impl fmt::Display for BiomeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BiomeId::Legacy(id) => write!(f, "{}", id),
            BiomeId::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Climate {
    pub temperature: f32,
    pub humidity: f32,
}

impl Climate {
    /// Returned for biomes missing from the table.
    pub const NEUTRAL: Climate = Climate {
        temperature: 0.5,
        humidity: 0.5,
    };
}

struct Row {
    legacy: Option<i32>,
    name: &'static str,
    temperature: f32,
    humidity: f32,
}

const fn row(legacy: i32, name: &'static str, temperature: f32, humidity: f32) -> Row {
    Row {
        legacy: Some(legacy),
        name,
        temperature,
        humidity,
    }
}

const fn named(name: &'static str, temperature: f32, humidity: f32) -> Row {
    Row {
        legacy: None,
        name,
        temperature,
        humidity,
    }
}

const CLIMATES: &[Row] = &[
    row(0, "ocean", 0.5, 0.5),
    row(1, "plains", 0.8, 0.4),
    row(2, "desert", 2.0, 0.0),
    row(3, "windswept_hills", 0.2, 0.3),
    row(4, "forest", 0.7, 0.8),
    row(5, "taiga", 0.25, 0.8),
    row(6, "swamp", 0.8, 0.9),
    row(7, "river", 0.5, 0.5),
    row(8, "nether_wastes", 2.0, 0.0),
    row(9, "the_end", 0.5, 0.5),
    row(10, "frozen_ocean", 0.0, 0.5),
    row(11, "frozen_river", 0.0, 0.5),
    row(12, "snowy_plains", 0.0, 0.5),
    row(13, "snowy_mountains", 0.0, 0.5),
    row(14, "mushroom_fields", 0.9, 1.0),
    row(15, "mushroom_field_shore", 0.9, 1.0),
    row(16, "beach", 0.8, 0.4),
    row(17, "desert_hills", 2.0, 0.0),
    row(18, "wooded_hills", 0.7, 0.8),
    row(19, "taiga_hills", 0.25, 0.8),
    row(20, "mountain_edge", 0.2, 0.3),
    row(21, "jungle", 0.95, 0.9),
    row(22, "jungle_hills", 0.95, 0.9),
    row(23, "sparse_jungle", 0.95, 0.8),
    row(24, "deep_ocean", 0.5, 0.5),
    row(25, "stony_shore", 0.2, 0.3),
    row(26, "snowy_beach", 0.05, 0.3),
    row(27, "birch_forest", 0.6, 0.6),
    row(28, "birch_forest_hills", 0.6, 0.6),
    row(29, "dark_forest", 0.7, 0.8),
    row(30, "snowy_taiga", -0.5, 0.4),
    row(31, "snowy_taiga_hills", -0.5, 0.4),
    row(32, "old_growth_pine_taiga", 0.3, 0.8),
    row(33, "giant_tree_taiga_hills", 0.3, 0.8),
    row(34, "windswept_forest", 0.2, 0.3),
    row(35, "savanna", 1.2, 0.0),
    row(36, "savanna_plateau", 1.0, 0.0),
    row(37, "badlands", 2.0, 0.0),
    row(38, "wooded_badlands", 2.0, 0.0),
    row(39, "badlands_plateau", 2.0, 0.0),
    row(40, "small_end_islands", 0.5, 0.5),
    row(41, "end_midlands", 0.5, 0.5),
    row(42, "end_highlands", 0.5, 0.5),
    row(43, "end_barrens", 0.5, 0.5),
    row(44, "warm_ocean", 0.5, 0.5),
    row(45, "lukewarm_ocean", 0.5, 0.5),
    row(46, "cold_ocean", 0.5, 0.5),
    row(47, "deep_warm_ocean", 0.5, 0.5),
    row(48, "deep_lukewarm_ocean", 0.5, 0.5),
    row(49, "deep_cold_ocean", 0.5, 0.5),
    row(50, "deep_frozen_ocean", 0.5, 0.5),
    row(127, "the_void", 0.5, 0.5),
    row(129, "sunflower_plains", 0.8, 0.4),
    row(130, "desert_lakes", 2.0, 0.0),
    row(131, "windswept_gravelly_hills", 0.2, 0.3),
    row(132, "flower_forest", 0.7, 0.8),
    row(133, "taiga_mountains", 0.25, 0.8),
    row(134, "swamp_hills", 0.8, 0.9),
    row(140, "ice_spikes", 0.0, 0.5),
    row(149, "modified_jungle", 0.95, 0.9),
    row(151, "modified_jungle_edge", 0.95, 0.8),
    row(155, "old_growth_birch_forest", 0.6, 0.6),
    row(156, "tall_birch_hills", 0.6, 0.6),
    row(157, "dark_forest_hills", 0.7, 0.8),
    row(158, "snowy_taiga_mountains", -0.5, 0.4),
    row(160, "old_growth_spruce_taiga", 0.25, 0.8),
    row(161, "giant_spruce_taiga_hills", 0.25, 0.8),
    row(162, "modified_gravelly_mountains", 0.2, 0.3),
    row(163, "windswept_savanna", 1.1, 0.0),
    row(164, "shattered_savanna_plateau", 1.0, 0.0),
    row(165, "eroded_badlands", 2.0, 0.0),
    row(166, "modified_wooded_badlands_plateau", 2.0, 0.0),
    row(167, "modified_badlands_plateau", 2.0, 0.0),
    row(168, "bamboo_jungle", 0.95, 0.9),
    row(169, "bamboo_jungle_hills", 0.95, 0.9),
    row(170, "soul_sand_valley", 2.0, 0.0),
    row(171, "crimson_forest", 2.0, 0.0),
    row(172, "warped_forest", 2.0, 0.0),
    row(173, "basalt_deltas", 2.0, 0.0),
    row(174, "dripstone_caves", 0.8, 0.4),
    row(175, "lush_caves", 0.5, 0.5),
    named("meadow", 0.5, 0.8),
    named("grove", -0.2, 0.8),
    named("snowy_slopes", -0.3, 0.9),
    named("frozen_peaks", -0.7, 0.9),
    named("jagged_peaks", -0.7, 0.9),
    named("stony_peaks", 1.0, 0.3),
    named("deep_dark", 0.8, 0.4),
    named("mangrove_swamp", 0.8, 0.9),
    named("cherry_grove", 0.5, 0.8),
    named("pale_garden", 0.7, 0.8),
];

fn lookup(biome: &BiomeId) -> Option<&'static Row> {
    match biome {
        BiomeId::Legacy(id) => CLIMATES.iter().find(|r| r.legacy == Some(*id)),
        BiomeId::Named(name) => {
            let short = name.strip_prefix("minecraft:").unwrap_or(name);
            CLIMATES.iter().find(|r| r.name == short)
        }
    }
}

/// Temperature and humidity of a biome, falling back to [`Climate::NEUTRAL`].
pub fn climate(biome: &BiomeId) -> Climate {
    lookup(biome)
        .map(|r| Climate {
            temperature: r.temperature,
            humidity: r.humidity,
        })
        .unwrap_or(Climate::NEUTRAL)
}

pub fn temperature(biome: &BiomeId) -> f32 {
    climate(biome).temperature
}

pub fn humidity(biome: &BiomeId) -> f32 {
    climate(biome).humidity
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_keys_are_unique() {
        let ids: Vec<_> = CLIMATES.iter().filter_map(|r| r.legacy).collect();
        assert_eq!(ids.len(), ids.iter().collect::<HashSet<_>>().len());
        assert_eq!(
            CLIMATES.len(),
            CLIMATES.iter().map(|r| r.name).collect::<HashSet<_>>().len()
        );
    }

    #[test]
    fn legacy_and_named_ids_agree() {
        assert_eq!(climate(&BiomeId::Legacy(2)), climate(&BiomeId::named("minecraft:desert")));
        assert_eq!(temperature(&BiomeId::Legacy(2)), 2.0);
        assert_eq!(humidity(&BiomeId::named("swamp")), 0.9);
    }

    #[test]
    fn unknown_biomes_are_neutral() {
        assert_eq!(climate(&BiomeId::Legacy(9999)), Climate::NEUTRAL);
        assert_eq!(temperature(&BiomeId::named("somemod:weird")), 0.5);
        assert_eq!(humidity(&BiomeId::Legacy(-3)), 0.5);
    }
}
