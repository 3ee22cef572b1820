use crate::region::{ChunkPos, RegionFile};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellState {
    /// Never written to the file.
    Absent,
    Available,
    /// Part of the current selection.
    Selected,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MinimapCell {
    pub pos: ChunkPos,
    pub state: CellState,
}

/// One cell per chunk slot of `region`, z-major, marking which chunks exist
/// and which are selected.
pub fn minimap_grid(region: &RegionFile, selected: &[ChunkPos]) -> Vec<MinimapCell> {
    region
        .slots()
        .iter()
        .map(|slot| {
            let pos = region.region().chunk(slot.local_x, slot.local_z);
            let state = if selected.contains(&pos) {
                CellState::Selected
            } else if slot.is_present() {
                CellState::Available
            } else {
                CellState::Absent
            };
            MinimapCell { pos, state }
        })
        .collect()
}

/// Draws the grid as rows of `.` (absent), `o` (available) and `#` (selected).
pub fn to_text(cells: &[MinimapCell]) -> String {
    let mut out = String::with_capacity(cells.len() + cells.len() / 32);
    for row in cells.chunks(32) {
        out.extend(row.iter().map(|cell| match cell.state {
            CellState::Absent => '.',
            CellState::Available => 'o',
            CellState::Selected => '#',
        }));
        out.push('\n');
    }
    out
}
