use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    bounds::Aabb,
    chunk::{ChunkData, Voxel},
    region::ChunkPos,
    transport::StreamMessage,
    view::{ViewPlacement, Viewport},
};

/// One unit of chunk data, either read from a region file or delivered by
/// the stream.
///
/// Producers must send `bounds` that enclose `data` and a `block_count` that
/// matches it. Merging trusts both as sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub chunks: Vec<ChunkPos>,
    pub bounds: Aabb,
    pub block_count: u64,
    pub data: Vec<Voxel>,
}

impl Batch {
    /// Folds decoded chunks into a single batch, in iteration order.
    pub fn from_chunks<I: IntoIterator<Item = ChunkData>>(chunks: I) -> Batch {
        let mut batch = Batch::default();
        for chunk in chunks {
            batch.chunks.push(chunk.pos);
            batch.bounds = batch.bounds.union(chunk.bounds);
            batch.block_count += chunk.voxels.len() as u64;
            batch.data.extend(chunk.voxels);
        }
        batch
    }
}

/// What a merge did with a batch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeOutcome {
    Merged,
    /// The batch's first chunk was already selected; nothing changed.
    Duplicate,
    /// The session had already finished; nothing changed.
    Rejected,
}

/// Everything received so far: chunks, their union box, block total and
/// voxels. Only grows until it is replaced by an empty one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    chunks: Vec<ChunkPos>,
    /// Same positions as `chunks`, for the duplicate check.
    seen: HashSet<ChunkPos>,
    bounds: Aabb,
    block_count: u64,
    data: Vec<Voxel>,
}

impl Selection {
    pub fn new() -> Selection {
        Selection::default()
    }

    pub fn chunks(&self) -> &[ChunkPos] {
        &self.chunks
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    pub fn data(&self) -> &[Voxel] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.data.is_empty()
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.seen.contains(&pos)
    }

    /// Adds a batch unless its first chunk is already selected.
    ///
    /// Only the first chunk is checked: a batch whose first chunk is new is
    /// taken whole, one whose first chunk was seen is dropped whole. A batch
    /// without chunks has nothing to check and is always taken.
    pub fn merge(&mut self, batch: Batch) -> MergeOutcome {
        if let Some(first) = batch.chunks.first() {
            if self.seen.contains(first) {
                debug!(x = first.x, z = first.z, "dropping duplicate batch");
                return MergeOutcome::Duplicate;
            }
        }
        self.seen.extend(batch.chunks.iter().copied());
        self.chunks.extend(batch.chunks);
        self.bounds = self.bounds.union(batch.bounds);
        self.block_count += batch.block_count;
        self.data.extend(batch.data);
        MergeOutcome::Merged
    }

    /// By-value form of [`Selection::merge`].
    pub fn merged(mut self, batch: Batch) -> Selection {
        self.merge(batch);
        self
    }

    /// Camera placement for the current bounds; `None` while nothing with
    /// bounds has been merged.
    pub fn placement(&self, viewport: Viewport) -> Option<ViewPlacement> {
        ViewPlacement::from_bounds(&self.bounds, viewport)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            chunk_count: self.chunks.len(),
            block_count: self.block_count,
            bounds: self.bounds,
            distinct_blocks: self
                .data
                .iter()
                .map(|v| &v.block_id)
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

/// Figures shown next to the rendered selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Summary {
    pub chunk_count: usize,
    pub block_count: u64,
    pub bounds: Aabb,
    pub distinct_blocks: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Nothing received since the last reset.
    Idle,
    Receiving,
    /// The stream ended; further batches are rejected until a reset.
    Finalized,
}

/// A streaming session: one selection fed by batches in arrival order.
///
/// Batches must be handed over one at a time; the session is the single
/// writer of its selection.
#[derive(Clone, Debug)]
pub struct Session {
    state: SessionState,
    selection: Selection,
    viewport: Viewport,
    placement: Option<ViewPlacement>,
}

impl Session {
    pub fn new(viewport: Viewport) -> Session {
        Session {
            state: SessionState::Idle,
            selection: Selection::new(),
            viewport,
            placement: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Placement as of the last merge.
    pub fn placement(&self) -> Option<ViewPlacement> {
        self.placement
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.placement = self.selection.placement(viewport);
    }

    pub fn receive(&mut self, batch: Batch) -> MergeOutcome {
        if self.state == SessionState::Finalized {
            debug!("session finished, rejecting batch");
            return MergeOutcome::Rejected;
        }
        self.state = SessionState::Receiving;
        let outcome = self.selection.merge(batch);
        if outcome == MergeOutcome::Merged {
            self.placement = self.selection.placement(self.viewport);
        }
        outcome
    }

    /// Ends the session. The selection stays as it is.
    pub fn finish(&mut self) {
        if self.state != SessionState::Finalized {
            info!(
                chunks = self.selection.chunks.len(),
                blocks = self.selection.block_count,
                "stream finished"
            );
            self.state = SessionState::Finalized;
        }
    }

    /// Drops the selection and returns to `Idle`.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.selection = Selection::new();
        self.placement = None;
    }

    /// Applies one stream message. Returns the merge outcome for batches.
    pub fn handle(&mut self, message: StreamMessage) -> Option<MergeOutcome> {
        match message {
            StreamMessage::Batch(batch) => Some(self.receive(batch)),
            StreamMessage::End => {
                self.finish();
                None
            }
        }
    }
}
