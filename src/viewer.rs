use tracing::{info, warn};

use crate::{
    chunk::Voxel,
    config::ViewerConfig,
    error::LoadError,
    minimap::{self, MinimapCell},
    region::{self, ChunkPos, RegionFile},
    selection::{Batch, MergeOutcome, Selection, Session},
    transport::StreamMessage,
    view::{self, ViewPlacement, Viewport},
};

/// The loaded region file plus what is currently shown from it.
///
/// A failed load never leaves a half-loaded state behind: the region is
/// dropped and the selection is empty.
pub struct Viewer {
    config: ViewerConfig,
    region: Option<RegionFile>,
    session: Session,
    slice: f64,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Viewer {
        let slice = view::clamp_slice(config.slice);
        Viewer {
            session: Session::new(config.viewport),
            region: None,
            slice,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn region(&self) -> Option<&RegionFile> {
        self.region.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The session that stream batches are fed into.
    pub fn stream(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn selection(&self) -> &Selection {
        self.session.selection()
    }

    /// Accepts a dropped file. Only names shaped like `r.<x>.<z>.mca` are read.
    pub fn drop_file(&mut self, name: &str, bytes: Vec<u8>) -> Result<&RegionFile, LoadError> {
        if region::parse_region_file_name(name).is_none() {
            warn!(name, "rejected dropped file");
            return Err(LoadError::InvalidFileName(name.to_string()));
        }
        self.load(name, bytes)
    }

    /// Replaces the loaded region. The first available chunk is decoded up
    /// front; a file whose header or first chunk is unreadable is refused.
    pub fn load(&mut self, name: &str, bytes: Vec<u8>) -> Result<&RegionFile, LoadError> {
        self.session.reset();
        self.region = None;

        let region = RegionFile::open(name, bytes).map_err(|source| LoadError::Decode {
            name: name.to_string(),
            source,
        })?;
        if let Some(&first) = region.available_chunks().first() {
            region.read_chunk(first).map_err(|source| LoadError::Decode {
                name: name.to_string(),
                source,
            })?;
        }

        info!(name, "loaded region");
        Ok(&*self.region.insert(region))
    }

    /// Shows exactly `chunks`, read from the loaded region. Chunks that
    /// cannot be decoded are left out.
    pub fn select_chunks(&mut self, chunks: &[ChunkPos]) -> MergeOutcome {
        let batch = match &self.region {
            Some(region) => region.read_chunks(chunks, self.config.parallel_decode),
            None => Batch::default(),
        };
        self.session.reset();
        let outcome = self.session.receive(batch);
        self.session.finish();
        outcome
    }

    pub fn select_all(&mut self) -> MergeOutcome {
        let chunks = self
            .region
            .as_ref()
            .map(RegionFile::available_chunks)
            .unwrap_or_default();
        self.select_chunks(&chunks)
    }

    pub fn receive(&mut self, message: StreamMessage) -> Option<MergeOutcome> {
        self.session.handle(message)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.session.set_viewport(viewport);
    }

    pub fn placement(&self) -> Option<ViewPlacement> {
        self.session.placement()
    }

    pub fn slice(&self) -> f64 {
        self.slice
    }

    pub fn set_slice(&mut self, fraction: f64) {
        self.slice = view::clamp_slice(fraction);
    }

    pub fn slice_level(&self) -> Option<i32> {
        view::slice_level(&self.selection().bounds(), self.slice)
    }

    pub fn visible_voxels(&self) -> impl Iterator<Item = &Voxel> {
        view::visible_voxels(self.selection(), self.slice)
    }

    /// Empty until a region is loaded.
    pub fn minimap(&self) -> Vec<MinimapCell> {
        match &self.region {
            Some(region) => minimap::minimap_grid(region, self.selection().chunks()),
            None => Vec::new(),
        }
    }
}

impl Default for Viewer {
    fn default() -> Viewer {
        Viewer::new(ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bounds::Aabb,
        error::DecodeError,
        region::{HEADER_BYTES, SECTOR_BYTES},
        selection::SessionState,
    };

    fn batch_at(x: i32, y: i32, z: i32) -> Batch {
        serde_json::from_value(serde_json::json!({
            "chunks": [[x >> 4, z >> 4]],
            "bounds": {"minX": x, "maxX": x, "minY": y, "maxY": y, "minZ": z, "maxZ": z},
            "blockCount": 1,
            "data": [{"x": x, "y": y, "z": z, "blockId": 1, "biomeId": 0}]
        }))
        .unwrap()
    }

    /// Header only: every slot is absent.
    fn empty_region() -> Vec<u8> {
        vec![0; HEADER_BYTES]
    }

    /// One slot pointing at a sector of garbage.
    fn broken_region() -> Vec<u8> {
        let mut data = vec![0; HEADER_BYTES + SECTOR_BYTES];
        data[0..4].copy_from_slice(&(2u32 << 8 | 1).to_be_bytes());
        data[HEADER_BYTES..HEADER_BYTES + 5].copy_from_slice(&[0, 0, 0, 10, 7]);
        data
    }

    #[test]
    fn bad_names_are_refused_with_a_message() {
        let mut viewer = Viewer::default();
        let err = viewer.drop_file("level.dat", empty_region()).err().unwrap();
        assert_eq!(err.to_string(), "Cannot read level.dat. Please use an mca file.");
        assert!(viewer.region().is_none());
    }

    #[test]
    fn loading_an_empty_region_keeps_it() {
        let mut viewer = Viewer::default();
        let region = viewer.drop_file("r.-1.2.mca", empty_region()).unwrap();
        assert!(region.available_chunks().is_empty());
        assert_eq!(viewer.minimap().len(), 1024);
    }

    #[test]
    fn failed_loads_clear_everything() {
        let mut viewer = Viewer::default();
        viewer.receive(StreamMessage::Batch(batch_at(0, 64, 0)));
        assert!(!viewer.selection().is_empty());

        let err = viewer.drop_file("r.0.0.mca", broken_region()).err().unwrap();
        assert!(matches!(
            err,
            LoadError::Decode {
                source: DecodeError::UnknownCompression(7),
                ..
            }
        ));
        assert!(err.to_string().starts_with("Error loading file: "));
        assert!(viewer.region().is_none());
        assert!(viewer.selection().is_empty());
        assert_eq!(viewer.session().state(), SessionState::Idle);
        assert!(viewer.minimap().is_empty());

        let err = viewer.load("r.0.0.mca", vec![0; 10]).err().unwrap();
        assert!(matches!(err, LoadError::Decode { source: DecodeError::TooShort { .. }, .. }));
    }

    #[test]
    fn selecting_without_a_region_gives_nothing() {
        let mut viewer = Viewer::default();
        assert_eq!(viewer.select_all(), MergeOutcome::Merged);
        assert!(viewer.selection().is_empty());
        assert_eq!(viewer.placement(), None);
        assert_eq!(viewer.slice_level(), None);
    }

    #[test]
    fn stream_batches_drive_the_view() {
        let mut viewer = Viewer::default();
        viewer.receive(StreamMessage::Batch(batch_at(0, 10, 0)));
        viewer.receive(StreamMessage::Batch(batch_at(16, 110, 0)));
        assert_eq!(viewer.receive(StreamMessage::Batch(batch_at(0, 10, 0))), Some(MergeOutcome::Duplicate));
        assert_eq!(viewer.receive(StreamMessage::End), None);
        assert_eq!(viewer.stream().state(), SessionState::Finalized);

        assert_eq!(
            viewer.selection().bounds(),
            Aabb {
                min_x: 0,
                max_x: 16,
                min_y: 10,
                max_y: 110,
                min_z: 0,
                max_z: 0,
            }
        );
        assert_eq!(viewer.slice_level(), Some(110));
        viewer.set_slice(0.5);
        assert_eq!(viewer.slice_level(), Some(60));
        assert_eq!(viewer.visible_voxels().count(), 1);
        viewer.set_slice(-3.0);
        assert_eq!(viewer.slice(), view::MIN_SLICE);
    }

    #[test]
    fn config_seeds_viewport_and_slice() {
        let config = ViewerConfig {
            viewport: Viewport::new(64.0, 64.0),
            slice: 0.25,
            ..ViewerConfig::default()
        };
        let mut viewer = Viewer::new(config);
        assert_eq!(viewer.slice(), 0.25);
        viewer.receive(StreamMessage::Batch(batch_at(0, 0, 0)));
        viewer.receive(StreamMessage::Batch(batch_at(16, 0, 0)));
        assert_eq!(viewer.placement().map(|p| p.zoom), Some(2.0));
    }
}
