//! Render resource management shared by both renderers.
//!
//! The [`RenderSet`] rebuilds CPU-side geometry for every hole, KAD
//! entity and surface whenever the drawing, selection or local frame
//! changes. Device handles are tracked per entity in a [`HandleTable`]
//! with explicit dispose-on-replace; nothing relies on implicit GPU
//! garbage collection. Oversized polylines are chunked before upload,
//! and materials are interned by value so equal styles share one
//! instance.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shared::Drawing;
use thiserror::Error;

use super::frame::LocalFrame;
use super::mesh::{self, LineMeshData, MeshData};

/// Default per-chunk vertex ceiling for line geometry
pub const DEFAULT_CHUNK_CEILING: usize = 15_000;

/// Faults surfaced by the resource layer. Both are recoverable: the
/// host retries the rebuild (cancel) or rebuilds against a fresh
/// device (context loss).
#[derive(Debug, Error, PartialEq)]
pub enum ResourceError {
    #[error("geometry rebuild cancelled")]
    Cancelled,
    #[error("graphics context lost; resources must be rebuilt")]
    ContextLost,
}

/// Cooperative cancellation flag checked between chunks of a rebuild
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Identity of a renderable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Hole, by combined `entity:::holeID` key
    Hole(String),
    /// KAD entity, by entity name
    Kad(String),
    /// Surface, by name
    Surface(String),
}

/// Value-based material cache key. Width and opacity are quantized to
/// 1/100 steps so value-equal styles collide even when constructed
/// independently from float math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialKey {
    color: [u8; 3],
    width_centi: u32,
    opacity_centi: u32,
}

impl MaterialKey {
    pub fn new(color: [u8; 3], width: f32, opacity: f32) -> Self {
        Self {
            color,
            width_centi: (width.max(0.0) * 100.0).round() as u32,
            opacity_centi: (opacity.clamp(0.0, 1.0) * 100.0).round() as u32,
        }
    }
}

/// Shared draw material for styled line geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// RGBA with opacity folded in
    pub color: [f32; 4],
    /// Line width in pixels
    pub width: f32,
}

/// Index into the material table
pub type MaterialId = usize;

/// Interning cache: one `Material` per distinct value key
#[derive(Debug, Default)]
pub struct MaterialCache {
    keys: HashMap<MaterialKey, MaterialId>,
    materials: Vec<Material>,
}

impl MaterialCache {
    pub fn intern(&mut self, color: [u8; 3], width: f32, opacity: f32) -> MaterialId {
        let key = MaterialKey::new(color, width, opacity);
        if let Some(&id) = self.keys.get(&key) {
            return id;
        }
        let id = self.materials.len();
        self.materials.push(Material {
            color: [
                color[0] as f32 / 255.0,
                color[1] as f32 / 255.0,
                color[2] as f32 / 255.0,
                opacity.clamp(0.0, 1.0),
            ],
            width: width.max(0.0),
        });
        self.keys.insert(key, id);
        id
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.materials.clear();
    }
}

/// Split a polyline into contiguous chunks of at most `ceiling` points,
/// consecutive chunks sharing exactly one boundary vertex so the seam
/// stays visually continuous.
pub fn chunk_polyline(points: &[[f32; 3]], ceiling: usize) -> Vec<Vec<[f32; 3]>> {
    assert!(ceiling >= 2, "chunk ceiling must fit at least one segment");
    if points.len() <= ceiling {
        return vec![points.to_vec()];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    while start + 1 < points.len() {
        let end = (start + ceiling).min(points.len());
        chunks.push(points[start..end].to_vec());
        if end == points.len() {
            break;
        }
        // Next chunk re-emits the boundary vertex
        start = end - 1;
    }
    chunks
}

/// CPU geometry ready for upload, one per resource key
#[derive(Debug)]
pub enum EntityGeometry {
    /// Per-vertex-colored line list (hole tracks)
    ColoredLines(LineMeshData),
    /// Uniform-material chunked line positions (KAD entities)
    StyledLines {
        /// GL_LINES position runs, 3 floats per vertex, each run within
        /// the chunk ceiling
        chunks: Vec<Vec<f32>>,
        material: MaterialId,
    },
    /// Triangle mesh (surfaces)
    Mesh(MeshData),
}

/// One tracked resource: geometry plus a revision the device layer
/// compares to know when to dispose-and-reupload
#[derive(Debug)]
pub struct RenderEntry {
    pub geometry: EntityGeometry,
    pub revision: u64,
}

/// Inputs of a full resource rebuild
pub struct RebuildParams<'a> {
    pub drawing: &'a Drawing,
    pub frame: &'a LocalFrame,
    /// Combined keys of selected holes
    pub selected_holes: &'a HashSet<String>,
    /// Name of the selected KAD entity, if any
    pub selected_kad: Option<&'a str>,
    pub hole_color: [f32; 4],
    pub selection_color: [f32; 4],
    pub drawing_version: u64,
    pub selection_version: u64,
}

/// Counters reported after a rebuild
#[derive(Debug, Default, PartialEq)]
pub struct RebuildStats {
    pub entities: usize,
    pub line_chunks: usize,
}

/// The complete CPU-side resource set for one view session
pub struct RenderSet {
    entries: HashMap<ResourceKey, RenderEntry>,
    materials: MaterialCache,
    revision_counter: u64,
    chunk_ceiling: usize,
    drawing_version: u64,
    selection_version: u64,
    frame_generation: u64,
    built_once: bool,
    context_lost: bool,
}

impl RenderSet {
    pub fn new(chunk_ceiling: usize) -> Self {
        Self {
            entries: HashMap::new(),
            materials: MaterialCache::default(),
            revision_counter: 0,
            chunk_ceiling: chunk_ceiling.max(2),
            drawing_version: 0,
            selection_version: 0,
            frame_generation: 0,
            built_once: false,
            context_lost: false,
        }
    }

    /// True when the set already reflects the given versions
    pub fn is_current(
        &self,
        drawing_version: u64,
        selection_version: u64,
        frame_generation: u64,
    ) -> bool {
        self.built_once
            && self.drawing_version == drawing_version
            && self.selection_version == selection_version
            && self.frame_generation == frame_generation
    }

    pub fn entries(&self) -> &HashMap<ResourceKey, RenderEntry> {
        &self.entries
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    pub fn chunk_ceiling(&self) -> usize {
        self.chunk_ceiling
    }

    pub fn set_chunk_ceiling(&mut self, ceiling: usize) {
        let ceiling = ceiling.max(2);
        if self.chunk_ceiling != ceiling {
            self.chunk_ceiling = ceiling;
            self.built_once = false;
        }
    }

    /// The device backing this set is gone. All tracked geometry is
    /// stale; rebuilds fail with a recoverable error until the host
    /// acknowledges the loss.
    pub fn notify_context_lost(&mut self) {
        self.context_lost = true;
        self.built_once = false;
    }

    pub fn context_lost(&self) -> bool {
        self.context_lost
    }

    /// Host acknowledged the loss; the next rebuild regenerates
    /// everything against the fresh device.
    pub fn acknowledge_context_loss(&mut self) {
        self.context_lost = false;
    }

    /// Rebuild every resource from the drawing. Checks `cancel` between
    /// entities and between chunks; a cancelled rebuild leaves the set
    /// marked stale so the next frame retries.
    pub fn rebuild(
        &mut self,
        params: &RebuildParams<'_>,
        cancel: &CancelFlag,
    ) -> Result<RebuildStats, ResourceError> {
        if self.context_lost {
            return Err(ResourceError::ContextLost);
        }
        self.revision_counter += 1;
        let revision = self.revision_counter;
        self.built_once = false;
        self.materials.clear();

        let mut live: HashSet<ResourceKey> = HashSet::new();
        let mut stats = RebuildStats::default();

        for hole in &params.drawing.holes {
            if cancel.is_cancelled() {
                return Err(ResourceError::Cancelled);
            }
            let key = ResourceKey::Hole(hole.combined_key());
            let color = if params.selected_holes.contains(&hole.combined_key()) {
                params.selection_color
            } else {
                params.hole_color
            };
            let lines = mesh::hole_track_lines(hole, params.frame, color);
            self.install(key.clone(), EntityGeometry::ColoredLines(lines), revision);
            live.insert(key);
            stats.entities += 1;
        }

        for entity in params.drawing.kad.values() {
            if cancel.is_cancelled() {
                return Err(ResourceError::Cancelled);
            }
            let selected = params.selected_kad == Some(entity.name.as_str());
            let material = if selected {
                let c = params.selection_color;
                self.materials.intern(
                    [
                        (c[0] * 255.0) as u8,
                        (c[1] * 255.0) as u8,
                        (c[2] * 255.0) as u8,
                    ],
                    entity.style.line_width + 1.0,
                    1.0,
                )
            } else {
                self.materials.intern(
                    entity.style.color,
                    entity.style.line_width,
                    entity.style.opacity,
                )
            };

            let mut chunks = Vec::new();
            for run in mesh::kad_polylines(&entity.geometry, params.frame) {
                for chunk in chunk_polyline(&run, self.chunk_ceiling) {
                    if cancel.is_cancelled() {
                        return Err(ResourceError::Cancelled);
                    }
                    chunks.push(mesh::polyline_positions(&chunk));
                }
            }
            stats.line_chunks += chunks.len();
            let key = ResourceKey::Kad(entity.name.clone());
            self.install(key.clone(), EntityGeometry::StyledLines { chunks, material }, revision);
            live.insert(key);
            stats.entities += 1;
        }

        for surface in params.drawing.surfaces.values() {
            if cancel.is_cancelled() {
                return Err(ResourceError::Cancelled);
            }
            let key = ResourceKey::Surface(surface.name.clone());
            let data = mesh::surface_mesh(surface, params.frame);
            self.install(key.clone(), EntityGeometry::Mesh(data), revision);
            live.insert(key);
            stats.entities += 1;
        }

        // Deleted entities drop out of the set; the device layer
        // disposes their handles on the next sync.
        self.entries.retain(|key, _| live.contains(key));

        self.drawing_version = params.drawing_version;
        self.selection_version = params.selection_version;
        self.frame_generation = params.frame.generation();
        self.built_once = true;
        Ok(stats)
    }

    fn install(&mut self, key: ResourceKey, geometry: EntityGeometry, revision: u64) {
        self.entries.insert(key, RenderEntry { geometry, revision });
    }
}

/// Device-handle table with explicit disposal semantics, generic over
/// the handle type so the lifecycle is testable without a device.
///
/// Returned handles are the caller's to dispose; after a context loss
/// the underlying device objects are already gone, so the table drops
/// its logical references without handing anything back.
pub struct HandleTable<H> {
    handles: HashMap<ResourceKey, (u64, H)>,
    context_lost: bool,
}

impl<H> Default for HandleTable<H> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
            context_lost: false,
        }
    }
}

impl<H> HandleTable<H> {
    /// Does `key` need a fresh upload for `revision`?
    pub fn needs_upload(&self, key: &ResourceKey, revision: u64) -> bool {
        !matches!(self.handles.get(key), Some((r, _)) if *r == revision)
    }

    /// Install a handle, returning the displaced one for disposal
    pub fn install(&mut self, key: ResourceKey, revision: u64, handle: H) -> Option<H> {
        self.handles.insert(key, (revision, handle)).map(|(_, h)| h)
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&H> {
        self.handles.get(key).map(|(_, h)| h)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &H)> {
        self.handles.iter().map(|(k, (_, h))| (k, h))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Remove one entry, returning its handle for disposal
    pub fn remove(&mut self, key: &ResourceKey) -> Option<H> {
        self.handles.remove(key).map(|(_, h)| h)
    }

    /// Drop entries whose key is no longer live, returning their
    /// handles for disposal
    pub fn retain_live(&mut self, live: &HashSet<ResourceKey>) -> Vec<H> {
        let dead: Vec<ResourceKey> = self
            .handles
            .keys()
            .filter(|k| !live.contains(*k))
            .cloned()
            .collect();
        dead.into_iter()
            .filter_map(|k| self.handles.remove(&k).map(|(_, h)| h))
            .collect()
    }

    /// Remove everything, returning handles for disposal (session teardown)
    pub fn drain_all(&mut self) -> Vec<H> {
        self.handles.drain().map(|(_, (_, h))| h).collect()
    }

    /// The device is gone: release all logical references without
    /// returning them — there is nothing left to dispose.
    pub fn notify_context_lost(&mut self) {
        let dropped = self.handles.len();
        self.handles.clear();
        self.context_lost = true;
        tracing::warn!(dropped, "graphics context lost, handles released");
    }

    pub fn context_lost(&self) -> bool {
        self.context_lost
    }

    /// Host acknowledged the loss; uploads may resume on a fresh device
    pub fn reset_after_context_loss(&mut self) {
        self.context_lost = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use shared::{KadEntity, KadGeometry, KadStyle, KadVertex};

    fn frame() -> LocalFrame {
        let mut f = LocalFrame::default();
        f.reset(DVec2::new(451_000.0, 6_780_000.0));
        f
    }

    fn long_polyline(n: usize) -> Vec<[f32; 3]> {
        (0..n).map(|i| [i as f32, (i % 7) as f32, 0.0]).collect()
    }

    #[test]
    fn chunking_respects_ceiling_and_seams() {
        let points = long_polyline(72_000);
        let chunks = chunk_polyline(&points, 15_000);

        assert!(chunks.iter().all(|c| c.len() <= 15_000));
        for pair in chunks.windows(2) {
            // Consecutive chunks share exactly the boundary vertex
            assert_eq!(pair[0].last(), pair[1].first());
        }

        // Concatenating with seam dedup reconstructs the original
        let mut rebuilt: Vec<[f32; 3]> = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend_from_slice(&chunk[1..]);
        }
        assert_eq!(rebuilt, points);
    }

    #[test]
    fn short_polyline_is_one_chunk() {
        let points = long_polyline(100);
        let chunks = chunk_polyline(&points, 15_000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], points);
    }

    #[test]
    fn material_cache_dedups_by_value() {
        let mut cache = MaterialCache::default();
        let a = cache.intern([255, 0, 0], 2.0, 1.0);
        // Constructed independently, same values
        let b = cache.intern([255, 0, 0], 1.0 + 1.0, 0.5 + 0.5);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);

        let c = cache.intern([255, 0, 0], 3.0, 1.0);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);

        // Sub-quantum float noise still hits the same material
        let d = cache.intern([255, 0, 0], 2.0004, 0.9996);
        assert_eq!(a, d);
    }

    fn rebuild_params<'a>(
        drawing: &'a Drawing,
        frame: &'a LocalFrame,
        selected: &'a HashSet<String>,
        versions: (u64, u64),
    ) -> RebuildParams<'a> {
        RebuildParams {
            drawing,
            frame,
            selected_holes: selected,
            selected_kad: None,
            hole_color: [0.9, 0.6, 0.1, 1.0],
            selection_color: [0.0, 0.9, 1.0, 1.0],
            drawing_version: versions.0,
            selection_version: versions.1,
        }
    }

    fn sample_drawing() -> Drawing {
        let mut drawing = Drawing::default();
        drawing.holes.push(crate::geometry::solve_hole(
            "p",
            "1",
            [451_200.0, 6_780_450.0, 276.2],
            0.0,
            0.0,
            6.2,
            1.2,
            115.0,
        ));
        let mut boundary = KadEntity::new(
            "crest",
            KadGeometry::Line {
                vertices: (0..40_000)
                    .map(|i| KadVertex::new(i, [451_000.0 + i as f64 * 0.1, 6_780_000.0, 250.0]))
                    .collect(),
            },
        );
        boundary.style = KadStyle {
            color: [40, 200, 90],
            line_width: 1.5,
            opacity: 1.0,
        };
        drawing.kad.insert(boundary.name.clone(), boundary);
        drawing
    }

    #[test]
    fn rebuild_tracks_every_entity_and_chunks_big_lines() {
        let drawing = sample_drawing();
        let frame = frame();
        let selected = HashSet::new();
        let mut set = RenderSet::new(15_000);

        let stats = set
            .rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 1)), &CancelFlag::default())
            .unwrap();
        assert_eq!(stats.entities, 2);
        // 40_000 points -> 3 chunks
        assert_eq!(stats.line_chunks, 3);
        assert!(set.is_current(1, 1, frame.generation()));
        assert!(!set.is_current(2, 1, frame.generation()));

        // Selected hole picks up the selection color on rebuild
        let mut selected = HashSet::new();
        selected.insert(shared::combined_hole_key("p", "1"));
        set.rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 2)), &CancelFlag::default())
            .unwrap();
        let entry = &set.entries()[&ResourceKey::Hole("p:::1".into())];
        match &entry.geometry {
            EntityGeometry::ColoredLines(lines) => {
                assert_eq!(&lines.vertices[3..7], &[0.0, 0.9, 1.0, 1.0]);
            }
            _ => panic!("hole should build colored lines"),
        }
    }

    #[test]
    fn rebuild_drops_deleted_entities() {
        let mut drawing = sample_drawing();
        let frame = frame();
        let selected = HashSet::new();
        let mut set = RenderSet::new(15_000);
        set.rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 1)), &CancelFlag::default())
            .unwrap();
        assert_eq!(set.entries().len(), 2);

        drawing.kad.clear();
        set.rebuild(&rebuild_params(&drawing, &frame, &selected, (2, 1)), &CancelFlag::default())
            .unwrap();
        assert_eq!(set.entries().len(), 1);
        assert!(set.entries().contains_key(&ResourceKey::Hole("p:::1".into())));
    }

    #[test]
    fn cancelled_rebuild_stays_stale() {
        let drawing = sample_drawing();
        let frame = frame();
        let selected = HashSet::new();
        let mut set = RenderSet::new(15_000);
        let cancel = CancelFlag::default();
        cancel.cancel();

        assert_eq!(
            set.rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 1)), &cancel),
            Err(ResourceError::Cancelled)
        );
        assert!(!set.is_current(1, 1, frame.generation()));

        cancel.clear();
        set.rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 1)), &cancel)
            .unwrap();
        assert!(set.is_current(1, 1, frame.generation()));
    }

    #[test]
    fn context_loss_is_a_recoverable_rebuild_error() {
        let drawing = sample_drawing();
        let frame = frame();
        let selected = HashSet::new();
        let mut set = RenderSet::new(15_000);
        set.rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 1)), &CancelFlag::default())
            .unwrap();

        set.notify_context_lost();
        assert!(!set.is_current(1, 1, frame.generation()));
        assert_eq!(
            set.rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 1)), &CancelFlag::default()),
            Err(ResourceError::ContextLost)
        );

        set.acknowledge_context_loss();
        set.rebuild(&rebuild_params(&drawing, &frame, &selected, (1, 1)), &CancelFlag::default())
            .unwrap();
        assert!(set.is_current(1, 1, frame.generation()));
    }

    #[test]
    fn handle_table_disposes_on_replace_and_remove() {
        let mut table: HandleTable<u32> = HandleTable::default();
        let key = ResourceKey::Hole("p:::1".into());

        assert!(table.needs_upload(&key, 1));
        assert_eq!(table.install(key.clone(), 1, 11), None);
        assert!(!table.needs_upload(&key, 1));
        assert!(table.needs_upload(&key, 2));

        // Replacing hands back the displaced handle for disposal
        assert_eq!(table.install(key.clone(), 2, 22), Some(11));
        assert_eq!(table.remove(&key), Some(22));
        assert!(table.is_empty());
    }

    #[test]
    fn handle_table_retain_live_returns_dead_handles() {
        let mut table: HandleTable<u32> = HandleTable::default();
        table.install(ResourceKey::Hole("a:::1".into()), 1, 1);
        table.install(ResourceKey::Kad("crest".into()), 1, 2);

        let mut live = HashSet::new();
        live.insert(ResourceKey::Hole("a:::1".into()));
        let dead = table.retain_live(&live);
        assert_eq!(dead, vec![2]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn context_loss_releases_without_disposal() {
        let mut table: HandleTable<u32> = HandleTable::default();
        let key = ResourceKey::Surface("topo".into());
        table.install(key.clone(), 1, 77);

        table.notify_context_lost();
        assert!(table.context_lost());
        // The device objects are already gone; nothing is handed back
        assert!(table.drain_all().is_empty());

        // After acknowledgement, uploads resume from scratch
        table.reset_after_context_loss();
        assert!(!table.context_lost());
        assert!(table.needs_upload(&key, 1));
    }
}
