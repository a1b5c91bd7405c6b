//! CPU-side geometry building for holes, KAD entities and surfaces.
//!
//! All builders take the local coordinate frame and emit small-magnitude
//! f32 buffers; world f64 coordinates never reach a GPU buffer directly.

use glam::Vec3;
use shared::{Hole, KadGeometry, Surface};

use super::frame::LocalFrame;

/// Segments used to tessellate KAD circles
pub const CIRCLE_SEGMENTS: usize = 64;

/// Half-size of point/anchor cross markers, metres
const MARKER_HALF_SIZE: f32 = 0.5;

/// Interleaved triangle mesh: [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z, r, g, b]
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// 9 floats per vertex: position(3) + normal(3) + color(3)
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 9
    }
}

/// Interleaved line list: [pos.x, pos.y, pos.z, r, g, b, a]
#[derive(Clone, Debug, Default)]
pub struct LineMeshData {
    /// 7 floats per vertex: position(3) + color(4)
    pub vertices: Vec<f32>,
}

impl LineMeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 7
    }

    fn push(&mut self, p: [f32; 3], color: [f32; 4]) {
        self.vertices
            .extend_from_slice(&[p[0], p[1], p[2], color[0], color[1], color[2], color[3]]);
    }

    fn segment(&mut self, a: [f32; 3], b: [f32; 3], color: [f32; 4]) {
        self.push(a, color);
        self.push(b, color);
    }
}

/// Collar/grade/toe track of one hole as colored line segments:
/// collar→grade in `color`, grade→toe dimmed, plus a collar cross.
pub fn hole_track_lines(hole: &Hole, frame: &LocalFrame, color: [f32; 4]) -> LineMeshData {
    let collar = frame.to_local_f32(hole.collar);
    let grade = frame.to_local_f32(hole.grade);
    let toe = frame.to_local_f32(hole.toe);

    let subdrill_color = [color[0] * 0.55, color[1] * 0.55, color[2] * 0.55, color[3]];

    let mut lines = LineMeshData::default();
    lines.segment(collar, grade, color);
    lines.segment(grade, toe, subdrill_color);
    for seg in cross_marker(collar, MARKER_HALF_SIZE) {
        lines.segment(seg[0], seg[1], color);
    }
    lines
}

/// Polyline point runs for a KAD entity, in local coordinates.
///
/// Exhaustive over the closed geometry set; text glyphs are painted by
/// the plan renderer, only the anchor marker is geometry.
pub fn kad_polylines(geometry: &KadGeometry, frame: &LocalFrame) -> Vec<Vec<[f32; 3]>> {
    match geometry {
        KadGeometry::Point { vertex } => cross_marker(frame.to_local_f32(vertex.position), MARKER_HALF_SIZE)
            .into_iter()
            .map(|seg| seg.to_vec())
            .collect(),
        KadGeometry::Line { vertices } => {
            vec![vertices.iter().map(|v| frame.to_local_f32(v.position)).collect()]
        }
        KadGeometry::Polygon { vertices } => {
            let mut points: Vec<[f32; 3]> =
                vertices.iter().map(|v| frame.to_local_f32(v.position)).collect();
            if points.len() > 2 {
                points.push(points[0]);
            }
            vec![points]
        }
        KadGeometry::Circle { center, radius } => {
            let c = frame.to_local_f32(center.position);
            let mut points = Vec::with_capacity(CIRCLE_SEGMENTS + 1);
            for i in 0..=CIRCLE_SEGMENTS {
                let a = i as f32 * std::f32::consts::TAU / CIRCLE_SEGMENTS as f32;
                points.push([
                    c[0] + *radius as f32 * a.cos(),
                    c[1] + *radius as f32 * a.sin(),
                    c[2],
                ]);
            }
            vec![points]
        }
        KadGeometry::Text { anchor, .. } => {
            cross_marker(frame.to_local_f32(anchor.position), MARKER_HALF_SIZE)
                .into_iter()
                .map(|seg| seg.to_vec())
                .collect()
        }
    }
}

/// Expand a polyline point run into GL_LINES position pairs (3 floats per vertex)
pub fn polyline_positions(points: &[[f32; 3]]) -> Vec<f32> {
    let mut out = Vec::with_capacity(points.len().saturating_sub(1) * 6);
    for pair in points.windows(2) {
        out.extend_from_slice(&pair[0]);
        out.extend_from_slice(&pair[1]);
    }
    out
}

/// Flat-shaded triangle mesh for a surface, local frame
pub fn surface_mesh(surface: &Surface, frame: &LocalFrame) -> MeshData {
    let color = [
        surface.color[0] as f32 / 255.0,
        surface.color[1] as f32 / 255.0,
        surface.color[2] as f32 / 255.0,
    ];
    let local: Vec<[f32; 3]> = surface
        .vertices
        .iter()
        .map(|v| frame.to_local_f32(*v))
        .collect();

    let mut mesh = MeshData::default();
    for tri in surface.indices.chunks_exact(3) {
        let (a, b, c) = (
            local[tri[0] as usize],
            local[tri[1] as usize],
            local[tri[2] as usize],
        );
        let va = Vec3::from_array(a);
        let n = (Vec3::from_array(b) - va)
            .cross(Vec3::from_array(c) - va)
            .normalize_or_zero();
        let base = mesh.vertex_count() as u32;
        for p in [a, b, c] {
            mesh.vertices
                .extend_from_slice(&[p[0], p[1], p[2], n.x, n.y, n.z, color[0], color[1], color[2]]);
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    mesh
}

/// Two crossing segments centred on `p`, in the horizontal plane
fn cross_marker(p: [f32; 3], half: f32) -> [[[f32; 3]; 2]; 2] {
    [
        [[p[0] - half, p[1], p[2]], [p[0] + half, p[1], p[2]]],
        [[p[0], p[1] - half, p[2]], [p[0], p[1] + half, p[2]]],
    ]
}
