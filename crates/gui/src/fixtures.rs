//! Factory functions for creating test data.

use shared::{Drawing, Hole, KadEntity, KadGeometry, KadVertex, Surface};

use crate::geometry;

/// Typical bench geometry used across tests: 6.2 m bench, 1.2 m subdrill
pub fn bench_hole(pattern: &str, id: &str, collar: [f64; 3]) -> Hole {
    geometry::solve_hole(pattern, id, collar, 0.0, 0.0, 6.2, 1.2, 115.0)
}

/// An inclined hole with a non-trivial bearing
pub fn inclined_hole(pattern: &str, id: &str, collar: [f64; 3]) -> Hole {
    geometry::solve_hole(pattern, id, collar, 15.0, 120.0, 6.2, 1.2, 115.0)
}

/// A polyline KAD entity with `n` vertices stepping east
pub fn long_line_entity(name: &str, n: u64) -> KadEntity {
    KadEntity::new(
        name,
        KadGeometry::Line {
            vertices: (0..n)
                .map(|i| KadVertex::new(i, [451_000.0 + i as f64 * 0.05, 6_780_000.0, 250.0]))
                .collect(),
        },
    )
}

/// A single-triangle surface near the default working area
pub fn triangle_surface(name: &str) -> Surface {
    Surface {
        name: name.into(),
        vertices: vec![
            [451_000.0, 6_780_000.0, 250.0],
            [451_050.0, 6_780_000.0, 251.0],
            [451_000.0, 6_780_050.0, 252.0],
        ],
        indices: vec![0, 1, 2],
        color: [110, 130, 90],
    }
}

/// A small mixed drawing: two holes, one annotation line, one surface
pub fn sample_drawing() -> Drawing {
    let mut drawing = Drawing::default();
    drawing
        .holes
        .push(bench_hole("blast_1", "1", [451_200.0, 6_780_450.0, 276.2]));
    drawing
        .holes
        .push(inclined_hole("blast_1", "2", [451_205.0, 6_780_450.0, 276.2]));
    let line = long_line_entity("crest", 10);
    drawing.kad.insert(line.name.clone(), line);
    let surface = triangle_surface("topo");
    drawing.surfaces.insert(surface.name.clone(), surface);
    drawing
}
