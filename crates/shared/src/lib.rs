use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unique name of an entity (pattern or KAD object) within a drawing
pub type EntityName = String;

/// Separator used in combined hole keys (`entity:::holeID`)
pub const HOLE_KEY_SEPARATOR: &str = ":::";

/// Build the combined key identifying a hole across patterns.
///
/// Two patterns may reuse the same hole ID, so the pair is the only
/// unique key in the working set.
pub fn combined_hole_key(entity_name: &str, hole_id: &str) -> String {
    format!("{entity_name}{HOLE_KEY_SEPARATOR}{hole_id}")
}

/// Reference to a hole by its identity pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HoleRef {
    pub entity_name: EntityName,
    pub hole_id: String,
}

impl HoleRef {
    pub fn new(entity_name: impl Into<String>, hole_id: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            hole_id: hole_id.into(),
        }
    }

    /// Combined `entity:::holeID` key
    pub fn combined(&self) -> String {
        combined_hole_key(&self.entity_name, &self.hole_id)
    }

    /// Parse a combined key back into a reference
    pub fn parse(combined: &str) -> Option<Self> {
        let (entity, id) = combined.split_once(HOLE_KEY_SEPARATOR)?;
        Some(Self::new(entity, id))
    }
}

fn default_diameter() -> f64 {
    115.0
}

/// A single blast hole.
///
/// Grade and toe always lie on the ray defined by (angle, bearing) from
/// the collar; `length = (bench_height + subdrill) / cos(angle)`. The
/// geometry engine is the only code that derives these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    /// Owning pattern name (identity half 1)
    pub entity_name: EntityName,
    /// Hole ID within the pattern (identity half 2)
    pub hole_id: String,
    /// Collar position, world coordinates (x east, y north, z elevation)
    pub collar: [f64; 3],
    /// Grade position (bench floor before subdrill), on the hole ray
    pub grade: [f64; 3],
    /// Toe position (end of hole), on the hole ray
    pub toe: [f64; 3],
    /// Drilling angle in degrees from vertical
    pub angle: f64,
    /// Bearing in degrees clockwise from north
    pub bearing: f64,
    /// Collar-to-toe distance along the hole vector
    pub length: f64,
    /// Extra drilled depth past grade, measured vertically
    pub subdrill: f64,
    /// Vertical collar-to-grade distance
    pub bench_height: f64,
    /// Hole diameter in millimetres
    #[serde(default = "default_diameter")]
    pub diameter: f64,
    /// Combined key of the hole this one times from (self key if orphaned)
    pub from_hole: String,
}

impl Hole {
    /// Identity pair reference
    pub fn reference(&self) -> HoleRef {
        HoleRef::new(self.entity_name.clone(), self.hole_id.clone())
    }

    /// Combined `entity:::holeID` key
    pub fn combined_key(&self) -> String {
        combined_hole_key(&self.entity_name, &self.hole_id)
    }

    /// True when the hole times from itself (start of a timing chain)
    pub fn is_timing_origin(&self) -> bool {
        self.from_hole == self.combined_key()
    }

    /// Point the timing reference back at the hole itself
    pub fn repoint_to_self(&mut self) {
        self.from_hole = self.combined_key();
    }
}

/// Display style for a KAD entity, also the material cache key source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KadStyle {
    /// Line/point colour RGB
    pub color: [u8; 3],
    /// Line width in pixels
    pub line_width: f32,
    /// Opacity 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,
}

impl Default for KadStyle {
    fn default() -> Self {
        Self {
            color: [230, 230, 230],
            line_width: 1.0,
            opacity: 1.0,
        }
    }
}

/// A single addressable vertex of a KAD entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KadVertex {
    /// Per-vertex ID, unique within the owning entity
    pub point_id: u64,
    /// World position
    pub position: [f64; 3],
}

impl KadVertex {
    pub fn new(point_id: u64, position: [f64; 3]) -> Self {
        Self { point_id, position }
    }
}

/// Geometry payload of a KAD entity.
///
/// Closed set: every consumer (mesh builder, plan painter, highlighter)
/// matches exhaustively so adding a variant is a compile-time change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KadGeometry {
    Point {
        vertex: KadVertex,
    },
    Line {
        vertices: Vec<KadVertex>,
    },
    Polygon {
        vertices: Vec<KadVertex>,
    },
    Circle {
        center: KadVertex,
        radius: f64,
    },
    Text {
        anchor: KadVertex,
        text: String,
    },
}

impl KadGeometry {
    /// All addressable vertices in order
    pub fn vertices(&self) -> Vec<&KadVertex> {
        match self {
            KadGeometry::Point { vertex } => vec![vertex],
            KadGeometry::Line { vertices } | KadGeometry::Polygon { vertices } => {
                vertices.iter().collect()
            }
            KadGeometry::Circle { center, .. } => vec![center],
            KadGeometry::Text { anchor, .. } => vec![anchor],
        }
    }

    /// Look up a vertex by point ID
    pub fn vertex(&self, point_id: u64) -> Option<&KadVertex> {
        self.vertices().into_iter().find(|v| v.point_id == point_id)
    }
}

/// A user-drawn annotation entity, identified by name within its drawing map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KadEntity {
    pub name: EntityName,
    #[serde(default)]
    pub style: KadStyle,
    pub geometry: KadGeometry,
}

impl KadEntity {
    pub fn new(name: impl Into<String>, geometry: KadGeometry) -> Self {
        Self {
            name: name.into(),
            style: KadStyle::default(),
            geometry,
        }
    }
}

/// A triangulated surface (e.g. imported topography)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub name: EntityName,
    /// World-space vertex positions
    pub vertices: Vec<[f64; 3]>,
    /// Triangle indices into `vertices`
    pub indices: Vec<u32>,
    /// Base colour RGB
    pub color: [u8; 3],
}

/// The complete working set of a design session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Drawing {
    /// All holes across all patterns
    pub holes: Vec<Hole>,
    /// KAD entities keyed by entity name
    pub kad: BTreeMap<EntityName, KadEntity>,
    /// Surfaces keyed by name
    pub surfaces: BTreeMap<EntityName, Surface>,
}

impl Drawing {
    /// Find a hole by its identity pair
    pub fn hole(&self, entity_name: &str, hole_id: &str) -> Option<&Hole> {
        self.holes
            .iter()
            .find(|h| h.entity_name == entity_name && h.hole_id == hole_id)
    }

    /// Find a hole mutably by its identity pair
    pub fn hole_mut(&mut self, entity_name: &str, hole_id: &str) -> Option<&mut Hole> {
        self.holes
            .iter_mut()
            .find(|h| h.entity_name == entity_name && h.hole_id == hole_id)
    }

    /// Names of all patterns present, in first-seen order
    pub fn pattern_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for hole in &self.holes {
            if !names.contains(&hole.entity_name.as_str()) {
                names.push(&hole.entity_name);
            }
        }
        names
    }

    /// Holes belonging to one pattern
    pub fn pattern_holes<'a>(&'a self, entity_name: &'a str) -> impl Iterator<Item = &'a Hole> + 'a {
        self.holes
            .iter()
            .filter(move |h| h.entity_name == entity_name)
    }

    /// Centroid of all hole collars and KAD vertices (world XY).
    /// None when the drawing is empty.
    pub fn centroid_xy(&self) -> Option<(f64, f64)> {
        let mut sum = (0.0, 0.0);
        let mut n = 0usize;
        for hole in &self.holes {
            sum.0 += hole.collar[0];
            sum.1 += hole.collar[1];
            n += 1;
        }
        for entity in self.kad.values() {
            for v in entity.geometry.vertices() {
                sum.0 += v.position[0];
                sum.1 += v.position[1];
                n += 1;
            }
        }
        if n == 0 {
            None
        } else {
            Some((sum.0 / n as f64, sum.1 / n as f64))
        }
    }
}
