use glam::DVec2;
use thiserror::Error;

/// A ring of planar vertices (x = longitude, y = latitude)
pub type Ring = Vec<DVec2>;

/// One polygon: the first ring is the outer boundary, the rest are holes
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    /// Outer boundary ring, if any
    pub fn exterior(&self) -> Option<&Ring> {
        self.rings.first()
    }

    /// Even-odd containment test over all rings, so holes are excluded
    pub fn contains(&self, p: DVec2) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            if ring_crossings(ring, p) {
                inside = !inside;
            }
        }
        inside
    }
}

/// Boundary geometry of a region
#[derive(Clone, Debug, PartialEq)]
pub enum RegionGeometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl RegionGeometry {
    /// All polygon parts, in order
    pub fn parts(&self) -> &[Polygon] {
        match self {
            RegionGeometry::Polygon(p) => std::slice::from_ref(p),
            RegionGeometry::MultiPolygon(parts) => parts,
        }
    }

    /// Whether a planar point lies inside any part
    pub fn contains(&self, p: DVec2) -> bool {
        self.parts().iter().any(|poly| poly.contains(p))
    }

    /// Bounding box over every vertex of every ring
    pub fn bounds(&self) -> Option<Bounds> {
        self.parts()
            .iter()
            .flat_map(|poly| poly.rings.iter())
            .flat_map(|ring| ring.iter().copied())
            .fold(None, |acc: Option<Bounds>, p| match acc {
                Some(b) => Some(b.include(p)),
                None => Some(Bounds::point(p)),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("degenerate ring: {vertices} distinct vertices, need at least 3")]
    DegenerateRing { vertices: usize },
}

/// Axis-aligned bounding box in data coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn point(p: DVec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn include(self, p: DVec2) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Label anchor for a region: the vertex average of the outer ring.
///
/// This is a cheap stand-in for a centroid and is not area weighted, so it
/// can land outside strongly concave shapes. For a multipolygon only the
/// first part's outer ring is used; later parts are ignored.
pub fn label_anchor(geometry: &RegionGeometry) -> Result<DVec2, GeometryError> {
    let ring = geometry
        .parts()
        .first()
        .and_then(Polygon::exterior)
        .ok_or(GeometryError::DegenerateRing { vertices: 0 })?;
    vertex_average(ring)
}

/// Mean of every coordinate in the ring as given.
/// A repeated closing vertex counts like any other, so closed GeoJSON rings
/// lean slightly toward their first vertex.
pub fn vertex_average(ring: &[DVec2]) -> Result<DVec2, GeometryError> {
    if ring.len() < 3 {
        return Err(GeometryError::DegenerateRing { vertices: ring.len() });
    }
    let sum = ring.iter().fold(DVec2::ZERO, |acc, &p| acc + p);
    Ok(sum / ring.len() as f64)
}

/// Ring without its closing vertex when the last vertex repeats the first
fn open_ring(ring: &[DVec2]) -> &[DVec2] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Ray cast to +x; true when the ray crosses the ring an odd number of times
fn ring_crossings(ring: &[DVec2], p: DVec2) -> bool {
    let ring = open_ring(ring);
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
