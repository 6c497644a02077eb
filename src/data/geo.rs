use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Property names checked, in order, for a feature's ISO-3166 alpha-3 code
/// when the feature has no top-level `id`.
const CODE_PROPERTIES: [&str; 4] = ["ISO_A3", "iso_a3", "ADM0_A3", "code"];

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Geometry file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a GeoJSON FeatureCollection")]
    NotFeatureCollection,
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// A `[lon, lat]` ring; the closing point may or may not repeat the first.
pub type Ring = Vec<[f64; 2]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
    /// Fill triangles over `exterior`, as indices into it.
    pub triangles: Vec<[u32; 3]>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        let triangles = triangulate(&exterior);
        Self {
            exterior,
            holes,
            triangles,
        }
    }

    /// Even-odd containment test; points inside a hole are outside.
    pub fn contains(&self, point: [f64; 2]) -> bool {
        ring_contains(&self.exterior, point) && !self.holes.iter().any(|h| ring_contains(h, point))
    }
}

fn cross(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Ear-clipping triangulation of a simple ring (either winding).
///
/// Ear tests only scan the reflex vertices still in the ring, so a pass
/// costs O(n·r) for r reflex vertices rather than O(n²).
///
/// Self-intersecting or degenerate rings still produce a fill: once no ear
/// can be found, the remaining vertices are fanned.
pub fn triangulate(ring: &[[f64; 2]]) -> Vec<[u32; 3]> {
    let mut len = ring.len();
    if len > 1 && ring[0] == ring[len - 1] {
        len -= 1;
    }
    if len < 3 {
        return Vec::new();
    }

    let mut idx: Vec<usize> = (0..len).collect();
    let twice_area: f64 = (0..len)
        .map(|i| {
            let [x0, y0] = ring[i];
            let [x1, y1] = ring[(i + 1) % len];
            x0 * y1 - x1 * y0
        })
        .sum();
    if twice_area < 0.0 {
        idx.reverse();
    }

    let mut reflex: Vec<usize> = (0..len)
        .filter(|&pos| is_reflex(ring, &idx, pos))
        .map(|pos| idx[pos])
        .collect();

    let mut triangles = Vec::with_capacity(len - 2);
    let mut i = 0;
    let mut misses = 0;
    while idx.len() > 3 && misses < idx.len() {
        let n = idx.len();
        let (a, b, c) = (idx[(i + n - 1) % n], idx[i], idx[(i + 1) % n]);
        if is_ear(ring, &reflex, a, b, c) {
            triangles.push([a as u32, b as u32, c as u32]);
            idx.remove(i);
            misses = 0;

            // Only the two neighbours of the clipped vertex change angle.
            let n = idx.len();
            i %= n;
            for pos in [(i + n - 1) % n, i] {
                let vertex = idx[pos];
                let listed = reflex.contains(&vertex);
                match (listed, is_reflex(ring, &idx, pos)) {
                    (true, false) => reflex.retain(|&r| r != vertex),
                    (false, true) => reflex.push(vertex),
                    _ => {}
                }
            }
        } else {
            i = (i + 1) % n;
            misses += 1;
        }
    }
    for k in 1..idx.len().saturating_sub(1) {
        triangles.push([idx[0] as u32, idx[k] as u32, idx[k + 1] as u32]);
    }
    triangles
}

/// Whether the vertex at `pos` in the counter-clockwise `idx` is reflex or flat.
fn is_reflex(ring: &[[f64; 2]], idx: &[usize], pos: usize) -> bool {
    let n = idx.len();
    cross(ring[idx[(pos + n - 1) % n]], ring[idx[pos]], ring[idx[(pos + 1) % n]]) <= 0.0
}

/// `a, b, c` is an ear when it turns left and holds none of the reflex vertices.
fn is_ear(ring: &[[f64; 2]], reflex: &[usize], a: usize, b: usize, c: usize) -> bool {
    let (pa, pb, pc) = (ring[a], ring[b], ring[c]);
    if cross(pa, pb, pc) <= 0.0 {
        return false;
    }
    reflex.iter().all(|&p| {
        p == a
            || p == b
            || p == c
            || !(cross(pa, pb, ring[p]) >= 0.0
                && cross(pb, pc, ring[p]) >= 0.0
                && cross(pc, pa, ring[p]) >= 0.0)
    })
}

fn ring_contains(ring: &[[f64; 2]], [x, y]: [f64; 2]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Outline of one country, keyed by its alpha-3 code.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryShape {
    pub code: String,
    pub name: Option<String>,
    pub polygons: Vec<Polygon>,
    /// `(min, max)` corners of the bounding box.
    bbox: ([f64; 2], [f64; 2]),
}

impl CountryShape {
    pub fn new(code: String, name: Option<String>, polygons: Vec<Polygon>) -> Self {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for [x, y] in polygons.iter().flat_map(|p| p.exterior.iter().copied()) {
            min = [min[0].min(x), min[1].min(y)];
            max = [max[0].max(x), max[1].max(y)];
        }
        Self {
            code,
            name,
            polygons,
            bbox: (min, max),
        }
    }

    pub fn contains(&self, point: [f64; 2]) -> bool {
        let (min, max) = self.bbox;
        if point[0] < min[0] || point[0] > max[0] || point[1] < min[1] || point[1] > max[1] {
            return false;
        }
        self.polygons.iter().any(|p| p.contains(point))
    }
}

// ---------------------------------------------------------------------------
// WorldMap
// ---------------------------------------------------------------------------

/// Country outlines used as choropleth geometry.
#[derive(Debug, Clone, Default)]
pub struct WorldMap {
    shapes: Vec<CountryShape>,
}

impl WorldMap {
    pub fn from_shapes(shapes: Vec<CountryShape>) -> Self {
        Self { shapes }
    }

    pub fn shapes(&self) -> &[CountryShape] {
        &self.shapes
    }

    /// The country under a `[lon, lat]` point, if any.
    pub fn shape_at(&self, point: [f64; 2]) -> Option<&CountryShape> {
        self.shapes.iter().find(|s| s.contains(point))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Load a GeoJSON `FeatureCollection` of country outlines.
pub fn load_geojson(path: &Path) -> Result<WorldMap, GeoError> {
    if !path.exists() {
        return Err(GeoError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let map = parse_geojson(&text)?;
    log::info!("Loaded {} country shapes from {}", map.len(), path.display());
    Ok(map)
}

/// Parse GeoJSON text. Polygon and MultiPolygon features are kept; features
/// without a country code or with other geometry types are skipped.
pub fn parse_geojson(text: &str) -> Result<WorldMap, GeoError> {
    let root: JsonValue = serde_json::from_str(text)?;
    if root.get("type").and_then(JsonValue::as_str) != Some("FeatureCollection") {
        return Err(GeoError::NotFeatureCollection);
    }
    let features = root
        .get("features")
        .and_then(JsonValue::as_array)
        .ok_or(GeoError::NotFeatureCollection)?;

    let mut shapes = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let Some(code) = feature_code(feature) else {
            log::debug!("feature {i}: no country code, skipped");
            continue;
        };
        let name = feature
            .pointer("/properties/name")
            .or_else(|| feature.pointer("/properties/ADMIN"))
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let polygons = feature
            .get("geometry")
            .map(geometry_polygons)
            .unwrap_or_default();
        if polygons.is_empty() {
            log::debug!("feature {i} ({code}): no polygon geometry, skipped");
            continue;
        }
        shapes.push(CountryShape::new(code, name, polygons));
    }
    Ok(WorldMap::from_shapes(shapes))
}

fn feature_code(feature: &JsonValue) -> Option<String> {
    let from_id = feature.get("id").and_then(JsonValue::as_str);
    let from_props = || {
        CODE_PROPERTIES.iter().find_map(|key| {
            feature
                .get("properties")?
                .get(*key)?
                .as_str()
        })
    };
    from_id
        .or_else(from_props)
        .filter(|code| !code.is_empty() && *code != "-99")
        .map(str::to_string)
}

fn geometry_polygons(geometry: &JsonValue) -> Vec<Polygon> {
    let coords = geometry.get("coordinates");
    match geometry.get("type").and_then(JsonValue::as_str) {
        Some("Polygon") => coords.and_then(parse_polygon).into_iter().collect(),
        Some("MultiPolygon") => coords
            .and_then(JsonValue::as_array)
            .map(|polys| polys.iter().filter_map(parse_polygon).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn parse_polygon(value: &JsonValue) -> Option<Polygon> {
    let mut rings = value.as_array()?.iter().filter_map(parse_ring);
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(value: &JsonValue) -> Option<Ring> {
    value
        .as_array()?
        .iter()
        .map(|pt| {
            let pt = pt.as_array()?;
            Some([pt.first()?.as_f64()?, pt.get(1)?.as_f64()?])
        })
        .collect()
}
