use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use geojson::{FeatureCollection, JsonValue, Value};
use glam::DVec2;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::map::geometry::{Polygon, RegionGeometry, Ring};

/// Well-known location of the region boundaries on the data server
pub const DATASET_PATH: &str = "/data/RegionsMap.geojson";

/// Placeholder label for features without a `nom` property
pub const UNKNOWN_NAME: &str = "Unknown";

const USER_AGENT: &str = concat!("region-map/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP error! status: {0}")]
    Http(u16),

    #[error("malformed region data: {0}")]
    Parse(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("cannot read region data: {0}")]
    Io(#[from] std::io::Error),
}

/// One administrative region
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub geometry: RegionGeometry,
}

/// Ordered, immutable set of regions from one successful load
#[derive(Clone, Debug, Default)]
pub struct BoundaryDataset {
    regions: Vec<Region>,
}

impl BoundaryDataset {
    /// Build from regions, rejecting duplicate codes
    pub fn new(regions: Vec<Region>) -> Result<Self, LoadError> {
        let mut seen = HashSet::with_capacity(regions.len());
        for region in &regions {
            if !seen.insert(region.code.as_str()) {
                return Err(LoadError::Parse(format!(
                    "duplicate region code {:?}",
                    region.code
                )));
            }
        }
        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Region> {
        self.regions.get(idx)
    }

    pub fn find(&self, code: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.code == code)
    }
}

/// Source of the raw dataset bytes
pub trait DatasetFetcher: Send {
    /// Fetch the whole body once; no retries
    fn fetch(&self) -> Result<Vec<u8>, LoadError>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Fetches the dataset over HTTP with ureq
pub struct HttpFetcher {
    agent: ureq::Agent,
    url: String,
}

impl HttpFetcher {
    /// Resolve the fixed dataset path against `base_url`
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            url: format!("{}{}", base_url.trim_end_matches('/'), DATASET_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DatasetFetcher for HttpFetcher {
    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        match self.agent.get(&self.url).set("User-Agent", USER_AGENT).call() {
            Ok(response) => {
                let status = response.status();
                if !(200..300).contains(&status) {
                    return Err(LoadError::Http(status));
                }
                let mut body = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut body)
                    .map_err(|e| LoadError::Transport(e.to_string()))?;
                Ok(body)
            }
            Err(ureq::Error::Status(status, _)) => Err(LoadError::Http(status)),
            Err(ureq::Error::Transport(e)) => Err(LoadError::Transport(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads the dataset from a local file
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetFetcher for FileFetcher {
    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        Ok(fs::read(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fetch + parse of the boundary dataset
pub struct DataLoader {
    fetcher: Box<dyn DatasetFetcher>,
}

impl DataLoader {
    pub fn new(fetcher: impl DatasetFetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
        }
    }

    pub fn describe(&self) -> String {
        self.fetcher.describe()
    }

    /// One fetch, one parse. A failure is final for this loader.
    pub fn load(&self) -> Result<BoundaryDataset, LoadError> {
        let source = self.fetcher.describe();
        debug!(%source, "fetching region data");
        let body = self.fetcher.fetch()?;
        let dataset = parse_dataset(body)?;
        info!(%source, regions = dataset.len(), "region data loaded");
        Ok(dataset)
    }
}

/// Parse a GeoJSON FeatureCollection into regions
pub fn parse_dataset(mut body: Vec<u8>) -> Result<BoundaryDataset, LoadError> {
    let collection: FeatureCollection = simd_json::serde::from_slice(&mut body)
        .map_err(|e| LoadError::Parse(e.to_string()))?;

    let mut regions = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.into_iter().enumerate() {
        let props = feature.properties.as_ref();

        let code = match props.and_then(|p| p.get("code")) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(LoadError::Parse(format!(
                    "feature {idx}: code must be a string, got {other}"
                )))
            }
            None => return Err(LoadError::Parse(format!("feature {idx}: missing code"))),
        };

        let name = props
            .and_then(|p| p.get("nom"))
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_NAME)
            .to_string();

        let Some(geometry) = feature.geometry else {
            warn!(%code, "region has no geometry, skipped");
            continue;
        };

        let geometry = match geometry.value {
            Value::Polygon(rings) => RegionGeometry::Polygon(convert_polygon(idx, &rings)?),
            Value::MultiPolygon(parts) => RegionGeometry::MultiPolygon(
                parts
                    .iter()
                    .map(|rings| convert_polygon(idx, rings))
                    .collect::<Result<_, _>>()?,
            ),
            other => {
                warn!(%code, kind = geometry_kind(&other), "unsupported geometry type, skipped");
                continue;
            }
        };

        regions.push(Region {
            code,
            name,
            geometry,
        });
    }

    BoundaryDataset::new(regions)
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn convert_polygon(idx: usize, rings: &[Vec<Vec<f64>>]) -> Result<Polygon, LoadError> {
    let rings = rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|pos| match pos.as_slice() {
                    [x, y, ..] => Ok(DVec2::new(*x, *y)),
                    _ => Err(LoadError::Parse(format!(
                        "feature {idx}: position needs two coordinates"
                    ))),
                })
                .collect::<Result<Ring, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(rings))
}
