use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::data::{DataLoader, FileFetcher, HttpFetcher};
use crate::map::DEFAULT_MAX_ZOOM;

#[derive(Parser, Debug)]
#[command(name = "region-map")]
#[command(about = "Interactive terminal map of administrative regions", long_about = None)]
pub struct Args {
    /// Server hosting /data/RegionsMap.geojson
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub base_url: String,

    /// Read the region GeoJSON from a local file instead of the server
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Text art drawn beneath the map (optional)
    #[arg(long, default_value = "assets/backdrop.txt")]
    pub backdrop: PathBuf,

    /// Upper bound for the zoom chosen when fitting the map
    #[arg(long, default_value_t = DEFAULT_MAX_ZOOM)]
    pub max_zoom: f64,

    /// Directory for region-map.log
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max zoom must be finite and non-negative, got {0}")]
    InvalidMaxZoom(f64),

    #[error("base URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
}

/// Where the region dataset comes from
#[derive(Clone, Debug, PartialEq)]
pub enum DatasetSource {
    Http(String),
    File(PathBuf),
}

/// Validated runtime configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub source: DatasetSource,
    pub backdrop: PathBuf,
    pub max_zoom: f64,
    pub log_dir: PathBuf,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if !args.max_zoom.is_finite() || args.max_zoom < 0.0 {
            return Err(ConfigError::InvalidMaxZoom(args.max_zoom));
        }

        let source = match args.file {
            Some(path) => DatasetSource::File(path),
            None => {
                if !(args.base_url.starts_with("http://") || args.base_url.starts_with("https://")) {
                    return Err(ConfigError::InvalidBaseUrl(args.base_url));
                }
                DatasetSource::Http(args.base_url)
            }
        };

        Ok(Self {
            source,
            backdrop: args.backdrop,
            max_zoom: args.max_zoom,
            log_dir: args.log_dir,
        })
    }
}

impl Config {
    /// Fresh loader for one mount
    pub fn loader(&self) -> DataLoader {
        match &self.source {
            DatasetSource::Http(base_url) => DataLoader::new(HttpFetcher::new(base_url)),
            DatasetSource::File(path) => DataLoader::new(FileFetcher::new(path.clone())),
        }
    }
}
