use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Geospatial bounding box in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vnp21Result<Self> {
        if !(min_lon <= max_lon && min_lat <= max_lat) {
            return Err(Vnp21Error::InvalidArgument(format!(
                "bounding box is inverted: lon {}..{}, lat {}..{}",
                min_lon, max_lon, min_lat, max_lat
            )));
        }

        Ok(Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// Per-pixel latitude/longitude of a swath granule.
///
/// Both arrays always have the same shape; pixels without a position are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Geolocation {
    latitude: Array2<f64>,
    longitude: Array2<f64>,
}

impl Geolocation {
    pub fn new(latitude: Array2<f64>, longitude: Array2<f64>) -> Vnp21Result<Self> {
        if latitude.dim() != longitude.dim() {
            return Err(Vnp21Error::ShapeMismatch {
                expected: latitude.dim(),
                actual: longitude.dim(),
            });
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> &Array2<f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &Array2<f64> {
        &self.longitude
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.latitude.dim()
    }

    /// Extent of all pixels that have both coordinates, or `None` for an empty swath.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;

        for (&lat, &lon) in self.latitude.iter().zip(self.longitude.iter()) {
            if lat.is_nan() || lon.is_nan() {
                continue;
            }
            bbox = Some(match bbox {
                None => BoundingBox {
                    min_lon: lon,
                    max_lon: lon,
                    min_lat: lat,
                    max_lat: lat,
                },
                Some(b) => BoundingBox {
                    min_lon: b.min_lon.min(lon),
                    max_lon: b.max_lon.max(lon),
                    min_lat: b.min_lat.min(lat),
                    max_lat: b.max_lat.max(lat),
                },
            });
        }

        bbox
    }
}

/// A 2-D layer together with the geolocation of its pixels
#[derive(Debug, Clone)]
pub struct Raster<T> {
    data: Array2<T>,
    geometry: Arc<Geolocation>,
}

impl<T> Raster<T> {
    pub fn new(data: Array2<T>, geometry: Arc<Geolocation>) -> Self {
        Self { data, geometry }
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn into_data(self) -> Array2<T> {
        self.data
    }

    pub fn geometry(&self) -> &Arc<Geolocation> {
        &self.geometry
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// True when the layer has exactly one value per geolocated pixel
    pub fn matches_geometry(&self) -> bool {
        self.data.dim() == self.geometry.shape()
    }

    pub fn map<U, F>(&self, f: F) -> Raster<U>
    where
        F: FnMut(&T) -> U,
    {
        Raster {
            data: self.data.map(f),
            geometry: Arc::clone(&self.geometry),
        }
    }
}

impl Raster<f64> {
    /// Set every pixel where `mask` is true to NaN
    pub fn mask(&mut self, mask: &Array2<bool>) -> Vnp21Result<()> {
        if mask.dim() != self.data.dim() {
            return Err(Vnp21Error::ShapeMismatch {
                expected: self.data.dim(),
                actual: mask.dim(),
            });
        }

        ndarray::Zip::from(&mut self.data)
            .and(mask)
            .for_each(|value, &masked| {
                if masked {
                    *value = f64::NAN;
                }
            });

        Ok(())
    }

    /// Number of pixels that are not NaN
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Mean over valid pixels, `None` if every pixel is NaN
    pub fn nan_mean(&self) -> Option<f64> {
        let (sum, count) = self
            .data
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

/// Error types for granule access
#[derive(Debug, thiserror::Error)]
pub enum Vnp21Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Variable '{name}' not found in granule {granule}")]
    MissingVariable { name: String, granule: String },

    #[error("Group '{0}' not found")]
    MissingGroup(String),

    #[error("Dataset '{name}' not found in group '{group}'")]
    MissingDataset { group: String, name: String },

    #[error("Attribute '{attribute}' not found on variable '{variable}'")]
    MissingAttribute { variable: String, attribute: String },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Granule search error: {0}")]
    Search(String),

    #[error("Download error: {0}")]
    Download(String),
}

/// Result type for granule operations
pub type Vnp21Result<T> = Result<T, Vnp21Error>;
