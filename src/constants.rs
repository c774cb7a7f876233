//! Product identifiers and file layout of VNP21IMG-NRT granules

use std::path::PathBuf;

/// Top-level swath group of every granule
pub const SWATH_NAME: &str = "VIIRS_I5_LST";

pub const GEOLOCATION_FIELDS: &str = "Geolocation Fields";
pub const DATA_FIELDS: &str = "Data Fields";

pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const QC: &str = "QC";

pub const SCALE_FACTOR_ATTR: &str = "scale_factor";
pub const ADD_OFFSET_ATTR: &str = "add_offset";
pub const FILL_VALUE_ATTR: &str = "_FillValue";

/// CMR short name and version of the near-real-time collection
pub const SHORT_NAME: &str = "VNP21IMG_NRT";
pub const VERSION: &str = "2";

pub const CMR_GRANULE_SEARCH_URL: &str = "https://cmr.earthdata.nasa.gov/search/granules.json";

pub const KELVIN_OFFSET: f64 = 273.15;

/// `<group>/<subgroup>` path of the geolocation arrays
pub fn geolocation_group() -> String {
    format!("{}/{}", SWATH_NAME, GEOLOCATION_FIELDS)
}

/// `<group>/<subgroup>` path of the science datasets
pub fn data_group() -> String {
    format!("{}/{}", SWATH_NAME, DATA_FIELDS)
}

/// `~/data/VNP21IMG_NRT`, falling back to the working directory when no home exists
pub fn default_download_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("data")
        .join(SHORT_NAME)
}
