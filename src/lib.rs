//! vnp21imgnrt: reader for VIIRS VNP21IMG-NRT land surface temperature granules
//!
//! Opens near-real-time VNP21IMG swath files (NetCDF-4/HDF5), decodes their
//! science datasets into georeferenced rasters, masks cloud from the QC
//! bitfield, and searches and downloads granules from NASA CMR.

pub mod constants;
pub mod core;
pub mod granule;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{BoundingBox, Geolocation, Raster, Vnp21Error, Vnp21Result};

pub use crate::core::{cloud_mask, decode, DecodeOverrides, DecodeParams, PackingAttributes};
pub use granule::{GranuleSource, ReadOptions, Vnp21ImgNrtGranule};
pub use io::{
    retrieve_granule, search_granules, DownloadConfig, GranuleName, NetcdfSwathReader, RemoteGranule,
    SearchConfig, SearchQuery, SwathGranule, SwathReader,
};
