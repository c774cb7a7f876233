//! File access and remote retrieval

pub mod geolocation;
pub mod layer;
pub mod reader;
pub mod retrieve;
pub mod search;
pub mod swath;

pub use geolocation::{read_geometry, read_latitude, read_longitude};
pub use layer::{read_dn, read_layer, read_qc};
pub use reader::{NetcdfSwathReader, SwathReader};
pub use retrieve::{download_path, retrieve_granule, DownloadConfig};
pub use search::{search_granules, RemoteGranule, SearchConfig, SearchPage, SearchQuery};
pub use swath::{GranuleName, SwathGranule};
