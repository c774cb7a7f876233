use crate::io::reader::SwathReader;
use crate::types::{Vnp21Error, Vnp21Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Fields encoded in a granule file name, e.g.
/// `VNP21IMG_NRT.A2024123.1200.002.2024123130000.nc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranuleName {
    pub product: String,
    pub acquisition: NaiveDateTime,
    pub collection: String,
    /// Production timestamp as written in the name (YYYYDDDHHMMSS)
    pub production: String,
    pub hv: Option<(u32, u32)>,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<product>[A-Za-z0-9_]+)\.A(?P<year>\d{4})(?P<doy>\d{3})(?:\.(?P<hour>\d{2})(?P<minute>\d{2}))?(?:\.h(?P<h>\d{2})v(?P<v>\d{2}))?\.(?P<collection>\d{3})\.(?P<production>\d{13})(?:\.\w+)?$",
        )
        .expect("granule name pattern is valid")
    })
}

impl GranuleName {
    pub fn parse(filename: &str) -> Vnp21Result<Self> {
        let caps = name_pattern()
            .captures(filename)
            .ok_or_else(|| Vnp21Error::InvalidFormat(format!("Unrecognised granule name: {}", filename)))?;

        // tiled products carry no acquisition time, which reads as 00:00
        let number = |key: &str| -> u32 {
            caps.name(key)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        let date = NaiveDate::from_yo_opt(number("year") as i32, number("doy"))
            .ok_or_else(|| Vnp21Error::InvalidFormat(format!("Invalid acquisition date in {}", filename)))?;
        let time = NaiveTime::from_hms_opt(number("hour"), number("minute"), 0)
            .ok_or_else(|| Vnp21Error::InvalidFormat(format!("Invalid acquisition time in {}", filename)))?;

        let hv = match (caps.name("h"), caps.name("v")) {
            (Some(_), Some(_)) => Some((number("h"), number("v"))),
            _ => None,
        };

        Ok(Self {
            product: caps["product"].to_string(),
            acquisition: date.and_time(time),
            collection: caps["collection"].to_string(),
            production: caps["production"].to_string(),
            hv,
        })
    }
}

/// Generic handle to a swath granule file: path, name metadata and variable listing
#[derive(Debug, Clone, PartialEq)]
pub struct SwathGranule {
    filename: PathBuf,
    name: Option<GranuleName>,
}

impl SwathGranule {
    pub fn new<P: AsRef<Path>>(filename: P) -> Vnp21Result<Self> {
        let filename = absolute_path(filename.as_ref())?;

        let name = match filename.file_name().and_then(|n| n.to_str()) {
            Some(base) => match GranuleName::parse(base) {
                Ok(name) => Some(name),
                Err(e) => {
                    log::debug!("{}", e);
                    None
                }
            },
            None => None,
        };

        Ok(Self { filename, name })
    }

    /// Absolute path of the granule file
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn filename_base(&self) -> String {
        self.filename
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn granule_name(&self) -> Option<&GranuleName> {
        self.name.as_ref()
    }

    pub fn acquisition_time(&self) -> Option<NaiveDateTime> {
        self.name.as_ref().map(|n| n.acquisition)
    }

    /// Tile indices, only present when the file name carries an `hXXvYY` token
    pub fn hv(&self) -> Option<(u32, u32)> {
        self.name.as_ref().and_then(|n| n.hv)
    }

    /// Dataset names in `<swath>/Data Fields`
    pub fn variables<R: SwathReader>(&self, reader: &R, swath: &str) -> Vnp21Result<Vec<String>> {
        let group = format!("{}/{}", swath, crate::constants::DATA_FIELDS);
        reader.list_variables(&self.filename, &group)
    }
}

/// Expand a leading `~` and anchor relative paths at the working directory
fn absolute_path(path: &Path) -> Vnp21Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Vnp21Error::InvalidArgument("granule filename is empty".to_string()));
    }

    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(std::env::current_dir()?.join(expanded))
    }
}
