use crate::constants::{geolocation_group, LATITUDE, LONGITUDE};
use crate::io::reader::SwathReader;
use crate::types::{Geolocation, Vnp21Result};
use ndarray::Array2;
use std::path::Path;

/// Read one geolocation field, replacing its `_FillValue` with NaN
pub fn read_coordinate<R: SwathReader>(reader: &R, path: &Path, name: &str) -> Vnp21Result<Array2<f64>> {
    let group = geolocation_group();
    let fill = reader.packing(path, &group, name)?.fill_value;
    let mut array = reader.read_f64(path, &group, name)?;

    if let Some(fill) = fill {
        array.mapv_inplace(|v| if v == fill { f64::NAN } else { v });
    }

    Ok(array)
}

pub fn read_latitude<R: SwathReader>(reader: &R, path: &Path) -> Vnp21Result<Array2<f64>> {
    read_coordinate(reader, path, LATITUDE)
}

pub fn read_longitude<R: SwathReader>(reader: &R, path: &Path) -> Vnp21Result<Array2<f64>> {
    read_coordinate(reader, path, LONGITUDE)
}

/// Per-pixel geolocation of a granule
pub fn read_geometry<R: SwathReader>(reader: &R, path: &Path) -> Vnp21Result<Geolocation> {
    log::info!("Reading geolocation from: {}", path.display());

    let latitude = read_latitude(reader, path)?;
    let longitude = read_longitude(reader, path)?;

    log::debug!("Geolocation shape: {:?}", latitude.dim());

    Geolocation::new(latitude, longitude)
}
