use crate::constants::{data_group, QC};
use crate::core::decode::{decode, DecodeOverrides, DecodeParams};
use crate::io::geolocation::read_geometry;
use crate::io::reader::{silence_hdf5_errors, SwathReader};
use crate::types::{Geolocation, Raster, Vnp21Result};
use std::path::Path;
use std::sync::Arc;

fn resolve_geometry<R: SwathReader>(
    reader: &R,
    path: &Path,
    geometry: Option<Arc<Geolocation>>,
) -> Vnp21Result<Arc<Geolocation>> {
    match geometry {
        Some(geometry) => Ok(geometry),
        None => Ok(Arc::new(read_geometry(reader, path)?)),
    }
}

/// Read a data field in physical units.
///
/// Scale, offset and fill not given in `overrides` come from the variable's
/// own attributes. The geometry is read from the file when not supplied.
pub fn read_layer<R: SwathReader>(
    reader: &R,
    path: &Path,
    name: &str,
    geometry: Option<Arc<Geolocation>>,
    overrides: &DecodeOverrides,
) -> Vnp21Result<Raster<f64>> {
    let geometry = resolve_geometry(reader, path, geometry)?;
    let group = data_group();

    log::info!("Loading {} from: {}", name, path.display());

    let packing = reader.packing(path, &group, name)?;
    let params = DecodeParams::resolve(overrides, &packing);
    let raw = reader.read_f64(path, &group, name)?;

    Ok(Raster::new(decode(&raw, &params), geometry))
}

/// Read a data field as stored, without scaling or fill handling
pub fn read_dn<R: SwathReader>(
    reader: &R,
    path: &Path,
    name: &str,
    geometry: Option<Arc<Geolocation>>,
) -> Vnp21Result<Raster<f64>> {
    let geometry = resolve_geometry(reader, path, geometry)?;

    log::info!("Loading digital numbers of {} from: {}", name, path.display());

    let raw = reader.read_f64(path, &data_group(), name)?;
    Ok(Raster::new(raw, geometry))
}

/// Read the quality-control bitmask
pub fn read_qc<R: SwathReader>(
    reader: &R,
    path: &Path,
    geometry: Option<Arc<Geolocation>>,
) -> Vnp21Result<Raster<u16>> {
    let geometry = resolve_geometry(reader, path, geometry)?;

    log::info!("Loading {} from: {}", QC, path.display());

    silence_hdf5_errors();
    let qc = reader.read_u16(path, &data_group(), QC)?;
    Ok(Raster::new(qc, geometry))
}
