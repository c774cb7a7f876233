//! NetCDF-4/HDF5 access to swath granules.
//!
//! Everything above this module reads granules through [`SwathReader`], which
//! keeps the decode and facade logic independent of the file library. Each
//! call opens the file, reads what it needs and closes it again.

use crate::constants::{ADD_OFFSET_ATTR, FILL_VALUE_ATTR, SCALE_FACTOR_ATTR};
use crate::core::decode::PackingAttributes;
use crate::types::{Vnp21Error, Vnp21Result};
use ndarray::Array2;
use std::path::Path;
use std::sync::Once;

/// Primitive reads on a swath granule file.
///
/// `group` is a `/`-separated path such as `VIIRS_I5_LST/Data Fields`.
pub trait SwathReader {
    /// Names of the datasets in `group`
    fn list_variables(&self, path: &Path, group: &str) -> Vnp21Result<Vec<String>>;

    /// Read a 2-D dataset converted to `f64`, without applying any packing
    fn read_f64(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<Array2<f64>>;

    /// Read a 2-D dataset converted to `u16`
    fn read_u16(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<Array2<u16>>;

    /// `scale_factor`, `add_offset` and `_FillValue` of a dataset, where present
    fn packing(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<PackingAttributes>;
}

impl<R: SwathReader + ?Sized> SwathReader for &R {
    fn list_variables(&self, path: &Path, group: &str) -> Vnp21Result<Vec<String>> {
        (**self).list_variables(path, group)
    }

    fn read_f64(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<Array2<f64>> {
        (**self).read_f64(path, group, name)
    }

    fn read_u16(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<Array2<u16>> {
        (**self).read_u16(path, group, name)
    }

    fn packing(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<PackingAttributes> {
        (**self).packing(path, group, name)
    }
}

/// Reader backed by libnetcdf
#[derive(Debug, Clone, Copy, Default)]
pub struct NetcdfSwathReader;

impl NetcdfSwathReader {
    pub fn new() -> Self {
        silence_hdf5_errors();
        Self
    }

    fn open(path: &Path) -> Vnp21Result<netcdf::File> {
        silence_hdf5_errors();
        log::debug!("Opening granule file: {}", path.display());
        Ok(netcdf::open(path)?)
    }
}

impl SwathReader for NetcdfSwathReader {
    fn list_variables(&self, path: &Path, group: &str) -> Vnp21Result<Vec<String>> {
        let file = Self::open(path)?;
        let group = open_group(&file, group)?;

        Ok(group.variables().map(|v| v.name()).collect())
    }

    fn read_f64(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<Array2<f64>> {
        let file = Self::open(path)?;
        let group_handle = open_group(&file, group)?;
        let variable = open_variable(&group_handle, group, name)?;
        let shape = shape_2d(&variable, name)?;

        let values: Vec<f64> = variable.get_values(..)?;
        to_array(values, shape)
    }

    fn read_u16(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<Array2<u16>> {
        let file = Self::open(path)?;
        let group_handle = open_group(&file, group)?;
        let variable = open_variable(&group_handle, group, name)?;
        let shape = shape_2d(&variable, name)?;

        let values: Vec<u16> = variable.get_values(..)?;
        to_array(values, shape)
    }

    fn packing(&self, path: &Path, group: &str, name: &str) -> Vnp21Result<PackingAttributes> {
        let file = Self::open(path)?;
        let group_handle = open_group(&file, group)?;
        let variable = open_variable(&group_handle, group, name)?;

        Ok(PackingAttributes {
            scale_factor: get_f64_attr(&variable, SCALE_FACTOR_ATTR)?,
            add_offset: get_f64_attr(&variable, ADD_OFFSET_ATTR)?,
            fill_value: get_f64_attr(&variable, FILL_VALUE_ATTR)?,
        })
    }
}

/// Disable HDF5's automatic error printing to stderr.
///
/// libhdf5 reports every failed lookup (e.g. probing for an optional
/// attribute) on stderr even when the caller handles it. Safe to call
/// repeatedly; only the first call does anything.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: null handlers are the documented way to turn off auto printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

fn open_group<'f>(file: &'f netcdf::File, group: &str) -> Vnp21Result<netcdf::Group<'f>> {
    file.group(group)?
        .ok_or_else(|| Vnp21Error::MissingGroup(group.to_string()))
}

fn open_variable<'g>(
    group_handle: &'g netcdf::Group,
    group: &str,
    name: &str,
) -> Vnp21Result<netcdf::Variable<'g>> {
    group_handle
        .variable(name)
        .ok_or_else(|| Vnp21Error::MissingDataset {
            group: group.to_string(),
            name: name.to_string(),
        })
}

fn shape_2d(variable: &netcdf::Variable, name: &str) -> Vnp21Result<(usize, usize)> {
    match variable.dimensions() {
        [rows, cols] => Ok((rows.len(), cols.len())),
        dims => Err(Vnp21Error::InvalidFormat(format!(
            "{} has {} dimensions, expected 2",
            name,
            dims.len()
        ))),
    }
}

fn to_array<T>(values: Vec<T>, shape: (usize, usize)) -> Vnp21Result<Array2<T>> {
    let count = values.len();
    Array2::from_shape_vec(shape, values).map_err(|_| {
        Vnp21Error::InvalidFormat(format!(
            "read {} values for a {}x{} dataset",
            count, shape.0, shape.1
        ))
    })
}

/// Check for an attribute before reading it, which avoids HDF5 lookups that fail
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Vnp21Result<Option<f64>> {
    if !has_attr(var, name) {
        return Ok(None);
    }

    match var.attribute_value(name) {
        Some(value) => {
            let value = value?;
            f64::try_from(value).map(Some).map_err(|_| {
                Vnp21Error::InvalidFormat(format!(
                    "attribute {} of {} is not numeric",
                    name,
                    var.name()
                ))
            })
        }
        None => Ok(None),
    }
}
