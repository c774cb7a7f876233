//! Per-file facade over a VNP21IMG-NRT granule.

use crate::constants::{
    data_group, ADD_OFFSET_ATTR, FILL_VALUE_ATTR, KELVIN_OFFSET, SCALE_FACTOR_ATTR, SWATH_NAME,
};
use crate::core::cloud::cloud_mask;
use crate::core::decode::{DecodeOverrides, PackingAttributes};
use crate::io::geolocation::read_geometry;
use crate::io::layer::{read_dn, read_layer, read_qc};
use crate::io::reader::{NetcdfSwathReader, SwathReader};
use crate::io::swath::SwathGranule;
use crate::types::{Geolocation, Raster, Vnp21Error, Vnp21Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a granule can be opened from
#[derive(Debug, Clone)]
pub enum GranuleSource {
    Path(PathBuf),
    Swath(SwathGranule),
}

impl From<&str> for GranuleSource {
    fn from(path: &str) -> Self {
        GranuleSource::Path(PathBuf::from(path))
    }
}

impl From<String> for GranuleSource {
    fn from(path: String) -> Self {
        GranuleSource::Path(PathBuf::from(path))
    }
}

impl From<&Path> for GranuleSource {
    fn from(path: &Path) -> Self {
        GranuleSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for GranuleSource {
    fn from(path: PathBuf) -> Self {
        GranuleSource::Path(path)
    }
}

impl From<SwathGranule> for GranuleSource {
    fn from(granule: SwathGranule) -> Self {
        GranuleSource::Swath(granule)
    }
}

/// Options for [`Vnp21ImgNrtGranule::read`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadOptions {
    /// Set cloudy pixels to NaN
    pub apply_cloud: bool,
    pub decode: DecodeOverrides,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_cloud(mut self, apply: bool) -> Self {
        self.apply_cloud = apply;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.decode.scale = Some(scale);
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.decode.offset = Some(offset);
        self
    }

    pub fn fill(mut self, fill: f64) -> Self {
        self.decode.fill = Some(fill);
        self
    }

    pub fn upper(mut self, upper: f64) -> Self {
        self.decode.upper = Some(upper);
        self
    }

    pub fn lower(mut self, lower: f64) -> Self {
        self.decode.lower = Some(lower);
        self
    }
}

/// A VNP21IMG-NRT land surface temperature granule.
///
/// Geometry and QC are read on first use and kept for the lifetime of the
/// value; the underlying file is assumed not to change. Everything else is
/// read from disk on each call.
pub struct Vnp21ImgNrtGranule<R: SwathReader = NetcdfSwathReader> {
    swath: SwathGranule,
    reader: R,
    geometry: Option<Arc<Geolocation>>,
    qc: Option<Raster<u16>>,
}

impl Vnp21ImgNrtGranule<NetcdfSwathReader> {
    /// Open a granule from a path or an existing swath handle
    pub fn open<S: Into<GranuleSource>>(source: S) -> Vnp21Result<Self> {
        Self::with_reader(source, NetcdfSwathReader::new())
    }
}

impl<R: SwathReader> Vnp21ImgNrtGranule<R> {
    pub fn with_reader<S: Into<GranuleSource>>(source: S, reader: R) -> Vnp21Result<Self> {
        let swath = match source.into() {
            GranuleSource::Path(path) => SwathGranule::new(path)?,
            GranuleSource::Swath(swath) => swath,
        };

        log::debug!("Opened VNP21IMG-NRT granule: {}", swath.filename().display());

        Ok(Self {
            swath,
            reader,
            geometry: None,
            qc: None,
        })
    }

    pub fn swath(&self) -> &SwathGranule {
        &self.swath
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn filename(&self) -> &Path {
        self.swath.filename()
    }

    pub fn filename_base(&self) -> String {
        self.swath.filename_base()
    }

    pub fn hv(&self) -> Option<(u32, u32)> {
        self.swath.hv()
    }

    /// Science datasets available in this granule
    pub fn variables(&self) -> Vnp21Result<Vec<String>> {
        self.swath.variables(&self.reader, SWATH_NAME)
    }

    fn ensure_variable(&self, name: &str) -> Vnp21Result<()> {
        if self.variables()?.iter().any(|v| v == name) {
            Ok(())
        } else {
            Err(Vnp21Error::MissingVariable {
                name: name.to_string(),
                granule: self.filename_base(),
            })
        }
    }

    /// Per-pixel geolocation, read once
    pub fn geometry(&mut self) -> Vnp21Result<Arc<Geolocation>> {
        if let Some(geometry) = &self.geometry {
            return Ok(Arc::clone(geometry));
        }

        let geometry = Arc::new(read_geometry(&self.reader, self.swath.filename())?);
        self.geometry = Some(Arc::clone(&geometry));
        Ok(geometry)
    }

    /// QC bitmask, read once
    pub fn qc(&mut self) -> Vnp21Result<&Raster<u16>> {
        let qc = match self.qc.take() {
            Some(qc) => qc,
            None => {
                let geometry = self.geometry()?;
                read_qc(&self.reader, self.swath.filename(), Some(geometry))?
            }
        };

        Ok(self.qc.insert(qc))
    }

    /// True where QC bits 4-5 flag cloud
    pub fn cloud(&mut self) -> Vnp21Result<Raster<bool>> {
        let qc = self.qc()?;
        Ok(Raster::new(cloud_mask(qc.data()), Arc::clone(qc.geometry())))
    }

    /// Stored values of a dataset, untouched
    pub fn dn(&mut self, name: &str) -> Vnp21Result<Raster<f64>> {
        self.ensure_variable(name)?;
        let geometry = self.geometry()?;
        read_dn(&self.reader, self.swath.filename(), name, Some(geometry))
    }

    fn attribute(
        &self,
        name: &str,
        attribute: &str,
        pick: fn(&PackingAttributes) -> Option<f64>,
    ) -> Vnp21Result<f64> {
        let packing = self.reader.packing(self.swath.filename(), &data_group(), name)?;

        pick(&packing).ok_or_else(|| Vnp21Error::MissingAttribute {
            variable: name.to_string(),
            attribute: attribute.to_string(),
        })
    }

    /// `scale_factor` declared on a dataset
    pub fn scale(&self, name: &str) -> Vnp21Result<f64> {
        self.attribute(name, SCALE_FACTOR_ATTR, |p| p.scale_factor)
    }

    /// `add_offset` declared on a dataset
    pub fn offset(&self, name: &str) -> Vnp21Result<f64> {
        self.attribute(name, ADD_OFFSET_ATTR, |p| p.add_offset)
    }

    /// `_FillValue` declared on a dataset
    pub fn fill(&self, name: &str) -> Vnp21Result<f64> {
        self.attribute(name, FILL_VALUE_ATTR, |p| p.fill_value)
    }

    /// Read a dataset in physical units
    pub fn read(&mut self, name: &str, options: &ReadOptions) -> Vnp21Result<Raster<f64>> {
        self.ensure_variable(name)?;
        let geometry = self.geometry()?;

        let mut layer = read_layer(
            &self.reader,
            self.swath.filename(),
            name,
            Some(geometry),
            &options.decode,
        )?;

        if options.apply_cloud {
            let cloud = self.cloud()?;
            layer.mask(cloud.data())?;
        }

        Ok(layer)
    }

    /// Land surface temperature in kelvin
    pub fn lst(&mut self) -> Vnp21Result<Raster<f64>> {
        self.read("LST", &ReadOptions::default())
    }

    pub fn st_k(&mut self) -> Vnp21Result<Raster<f64>> {
        self.lst()
    }

    /// Land surface temperature in degrees Celsius
    pub fn st_c(&mut self) -> Vnp21Result<Raster<f64>> {
        Ok(self.st_k()?.map(|&k| k - KELVIN_OFFSET))
    }

    pub fn lst_err(&mut self) -> Vnp21Result<Raster<f64>> {
        self.read("LST_err", &ReadOptions::default())
    }

    /// I5 band emissivity, never above 1
    pub fn emis_i5(&mut self) -> Vnp21Result<Raster<f64>> {
        self.read("Emis_I5", &ReadOptions::default().upper(1.0))
    }

    pub fn emis_i5_err(&mut self) -> Vnp21Result<Raster<f64>> {
        self.read("Emis_I5_err", &ReadOptions::default())
    }

    pub fn view_angle(&mut self) -> Vnp21Result<Raster<f64>> {
        self.read("View_angle", &ReadOptions::default())
    }
}

impl<R: SwathReader> std::fmt::Debug for Vnp21ImgNrtGranule<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vnp21ImgNrtGranule")
            .field("filename", &self.swath.filename())
            .field("geometry_loaded", &self.geometry.is_some())
            .field("qc_loaded", &self.qc.is_some())
            .finish()
    }
}
