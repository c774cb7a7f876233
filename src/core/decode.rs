use ndarray::Array2;

/// Caller-supplied decode settings; `None` means "use the file's metadata".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodeOverrides {
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub fill: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

/// Packing attributes declared on a variable in the file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PackingAttributes {
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub fill_value: Option<f64>,
}

/// Fully resolved parameters for turning digital numbers into physical values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    pub scale: f64,
    pub offset: f64,
    pub fill: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            fill: None,
            upper: None,
            lower: None,
        }
    }
}

impl DecodeParams {
    /// Explicit overrides win over file metadata; missing metadata falls back to
    /// scale 1, offset 0 and no fill.
    pub fn resolve(overrides: &DecodeOverrides, packing: &PackingAttributes) -> Self {
        Self {
            scale: overrides.scale.or(packing.scale_factor).unwrap_or(1.0),
            offset: overrides.offset.or(packing.add_offset).unwrap_or(0.0),
            fill: overrides.fill.or(packing.fill_value),
            upper: overrides.upper,
            lower: overrides.lower,
        }
    }

    /// Decode a single digital number.
    ///
    /// A pixel is fill when either the stored value or the decoded value equals
    /// `fill`. Range bounds clip rather than mask, and NaN passes through untouched.
    pub fn apply(&self, dn: f64) -> f64 {
        let mut value = dn * self.scale + self.offset;

        if let Some(fill) = self.fill {
            if dn == fill || value == fill {
                return f64::NAN;
            }
        }

        if let Some(upper) = self.upper {
            if value > upper {
                value = upper;
            }
        }

        if let Some(lower) = self.lower {
            if value < lower {
                value = lower;
            }
        }

        value
    }
}

pub fn decode(raw: &Array2<f64>, params: &DecodeParams) -> Array2<f64> {
    log::debug!(
        "Decoding {}x{} layer: scale={} offset={} fill={:?} upper={:?} lower={:?}",
        raw.nrows(),
        raw.ncols(),
        params.scale,
        params.offset,
        params.fill,
        params.upper,
        params.lower
    );

    raw.mapv(|dn| params.apply(dn))
}
