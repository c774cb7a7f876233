//! Pure array transforms applied after reading

pub mod cloud;
pub mod decode;

pub use cloud::{cloud_mask, is_cloudy};
pub use decode::{decode, DecodeOverrides, DecodeParams, PackingAttributes};
