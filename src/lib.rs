//! Reflectance of planar multilayer thin-film stacks with the optical
//! transfer-matrix method.
//!
//! A [`material::LayerStack`] of materials, each with a
//! [`dispersion::DispersionModel`], is swept over wavelength or angle of
//! incidence by [`reflectance::reflectance`], which returns a
//! [`result::Spectrum`]. The remaining modules load stacks from a JSON
//! [`catalog`], read [`settings`] and drive command-line runs.

pub mod catalog;
pub mod dispersion;
pub mod error;
pub mod formula;
pub mod fresnel;
pub mod material;
pub mod output;
pub mod problem;
pub mod reflectance;
pub mod result;
pub mod settings;
pub mod snell;
pub mod sweep;
pub mod transfer;
