//! Sweep specification: wavelength axis, angle axis and polarization.
//!
//! A sweep varies at most one of wavelength and angle of incidence. The other
//! axis is held at a single value and broadcast against the ranged one.

use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;


/// Polarization of the incident wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Polarization {
    /// s polarization, electric field perpendicular to the plane of incidence.
    TE,
    /// p polarization, electric field parallel to the plane of incidence.
    TM,
}

impl FromStr for Polarization {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "te" | "s" | "senkrecht" => Ok(Polarization::TE),
            "tm" | "p" | "parallel" => Ok(Polarization::TM),
            _ => Err(ValidationError::UnknownPolarization(s.to_string())),
        }
    }
}

impl TryFrom<String> for Polarization {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Polarization> for String {
    fn from(polarization: Polarization) -> Self {
        polarization.to_string()
    }
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarization::TE => write!(f, "TE"),
            Polarization::TM => write!(f, "TM"),
        }
    }
}

/// Values taken along one sweep axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Single(f64),
    /// `num_points` linearly spaced values from `start` to `end` inclusive.
    Range {
        start: f64,
        end: f64,
        num_points: usize,
    },
    Values(Vec<f64>),
}

impl Axis {
    pub fn is_ranged(&self) -> bool {
        !matches!(self, Axis::Single(_))
    }

    pub fn values(&self) -> Vec<f64> {
        match self {
            Axis::Single(value) => vec![*value],
            Axis::Range {
                start,
                end,
                num_points,
            } => Array1::linspace(*start, *end, *num_points).to_vec(),
            Axis::Values(values) => values.clone(),
        }
    }

    /// Applies `f` to every value of the axis, keeping its shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Axis {
        match self {
            Axis::Single(value) => Axis::Single(f(*value)),
            Axis::Range {
                start,
                end,
                num_points,
            } => Axis::Range {
                start: f(*start),
                end: f(*end),
                num_points: *num_points,
            },
            Axis::Values(values) => Axis::Values(values.iter().map(|v| f(*v)).collect()),
        }
    }

    fn validate(
        &self,
        in_domain: impl Fn(f64) -> bool,
        err: impl Fn(f64) -> ValidationError,
    ) -> Result<(), ValidationError> {
        let values = self.values();
        if values.is_empty() {
            return Err(ValidationError::EmptyAxis);
        }
        match values.into_iter().find(|v| !in_domain(*v)) {
            Some(value) => Err(err(value)),
            None => Ok(()),
        }
    }
}

/// The independent variable of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepAxis {
    /// Wavelength in meters.
    Wavelength,
    /// Angle of incidence in radians.
    Angle,
}

impl fmt::Display for SweepAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepAxis::Wavelength => write!(f, "wavelength"),
            SweepAxis::Angle => write!(f, "angle"),
        }
    }
}

/// Broadcast sample points of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    pub axis: SweepAxis,
    /// Values of the independent variable, one per point.
    pub abscissa: Vec<f64>,
    /// `(wavelength, angle)` pairs in sweep order.
    pub points: Vec<(f64, f64)>,
}

impl Samples {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A validated sweep over wavelength (meters) or angle of incidence (radians).
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    wavelength: Axis,
    angle: Axis,
    polarization: Polarization,
}

impl SweepSpec {
    pub fn new(
        wavelength: Axis,
        angle: Axis,
        polarization: Polarization,
    ) -> Result<Self, ValidationError> {
        if wavelength.is_ranged() && angle.is_ranged() {
            return Err(ValidationError::BothAxesRanged);
        }
        wavelength.validate(
            |v| v.is_finite() && v > 0.0,
            ValidationError::WavelengthOutOfDomain,
        )?;
        angle.validate(
            |v| (0.0..std::f64::consts::FRAC_PI_2).contains(&v),
            ValidationError::AngleOutOfDomain,
        )?;

        Ok(Self {
            wavelength,
            angle,
            polarization,
        })
    }

    pub fn wavelength(&self) -> &Axis {
        &self.wavelength
    }

    pub fn angle(&self) -> &Axis {
        &self.angle
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    /// The independent variable. Wavelength unless the angle is ranged.
    pub fn axis(&self) -> SweepAxis {
        if self.angle.is_ranged() {
            SweepAxis::Angle
        } else {
            SweepAxis::Wavelength
        }
    }

    /// Expands the sweep into `(wavelength, angle)` points.
    pub fn samples(&self) -> Samples {
        let wavelengths = self.wavelength.values();
        let angles = self.angle.values();

        let axis = self.axis();
        let points: Vec<(f64, f64)> = match axis {
            SweepAxis::Wavelength => wavelengths.iter().map(|&wl| (wl, angles[0])).collect(),
            SweepAxis::Angle => angles.iter().map(|&theta| (wavelengths[0], theta)).collect(),
        };
        let abscissa = match axis {
            SweepAxis::Wavelength => wavelengths,
            SweepAxis::Angle => angles,
        };

        Samples {
            axis,
            abscissa,
            points,
        }
    }
}
