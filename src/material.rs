//! Materials and validated layer stacks.

use std::fmt;

use nalgebra::Complex;

use crate::dispersion::DispersionModel;
use crate::error::{NumericError, ValidationError};


/// Physical thickness of a material in a stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Thickness {
    /// Thickness in meters.
    Finite(f64),
    /// Semi-infinite ambient or substrate.
    Infinite,
}

impl Thickness {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Thickness::Infinite)
    }

    pub fn meters(&self) -> Option<f64> {
        match self {
            Thickness::Finite(d) => Some(*d),
            Thickness::Infinite => None,
        }
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thickness::Finite(d) => write!(f, "{:.3} nm", d * 1e9),
            Thickness::Infinite => write!(f, "inf"),
        }
    }
}

/// One layer, or the ambient/substrate bounding the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub thickness: Thickness,
    pub model: DispersionModel,
}

impl Material {
    pub fn new(name: impl Into<String>, thickness: Thickness, model: DispersionModel) -> Self {
        Self {
            name: name.into(),
            thickness,
            model,
        }
    }

    /// Complex refractive index at the vacuum wavelength in meters.
    pub fn index(&self, wavelength: f64) -> Result<Complex<f64>, NumericError> {
        self.model.index(wavelength)
    }
}

/// An ordered, validated sequence of materials from the incidence side to the
/// substrate. The first and last materials are semi-infinite and every
/// interior layer has a finite positive thickness.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    materials: Vec<Material>,
}

impl LayerStack {
    pub fn new(materials: Vec<Material>) -> Result<Self, ValidationError> {
        validate(&materials)?;
        Ok(Self { materials })
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Number of materials, including ambient and substrate.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Number of finite interior layers.
    pub fn num_layers(&self) -> usize {
        self.materials.len() - 2
    }

    /// Returns a copy of the stack with the interior layer at `index` set to
    /// `thickness` meters. `self` is left untouched.
    pub fn with_thickness(&self, index: usize, thickness: f64) -> Result<Self, ValidationError> {
        if index == 0 || index + 1 >= self.materials.len() {
            return Err(ValidationError::NotInterior {
                index,
                len: self.materials.len(),
            });
        }
        let mut materials = self.materials.clone();
        materials[index].thickness = Thickness::Finite(thickness);
        LayerStack::new(materials)
    }
}

fn validate(materials: &[Material]) -> Result<(), ValidationError> {
    let len = materials.len();
    if len < 2 {
        return Err(ValidationError::StackTooShort { len });
    }

    for (index, material) in materials.iter().enumerate() {
        let boundary = index == 0 || index == len - 1;
        match (boundary, material.thickness) {
            (true, Thickness::Infinite) => {}
            (true, Thickness::Finite(_)) => {
                return Err(ValidationError::FiniteBoundary {
                    index,
                    name: material.name.clone(),
                });
            }
            (false, Thickness::Infinite) => {
                return Err(ValidationError::InfiniteInterior {
                    index,
                    name: material.name.clone(),
                });
            }
            (false, Thickness::Finite(d)) => {
                if !(d.is_finite() && d > 0.0) {
                    return Err(ValidationError::NonPositiveThickness {
                        index,
                        name: material.name.clone(),
                        thickness: d,
                    });
                }
            }
        }
    }

    Ok(())
}
