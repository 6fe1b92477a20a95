//! Characteristic (transfer) matrix of a multilayer stack.
//!
//! The stack matrix is the ordered product, from the incidence side, of one
//! interface matrix `D` per interface and one propagation matrix `P` per
//! finite layer:
//!
//! ```text
//! M = D(0,1) P(1) D(1,2) P(2) ... D(N-1,N)
//! ```
//!
//! with `D = 1/t [[1, r], [r, 1]]` and `P = diag(exp(-iβ), exp(iβ))`,
//! `β = 2π/λ · n · cos θ · d`. The refracted angle of every interface is the
//! incident angle of the next one.

use std::f64::consts::PI;

use nalgebra::{Complex, Matrix2};

use crate::error::NumericError;
use crate::fresnel;
use crate::material::{LayerStack, Thickness};
use crate::sweep::Polarization;


/// Transfer matrix of a stack, with the complex angle in every medium.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub matrix: Matrix2<Complex<f64>>,
    /// `angles[0]` is the angle of incidence, `angles[i]` the angle in medium `i`.
    pub angles: Vec<Complex<f64>>,
}

/// Builds the 2×2 characteristic matrix of `stack` at the vacuum wavelength
/// `wavelength` (meters) and angle of incidence `theta0` (radians).
pub fn build_matrix(
    stack: &LayerStack,
    wavelength: f64,
    polarization: Polarization,
    theta0: f64,
) -> Result<Matrix2<Complex<f64>>, NumericError> {
    trace(stack, wavelength, polarization, theta0).map(|trace| trace.matrix)
}

/// Like [`build_matrix`], also returning the chained angle in every medium.
pub fn trace(
    stack: &LayerStack,
    wavelength: f64,
    polarization: Polarization,
    theta0: f64,
) -> Result<Trace, NumericError> {
    let materials = stack.materials();
    let mut matrix = Matrix2::<Complex<f64>>::identity();
    let mut angles = Vec::with_capacity(materials.len());
    angles.push(Complex::new(theta0, 0.0));

    let mut n1 = materials[0].index(wavelength)?;
    let mut theta = angles[0];
    for (i, next) in materials.iter().enumerate().skip(1) {
        let n2 = next.index(wavelength)?;
        let f = fresnel::interface(n1, n2, theta, polarization, i - 1)?;
        theta = f.theta_t;
        angles.push(theta);

        matrix *= interface_matrix(f.r, f.t);
        if let Thickness::Finite(d) = next.thickness {
            matrix *= propagation_matrix(wavelength, n2, theta, d);
        }
        n1 = n2;
    }

    if matrix.iter().all(|z| z.is_finite()) {
        Ok(Trace { matrix, angles })
    } else {
        Err(NumericError::NonFiniteMatrix)
    }
}

/// Interface (dynamical) matrix `1/t [[1, r], [r, 1]]`.
pub fn interface_matrix(r: Complex<f64>, t: Complex<f64>) -> Matrix2<Complex<f64>> {
    let one = Complex::new(1.0, 0.0);
    Matrix2::new(one, r, r, one) / t
}

/// Propagation (phase) matrix `diag(exp(-iβ), exp(iβ))` of a layer of
/// thickness `d` meters.
pub fn propagation_matrix(
    wavelength: f64,
    n: Complex<f64>,
    theta: Complex<f64>,
    d: f64,
) -> Matrix2<Complex<f64>> {
    let k0 = 2.0 * PI / wavelength;
    let beta = k0 * n * theta.cos() * d;
    let i = Complex::new(0.0, 1.0);
    let zero = Complex::new(0.0, 0.0);
    Matrix2::new((-i * beta).exp(), zero, zero, (i * beta).exp())
}
