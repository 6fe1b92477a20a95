//! Fresnel equations for a single planar interface.
//!
//! This module implements the Fresnel amplitude coefficients that govern
//! reflection and transmission where two media meet. They are the building
//! block of the interface (dynamical) matrices of the transfer-matrix method.
//!
//! The Fresnel calculations provide:
//! - Reflection and transmission amplitudes for s (TE) and p (TM) polarization
//! - Complex refractive indices and complex angles
//! - The refracted angle, ready to be chained into the next interface
//!
//! # Physical Foundation
//!
//! Based on Maxwell's equations at material boundaries:
//! - Continuity of tangential electric field
//! - Continuity of tangential magnetic field

use nalgebra::Complex;

use crate::error::NumericError;
use crate::snell;
use crate::sweep::Polarization;

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-12;

    fn real(v: f64) -> Complex<f64> {
        Complex::new(v, 0.0)
    }

    #[test]
    fn normal_incidence_air_glass() {
        let n1 = real(1.0);
        let n2 = real(1.5);
        for polarization in [Polarization::TE, Polarization::TM] {
            let f = interface(n1, n2, real(0.0), polarization, 0).unwrap();
            // TM uses the n2 cos θ1 - n1 cos θ2 sign convention
            let expected_r = match polarization {
                Polarization::TE => -0.2,
                Polarization::TM => 0.2,
            };
            assert!((f.r.re - expected_r).abs() < TOL, "r: {}", f.r);
            assert!((f.t.re - 0.8).abs() < TOL, "t: {}", f.t);
            assert!(f.theta_t.norm() < TOL);
        }
    }

    #[test]
    fn matched_media_are_transparent() {
        let n = Complex::new(1.7, 0.02);
        for polarization in [Polarization::TE, Polarization::TM] {
            let f = interface(n, n, real(0.3), polarization, 0).unwrap();
            assert!(f.r.norm() < TOL);
            assert!((f.t - real(1.0)).norm() < TOL);
        }
    }

    #[test]
    fn brewster_angle_suppresses_tm() {
        let n1 = real(1.0);
        let n2 = real(1.5);
        let brewster = (1.5f64).atan();
        let tm = interface(n1, n2, real(brewster), Polarization::TM, 0).unwrap();
        assert!(tm.r.norm() < 1e-12, "r_p: {}", tm.r);
        let te = interface(n1, n2, real(brewster), Polarization::TE, 0).unwrap();
        assert!(te.r.norm() > 0.1, "r_s: {}", te.r);
    }

    #[test]
    fn energy_conservation_lossless() {
        // R + T = 1 with T = Re(n2 cos θ2) / Re(n1 cos θ1) |t|^2 for TE
        let n1 = real(1.0);
        let n2 = real(2.4);
        let theta_i = 50.0 * PI / 180.0;
        let f = interface(n1, n2, real(theta_i), Polarization::TE, 0).unwrap();
        let r = f.r.norm_sqr();
        let t = (n2 * f.theta_t.cos()).re / (n1 * real(theta_i).cos()).re * f.t.norm_sqr();
        assert!((r + t - 1.0).abs() < 1e-12, "R + T = {}", r + t);
    }

    #[test]
    fn total_internal_reflection() {
        let n1 = real(1.5);
        let n2 = real(1.0);
        for polarization in [Polarization::TE, Polarization::TM] {
            let f = interface(n1, n2, real(1.2), polarization, 0).unwrap();
            assert!((f.r.norm() - 1.0).abs() < 1e-12, "|r|: {}", f.r.norm());
        }
    }

    #[test]
    fn grazing_incidence_is_degenerate() {
        let result = interface(real(1.0), real(1.5), real(PI / 2.0), Polarization::TE, 3);
        assert_eq!(
            result,
            Err(NumericError::DegenerateInterface { index: 3, next: 4 })
        );
    }
}

/// Smallest transmission amplitude accepted before an interface is treated
/// as degenerate.
pub const DEGENERATE_TOLERANCE: f64 = 1e-15;

/// Fresnel amplitudes at one interface, and the refracted angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interface {
    pub r: Complex<f64>,
    pub t: Complex<f64>,
    pub theta_t: Complex<f64>,
}

/// Computes the Fresnel coefficients between medium `index` (refractive index
/// `n1`) and medium `index + 1` (refractive index `n2`).
///
/// **Context**: Each interface of a multilayer contributes an interface matrix
/// built from its reflection and transmission amplitudes. The incident angle
/// is complex in general, because it is the refracted angle of the previous
/// interface.
///
/// **How it Works**: Refracts the incident angle with [`snell::get_theta_t`]
/// and applies the s or p Fresnel formulas. A vanishing denominator or a
/// vanishing transmission amplitude means the interface matrix `D = 1/t · ...`
/// does not exist, and is reported instead of producing infinities.
///
/// # Example
/// ```rust
/// use nalgebra::Complex;
/// use thinfilm::fresnel;
/// use thinfilm::sweep::Polarization;
///
/// let air = Complex::new(1.0, 0.0);
/// let glass = Complex::new(1.5, 0.0);
/// let f = fresnel::interface(air, glass, Complex::new(0.0, 0.0), Polarization::TE, 0)?;
/// assert!((f.r.re + 0.2).abs() < 1e-12);
/// assert!((f.t.re - 0.8).abs() < 1e-12);
/// # Ok::<(), thinfilm::error::NumericError>(())
/// ```
pub fn interface(
    n1: Complex<f64>,
    n2: Complex<f64>,
    theta_i: Complex<f64>,
    polarization: Polarization,
    index: usize,
) -> Result<Interface, NumericError> {
    let theta_t = snell::get_theta_t(theta_i, n1, n2);
    let cti = theta_i.cos();
    let ctt = theta_t.cos();

    let (numer, denom) = match polarization {
        Polarization::TE => (n1 * cti - n2 * ctt, n1 * cti + n2 * ctt),
        Polarization::TM => (n2 * cti - n1 * ctt, n2 * cti + n1 * ctt),
    };
    let degenerate = NumericError::DegenerateInterface {
        index,
        next: index + 1,
    };
    if denom.norm() <= DEGENERATE_TOLERANCE {
        return Err(degenerate);
    }

    let r = numer / denom;
    let t = 2.0 * n1 * cti / denom;
    if !(r.is_finite() && t.is_finite()) || t.norm() <= DEGENERATE_TOLERANCE {
        return Err(degenerate);
    }

    Ok(Interface { r, t, theta_t })
}
