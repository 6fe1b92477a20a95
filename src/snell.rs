//! Snell's law for complex refractive indices and complex angles.
//!
//! This module computes the refracted angle at a planar interface in complex
//! arithmetic. Absorbing media and total internal reflection both produce a
//! complex angle instead of a domain error, which is what the transfer-matrix
//! method needs to carry evanescent fields through a stack.
//!
//! The implementation provides:
//! - Complex arcsine refraction for arbitrary complex indices
//! - Selection of the forward-propagating solution
//! - Angle chaining through successive interfaces
//!
//! # Branch Choice
//!
//! `asin` has two solutions with the same sine, `θ` and `π - θ`. Only one of
//! them describes a wave travelling (or decaying) away from the interface, and
//! picking the wrong one makes finite layers amplify instead of attenuate.

use nalgebra::Complex;


/// Relative tolerance below which the imaginary part of `n cos θ` is treated
/// as zero when choosing the propagation direction.
const FORWARD_TOLERANCE: f64 = 1e-12;

/// Computes the transmitted angle using Snell's law for complex refractive indices.
///
/// **Context**: In a multilayer stack the angle leaving one interface is the
/// angle arriving at the next one. With absorbing layers or beyond the
/// critical angle these angles are complex, and a real-valued Snell's law
/// would fail with a domain error exactly where the physics is interesting.
///
/// **How it Works**: Evaluates `asin(n1/n2 · sin θ_i)` in complex arithmetic,
/// then keeps whichever of `θ` and `π - θ` propagates forward in the second
/// medium, i.e. has `Im(n2 cos θ) > 0` or, when that vanishes,
/// `Re(n2 cos θ) > 0`. For lossless media below the critical angle this is the
/// principal branch.
///
/// # Example
/// ```rust
/// use nalgebra::Complex;
/// use thinfilm::snell::get_theta_t;
///
/// let air = Complex::new(1.0, 0.0);
/// let glass = Complex::new(1.5, 0.0);
/// let theta_i = Complex::new(30f64.to_radians(), 0.0);
/// let theta_t = get_theta_t(theta_i, air, glass);
/// assert!((glass * theta_t.sin() - air * theta_i.sin()).norm() < 1e-12);
///
/// // chaining into the next medium keeps n sin θ invariant
/// let water = Complex::new(1.33, 0.0);
/// let next = get_theta_t(theta_t, glass, water);
/// assert!((water * next.sin() - air * theta_i.sin()).norm() < 1e-12);
/// ```
pub fn get_theta_t(theta_i: Complex<f64>, n1: Complex<f64>, n2: Complex<f64>) -> Complex<f64> {
    if n1 == n2 {
        return theta_i;
    }

    let theta_t = (n1 / n2 * theta_i.sin()).asin();

    if is_forward(n2, theta_t) {
        theta_t
    } else {
        Complex::new(std::f64::consts::PI, 0.0) - theta_t
    }
}

/// Whether a wave at complex angle `theta` in a medium of index `n` travels
/// away from the interface.
pub fn is_forward(n: Complex<f64>, theta: Complex<f64>) -> bool {
    let kz = n * theta.cos();
    if kz.im.abs() > FORWARD_TOLERANCE * kz.norm() {
        kz.im > 0.0
    } else {
        kz.re > 0.0
    }
}
