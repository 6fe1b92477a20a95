//! Dispersion models for the complex refractive index of a material.
//!
//! Every material carries exactly one [`DispersionModel`]. The payload of each
//! variant can only be built through a validating constructor, so the engine
//! never sees an inconsistent model.

use itertools::Itertools;
use nalgebra::Complex;
use ndarray::Array1;
use ndarray_interp::interp1d::{Interp1DBuilder, Linear};

use crate::error::{NumericError, ValidationError};
use crate::formula::Formula;

#[cfg(test)]
mod tests {
    use super::*;

    const BK7_B: [f64; 3] = [1.03961212, 0.231792344, 1.01046945];
    const BK7_C: [f64; 3] = [0.00600069867, 0.0200179144, 103.560653];

    #[test]
    fn fixed_returns_stored_constant() {
        let n = Complex::new(1.38, 0.012);
        let model = DispersionModel::Fixed(n);
        for wavelength in [13.5e-9, 550e-9, 1.55e-6, 10e-6] {
            assert_eq!(model.index(wavelength).unwrap(), n);
        }
    }

    #[test]
    fn sellmeier_bk7_d_line() {
        let model = DispersionModel::Sellmeier(
            Sellmeier::new(0.0, BK7_B.to_vec(), BK7_C.to_vec()).unwrap(),
        );
        let n = model.index(587.56e-9).unwrap();
        assert!((n.re - 1.5168).abs() < 1e-4, "n: {}", n);
        assert!(n.im.abs() < 1e-12);
    }

    #[test]
    fn sellmeier_constant_term() {
        // n^2 = 1 + A with no resonances
        let model = DispersionModel::Sellmeier(Sellmeier::new(1.25, vec![], vec![]).unwrap());
        let n = model.index(500e-9).unwrap();
        assert!((n.re - 1.5).abs() < 1e-12);
    }

    #[test]
    fn sellmeier_pole_is_an_error() {
        // C = 0.25 um^2 resonates at 0.5 um
        let sellmeier = Sellmeier::new(0.0, vec![1.0], vec![0.25]).unwrap();
        let model = DispersionModel::Sellmeier(sellmeier);
        assert!(matches!(
            model.index(500e-9),
            Err(NumericError::SellmeierPole { .. })
        ));
    }

    #[test]
    fn sellmeier_validation() {
        assert_eq!(
            Sellmeier::new(0.0, vec![1.0, 2.0], vec![0.1]),
            Err(ValidationError::SellmeierLengthMismatch { b: 2, c: 1 })
        );
        assert_eq!(
            Sellmeier::new(0.0, vec![1.0], vec![-0.1]),
            Err(ValidationError::SellmeierResonance {
                index: 0,
                value: -0.1
            })
        );
        assert!(Sellmeier::new(0.0, vec![1.0], vec![0.0]).is_err());
        assert!(Sellmeier::new(f64::NAN, vec![1.0], vec![0.1]).is_err());
        assert!(Sellmeier::new(0.0, vec![f64::INFINITY], vec![0.1]).is_err());
    }

    #[test]
    fn table_interpolates_linearly() {
        let table = IndexTable::new(
            vec![400e-9, 500e-9, 600e-9],
            vec![1.5, 1.6, 1.8],
            vec![0.0, 0.1, 0.3],
        )
        .unwrap();
        let model = DispersionModel::Table(table);

        let n = model.index(450e-9).unwrap();
        assert!((n.re - 1.55).abs() < 1e-12, "n: {}", n);
        assert!((n.im - 0.05).abs() < 1e-12, "n: {}", n);

        let n = model.index(575e-9).unwrap();
        assert!((n.re - 1.75).abs() < 1e-12, "n: {}", n);
        assert!((n.im - 0.25).abs() < 1e-12, "n: {}", n);

        // exact samples
        let n = model.index(500e-9).unwrap();
        assert!((n - Complex::new(1.6, 0.1)).norm() < 1e-12);
    }

    #[test]
    fn table_clamps_outside_range() {
        let table = IndexTable::new(vec![400e-9, 600e-9], vec![1.5, 1.7], vec![0.01, 0.02]).unwrap();
        let model = DispersionModel::Table(table);
        assert_eq!(model.index(200e-9).unwrap(), Complex::new(1.5, 0.01));
        assert_eq!(model.index(2e-6).unwrap(), Complex::new(1.7, 0.02));
    }

    #[test]
    fn single_sample_table_is_constant() {
        let table = IndexTable::new(vec![500e-9], vec![2.0], vec![0.5]).unwrap();
        let model = DispersionModel::Table(table);
        assert_eq!(model.index(100e-9).unwrap(), Complex::new(2.0, 0.5));
        assert_eq!(model.index(900e-9).unwrap(), Complex::new(2.0, 0.5));
    }

    #[test]
    fn table_validation() {
        assert_eq!(
            IndexTable::new(vec![], vec![], vec![]),
            Err(ValidationError::EmptyTable)
        );
        assert!(matches!(
            IndexTable::new(vec![400e-9, 500e-9], vec![1.5], vec![0.0, 0.0]),
            Err(ValidationError::TableLengthMismatch { .. })
        ));
        assert_eq!(
            IndexTable::new(vec![500e-9, 500e-9], vec![1.5, 1.5], vec![0.0, 0.0]),
            Err(ValidationError::TableNotIncreasing { index: 1 })
        );
        assert_eq!(
            IndexTable::new(vec![-1e-9, 500e-9], vec![1.5, 1.5], vec![0.0, 0.0]),
            Err(ValidationError::TableNotIncreasing { index: 0 })
        );
        assert_eq!(
            IndexTable::new(vec![400e-9, 500e-9], vec![1.5, f64::NAN], vec![0.0, 0.0]),
            Err(ValidationError::NonFiniteTableValue { index: 1 })
        );
    }

    #[test]
    fn formula_uses_micrometers() {
        let model = DispersionModel::Formula(Formula::parse("1 + x").unwrap());
        let n = model.index(500e-9).unwrap();
        assert!((n.re - 1.5).abs() < 1e-12);
    }

    #[test]
    fn non_finite_formula_is_numeric_error() {
        let model = DispersionModel::Formula(Formula::parse("1 / (x - x)").unwrap());
        assert!(matches!(
            model.index(500e-9),
            Err(NumericError::NonFiniteIndex { .. })
        ));
    }
}

/// Relative distance of `w2` from a Sellmeier resonance treated as a pole.
pub const POLE_TOLERANCE: f64 = 1e-12;

/// Wavelength conversion factor from meters to micrometers.
const METERS_TO_MICROMETERS: f64 = 1e6;

/// How a material's complex refractive index depends on wavelength.
#[derive(Debug, Clone, PartialEq)]
pub enum DispersionModel {
    /// Constant index, independent of wavelength.
    Fixed(Complex<f64>),
    Sellmeier(Sellmeier),
    /// User formula in the wavelength `x` (micrometers).
    Formula(Formula),
    /// Measured n and k samples.
    Table(IndexTable),
}

impl DispersionModel {
    /// Returns the complex index `n + ik` at the vacuum wavelength in meters.
    pub fn index(&self, wavelength: f64) -> Result<Complex<f64>, NumericError> {
        let n = match self {
            DispersionModel::Fixed(n) => *n,
            DispersionModel::Sellmeier(sellmeier) => sellmeier.index(wavelength)?,
            DispersionModel::Formula(formula) => {
                formula.eval(wavelength * METERS_TO_MICROMETERS)
            }
            DispersionModel::Table(table) => table.index(wavelength)?,
        };

        if n.is_finite() {
            Ok(n)
        } else {
            Err(NumericError::NonFiniteIndex { wavelength })
        }
    }

    /// Short label for the model variant.
    pub fn kind(&self) -> &'static str {
        match self {
            DispersionModel::Fixed(_) => "fixed",
            DispersionModel::Sellmeier(_) => "sellmeier",
            DispersionModel::Formula(_) => "formula",
            DispersionModel::Table(_) => "table",
        }
    }
}

/// Sellmeier equation `n^2 = 1 + A + sum(B_i w^2 / (w^2 - C_i))` with `w` in
/// micrometers and `C_i` in square micrometers.
#[derive(Debug, Clone, PartialEq)]
pub struct Sellmeier {
    a: f64,
    b: Vec<f64>,
    c: Vec<f64>,
}

impl Sellmeier {
    pub fn new(a: f64, b: Vec<f64>, c: Vec<f64>) -> Result<Self, ValidationError> {
        if b.len() != c.len() {
            return Err(ValidationError::SellmeierLengthMismatch {
                b: b.len(),
                c: c.len(),
            });
        }
        if !a.is_finite() {
            return Err(ValidationError::NonFiniteCoefficient { name: "A", value: a });
        }
        if let Some(&value) = b.iter().find(|value| !value.is_finite()) {
            return Err(ValidationError::NonFiniteCoefficient { name: "B", value });
        }
        if let Some((index, &value)) = c
            .iter()
            .enumerate()
            .find(|(_, value)| !(value.is_finite() && **value > 0.0))
        {
            return Err(ValidationError::SellmeierResonance { index, value });
        }
        Ok(Self { a, b, c })
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn c(&self) -> &[f64] {
        &self.c
    }

    fn index(&self, wavelength: f64) -> Result<Complex<f64>, NumericError> {
        let wavelength_um = wavelength * METERS_TO_MICROMETERS;
        let w2 = wavelength_um * wavelength_um;

        let mut n2 = 1.0 + self.a;
        for (&b, &c) in self.b.iter().zip(&self.c) {
            let denom = w2 - c;
            if denom.abs() <= POLE_TOLERANCE * c {
                return Err(NumericError::SellmeierPole {
                    wavelength_um,
                    coefficient: c,
                });
            }
            n2 += b * w2 / denom;
        }

        Ok(Complex::new(n2, 0.0).sqrt())
    }
}

/// Tabulated `n(λ)` and `k(λ)`, linearly interpolated and clamped at the ends.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTable {
    wavelengths: Array1<f64>,
    n: Array1<f64>,
    k: Array1<f64>,
}

impl IndexTable {
    /// Creates a table from wavelengths in meters and the matching n and k.
    pub fn new(wavelengths: Vec<f64>, n: Vec<f64>, k: Vec<f64>) -> Result<Self, ValidationError> {
        if wavelengths.is_empty() {
            return Err(ValidationError::EmptyTable);
        }
        if wavelengths.len() != n.len() || wavelengths.len() != k.len() {
            return Err(ValidationError::TableLengthMismatch {
                wavelengths: wavelengths.len(),
                n: n.len(),
                k: k.len(),
            });
        }
        if !(wavelengths[0].is_finite() && wavelengths[0] > 0.0) {
            return Err(ValidationError::TableNotIncreasing { index: 0 });
        }
        if let Some((index, _)) = wavelengths
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (prev, next))| !(next.is_finite() && next > prev))
        {
            return Err(ValidationError::TableNotIncreasing { index: index + 1 });
        }
        if let Some(index) = n
            .iter()
            .zip(&k)
            .position(|(n, k)| !(n.is_finite() && k.is_finite()))
        {
            return Err(ValidationError::NonFiniteTableValue { index });
        }

        Ok(Self {
            wavelengths: Array1::from(wavelengths),
            n: Array1::from(n),
            k: Array1::from(k),
        })
    }

    pub fn wavelengths(&self) -> &Array1<f64> {
        &self.wavelengths
    }

    pub fn n(&self) -> &Array1<f64> {
        &self.n
    }

    pub fn k(&self) -> &Array1<f64> {
        &self.k
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    fn index(&self, wavelength: f64) -> Result<Complex<f64>, NumericError> {
        // no extrapolation beyond the measured range
        let last = self.len() - 1;
        if wavelength <= self.wavelengths[0] {
            return Ok(Complex::new(self.n[0], self.k[0]));
        }
        if wavelength >= self.wavelengths[last] {
            return Ok(Complex::new(self.n[last], self.k[last]));
        }

        let n = self.interpolate(&self.n, wavelength)?;
        let k = self.interpolate(&self.k, wavelength)?;
        Ok(Complex::new(n, k))
    }

    fn interpolate(&self, values: &Array1<f64>, lambda: f64) -> Result<f64, NumericError> {
        let interp = Interp1DBuilder::new(values.view())
            .x(self.wavelengths.view())
            .strategy(Linear::new())
            .build()
            .map_err(|err| NumericError::Interpolation(format!("{:?}", err)))?;
        interp
            .interp_scalar(lambda)
            .map_err(|err| NumericError::Interpolation(format!("{:?}", err)))
    }
}
