use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sweep::{Polarization, SweepAxis};

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum() -> Spectrum {
        Spectrum {
            axis: SweepAxis::Wavelength,
            abscissa: vec![400e-9, 500e-9, 600e-9, 700e-9],
            reflectance: vec![0.04, 0.01, 0.002, 0.03],
            polarization: Polarization::TE,
        }
    }

    #[test]
    fn extrema() {
        let spectrum = spectrum();
        assert_eq!(spectrum.minimum(), Some((600e-9, 0.002)));
        assert_eq!(spectrum.maximum(), Some((400e-9, 0.04)));
        assert!((spectrum.mean().unwrap() - 0.0205).abs() < 1e-12);
    }

    #[test]
    fn empty_spectrum_has_no_extrema() {
        let spectrum = Spectrum {
            abscissa: vec![],
            reflectance: vec![],
            ..spectrum()
        };
        assert!(spectrum.is_empty());
        assert_eq!(spectrum.minimum(), None);
        assert_eq!(spectrum.mean(), None);
    }

    #[test]
    fn display_units() {
        let spectrum = spectrum();
        assert!((spectrum.abscissa_display()[1] - 500.0).abs() < 1e-9);
        let angles = Spectrum {
            axis: SweepAxis::Angle,
            abscissa: vec![std::f64::consts::FRAC_PI_4],
            reflectance: vec![0.1],
            ..spectrum
        };
        assert!((angles.abscissa_display()[0] - 45.0).abs() < 1e-9);
        assert_eq!(angles.unit(), "deg");
    }
}

/// Reflectance values aligned one-to-one with the samples of a sweep.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    /// The independent variable.
    pub axis: SweepAxis,
    /// Wavelengths in meters or angles of incidence in radians.
    pub abscissa: Vec<f64>,
    pub reflectance: Vec<f64>,
    pub polarization: Polarization,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.reflectance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reflectance.is_empty()
    }

    /// `(abscissa, reflectance)` pairs in sweep order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.abscissa
            .iter()
            .copied()
            .zip(self.reflectance.iter().copied())
    }

    /// Sample with the lowest reflectance.
    pub fn minimum(&self) -> Option<(f64, f64)> {
        self.points().min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Sample with the highest reflectance.
    pub fn maximum(&self) -> Option<(f64, f64)> {
        self.points().max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.reflectance.iter().sum::<f64>() / self.len() as f64)
        }
    }

    /// Unit of [`Spectrum::abscissa_display`].
    pub fn unit(&self) -> &'static str {
        match self.axis {
            SweepAxis::Wavelength => "nm",
            SweepAxis::Angle => "deg",
        }
    }

    /// Abscissa in nanometers or degrees.
    pub fn abscissa_display(&self) -> Vec<f64> {
        self.abscissa
            .iter()
            .map(|v| match self.axis {
                SweepAxis::Wavelength => v * 1e9,
                SweepAxis::Angle => v.to_degrees(),
            })
            .collect()
    }

    /// Logs a short summary of the spectrum.
    pub fn print(&self) {
        let to_display = |v: f64| match self.axis {
            SweepAxis::Wavelength => v * 1e9,
            SweepAxis::Angle => v.to_degrees(),
        };
        let unit = self.unit();
        info!("{} samples over {} ({})", self.len(), self.axis, self.polarization);
        if let Some((x, r)) = self.minimum() {
            info!("minimum R = {:.6} at {:.3} {}", r, to_display(x), unit);
        }
        if let Some((x, r)) = self.maximum() {
            info!("maximum R = {:.6} at {:.3} {}", r, to_display(x), unit);
        }
        if let Some(mean) = self.mean() {
            info!("mean R = {:.6}", mean);
        }
        if let Some((first, last)) = self.abscissa.first().zip(self.abscissa.last()) {
            info!(
                "range {} {}",
                [to_display(*first), to_display(*last)]
                    .iter()
                    .map(|v| format!("{:.3}", v))
                    .join(" to "),
                unit
            );
        }
    }
}
