//! JSON material catalog.
//!
//! The catalog is the persisted form of a material library: a list of records
//! with the fields `name, d, n_type, A, B, C, n, formula, table`. Thicknesses
//! are stored in nanometers, complex indices as Python-style strings such as
//! `"(1.38+0j)"`, and table rows as `[wavelength_nm, n, k]`.
//!
//! Records are converted to validated [`Material`]s at this boundary. Building
//! a material never writes back into the catalog.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dispersion::{DispersionModel, IndexTable, Sellmeier};
use crate::error::{self, ValidationError};
use crate::formula::Formula;
use crate::material::{LayerStack, Material, Thickness};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ExpressionError};

    const CATALOG: &str = r#"[
        {"name": "Air", "d": "inf", "n_type": 0, "n": "(1+0j)"},
        {"name": "MgF2", "d": 102, "n_type": 0, "n": "(1.38+0j)"},
        {"name": "Mo", "d": 3.65, "n_type": 0, "n": "(0.923956+0.00641j)"},
        {"name": "BK7", "d": null, "n_type": 1, "A": 0.0,
         "B": [1.03961212, 0.231792344, 1.01046945],
         "C": [0.00600069867, 0.0200179144, 103.560653]},
        {"name": "Cauchy", "d": 50, "n_type": 2, "formula": "1.5 + 0.004 / x^2"},
        {"name": "Measured", "d": 80, "n_type": 3,
         "table": [[400, 2.0, 0.1], [600, 1.8, 0.0], [800, 1.7, 0.0]]},
        {"name": "Glass", "d": "Infinity", "n_type": 0, "n": "(1.52+0j)"}
    ]"#;

    fn catalog() -> Catalog {
        Catalog::from_json(CATALOG).unwrap()
    }

    #[test]
    fn parses_all_model_types() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 7);

        let mgf2 = catalog.material("MgF2", None).unwrap();
        assert_eq!(mgf2.thickness, Thickness::Finite(102.0 * NANOMETERS));
        assert_eq!(mgf2.model, DispersionModel::Fixed(Complex::new(1.38, 0.0)));

        let mo = catalog.material("Mo", None).unwrap();
        assert_eq!(mo.model, DispersionModel::Fixed(Complex::new(0.923956, 0.00641)));

        assert_eq!(catalog.material("Air", None).unwrap().thickness, Thickness::Infinite);
        assert_eq!(catalog.material("BK7", None).unwrap().thickness, Thickness::Infinite);
        assert_eq!(catalog.material("Glass", None).unwrap().thickness, Thickness::Infinite);
        assert_eq!(catalog.material("BK7", None).unwrap().model.kind(), "sellmeier");
        assert_eq!(catalog.material("Cauchy", None).unwrap().model.kind(), "formula");

        let measured = catalog.material("Measured", None).unwrap();
        let n = measured.index(500e-9).unwrap();
        assert!((n.re - 1.9).abs() < 1e-12 && (n.im - 0.05).abs() < 1e-12, "n: {}", n);
    }

    #[test]
    fn thickness_override_is_private() {
        let catalog = catalog();
        let thick = catalog.material("MgF2", Some(250e-9)).unwrap();
        assert_eq!(thick.thickness, Thickness::Finite(250e-9));
        assert_eq!(catalog.get("MgF2").unwrap().d, Some(RawThickness::Nanometers(102.0)));
        assert_eq!(
            catalog.material("MgF2", None).unwrap().thickness,
            Thickness::Finite(102.0 * NANOMETERS)
        );
    }

    #[test]
    fn builds_stacks_from_layer_specs() {
        let catalog = catalog();
        let layers = vec![
            LayerSpec::new("Air", None),
            LayerSpec::new("MgF2", None),
            LayerSpec::new("BK7", Some(120.0)),
            LayerSpec::new("Glass", None),
        ];
        let stack = catalog.stack(&layers).unwrap();
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.materials()[2].thickness, Thickness::Finite(120.0 * NANOMETERS));

        // BK7 is stored as infinite, so it cannot be an interior layer as-is
        let layers = vec![
            LayerSpec::new("Air", None),
            LayerSpec::new("BK7", None),
            LayerSpec::new("Glass", None),
        ];
        assert!(matches!(
            catalog.stack(&layers),
            Err(Error::Validation(ValidationError::InfiniteInterior { index: 1, .. }))
        ));

        let layers = vec![LayerSpec::new("Air", None), LayerSpec::new("Unobtainium", None)];
        assert_eq!(
            catalog.stack(&layers),
            Err(Error::Validation(ValidationError::UnknownMaterial(
                "Unobtainium".to_string()
            )))
        );
    }

    #[test]
    fn rejects_inconsistent_records() {
        let cases = [
            (
                r#"[{"name": "X", "d": 10, "n_type": 7, "n": "(1+0j)"}]"#,
                Error::Validation(ValidationError::UnknownModelType(7)),
            ),
            (
                r#"[{"name": "X", "d": 10, "n_type": 1, "A": 0, "B": [1, 2], "C": [0.1]}]"#,
                Error::Validation(ValidationError::SellmeierLengthMismatch { b: 2, c: 1 }),
            ),
            (
                r#"[{"name": "X", "d": 10, "n_type": 3, "table": []}]"#,
                Error::Validation(ValidationError::EmptyTable),
            ),
            (
                r#"[{"name": "X", "d": 10, "n_type": 0, "n": "(1.3+abcj)"}]"#,
                Error::Validation(ValidationError::InvalidComplex("(1.3+abcj)".to_string())),
            ),
            (
                r#"[{"name": "X", "d": 10, "n_type": 2, "formula": ""}]"#,
                Error::Expression(ExpressionError::Empty),
            ),
            (
                r#"[{"name": "X", "d": "thick", "n_type": 0, "n": "1.5"}]"#,
                Error::Validation(ValidationError::InvalidThickness("thick".to_string())),
            ),
        ];
        for (json, expected) in cases {
            let records: Vec<MaterialRecord> = serde_json::from_str(json).unwrap();
            assert_eq!(records[0].to_material(), Err(expected), "json: {}", json);
        }
        assert!(Catalog::from_json(r#"[{"name": "X", "d": 1, "n_type": 9}]"#).is_err());
    }

    #[test]
    fn parses_python_complex_strings() {
        assert_eq!(parse_complex("(1.38+0j)"), Ok(Complex::new(1.38, 0.0)));
        assert_eq!(parse_complex("1.5"), Ok(Complex::new(1.5, 0.0)));
        assert_eq!(parse_complex("(1-0.5j)"), Ok(Complex::new(1.0, -0.5)));
        assert_eq!(parse_complex(" (2+1e-05j) "), Ok(Complex::new(2.0, 1e-5)));
        assert!(parse_complex("").is_err());
        assert!(parse_complex("one").is_err());
        assert_eq!(format_complex(Complex::new(1.38, 0.0)), "(1.38+0j)");
        assert_eq!(format_complex(Complex::new(1.0, -0.0064)), "(1-0.0064j)");
    }

    fn assert_same_material(a: &Material, b: &Material) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.model.kind(), b.model.kind());
        match (a.thickness, b.thickness) {
            (Thickness::Finite(x), Thickness::Finite(y)) => {
                assert!((x - y).abs() < 1e-21, "{}: {} != {}", a.name, x, y)
            }
            (x, y) => assert_eq!(x, y),
        }
        for wavelength in [350e-9, 450e-9, 550e-9, 700e-9, 900e-9] {
            let (na, nb) = (a.index(wavelength).unwrap(), b.index(wavelength).unwrap());
            assert!((na - nb).norm() < 1e-12, "{}: {} != {}", a.name, na, nb);
        }
    }

    #[test]
    fn records_survive_export_and_import() {
        let catalog = catalog();
        for name in catalog.names() {
            let material = catalog.material(name, None).unwrap();
            let record = MaterialRecord::from_material(&material);
            assert_eq!(record.n_type, catalog.get(name).unwrap().n_type);
            let json = serde_json::to_string(&record).unwrap();
            let back: MaterialRecord = serde_json::from_str(&json).unwrap();
            assert_same_material(&back.to_material().unwrap(), &material);
        }
    }

    #[test]
    fn save_then_load() {
        let catalog = catalog();
        let path = std::env::temp_dir().join(format!("thinfilm-catalog-{}.json", std::process::id()));
        catalog.save(&path).unwrap();
        let loaded = Catalog::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.names().collect::<Vec<_>>(), catalog.names().collect::<Vec<_>>());
        for name in catalog.names() {
            assert_same_material(
                &loaded.material(name, None).unwrap(),
                &catalog.material(name, None).unwrap(),
            );
        }
    }

    #[test]
    fn insert_replaces_by_name() {
        let mut catalog = catalog();
        let material = Material::new(
            "MgF2",
            Thickness::Finite(90e-9),
            DispersionModel::Fixed(Complex::new(1.39, 0.0)),
        );
        catalog.insert(MaterialRecord::from_material(&material)).unwrap();
        assert_eq!(catalog.len(), 7);
        let n = catalog.material("MgF2", None).unwrap().index(550e-9).unwrap();
        assert_eq!(n, Complex::new(1.39, 0.0));

        let mut bad = MaterialRecord::from_material(&material);
        bad.name = "Broken".to_string();
        bad.n_type = 5;
        assert!(catalog.insert(bad).is_err());
        assert!(catalog.get("Broken").is_none());
    }
}

/// Catalog thicknesses are stored in nanometers.
pub const NANOMETERS: f64 = 1e-9;

/// The `d` field of a record: a number of nanometers or a text tag such as
/// `"inf"`. A missing or `null` field is infinite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawThickness {
    Nanometers(f64),
    Text(String),
}

/// One persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub name: String,
    #[serde(default)]
    pub d: Option<RawThickness>,
    /// 0 fixed, 1 Sellmeier, 2 formula, 3 table.
    pub n_type: i64,
    #[serde(rename = "A", default)]
    pub a: f64,
    #[serde(rename = "B", default)]
    pub b: Vec<f64>,
    #[serde(rename = "C", default)]
    pub c: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Rows of `[wavelength_nm, n, k]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table: Vec<[f64; 3]>,
}

impl MaterialRecord {
    /// Thickness stored in the record, in meters.
    pub fn thickness(&self) -> Result<Thickness, ValidationError> {
        match &self.d {
            None => Ok(Thickness::Infinite),
            Some(RawThickness::Nanometers(d)) => Ok(Thickness::Finite(d * NANOMETERS)),
            Some(RawThickness::Text(text)) => {
                let tag = text.trim().to_ascii_lowercase();
                if matches!(tag.as_str(), "inf" | "infinity" | "+inf") {
                    Ok(Thickness::Infinite)
                } else {
                    tag.parse::<f64>()
                        .map(|d| Thickness::Finite(d * NANOMETERS))
                        .map_err(|_| ValidationError::InvalidThickness(text.clone()))
                }
            }
        }
    }

    pub fn model(&self) -> error::Result<DispersionModel> {
        let model = match self.n_type {
            0 => {
                let n = self.n.as_deref().unwrap_or_default();
                DispersionModel::Fixed(parse_complex(n)?)
            }
            1 => DispersionModel::Sellmeier(Sellmeier::new(self.a, self.b.clone(), self.c.clone())?),
            2 => {
                let formula = self.formula.as_deref().unwrap_or_default();
                DispersionModel::Formula(Formula::parse(formula)?)
            }
            3 => {
                let wavelengths = self.table.iter().map(|row| row[0] * NANOMETERS).collect();
                let n = self.table.iter().map(|row| row[1]).collect();
                let k = self.table.iter().map(|row| row[2]).collect();
                DispersionModel::Table(IndexTable::new(wavelengths, n, k)?)
            }
            other => return Err(ValidationError::UnknownModelType(other).into()),
        };
        Ok(model)
    }

    pub fn to_material(&self) -> error::Result<Material> {
        Ok(Material::new(self.name.clone(), self.thickness()?, self.model()?))
    }

    /// Exports a material into the persisted record format.
    pub fn from_material(material: &Material) -> Self {
        let mut record = MaterialRecord {
            name: material.name.clone(),
            d: Some(match material.thickness {
                Thickness::Finite(d) => RawThickness::Nanometers(d / NANOMETERS),
                Thickness::Infinite => RawThickness::Text("inf".to_string()),
            }),
            n_type: 0,
            a: 0.0,
            b: Vec::new(),
            c: Vec::new(),
            n: None,
            formula: None,
            table: Vec::new(),
        };

        match &material.model {
            DispersionModel::Fixed(n) => {
                record.n = Some(format_complex(*n));
            }
            DispersionModel::Sellmeier(sellmeier) => {
                record.n_type = 1;
                record.a = sellmeier.a();
                record.b = sellmeier.b().to_vec();
                record.c = sellmeier.c().to_vec();
            }
            DispersionModel::Formula(formula) => {
                record.n_type = 2;
                record.formula = Some(formula.source().to_string());
            }
            DispersionModel::Table(table) => {
                record.n_type = 3;
                record.table = table
                    .wavelengths()
                    .iter()
                    .zip(table.n().iter())
                    .zip(table.k().iter())
                    .map(|((wl, n), k)| [wl / NANOMETERS, *n, *k])
                    .collect();
            }
        }
        record
    }
}

/// A layer requested from the catalog, with an optional thickness in
/// nanometers overriding the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub material: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness_nm: Option<f64>,
}

impl LayerSpec {
    pub fn new(material: impl Into<String>, thickness_nm: Option<f64>) -> Self {
        Self {
            material: material.into(),
            thickness_nm,
        }
    }
}

/// An ordered collection of material records, owned by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    records: Vec<MaterialRecord>,
}

impl Catalog {
    /// Builds a catalog, checking that every record converts to a material.
    pub fn new(records: Vec<MaterialRecord>) -> error::Result<Self> {
        for record in &records {
            record.to_material()?;
        }
        Ok(Self { records })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<MaterialRecord> =
            serde_json::from_str(json).context("failed to parse material catalog")?;
        Ok(Self::new(records)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open catalog {}", path.display()))?;
        let records: Vec<MaterialRecord> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        let catalog = Self::new(records)
            .with_context(|| format!("invalid record in catalog {}", path.display()))?;
        info!("loaded {} materials from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create catalog {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.records)
            .with_context(|| format!("failed to write catalog {}", path.display()))?;
        debug!("saved {} materials to {}", self.len(), path.display());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MaterialRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// Adds a record, replacing any record with the same name.
    pub fn insert(&mut self, record: MaterialRecord) -> error::Result<()> {
        record.to_material()?;
        match self.records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds a private material from the named record, optionally with a
    /// thickness in meters replacing the stored one.
    pub fn material(&self, name: &str, thickness: Option<f64>) -> error::Result<Material> {
        let record = self
            .get(name)
            .ok_or_else(|| ValidationError::UnknownMaterial(name.to_string()))?;
        let mut material = record.to_material()?;
        if let Some(d) = thickness {
            material.thickness = Thickness::Finite(d);
        }
        Ok(material)
    }

    /// Resolves a validated stack from layer requests, incidence side first.
    pub fn stack(&self, layers: &[LayerSpec]) -> error::Result<LayerStack> {
        let materials = layers
            .iter()
            .map(|layer| {
                self.material(
                    &layer.material,
                    layer.thickness_nm.map(|d| d * NANOMETERS),
                )
            })
            .collect::<error::Result<Vec<_>>>()?;
        Ok(LayerStack::new(materials)?)
    }
}

/// Parses a complex index written the way Python prints it, e.g. `"(1.38+0j)"`.
pub fn parse_complex(text: &str) -> Result<Complex<f64>, ValidationError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed)
        .trim();
    if inner.is_empty() {
        return Err(ValidationError::InvalidComplex(text.to_string()));
    }
    inner
        .parse::<Complex<f64>>()
        .map_err(|_| ValidationError::InvalidComplex(text.to_string()))
}

/// Formats a complex index the way Python prints it.
pub fn format_complex(n: Complex<f64>) -> String {
    format!("({}{:+}j)", n.re, n.im)
}
