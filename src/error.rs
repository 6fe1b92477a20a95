//! Error taxonomy for the reflectance engine.
//!
//! Input problems are reported as [`ValidationError`] before any numeric work
//! starts, problems that only appear while evaluating a sample are reported as
//! [`NumericError`], and malformed formula materials are reported as
//! [`ExpressionError`]. The engine entry points return the umbrella [`Error`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure surfaced by the engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A sweep aborted at the given sample.
    #[error("sample {index} failed: {source}")]
    Sample {
        index: usize,
        #[source]
        source: NumericError,
    },
}

/// Malformed input, detected before evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("a layer stack needs at least 2 materials, got {len}")]
    StackTooShort { len: usize },

    #[error("material {index} ('{name}') bounds the stack and must have infinite thickness")]
    FiniteBoundary { index: usize, name: String },

    #[error("interior material {index} ('{name}') must have finite thickness")]
    InfiniteInterior { index: usize, name: String },

    #[error("interior material {index} ('{name}') has invalid thickness {thickness} m")]
    NonPositiveThickness {
        index: usize,
        name: String,
        thickness: f64,
    },

    #[error("layer index {index} is not an interior layer of a stack of {len}")]
    NotInterior { index: usize, len: usize },

    #[error("Sellmeier B and C lists have different lengths ({b} and {c})")]
    SellmeierLengthMismatch { b: usize, c: usize },

    #[error("Sellmeier coefficient C[{index}] = {value} must be positive and finite")]
    SellmeierResonance { index: usize, value: f64 },

    #[error("coefficient {name} = {value} is not finite")]
    NonFiniteCoefficient { name: &'static str, value: f64 },

    #[error("index table is empty")]
    EmptyTable,

    #[error("index table columns have different lengths (wavelengths {wavelengths}, n {n}, k {k})")]
    TableLengthMismatch { wavelengths: usize, n: usize, k: usize },

    #[error("index table wavelengths must be positive and strictly increasing (at sample {index})")]
    TableNotIncreasing { index: usize },

    #[error("index table value at sample {index} is not finite")]
    NonFiniteTableValue { index: usize },

    #[error("wavelength {0} m is outside the domain (0, inf)")]
    WavelengthOutOfDomain(f64),

    #[error("angle of incidence {0} rad is outside the domain [0, pi/2)")]
    AngleOutOfDomain(f64),

    #[error("wavelength and angle cannot both be ranged")]
    BothAxesRanged,

    #[error("sweep axis has no samples")]
    EmptyAxis,

    #[error("unrecognized polarization '{0}', expected TE/s or TM/p")]
    UnknownPolarization(String),

    #[error("unrecognized dispersion model type {0}")]
    UnknownModelType(i64),

    #[error("could not parse complex refractive index '{0}'")]
    InvalidComplex(String),

    #[error("invalid thickness field '{0}'")]
    InvalidThickness(String),

    #[error("material '{0}' is not in the catalog")]
    UnknownMaterial(String),
}

/// Failure while evaluating a single sample.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericError {
    #[error("Sellmeier pole at {wavelength_um} um (C = {coefficient})")]
    SellmeierPole { wavelength_um: f64, coefficient: f64 },

    #[error("refractive index is not finite at {wavelength} m")]
    NonFiniteIndex { wavelength: f64 },

    #[error("degenerate interface between media {index} and {next}")]
    DegenerateInterface { index: usize, next: usize },

    #[error("transfer matrix is not finite")]
    NonFiniteMatrix,

    #[error("transfer matrix has a zero leading element")]
    DegenerateMatrix,

    #[error("reflectance {0} is outside [0, 1]")]
    ReflectanceOutOfRange(f64),

    #[error("index table interpolation failed: {0}")]
    Interpolation(String),
}

/// Malformed formula material.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("malformed number '{0}'")]
    InvalidNumber(String),

    #[error("symbol '{0}' is not allowed")]
    DisallowedSymbol(String),

    #[error("unexpected {found} at position {pos}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("formula ends unexpectedly")]
    UnexpectedEnd,

    #[error("formula does not reference the wavelength variable 'x'")]
    MissingVariable,

    #[error("formula has {tokens} tokens, at most {limit} are allowed")]
    TooLong { tokens: usize, limit: usize },

    #[error("formula nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}
