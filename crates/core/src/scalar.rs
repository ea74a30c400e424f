//! Runtime scalar-type selection for Hamiltonian matrices.
//!
//! A Hamiltonian is stored with the narrowest numeric representation that can
//! hold it: real single precision unless something forces complex arithmetic
//! (a complex-valued modifier or a translational symmetry with its Bloch
//! phases), and double precision only when requested upstream.

use num_complex::{Complex32, Complex64};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// The closed set of matrix element representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    RealF32,
    ComplexF32,
    RealF64,
    ComplexF64,
}

impl ScalarKind {
    pub fn is_complex(self) -> bool {
        matches!(self, ScalarKind::ComplexF32 | ScalarKind::ComplexF64)
    }

    pub fn precision(self) -> Precision {
        match self {
            ScalarKind::RealF32 | ScalarKind::ComplexF32 => Precision::Single,
            ScalarKind::RealF64 | ScalarKind::ComplexF64 => Precision::Double,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::RealF32 => "real f32",
            ScalarKind::ComplexF32 => "complex f32",
            ScalarKind::RealF64 => "real f64",
            ScalarKind::ComplexF64 => "complex f64",
        }
    }
}

/// Requested floating-point width. Single precision is the default for the
/// matrix sizes this toolkit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    #[default]
    Single,
    Double,
}

/// Pick the narrowest sufficient scalar kind from the declared Hamiltonian
/// properties.
pub fn select_scalar(any_complex: bool, has_symmetry: bool, precision: Precision) -> ScalarKind {
    match (any_complex || has_symmetry, precision) {
        (false, Precision::Single) => ScalarKind::RealF32,
        (true, Precision::Single) => ScalarKind::ComplexF32,
        (false, Precision::Double) => ScalarKind::RealF64,
        (true, Precision::Double) => ScalarKind::ComplexF64,
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for num_complex::Complex32 {}
    impl Sealed for num_complex::Complex64 {}
}

/// Element type of a sparse Hamiltonian matrix.
///
/// Assembly happens in canonical `Complex64` arithmetic and is narrowed to
/// the selected kind at the end; `from_c64` is that narrowing step. The
/// scalar policy guarantees a real kind is only selected when every value is
/// real, so dropping the imaginary part there is exact.
pub trait Scalar:
    sealed::Sealed
    + Copy
    + PartialEq
    + Send
    + Sync
    + std::fmt::Debug
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + 'static
{
    type Real: Float + Send + Sync + std::fmt::Debug + 'static;

    const KIND: ScalarKind;

    fn zero() -> Self;
    fn from_c64(value: Complex64) -> Self;
    fn to_c64(self) -> Complex64;
    fn conj(self) -> Self;
    fn norm_sqr(self) -> f64;
    fn real_from_f64(value: f64) -> Self::Real;
    fn real_to_f64(value: Self::Real) -> f64;
}

impl Scalar for f32 {
    type Real = f32;

    const KIND: ScalarKind = ScalarKind::RealF32;

    fn zero() -> Self {
        0.0
    }

    fn from_c64(value: Complex64) -> Self {
        value.re as f32
    }

    fn to_c64(self) -> Complex64 {
        Complex64::new(f64::from(self), 0.0)
    }

    fn conj(self) -> Self {
        self
    }

    fn norm_sqr(self) -> f64 {
        f64::from(self * self)
    }

    fn real_from_f64(value: f64) -> f32 {
        value as f32
    }

    fn real_to_f64(value: f32) -> f64 {
        f64::from(value)
    }
}

impl Scalar for f64 {
    type Real = f64;

    const KIND: ScalarKind = ScalarKind::RealF64;

    fn zero() -> Self {
        0.0
    }

    fn from_c64(value: Complex64) -> Self {
        value.re
    }

    fn to_c64(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }

    fn conj(self) -> Self {
        self
    }

    fn norm_sqr(self) -> f64 {
        self * self
    }

    fn real_from_f64(value: f64) -> f64 {
        value
    }

    fn real_to_f64(value: f64) -> f64 {
        value
    }
}

impl Scalar for Complex32 {
    type Real = f32;

    const KIND: ScalarKind = ScalarKind::ComplexF32;

    fn zero() -> Self {
        Complex32::new(0.0, 0.0)
    }

    fn from_c64(value: Complex64) -> Self {
        Complex32::new(value.re as f32, value.im as f32)
    }

    fn to_c64(self) -> Complex64 {
        Complex64::new(f64::from(self.re), f64::from(self.im))
    }

    fn conj(self) -> Self {
        Complex32::new(self.re, -self.im)
    }

    fn norm_sqr(self) -> f64 {
        f64::from(self.re * self.re + self.im * self.im)
    }

    fn real_from_f64(value: f64) -> f32 {
        value as f32
    }

    fn real_to_f64(value: f32) -> f64 {
        f64::from(value)
    }
}

impl Scalar for Complex64 {
    type Real = f64;

    const KIND: ScalarKind = ScalarKind::ComplexF64;

    fn zero() -> Self {
        Complex64::new(0.0, 0.0)
    }

    fn from_c64(value: Complex64) -> Self {
        value
    }

    fn to_c64(self) -> Complex64 {
        self
    }

    fn conj(self) -> Self {
        Complex64::new(self.re, -self.im)
    }

    fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    fn real_from_f64(value: f64) -> f64 {
        value
    }

    fn real_to_f64(value: f64) -> f64 {
        value
    }
}
