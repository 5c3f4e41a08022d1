use nalgebra::Vector3;
use thiserror::Error;

use crate::gravity::{CapabilityError, Quantizer};

/// Escala de la configuración de referencia
pub const REFERENCE_SCALE: f64 = 0.49;
/// Bits de la configuración de referencia
pub const REFERENCE_BITS: u8 = 8;

#[derive(Error, Debug, PartialEq)]
pub enum QuantizeError {
    #[error("scale must be a positive finite number, got {0}")]
    BadScale(f64),

    #[error("num_bits must be in 2..=31, got {0}")]
    BadBits(u8),
}

/// Cuantizador de punto fijo con signo: cada componente se lleva al nivel
/// entero más cercano dentro del rango `[-2^(b-1), 2^(b-1)-1]` y se recorta
/// al desbordar, nunca se envuelve.
#[derive(Debug, Clone, Copy)]
pub struct FixedPointQuantizer {
    scale: f64,
    num_bits: u8,
}

impl FixedPointQuantizer {
    pub fn new(scale: f64, num_bits: u8) -> Result<Self, QuantizeError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(QuantizeError::BadScale(scale));
        }
        if !(2..=31).contains(&num_bits) {
            return Err(QuantizeError::BadBits(num_bits));
        }
        Ok(Self { scale, num_bits })
    }

    /// Configuración de referencia: escala 0.49 sobre 8 bits.
    pub fn reference() -> Self {
        Self {
            scale: REFERENCE_SCALE,
            num_bits: REFERENCE_BITS,
        }
    }

    /// Nivel mínimo representable
    pub fn min_level(&self) -> i32 {
        -(1i32 << (self.num_bits - 1))
    }

    /// Nivel máximo representable
    pub fn max_level(&self) -> i32 {
        (1i32 << (self.num_bits - 1)) - 1
    }

    fn level(&self, x: f64) -> i32 {
        let full = (1i64 << (self.num_bits - 1)) as f64;
        let q = (x * self.scale * full).round();
        q.clamp(-full, full - 1.0) as i32
    }
}

impl Quantizer for FixedPointQuantizer {
    fn quantize(&self, samples: &[Vector3<f64>]) -> Result<Vec<Vector3<i32>>, CapabilityError> {
        Ok(samples
            .iter()
            .map(|v| v.map(|x| self.level(x)))
            .collect())
    }
}
