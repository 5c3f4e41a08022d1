use std::fs;
use std::path::Path;

use nalgebra::{Unit, Vector3};
use serde::Deserialize;
use thiserror::Error;

use crate::gravity::GravityRemover;
use crate::quantize::{FixedPointQuantizer, QuantizeError, REFERENCE_BITS, REFERENCE_SCALE};
use crate::rotation::LowpassRotationRemoval;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Quantizer(#[from] QuantizeError),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Ventana de recorte `[start, end)` en muestras.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct TrimWindow {
    pub start: usize,
    pub end: usize,
}

/// Configuración del pipeline de análisis, cargada de un JSON.
///
/// Cualquier campo ausente toma el valor de la configuración de
/// referencia.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub quantizer_scale: f64,
    pub quantizer_bits: u8,
    /// Eje del marco global sobre el que se asume la gravedad
    pub gravity_axis: [f64; 3],
    pub sensor_trim: Option<TrimWindow>,
    pub mocap_trim: Option<TrimWindow>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quantizer_scale: REFERENCE_SCALE,
            quantizer_bits: REFERENCE_BITS,
            gravity_axis: [1.0, 0.0, 0.0],
            sensor_trim: None,
            mocap_trim: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Construye el eliminador de gravedad descrito por esta configuración.
    pub fn gravity_remover(
        &self,
    ) -> Result<GravityRemover<FixedPointQuantizer, LowpassRotationRemoval>, ConfigError> {
        let quantizer = FixedPointQuantizer::new(self.quantizer_scale, self.quantizer_bits)?;
        let axis = Unit::try_new(Vector3::from(self.gravity_axis), 1.0e-9)
            .ok_or_else(|| ConfigError::Invalid("gravity_axis must be non-zero".into()))?;

        Ok(GravityRemover::new(quantizer, LowpassRotationRemoval::default())
            .with_gravity_axis(axis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_reference_config() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.quantizer_scale, REFERENCE_SCALE);
        assert_eq!(config.quantizer_bits, REFERENCE_BITS);
        assert_eq!(config.gravity_axis, [1.0, 0.0, 0.0]);
        assert!(config.sensor_trim.is_none());
    }

    #[test]
    fn full_json_is_parsed() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{
                "quantizer_scale": 0.25,
                "quantizer_bits": 10,
                "gravity_axis": [0.0, 0.0, 1.0],
                "sensor_trim": { "start": 100, "end": 900 },
                "mocap_trim": { "start": 150, "end": 1350 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.quantizer_scale, 0.25);
        assert_eq!(config.quantizer_bits, 10);
        assert_eq!(config.gravity_axis, [0.0, 0.0, 1.0]);
        assert_eq!(
            config.sensor_trim,
            Some(TrimWindow {
                start: 100,
                end: 900,
            })
        );
    }

    #[test]
    fn from_file_reads_json() {
        let path = std::env::temp_dir().join(format!(
            "ingravido_{}_config.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "quantizer_bits": 6 }"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.quantizer_bits, 6);
        assert_eq!(config.quantizer_scale, REFERENCE_SCALE);
    }

    #[test]
    fn zero_gravity_axis_is_rejected() {
        let config = PipelineConfig {
            gravity_axis: [0.0, 0.0, 0.0],
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.gravity_remover().unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn reference_config_builds_a_remover() {
        assert!(PipelineConfig::default().gravity_remover().is_ok());
    }
}
