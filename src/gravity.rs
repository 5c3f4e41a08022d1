use nalgebra::{Unit, Vector3};
use thiserror::Error;

use crate::quantize::FixedPointQuantizer;
use crate::rotation::LowpassRotationRemoval;
use crate::types::{Channel, GravityFreeRecord, SensorRecord, GRAVITY_MS2};

/// Error opaco de una capacidad externa; se propaga sin modificar.
pub type CapabilityError = Box<dyn std::error::Error + Send + Sync>;

/// Capacidad de cuantización: lleva muestras continuas a niveles enteros de
/// punto fijo con signo, recortando (sin envolver) al desbordar el rango.
pub trait Quantizer {
    fn quantize(&self, samples: &[Vector3<f64>]) -> Result<Vec<Vector3<i32>>, CapabilityError>;
}

/// Capacidad de eliminación de rotación: re-expresa la traza cuantizada en
/// un marco global estabilizado contra la rotación del dispositivo. En ese
/// marco la gravedad queda sobre un eje fijo conocido.
///
/// Se trata como función pura de la secuencia de entrada: cualquier estado
/// interno de seguimiento nace y muere dentro de la llamada.
pub trait RotationRemoval {
    fn remove_rotation(
        &self,
        samples: &[Vector3<i32>],
    ) -> Result<Vec<Vector3<f64>>, CapabilityError>;
}

#[derive(Error, Debug)]
pub enum GravityError {
    #[error("record contains no samples")]
    EmptyRecord,

    #[error("non-finite value in channel {channel}, sample {index}")]
    NonFinite {
        channel: &'static str,
        index: usize,
    },

    #[error("global-frame trace is all zeros, renormalization factor undefined")]
    DegenerateInput,

    #[error("external transform failed: {0}")]
    External(#[source] CapabilityError),
}

/// Elimina la componente de gravedad de una traza de acelerómetro en marco
/// local: pasa a unidades de g, cuantiza, lleva la traza al marco global
/// con la capacidad de eliminación de rotación, renormaliza la escala
/// perdida en la cuantización y resta el vector nominal de gravedad.
///
/// Las capacidades son intercambiables: cualquier cuantizador de punto fijo
/// y cualquier estabilizador de rotación que cumplan los contratos sirven.
#[derive(Debug)]
pub struct GravityRemover<Q, R> {
    quantizer: Q,
    rotation: R,
    gravity_axis: Unit<Vector3<f64>>,
}

impl GravityRemover<FixedPointQuantizer, LowpassRotationRemoval> {
    /// Configuración de referencia: cuantizador de 8 bits con escala 0.49 y
    /// gravedad sobre el eje X del marco global.
    pub fn with_defaults() -> Self {
        Self::new(
            FixedPointQuantizer::reference(),
            LowpassRotationRemoval::default(),
        )
    }
}

impl<Q: Quantizer, R: RotationRemoval> GravityRemover<Q, R> {
    pub fn new(quantizer: Q, rotation: R) -> Self {
        Self {
            quantizer,
            rotation,
            gravity_axis: Vector3::x_axis(),
        }
    }

    /// Eje del marco global sobre el que se asume la gravedad. El valor por
    /// defecto (+X) refleja la convención de montaje del dispositivo de
    /// referencia, no una estimación de actitud.
    pub fn with_gravity_axis(mut self, axis: Unit<Vector3<f64>>) -> Self {
        self.gravity_axis = axis;
        self
    }

    /// Produce el registro con la gravedad compensada. El giroscopio se
    /// valida y acepta por compatibilidad de firma, pero la transformación
    /// actual no lo consume.
    pub fn remove_gravity(&self, record: &SensorRecord) -> Result<GravityFreeRecord, GravityError> {
        if record.is_empty() {
            return Err(GravityError::EmptyRecord);
        }
        check_finite("acc", &record.acc)?;
        check_finite("gyr", &record.gyr)?;

        // m/s² → unidades de g
        let in_g: Vec<Vector3<f64>> = record.acc.iter().map(|a| a / GRAVITY_MS2).collect();

        let quantized = self
            .quantizer
            .quantize(&in_g)
            .map_err(GravityError::External)?;
        check_capability_len("quantizer", record.len(), quantized.len())?;

        let global = self
            .rotation
            .remove_rotation(&quantized)
            .map_err(GravityError::External)?;
        check_capability_len("rotation removal", record.len(), global.len())?;

        // Descarta el artefacto fraccionario que introduce la etapa de
        // rotación
        let global: Vec<Vector3<f64>> = global.iter().map(|v| v.map(f64::trunc)).collect();

        let local_mean = mean_norm(&record.acc);
        let global_mean = mean_norm(&global);
        if global_mean == 0.0 {
            return Err(GravityError::DegenerateInput);
        }
        let factor = local_mean / global_mean;

        let gravity = self.gravity_axis.into_inner() * local_mean;
        let acc: Channel = global.iter().map(|v| v * factor - gravity).collect();

        Ok(GravityFreeRecord {
            sample_rate: record.sample_rate,
            acc,
        })
    }
}

fn check_finite(channel: &'static str, data: &[Vector3<f64>]) -> Result<(), GravityError> {
    for (index, v) in data.iter().enumerate() {
        if !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
            return Err(GravityError::NonFinite { channel, index });
        }
    }
    Ok(())
}

fn check_capability_len(stage: &str, expected: usize, actual: usize) -> Result<(), GravityError> {
    if actual != expected {
        return Err(GravityError::External(
            format!(
                "{} returned {} samples for an input of {}",
                stage, actual, expected
            )
            .into(),
        ));
    }
    Ok(())
}

fn mean_norm(data: &[Vector3<f64>]) -> f64 {
    data.iter().map(|v| v.norm()).sum::<f64>() / data.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SENSOR_SAMPLE_RATE;

    fn record_from_acc(acc: Channel) -> SensorRecord {
        let n = acc.len();
        SensorRecord::new(
            SENSOR_SAMPLE_RATE,
            acc,
            vec![Vector3::zeros(); n],
            vec![Vector3::zeros(); n],
            vec![Vector3::zeros(); n],
        )
        .unwrap()
    }

    /// Capacidad de rotación trivial para aislar el resto del pipeline.
    struct PassthroughRotation;

    impl RotationRemoval for PassthroughRotation {
        fn remove_rotation(
            &self,
            samples: &[Vector3<i32>],
        ) -> Result<Vec<Vector3<f64>>, CapabilityError> {
            Ok(samples.iter().map(|s| s.map(|c| c as f64)).collect())
        }
    }

    struct FailingQuantizer;

    impl Quantizer for FailingQuantizer {
        fn quantize(
            &self,
            _samples: &[Vector3<f64>],
        ) -> Result<Vec<Vector3<i32>>, CapabilityError> {
            Err("quantizer exploded".into())
        }
    }

    #[test]
    fn output_preserves_length_and_sample_rate() {
        let acc = (0..40)
            .map(|i| Vector3::new(9.81, 0.1 * (i as f64).sin(), 0.05 * i as f64))
            .collect();
        let record = record_from_acc(acc);

        let result = GravityRemover::with_defaults()
            .remove_gravity(&record)
            .unwrap();

        assert_eq!(result.len(), record.len());
        assert_eq!(result.sample_rate, record.sample_rate);
        assert!(result.acc.iter().all(|v| {
            v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
        }));
    }

    #[test]
    fn resting_trace_maps_to_near_zero() {
        // 1 g exacto sobre el eje X local, sin movimiento
        let record = record_from_acc(vec![Vector3::new(GRAVITY_MS2, 0.0, 0.0); 2]);

        let result = GravityRemover::with_defaults()
            .remove_gravity(&record)
            .unwrap();

        for v in &result.acc {
            assert!(v.norm() < 1e-6, "residual {:?}", v);
        }
    }

    #[test]
    fn configurable_gravity_axis_is_honored() {
        // Con rotación identidad y gravedad declarada sobre Z, una traza en
        // reposo sobre Z también debe quedar en cero
        let record = record_from_acc(vec![Vector3::new(0.0, 0.0, GRAVITY_MS2); 3]);

        let remover = GravityRemover::new(FixedPointQuantizer::reference(), PassthroughRotation)
            .with_gravity_axis(Vector3::z_axis());
        let result = remover.remove_gravity(&record).unwrap();

        for v in &result.acc {
            assert!(v.norm() < 1e-6, "residual {:?}", v);
        }
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut acc = vec![Vector3::new(9.81, 0.0, 0.0); 3];
        acc[1].y = f64::NAN;
        let record = record_from_acc(acc);

        let err = GravityRemover::with_defaults()
            .remove_gravity(&record)
            .unwrap_err();
        assert!(matches!(
            err,
            GravityError::NonFinite {
                channel: "acc",
                index: 1,
            }
        ));
    }

    #[test]
    fn all_zero_trace_is_degenerate() {
        let record = record_from_acc(vec![Vector3::zeros(); 4]);

        let err = GravityRemover::with_defaults()
            .remove_gravity(&record)
            .unwrap_err();
        assert!(matches!(err, GravityError::DegenerateInput));
    }

    #[test]
    fn capability_failure_propagates() {
        let record = record_from_acc(vec![Vector3::new(9.81, 0.0, 0.0); 2]);

        let remover = GravityRemover::new(FailingQuantizer, PassthroughRotation);
        let err = remover.remove_gravity(&record).unwrap_err();

        match err {
            GravityError::External(inner) => assert!(inner.to_string().contains("exploded")),
            other => panic!("expected External, got {:?}", other),
        }
    }
}
