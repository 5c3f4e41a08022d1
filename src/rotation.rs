use nalgebra::{UnitQuaternion, Vector3};
use thiserror::Error;

use crate::gravity::{CapabilityError, RotationRemoval};

#[derive(Error, Debug, PartialEq)]
pub enum RotationError {
    #[error("alpha must be in [0, 1), got {0}")]
    BadAlpha(f64),
}

/// Estabilizador de rotación por seguimiento pasa-bajos de la gravedad.
///
/// Un filtro exponencial sobre la propia traza cuantizada estima la
/// dirección dominante (la gravedad, en una traza de acelerómetro) y cada
/// muestra se rota con el cuaternión que lleva esa estimación al eje +X.
/// El marco global resultante mantiene la gravedad sobre +X aunque el
/// dispositivo gire.
#[derive(Debug, Clone, Copy)]
pub struct LowpassRotationRemoval {
    alpha: f64,
}

impl LowpassRotationRemoval {
    pub const DEFAULT_ALPHA: f64 = 0.98;

    pub fn new(alpha: f64) -> Result<Self, RotationError> {
        if !alpha.is_finite() || !(0.0..1.0).contains(&alpha) {
            return Err(RotationError::BadAlpha(alpha));
        }
        Ok(Self { alpha })
    }
}

impl Default for LowpassRotationRemoval {
    fn default() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
        }
    }
}

impl RotationRemoval for LowpassRotationRemoval {
    fn remove_rotation(
        &self,
        samples: &[Vector3<i32>],
    ) -> Result<Vec<Vector3<f64>>, CapabilityError> {
        // Estado de seguimiento fresco en cada invocación
        let mut estimate: Option<Vector3<f64>> = None;
        let mut out = Vec::with_capacity(samples.len());

        for sample in samples {
            let v = sample.map(|c| c as f64);
            let current = match estimate {
                None => v,
                Some(prev) => prev * self.alpha + v * (1.0 - self.alpha),
            };
            estimate = Some(current);
            out.push(align_to_x(current) * v);
        }

        Ok(out)
    }
}

/// Cuaternión que lleva `dir` al eje +X del marco global. Una dirección
/// casi nula deja la muestra intacta.
fn align_to_x(dir: Vector3<f64>) -> UnitQuaternion<f64> {
    if dir.norm() < 1e-9 {
        return UnitQuaternion::identity();
    }
    match UnitQuaternion::rotation_between(&dir, &Vector3::x()) {
        Some(q) => q,
        // dir apunta exactamente a -X: media vuelta sobre Z
        None => UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_trace_is_left_untouched() {
        let samples = vec![Vector3::new(63, 0, 0); 4];
        let out = LowpassRotationRemoval::default()
            .remove_rotation(&samples)
            .unwrap();

        assert_eq!(out.len(), 4);
        for v in &out {
            assert!((v - Vector3::new(63.0, 0.0, 0.0)).norm() < 1e-9, "{:?}", v);
        }
    }

    #[test]
    fn constant_trace_is_brought_to_x() {
        // Gravedad sobre el eje Z local: el marco global la deja sobre +X
        let samples = vec![Vector3::new(0, 0, 63); 6];
        let out = LowpassRotationRemoval::default()
            .remove_rotation(&samples)
            .unwrap();

        for v in &out {
            assert!((v - Vector3::new(63.0, 0.0, 0.0)).norm() < 1e-6, "{:?}", v);
        }
    }

    #[test]
    fn antiparallel_trace_is_handled() {
        let samples = vec![Vector3::new(-63, 0, 0); 3];
        let out = LowpassRotationRemoval::default()
            .remove_rotation(&samples)
            .unwrap();

        for v in &out {
            assert!((v - Vector3::new(63.0, 0.0, 0.0)).norm() < 1e-6, "{:?}", v);
        }
    }

    #[test]
    fn rotation_preserves_magnitude() {
        let samples = vec![
            Vector3::new(30, 40, 0),
            Vector3::new(30, 40, 0),
            Vector3::new(25, 45, 10),
        ];
        let out = LowpassRotationRemoval::default()
            .remove_rotation(&samples)
            .unwrap();

        for (q, v) in samples.iter().zip(&out) {
            let before = q.map(|c| c as f64).norm();
            assert!((v.norm() - before).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_samples_pass_through() {
        let samples = vec![Vector3::new(0, 0, 0); 2];
        let out = LowpassRotationRemoval::default()
            .remove_rotation(&samples)
            .unwrap();
        assert!(out.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn invalid_alpha_is_rejected() {
        assert_eq!(
            LowpassRotationRemoval::new(1.0).unwrap_err(),
            RotationError::BadAlpha(1.0)
        );
        assert!(LowpassRotationRemoval::new(0.0).is_ok());
    }
}
