use nalgebra::Vector3;
use thiserror::Error;

/// Frecuencia de muestreo del sensor inercial (Hz)
pub const SENSOR_SAMPLE_RATE: u32 = 100;
/// Frecuencia de muestreo del sistema de captura de movimiento (Hz)
pub const MOCAP_SAMPLE_RATE: u32 = 150;
/// Aceleración nominal de la gravedad (m/s²)
pub const GRAVITY_MS2: f64 = 9.81;
/// Líneas de metadatos al inicio del TSV de mocap
pub const MOCAP_HEADER_LINES: usize = 12;
/// El TSV de mocap trae posiciones en milímetros
pub const MOCAP_UNITS_PER_METER: f64 = 1000.0;

/// Canal tri-axial: una muestra de 3 componentes por paso de tiempo
pub type Channel = Vec<Vector3<f64>>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("channel {channel} has {actual} samples, expected {expected}")]
    LengthMismatch {
        channel: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("record must contain at least one sample")]
    Empty,
}

fn check_len(channel: &'static str, expected: usize, actual: usize) -> Result<(), RecordError> {
    if actual != expected {
        return Err(RecordError::LengthMismatch {
            channel,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Registro del sensor inercial en el marco local del dispositivo.
///
/// Todos los canales comparten longitud: el índice i de cada canal
/// corresponde al mismo instante a `sample_rate` Hz. Los canales `vel` y
/// `pos` son derivados; ningún cargador los produce y ninguna rutina de la
/// biblioteca los calcula implícitamente.
#[derive(Debug, Clone)]
pub struct SensorRecord {
    pub sample_rate: u32,
    /// Acelerómetro en marco local (m/s²)
    pub acc: Channel,
    /// Aceleración libre reportada por el propio sensor (m/s²)
    pub free_acc: Channel,
    /// Giroscopio en marco local (rad/s)
    pub gyr: Channel,
    /// Magnetómetro en marco local
    pub mag: Channel,
    pub vel: Option<Channel>,
    pub pos: Option<Channel>,
}

impl SensorRecord {
    pub fn new(
        sample_rate: u32,
        acc: Channel,
        free_acc: Channel,
        gyr: Channel,
        mag: Channel,
    ) -> Result<Self, RecordError> {
        if acc.is_empty() {
            return Err(RecordError::Empty);
        }
        let expected = acc.len();
        check_len("free_acc", expected, free_acc.len())?;
        check_len("gyr", expected, gyr.len())?;
        check_len("mag", expected, mag.len())?;

        Ok(Self {
            sample_rate,
            acc,
            free_acc,
            gyr,
            mag,
            vel: None,
            pos: None,
        })
    }

    /// Adjunta un canal de velocidad calculado por el llamador.
    pub fn with_velocity(mut self, vel: Channel) -> Result<Self, RecordError> {
        check_len("vel", self.len(), vel.len())?;
        self.vel = Some(vel);
        Ok(self)
    }

    /// Adjunta un canal de posición calculado por el llamador.
    pub fn with_position(mut self, pos: Channel) -> Result<Self, RecordError> {
        check_len("pos", self.len(), pos.len())?;
        self.pos = Some(pos);
        Ok(self)
    }

    /// Número de muestras del registro
    pub fn len(&self) -> usize {
        self.acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }
}

/// Registro de captura de movimiento: posición de referencia en metros.
#[derive(Debug, Clone)]
pub struct MocapRecord {
    pub sample_rate: u32,
    /// Posición del marcador (m)
    pub pos: Channel,
    pub vel: Option<Channel>,
    pub acc: Option<Channel>,
}

impl MocapRecord {
    pub fn new(sample_rate: u32, pos: Channel) -> Result<Self, RecordError> {
        if pos.is_empty() {
            return Err(RecordError::Empty);
        }
        Ok(Self {
            sample_rate,
            pos,
            vel: None,
            acc: None,
        })
    }

    pub fn with_velocity(mut self, vel: Channel) -> Result<Self, RecordError> {
        check_len("vel", self.len(), vel.len())?;
        self.vel = Some(vel);
        Ok(self)
    }

    pub fn with_acceleration(mut self, acc: Channel) -> Result<Self, RecordError> {
        check_len("acc", self.len(), acc.len())?;
        self.acc = Some(acc);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }
}

/// Acelerómetro con la gravedad ya compensada. Solo lo produce
/// `GravityRemover`; los valores vienen del dominio cuantizado reescalado.
#[derive(Debug, Clone)]
pub struct GravityFreeRecord {
    pub sample_rate: u32,
    pub acc: Channel,
}

impl GravityFreeRecord {
    pub fn len(&self) -> usize {
        self.acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }
}
