use thiserror::Error;

use crate::types::{Channel, MocapRecord, SensorRecord};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrimError {
    #[error("window {start}..{end} out of range for {len} samples")]
    OutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("empty window: start == end == {0}")]
    EmptyWindow(usize),
}

/// Recorte de una ventana temporal `[start, end)` con re-anclaje de la
/// posición: la posición recortada queda relativa a su valor en `start`.
///
/// El resultado es siempre una copia independiente del registro original.
pub trait Trimmable: Sized {
    fn trim(&self, start: usize, end: usize) -> Result<Self, TrimError>;
}

fn check_bounds(start: usize, end: usize, len: usize) -> Result<(), TrimError> {
    if start == end {
        return Err(TrimError::EmptyWindow(start));
    }
    if start > end || end > len {
        return Err(TrimError::OutOfRange { start, end, len });
    }
    Ok(())
}

fn slice(channel: &Channel, start: usize, end: usize) -> Channel {
    channel[start..end].to_vec()
}

fn slice_rebased(channel: &Channel, start: usize, end: usize) -> Channel {
    let origin = channel[start];
    channel[start..end].iter().map(|p| p - origin).collect()
}

impl Trimmable for SensorRecord {
    fn trim(&self, start: usize, end: usize) -> Result<Self, TrimError> {
        check_bounds(start, end, self.len())?;

        Ok(Self {
            sample_rate: self.sample_rate,
            acc: slice(&self.acc, start, end),
            free_acc: slice(&self.free_acc, start, end),
            gyr: slice(&self.gyr, start, end),
            mag: slice(&self.mag, start, end),
            vel: self.vel.as_ref().map(|v| slice(v, start, end)),
            pos: self.pos.as_ref().map(|p| slice_rebased(p, start, end)),
        })
    }
}

impl Trimmable for MocapRecord {
    fn trim(&self, start: usize, end: usize) -> Result<Self, TrimError> {
        check_bounds(start, end, self.len())?;

        Ok(Self {
            sample_rate: self.sample_rate,
            pos: slice_rebased(&self.pos, start, end),
            vel: self.vel.as_ref().map(|v| slice(v, start, end)),
            acc: self.acc.as_ref().map(|a| slice(a, start, end)),
        })
    }
}
