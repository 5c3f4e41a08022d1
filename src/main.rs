/*
Comparación offline de un sensor inercial contra captura de movimiento.

Pipeline: carga CSV/TSV → recorte alineado → eliminación de gravedad
(cuantización de 8 bits + marco global estabilizado) → visualización.

Uso:
    ingravido [--config cfg.json] [--plot] [--animate] [--compare] <sensor.csv> [mocap.tsv]

RUST_LOG=debug muestra el detalle de cada etapa.
*/

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use nalgebra::Vector3;

use ingravido::animate::animate_trajectory;
use ingravido::config::PipelineConfig;
use ingravido::csv_loader::{load_mocap_from_tsv, load_sensor_from_csv};
use ingravido::plot::{compare_records, plot_series, KinematicView, SeriesKind};
use ingravido::trim::Trimmable;
use ingravido::types::{Channel, MocapRecord};

struct Options {
    config: Option<PathBuf>,
    plot: bool,
    animate: bool,
    compare: bool,
    sensor_csv: PathBuf,
    mocap_tsv: Option<PathBuf>,
}

fn parse_args() -> Result<Options> {
    let mut config = None;
    let mut plot = false;
    let mut animate = false;
    let mut compare = false;
    let mut paths: Vec<PathBuf> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--config necesita una ruta"))?;
                config = Some(PathBuf::from(value));
            }
            "--plot" => plot = true,
            "--animate" => animate = true,
            "--compare" => compare = true,
            _ => paths.push(PathBuf::from(arg)),
        }
    }

    if paths.is_empty() || paths.len() > 2 {
        bail!("Uso: ingravido [--config cfg.json] [--plot] [--animate] [--compare] <sensor.csv> [mocap.tsv]");
    }
    let mocap_tsv = if paths.len() == 2 {
        Some(paths.remove(1))
    } else {
        None
    };

    Ok(Options {
        config,
        plot,
        animate,
        compare,
        sensor_csv: paths.remove(0),
        mocap_tsv,
    })
}

/// Integración trapezoidal acumulada desde el reposo.
///
/// La derivación de velocidad/posición es responsabilidad del llamador: la
/// biblioteca no la hace implícitamente, así que la vista comparativa la
/// resuelve aquí.
fn integrate(series: &Channel, sample_rate: u32) -> Channel {
    let dt = 1.0 / sample_rate as f64;
    let mut out = Vec::with_capacity(series.len());
    let mut accumulated = Vector3::zeros();
    out.push(accumulated);
    for pair in series.windows(2) {
        accumulated += (pair[0] + pair[1]) * (0.5 * dt);
        out.push(accumulated);
    }
    out
}

/// Derivada por diferencias centrales, con diferencias laterales en los
/// extremos.
fn differentiate(series: &Channel, sample_rate: u32) -> Channel {
    let rate = sample_rate as f64;
    let n = series.len();
    if n < 2 {
        return vec![Vector3::zeros(); n];
    }
    (0..n)
        .map(|i| {
            let (prev, next, span) = if i == 0 {
                (0, 1, 1.0)
            } else if i == n - 1 {
                (n - 2, n - 1, 1.0)
            } else {
                (i - 1, i + 1, 2.0)
            };
            (series[next] - series[prev]) * (rate / span)
        })
        .collect()
}

fn mean_norm(series: &Channel) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().map(|v| v.norm()).sum::<f64>() / series.len() as f64
}

fn load_mocap(opts: &Options, config: &PipelineConfig) -> Result<Option<MocapRecord>> {
    let Some(path) = &opts.mocap_tsv else {
        return Ok(None);
    };

    let mocap = load_mocap_from_tsv(path)
        .with_context(|| format!("No se pudo cargar el mocap {:?}", path))?;
    info!("mocap: {} muestras a {} Hz", mocap.len(), mocap.sample_rate);

    let mocap = match config.mocap_trim {
        Some(window) => {
            debug!("recorte mocap {}..{}", window.start, window.end);
            mocap.trim(window.start, window.end)?
        }
        None => mocap,
    };
    Ok(Some(mocap))
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = parse_args()?;

    let config = match &opts.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("No se pudo leer la configuración {:?}", path))?,
        None => PipelineConfig::default(),
    };

    let sensor = load_sensor_from_csv(&opts.sensor_csv)
        .with_context(|| format!("No se pudo cargar el sensor {:?}", opts.sensor_csv))?;
    info!("sensor: {} muestras a {} Hz", sensor.len(), sensor.sample_rate);

    let sensor = match config.sensor_trim {
        Some(window) => {
            debug!("recorte sensor {}..{}", window.start, window.end);
            sensor.trim(window.start, window.end)?
        }
        None => sensor,
    };

    let mocap = load_mocap(&opts, &config)?;

    let remover = config.gravity_remover()?;
    let gravity_free = remover.remove_gravity(&sensor)?;

    println!("⚖️  Gravedad compensada: {} muestras a {} Hz", gravity_free.len(), gravity_free.sample_rate);
    println!("   |acc| medio en marco local:    {:>8.3} m/s²", mean_norm(&sensor.acc));
    println!("   |acc| medio sin gravedad:      {:>8.3} m/s²", mean_norm(&gravity_free.acc));
    if let Some(mocap) = &mocap {
        println!("   |pos| medio mocap:             {:>8.3} m", mean_norm(&mocap.pos));
    }

    if opts.plot {
        plot_series(&gravity_free.acc, SeriesKind::Acc, "Aceleración sin gravedad")?;
    }

    if opts.animate {
        let mocap = mocap
            .as_ref()
            .ok_or_else(|| anyhow!("--animate necesita un TSV de mocap"))?;
        animate_trajectory(&mocap.pos, "Trayectoria mocap", None)?;
    }

    if opts.compare {
        let mocap = mocap
            .as_ref()
            .ok_or_else(|| anyhow!("--compare necesita un TSV de mocap"))?;

        // Canales derivados, resueltos explícitamente para la comparación
        let sensor_vel = integrate(&gravity_free.acc, gravity_free.sample_rate);
        let sensor_pos = integrate(&sensor_vel, gravity_free.sample_rate);
        let mocap_vel = differentiate(&mocap.pos, mocap.sample_rate);
        let mocap_acc = differentiate(&mocap_vel, mocap.sample_rate);

        let sensor_view = KinematicView::new(gravity_free.acc.clone(), sensor_vel, sensor_pos)?;
        let mocap_view = KinematicView::new(mocap_acc, mocap_vel, mocap.pos.clone())?;

        compare_records(sensor_view, mocap_view, "Sensor (sin gravedad)", "Mocap")?;
    }

    Ok(())
}
