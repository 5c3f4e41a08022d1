use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use nalgebra::Vector3;

use ingravido::csv_loader::load_sensor_from_csv;
use ingravido::types::Channel;

struct InspectOptions {
    dump: Option<usize>,
}

fn parse_args() -> Result<(PathBuf, InspectOptions)> {
    let mut dump = None;
    let mut csv_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--dump necesita un número de muestras"))?;
                dump = Some(value.parse()?);
            }
            _ => {
                if csv_path.is_some() {
                    bail!("Uso: inspect_csv [--dump N] <sensor.csv>");
                }
                csv_path = Some(PathBuf::from(arg));
            }
        }
    }

    let csv_path = csv_path.ok_or_else(|| anyhow!("Debes especificar un archivo CSV"))?;
    Ok((csv_path, InspectOptions { dump }))
}

fn channel_stats(channel: &Channel) -> (f64, f64, f64) {
    let mean = channel.iter().map(Vector3::norm).sum::<f64>() / channel.len() as f64;
    let min = channel
        .iter()
        .map(Vector3::norm)
        .fold(f64::INFINITY, f64::min);
    let max = channel
        .iter()
        .map(Vector3::norm)
        .fold(f64::NEG_INFINITY, f64::max);
    (mean, min, max)
}

fn main() -> Result<()> {
    env_logger::init();
    let (csv_path, opts) = parse_args()?;
    println!("🔍 Inspeccionando {:?}", csv_path);

    let record = load_sensor_from_csv(&csv_path)?;
    println!("   {} muestras a {} Hz", record.len(), record.sample_rate);

    println!("\n   canal      |v| medio      mínimo      máximo");
    for (name, channel) in [
        ("acc", &record.acc),
        ("free_acc", &record.free_acc),
        ("gyr", &record.gyr),
        ("mag", &record.mag),
    ] {
        let (mean, min, max) = channel_stats(channel);
        println!("   {:<9} {:>10.4}  {:>10.4}  {:>10.4}", name, mean, min, max);
    }

    if let Some(n) = opts.dump {
        println!("\n📋 Primeras {} muestras de acc / gyr:", n.min(record.len()));
        for i in 0..n.min(record.len()) {
            let a = record.acc[i];
            let g = record.gyr[i];
            println!(
                "   {:04}: acc [{:>9.4} {:>9.4} {:>9.4}]  gyr [{:>9.4} {:>9.4} {:>9.4}]",
                i, a.x, a.y, a.z, g.x, g.y, g.z
            );
        }
    }

    Ok(())
}
