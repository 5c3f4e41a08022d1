use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use nalgebra::Vector3;
use thiserror::Error;

use crate::types::{
    Channel, MocapRecord, RecordError, SensorRecord, MOCAP_HEADER_LINES, MOCAP_SAMPLE_RATE,
    MOCAP_UNITS_PER_METER, SENSOR_SAMPLE_RATE,
};

/// Columnas esperadas en el CSV del sensor, en grupos tri-axiales
const SENSOR_COLUMNS: [&str; 12] = [
    "acc_x", "acc_y", "acc_z", "freeacc_x", "freeacc_y", "freeacc_z", "gyr_x", "gyr_y", "gyr_z",
    "mag_x", "mag_y", "mag_z",
];

/// Columnas del TSV de mocap que llevan la posición (índices base 0)
const MOCAP_POS_COLUMNS: [usize; 3] = [2, 3, 4];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column {0:?}")]
    MissingColumn(&'static str),

    #[error("row {row}: expected at least {expected} fields, got {actual}")]
    ShortRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {row}: field {field:?} is not a number")]
    BadNumber { row: usize, field: String },

    #[error("file {0:?} contains no samples")]
    EmptyFile(PathBuf),

    #[error(transparent)]
    Record(#[from] RecordError),
}

fn parse_field(record: &csv::StringRecord, row: usize, col: usize) -> Result<f64, LoaderError> {
    let field = record.get(col).ok_or(LoaderError::ShortRow {
        row,
        expected: col + 1,
        actual: record.len(),
    })?;
    field.trim().parse().map_err(|_| LoaderError::BadNumber {
        row,
        field: field.to_string(),
    })
}

/// Carga un registro del sensor desde un CSV con encabezado nombrado.
///
/// La búsqueda de columnas es por nombre, sin importar el orden; columnas
/// extra se ignoran.
pub fn load_sensor_from_csv(path: impl AsRef<Path>) -> Result<SensorRecord, LoaderError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut indices = [0usize; 12];
    for (slot, name) in indices.iter_mut().zip(SENSOR_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(LoaderError::MissingColumn(name))?;
    }

    let mut acc = Channel::new();
    let mut free_acc = Channel::new();
    let mut gyr = Channel::new();
    let mut mag = Channel::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_idx + 1;

        let triple = |base: usize| -> Result<Vector3<f64>, LoaderError> {
            Ok(Vector3::new(
                parse_field(&record, row, indices[base])?,
                parse_field(&record, row, indices[base + 1])?,
                parse_field(&record, row, indices[base + 2])?,
            ))
        };
        acc.push(triple(0)?);
        free_acc.push(triple(3)?);
        gyr.push(triple(6)?);
        mag.push(triple(9)?);
    }

    if acc.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(SensorRecord::new(
        SENSOR_SAMPLE_RATE,
        acc,
        free_acc,
        gyr,
        mag,
    )?)
}

/// Carga un registro de mocap desde un TSV con 12 líneas de metadatos.
///
/// La posición viene en las columnas 3 a 5 en milímetros; aquí se convierte
/// a metros.
pub fn load_mocap_from_tsv(path: impl AsRef<Path>) -> Result<MocapRecord, LoaderError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_path(path)?;

    let mut pos = Channel::new();
    for (row_idx, result) in reader.records().enumerate() {
        if row_idx < MOCAP_HEADER_LINES {
            continue;
        }
        let record = result?;
        let row = row_idx + 1;
        if record.len() <= MOCAP_POS_COLUMNS[2] {
            return Err(LoaderError::ShortRow {
                row,
                expected: MOCAP_POS_COLUMNS[2] + 1,
                actual: record.len(),
            });
        }

        let millimeters = Vector3::new(
            parse_field(&record, row, MOCAP_POS_COLUMNS[0])?,
            parse_field(&record, row, MOCAP_POS_COLUMNS[1])?,
            parse_field(&record, row, MOCAP_POS_COLUMNS[2])?,
        );
        pos.push(millimeters / MOCAP_UNITS_PER_METER);
    }

    if pos.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(MocapRecord::new(MOCAP_SAMPLE_RATE, pos)?)
}

/// Escribe un registro del sensor en el formato CSV que consume
/// `load_sensor_from_csv`.
pub fn write_sensor_to_csv(record: &SensorRecord, path: impl AsRef<Path>) -> Result<(), LoaderError> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "{}", SENSOR_COLUMNS.join(","))?;
    for i in 0..record.len() {
        let row = [
            &record.acc[i],
            &record.free_acc[i],
            &record.gyr[i],
            &record.mag[i],
        ];
        let fields: Vec<String> = row
            .iter()
            .flat_map(|v| [v.x.to_string(), v.y.to_string(), v.z.to_string()])
            .collect();
        writeln!(file, "{}", fields.join(","))?;
    }

    Ok(())
}

/// Escribe un registro de mocap en el formato TSV que consume
/// `load_mocap_from_tsv`: 12 líneas de metadatos y posiciones en milímetros.
pub fn write_mocap_to_tsv(record: &MocapRecord, path: impl AsRef<Path>) -> Result<(), LoaderError> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "NO_OF_FRAMES\t{}", record.len())?;
    writeln!(file, "NO_OF_CAMERAS\t0")?;
    writeln!(file, "NO_OF_MARKERS\t1")?;
    writeln!(file, "FREQUENCY\t{}", record.sample_rate)?;
    writeln!(file, "NO_OF_ANALOG\t0")?;
    writeln!(file, "ANALOG_FREQUENCY\t0")?;
    writeln!(file, "DESCRIPTION\t--")?;
    writeln!(file, "TIME_STAMP\t--")?;
    writeln!(file, "DATA_INCLUDED\t3D")?;
    writeln!(file, "EVENT\t--")?;
    writeln!(file, "MARKER_NAMES\tmarcador")?;
    writeln!(file, "TRAJECTORY_TYPES\tMeasured")?;

    let dt = 1.0 / record.sample_rate as f64;
    for (i, p) in record.pos.iter().enumerate() {
        let mm = p * MOCAP_UNITS_PER_METER;
        writeln!(
            file,
            "{}\t{}\t{}\t{}\t{}",
            i + 1,
            i as f64 * dt,
            mm.x,
            mm.y,
            mm.z
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ingravido_{}_{}", std::process::id(), name))
    }

    fn sample_sensor() -> SensorRecord {
        let acc = vec![
            Vector3::new(9.81, 0.0, 0.125),
            Vector3::new(9.5, 0.25, -0.75),
            Vector3::new(10.0, -0.5, 0.5),
        ];
        let free_acc = vec![Vector3::new(0.0, 0.0, 0.125); 3];
        let gyr = vec![Vector3::new(0.01, -0.02, 0.03); 3];
        let mag = vec![Vector3::new(0.25, 0.5, 0.75); 3];
        SensorRecord::new(SENSOR_SAMPLE_RATE, acc, free_acc, gyr, mag).unwrap()
    }

    fn assert_channels_close(a: &Channel, b: &Channel) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).norm() < 1e-9, "{:?} != {:?}", x, y);
        }
    }

    #[test]
    fn sensor_round_trip() {
        let record = sample_sensor();
        let path = temp_path("sensor_round_trip.csv");

        write_sensor_to_csv(&record, &path).unwrap();
        let reloaded = load_sensor_from_csv(&path).unwrap();

        assert_eq!(reloaded.sample_rate, SENSOR_SAMPLE_RATE);
        assert_channels_close(&record.acc, &reloaded.acc);
        assert_channels_close(&record.free_acc, &reloaded.free_acc);
        assert_channels_close(&record.gyr, &reloaded.gyr);
        assert_channels_close(&record.mag, &reloaded.mag);
    }

    #[test]
    fn mocap_round_trip() {
        let pos = vec![
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::new(0.15, 0.25, 0.35),
            Vector3::new(0.2, 0.3, 0.4),
            Vector3::new(0.25, 0.35, 0.45),
        ];
        let record = MocapRecord::new(MOCAP_SAMPLE_RATE, pos).unwrap();
        let path = temp_path("mocap_round_trip.tsv");

        write_mocap_to_tsv(&record, &path).unwrap();
        let reloaded = load_mocap_from_tsv(&path).unwrap();

        assert_eq!(reloaded.sample_rate, MOCAP_SAMPLE_RATE);
        assert_channels_close(&record.pos, &reloaded.pos);
    }

    #[test]
    fn sensor_columns_are_matched_by_name() {
        let path = temp_path("sensor_reordered.csv");
        let mut content = String::from(
            "extra,mag_x,mag_y,mag_z,gyr_x,gyr_y,gyr_z,freeacc_x,freeacc_y,freeacc_z,acc_x,acc_y,acc_z\n",
        );
        content.push_str("99,7,8,9,4,5,6,1,2,3,-1,-2,-3\n");
        std::fs::write(&path, content).unwrap();

        let record = load_sensor_from_csv(&path).unwrap();
        assert_eq!(record.acc[0], Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(record.free_acc[0], Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(record.gyr[0], Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(record.mag[0], Vector3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn sensor_missing_column_is_rejected() {
        let path = temp_path("sensor_missing.csv");
        std::fs::write(
            &path,
            "acc_x,acc_y,acc_z,freeacc_x,freeacc_y,freeacc_z,gyr_x,gyr_y,gyr_z,mag_x,mag_y\n",
        )
        .unwrap();

        let err = load_sensor_from_csv(&path).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn("mag_z")));
    }

    #[test]
    fn mocap_header_is_skipped() {
        let path = temp_path("mocap_header.tsv");
        let mut content = String::new();
        for line in 0..MOCAP_HEADER_LINES {
            content.push_str(&format!("META_{}\tvalor\n", line));
        }
        content.push_str("1\t0.0\t1000\t2000\t3000\n");
        std::fs::write(&path, content).unwrap();

        let record = load_mocap_from_tsv(&path).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.pos[0], Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn mocap_short_row_is_rejected() {
        let path = temp_path("mocap_short.tsv");
        let mut content = String::new();
        for line in 0..MOCAP_HEADER_LINES {
            content.push_str(&format!("META_{}\tvalor\n", line));
        }
        content.push_str("1\t0.0\t1000\n");
        std::fs::write(&path, content).unwrap();

        let err = load_mocap_from_tsv(&path).unwrap_err();
        assert!(matches!(err, LoaderError::ShortRow { .. }));
    }

    #[test]
    fn empty_sensor_file_is_rejected() {
        let path = temp_path("sensor_empty.csv");
        std::fs::write(&path, format!("{}\n", SENSOR_COLUMNS.join(","))).unwrap();

        let err = load_sensor_from_csv(&path).unwrap_err();
        assert!(matches!(err, LoaderError::EmptyFile(_)));
    }
}
