use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use nalgebra::Vector3;
use thiserror::Error;

use crate::types::Channel;

/// Leyenda fija de los tres ejes de un canal
const AXIS_NAMES: [&str; 3] = ["X-axis", "Y-axis", "Z-axis"];

/// Tipo de serie temporal; determina la etiqueta del eje Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Pos,
    Vel,
    Acc,
}

impl SeriesKind {
    pub fn axis_label(self) -> &'static str {
        match self {
            SeriesKind::Pos => "Pos (m)",
            SeriesKind::Vel => "Vel (m/s)",
            SeriesKind::Acc => "Acc (m/s²)",
        }
    }
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("the {0} series contains no samples")]
    EmptySeries(&'static str),

    #[error("plot backend error: {0}")]
    Backend(String),
}

/// Las tres líneas (X, Y, Z) de un canal como puntos listos para graficar
fn axis_lines(series: &[Vector3<f64>]) -> Vec<Vec<[f64; 2]>> {
    (0..3)
        .map(|axis| {
            series
                .iter()
                .enumerate()
                .map(|(i, v)| [i as f64, v[axis]])
                .collect()
        })
        .collect()
}

fn show_channel_plot(
    ui: &mut egui::Ui,
    id: &str,
    y_label: &'static str,
    lines: &[Vec<[f64; 2]>],
    width: f32,
    height: f32,
) {
    Plot::new(id.to_string())
        .legend(Legend::default())
        .width(width)
        .height(height)
        .x_axis_label("Frame")
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for (axis, points) in lines.iter().enumerate() {
                plot_ui.line(Line::new(PlotPoints::from(points.clone())).name(AXIS_NAMES[axis]));
            }
        });
}

struct SeriesApp {
    lines: Vec<Vec<[f64; 2]>>,
    y_label: &'static str,
}

impl eframe::App for SeriesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let width = ui.available_width();
            let height = ui.available_height();
            show_channel_plot(ui, "serie", self.y_label, &self.lines, width, height);
        });
    }
}

/// Muestra una serie tri-axial en una ventana propia. Bloquea hasta que el
/// usuario la cierra.
pub fn plot_series(series: &Channel, kind: SeriesKind, title: &str) -> Result<(), PlotError> {
    if series.is_empty() {
        return Err(PlotError::EmptySeries("plotted"));
    }

    let app = SeriesApp {
        lines: axis_lines(series),
        y_label: kind.axis_label(),
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([700.0, 300.0]),
        ..Default::default()
    };

    eframe::run_native(title, options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|e| PlotError::Backend(e.to_string()))
}

/// Vista cinemática de un registro: aceleración, velocidad y posición, ya
/// resueltas por el llamador.
#[derive(Debug, Clone)]
pub struct KinematicView {
    pub acc: Channel,
    pub vel: Channel,
    pub pos: Channel,
}

impl KinematicView {
    pub fn new(acc: Channel, vel: Channel, pos: Channel) -> Result<Self, PlotError> {
        if acc.is_empty() {
            return Err(PlotError::EmptySeries("acc"));
        }
        if vel.is_empty() {
            return Err(PlotError::EmptySeries("vel"));
        }
        if pos.is_empty() {
            return Err(PlotError::EmptySeries("pos"));
        }
        Ok(Self { acc, vel, pos })
    }
}

struct ComparePanel {
    id: String,
    title: String,
    lines: Vec<Vec<[f64; 2]>>,
}

struct CompareRow {
    y_label: &'static str,
    panels: [ComparePanel; 2],
}

struct CompareApp {
    rows: Vec<CompareRow>,
}

impl eframe::App for CompareApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let cell_w = (ui.available_width() - 16.0) / 2.0;
            let cell_h = (ui.available_height() - 60.0) / 3.0;

            for row in &self.rows {
                ui.horizontal(|ui| {
                    for panel in &row.panels {
                        ui.vertical(|ui| {
                            ui.label(&panel.title);
                            show_channel_plot(
                                ui,
                                &panel.id,
                                row.y_label,
                                &panel.lines,
                                cell_w,
                                cell_h,
                            );
                        });
                    }
                });
            }
        });
    }
}

/// Comparación 3×2: aceleración, velocidad y posición de dos registros,
/// lado a lado. Bloquea hasta que el usuario cierra la ventana.
pub fn compare_records(
    left: KinematicView,
    right: KinematicView,
    left_title: &str,
    right_title: &str,
) -> Result<(), PlotError> {
    let rows = [
        (SeriesKind::Acc, &left.acc, &right.acc),
        (SeriesKind::Vel, &left.vel, &right.vel),
        (SeriesKind::Pos, &left.pos, &right.pos),
    ]
    .into_iter()
    .map(|(kind, a, b)| CompareRow {
        y_label: kind.axis_label(),
        panels: [
            ComparePanel {
                id: format!("{:?}_izq", kind),
                title: left_title.to_string(),
                lines: axis_lines(a),
            },
            ComparePanel {
                id: format!("{:?}_der", kind),
                title: right_title.to_string(),
                lines: axis_lines(b),
            },
        ],
    })
    .collect();

    let app = CompareApp { rows };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Comparación sensor / mocap",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| PlotError::Backend(e.to_string()))
}
