use kiss3d::camera::ArcBall;
use kiss3d::event::{Action, Key, WindowEvent};
use kiss3d::light::Light;
use kiss3d::nalgebra::Point3;
use kiss3d::window::Window;
use thiserror::Error;

use crate::types::Channel;

/// Muestras que avanza la animación por cuadro renderizado
const FRAME_STRIDE: usize = 10;

/// Margen aplicado cuando un eje no tiene recorrido
const FLAT_AXIS_MARGIN: f64 = 0.5;

#[derive(Error, Debug, PartialEq)]
pub enum AnimateError {
    #[error("the trajectory contains no samples")]
    EmptyTrajectory,

    #[error("invalid bounds for axis {axis}: min {min} >= max {max}")]
    InvalidBounds { axis: char, min: f64, max: f64 },
}

/// Límites de los ejes de la vista 3D. Los campos son públicos para poder
/// fijar a mano cualquiera de ellos tras calcularlos de una trayectoria.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

impl AxisBounds {
    /// Límites ajustados al recorrido de la trayectoria. Un eje sin
    /// recorrido recibe un margen fijo para que la caja no degenere.
    pub fn from_trajectory(trajectory: &Channel) -> Result<Self, AnimateError> {
        if trajectory.is_empty() {
            return Err(AnimateError::EmptyTrajectory);
        }

        let mut bounds = Self {
            xmin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
            zmin: f64::INFINITY,
            zmax: f64::NEG_INFINITY,
        };
        for p in trajectory {
            bounds.xmin = bounds.xmin.min(p.x);
            bounds.xmax = bounds.xmax.max(p.x);
            bounds.ymin = bounds.ymin.min(p.y);
            bounds.ymax = bounds.ymax.max(p.y);
            bounds.zmin = bounds.zmin.min(p.z);
            bounds.zmax = bounds.zmax.max(p.z);
        }

        for (min, max) in [
            (&mut bounds.xmin, &mut bounds.xmax),
            (&mut bounds.ymin, &mut bounds.ymax),
            (&mut bounds.zmin, &mut bounds.zmax),
        ] {
            if *min == *max {
                *min -= FLAT_AXIS_MARGIN;
                *max += FLAT_AXIS_MARGIN;
            }
        }

        Ok(bounds)
    }

    pub fn validate(&self) -> Result<(), AnimateError> {
        for (axis, min, max) in [
            ('x', self.xmin, self.xmax),
            ('y', self.ymin, self.ymax),
            ('z', self.zmin, self.zmax),
        ] {
            if min >= max {
                return Err(AnimateError::InvalidBounds { axis, min, max });
            }
        }
        Ok(())
    }

    fn center(&self) -> Point3<f32> {
        Point3::new(
            ((self.xmin + self.xmax) / 2.0) as f32,
            ((self.ymin + self.ymax) / 2.0) as f32,
            ((self.zmin + self.zmax) / 2.0) as f32,
        )
    }

    fn diagonal(&self) -> f32 {
        let dx = self.xmax - self.xmin;
        let dy = self.ymax - self.ymin;
        let dz = self.zmax - self.zmin;
        ((dx * dx + dy * dy + dz * dz).sqrt()) as f32
    }
}

/// Aristas de la caja que delimita la vista
fn bounds_edges(b: &AxisBounds) -> Vec<(Point3<f32>, Point3<f32>)> {
    let corner = |x: f64, y: f64, z: f64| Point3::new(x as f32, y as f32, z as f32);
    let c = [
        corner(b.xmin, b.ymin, b.zmin),
        corner(b.xmax, b.ymin, b.zmin),
        corner(b.xmax, b.ymax, b.zmin),
        corner(b.xmin, b.ymax, b.zmin),
        corner(b.xmin, b.ymin, b.zmax),
        corner(b.xmax, b.ymin, b.zmax),
        corner(b.xmax, b.ymax, b.zmax),
        corner(b.xmin, b.ymax, b.zmax),
    ];
    vec![
        (c[0], c[1]),
        (c[1], c[2]),
        (c[2], c[3]),
        (c[3], c[0]),
        (c[4], c[5]),
        (c[5], c[6]),
        (c[6], c[7]),
        (c[7], c[4]),
        (c[0], c[4]),
        (c[1], c[5]),
        (c[2], c[6]),
        (c[3], c[7]),
    ]
}

/// Anima una trayectoria 3D re-anclada a su primer punto: el recorrido se
/// dibuja progresivamente dentro de la caja de límites, la barra espaciadora
/// pausa. Bloquea hasta que el usuario cierra la ventana.
pub fn animate_trajectory(
    trajectory: &Channel,
    title: &str,
    bounds: Option<AxisBounds>,
) -> Result<(), AnimateError> {
    if trajectory.is_empty() {
        return Err(AnimateError::EmptyTrajectory);
    }

    // La trayectoria se re-ancla a su primer punto antes de calcular nada
    let origin = trajectory[0];
    let rebased: Channel = trajectory.iter().map(|p| p - origin).collect();

    let bounds = match bounds {
        Some(b) => {
            b.validate()?;
            b
        }
        None => AxisBounds::from_trajectory(&rebased)?,
    };

    let path: Vec<Point3<f32>> = rebased
        .iter()
        .map(|p| Point3::new(p.x as f32, p.y as f32, p.z as f32))
        .collect();
    let edges = bounds_edges(&bounds);

    let mut window = Window::new(title);
    window.set_light(Light::StickToCamera);

    let at = bounds.center();
    let distance = bounds.diagonal().max(1.0) * 1.2;
    let eye = Point3::new(at.x + distance, at.y + distance * 0.6, at.z + distance);
    let mut camera = ArcBall::new(eye, at);

    let box_color = Point3::new(0.45, 0.45, 0.45);
    let path_color = Point3::new(0.2, 0.6, 1.0);

    let mut cursor = 0usize;
    let mut paused = false;

    while window.render_with_camera(&mut camera) {
        for event in window.events().iter() {
            if let WindowEvent::Key(Key::Space, Action::Press, _) = event.value {
                paused = !paused;
            }
        }

        for (a, b) in &edges {
            window.draw_line(a, b, &box_color);
        }

        if !paused && cursor < path.len() {
            cursor = (cursor + FRAME_STRIDE).min(path.len());
        }
        for segment in path[..cursor].windows(2) {
            window.draw_line(&segment[0], &segment[1], &path_color);
        }
    }

    Ok(())
}
