use nalgebra::{Point3, Vector3};
use std::f32::consts::TAU;

pub const MAX_LIGHTS: usize = 4;

/// A light at a specific position radiating in all directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3<f32>,
    pub color: Vector3<f32>,
}

impl PointLight {
    pub fn new(position: Point3<f32>, color: Vector3<f32>) -> Self {
        Self { position, color }
    }
}

/// A fixed pool of point lights that can circle the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub lights: [PointLight; MAX_LIGHTS],
    /// Number of lights in use, `1..=MAX_LIGHTS`.
    pub active: usize,
    pub animate: bool,
    pub orbit_radius: f32,
    /// Radians per second.
    pub orbit_speed: f32,
    pub height: f32,
}

impl Default for LightRig {
    fn default() -> Self {
        let radius = 3.0;
        let height = 3.0;
        Self {
            lights: [
                PointLight::new(Point3::new(0.0, height, radius), Vector3::new(1.0, 0.0, 0.0)),
                PointLight::new(Point3::new(radius, height, 0.0), Vector3::new(0.0, 1.0, 0.0)),
                PointLight::new(Point3::new(0.0, height, -radius), Vector3::new(0.0, 0.0, 1.0)),
                PointLight::new(Point3::new(-radius, height, 0.0), Vector3::new(1.0, 1.0, 0.0)),
            ],
            active: MAX_LIGHTS,
            animate: true,
            orbit_radius: radius,
            orbit_speed: 1.0,
            height,
        }
    }
}

impl LightRig {
    pub fn active_lights(&self) -> &[PointLight] {
        &self.lights[..self.active.clamp(1, MAX_LIGHTS)]
    }

    /// Spreads the active lights evenly around the orbit circle at `time` seconds.
    pub fn update(&mut self, time: f32) {
        if !self.animate {
            return;
        }
        let active = self.active.clamp(1, MAX_LIGHTS);
        let spacing = TAU / active as f32;
        for (i, light) in self.lights.iter_mut().take(active).enumerate() {
            let angle = time * self.orbit_speed + i as f32 * spacing;
            light.position = Point3::new(
                self.orbit_radius * angle.cos(),
                self.height,
                self.orbit_radius * angle.sin(),
            );
        }
    }
}
