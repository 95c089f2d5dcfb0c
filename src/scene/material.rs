use crate::io::config::{MaterialConfig, ParallaxConfig};
use log::warn;
use nalgebra::Vector3;

/// Blinn-Phong coefficients shared by every shape in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSettings {
    /// Ambient intensity (0..1).
    pub ambient_k: f32,
    pub ambient_color: Vector3<f32>,
    /// Diffuse intensity (0..1).
    pub diffuse_k: f32,
    /// Specular intensity (0..1).
    pub specular_k: f32,
    pub shininess: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self::from_config(&MaterialConfig::default())
    }
}

fn clamp_unit(what: &str, value: f32) -> f32 {
    if (0.0..=1.0).contains(&value) {
        return value;
    }
    warn!("material: {what} must be within 0..=1 (got {value}), clamping");
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

impl MaterialSettings {
    pub fn from_config(config: &MaterialConfig) -> Self {
        let shininess = if config.shininess.is_finite() && config.shininess >= 0.0 {
            config.shininess
        } else {
            warn!("material: shininess must be >= 0 (got {}), using 0", config.shininess);
            0.0
        };
        Self {
            ambient_k: clamp_unit("ambient_k", config.ambient_k),
            ambient_color: Vector3::from(config.ambient_color),
            diffuse_k: clamp_unit("diffuse_k", config.diffuse_k),
            specular_k: clamp_unit("specular_k", config.specular_k),
            shininess,
        }
    }
}

/// Height-map offset technique applied in the fragment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallaxMethod {
    #[default]
    Off,
    Simple,
    Steep,
    Occlusion,
}

impl ParallaxMethod {
    pub const ALL: [ParallaxMethod; 4] = [
        ParallaxMethod::Off,
        ParallaxMethod::Simple,
        ParallaxMethod::Steep,
        ParallaxMethod::Occlusion,
    ];

    /// Value of the `_parallaxMethod` uniform.
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn label(self) -> &'static str {
        match self {
            ParallaxMethod::Off => "Off",
            ParallaxMethod::Simple => "Simple",
            ParallaxMethod::Steep => "Steep",
            ParallaxMethod::Occlusion => "Occlusion",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxSettings {
    pub method: ParallaxMethod,
    /// Drop fragments whose offset UV leaves the 0..1 range.
    pub discard_out_of_bounds: bool,
    pub height_scale: f32,
    /// Layer range used by the steep and occlusion methods.
    pub min_layers: u32,
    pub max_layers: u32,
}

impl Default for ParallaxSettings {
    fn default() -> Self {
        Self::from_config(&ParallaxConfig::default())
    }
}

pub const MIN_LAYERS: u32 = 1;
pub const MIN_MAX_LAYERS: u32 = 2;

impl ParallaxSettings {
    pub fn from_config(config: &ParallaxConfig) -> Self {
        let method = ParallaxMethod::from_name(&config.method).unwrap_or_else(|| {
            warn!("Unknown parallax method '{}', using off", config.method);
            ParallaxMethod::Off
        });
        let height_scale = if config.height_scale.is_finite() && config.height_scale >= 0.0 {
            config.height_scale
        } else {
            warn!("parallax: height_scale must be >= 0 (got {}), using 0", config.height_scale);
            0.0
        };

        let mut settings = Self {
            method,
            discard_out_of_bounds: config.discard_out_of_bounds,
            height_scale,
            min_layers: config.min_layers,
            max_layers: config.max_layers,
        };
        if settings.clamp_layers() {
            warn!(
                "parallax: layers must satisfy {MIN_LAYERS} <= min <= max (got {}..{}), clamping",
                config.min_layers, config.max_layers
            );
        }
        settings
    }

    /// Keeps `min_layers >= 1` and `max_layers >= max(2, min_layers)`.
    /// Returns whether anything changed.
    pub fn clamp_layers(&mut self) -> bool {
        let min_layers = self.min_layers.max(MIN_LAYERS);
        let max_layers = self.max_layers.max(MIN_MAX_LAYERS).max(min_layers);
        let changed = min_layers != self.min_layers || max_layers != self.max_layers;
        self.min_layers = min_layers;
        self.max_layers = max_layers;
        changed
    }
}
