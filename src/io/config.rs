use crate::scene::procgen::ShapeParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub lights: LightsConfig,
    #[serde(default)]
    pub material: MaterialConfig,
    #[serde(default)]
    pub parallax: ParallaxConfig,
    #[serde(default = "default_shapes")]
    pub shapes: Vec<ShapeConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            controller: ControllerConfig::default(),
            lights: LightsConfig::default(),
            material: MaterialConfig::default(),
            parallax: ParallaxConfig::default(),
            shapes: default_shapes(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_background")]
    pub background: [f32; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            background: default_background(),
        }
    }
}

fn default_width() -> f32 {
    1080.0
}
fn default_height() -> f32 {
    720.0
}
fn default_title() -> String {
    "Procedural Geometry".to_string()
}
fn default_background() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_projection")]
    pub projection: String, // "perspective", "orthographic"
    #[serde(default = "default_ortho_height")]
    pub ortho_height: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            target: [0.0, 0.0, 0.0],
            fov: default_fov(),
            projection: default_projection(),
            ortho_height: default_ortho_height(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 5.0]
}
fn default_fov() -> f32 {
    60.0
}
fn default_projection() -> String {
    "perspective".to_string()
}
fn default_ortho_height() -> f32 {
    6.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    100.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_mode")]
    pub mode: String, // "free", "orbit"
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_sprint_speed")]
    pub sprint_speed: f32,
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            sensitivity: default_sensitivity(),
            move_speed: default_move_speed(),
            sprint_speed: default_sprint_speed(),
            zoom_speed: default_zoom_speed(),
        }
    }
}

fn default_mode() -> String {
    "free".to_string()
}
fn default_sensitivity() -> f32 {
    0.1
}
fn default_move_speed() -> f32 {
    5.0
}
fn default_sprint_speed() -> f32 {
    10.0
}
fn default_zoom_speed() -> f32 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightsConfig {
    #[serde(default = "default_active_lights")]
    pub active: usize,
    #[serde(default = "default_true")]
    pub animate: bool,
    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f32,
    #[serde(default = "default_orbit_speed")]
    pub orbit_speed: f32,
    #[serde(default = "default_light_height")]
    pub height: f32,
    /// Overrides the default red/green/blue/yellow palette, in order.
    #[serde(default)]
    pub colors: Vec<[f32; 3]>,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            active: default_active_lights(),
            animate: true,
            orbit_radius: default_orbit_radius(),
            orbit_speed: default_orbit_speed(),
            height: default_light_height(),
            colors: Vec::new(),
        }
    }
}

fn default_active_lights() -> usize {
    4
}
fn default_true() -> bool {
    true
}
fn default_orbit_radius() -> f32 {
    3.0
}
fn default_orbit_speed() -> f32 {
    1.0
}
fn default_light_height() -> f32 {
    3.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialConfig {
    #[serde(default = "default_ambient_k")]
    pub ambient_k: f32,
    #[serde(default = "default_ambient_color")]
    pub ambient_color: [f32; 3],
    #[serde(default = "default_diffuse_k")]
    pub diffuse_k: f32,
    #[serde(default = "default_specular_k")]
    pub specular_k: f32,
    #[serde(default = "default_shininess")]
    pub shininess: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            ambient_k: default_ambient_k(),
            ambient_color: default_ambient_color(),
            diffuse_k: default_diffuse_k(),
            specular_k: default_specular_k(),
            shininess: default_shininess(),
        }
    }
}

fn default_ambient_k() -> f32 {
    0.2
}
fn default_ambient_color() -> [f32; 3] {
    [0.341, 0.365, 0.51]
}
fn default_diffuse_k() -> f32 {
    0.4
}
fn default_specular_k() -> f32 {
    0.5
}
fn default_shininess() -> f32 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParallaxConfig {
    #[serde(default = "default_parallax_method")]
    pub method: String, // "off", "simple", "steep", "occlusion"
    #[serde(default = "default_true")]
    pub discard_out_of_bounds: bool,
    #[serde(default = "default_height_scale")]
    pub height_scale: f32,
    #[serde(default = "default_min_layers")]
    pub min_layers: u32,
    #[serde(default = "default_max_layers")]
    pub max_layers: u32,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            method: default_parallax_method(),
            discard_out_of_bounds: true,
            height_scale: default_height_scale(),
            min_layers: default_min_layers(),
            max_layers: default_max_layers(),
        }
    }
}

fn default_parallax_method() -> String {
    "off".to_string()
}
fn default_height_scale() -> f32 {
    0.1
}
fn default_min_layers() -> u32 {
    8
}
fn default_max_layers() -> u32 {
    32
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeConfig {
    #[serde(flatten)]
    pub params: ShapeParams,

    // --- Transform ---
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl ShapeConfig {
    fn at(params: ShapeParams, x: f32) -> Self {
        Self {
            params,
            position: [x, 0.0, 0.0],
            rotation: [0.0; 3],
            scale: default_scale(),
        }
    }
}

fn default_shapes() -> Vec<ShapeConfig> {
    vec![
        ShapeConfig::at(
            ShapeParams::Cylinder {
                height: 2.0,
                radius: 1.0,
                segments: 8,
            },
            -6.0,
        ),
        ShapeConfig::at(
            ShapeParams::Plane {
                width: 1.0,
                height: 1.0,
                subdivisions: 5,
            },
            -3.0,
        ),
        ShapeConfig::at(
            ShapeParams::Sphere {
                radius: 1.0,
                segments: 8,
            },
            3.0,
        ),
        ShapeConfig::at(
            ShapeParams::Torus {
                inner_radius: 0.3,
                outer_radius: 2.0,
                inner_segments: 15,
                outer_segments: 15,
            },
            8.0,
        ),
    ]
}
