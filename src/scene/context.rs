use crate::core::geometry::TangentFrame;
use crate::core::math::transform::Transform;
use crate::io::config::{CameraConfig, Config, LightsConfig, ShapeConfig};
use crate::pipeline::sink::{
    BufferSink, MeshHandle, UniformSink, upload_frame_uniforms, upload_material_uniforms, upload_mesh_with_tangents,
    upload_model,
};
use crate::scene::camera::Camera;
use crate::scene::light::{LightRig, MAX_LIGHTS};
use crate::scene::material::{MaterialSettings, ParallaxSettings};
use crate::scene::mesh::Mesh;
use crate::scene::procgen::ShapeParams;
use log::{debug, info, warn};
use nalgebra::{Matrix4, Point3, Vector3};

/// Display toggles and shading parameters owned by the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSettings {
    pub background: [f32; 3],
    pub wire_color: [f32; 3],
    pub draw_as_points: bool,
    pub back_face_culling: bool,
    pub show_lights: bool,
    pub show_tangents: bool,
    pub material: MaterialSettings,
    pub parallax: ParallaxSettings,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            background: [0.1, 0.1, 0.1],
            wire_color: [0.9, 0.9, 0.9],
            draw_as_points: false,
            back_face_culling: false,
            show_lights: true,
            show_tangents: false,
            material: MaterialSettings::default(),
            parallax: ParallaxSettings::default(),
        }
    }
}

impl ViewerSettings {
    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self::default();
        settings.apply_config(config);
        settings
    }

    /// Takes over the configured background and shading, keeping display toggles.
    pub fn apply_config(&mut self, config: &Config) {
        self.background = config.window.background;
        self.material = MaterialSettings::from_config(&config.material);
        self.parallax = ParallaxSettings::from_config(&config.parallax);
    }
}

/// One generated shape: editable parameters plus the mesh and tangent frames
/// last built from them.
#[derive(Debug, Clone)]
pub struct ShapeSlot {
    pub params: ShapeParams,
    pub transform: Transform,
    mesh: Mesh,
    frames: Vec<TangentFrame>,
    built_from: ShapeParams,
    handle: Option<MeshHandle>,
}

impl ShapeSlot {
    /// Parameters are clamped up front, so `params` always holds the values
    /// the mesh was really built from.
    pub fn new(params: ShapeParams, transform: Transform) -> Self {
        let params = params.sanitized();
        let mesh = params.build();
        Self {
            params,
            transform,
            frames: mesh.tangent_frames(),
            mesh,
            built_from: params,
            handle: None,
        }
    }

    pub fn from_config(config: &ShapeConfig) -> Self {
        let transform = Transform {
            position: Vector3::from(config.position),
            rotation_deg: Vector3::from(config.rotation),
            scale: Vector3::from(config.scale),
        };
        Self::new(config.params, transform)
    }

    pub fn name(&self) -> &'static str {
        self.params.name()
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn tangent_frames(&self) -> &[TangentFrame] {
        &self.frames
    }

    pub fn handle(&self) -> Option<MeshHandle> {
        self.handle
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.model_matrix()
    }

    /// Regenerates the mesh and its tangent frames if the parameters changed
    /// since the last build. Edited parameters are clamped first.
    pub fn rebuild_if_changed(&mut self) -> bool {
        if self.params == self.built_from {
            return false;
        }
        self.params = self.params.sanitized();
        if self.params == self.built_from {
            return false;
        }
        self.mesh = self.params.build();
        self.frames = self.mesh.tangent_frames();
        self.built_from = self.params;
        debug!(
            "Rebuilt {}: {} vertices, {} triangles",
            self.name(),
            self.mesh.vertices.len(),
            self.mesh.triangle_count()
        );
        true
    }

    /// Makes sure the sink holds the current mesh, re-uploading only after a rebuild.
    pub fn sync<S: BufferSink + ?Sized>(&mut self, sink: &mut S) -> MeshHandle {
        let rebuilt = self.rebuild_if_changed();
        match self.handle {
            Some(handle) if !rebuilt => handle,
            previous => {
                if let Some(old) = previous {
                    sink.release(old);
                }
                let handle = upload_mesh_with_tangents(sink, &self.mesh, &self.frames);
                self.handle = Some(handle);
                handle
            }
        }
    }
}

/// A shape ready to be drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub handle: MeshHandle,
    pub model: Matrix4<f32>,
}

impl DrawItem {
    /// Binds this item's model matrix before its draw call.
    pub fn bind<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        upload_model(sink, &self.model);
    }
}

/// Holds everything a frame needs: camera, shapes, lights and display settings.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub camera: Camera,
    pub shapes: Vec<ShapeSlot>,
    pub lights: LightRig,
    pub settings: ViewerSettings,
}

impl SceneContext {
    pub fn from_config(config: &Config) -> Self {
        let mut camera = camera_from_config(&config.camera);
        camera.set_viewport(config.window.width, config.window.height);
        if let Err(e) = camera.validate() {
            warn!("Camera config: {e}; values will be clamped when projecting");
        }

        let shapes: Vec<ShapeSlot> = config.shapes.iter().map(ShapeSlot::from_config).collect();
        for shape in &shapes {
            info!(
                "Built {}: {} vertices, {} triangles",
                shape.name(),
                shape.mesh().vertices.len(),
                shape.mesh().triangle_count()
            );
        }

        Self {
            camera,
            shapes,
            lights: lights_from_config(&config.lights),
            settings: ViewerSettings::from_config(config),
        }
    }

    /// Applies a freshly loaded config: shapes, lights, background and shading
    /// are replaced, the camera pose and display toggles are kept.
    pub fn reload<S: BufferSink + ?Sized>(&mut self, config: &Config, sink: &mut S) {
        for handle in self.shapes.iter().filter_map(ShapeSlot::handle) {
            sink.release(handle);
        }
        self.shapes = config.shapes.iter().map(ShapeSlot::from_config).collect();
        self.lights = lights_from_config(&config.lights);
        self.settings.apply_config(config);
        info!("Reloaded {} shapes", self.shapes.len());
    }

    /// Advances the light rig, syncs meshes with the sink and uploads the
    /// per-frame uniforms. Each returned item still needs [`DrawItem::bind`].
    pub fn prepare_frame<S: BufferSink + UniformSink + ?Sized>(
        &mut self,
        sink: &mut S,
        time: f32,
    ) -> Vec<DrawItem> {
        self.lights.update(time);
        upload_frame_uniforms(sink, &self.camera, &self.lights);
        upload_material_uniforms(sink, &self.settings.material, &self.settings.parallax);
        self.shapes
            .iter_mut()
            .map(|shape| DrawItem {
                handle: shape.sync(sink),
                model: shape.model_matrix(),
            })
            .collect()
    }
}

fn camera_from_config(config: &CameraConfig) -> Camera {
    let position = Point3::from(config.position);
    let target = Point3::from(config.target);
    // Both projections stay configured so the UI toggle can switch between them.
    match config.projection.as_str() {
        "orthographic" => Camera {
            fov_deg: config.fov,
            ..Camera::new_orthographic(position, target, config.ortho_height, 1.0, config.near, config.far)
        },
        other => {
            if other != "perspective" {
                warn!("Unknown projection '{other}', using perspective");
            }
            Camera {
                ortho_height: config.ortho_height,
                ..Camera::new_perspective(position, target, config.fov, 1.0, config.near, config.far)
            }
        }
    }
}

fn lights_from_config(config: &LightsConfig) -> LightRig {
    if config.active == 0 || config.active > MAX_LIGHTS {
        warn!(
            "lights.active must be within 1..={MAX_LIGHTS} (got {}), clamping",
            config.active
        );
    }
    if config.colors.len() > MAX_LIGHTS {
        warn!("Only the first {MAX_LIGHTS} light colors are used");
    }

    let mut rig = LightRig {
        active: config.active.clamp(1, MAX_LIGHTS),
        animate: config.animate,
        orbit_radius: config.orbit_radius,
        orbit_speed: config.orbit_speed,
        height: config.height,
        ..LightRig::default()
    };
    for (light, color) in rig.lights.iter_mut().zip(&config.colors) {
        light.color = Vector3::from(*color);
    }
    rig.update(0.0);
    rig
}
