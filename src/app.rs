use crate::io::config::Config;
use crate::io::obj_export::{ExportError, export_obj};
use crate::pipeline::wireframe::{DrawStyle, WireframeRenderer};
use crate::scene::context::SceneContext;
use crate::scene::mesh::MeshError;
use crate::ui::input::{Controller, InputSnapshot, LookState, MoveKey};
use crate::ui::panels;
use egui::viewport::CursorGrab;
use egui::{Color32, RichText, Sense, ViewportCommand};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("shape #{index} ({name}) produced an invalid mesh: {source}")]
    InvalidMesh {
        index: usize,
        name: &'static str,
        #[source]
        source: MeshError,
    },
    #[error("failed to create export directory '{path}': {source}")]
    ExportDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
}

fn to_color32(rgb: [f32; 3]) -> Color32 {
    let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgb(r, g, b)
}

/// Builds the controller variant requested by the config for `context`'s camera.
pub fn controller_from_config(config: &Config, context: &SceneContext) -> Controller {
    let c = &config.controller;
    Controller::from_mode(
        &c.mode,
        c.sensitivity,
        c.move_speed,
        c.sprint_speed,
        c.zoom_speed,
        &context.camera,
    )
}

//=================================
// Interactive viewer
//=================================

pub struct GraphicsLabApp {
    context: SceneContext,
    controller: Controller,
    renderer: WireframeRenderer,
    config_path: Option<PathBuf>,
    look_state: LookState,
    status: String,
}

impl GraphicsLabApp {
    pub fn new(config: Config, config_path: Option<PathBuf>, cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let context = SceneContext::from_config(&config);
        let controller = controller_from_config(&config, &context);
        Self {
            context,
            controller,
            renderer: WireframeRenderer::new(),
            config_path,
            look_state: LookState::Free,
            status: "Ready".to_string(),
        }
    }

    fn reload_config(&mut self) {
        let Some(path) = &self.config_path else {
            self.status = "No config file to reload".to_string();
            return;
        };
        info!("Reloading configuration...");
        match Config::load(path) {
            Ok(config) => {
                self.context.reload(&config, &mut self.renderer);
                let c = &config.controller;
                match &mut self.controller {
                    Controller::Free(free) => {
                        free.sensitivity = c.sensitivity;
                        free.move_speed = c.move_speed;
                        free.sprint_speed = c.sprint_speed;
                    }
                    Controller::Orbit(orbit) => {
                        orbit.sensitivity = c.sensitivity;
                        orbit.zoom_speed = c.zoom_speed;
                    }
                }
                self.status = "Config reloaded".to_string();
                info!("Hot reload successful!");
            }
            Err(e) => {
                warn!("Failed to reload config: {e}");
                self.status = format!("Reload failed: {e}");
            }
        }
    }

    fn reset_camera(&mut self) {
        self.context.camera.reset();
        self.controller.sync_to(&self.context.camera);
        info!("Camera reset");
    }

    fn draw_side_panel(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.collapsing("Display", |ui| {
                panels::display_panel(ui, &mut self.context.settings);
            });

            ui.collapsing("Camera", |ui| {
                if panels::camera_panel(ui, &mut self.context.camera) {
                    self.reset_camera();
                }
                ui.separator();
                panels::controller_panel(ui, &mut self.controller);
            });

            ui.collapsing("Shapes", |ui| {
                for (i, slot) in self.context.shapes.iter_mut().enumerate() {
                    panels::shape_panel(ui, i, slot);
                }
            });

            ui.collapsing("Material", |ui| {
                panels::material_panel(ui, &mut self.context.settings.material);
            });

            ui.collapsing("Lights", |ui| {
                panels::lights_panel(ui, &mut self.context.lights);
            });

            ui.collapsing("Parallax mapping", |ui| {
                panels::parallax_panel(ui, &mut self.context.settings.parallax);
            });

            ui.separator();
            if ui.button("Reload config (R)").clicked() {
                self.reload_config();
            }
        });
    }

    /// Reads this frame's input for the camera controller.
    fn input_snapshot(&self, ctx: &egui::Context, viewport: &egui::Response) -> (InputSnapshot, f32) {
        let keyboard_free = !ctx.wants_keyboard_input();
        ctx.input(|i| {
            // Look mode only starts over the viewport, but survives leaving it.
            let look_held = i.pointer.secondary_down()
                && (viewport.hovered() || self.look_state == LookState::Looking);

            let mut keys = Vec::new();
            if keyboard_free {
                for (key, mapped) in [
                    (egui::Key::W, MoveKey::Forward),
                    (egui::Key::S, MoveKey::Back),
                    (egui::Key::A, MoveKey::Left),
                    (egui::Key::D, MoveKey::Right),
                    (egui::Key::E, MoveKey::Up),
                    (egui::Key::Q, MoveKey::Down),
                ] {
                    if i.key_down(key) {
                        keys.push(mapped);
                    }
                }
                if i.modifiers.shift {
                    keys.push(MoveKey::Sprint);
                }
            }

            let scroll = if viewport.hovered() {
                i.smooth_scroll_delta.y / 50.0
            } else {
                0.0
            };
            let cursor = i.pointer.latest_pos().unwrap_or_default();

            let snapshot = InputSnapshot {
                look_held,
                cursor: nalgebra::Vector2::new(cursor.x, cursor.y),
                keys,
                scroll,
            };
            (snapshot, i.stable_dt)
        })
    }

    fn apply_cursor_mode(&mut self, ctx: &egui::Context, state: LookState) {
        if state == self.look_state {
            return;
        }
        let looking = state == LookState::Looking;
        ctx.send_viewport_cmd(ViewportCommand::CursorVisible(!looking));
        ctx.send_viewport_cmd(ViewportCommand::CursorGrab(if looking {
            CursorGrab::Confined
        } else {
            CursorGrab::None
        }));
        debug!("Cursor {}", if looking { "captured" } else { "released" });
        self.look_state = state;
    }

    fn draw_viewport(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        self.context.camera.set_viewport(rect.width(), rect.height());

        let (input, dt) = self.input_snapshot(ctx, &response);
        let state = self.controller.update(&input, &mut self.context.camera, dt);
        self.apply_cursor_mode(ctx, state);

        let time = ctx.input(|i| i.time) as f32;
        let items = self.context.prepare_frame(&mut self.renderer, time);

        let settings = &self.context.settings;
        painter.rect_filled(rect, 0.0, to_color32(settings.background));
        let style = DrawStyle {
            color: to_color32(settings.wire_color),
            draw_as_points: settings.draw_as_points,
            cull_back_faces: settings.back_face_culling,
            show_tangents: settings.show_tangents,
            ..DrawStyle::default()
        };
        for item in &items {
            item.bind(&mut self.renderer);
            self.renderer.draw(item.handle, &style, &painter, rect);
        }

        if settings.show_lights {
            for light in self.context.lights.active_lights() {
                if let Some(p) = self.renderer.project_point(&light.position, rect.size()) {
                    let color = to_color32([light.color.x, light.color.y, light.color.z]);
                    painter.circle_filled(rect.min + p.to_vec2(), 5.0, color);
                }
            }
        }
    }
}

impl eframe::App for GraphicsLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::R)) {
            self.reload_config();
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Graphics Lab");
                ui.separator();
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let dt = ctx.input(|i| i.stable_dt).max(1e-4);
                    ui.label(RichText::new(format!("{:.0} FPS", 1.0 / dt)).color(Color32::GREEN));
                });
            });
        });

        egui::SidePanel::left("left_panel")
            .min_width(320.0)
            .show(ctx, |ui| {
                self.draw_side_panel(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_viewport(ctx, ui);
            });

        ctx.request_repaint();
    }
}

/// Opens the interactive viewer.
pub fn run_gui(config: Config, config_path: Option<PathBuf>) -> Result<(), eframe::Error> {
    info!(
        "Starting GUI mode ({}x{})...",
        config.window.width, config.window.height
    );
    info!("Controls: RMB=Look, WASD=Move, E/Q=Up/Down, Shift=Sprint, R=Reload Config");

    let title = config.window.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(GraphicsLabApp::new(config, config_path, cc)))),
    )
}

//=================================
// Headless mode
//=================================

/// What headless mode produced for one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSummary {
    pub name: &'static str,
    pub vertices: usize,
    pub triangles: usize,
    /// Tangent frames the sink received for this shape.
    pub tangent_frames: usize,
    pub exported: Option<PathBuf>,
}

/// Builds and validates every configured shape without opening a window,
/// optionally writing each one to `export_dir` as OBJ.
pub fn run_headless(config: &Config, export_dir: Option<&Path>) -> Result<Vec<ShapeSummary>, AppError> {
    info!("Starting headless mode...");
    let start_time = Instant::now();

    if let Some(dir) = export_dir {
        fs::create_dir_all(dir).map_err(|source| AppError::ExportDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut context = SceneContext::from_config(config);
    for (index, shape) in context.shapes.iter().enumerate() {
        let name = shape.name();
        shape
            .mesh()
            .validate()
            .map_err(|source| AppError::InvalidMesh { index, name, source })?;
    }

    // One frame through the wireframe sink to check the upload path.
    let mut renderer = WireframeRenderer::new();
    let items = context.prepare_frame(&mut renderer, 0.0);
    debug!("Prepared {} draw items", items.len());

    let mut summaries = Vec::with_capacity(context.shapes.len());
    for (index, (shape, item)) in context.shapes.iter().zip(&items).enumerate() {
        let name = shape.name();
        let mesh = shape.mesh();
        let tangent_frames = renderer.tangent_count(item.handle).unwrap_or(0);
        if tangent_frames != mesh.vertices.len() {
            warn!(
                "{name} #{index}: sink holds {tangent_frames} tangent frames for {} vertices",
                mesh.vertices.len()
            );
        }

        let exported = match export_dir {
            Some(dir) => {
                let path = dir.join(format!("{index:02}_{name}.obj"));
                export_obj(mesh, name, &path)?;
                Some(path)
            }
            None => None,
        };

        info!(
            "{name} #{index}: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        summaries.push(ShapeSummary {
            name,
            vertices: mesh.vertices.len(),
            triangles: mesh.triangle_count(),
            tangent_frames,
            exported,
        });
    }

    info!("Done in {:.2?}", start_time.elapsed());
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_conversion_clamps() {
        assert_eq!(to_color32([1.0, 0.0, 0.5]), Color32::from_rgb(255, 0, 128));
        assert_eq!(to_color32([2.0, -1.0, 0.0]), Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn headless_without_export_summarizes_default_shapes() {
        let summaries = run_headless(&Config::default(), None).unwrap();
        let names: Vec<_> = summaries.iter().map(|s| s.name).collect();
        assert_eq!(names, ["cylinder", "plane", "sphere", "torus"]);
        // Plane with 5 subdivisions.
        assert_eq!(summaries[1].vertices, 36);
        assert_eq!(summaries[1].triangles, 50);
        assert!(summaries.iter().all(|s| s.exported.is_none()));
        assert!(summaries.iter().all(|s| s.tangent_frames == s.vertices));
    }

    #[test]
    fn headless_exports_one_file_per_shape() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("meshes");
        let summaries = run_headless(&Config::default(), Some(&out)).unwrap();

        for summary in &summaries {
            let path = summary.exported.as_ref().unwrap();
            assert!(path.starts_with(&out));
            assert!(path.exists());
        }
        assert!(out.join("03_torus.obj").exists());
    }

    #[test]
    fn controller_follows_config_mode() {
        let config = Config::parse("[controller]\nmode = \"orbit\"").unwrap();
        let context = SceneContext::from_config(&config);
        assert!(matches!(
            controller_from_config(&config, &context),
            Controller::Orbit(_)
        ));
    }
}
