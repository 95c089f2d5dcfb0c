use crate::scene::camera::{Camera, Orientation};
use crate::scene::context::{ShapeSlot, ViewerSettings};
use crate::scene::light::{LightRig, MAX_LIGHTS};
use crate::scene::material::{MIN_LAYERS, MIN_MAX_LAYERS, MaterialSettings, ParallaxMethod, ParallaxSettings};
use crate::scene::procgen::{MAX_SEGMENTS, MIN_LENGTH, MIN_PLANE_SUBDIVISIONS, MIN_RADIAL_SEGMENTS, ShapeParams};
use crate::ui::input::Controller;
use egui::{DragValue, RichText, Slider};
use nalgebra::{Point3, Vector3};

fn vec3_row(ui: &mut egui::Ui, label: &str, value: &mut Vector3<f32>, speed: f64) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(DragValue::new(&mut value.x).speed(speed).prefix("x: "));
        ui.add(DragValue::new(&mut value.y).speed(speed).prefix("y: "));
        ui.add(DragValue::new(&mut value.z).speed(speed).prefix("z: "));
    });
}

fn point3_row(ui: &mut egui::Ui, label: &str, value: &mut Point3<f32>, speed: f64) {
    vec3_row(ui, label, &mut value.coords, speed);
}

fn length_drag(ui: &mut egui::Ui, label: &str, value: &mut f32) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(DragValue::new(value).speed(0.01).range(MIN_LENGTH..=100.0));
    });
}

fn count_slider(ui: &mut egui::Ui, label: &str, value: &mut u32, min: u32) {
    ui.add(
        Slider::new(value, min..=MAX_SEGMENTS.min(128))
            .clamping(egui::SliderClamping::Never)
            .text(label),
    );
}

/// Display toggles, read back by the viewport every frame.
pub fn display_panel(ui: &mut egui::Ui, settings: &mut ViewerSettings) {
    ui.horizontal(|ui| {
        ui.label("Background:");
        ui.color_edit_button_rgb(&mut settings.background);
    });
    ui.horizontal(|ui| {
        ui.label("Wire color:");
        ui.color_edit_button_rgb(&mut settings.wire_color);
    });
    ui.checkbox(&mut settings.draw_as_points, "Draw as points");
    ui.checkbox(&mut settings.back_face_culling, "Back-face culling");
    ui.checkbox(&mut settings.show_lights, "Show lights");
    ui.checkbox(&mut settings.show_tangents, "Show tangents");
}

pub fn material_panel(ui: &mut egui::Ui, material: &mut MaterialSettings) {
    ui.add(Slider::new(&mut material.ambient_k, 0.0..=1.0).text("Ambient intensity"));
    ui.horizontal(|ui| {
        ui.label("Ambient color:");
        let mut color = [
            material.ambient_color.x,
            material.ambient_color.y,
            material.ambient_color.z,
        ];
        if ui.color_edit_button_rgb(&mut color).changed() {
            material.ambient_color = Vector3::from(color);
        }
    });
    ui.add(Slider::new(&mut material.diffuse_k, 0.0..=1.0).text("Diffuse intensity"));
    ui.add(Slider::new(&mut material.specular_k, 0.0..=1.0).text("Specular intensity"));
    ui.horizontal(|ui| {
        ui.label("Shininess:");
        ui.add(DragValue::new(&mut material.shininess).speed(0.05).range(0.0..=f32::MAX));
    });
}

pub fn parallax_panel(ui: &mut egui::Ui, parallax: &mut ParallaxSettings) {
    egui::ComboBox::from_label("Method")
        .selected_text(parallax.method.label())
        .show_ui(ui, |ui| {
            for method in ParallaxMethod::ALL {
                ui.selectable_value(&mut parallax.method, method, method.label());
            }
        });
    ui.checkbox(&mut parallax.discard_out_of_bounds, "Discard out of bound frags");
    ui.horizontal(|ui| {
        ui.label("Height scale:");
        ui.add(DragValue::new(&mut parallax.height_scale).speed(0.01).range(0.0..=f32::MAX));
    });
    ui.horizontal(|ui| {
        ui.label("Layers:");
        ui.add(DragValue::new(&mut parallax.min_layers).range(MIN_LAYERS..=9999).prefix("min: "));
        ui.add(DragValue::new(&mut parallax.max_layers).range(MIN_MAX_LAYERS..=9999).prefix("max: "));
    });
    parallax.clamp_layers();
}

/// Camera pose and projection. Returns `true` when "Reset camera" was clicked.
pub fn camera_panel(ui: &mut egui::Ui, camera: &mut Camera) -> bool {
    point3_row(ui, "Position:", &mut camera.position, 0.05);
    match &mut camera.orientation {
        Orientation::Target(target) => point3_row(ui, "Target:", target, 0.05),
        Orientation::YawPitch { yaw_deg, pitch_deg } => {
            ui.label(format!("Yaw: {yaw_deg:.1}°  Pitch: {pitch_deg:.1}°"));
        }
    }

    let mut orthographic = camera.is_orthographic();
    if ui.checkbox(&mut orthographic, "Orthographic").changed() {
        camera.set_orthographic(orthographic);
    }
    if orthographic {
        ui.add(Slider::new(&mut camera.ortho_height, 0.1..=50.0).text("View height"));
    } else {
        ui.add(Slider::new(&mut camera.fov_deg, 1.0..=179.0).text("FOV (deg)"));
    }

    ui.horizontal(|ui| {
        ui.label("Near:");
        ui.add(DragValue::new(&mut camera.near).speed(0.01).range(0.001..=1000.0));
        ui.label("Far:");
        ui.add(DragValue::new(&mut camera.far).speed(0.5).range(0.01..=10000.0));
    });
    if let Err(e) = camera.validate() {
        ui.label(RichText::new(e.to_string()).color(egui::Color32::YELLOW));
    }

    ui.button("Reset camera").clicked()
}

pub fn controller_panel(ui: &mut egui::Ui, controller: &mut Controller) {
    match controller {
        Controller::Free(c) => {
            ui.label(format!("Yaw: {:.1}°  Pitch: {:.1}°", c.yaw, c.pitch));
            ui.add(Slider::new(&mut c.sensitivity, 0.01..=1.0).text("Sensitivity"));
            ui.add(Slider::new(&mut c.move_speed, 0.1..=50.0).text("Move speed"));
            ui.add(Slider::new(&mut c.sprint_speed, 0.1..=100.0).text("Sprint speed"));
            ui.small("Hold RMB to look, WASD to move, E/Q up/down, Shift to sprint");
        }
        Controller::Orbit(c) => {
            ui.label(format!("Distance: {:.2}", c.distance()));
            ui.add(Slider::new(&mut c.sensitivity, 0.01..=1.0).text("Sensitivity"));
            ui.add(Slider::new(&mut c.zoom_speed, 0.01..=5.0).text("Zoom speed"));
            ui.small("Hold RMB to orbit, scroll to zoom");
        }
    }
}

/// Parameters and transform of one shape. Mesh rebuilding happens later, when
/// the frame notices the parameters changed.
pub fn shape_panel(ui: &mut egui::Ui, index: usize, slot: &mut ShapeSlot) {
    ui.push_id(index, |ui| {
        ui.collapsing(format!("{} #{index}", slot.name()), |ui| {
            match &mut slot.params {
                ShapeParams::Plane {
                    width,
                    height,
                    subdivisions,
                } => {
                    length_drag(ui, "Width:", width);
                    length_drag(ui, "Height:", height);
                    count_slider(ui, "Subdivisions", subdivisions, MIN_PLANE_SUBDIVISIONS);
                }
                ShapeParams::Cylinder {
                    height,
                    radius,
                    segments,
                } => {
                    length_drag(ui, "Height:", height);
                    length_drag(ui, "Radius:", radius);
                    count_slider(ui, "Segments", segments, MIN_RADIAL_SEGMENTS);
                }
                ShapeParams::Sphere { radius, segments } => {
                    length_drag(ui, "Radius:", radius);
                    count_slider(ui, "Segments", segments, MIN_RADIAL_SEGMENTS);
                }
                ShapeParams::Torus {
                    inner_radius,
                    outer_radius,
                    inner_segments,
                    outer_segments,
                } => {
                    length_drag(ui, "Inner radius:", inner_radius);
                    length_drag(ui, "Outer radius:", outer_radius);
                    count_slider(ui, "Inner segments", inner_segments, MIN_RADIAL_SEGMENTS);
                    count_slider(ui, "Outer segments", outer_segments, MIN_RADIAL_SEGMENTS);
                }
            }

            ui.separator();
            vec3_row(ui, "Position:", &mut slot.transform.position, 0.05);
            vec3_row(ui, "Rotation:", &mut slot.transform.rotation_deg, 1.0);
            vec3_row(ui, "Scale:", &mut slot.transform.scale, 0.01);

            let mesh = slot.mesh();
            ui.small(format!(
                "{} vertices, {} triangles",
                mesh.vertices.len(),
                mesh.triangle_count()
            ));
        });
    });
}

pub fn lights_panel(ui: &mut egui::Ui, rig: &mut LightRig) {
    ui.add(Slider::new(&mut rig.active, 1..=MAX_LIGHTS).text("Active lights"));
    ui.checkbox(&mut rig.animate, "Animate");
    ui.add(Slider::new(&mut rig.orbit_radius, 0.1..=20.0).text("Orbit radius"));
    ui.add(Slider::new(&mut rig.orbit_speed, -5.0..=5.0).text("Orbit speed"));
    ui.add(Slider::new(&mut rig.height, -10.0..=10.0).text("Height"));

    let active = rig.active.clamp(1, MAX_LIGHTS);
    for (i, light) in rig.lights.iter_mut().take(active).enumerate() {
        ui.horizontal(|ui| {
            ui.label(format!("Light {i}:"));
            let mut color = [light.color.x, light.color.y, light.color.z];
            if ui.color_edit_button_rgb(&mut color).changed() {
                light.color = Vector3::from(color);
            }
        });
    }
}
