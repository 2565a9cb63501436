use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::WindowResized;
use bevy_egui::EguiContexts;
use std::time::Duration;

use crate::app::events::FocusOnNode;
use crate::graph::GraphStore;
use crate::render::bevy_surface::SceneCache;
use crate::render::scene::SceneRenderer;
use crate::sim::LayoutLifecycle;
use crate::util::config::CameraSettings;

const HOME_OFFSET: Vec3 = Vec3::new(0.0, 50.0, 200.0);
const FRAME_OFFSET: Vec3 = Vec3::new(0.0, -50.0, 350.0);
const MAX_ELEVATION: f32 = 1.48;
const ORBIT_SPEED: f32 = 0.005;
const ZOOM_STEP: f32 = 0.1;
const FRAME_MARGIN: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from_target: Vec3,
    from_offset: Vec3,
    to_target: Vec3,
    to_offset: Vec3,
    elapsed: f32,
    duration: f32,
}

/// Orbit camera described as a look-at target plus an offset from it.
#[derive(Resource, Debug, Clone)]
pub struct CameraRig {
    target: Vec3,
    offset: Vec3,
    min_distance: f32,
    max_distance: f32,
    focus_offset: Vec3,
    focus_duration: Duration,
    transition: Option<Transition>,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}

impl CameraRig {
    pub fn new(cfg: &CameraSettings) -> Self {
        Self {
            target: Vec3::ZERO,
            offset: HOME_OFFSET,
            min_distance: cfg.min_distance,
            max_distance: cfg.max_distance.max(cfg.min_distance),
            focus_offset: Vec3::from_array(cfg.focus_offset),
            focus_duration: Duration::from_millis(cfg.focus_duration_ms),
            transition: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.target + self.offset
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.offset.length()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    /// Rotates the offset around the target. Interrupts any transition.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.transition = None;
        let radius = self.offset.length().max(f32::EPSILON);
        let mut azimuth = self.offset.x.atan2(self.offset.z);
        let mut elevation = (self.offset.y / radius).clamp(-1.0, 1.0).asin();
        azimuth -= yaw;
        elevation = (elevation + pitch).clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.offset = Vec3::new(
            radius * elevation.cos() * azimuth.sin(),
            radius * elevation.sin(),
            radius * elevation.cos() * azimuth.cos(),
        );
    }

    /// Scales the distance to the target, kept within the configured bounds.
    pub fn zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.transition = None;
        let d = (self.offset.length() * factor).clamp(self.min_distance, self.max_distance);
        self.offset = self.offset.try_normalize().unwrap_or(Vec3::Z) * d;
    }

    /// Starts an eased move that ends looking at `point` from the focus offset.
    pub fn fly_to(&mut self, point: Vec3) {
        self.start(point, self.focus_offset);
    }

    /// Centers on a cloud of points, backing off along the framing offset
    /// when the cloud is too wide for it.
    pub fn frame_points(&mut self, center: Vec3, radius: f32) {
        let base = FRAME_OFFSET.length();
        let d = (radius * FRAME_MARGIN)
            .max(base)
            .clamp(self.min_distance, self.max_distance);
        self.start(center, FRAME_OFFSET * (d / base));
    }

    pub fn reset(&mut self) {
        self.start(Vec3::ZERO, HOME_OFFSET);
    }

    fn start(&mut self, to_target: Vec3, to_offset: Vec3) {
        let duration = self.focus_duration.as_secs_f32();
        if duration <= 0.0 {
            self.target = to_target;
            self.offset = to_offset;
            self.transition = None;
            return;
        }
        self.transition = Some(Transition {
            from_target: self.target,
            from_offset: self.offset,
            to_target,
            to_offset,
            elapsed: 0.0,
            duration,
        });
    }

    /// Moves an active transition forward. Returns true while animating.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let Some(mut t) = self.transition else {
            return false;
        };
        t.elapsed += dt.as_secs_f32();
        let k = smoothstep((t.elapsed / t.duration).min(1.0));
        self.target = t.from_target.lerp(t.to_target, k);
        self.offset = t.from_offset.lerp(t.to_offset, k);
        if t.elapsed >= t.duration {
            self.target = t.to_target;
            self.offset = t.to_offset;
            self.transition = None;
            false
        } else {
            self.transition = Some(t);
            true
        }
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    rig: Res<CameraRig>,
    cfg: Res<crate::app::resources::Settings>,
) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 250.0,
    });
    commands.spawn(PointLightBundle {
        point_light: PointLight {
            intensity: 2.0e7,
            range: 4000.0,
            shadows_enabled: false,
            ..default()
        },
        transform: Transform::from_xyz(200.0, 400.0, 300.0),
        ..default()
    });

    commands.spawn(Camera3dBundle {
        transform: rig.transform(),
        projection: PerspectiveProjection {
            fov: cfg.0.camera.fov_degrees.to_radians(),
            far: 10_000.0,
            ..default()
        }
        .into(),
        ..default()
    });

    commands.insert_resource(SceneCache::new(&mut meshes, &mut materials));
}

pub fn camera_controls(
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    mut contexts: EguiContexts,
    mut rig: ResMut<CameraRig>,
) {
    let egui_busy = contexts.ctx_mut().wants_pointer_input();

    let mut delta = Vec2::ZERO;
    for ev in motion.read() {
        delta += ev.delta;
    }
    let mut scroll = 0.0;
    for ev in wheel.read() {
        scroll += ev.y;
    }
    if egui_busy {
        return;
    }

    if buttons.pressed(MouseButton::Right) && delta != Vec2::ZERO {
        rig.orbit(delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
    }
    if scroll != 0.0 {
        rig.zoom((1.0 - scroll.signum() * ZOOM_STEP).powf(scroll.abs()));
    }
}

pub fn apply_focus_requests(
    mut events: EventReader<FocusOnNode>,
    mut store: ResMut<GraphStore>,
    layout: Res<LayoutLifecycle>,
    mut rig: ResMut<CameraRig>,
) {
    let mut wanted = None;
    for FocusOnNode(id) in events.read() {
        wanted = Some(id.clone());
    }
    if let Some(id) = store.take_focus_request() {
        wanted = Some(id);
    }
    let Some(id) = wanted else {
        return;
    };
    match layout.sim.position(&id) {
        Some(at) => rig.fly_to(at),
        None => tracing::debug!(%id, "focus target not in visible layout"),
    }
}

/// Frames the whole layout once the first data load has cooled down.
pub fn frame_on_ready(mut layout: ResMut<LayoutLifecycle>, mut rig: ResMut<CameraRig>) {
    if !layout.take_frame_ready() {
        return;
    }
    let Some(center) = layout.sim.centroid() else {
        return;
    };
    let radius = layout
        .sim
        .nodes()
        .iter()
        .map(|n| n.position.distance(center))
        .fold(0.0, f32::max);
    rig.frame_points(center, radius);
}

pub fn apply_camera_rig(
    time: Res<Time>,
    mut rig: ResMut<CameraRig>,
    mut cam_q: Query<&mut Transform, With<Camera3d>>,
) {
    rig.advance(time.delta());
    let Ok(mut tf) = cam_q.get_single_mut() else {
        return;
    };
    *tf = rig.transform();
}

pub fn observe_resize(mut events: EventReader<WindowResized>, mut renderer: ResMut<SceneRenderer>) {
    if let Some(ev) = events.read().last() {
        renderer.resize(ev.width, ev.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_the_home_pose() {
        let rig = CameraRig::default();
        assert_eq!(rig.position(), Vec3::new(0.0, 50.0, 200.0));
        assert_eq!(rig.target(), Vec3::ZERO);
    }

    #[test]
    fn fly_to_eases_and_lands_on_the_offset() {
        let mut rig = CameraRig::default();
        let node = Vec3::new(40.0, -10.0, 5.0);
        rig.fly_to(node);

        assert!(rig.advance(Duration::from_millis(400)));
        let half = rig.target();
        assert!((half - node * 0.5).length() < 1e-3);

        assert!(!rig.advance(Duration::from_millis(400)));
        assert_eq!(rig.target(), node);
        assert_eq!(rig.position(), node + Vec3::new(0.0, 50.0, 100.0));
        assert!(!rig.is_animating());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut rig = CameraRig::default();
        rig.zoom(0.0001);
        assert!((rig.distance() - 50.0).abs() < 1e-3);
        rig.zoom(1000.0);
        assert!((rig.distance() - 2000.0).abs() < 1e-2);
        rig.zoom(f32::NAN);
        assert!((rig.distance() - 2000.0).abs() < 1e-2);
    }

    #[test]
    fn orbit_keeps_distance_and_interrupts_flight() {
        let mut rig = CameraRig::default();
        let d = rig.distance();
        rig.fly_to(Vec3::X * 100.0);
        rig.orbit(0.7, 0.2);
        assert!(!rig.is_animating());
        assert!((rig.distance() - d).abs() < 1e-2);

        rig.orbit(0.0, 10.0);
        assert!(rig.offset.y < rig.distance());
    }

    #[test]
    fn framing_backs_off_with_radius() {
        let mut rig = CameraRig::default();
        rig.frame_points(Vec3::new(10.0, 0.0, 0.0), 300.0);
        while rig.advance(Duration::from_millis(100)) {}
        assert_eq!(rig.target(), Vec3::new(10.0, 0.0, 0.0));
        assert!((rig.distance() - 750.0).abs() < 1e-2);
    }

    #[test]
    fn small_clouds_use_the_plain_framing_offset() {
        let mut rig = CameraRig::default();
        rig.frame_points(Vec3::ZERO, 20.0);
        while rig.advance(Duration::from_millis(100)) {}
        assert!((rig.position() - Vec3::new(0.0, -50.0, 350.0)).length() < 1e-3);
    }

    #[test]
    fn reset_returns_home() {
        let mut rig = CameraRig::default();
        rig.fly_to(Vec3::splat(80.0));
        while rig.advance(Duration::from_millis(100)) {}
        rig.reset();
        while rig.advance(Duration::from_millis(100)) {}
        assert_eq!(rig.position(), Vec3::new(0.0, 50.0, 200.0));
    }
}
