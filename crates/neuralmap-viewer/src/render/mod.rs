pub mod bevy_surface;
pub mod camera;
pub mod highlight;
pub mod lod;
pub mod scene;
pub mod strategy;
pub mod surface;

use bevy::app::AppExit;
use bevy::prelude::*;

use crate::graph::GraphStore;
use crate::sim::LayoutLifecycle;

pub use bevy_surface::{
    configure_gizmos, mount_surface, release_on_failure, BevySurface, WideEdgeGizmos,
};
pub use camera::{
    apply_camera_rig, apply_focus_requests, camera_controls, frame_on_ready, observe_resize,
    setup_scene, CameraRig,
};
pub use scene::SceneRenderer;
pub use strategy::FrameInput;
pub use surface::SurfaceState;

pub fn render_scene(
    mut surface: BevySurface,
    mut renderer: ResMut<SceneRenderer>,
    layout: Res<LayoutLifecycle>,
    store: Res<GraphStore>,
    rig: Res<CameraRig>,
) {
    renderer.on_visible_set_changed(
        layout.visible_generation(),
        layout.sim.nodes().len(),
        layout.sim.links().len(),
    );
    let frame = FrameInput {
        nodes: layout.sim.nodes(),
        links: layout.sim.links(),
        selection: store.selection(),
        highlighted: store.highlighted(),
        camera_position: rig.position(),
        center: layout.sim.center_index(),
    };
    renderer.render_frame(&frame, &mut surface);
}

pub fn dispose_renderer_on_exit(
    mut exits: EventReader<AppExit>,
    mut renderer: ResMut<SceneRenderer>,
    mut surface: BevySurface,
) {
    if exits.read().next().is_some() {
        renderer.dispose(&mut surface);
    }
}
