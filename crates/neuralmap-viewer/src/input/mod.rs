pub mod controller;
pub mod picking;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::app::events::{FocusOnNode, NodeClicked, NodeHovered};
use crate::app::resources::Settings;
use crate::graph::GraphStore;
use crate::sim::LayoutLifecycle;

pub use controller::{InteractionController, InteractionEffect, PointerSample};
pub use picking::{pick_nearest, ray_plane, ScreenNode};

#[allow(clippy::too_many_arguments)]
pub fn pointer_input(
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam_q: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut contexts: EguiContexts,
    settings: Res<Settings>,
    mut store: ResMut<GraphStore>,
    mut layout: ResMut<LayoutLifecycle>,
    mut ctl: ResMut<InteractionController>,
    mut clicked: EventWriter<NodeClicked>,
    mut hovered: EventWriter<NodeHovered>,
    mut focus: EventWriter<FocusOnNode>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let sim = &mut layout.sim;

    let Some(cursor) = window.cursor_position() else {
        let effects = ctl.pointer_left(&mut store, sim);
        dispatch(effects, &mut clicked, &mut hovered, &mut focus);
        return;
    };
    if contexts.ctx_mut().wants_pointer_input() && !ctl.is_pressed() {
        return;
    }
    let Ok((camera, cam_tf)) = cam_q.get_single() else {
        return;
    };

    let right = cam_tf.right();
    let projected = sim.nodes().iter().enumerate().filter_map(|(index, n)| {
        let screen = camera.world_to_viewport(cam_tf, n.position)?;
        let edge = camera.world_to_viewport(cam_tf, n.position + *right * n.radius)?;
        Some(ScreenNode {
            index,
            screen,
            radius: screen.distance(edge),
        })
    });
    let hit = pick_nearest(projected, cursor, settings.0.interaction.pick_radius_px)
        .map(|i| sim.nodes()[i].id.clone());

    // Drag plane passes through the dragged node and faces the camera.
    let world = ctl.dragged().and_then(|id| {
        let at = sim.position(id)?;
        let ray = camera.viewport_to_world(cam_tf, cursor)?;
        ray_plane(ray.origin, *ray.direction, at, *cam_tf.forward())
    });

    let sample = PointerSample {
        screen: cursor,
        hit,
        world,
        additive: keys.any_pressed([
            KeyCode::ControlLeft,
            KeyCode::ControlRight,
            KeyCode::ShiftLeft,
            KeyCode::ShiftRight,
        ]),
    };

    if buttons.just_pressed(MouseButton::Left) {
        ctl.pointer_down(&sample, sim);
    }
    let mut effects = ctl.pointer_move(&sample, &mut store, sim);
    if buttons.just_released(MouseButton::Left) {
        effects.extend(ctl.pointer_up(&sample, &mut store, sim));
    }
    dispatch(effects, &mut clicked, &mut hovered, &mut focus);
}

fn dispatch(
    effects: Vec<InteractionEffect>,
    clicked: &mut EventWriter<NodeClicked>,
    hovered: &mut EventWriter<NodeHovered>,
    focus: &mut EventWriter<FocusOnNode>,
) {
    for effect in effects {
        match effect {
            InteractionEffect::Clicked(id) => {
                clicked.send(NodeClicked(id));
            }
            InteractionEffect::Hovered(id) => {
                hovered.send(NodeHovered(id));
            }
            InteractionEffect::FocusRequested(id) => {
                focus.send(FocusOnNode(id));
            }
            InteractionEffect::DragStarted(id) => tracing::debug!(%id, "drag started"),
            InteractionEffect::DragEnded(id) => tracing::debug!(%id, "drag ended"),
            InteractionEffect::BackgroundCleared => tracing::debug!("selection cleared"),
        }
    }
}
