use bevy::prelude::*;
use neuralmap_core::GraphData;

use crate::app::events::{FocusOnNode, NodeClicked, NodeHovered};
use crate::app::resources::Settings;
use crate::graph::GraphStore;
use crate::input::InteractionController;
use crate::render::{CameraRig, SceneRenderer, WideEdgeGizmos};
use crate::sim::LayoutLifecycle;
use crate::ui::UiState;
use crate::util::config::ViewerConfig;

pub mod events;
pub mod resources;

pub struct NeuralMapViewerPlugin {
    pub config: ViewerConfig,
    /// Loaded before the first frame (file or demo data).
    pub initial_graph: Option<GraphData>,
}

impl Plugin for NeuralMapViewerPlugin {
    fn build(&self, app: &mut App) {
        let cfg = self.config.clone();
        let mut store = GraphStore::default();
        store.apply_layout_settings(&cfg.layout);
        if let Some(graph) = self.initial_graph.clone() {
            store.replace_graph(graph);
        }

        app.add_event::<NodeClicked>()
            .add_event::<NodeHovered>()
            .add_event::<FocusOnNode>()
            .init_gizmo_group::<WideEdgeGizmos>()
            .insert_resource(store)
            .insert_resource(LayoutLifecycle::new(&cfg))
            .insert_resource(SceneRenderer::new(&cfg.render))
            .insert_resource(CameraRig::new(&cfg.camera))
            .insert_resource(InteractionController::new(&cfg.interaction))
            .insert_resource(UiState::default())
            .insert_resource(Settings(cfg))
            .add_systems(
                Startup,
                (crate::render::setup_scene, crate::render::configure_gizmos),
            )
            .add_systems(
                Update,
                (
                    crate::net::pump_network,
                    crate::ui::handle_shortcuts,
                    crate::ui::ui_panel,
                    crate::ui::help_overlay,
                    crate::ui::hud_overlay,
                    crate::input::pointer_input,
                    crate::render::camera_controls,
                    crate::sim::drive_layout,
                    crate::render::apply_focus_requests,
                    crate::render::frame_on_ready,
                    crate::render::apply_camera_rig,
                    crate::render::observe_resize,
                    crate::render::mount_surface,
                    crate::render::render_scene,
                    crate::render::release_on_failure,
                    crate::net::forward_notifications,
                )
                    .chain(),
            )
            .add_systems(
                Last,
                (
                    crate::sim::dispose_on_exit,
                    crate::render::dispose_renderer_on_exit,
                ),
            );
    }
}
