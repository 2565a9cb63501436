use bevy::prelude::{Local, Res, ResMut, Time};
use bevy_egui::{egui, EguiContexts};

use crate::graph::model::node_type_label;
use crate::graph::{FeedStatus, GraphStore};
use crate::render::{SceneRenderer, SurfaceState};
use crate::sim::LayoutLifecycle;
use crate::ui::tooltips::render_tooltip;
use crate::ui::{HUD_EDGE_PADDING, HUD_PANEL_GAP, PANEL_W};

pub fn hud_overlay(
    mut contexts: EguiContexts,
    time: Res<Time>,
    store: Res<GraphStore>,
    layout: Res<LayoutLifecycle>,
    mut renderer: ResMut<SceneRenderer>,
    mut fps: Local<f32>,
) {
    let dt = time.delta_seconds();
    if dt > 0.0 {
        *fps = if *fps == 0.0 { 1.0 / dt } else { *fps * 0.9 + 0.1 / dt };
    }

    let ctx = contexts.ctx_mut();
    let screen = ctx.screen_rect();
    let x = if store.sidebar_open() {
        screen.min.x + PANEL_W + HUD_PANEL_GAP
    } else {
        screen.min.x + HUD_EDGE_PADDING + 80.0
    };
    let y = screen.min.y + HUD_EDGE_PADDING;

    let frame = layout.frame();
    let stats = renderer.stats();
    let mut retry = false;
    egui::Area::new("hud".into())
        .order(egui::Order::Foreground)
        .fixed_pos(egui::pos2(x, y))
        .show(ctx, |ui| {
            ui.group(|ui| {
                match renderer.state() {
                    SurfaceState::Pending => {
                        ui.label("Loading scene…");
                    }
                    SurfaceState::Ready => {}
                    SurfaceState::Failed(reason) => {
                        ui.colored_label(
                            egui::Color32::LIGHT_RED,
                            format!("Scene unavailable: {reason}"),
                        );
                        retry = ui.button("Retry").clicked();
                    }
                }
                match &store.feed {
                    FeedStatus::Offline => ui.label("Feed: offline"),
                    FeedStatus::Connected(s) => ui.label(format!("Feed: {s}")),
                    FeedStatus::Error(e) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, format!("Feed error: {e}"))
                    }
                };
                ui.label(format!("FPS: {:.0}", *fps));
                ui.label(format!(
                    "Layout: alpha {:.3} ({})",
                    frame.alpha,
                    if frame.running { "running" } else { "settled" }
                ));
                ui.label(format!(
                    "Drawn: {} nodes / {} edges",
                    stats.nodes, stats.edges
                ));
                ui.label(format!(
                    "Paths: nodes {}, edges {}",
                    renderer.node_path().label(),
                    renderer.edge_path().label()
                ));
                if !store.data_loaded {
                    ui.label("Waiting for graph data");
                }
            });
        });
    if retry {
        renderer.remount();
    }

    let Some(hovered) = store.selection().hovered.as_ref() else {
        return;
    };
    let Some(node) = store.node(hovered) else {
        return;
    };
    let Some(pointer) = ctx.input(|i| i.pointer.hover_pos()) else {
        return;
    };
    let mut lines = vec![
        node.title.clone(),
        format!("type: {}", node_type_label(node.node_type)),
    ];
    if let Some(summary) = &node.summary {
        lines.push(summary.chars().take(120).collect());
    }
    render_tooltip(ctx, "tooltip_node", pointer + egui::vec2(14.0, 14.0), lines);
}
