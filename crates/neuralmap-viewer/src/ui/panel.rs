use bevy::prelude::{EventWriter, ResMut};
use bevy_egui::{egui, EguiContexts};
use neuralmap_core::NodeId;

use crate::app::events::FocusOnNode;
use crate::app::resources::Settings;
use crate::graph::model::node_type_label;
use crate::graph::store::{RADIAL_DISTANCE_MAX, RADIAL_DISTANCE_MIN};
use crate::graph::GraphStore;
use crate::sim::LayoutLifecycle;
use crate::ui::{UiState, PANEL_W};
use crate::util::config;

pub fn ui_panel(
    mut contexts: EguiContexts,
    mut store: ResMut<GraphStore>,
    mut layout: ResMut<LayoutLifecycle>,
    mut settings: ResMut<Settings>,
    mut ui_state: ResMut<UiState>,
    mut focus: EventWriter<FocusOnNode>,
) {
    let ctx = contexts.ctx_mut();

    if !store.sidebar_open() {
        egui::Area::new("sidebar_toggle".into())
            .fixed_pos(egui::pos2(8.0, 8.0))
            .show(ctx, |ui| {
                if ui.button("☰ Map").clicked() {
                    store.set_sidebar_open(true);
                }
            });
        return;
    }

    let mut focus_target: Option<NodeId> = None;
    egui::SidePanel::left("left")
        .exact_width(PANEL_W)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("NeuralMap");
                if ui.small_button("◀").on_hover_text("Hide sidebar").clicked() {
                    store.set_sidebar_open(false);
                }
            });
            ui.label(format!("nodes: {}", store.nodes().len()));
            ui.label(format!("edges: {}", store.edges().len()));
            ui.label(format!(
                "visible: {} / {}",
                layout.visible().nodes.len(),
                layout.visible().edges.len()
            ));
            ui.separator();

            ui.heading("Layout");
            let mut distance = store.radial_distance();
            if ui
                .add(
                    egui::Slider::new(&mut distance, RADIAL_DISTANCE_MIN..=RADIAL_DISTANCE_MAX)
                        .text("radial distance"),
                )
                .changed()
            {
                store.set_radial_distance(distance);
            }
            let mut reheat = layout.reheat_enabled();
            if ui.checkbox(&mut reheat, "Keep alive (reheat)").changed() {
                layout.set_reheat_enabled(reheat);
            }
            ui.horizontal(|ui| {
                if ui.button("Expand all").clicked() {
                    store.expand_all();
                }
                if ui.button("Collapse all").clicked() {
                    store.collapse_all();
                }
            });
            ui.label(format!("expanded: {}", store.expanded_count()));

            if ui.button("Save settings").clicked() {
                settings.0.layout.radial_distance = store.radial_distance();
                settings.0.layout.sidebar_open = store.sidebar_open();
                settings.0.reheat.enabled = layout.reheat_enabled();
                ui_state.save_error = config::save(&settings.0).err().map(|e| format!("{e:#}"));
            }
            if let Some(err) = &ui_state.save_error {
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Inspector");
            let Some(id) = store.selection().primary().cloned() else {
                ui.label("Nothing selected. Click a node.");
                return;
            };
            let selected_count = store.selection().selected.len();
            let Some(node) = store.node(&id).cloned() else {
                return;
            };

            ui.label(egui::RichText::new(&node.title).strong());
            ui.label(format!("type: {}", node_type_label(node.node_type)));
            ui.label(format!("importance: {:.1}", node.importance_clamped()));
            if let Some(parent) = node.parent_id.as_ref().and_then(|p| store.node(p)) {
                ui.label(format!("parent: {}", parent.title));
            }
            if let Some(summary) = &node.summary {
                ui.add_space(4.0);
                ui.label(summary);
            }
            if selected_count > 1 {
                ui.label(format!("+{} more selected", selected_count - 1));
            }

            ui.horizontal(|ui| {
                if ui.button("Focus").clicked() {
                    focus_target = Some(id.clone());
                }
                if store.has_children(&id) {
                    let label = if store.is_expanded(&id) {
                        "Collapse"
                    } else {
                        "Expand"
                    };
                    if ui.button(label).clicked() {
                        store.toggle_expansion(&id);
                    }
                }
            });

            ui.add_space(6.0);
            ui.label("Connected:");
            let neighbors: Vec<(NodeId, String, &'static str)> = store
                .neighbors(&id)
                .into_iter()
                .map(|(n, e)| (n.id.clone(), n.title.clone(), e.kind.as_str()))
                .collect();
            egui::ScrollArea::vertical()
                .max_height(220.0)
                .show(ui, |ui| {
                    for (nid, title, kind) in neighbors {
                        if ui.selectable_label(false, format!("{title} ({kind})")).clicked() {
                            store.select_only(&nid);
                            focus_target = Some(nid);
                        }
                    }
                });
        });

    if let Some(id) = focus_target {
        focus.send(FocusOnNode(id));
    }
}
