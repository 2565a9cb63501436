use bevy::prelude::{EventWriter, ResMut};
use bevy_egui::{egui, EguiContexts};

use crate::app::events::FocusOnNode;
use crate::graph::GraphStore;
use crate::render::CameraRig;
use crate::ui::UiState;

pub fn handle_shortcuts(
    mut contexts: EguiContexts,
    mut store: ResMut<GraphStore>,
    mut rig: ResMut<CameraRig>,
    mut ui_state: ResMut<UiState>,
    mut focus: EventWriter<FocusOnNode>,
) {
    let ctx = contexts.ctx_mut();
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        ui_state.help_open = false;
        store.clear_selection();
        store.set_hovered(None);
    }

    if ctx.wants_keyboard_input() {
        return;
    }

    if ctx.input(|i| i.key_pressed(egui::Key::Questionmark)) {
        ui_state.help_open = !ui_state.help_open;
    }
    if ctx.input(|i| i.key_pressed(egui::Key::F)) {
        if let Some(id) = store.selection().primary().cloned() {
            focus.send(FocusOnNode(id));
        }
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
        if let Some(id) = store.selection().primary().cloned() {
            store.toggle_expansion(&id);
        }
    }
    if ctx.input(|i| i.key_pressed(egui::Key::R)) {
        rig.reset();
    }
}
