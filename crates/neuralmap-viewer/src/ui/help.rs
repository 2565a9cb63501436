use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};

use crate::ui::UiState;

pub fn help_overlay(mut contexts: EguiContexts, ui_state: Res<UiState>) {
    if !ui_state.help_open {
        return;
    }

    egui::Window::new("Help / Shortcuts")
        .collapsible(false)
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label("Left click: select node and focus camera");
            ui.label("Ctrl/Shift + click: add or remove from selection");
            ui.label("Left drag on node: move it (released on drop)");
            ui.label("Right drag: orbit, wheel: zoom");
            ui.label("Esc: clear selection and hover");
            ui.label("F: focus selected");
            ui.label("Space: expand/collapse selected");
            ui.label("R: reset camera");
            ui.label("?: toggle help");
        });
}
