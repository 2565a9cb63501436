pub mod help;
pub mod hud;
pub mod panel;
pub mod shortcuts;
pub mod tooltips;

use bevy::prelude::Resource;

pub use help::help_overlay;
pub use hud::hud_overlay;
pub use panel::ui_panel;
pub use shortcuts::handle_shortcuts;

pub const PANEL_W: f32 = 280.0;
pub const HUD_EDGE_PADDING: f32 = 8.0;
pub const HUD_PANEL_GAP: f32 = 12.0;

#[derive(Resource, Debug, Default)]
pub struct UiState {
    pub help_open: bool,
    /// Last config save error, shown under the save button.
    pub save_error: Option<String>,
}
