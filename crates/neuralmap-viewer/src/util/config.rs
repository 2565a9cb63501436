use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub radial_distance: f32,
    pub charge_strength: f32,
    pub sidebar_open: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            radial_distance: 150.0,
            charge_strength: -100.0,
            sidebar_open: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub velocity_decay: f32,
    pub link_strength: f32,
    pub theta: f32,
    pub charge_distance_max: f32,
    pub barnes_hut_threshold: usize,
    pub radial_enabled: bool,
    pub radial_strength: f32,
    pub center_strength: f32,
    pub collide_threshold: usize,
    pub collide_strength: f32,
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            alpha_min: 0.001,
            velocity_decay: 0.4,
            link_strength: 0.5,
            theta: 0.8,
            charge_distance_max: 300.0,
            barnes_hut_threshold: 500,
            radial_enabled: true,
            radial_strength: 0.1,
            center_strength: 0.08,
            collide_threshold: 200,
            collide_strength: 0.7,
            seed: 0x6e65_7572,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReheatSettings {
    pub enabled: bool,
    pub interval_ms: u64,
    pub velocity_jitter: f32,
    pub alpha: f32,
}

impl Default for ReheatSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 3000,
            velocity_jitter: 0.5,
            alpha: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub instancing_threshold: usize,
    pub edge_batching_threshold: usize,
    pub lod_near: f32,
    pub lod_far: f32,
    pub selection_color: [f32; 3],
    pub edge_base_opacity: f32,
    pub edge_highlight_opacity: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            instancing_threshold: 100,
            edge_batching_threshold: 200,
            lod_near: 300.0,
            lod_far: 500.0,
            selection_color: [1.0, 1.0, 1.0],
            edge_base_opacity: 0.5,
            edge_highlight_opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub focus_duration_ms: u64,
    pub focus_offset: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
    pub fov_degrees: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            focus_duration_ms: 800,
            focus_offset: [0.0, 50.0, 100.0],
            min_distance: 50.0,
            max_distance: 2000.0,
            fov_degrees: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    pub pick_radius_px: f32,
    pub drag_threshold_px: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            pick_radius_px: 14.0,
            drag_threshold_px: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedEndpoint {
    pub socket_path: String,
    pub auto_connect: bool,
}

impl Default for FeedEndpoint {
    fn default() -> Self {
        Self {
            socket_path: default_uds_path(),
            auto_connect: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub demo_mode: bool,
    pub layout: LayoutSettings,
    pub simulation: SimulationSettings,
    pub reheat: ReheatSettings,
    pub render: RenderSettings,
    pub camera: CameraSettings,
    pub interaction: InteractionSettings,
    pub feed: FeedEndpoint,
}

pub fn default_uds_path() -> String {
    static CACHED: OnceLock<String> = OnceLock::new();
    CACHED
        .get_or_init(|| {
            if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
                format!("{dir}/neuralmap.sock")
            } else {
                "/tmp/neuralmap.sock".to_string()
            }
        })
        .clone()
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "neuralmap")?;
    Some(proj.config_dir().join("viewer.toml"))
}

pub fn load_or_default() -> ViewerConfig {
    let Some(path) = config_file_path() else {
        return ViewerConfig::default();
    };
    load_or_default_from_path(&path)
}

fn load_or_default_from_path(path: &Path) -> ViewerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ViewerConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "invalid viewer config, using defaults");
            ViewerConfig::default()
        }
    }
}

pub fn save(cfg: &ViewerConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

fn save_to_path(cfg: &ViewerConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize viewer config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write viewer config {}", path.display()))?;
    Ok(())
}
