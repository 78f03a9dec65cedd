use std::path::Path;

use anyhow::{Context, Result};
use attend_core::EngineConfig;

/// Build the engine configuration: defaults, then an optional TOML file, then
/// `ATTEND_*` environment variables. CLI flags are applied by the caller.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => from_file(path)?,
        None => EngineConfig::default(),
    };
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse a TOML file. Missing keys keep their defaults.
pub fn from_file(path: &Path) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: EngineConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config file loaded");
    Ok(config)
}

/// Overlay values from `lookup`, which resolves `ATTEND_*` variable names.
/// Unset or unparsable values leave the current setting in place.
pub fn apply_env<F>(config: &mut EngineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    config.focus_threshold = env_f32(&lookup, "ATTEND_FOCUS_THRESHOLD", config.focus_threshold);
    config.smoothing_window =
        env_usize(&lookup, "ATTEND_SMOOTHING_WINDOW", config.smoothing_window);
    config.block_size = env_u32(&lookup, "ATTEND_BLOCK_SIZE", config.block_size);
    config.motion_threshold =
        env_f32(&lookup, "ATTEND_MOTION_THRESHOLD", config.motion_threshold);
    config.focus_box_size = env_f32(&lookup, "ATTEND_FOCUS_BOX_SIZE", config.focus_box_size);
    config.processing_fps = env_f32(&lookup, "ATTEND_PROCESSING_FPS", config.processing_fps);
    config.adaptive.enabled = lookup("ATTEND_ADAPTIVE_THRESHOLD")
        .map(|v| v != "0")
        .unwrap_or(config.adaptive.enabled);
}

fn env_f32<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: f32) -> f32 {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: u32) -> u32 {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: usize) -> usize {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
