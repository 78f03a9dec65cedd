//! Per-block facial skin and edge analysis.
//!
//! A block is scored from three cues: the share of skin-toned pixels, the share
//! of edge pixels, and whether its mean brightness is in a plausible exposure
//! range. Its border lines feed the rotation estimator. Blocks only read the
//! frame, so any number of them can be evaluated in parallel.

use crate::config::RotationConfig;
use crate::frame::Frame;
use crate::rotation::{estimate_rotation, BorderProfile, Rotation};

const SKIN_WEIGHT: f32 = 0.5;
const EDGE_WEIGHT: f32 = 0.3;
const EXPOSURE_BONUS: f32 = 0.2;
/// Mean brightness must be strictly inside this range to earn the exposure bonus.
const EXPOSURE_RANGE: (f32, f32) = (50.0, 200.0);

/// Square region of a frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockAnalysis {
    /// Face likelihood in `[0, 1]`.
    pub confidence: f32,
    pub skin_ratio: f32,
    pub edge_ratio: f32,
    pub mean_brightness: f32,
    pub rotation: Rotation,
}

/// Skin classifier over two disjoint RGB rules: a reddish rule for most skin
/// tones and a pale rule for bright, low-saturation skin.
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    let spread = r.max(g).max(b) - r.min(g).min(b);
    let rg = (r - g).abs();

    let reddish = r > 95 && g > 40 && b > 20 && spread > 15 && rg > 15 && r > g && r > b;
    let pale = r > 220 && g > 210 && b > 170 && rg <= 15 && r > b && g > b;
    reddish || pale
}

/// Whether any 4-neighbour differs in brightness from `(x, y)` by more than
/// `threshold`. Pixels on the frame border are never edges.
pub fn is_edge_pixel(frame: &Frame<'_>, x: u32, y: u32, threshold: f32) -> bool {
    if x == 0 || y == 0 || x + 1 >= frame.width() || y + 1 >= frame.height() {
        return false;
    }
    let center = frame.brightness(x, y);
    [(x, y - 1), (x + 1, y), (x, y + 1), (x - 1, y)]
        .into_iter()
        .any(|(nx, ny)| (center - frame.brightness(nx, ny)).abs() > threshold)
}

/// Score one block. The block is clipped to the frame; an empty intersection
/// scores zero.
pub fn analyze_block(
    frame: &Frame<'_>,
    block: Block,
    edge_threshold: f32,
    rotation: &RotationConfig,
) -> BlockAnalysis {
    let x_end = block.x.saturating_add(block.size).min(frame.width());
    let y_end = block.y.saturating_add(block.size).min(frame.height());
    if block.x >= x_end || block.y >= y_end {
        return BlockAnalysis {
            confidence: 0.0,
            skin_ratio: 0.0,
            edge_ratio: 0.0,
            mean_brightness: 0.0,
            rotation: Rotation::default(),
        };
    }

    let mut skin = 0u32;
    let mut edges = 0u32;
    let mut total = 0u32;
    let mut brightness_sum = 0.0f32;
    let mut border = BorderSums::default();

    for y in block.y..y_end {
        for x in block.x..x_end {
            let (r, g, b) = frame.rgb_at(x, y);
            if is_skin_tone(r, g, b) {
                skin += 1;
            }
            if is_edge_pixel(frame, x, y, edge_threshold) {
                edges += 1;
            }

            let brightness = (r as f32 + g as f32 + b as f32) / 3.0;
            brightness_sum += brightness;
            if y == block.y {
                border.top += brightness;
            }
            if y == y_end - 1 {
                border.bottom += brightness;
            }
            if x == block.x {
                border.left += brightness;
            }
            if x == x_end - 1 {
                border.right += brightness;
            }
            total += 1;
        }
    }

    let total_f = total as f32;
    let skin_ratio = skin as f32 / total_f;
    let edge_ratio = edges as f32 / total_f;
    let mean_brightness = brightness_sum / total_f;

    let mut confidence = skin_ratio * SKIN_WEIGHT + edge_ratio * EDGE_WEIGHT;
    if mean_brightness > EXPOSURE_RANGE.0 && mean_brightness < EXPOSURE_RANGE.1 {
        confidence += EXPOSURE_BONUS;
    }

    let cols = (x_end - block.x) as f32;
    let rows = (y_end - block.y) as f32;
    let profile = BorderProfile {
        top: border.top / cols,
        bottom: border.bottom / cols,
        left: border.left / rows,
        right: border.right / rows,
    };

    BlockAnalysis {
        confidence: confidence.clamp(0.0, 1.0),
        skin_ratio,
        edge_ratio,
        mean_brightness,
        rotation: estimate_rotation(&profile, rotation),
    }
}

#[derive(Default)]
struct BorderSums {
    top: f32,
    bottom: f32,
    left: f32,
    right: f32,
}
