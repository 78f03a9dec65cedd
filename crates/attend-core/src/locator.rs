//! Face localization over a block grid.
//!
//! The frame is tiled with square blocks (stride = block size), every block is
//! analyzed independently, and the highest-confidence block above the floor
//! becomes the face candidate. Blocks are merged in row-major scan order, so
//! on an exact confidence tie the first block scanned wins whether the scan
//! ran in parallel or not.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::block::{analyze_block, Block, BlockAnalysis};
use crate::config::EngineConfig;
use crate::frame::Frame;
use crate::rotation::Rotation;

/// Best face region found in one frame. No identity carries across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceCandidate {
    /// Block center as a fraction of frame width.
    pub center_x: f32,
    /// Block center as a fraction of frame height.
    pub center_y: f32,
    pub confidence: f32,
    pub rotation: Rotation,
}

/// Block origins in row-major order. Only blocks that end strictly inside the
/// frame are scanned, so the last row and column of blocks never touch the
/// frame's right or bottom edge.
pub fn block_grid(width: u32, height: u32, size: u32) -> Vec<Block> {
    if size == 0 || width <= size || height <= size {
        return Vec::new();
    }
    let xs: Vec<u32> = (0..width - size).step_by(size as usize).collect();
    (0..height - size)
        .step_by(size as usize)
        .flat_map(|y| xs.iter().map(move |&x| Block { x, y, size }))
        .collect()
}

/// Locate the most face-like block in `frame`, or `None` if no block clears
/// `config.confidence_floor`.
pub fn locate_face(frame: &Frame<'_>, config: &EngineConfig) -> Option<FaceCandidate> {
    let blocks = block_grid(frame.width(), frame.height(), config.block_size);
    let analyze = |block: &Block| {
        (
            *block,
            analyze_block(frame, *block, config.edge_threshold, &config.rotation),
        )
    };

    // `collect` on an indexed parallel iterator preserves input order.
    let analyses: Vec<(Block, BlockAnalysis)> = if config.parallel_scan {
        blocks.par_iter().map(analyze).collect()
    } else {
        blocks.iter().map(analyze).collect()
    };

    let (block, best) = best_block(&analyses, config.confidence_floor)?;
    let half = block.size as f32 / 2.0;
    let candidate = FaceCandidate {
        center_x: ((block.x as f32 + half) / frame.width() as f32).clamp(0.0, 1.0),
        center_y: ((block.y as f32 + half) / frame.height() as f32).clamp(0.0, 1.0),
        confidence: best.confidence,
        rotation: best.rotation,
    };

    tracing::trace!(
        x = candidate.center_x,
        y = candidate.center_y,
        confidence = candidate.confidence,
        blocks = analyses.len(),
        "face candidate located"
    );
    Some(candidate)
}

/// Highest confidence strictly above `floor`; earlier entries win ties.
fn best_block(analyses: &[(Block, BlockAnalysis)], floor: f32) -> Option<(Block, BlockAnalysis)> {
    let mut best: Option<(Block, BlockAnalysis)> = None;
    for (block, analysis) in analyses {
        if analysis.confidence <= floor {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, prev)) => analysis.confidence > prev.confidence,
        };
        if better {
            best = Some((*block, *analysis));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIN: (u8, u8, u8) = (180, 120, 90);

    /// Black frame with skin-toned squares painted at the given block origins.
    fn frame_with_patches(width: u32, height: u32, patches: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut data = vec![0u8; (width * height * 4) as usize];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        for &(px, py, size) in patches {
            for y in py..py + size {
                for x in px..px + size {
                    let i = ((y * width + x) * 4) as usize;
                    data[i] = SKIN.0;
                    data[i + 1] = SKIN.1;
                    data[i + 2] = SKIN.2;
                }
            }
        }
        data
    }

    #[test]
    fn test_grid_is_row_major_and_excludes_edge_blocks() {
        let grid = block_grid(100, 60, 25);
        let origins: Vec<(u32, u32)> = grid.iter().map(|b| (b.x, b.y)).collect();
        assert_eq!(
            origins,
            vec![(0, 0), (25, 0), (50, 0), (0, 25), (25, 25), (50, 25)]
        );
    }

    #[test]
    fn test_frame_not_larger_than_block_has_no_grid() {
        assert!(block_grid(25, 25, 25).is_empty());
        assert!(block_grid(100, 100, 0).is_empty());
    }

    #[test]
    fn test_centered_skin_block_located() {
        let data = frame_with_patches(125, 125, &[(50, 50, 25)]);
        let frame = Frame::rgba(&data, 125, 125).unwrap();
        let candidate = locate_face(&frame, &EngineConfig::default()).unwrap();

        assert!((candidate.center_x - 0.5).abs() < 1e-6);
        assert!((candidate.center_y - 0.5).abs() < 1e-6);
        assert!(candidate.confidence >= 0.5);
        assert!(candidate.rotation.yaw.abs() < 1e-4);
        assert!(candidate.rotation.pitch.abs() < 1e-4);
    }

    #[test]
    fn test_blank_frame_has_no_candidate() {
        let data = frame_with_patches(125, 125, &[]);
        let frame = Frame::rgba(&data, 125, 125).unwrap();
        assert!(locate_face(&frame, &EngineConfig::default()).is_none());
    }

    #[test]
    fn test_tie_goes_to_first_in_scan_order() {
        // Two identical isolated patches on the same row.
        let data = frame_with_patches(175, 100, &[(25, 25, 25), (100, 25, 25)]);
        let frame = Frame::rgba(&data, 175, 100).unwrap();
        for parallel_scan in [true, false] {
            let config = EngineConfig {
                parallel_scan,
                ..Default::default()
            };
            let candidate = locate_face(&frame, &config).unwrap();
            assert!((candidate.center_x - 37.5 / 175.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_floor_is_exclusive() {
        let a = BlockAnalysis {
            confidence: 0.3,
            skin_ratio: 0.0,
            edge_ratio: 0.0,
            mean_brightness: 0.0,
            rotation: Rotation::default(),
        };
        let block = Block { x: 0, y: 0, size: 25 };
        assert!(best_block(&[(block, a)], 0.3).is_none());
    }
}
