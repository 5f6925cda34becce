//! CenterFace output decoding.
//!
//! The model predicts, for every cell of a grid downsampled by [`STRIDE`], a
//! face-center score (heatmap), a log-scale box size (scale) and a sub-cell
//! center offset (offset). Decoding thresholds the heatmap, rebuilds the boxes
//! in input pixels, normalizes them and runs greedy NMS.

use itertools::iproduct;
use ndarray::ArrayView4;
use tracing::debug;

use crate::{
    detection::{CenterFacesError, CenterFacesResult, DetectionParams},
    Face, Rect,
};

/// Downsampling factor between the model input and the output grid.
pub const STRIDE: usize = 4;

/// Maps a normalized rect from model-input space into another normalized space.
///
/// Called as `transform(rect, input_width, input_height)`.
pub type RectTransform<'a> = dyn Fn(Rect, usize, usize) -> Rect + Sync + 'a;

fn check_shape(
    name: &str,
    tensor: &ArrayView4<f32>,
    channels: usize,
    grid: (usize, usize),
) -> CenterFacesResult<()> {
    let expected = [1, channels, grid.0, grid.1];
    if tensor.shape() != expected {
        return Err(CenterFacesError::InvalidArgument(format!(
            "{name} tensor must have shape {expected:?}, got {:?}",
            tensor.shape()
        )));
    }
    Ok(())
}

/// Checks the tensors against each other and against the input size.
/// Returns the grid size as `(rows, cols)`.
fn check_tensors(
    heatmap: &ArrayView4<f32>,
    scale: &ArrayView4<f32>,
    offset: &ArrayView4<f32>,
    input_size: (usize, usize),
) -> CenterFacesResult<(usize, usize)> {
    let (input_width, input_height) = input_size;
    if input_width == 0 || input_height == 0 {
        return Err(CenterFacesError::InvalidArgument(format!(
            "input size must be positive, got {input_width}x{input_height}"
        )));
    }

    let grid = (input_height / STRIDE, input_width / STRIDE);
    check_shape("heatmap", heatmap, 1, grid)?;
    check_shape("scale", scale, 2, grid)?;
    check_shape("offset", offset, 2, grid)?;
    Ok(grid)
}

fn check_min_score(min_score: f32) -> CenterFacesResult<()> {
    if !(0.0..=1.0).contains(&min_score) {
        return Err(CenterFacesError::InvalidArgument(format!(
            "score threshold must be within [0, 1], got {min_score}"
        )));
    }
    Ok(())
}

/// Extracts candidate boxes in input pixel space (origin top-left).
///
/// Cells are scanned row by row; the returned order is that scan order.
/// Cells whose score is below `min_score` (or not a number) are skipped, and
/// so are boxes left non-finite or empty after clamping to the input frame.
pub fn extract_candidates(
    heatmap: ArrayView4<f32>,
    scale: ArrayView4<f32>,
    offset: ArrayView4<f32>,
    input_size: (usize, usize),
    min_score: f32,
) -> CenterFacesResult<Vec<(Rect, f32)>> {
    check_min_score(min_score)?;
    let (rows, cols) = check_tensors(&heatmap, &scale, &offset, input_size)?;
    let (width, height) = (input_size.0 as f32, input_size.1 as f32);
    let stride = STRIDE as f32;

    let candidates = iproduct!(0..rows, 0..cols)
        .filter_map(|(j, i)| {
            let score = heatmap[[0, 0, j, i]];
            if !(score >= min_score) {
                return None;
            }

            let sy = scale[[0, 0, j, i]].exp() * stride;
            let sx = scale[[0, 1, j, i]].exp() * stride;
            let oy = offset[[0, 0, j, i]];
            let ox = offset[[0, 1, j, i]];

            let cx = (i as f32 + ox + 0.5) * stride;
            let cy = (j as f32 + oy + 0.5) * stride;
            let x1 = (cx - sx / 2.0).clamp(0.0, width);
            let y1 = (cy - sy / 2.0).clamp(0.0, height);
            let x2 = (x1 + sx).min(width);
            let y2 = (y1 + sy).min(height);

            let rect = Rect::at(x1, y1).ending_at(x2, y2);
            if !rect.is_proper() {
                return None;
            }
            Some((rect, score))
        })
        .collect();

    Ok(candidates)
}

/// Normalizes a pixel rect (origin top-left) to `[0, 1]` with origin bottom-left.
pub fn normalize_rect(rect: Rect, input_size: (usize, usize)) -> Rect {
    let (width, height) = (input_size.0 as f32, input_size.1 as f32);
    Rect {
        min_x: rect.min_x / width,
        min_y: 1.0 - rect.max_y / height,
        max_x: rect.max_x / width,
        max_y: 1.0 - rect.min_y / height,
    }
    .clamp(1.0, 1.0)
}

/// Decodes CenterFace outputs into faces.
///
/// # Arguments
///
/// * `heatmap` - Face-center scores, shape `(1, 1, H, W)`.
/// * `scale` - Log height and log width, shape `(1, 2, H, W)`.
/// * `offset` - Vertical and horizontal center offsets, shape `(1, 2, H, W)`.
/// * `input_size` - Model input `(width, height)` in pixels; `H` and `W` are a
///   [`STRIDE`]th of it.
/// * `params` - Score threshold and NMS.
/// * `transform` - Optional remapping applied to every normalized rect before
///   suppression, e.g. [`crate::Letterbox`] to get source-image coordinates.
///
/// # Returns
///
/// * `Vec<Face>` - Faces by descending confidence, normalized with a
///   bottom-left origin.
pub fn decode(
    heatmap: ArrayView4<f32>,
    scale: ArrayView4<f32>,
    offset: ArrayView4<f32>,
    input_size: (usize, usize),
    params: &DetectionParams,
    transform: Option<&RectTransform<'_>>,
) -> CenterFacesResult<Vec<Face>> {
    params.validate()?;
    let grid = (heatmap.shape()[2], heatmap.shape()[3]);
    let candidates = extract_candidates(
        heatmap,
        scale,
        offset,
        input_size,
        params.score_threshold,
    )?;

    let extracted = candidates.len();
    // The hook may push a box out of its target frame entirely.
    let (rects, scores): (Vec<Rect>, Vec<f32>) = candidates
        .into_iter()
        .filter_map(|(rect, score)| {
            let rect = normalize_rect(rect, input_size);
            let rect = match transform {
                Some(transform) => transform(rect, input_size.0, input_size.1),
                None => rect,
            };
            rect.is_proper().then_some((rect, score))
        })
        .unzip();

    let keep = params.nms.keep_indices(&rects, &scores);
    debug!(
        rows = grid.0,
        cols = grid.1,
        candidates = extracted,
        transformed = rects.len(),
        kept = keep.len(),
        "decoded CenterFace outputs"
    );

    Ok(keep
        .into_iter()
        .map(|index| Face {
            rect: rects[index],
            confidence: scores[index],
        })
        .collect())
}
