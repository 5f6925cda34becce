use ndarray::Array4;
use rstest::fixture;

use crate::{decoder::RectTransform, CenterFacesResult, DetectionParams, Face};

/// Synthetic CenterFace outputs over a `rows x cols` grid.
pub struct CenterFaceOutputs {
    pub heatmap: Array4<f32>,
    pub scale: Array4<f32>,
    pub offset: Array4<f32>,
}

impl CenterFaceOutputs {
    /// Outputs with zero score everywhere.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            heatmap: Array4::zeros((1, 1, rows, cols)),
            scale: Array4::zeros((1, 2, rows, cols)),
            offset: Array4::zeros((1, 2, rows, cols)),
        }
    }

    /// Sets one cell. `scale` is `(log height, log width)`, `offset` is `(dy, dx)`.
    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        score: f32,
        scale: (f32, f32),
        offset: (f32, f32),
    ) {
        self.heatmap[[0, 0, row, col]] = score;
        self.scale[[0, 0, row, col]] = scale.0;
        self.scale[[0, 1, row, col]] = scale.1;
        self.offset[[0, 0, row, col]] = offset.0;
        self.offset[[0, 1, row, col]] = offset.1;
    }

    pub fn decode(
        &self,
        input_size: (usize, usize),
        params: &DetectionParams,
        transform: Option<&RectTransform<'_>>,
    ) -> CenterFacesResult<Vec<Face>> {
        crate::decode(
            self.heatmap.view(),
            self.scale.view(),
            self.offset.view(),
            input_size,
            params,
            transform,
        )
    }
}

/// A 4x4 grid (16x16 input) with one 4px face centered at pixel (6, 6).
#[fixture]
pub fn single_face_outputs() -> CenterFaceOutputs {
    let mut outputs = CenterFaceOutputs::empty(4, 4);
    outputs.set_cell(1, 1, 0.9, (0.0, 0.0), (0.0, 0.0));
    outputs
}
