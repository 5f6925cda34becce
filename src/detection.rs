use crate::{nms::Nms, Rect};
use ndarray::ArrayViewD;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CenterFacesError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("Inference error: {0}")]
    InferenceError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for CenterFacesError {
    fn from(err: std::io::Error) -> Self {
        CenterFacesError::IoError(err)
    }
}

impl From<ndarray::ShapeError> for CenterFacesError {
    fn from(err: ndarray::ShapeError) -> Self {
        CenterFacesError::InferenceError(format!("unexpected tensor shape: {err}"))
    }
}

pub type CenterFacesResult<R> = Result<R, CenterFacesError>;

/// A detected face.
///
/// `rect` is normalized to `[0, 1]` with a bottom-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub rect: Rect,
    pub confidence: f32,
}

pub trait FaceDetector: Send + Sync {
    /// Detects faces in an RGB image laid out as `(height, width, 3)`.
    fn detect(&self, image: ArrayViewD<u8>) -> CenterFacesResult<Vec<Face>>;
}

#[derive(Debug, Copy, Clone)]
pub struct DetectionParams {
    /// Minimum heatmap score for a cell to become a candidate. Inclusive.
    pub score_threshold: f32,
    pub nms: Nms,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms: Nms::default(),
        }
    }
}

impl DetectionParams {
    /// Checks that both thresholds are finite and within `[0, 1]`.
    pub fn validate(&self) -> CenterFacesResult<()> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(CenterFacesError::InvalidArgument(format!(
                "score threshold must be within [0, 1], got {}",
                self.score_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.nms.iou_threshold) {
            return Err(CenterFacesError::InvalidArgument(format!(
                "IoU threshold must be within [0, 1], got {}",
                self.nms.iou_threshold
            )));
        }
        Ok(())
    }
}
