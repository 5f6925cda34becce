mod rect;
pub use rect::{Rect, RectPosition};

mod detection;
pub use detection::{CenterFacesError, CenterFacesResult, DetectionParams, Face, FaceDetector};

mod ort;

mod nms;
pub use nms::Nms;

mod decoder;
pub use decoder::{decode, extract_candidates, normalize_rect, RectTransform, STRIDE};

mod imaging;
pub use imaging::{fit_image, make_border, AspectMode, Letterbox, ToArray3, ToRgb8};

#[cfg(test)]
pub mod testing;

mod centerface;
pub use centerface::{CenterFace, CenterFaceParams, Normalization};

mod builder;

#[cfg(feature = "viz")]
pub mod viz;

pub use builder::{FaceDetection, FaceDetectorBuilder, InferParams, Provider};

mod model_repository;
pub use model_repository::{GitHubRepository, ModelRepository};
