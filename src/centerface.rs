use std::sync::Arc;

use image::RgbImage;
use ndarray::{Array3, ArrayViewD, Axis, Ix4};
use ort::tensor::{FromArray, OrtOwnedTensor};
use tracing::info;

use crate::{
    decoder::decode,
    detection::{CenterFacesError, CenterFacesResult, DetectionParams, FaceDetector},
    imaging::{fit_image, rgb_from_array, AspectMode, Letterbox},
    Face, Rect,
};

/// Per-channel input normalization, `(pixel - mean) / std`, in RGB order.
#[derive(Debug, Clone, Copy)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Normalization {
    fn default() -> Self {
        // CenterFace takes raw 0..255 RGB.
        Self {
            mean: [0.0; 3],
            std: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CenterFaceParams {
    pub detection: DetectionParams,
    /// Model input `(width, height)`. Both should be multiples of 32.
    pub input_size: (u32, u32),
    pub aspect_mode: AspectMode,
    pub normalization: Normalization,
}

impl Default for CenterFaceParams {
    fn default() -> Self {
        Self {
            detection: DetectionParams::default(),
            input_size: (640, 640),
            aspect_mode: AspectMode::ScaleToFit,
            normalization: Normalization::default(),
        }
    }
}

/// Builds the NCHW input tensor for an already fitted image.
fn to_input_tensor(image: &RgbImage, normalization: &Normalization) -> ndarray::Array4<f32> {
    let (width, height) = image.dimensions();
    Array3::<f32>::from_shape_fn((3, height as usize, width as usize), |(c, y, x)| {
        let value = image.get_pixel(x as u32, y as u32)[c] as f32;
        (value - normalization.mean[c]) / normalization.std[c]
    })
    .insert_axis(Axis(0))
}

/// CenterFace detector backed by an ONNX runtime session.
///
/// The session is released when the detector is dropped.
pub struct CenterFace {
    session: ort::Session,
    params: CenterFaceParams,
}

impl CenterFace {
    pub fn new(session: ort::Session, params: CenterFaceParams) -> Self {
        Self { session, params }
    }

    pub fn from_file(
        env: Arc<ort::Environment>,
        model_path: &str,
        params: CenterFaceParams,
    ) -> CenterFacesResult<Self> {
        info!(model_path, "loading CenterFace model");
        let session = ort::session::SessionBuilder::new(&env)?.with_model_from_file(model_path)?;
        Ok(Self::new(session, params))
    }

    pub fn params(&self) -> &CenterFaceParams {
        &self.params
    }
}

impl FaceDetector for CenterFace {
    fn detect(&self, image: ArrayViewD<u8>) -> CenterFacesResult<Vec<Face>> {
        let image = rgb_from_array(&image)?;
        let letterbox = Letterbox::new(image.dimensions(), self.params.aspect_mode);

        let fitted = fit_image(&image, self.params.input_size, self.params.aspect_mode);
        let input = to_input_tensor(&fitted, &self.params.normalization);

        let output_tensors = self
            .session
            .run(vec![ort::tensor::InputTensor::from_array(input.into_dyn())])?;
        if output_tensors.len() < 3 {
            return Err(CenterFacesError::InferenceError(format!(
                "expected heatmap, scale and offset outputs, got {} tensor(s)",
                output_tensors.len()
            )));
        }

        let heatmap: OrtOwnedTensor<f32, _> = output_tensors[0].try_extract()?;
        let scale: OrtOwnedTensor<f32, _> = output_tensors[1].try_extract()?;
        let offset: OrtOwnedTensor<f32, _> = output_tensors[2].try_extract()?;

        let (input_width, input_height) = self.params.input_size;
        let transform = move |rect: Rect, width: usize, height: usize| {
            letterbox.transform_rect(rect, width, height)
        };
        decode(
            heatmap.view().view().into_dimensionality::<Ix4>()?,
            scale.view().view().into_dimensionality::<Ix4>()?,
            offset.view().view().into_dimensionality::<Ix4>()?,
            (input_width as usize, input_height as usize),
            &self.params.detection,
            Some(&transform),
        )
    }
}
