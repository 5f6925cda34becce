use std::sync::Arc;

use tracing::info;

use crate::{
    centerface::{CenterFace, CenterFaceParams},
    detection::{CenterFacesError, CenterFacesResult, DetectionParams, FaceDetector},
    imaging::AspectMode,
    model_repository::{GitHubRepository, ModelRepository},
    Nms,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceDetection {
    CenterFace = 0,
}

#[derive(Clone, Debug)]
enum OpenMode {
    File(String),
    Download,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    /// Uses the, default, CPU inference
    OrtCpu,
    /// Uses the Cuda inference. May not be available depending of your Onnx runtime installation.
    OrtCuda,
}

/// Inference parameters.
#[derive(Clone, Copy, Debug)]
pub struct InferParams {
    /// Chooses the ONNX runtime provider.
    pub provider: Provider,
    /// Sets the number of intra-op threads.
    pub intra_threads: Option<usize>,
    /// Sets the number of inter-op threads.
    pub inter_threads: Option<usize>,
}

impl Default for InferParams {
    fn default() -> Self {
        Self {
            provider: Provider::OrtCpu,
            intra_threads: None,
            inter_threads: None,
        }
    }
}

fn thread_count(threads: usize) -> CenterFacesResult<i16> {
    i16::try_from(threads).map_err(|_| {
        CenterFacesError::InvalidArgument(format!("thread count {threads} is too large"))
    })
}

impl InferParams {
    fn session_builder(
        &self,
        env: &Arc<ort::Environment>,
    ) -> CenterFacesResult<ort::session::SessionBuilder> {
        let mut builder = ort::session::SessionBuilder::new(env)?;
        builder = match self.provider {
            Provider::OrtCpu => builder,
            Provider::OrtCuda => {
                builder.with_execution_providers([ort::ExecutionProvider::cuda()])?
            }
        };
        if let Some(threads) = self.intra_threads {
            builder = builder.with_intra_threads(thread_count(threads)?)?;
        }
        if let Some(threads) = self.inter_threads {
            builder = builder.with_inter_threads(thread_count(threads)?)?;
        }
        Ok(builder)
    }
}

/// Builder for loading or downloading and creating face detectors.
pub struct FaceDetectorBuilder {
    detector: FaceDetection,
    open_mode: OpenMode,
    params: CenterFaceParams,
    infer_params: InferParams,
}

impl FaceDetectorBuilder {
    /// Create a new builder for the given face detector.
    ///
    /// # Arguments
    ///
    /// * `detector` - The face detector to build.
    pub fn new(detector: FaceDetection) -> Self {
        Self {
            detector,
            open_mode: OpenMode::Download,
            params: CenterFaceParams::default(),
            infer_params: InferParams::default(),
        }
    }

    /// Load the model from the given file path.
    pub fn from_file(mut self, path: String) -> Self {
        self.open_mode = OpenMode::File(path);
        self
    }

    /// Download the model from the model repository.
    pub fn download(mut self) -> Self {
        self.open_mode = OpenMode::Download;
        self
    }

    /// Set the detection parameters.
    pub fn detect_params(mut self, params: DetectionParams) -> Self {
        self.params.detection = params;
        self
    }

    /// Set the non-maximum suppression.
    pub fn nms(mut self, nms: Nms) -> Self {
        self.params.detection.nms = nms;
        self
    }

    /// Set the model input size, `(width, height)`.
    pub fn input_size(mut self, width: u32, height: u32) -> Self {
        self.params.input_size = (width, height);
        self
    }

    /// Set how images are fitted into the model input.
    pub fn aspect_mode(mut self, mode: AspectMode) -> Self {
        self.params.aspect_mode = mode;
        self
    }

    /// Sets the inference parameters.
    pub fn infer_params(mut self, params: InferParams) -> Self {
        self.infer_params = params;
        self
    }

    fn check(&self) -> CenterFacesResult<()> {
        self.params.detection.validate()?;
        let (width, height) = self.params.input_size;
        if width < crate::STRIDE as u32 || height < crate::STRIDE as u32 {
            return Err(CenterFacesError::InvalidArgument(format!(
                "input size {width}x{height} is smaller than the model stride"
            )));
        }
        Ok(())
    }

    /// Builds a new detector.
    pub fn build(&self) -> CenterFacesResult<Box<dyn FaceDetector>> {
        self.check()?;
        let env = Arc::new(
            ort::Environment::builder()
                .with_name("CenterFaces")
                .build()?,
        );

        let model_path = match &self.open_mode {
            OpenMode::Download => {
                let path = GitHubRepository::new().get_model(self.detector)?;
                path.to_str()
                    .ok_or_else(|| {
                        CenterFacesError::Other(format!("non UTF-8 model path {}", path.display()))
                    })?
                    .to_string()
            }
            OpenMode::File(path) => path.clone(),
        };

        info!(detector = ?self.detector, model_path = %model_path, "building face detector");
        let session = self
            .infer_params
            .session_builder(&env)?
            .with_model_from_file(&model_path)?;

        Ok(Box::new(match self.detector {
            FaceDetection::CenterFace => CenterFace::new(session, self.params),
        }))
    }
}
