use ort::OrtError;

use crate::detection::CenterFacesError;

impl From<OrtError> for CenterFacesError {
    fn from(err: OrtError) -> Self {
        CenterFacesError::InferenceError(err.to_string())
    }
}
