use crate::builder::FaceDetection;
use crate::detection::{CenterFacesError, CenterFacesResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub trait ModelRepository {
    fn get_model(&self, face_detector: FaceDetection) -> CenterFacesResult<PathBuf>;
}

fn download_file(url: &str, destination: &Path) -> CenterFacesResult<()> {
    fn get_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers
    }

    info!(url, destination = %destination.display(), "downloading model");
    let client = reqwest::blocking::Client::new();
    let mut response = client
        .get(url)
        .headers(get_headers())
        .send()
        .map_err(|err| CenterFacesError::Other(format!("Failed to download file: {}", err)))?;
    if !response.status().is_success() {
        return Err(CenterFacesError::Other(format!(
            "Failed to download file: HTTP {}",
            response.status()
        )));
    }

    // Partial downloads never land at the cached path.
    let partial = destination.with_extension("part");
    {
        let file = File::create(&partial)?;
        let mut writer = BufWriter::new(file);
        response
            .copy_to(&mut writer)
            .map_err(|err| CenterFacesError::Other(format!("Failed to download file: {}", err)))?;
        writer.flush()?;
    }
    std::fs::rename(&partial, destination)?;
    Ok(())
}

fn get_cache_dir() -> CenterFacesResult<PathBuf> {
    let home_dir = home::home_dir()
        .ok_or_else(|| CenterFacesError::Other("Failed to get home directory.".to_string()))?;

    let cache_dir = home_dir.join(".center_faces/");
    std::fs::create_dir_all(&cache_dir)?;
    Ok(cache_dir)
}

fn model_location(face_detector: FaceDetection) -> (&'static str, &'static str) {
    match face_detector {
        FaceDetection::CenterFace => (
            "https://github.com/Star-Clouds/CenterFace/raw/master/models/onnx/centerface.onnx",
            "centerface.onnx",
        ),
    }
}

#[derive(Default)]
pub struct GitHubRepository {}

impl GitHubRepository {
    pub fn new() -> GitHubRepository {
        GitHubRepository {}
    }
}

impl ModelRepository for GitHubRepository {
    fn get_model(&self, face_detector: FaceDetection) -> CenterFacesResult<PathBuf> {
        let (url, model_filename) = model_location(face_detector);

        let dest_filepath = get_cache_dir()?.join(model_filename);
        if !dest_filepath.exists() {
            download_file(url, &dest_filepath)?;
        }

        Ok(dest_filepath)
    }
}
