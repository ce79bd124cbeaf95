use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::analysis_config::DetectorModel;
use crate::shared::constants::{
    AGE_GENDER_MODEL_NAME, AGE_GENDER_MODEL_URL, DEFAULT_MODELS_DIR, EXPRESSION_MODEL_NAME,
    EXPRESSION_MODEL_URL, LANDMARK_MODEL_NAME, LANDMARK_MODEL_URL,
};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("model {name} not found in cache or {models_dir} and no download URL is configured")]
    Missing { name: String, models_dir: PathBuf },
}

/// Download progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type Progress<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Where model files come from besides the user cache.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelSource {
    /// Static directory of bundled model files.
    pub models_dir: PathBuf,
    /// When set, missing models are fetched from `{base_url}/{name}`.
    pub base_url: Option<String>,
}

impl Default for ModelSource {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            base_url: None,
        }
    }
}

impl ModelSource {
    /// Bundled models shipped next to the running executable, falling back
    /// to the working directory's `models/`.
    pub fn beside_executable() -> Self {
        let exe = std::env::current_exe().ok();
        Self {
            models_dir: bundled_models_dir(exe.as_deref()),
            base_url: None,
        }
    }

    fn url_for(&self, name: &str, fallback: Option<&str>) -> Option<String> {
        match &self.base_url {
            Some(base) => Some(format!("{}/{name}", base.trim_end_matches('/'))),
            None => fallback.map(str::to_owned),
        }
    }
}

fn bundled_models_dir(exe: Option<&Path>) -> PathBuf {
    exe.and_then(Path::parent)
        .map(|dir| dir.join(DEFAULT_MODELS_DIR))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR))
}

/// Resolved on-disk locations of every model the analyzer needs.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelPaths {
    pub detector: PathBuf,
    pub landmarks: PathBuf,
    pub age_gender: PathBuf,
    pub expressions: PathBuf,
}

/// Resolve the full model set for the chosen detector.
///
/// Download progress of whichever file is currently being fetched is
/// forwarded to `progress`.
pub fn resolve_models(
    detector: DetectorModel,
    source: &ModelSource,
    progress: Option<Progress<'_>>,
) -> Result<ModelPaths, ModelResolveError> {
    let cache_dir = model_cache_dir()?;
    let fetch = |name: &str, fallback: Option<&str>| {
        log::info!("Resolving model: {name}");
        resolve_in(&cache_dir, name, fallback, source, progress)
    };
    let [detector, landmarks, age_gender, expressions] = model_set(detector);
    Ok(ModelPaths {
        detector: fetch(detector.0, Some(detector.1))?,
        landmarks: fetch(landmarks.0, Some(landmarks.1))?,
        age_gender: fetch(age_gender.0, Some(age_gender.1))?,
        expressions: fetch(expressions.0, Some(expressions.1))?,
    })
}

/// `(file name, well-known URL)` of every model the analyzer loads, in
/// [`ModelPaths`] field order.
pub fn model_set(detector: DetectorModel) -> [(&'static str, &'static str); 4] {
    [
        (detector.model_name(), detector.model_url()),
        (LANDMARK_MODEL_NAME, LANDMARK_MODEL_URL),
        (AGE_GENDER_MODEL_NAME, AGE_GENDER_MODEL_URL),
        (EXPRESSION_MODEL_NAME, EXPRESSION_MODEL_URL),
    ]
}

/// Resolve a single model file by name.
///
/// Resolution order:
/// 1. User cache directory (platform-specific)
/// 2. Static models directory
/// 3. Download to cache from the configured base URL or `fallback_url`
pub fn resolve(
    name: &str,
    fallback_url: Option<&str>,
    source: &ModelSource,
    progress: Option<Progress<'_>>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, fallback_url, source, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    fallback_url: Option<&str>,
    source: &ModelSource,
    progress: Option<Progress<'_>>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    let bundled_path = source.models_dir.join(name);
    if bundled_path.exists() {
        return Ok(bundled_path);
    }

    let Some(url) = source.url_for(name, fallback_url) else {
        return Err(ModelResolveError::Missing {
            name: name.to_string(),
            models_dir: source.models_dir.clone(),
        });
    };
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(&url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceLens/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceLens/models/` or `~/.cache/FaceLens/models/`
/// - Windows: `%LOCALAPPDATA%/FaceLens/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FaceLens").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FaceLens").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(
    url: &str,
    dest: &Path,
    progress: Option<Progress<'_>>,
) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    // No partially written model may survive a failed download
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<Progress<'_>>,
) -> Result<(), ModelResolveError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ModelResolveError::Write { path, source }
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;

    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err(temp_path))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err(temp_path))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_err(dest))?;
    log::info!("Downloaded {url} ({downloaded} bytes)");
    Ok(())
}
