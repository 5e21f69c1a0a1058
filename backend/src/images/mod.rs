//! Image store for the photos attached to applications and survey entries.
//!
//! Clients send images as base64, optionally wrapped in a data URL
//! (`data:image/png;base64,...`). The store decodes them and writes the bytes
//! into a single uploads directory. Documents keep only the returned file
//! name; the directory is the only place that knows about paths.
//!
//! Saving is strict: a bad payload or a failed write is an error, since the
//! record would otherwise point at a file that does not exist. Deleting is
//! best effort: [`ImageStore::discard`] logs and swallows failures so a stale
//! file never fails the request that replaced it.

use crate::error::{ApiError, AppResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, warn};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DEFAULT_EXTENSION: &str = "png";

/// How the stored file is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageName {
    /// `<uuid>.png`
    Random,
    /// `<stem>.<ext>`, extension taken from the data URL when present.
    Keyed(String),
}

#[derive(Debug)]
pub struct ImageStore {
    dir: PathBuf,
    data_url: Regex,
}

/// An image written under a temporary name, waiting to be promoted.
#[derive(Debug)]
pub struct StagedImage {
    temp: String,
    /// The file name the image will have once promoted.
    pub target: String,
}

struct DecodedImage {
    bytes: Vec<u8>,
    extension: Option<String>,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_url = Regex::new(r"^data:image/([A-Za-z0-9.+-]+);base64,")
            .map_err(|e| ApiError::Internal(format!("Regex error: {}", e)))?;
        Ok(Self {
            dir: dir.into(),
            data_url,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decodes `payload` and writes it under a name chosen by `name`.
    /// Returns the stored file name.
    pub fn save(&self, payload: &str, name: ImageName) -> AppResult<String> {
        let staged = self.stage(payload, name)?;
        self.promote(&staged)?;
        Ok(staged.target)
    }

    /// Writes the decoded image beside its final name without touching any
    /// file already stored there. Nothing is visible under
    /// [`StagedImage::target`] until [`promote`](Self::promote).
    pub fn stage(&self, payload: &str, name: ImageName) -> AppResult<StagedImage> {
        let image = self.decode(payload)?;
        let target = match name {
            ImageName::Random => format!("{}.{}", Uuid::new_v4(), DEFAULT_EXTENSION),
            ImageName::Keyed(stem) => format!(
                "{}.{}",
                sanitize_stem(&stem),
                image.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
            ),
        };
        let temp = format!("{}.{}.tmp", target, Uuid::new_v4().simple());

        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(&temp), &image.bytes)?;
        debug!("staged image {} ({} bytes)", target, image.bytes.len());
        Ok(StagedImage { temp, target })
    }

    /// Moves a staged image onto its final name, replacing any file there.
    pub fn promote(&self, staged: &StagedImage) -> AppResult<()> {
        if let Err(e) = fs::rename(self.dir.join(&staged.temp), self.dir.join(&staged.target)) {
            self.discard(&staged.temp);
            return Err(e.into());
        }
        debug!("stored image {}", staged.target);
        Ok(())
    }

    /// Drops a staged image that will not be promoted.
    pub fn abandon(&self, staged: &StagedImage) {
        self.discard(&staged.temp);
    }

    /// Removes a stored file.
    pub fn delete(&self, file_name: &str) -> io::Result<()> {
        if !is_bare_name(file_name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a stored image name", file_name),
            ));
        }
        fs::remove_file(self.dir.join(file_name))
    }

    /// Best-effort [`delete`](Self::delete): failures are logged and dropped.
    pub fn discard(&self, file_name: &str) {
        match self.delete(file_name) {
            Ok(()) => debug!("removed image {}", file_name),
            Err(e) => warn!("failed to remove image {}: {}", file_name, e),
        }
    }

    pub fn discard_all<'a>(&self, file_names: impl IntoIterator<Item = &'a str>) {
        for name in file_names {
            self.discard(name);
        }
    }

    fn decode(&self, payload: &str) -> AppResult<DecodedImage> {
        let payload = payload.trim();
        let (extension, data) = match self.data_url.captures(payload) {
            Some(caps) => {
                let prefix_len = caps.get(0).map(|m| m.end()).unwrap_or(0);
                let extension = caps.get(1).and_then(|m| normalize_extension(m.as_str()));
                (extension, &payload[prefix_len..])
            }
            None => (None, payload),
        };

        let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| ApiError::ValidationFailed(format!("image data is not valid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::ValidationFailed("image data is empty".to_string()));
        }
        Ok(DecodedImage { bytes, extension })
    }
}

/// Keeps `[A-Za-z0-9_-]`, replacing anything else with `_`, so a consumer id
/// can never steer a file outside the uploads directory.
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

fn normalize_extension(media_subtype: &str) -> Option<String> {
    let ext: String = media_subtype
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 5 {
        None
    } else {
        Some(ext)
    }
}

fn is_bare_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\'])
}
