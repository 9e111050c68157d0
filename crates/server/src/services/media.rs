//! Image hosting via the Cloudinary upload API.
//!
//! Product images are uploaded server-side with a signed request; only the
//! returned hosted URL is persisted.

use std::time::{SystemTime, UNIX_EPOCH};

use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::MediaConfig;

/// Errors from the image host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Transport-level failure reaching the host.
    #[error("image host request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The host rejected the upload.
    #[error("image upload rejected ({status}): {message}")]
    UploadRejected {
        /// HTTP status from the host.
        status: u16,
        /// Host-provided error message.
        message: String,
    },

    /// The system clock is before the Unix epoch.
    #[error("system clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// A successfully uploaded image.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    /// HTTPS URL to serve the image from.
    pub secure_url: String,
    /// Host-side identifier (kept for future deletes).
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    error: Option<UploadErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorDetail {
    message: Option<String>,
}

/// Client for the image host's upload endpoint.
#[derive(Clone)]
pub struct MediaService {
    http: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: secrecy::SecretString,
    folder: Option<String>,
}

impl MediaService {
    /// Create a media client from configuration.
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.upload_folder.clone(),
        }
    }

    /// Upload one image and return its hosted URL.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UploadRejected` if the host refuses the file, or
    /// `MediaError::Http` on transport failures.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadedImage, MediaError> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let signature = self.signature(timestamp);

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename.to_owned()),
            )
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);
        if let Some(folder) = &self.folder {
            form = form.text("folder", folder.clone());
        }

        let response = self.http.post(&self.upload_url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<UploadErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unexpected image host response".to_owned());
            return Err(MediaError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// SHA-256 signature over the alphabetically-sorted upload parameters,
    /// as the upload API requires.
    fn signature(&self, timestamp: u64) -> String {
        let to_sign = self.folder.as_ref().map_or_else(
            || format!("timestamp={timestamp}"),
            |folder| format!("folder={folder}&timestamp={timestamp}"),
        );

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(folder: Option<&str>) -> MediaService {
        MediaService::new(&MediaConfig {
            cloud_name: "demo".to_owned(),
            api_key: "key".to_owned(),
            api_secret: secrecy::SecretString::from("shh"),
            upload_folder: folder.map(str::to_owned),
        })
    }

    #[test]
    fn test_upload_url() {
        let svc = service(None);
        assert_eq!(
            svc.upload_url,
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_signature_is_deterministic_hex() {
        let svc = service(Some("products"));
        let sig = svc.signature(1_700_000_000);
        assert_eq!(sig, svc.signature(1_700_000_000));
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_depends_on_folder() {
        let with_folder = service(Some("products")).signature(1_700_000_000);
        let without = service(None).signature(1_700_000_000);
        assert_ne!(with_folder, without);
    }
}
