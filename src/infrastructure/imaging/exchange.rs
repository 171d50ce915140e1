use crate::domain::tryon::{entity::RemoteOutput, errors::TryOnError};
use image::{DynamicImage, ImageFormat, codecs::jpeg::JpegEncoder};
use std::{
    io::Cursor,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};
use uuid::Uuid;

/// File encoding a remote service expects for its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Jpeg { quality: u8 },
    Png,
}

impl ImageEncoding {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

/// An image written to ephemeral storage. The file is removed on drop.
#[derive(Debug)]
pub struct StagedImage {
    path: PathBuf,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %err, "Could not remove staged image");
        }
    }
}

/// Moves images between memory and the files remote services exchange.
#[derive(Debug, Clone)]
pub struct ImageExchange {
    temp_dir: PathBuf,
}

impl ImageExchange {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    pub fn encode(image: &DynamicImage, encoding: ImageEncoding) -> Result<Vec<u8>, TryOnError> {
        let mut buf = Vec::new();
        match encoding {
            ImageEncoding::Jpeg { quality } => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
            }
            ImageEncoding::Png => image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
        }
        .map_err(|e| TryOnError::Io(format!("Failed to encode image: {}", e)))?;
        Ok(buf)
    }

    /// Write `image` under a timestamp-qualified name like `body_1700000000_<uuid>.jpg`.
    pub fn persist(
        &self,
        image: &DynamicImage,
        label: &str,
        encoding: ImageEncoding,
    ) -> Result<StagedImage, TryOnError> {
        std::fs::create_dir_all(&self.temp_dir)?;

        let file_name = format!(
            "{}_{}_{}.{}",
            label,
            chrono::Utc::now().timestamp(),
            Uuid::now_v7().simple(),
            encoding.extension()
        );
        let path = self.temp_dir.join(file_name);
        let bytes = Self::encode(image, encoding)?;
        std::fs::write(&path, bytes)?;

        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Staged image"
        );
        Ok(StagedImage { path })
    }

    /// Decode a single remote output into an image.
    pub fn load(&self, output: RemoteOutput) -> Result<DynamicImage, TryOnError> {
        match output {
            RemoteOutput::Path(path) => {
                image::open(&path).map_err(|e| TryOnError::Decode(format!("{}: {}", path, e)))
            }
            RemoteOutput::Inline(bytes) => {
                image::load_from_memory(&bytes).map_err(|e| TryOnError::Decode(e.to_string()))
            }
            other => {
                warn!(shape = other.describe(), "Response is not a single image");
                Err(TryOnError::Decode(format!(
                    "expected an image, got {}",
                    other.describe()
                )))
            }
        }
    }
}
