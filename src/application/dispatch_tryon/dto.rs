use crate::domain::tryon::errors::TryOnError;
use bytes::Bytes;
use image::DynamicImage;

/// A subject photo and a garment photo. Lives for one dispatch.
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    pub subject: DynamicImage,
    pub garment: DynamicImage,
}

impl TryOnRequest {
    pub fn new(subject: DynamicImage, garment: DynamicImage) -> Self {
        Self { subject, garment }
    }

    /// Decode uploaded bytes. Missing or empty parts are `MissingInput`.
    pub fn from_uploads(subject: Option<Bytes>, garment: Option<Bytes>) -> Result<Self, TryOnError> {
        let subject = subject.filter(|b| !b.is_empty()).ok_or(TryOnError::MissingInput)?;
        let garment = garment.filter(|b| !b.is_empty()).ok_or(TryOnError::MissingInput)?;

        let decode = |bytes: &Bytes, label: &str| {
            image::load_from_memory(bytes)
                .map_err(|e| TryOnError::InvalidInput(format!("{} image: {}", label, e)))
        };
        Ok(Self::new(decode(&subject, "body")?, decode(&garment, "clothing")?))
    }

    pub fn validate(&self) -> Result<(), TryOnError> {
        let empty = |image: &DynamicImage| image.width() == 0 || image.height() == 0;
        if empty(&self.subject) || empty(&self.garment) {
            return Err(TryOnError::MissingInput);
        }
        Ok(())
    }
}
