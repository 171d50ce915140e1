use super::{endpoint::Endpoint, errors::TryOnError};
use bytes::Bytes;
use image::DynamicImage;

/// Handle to a file that has been uploaded to a remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: String,
    pub orig_name: Option<String>,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            orig_name: None,
        }
    }
}

/// Output of a remote prediction, before it is turned into an image.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutput {
    /// Local filesystem path to an image.
    Path(String),
    /// Encoded image bytes delivered with the response.
    Inline(Bytes),
    /// Multi-value response; services put the try-on image first.
    Tuple(Vec<RemoteOutput>),
    /// Explicit null.
    Empty,
}

impl RemoteOutput {
    /// First element of a tuple (recursively), or the value itself.
    pub fn into_first(self) -> Option<RemoteOutput> {
        match self {
            Self::Tuple(items) => items.into_iter().next().and_then(Self::into_first),
            Self::Empty => None,
            other => Some(other),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Inline(_) => "inline image",
            Self::Tuple(_) => "tuple",
            Self::Empty => "null",
        }
    }
}

/// Result of one dispatch. Failures carry their reason instead of pixels;
/// the presentation layer decides how to render them.
#[derive(Debug)]
pub enum TryOnOutcome {
    Success {
        image: DynamicImage,
        endpoint: Endpoint,
    },
    Failure(TryOnError),
}

impl TryOnOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error(&self) -> Option<&TryOnError> {
        match self {
            Self::Failure(err) => Some(err),
            Self::Success { .. } => None,
        }
    }

    /// Collapse into an image, rendering failures with `render`.
    pub fn into_image_with<F>(self, render: F) -> DynamicImage
    where
        F: FnOnce(&str) -> DynamicImage,
    {
        match self {
            Self::Success { image, .. } => image,
            Self::Failure(err) => render(&err.to_string()),
        }
    }
}
