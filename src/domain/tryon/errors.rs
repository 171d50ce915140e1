use thiserror::Error;

/// Substrings that mark a remote failure as rate-limit class.
///
/// Remote services report quota exhaustion as free text, so this list is a
/// policy, not a protocol. HTTP 429 responses are classified before any of
/// these are consulted.
const RATE_LIMIT_MARKERS: [&str; 4] = [
    "429",
    "too many requests",
    "rate limit",
    "exceeded your gpu quota",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TryOnError {
    #[error("Both body photo and clothing item are required")]
    MissingInput,
    #[error("Invalid input image: {0}")]
    InvalidInput(String),
    #[error(
        "All virtual try-on services are currently unavailable. Please try again in a few minutes."
    )]
    ServiceUnavailable,
    #[error("{0}")]
    RateLimited(String),
    #[error("All services are rate-limited. Please try again in 1-2 minutes.")]
    AllRateLimited,
    #[error("{0}")]
    Remote(String),
    #[error("Failed to load result image: {0}")]
    Decode(String),
    #[error("Temporary storage error: {0}")]
    Io(String),
}

/// Whether a failure may be recovered by moving to another endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimit,
    Terminal,
}

impl TryOnError {
    /// Wrap a remote failure message, classifying it by its text.
    pub fn remote(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_rate_limit_message(&message) {
            Self::RateLimited(message)
        } else {
            Self::Remote(message)
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::RateLimited(_) => ErrorClass::RateLimit,
            _ => ErrorClass::Terminal,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.class() == ErrorClass::RateLimit
    }
}

pub fn is_rate_limit_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

impl From<std::io::Error> for TryOnError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
