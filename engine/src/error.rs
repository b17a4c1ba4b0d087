use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can stop an outbound request from producing a response.
///
/// None of these reach the caller as a protocol error; the executor folds
/// them into a `ResponseDescriptor` with status 0.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("invalid method {0:?}")]
    InvalidMethod(String),

    #[error("invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header {name:?}")]
    InvalidHeader { name: String },

    #[error("failed to build request")]
    Build(#[source] BoxError),

    #[error(transparent)]
    Send(BoxError),

    #[error(transparent)]
    ReadBody(BoxError),
}

impl ExecuteError {
    /// Prefix used when this error is reported back in a response body.
    pub fn context(&self) -> &'static str {
        match self {
            ExecuteError::ReadBody(_) => "Failed to read response",
            _ => "Request failed",
        }
    }
}

/// Renders an error followed by its chain of causes, joined by `": "`.
///
/// `Display` of `ExecuteError` is only the top-level message; HTTP client
/// errors keep the interesting part (connection refused, timed out,
/// certificate rejected) in their sources. Causes whose text is already part
/// of the message are skipped.
pub fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
