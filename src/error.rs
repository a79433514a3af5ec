use thiserror::Error;

/// Failures a chat or tutor turn can run into.
///
/// Every variant is recoverable: the session stays usable and the message is
/// shown to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssistantError {
    /// Missing or invalid endpoint, key, or setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no documents to read")]
    EmptyKnowledgeBase,

    /// Transport failure, timeout, non-success status or unusable body.
    #[error("remote call failed: {0}")]
    RemoteCall(String),

    /// The model did not return the expected JSON object.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("a reply is still being generated for this conversation")]
    Busy,

    #[error("input is empty")]
    EmptyInput,
}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AssistantError::RemoteCall(format!("request timed out: {}", e))
        } else {
            AssistantError::RemoteCall(e.to_string())
        }
    }
}
