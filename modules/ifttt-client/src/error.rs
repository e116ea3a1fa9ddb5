use thiserror::Error;

pub type Result<T> = std::result::Result<T, IftttError>;

#[derive(Debug, Error)]
pub enum IftttError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Webhook error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for IftttError {
    fn from(err: reqwest::Error) -> Self {
        // The trigger URL embeds the key; keep it out of error messages.
        IftttError::Network(err.without_url().to_string())
    }
}
