use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid mode: {0:?} (expected 1 for text or 2 for image)")]
    InvalidMode(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("completion service error: {0}")]
    Service(#[from] mc_llm::LlmError),
}
