use thiserror::Error;

#[derive(Debug, Error)]
pub enum FramewatchError {
    #[error("config error: {0}")]
    Config(String),

    #[error("detect error: {0}")]
    Detect(#[from] framewatch_detect::DetectError),

    #[error("serialization error: {0}")]
    Serialize(String),
}
