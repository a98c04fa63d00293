pub type StagecraftResult<T> = Result<T, StagecraftError>;

#[derive(thiserror::Error, Debug)]
pub enum StagecraftError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("mount error: {0}")]
    Mount(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StagecraftError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn mount(msg: impl Into<String>) -> Self {
        Self::Mount(msg.into())
    }

    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }
}
