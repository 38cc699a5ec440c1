use recommender_common::error::ClientError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("config error: {0}")]
    Config(String),

    #[error("terminal i/o error: {0}")]
    Io(#[from] std::io::Error),
}
