use thiserror::Error;

#[derive(Error, Debug)]
pub enum RhonetError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RhonetError>;
