use thiserror::Error;

#[derive(Error, Debug)]
pub enum LearningStoreError {
    #[error("learning data I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("learning data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
