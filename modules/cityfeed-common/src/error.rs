use thiserror::Error;

#[derive(Error, Debug)]
pub enum CityFeedError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
