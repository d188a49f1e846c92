use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("system entropy source unavailable: {0}")]
    Entropy(String),
}
