use thiserror::Error;

/// Errors raised while decoding bytecode.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Input is not valid hex
    #[error("invalid bytecode hex: {0}")]
    InvalidHex(String),

    /// Address has no deployed code
    #[error("empty bytecode")]
    EmptyCode,
}
