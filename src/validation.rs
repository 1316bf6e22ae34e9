//! Address validation for watched sources

use thiserror::Error;

/// Validation failures surfaced to the operator at input time
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing address")]
    MissingAddress,

    #[error("Invalid Solana address format: {0}")]
    InvalidSolanaAddress(String),
}

/// Validate a Solana address before it is stored as a watched source
pub fn validate_solana_address(address: &str) -> Result<(), ValidationError> {
    // Check if address is empty
    if address.trim().is_empty() {
        return Err(ValidationError::MissingAddress);
    }

    // Decode base58 string
    let decoded = match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes,
        Err(_) => return Err(ValidationError::InvalidSolanaAddress(address.to_string())),
    };

    // Validate length (Solana addresses are 32 bytes)
    if decoded.len() != 32 {
        return Err(ValidationError::InvalidSolanaAddress(address.to_string()));
    }

    Ok(())
}
