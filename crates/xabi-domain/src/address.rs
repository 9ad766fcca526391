use alloy::primitives::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid address '{address}': expected 0x followed by 40 characters")]
    InvalidLength { address: String },

    #[error("Invalid address '{address}': contains non-hexadecimal characters")]
    InvalidHex { address: String },
}

/// Parses a user-supplied EVM address.
///
/// Requires the `0x` prefix and a total length of 42, and rejects non-hex
/// characters. Checksum casing is not enforced.
pub fn parse_address(value: &str) -> Result<Address, AddressError> {
    let trimmed = value.trim();
    if !trimmed.starts_with("0x") || trimmed.len() != 42 {
        return Err(AddressError::InvalidLength {
            address: trimmed.to_string(),
        });
    }

    trimmed.parse::<Address>().map_err(|_| AddressError::InvalidHex {
        address: trimmed.to_string(),
    })
}

/// Canonical comparison key for addresses: trimmed and lowercased.
pub fn normalize_address(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}
