use alloy::{
    hex,
    primitives::Bytes,
    sol_types::decode_revert_reason,
    transports::{RpcError, TransportErrorKind},
};

fn spelunk_hex_revert(value: &serde_json::Value) -> Option<Bytes> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Object(o) => o.values().find_map(spelunk_hex_revert),
        _ => None,
    }
}

/// Revert payload attached to a JSON-RPC error response, if any.
pub(crate) fn extract_revert_data_lossy(err: &RpcError<TransportErrorKind>) -> Option<Bytes> {
    let payload = err.as_error_resp()?;
    if let Some(data) = payload.as_revert_data() {
        return Some(data);
    }

    // Some nodes nest the payload or send it as a bare, unquoted hex string.
    let raw = payload.data.as_ref()?;
    let s = raw.get().trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(s) {
        if let Some(bytes) = spelunk_hex_revert(&value) {
            return Some(bytes);
        }
    }

    s.trim_matches('"').parse().ok()
}

/// Human-readable reason for a revert payload.
pub(crate) fn describe_revert(data: &Bytes) -> String {
    if let Some(reason) = decode_revert_reason(data) {
        return reason;
    }

    if data.len() >= 4 {
        return format!(
            "Unknown custom error selector 0x{}",
            hex::encode(&data[..4])
        );
    }

    "execution reverted without reason".to_string()
}
