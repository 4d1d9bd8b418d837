use alloy::{
    hex,
    primitives::Bytes,
    sol_types::{SolInterface, decode_revert_reason},
    transports::{RpcError, TransportErrorKind},
};

use super::contracts::{ChallengeManager, DripProfile, DripToken};

fn spelunk_hex_revert(value: &serde_json::Value) -> Option<Bytes> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Object(o) => o.values().find_map(spelunk_hex_revert),
        _ => None,
    }
}

/// Revert payload of a failed `eth_call`/`eth_estimateGas`, if the node sent one.
pub(crate) fn extract_revert_data(err: &RpcError<TransportErrorKind>) -> Option<Bytes> {
    let payload = err.as_error_resp()?;
    if let Some(data) = payload.as_revert_data() {
        return Some(data);
    }

    // Some nodes wrap the revert data in a non-standard object.
    let raw = payload.data.as_ref()?;
    let s = raw.get().trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(s)
        && let Some(bytes) = spelunk_hex_revert(&value)
    {
        return Some(bytes);
    }

    s.trim_matches('"').parse().ok()
}

/// Human-readable reason for a revert payload.
pub(crate) fn decode_revert_data(revert_data: &[u8]) -> String {
    macro_rules! decode_interface {
        ($iface:ty, $name:expr) => {
            if let Ok(decoded) = <$iface as SolInterface>::abi_decode(revert_data) {
                return format!("{}::{:?}", $name, decoded);
            }
        };
    }

    decode_interface!(DripToken::DripTokenErrors, "DripToken");
    decode_interface!(DripProfile::DripProfileErrors, "DripProfile");
    decode_interface!(ChallengeManager::ChallengeManagerErrors, "ChallengeManager");

    if let Some(reason) = decode_revert_reason(revert_data) {
        return reason;
    }

    if revert_data.len() >= 4 {
        return format!(
            "Unknown custom error selector 0x{}",
            hex::encode(&revert_data[..4])
        );
    }

    format!("Unknown revert data 0x{}", hex::encode(revert_data))
}
