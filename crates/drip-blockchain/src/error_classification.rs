use std::time::Duration;

use alloy::transports::{RpcError, TransportErrorKind};

/// Node rejections that clear up once the nonce/fee fillers re-query state.
const STALE_SUBMISSION_PATTERNS: [&str; 6] = [
    "replacement transaction underpriced",
    "transaction underpriced",
    "nonce too low",
    "nonce is too low",
    "nonce has already been used",
    "already known",
];

pub(crate) fn is_retryable_rpc_error(err: &RpcError<TransportErrorKind>) -> bool {
    if has_revert_data(err) {
        return false;
    }

    match err {
        RpcError::Transport(kind) => match kind {
            TransportErrorKind::MissingBatchResponse(_) => true,
            TransportErrorKind::BackendGone => true,
            TransportErrorKind::HttpError(http) => {
                http.is_rate_limit_err() || http.is_temporarily_unavailable()
            }
            TransportErrorKind::Custom(custom) => {
                let msg = custom.to_string().to_ascii_lowercase();
                msg.contains("too many requests") || msg.contains("rate limit")
            }
            _ => false,
        },
        RpcError::ErrorResp(payload) => payload.is_retry_err(),
        RpcError::NullResp => true,
        RpcError::DeserError { text, .. } => {
            let lowered = text.to_ascii_lowercase();
            lowered.contains("rate limit")
                || lowered.contains("too many requests")
                || lowered.contains("request limit")
        }
        _ => false,
    }
}

/// Submission errors worth one more attempt after the provider re-fills
/// nonce and fees.
pub(crate) fn is_retryable_submission_error(err: &RpcError<TransportErrorKind>) -> bool {
    if is_retryable_rpc_error(err) {
        return true;
    }
    if has_revert_data(err) {
        return false;
    }

    let message = rpc_error_message(err).to_ascii_lowercase();
    STALE_SUBMISSION_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

pub(crate) fn should_refresh_rpc_error(err: &RpcError<TransportErrorKind>) -> bool {
    matches!(
        err,
        RpcError::Transport(TransportErrorKind::BackendGone)
            | RpcError::Transport(TransportErrorKind::PubsubUnavailable)
    )
}

pub(crate) fn rpc_backoff_hint(err: &RpcError<TransportErrorKind>) -> Option<Duration> {
    let RpcError::ErrorResp(payload) = err else {
        return None;
    };

    let data = payload.try_data_as::<serde_json::Value>()?;
    let Ok(data) = data else {
        return None;
    };

    let backoff_seconds = data["rate"]["backoff_seconds"].as_f64()?;
    Some(Duration::from_secs(backoff_seconds.ceil() as u64))
}

pub(crate) fn has_revert_data(err: &RpcError<TransportErrorKind>) -> bool {
    err.as_error_resp()
        .and_then(|payload| payload.as_revert_data())
        .is_some()
}

fn rpc_error_message(err: &RpcError<TransportErrorKind>) -> String {
    match err {
        RpcError::ErrorResp(payload) => payload.to_string(),
        RpcError::Transport(TransportErrorKind::HttpError(http)) => http.body.clone(),
        RpcError::Transport(TransportErrorKind::Custom(custom)) => custom.to_string(),
        RpcError::DeserError { text, .. } => text.clone(),
        _ => err.to_string(),
    }
}
