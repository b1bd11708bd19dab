use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

/// Requests older than this are rejected as possible replays.
const MAX_REQUEST_AGE_SECS: u64 = 300;
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Verify `X-Slack-Signature` against the current time.
pub fn verify_slack_signature(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    verify_slack_signature_at(request_body, timestamp, signature, signing_secret, now)
}

/// Verify a Slack request signature as of `now_secs`.
pub fn verify_slack_signature_at(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
    now_secs: u64,
) -> bool {
    let Ok(ts) = timestamp.parse::<u64>() else {
        error!("Request timestamp is not a number");
        return false;
    };
    if now_secs.saturating_sub(ts) > MAX_REQUEST_AGE_SECS || ts > now_secs + MAX_CLOCK_SKEW_SECS {
        error!("Timestamp out of range, potential replay attack");
        return false;
    }

    let Some(expected) = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
    else {
        error!("Malformed X-Slack-Signature");
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return false;
        }
    };
    mac.update(format!("v0:{timestamp}:{request_body}").as_bytes());

    if mac.verify_slice(&expected).is_ok() {
        true
    } else {
        error!("Signature verification failed");
        false
    }
}

/// Compare a shared-secret token without leaking where it differs.
///
/// Both sides go through HMAC keyed by the secret so the comparison runs in
/// constant time and does not depend on the token's length.
pub fn verify_shared_token(token: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let keyed = |value: &str| {
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };
    let (Ok(expected), Ok(candidate)) = (keyed(secret), keyed(token)) else {
        error!("Failed to create HMAC");
        return false;
    };
    candidate
        .verify_slice(&expected.finalize().into_bytes())
        .is_ok()
}

pub fn compute_signature(timestamp: &str, request_body: &str, signing_secret: &str) -> String {
    let base_string = format!("v0:{timestamp}:{request_body}");
    let mut mac = match Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return String::new();
        }
    };
    mac.update(base_string.as_bytes());
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}
