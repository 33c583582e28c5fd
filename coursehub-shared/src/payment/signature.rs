/// HMAC-SHA256 signature verification for gateway callbacks
///
/// Two message formats are signed by the gateway:
///
/// - client payment confirmation: `"{order_id}|{payment_id}"`, signed with the
///   API key secret (see [`payment_message`])
/// - webhook delivery: the exact raw request body, signed with the webhook
///   secret
///
/// Webhook bodies must be verified before any JSON parsing. Re-serializing a
/// parsed body can reorder keys or change whitespace, which changes the bytes
/// and breaks the signature.
///
/// ```
/// use coursehub_shared::payment::signature::{payment_message, sign, verify};
///
/// let message = payment_message("order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f");
/// let signature = sign("key_secret", message.as_bytes());
/// assert!(verify("key_secret", message.as_bytes(), &signature).unwrap());
/// assert!(!verify("other_secret", message.as_bytes(), &signature).unwrap());
/// ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{CoreError, CoreResult, FieldError};

type HmacSha256 = Hmac<Sha256>;

/// Canonical message signed for a client payment confirmation
pub fn payment_message(order_id: &str, payment_id: &str) -> String {
    format!("{}|{}", order_id, payment_id)
}

fn digest(secret: &str, message: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Lowercase hex HMAC-SHA256 of `message`
///
/// Used to produce fixtures and to sign outbound test payloads.
pub fn sign(secret: &str, message: &[u8]) -> String {
    hex::encode(digest(secret, message))
}

/// Checks `provided_signature` against the HMAC of `message` under `secret`
///
/// Returns `Ok(false)` for any mismatch, including signatures of the wrong
/// length or that are not hex. Errors only when the secret or the signature is
/// empty. Comparison is constant-time.
pub fn verify(secret: &str, message: &[u8], provided_signature: &str) -> CoreResult<bool> {
    let mut missing = Vec::new();
    if secret.is_empty() {
        missing.push(FieldError::missing("secret"));
    }
    if provided_signature.trim().is_empty() {
        missing.push(FieldError::missing("signature"));
    }
    if !missing.is_empty() {
        return Err(CoreError::Validation(missing));
    }

    let provided = match hex::decode(provided_signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };

    let expected = digest(secret, message);
    if expected.len() != provided.len() {
        return Ok(false);
    }
    Ok(expected.ct_eq(&provided).into())
}
