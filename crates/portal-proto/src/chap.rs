//! CHAP (Challenge-Handshake Authentication Protocol) support
//!
//! The portal proves knowledge of a user's password to the NAS by sending
//! `MD5(CHAP identifier + password + challenge)` instead of the password.
//! The same digest is used by external callers that receive CHAP
//! credentials and need to check them against a stored secret.

/// Length of a CHAP response (MD5 digest)
pub const CHAP_RESPONSE_LENGTH: usize = 16;

/// Compute a CHAP response
///
/// Response = MD5(CHAP_Identifier + Secret + Challenge)
pub fn compute_chap_response(ident: u8, secret: &[u8], challenge: &[u8]) -> [u8; 16] {
    let mut data = Vec::with_capacity(1 + secret.len() + challenge.len());
    data.push(ident);
    data.extend_from_slice(secret);
    data.extend_from_slice(challenge);

    md5::compute(&data).0
}

/// CHAP identifier for a portal request: the low byte of the request id
pub fn chap_ident(req_id: u16) -> u8 {
    (req_id & 0xff) as u8
}

/// Verify a presented CHAP response against the stored secret
///
/// A response that is not exactly one digest long is rejected. All bytes are
/// compared without early exit.
pub fn verify_chap(chap_id: u8, stored_secret: &[u8], challenge: &[u8], presented: &[u8]) -> bool {
    if presented.len() != CHAP_RESPONSE_LENGTH {
        return false;
    }

    let expected = compute_chap_response(chap_id, stored_secret, challenge);
    expected
        .iter()
        .zip(presented)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
