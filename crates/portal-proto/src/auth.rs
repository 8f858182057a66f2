use crate::message::Message;

/// Calculate the version 2 Authenticator
///
/// Authenticator = MD5(Header + Request Authenticator + Attributes + Secret)
///
/// Messages originated by the portal use sixteen zero bytes as the request
/// authenticator; NAS responses use the authenticator of the matching request.
pub fn calculate_authenticator(
    message: &Message,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> [u8; 16] {
    let mut data = Vec::with_capacity(message.length() + secret.len());

    data.extend_from_slice(&message.header_bytes());
    data.extend_from_slice(request_authenticator);
    for attr in message.attributes() {
        attr.encode_into(&mut data);
    }
    data.extend_from_slice(secret);

    md5::compute(&data).0
}

/// Verify the Authenticator carried by `message`
///
/// Returns false for messages without an authenticator (version 1).
pub fn verify_authenticator(
    message: &Message,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    match message.authenticator() {
        Some(authenticator) => {
            *authenticator == calculate_authenticator(message, request_authenticator, secret)
        }
        None => false,
    }
}
