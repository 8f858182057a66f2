mod kind;
#[allow(clippy::module_inception)]
mod message;

pub use kind::{AuthMethod, MessageType};
pub use message::{Message, MessageError};
