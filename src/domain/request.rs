use crate::domain::value::{MessageText, PhoneNumber};

#[derive(Debug, Clone, PartialEq, Eq)]
/// One `Publish` call: a single message to a single phone number.
pub struct Publish {
    destination: String,
    message: MessageText,
}

impl Publish {
    /// Build a request addressed to the transmit form of `phone` (E.164 without the `+`).
    pub fn new(phone: &PhoneNumber, message: MessageText) -> Self {
        Self {
            destination: phone.transmit_form().to_owned(),
            message,
        }
    }

    /// Destination exactly as it is put on the wire.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn message(&self) -> &MessageText {
        &self.message
    }
}
