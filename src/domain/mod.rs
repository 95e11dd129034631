//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod validation;
mod value;

pub use request::Publish;
pub use response::PublishReceipt;
pub use validation::ValidationError;
pub use value::{
    AccessKeyId, AwsRegion, Credentials, MessageText, PhoneNumber, SecretAccessKey,
};
