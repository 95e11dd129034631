//! Amazon SNS SMS dispatch adapter.
//!
//! A domain layer of strong types (phone numbers, credentials, message text), a client layer issuing
//! a single `Publish` call through the AWS SDK, and a dispatcher that ties them together behind one
//! `send` operation.
//!
//! ```rust,no_run
//! use sns_sms::{BasicContact, Integration, SmsDispatcher, SnsClient, StaticIntegrations};
//!
//! #[tokio::main]
//! async fn main() {
//!     let integrations = StaticIntegrations::new().with(
//!         "AmazonSNS",
//!         Integration::new(true)
//!             .with_api_key("api_key", "AKID...")
//!             .with_api_key("secret_id", "...")
//!             .with_api_key("region", "us-east-1"),
//!     );
//!     let dispatcher = SmsDispatcher::with_integrations(integrations, SnsClient::new());
//!
//!     let contact = BasicContact::new("Ana", "300 123 4567");
//!     let outcome = dispatcher.send(&contact, "hola").await;
//!     println!("{outcome:?}");
//! }
//! ```
#![forbid(unsafe_code)]

use std::future::Future;
use std::pin::Pin;

pub mod client;
pub mod credentials;
pub mod dispatcher;
pub mod domain;

/// Boxed, `Send` future returned by the crate's object-safe traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use phonenumber::country;

pub use client::{Publisher, SnsClient, SnsClientBuilder, SnsError};
pub use credentials::{
    CredentialProvider, DEFAULT_INTEGRATION_NAME, Integration, IntegrationCredentials,
    IntegrationLookup, NotConfigured, StaticIntegrations,
};
pub use dispatcher::{
    BasicContact, Contact, DEFAULT_REGION, DispatchError, SendOutcome, SmsDispatcher,
    SmsDispatcherBuilder,
};
pub use domain::{
    AccessKeyId, AwsRegion, Credentials, MessageText, PhoneNumber, Publish, PublishReceipt,
    SecretAccessKey, ValidationError,
};
