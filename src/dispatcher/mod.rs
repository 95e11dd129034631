//! Orchestration: one message to one contact, every failure folded into a [`SendOutcome`].
//!
//! The pipeline is fixed: recipient check, number normalization, credential resolution (once per
//! dispatcher), message check, then a single publish. Credentials resolved once are kept for the
//! lifetime of the dispatcher even if the backing integration changes later; build a new
//! dispatcher to pick up new credentials.

use std::sync::Arc;

use phonenumber::country;
use tokio::sync::OnceCell;

use crate::client::{Publisher, SnsClient, SnsError};
use crate::credentials::{
    CredentialProvider, IntegrationCredentials, IntegrationLookup, NotConfigured,
};
use crate::domain::{
    Credentials, MessageText, PhoneNumber, Publish, PublishReceipt, ValidationError,
};

/// Region assumed for numbers written without a country code.
pub const DEFAULT_REGION: country::Id = country::Id::CO;

/// Read-only view of the host's contact record.
pub trait Contact {
    fn phone_number(&self) -> Option<&str>;
    fn display_name(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Plain [`Contact`] value.
pub struct BasicContact {
    pub display_name: String,
    pub phone_number: Option<String>,
}

impl BasicContact {
    pub fn new(display_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            phone_number: Some(phone_number.into()),
        }
    }
}

impl Contact for BasicContact {
    fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[derive(Debug, thiserror::Error)]
/// Why a send failed.
///
/// `Display` renders the message callers historically received as the failure text.
pub enum DispatchError {
    /// The contact's number could not be parsed or is not valid for its region.
    #[error("{0}")]
    InvalidNumberFormat(#[source] ValidationError),

    /// Credentials are absent, incomplete, or the integration is disabled.
    #[error("Amazon SNS is not configured properly.")]
    ProviderNotConfigured(#[source] NotConfigured),

    #[error("Message content is Empty.")]
    EmptyMessageBody,

    /// SNS rejected the publish call or it never reached SNS.
    #[error(transparent)]
    ProviderRejected(#[from] SnsError),
}

#[derive(Debug)]
/// Result of one [`SmsDispatcher::send`] call.
pub enum SendOutcome {
    /// SNS accepted the message.
    Sent(PublishReceipt),
    /// The contact has no phone number; nothing was attempted.
    NoRecipient,
    Failed(DispatchError),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Failure text for callers that only understand messages; `None` for success and for
    /// [`SendOutcome::NoRecipient`].
    pub fn failure_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }
}

/// Builder for [`SmsDispatcher`].
pub struct SmsDispatcherBuilder {
    credentials: Arc<dyn CredentialProvider>,
    publisher: Arc<dyn Publisher>,
    default_region: country::Id,
}

impl SmsDispatcherBuilder {
    pub fn new(
        credentials: impl CredentialProvider + 'static,
        publisher: impl Publisher + 'static,
    ) -> Self {
        Self {
            credentials: Arc::new(credentials),
            publisher: Arc::new(publisher),
            default_region: DEFAULT_REGION,
        }
    }

    /// Region hint for numbers without an explicit country code (default: [`DEFAULT_REGION`]).
    pub fn default_region(mut self, region: country::Id) -> Self {
        self.default_region = region;
        self
    }

    pub fn build(self) -> SmsDispatcher {
        SmsDispatcher {
            credentials: self.credentials,
            publisher: self.publisher,
            default_region: self.default_region,
            connection: OnceCell::new(),
        }
    }
}

/// Sends one SMS per call through a [`Publisher`], resolving credentials lazily.
///
/// Safe to share across tasks: concurrent first sends wait on a single credential resolution.
pub struct SmsDispatcher {
    credentials: Arc<dyn CredentialProvider>,
    publisher: Arc<dyn Publisher>,
    default_region: country::Id,
    connection: OnceCell<Credentials>,
}

impl SmsDispatcher {
    pub fn new(
        credentials: impl CredentialProvider + 'static,
        publisher: impl Publisher + 'static,
    ) -> Self {
        SmsDispatcherBuilder::new(credentials, publisher).build()
    }

    pub fn builder(
        credentials: impl CredentialProvider + 'static,
        publisher: impl Publisher + 'static,
    ) -> SmsDispatcherBuilder {
        SmsDispatcherBuilder::new(credentials, publisher)
    }

    /// Dispatcher reading the `AmazonSNS` integration from `lookup` and publishing through SNS.
    pub fn with_integrations<L: IntegrationLookup + 'static>(lookup: L, client: SnsClient) -> Self {
        Self::new(IntegrationCredentials::new(lookup), client)
    }

    /// Whether credentials have been resolved; never reverts to `false`.
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// Resolve and cache credentials if needed; returns whether the dispatcher is connected.
    pub async fn ensure_configured(&self) -> bool {
        self.connect().await.is_ok()
    }

    /// Send `content` to the contact's phone number.
    ///
    /// Never fails: every error is reported through the returned [`SendOutcome`]. A contact
    /// whose phone number is absent or the empty string yields [`SendOutcome::NoRecipient`]
    /// without logging anything. Whitespace is not empty: a blank number is handed to the parser
    /// and a blank `content` is published as is.
    pub async fn send<C: Contact + ?Sized>(&self, contact: &C, content: &str) -> SendOutcome {
        let Some(raw) = contact.phone_number().filter(|raw| !raw.is_empty()) else {
            return SendOutcome::NoRecipient;
        };

        let phone = match PhoneNumber::parse(Some(self.default_region), raw) {
            Ok(phone) => phone,
            Err(err) => {
                // The parser text never contains the rejected number.
                tracing::info!(reason = %err, "invalid number format");
                return SendOutcome::Failed(DispatchError::InvalidNumberFormat(err));
            }
        };

        match self.deliver(&phone, content).await {
            Ok(receipt) => {
                tracing::info!(
                    message_id = %receipt.message_id,
                    contact = contact.display_name(),
                    number = %phone.masked(),
                    "Amazon SNS request succeeded"
                );
                SendOutcome::Sent(receipt)
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    contact = contact.display_name(),
                    number = %phone.masked(),
                    "Amazon SNS request failed"
                );
                SendOutcome::Failed(err)
            }
        }
    }

    async fn deliver(
        &self,
        phone: &PhoneNumber,
        content: &str,
    ) -> Result<PublishReceipt, DispatchError> {
        let credentials = self
            .connect()
            .await
            .map_err(DispatchError::ProviderNotConfigured)?;
        let message = MessageText::new(content).map_err(|_| DispatchError::EmptyMessageBody)?;

        let request = Publish::new(phone, message);
        Ok(self.publisher.publish(&request, credentials).await?)
    }

    async fn connect(&self) -> Result<&Credentials, NotConfigured> {
        self.connection
            .get_or_try_init(|| self.credentials.resolve())
            .await
    }
}
