//! Credential resolution against the host's integration store.
//!
//! The host owns storage and decryption; this module only reads a published integration record
//! and turns its three required keys into [`Credentials`].

use std::collections::BTreeMap;

use crate::BoxFuture;
use crate::domain::{Credentials, ValidationError};

/// Name of the integration record holding the SNS credentials.
pub const DEFAULT_INTEGRATION_NAME: &str = "AmazonSNS";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Integration record as exposed by the host: a published flag plus decrypted key fields.
pub struct Integration {
    published: bool,
    api_keys: BTreeMap<String, String>,
}

impl Integration {
    pub fn new(published: bool) -> Self {
        Self {
            published,
            api_keys: BTreeMap::new(),
        }
    }

    /// Add one decrypted key field (`api_key`, `secret_id`, `region`).
    pub fn with_api_key(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.api_keys.insert(field.into(), value.into());
        self
    }

    /// Whether the integration is administratively enabled.
    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn decrypted_api_keys(&self) -> &BTreeMap<String, String> {
        &self.api_keys
    }
}

/// Host capability: look up an integration record by name.
pub trait IntegrationLookup: Send + Sync {
    fn integration<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<Integration>>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Why credentials could not be resolved.
///
/// All variants are expected states of a host installation rather than faults.
pub enum NotConfigured {
    #[error("integration {name} is not installed")]
    Absent { name: String },

    #[error("integration {name} is not published")]
    Unpublished { name: String },

    #[error("integration credentials are incomplete: {0}")]
    Credentials(#[source] ValidationError),
}

/// Resolves the provider credentials; called by the dispatcher until it succeeds once.
pub trait CredentialProvider: Send + Sync {
    fn resolve(&self) -> BoxFuture<'_, Result<Credentials, NotConfigured>>;
}

#[derive(Debug, Clone)]
/// [`CredentialProvider`] reading a named integration through an [`IntegrationLookup`].
pub struct IntegrationCredentials<L> {
    lookup: L,
    name: String,
}

impl<L: IntegrationLookup> IntegrationCredentials<L> {
    /// Read the [`DEFAULT_INTEGRATION_NAME`] integration from `lookup`.
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            name: DEFAULT_INTEGRATION_NAME.to_owned(),
        }
    }

    /// Read a differently named integration.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<L: IntegrationLookup> CredentialProvider for IntegrationCredentials<L> {
    fn resolve(&self) -> BoxFuture<'_, Result<Credentials, NotConfigured>> {
        Box::pin(async move {
            let Some(integration) = self.lookup.integration(&self.name).await else {
                tracing::debug!(integration = %self.name, "integration not found");
                return Err(NotConfigured::Absent {
                    name: self.name.clone(),
                });
            };

            if !integration.is_published() {
                tracing::debug!(integration = %self.name, "integration not published");
                return Err(NotConfigured::Unpublished {
                    name: self.name.clone(),
                });
            }

            let credentials = Credentials::from_api_keys(integration.decrypted_api_keys())
                .map_err(NotConfigured::Credentials)?;

            tracing::debug!(
                integration = %self.name,
                region = credentials.region().as_str(),
                "resolved provider credentials"
            );
            Ok(credentials)
        })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory [`IntegrationLookup`] for hosts that load their integrations up front.
pub struct StaticIntegrations {
    integrations: BTreeMap<String, Integration>,
}

impl StaticIntegrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, integration: Integration) -> Self {
        self.integrations.insert(name.into(), integration);
        self
    }
}

impl IntegrationLookup for StaticIntegrations {
    fn integration<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<Integration>> {
        Box::pin(async move { self.integrations.get(name).cloned() })
    }
}
