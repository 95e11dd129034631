use std::collections::BTreeMap;
use std::fmt;

use crate::domain::validation::ValidationError;

use phonenumber::country;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// AWS access key id (`api_key` in the integration record).
///
/// Invariant: non-empty after trimming.
pub struct AccessKeyId(String);

impl AccessKeyId {
    /// Integration key under which the access key is stored (`api_key`).
    pub const FIELD: &'static str = "api_key";

    /// Create a validated [`AccessKeyId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated key id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq)]
/// AWS secret access key (`secret_id` in the integration record).
///
/// Invariant: non-empty after trimming. `Debug` output is redacted.
pub struct SecretAccessKey(String);

impl SecretAccessKey {
    /// Integration key under which the secret is stored (`secret_id`).
    pub const FIELD: &'static str = "secret_id";

    /// Create a validated [`SecretAccessKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretAccessKey(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// AWS region the SNS endpoint is scoped to (`region`), e.g. `us-east-1`.
///
/// Invariant: non-empty after trimming. The value is passed to the SDK as configured; an unknown
/// region surfaces as a provider error at publish time.
pub struct AwsRegion(String);

impl AwsRegion {
    /// Integration key under which the region is stored (`region`).
    pub const FIELD: &'static str = "region";

    /// Create a validated [`AwsRegion`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated region.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved provider credentials.
///
/// The three parts are validated together; a partially configured integration never produces a
/// [`Credentials`] value.
pub struct Credentials {
    access_key: AccessKeyId,
    secret_key: SecretAccessKey,
    region: AwsRegion,
}

impl Credentials {
    pub fn new(access_key: AccessKeyId, secret_key: SecretAccessKey, region: AwsRegion) -> Self {
        Self {
            access_key,
            secret_key,
            region,
        }
    }

    /// Build credentials from decrypted integration keys (`api_key`, `secret_id`, `region`).
    pub fn from_api_keys(keys: &BTreeMap<String, String>) -> Result<Self, ValidationError> {
        let field = |name: &str| keys.get(name).map(String::as_str).unwrap_or_default();
        Ok(Self {
            access_key: AccessKeyId::new(field(AccessKeyId::FIELD))?,
            secret_key: SecretAccessKey::new(field(SecretAccessKey::FIELD))?,
            region: AwsRegion::new(field(AwsRegion::FIELD))?,
        })
    }

    pub fn access_key(&self) -> &AccessKeyId {
        &self.access_key
    }

    pub fn secret_key(&self) -> &SecretAccessKey {
        &self.secret_key
    }

    pub fn region(&self) -> &AwsRegion {
        &self.region
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMS message body (`Message`).
///
/// Invariant: non-empty. Whitespace counts as content and is preserved as given.
pub struct MessageText(String);

impl MessageText {
    /// Form field name used by SNS (`Message`).
    pub const FIELD: &'static str = "Message";

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
/// Parsed phone number with an E.164 representation.
///
/// Equality, ordering, and hashing are based on the E.164 form.
pub struct PhoneNumber {
    raw: String,
    e164: String,
    parsed: phonenumber::PhoneNumber,
}

impl PhoneNumber {
    /// Form field name used by SNS (`PhoneNumber`).
    pub const FIELD: &'static str = "PhoneNumber";

    /// Parse, validate, and normalize a phone number into E.164.
    ///
    /// `default_region` is used when the input does not contain an explicit country prefix.
    /// Numbers that parse but are not valid for their region are rejected as well. Only the empty
    /// string is reported as [`ValidationError::Empty`]; whitespace goes to the parser, whose error
    /// text becomes the rejection reason.
    pub fn parse(
        default_region: Option<country::Id>,
        input: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let input = input.into();
        if input.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        let raw = input.trim().to_owned();

        let parsed = phonenumber::parse(default_region, &raw).map_err(|err| {
            ValidationError::InvalidPhoneNumber {
                reason: err.to_string(),
            }
        })?;

        if !phonenumber::is_valid(&parsed) {
            return Err(ValidationError::InvalidPhoneNumber {
                reason: "not a valid number for its region".to_owned(),
            });
        }

        let e164 = phonenumber::format(&parsed)
            .mode(phonenumber::Mode::E164)
            .to_string();

        Ok(Self { raw, e164, parsed })
    }

    /// Raw input after trimming.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized E.164 representation.
    pub fn e164(&self) -> &str {
        &self.e164
    }

    /// Destination as transmitted to SNS: the E.164 form without its leading `+`.
    pub fn transmit_form(&self) -> &str {
        // E.164 output always starts with the single-byte '+'.
        self.e164.get(1..).unwrap_or_default()
    }

    /// E.164 form with every digit except the last four replaced by `*`, for logs.
    pub fn masked(&self) -> String {
        let digits = self.transmit_form();
        let visible = digits.len().min(4);
        let hidden = digits.len() - visible;
        format!("+{}{}", "*".repeat(hidden), &digits[hidden..])
    }

    /// The parsed phone number from the `phonenumber` crate.
    pub fn parsed(&self) -> &phonenumber::PhoneNumber {
        &self.parsed
    }
}

impl PartialEq for PhoneNumber {
    fn eq(&self, other: &Self) -> bool {
        self.e164 == other.e164
    }
}

impl Eq for PhoneNumber {}

impl std::hash::Hash for PhoneNumber {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.e164.hash(state);
    }
}

impl std::cmp::PartialOrd for PhoneNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::cmp::Ord for PhoneNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.e164.cmp(&other.e164)
    }
}
