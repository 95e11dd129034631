use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    /// Carries the phone parser's own error text; the rejected input is not kept.
    InvalidPhoneNumber { reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidPhoneNumber { reason } => f.write_str(reason),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::ValidationError;

    #[test]
    fn display_messages_are_human_readable() {
        let err = ValidationError::Empty { field: "api_key" };
        assert_eq!(err.to_string(), "api_key must not be empty");

        let err = ValidationError::InvalidPhoneNumber {
            reason: "not a number".to_owned(),
        };
        assert_eq!(err.to_string(), "not a number");
    }
}
