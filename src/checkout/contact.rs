//! Checkout contact details

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contact form validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// No email address was entered
    #[error("email address is required")]
    MissingEmail,

    /// The email address is not of the form `local@domain`
    #[error("{0:?} is not a valid email address")]
    InvalidEmail(String),
}

/// Billing address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street line
    pub line1: String,

    /// City
    pub city: String,

    /// State or region
    pub state: String,

    /// Postal code
    pub postal_code: String,

    /// ISO country code
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            line1: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: "US".to_string(),
        }
    }
}

/// Contact and billing details entered at checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    /// Cardholder name
    pub name: String,

    /// Email address, required
    pub email: String,

    /// Billing address
    pub address: Address,
}

impl ContactDetails {
    /// Contact details with only an email address
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Check that the required fields are present.
    ///
    /// # Errors
    ///
    /// Returns an error if the email address is missing or malformed.
    pub fn validate(&self) -> Result<(), ContactError> {
        let email = self.email.trim();

        if email.is_empty() {
            return Err(ContactError::MissingEmail);
        }

        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.contains(char::is_whitespace)
            });

        if well_formed {
            Ok(())
        } else {
            Err(ContactError::InvalidEmail(email.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_address() {
        assert_eq!(
            ContactDetails::with_email("jane@example.com").validate(),
            Ok(())
        );
    }

    #[test]
    fn rejects_blank_email() {
        assert_eq!(
            ContactDetails::with_email("   ").validate(),
            Err(ContactError::MissingEmail)
        );
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["jane", "@example.com", "jane@", "a@b@c", "ja ne@example.com"] {
            assert!(
                matches!(
                    ContactDetails::with_email(email).validate(),
                    Err(ContactError::InvalidEmail(_))
                ),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn address_defaults_to_us() {
        assert_eq!(Address::default().country, "US");
    }
}
