use thiserror::Error;

use crate::smoothie::SmoothieId;
use crate::views::form::Field;

pub const FETCH_ERROR_MESSAGE: &str = "Could not fetch the smoothies";
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all the fields correctly";

/// Failure reported by a [`crate::store::SmoothieStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not reach the data service: {0}")]
    Network(String),
    #[error("data service answered {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("no smoothie with id {0}")]
    NotFound(SmoothieId),
    #[error("unexpected response from the data service: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Local check of a form, never sent to the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the {0} field is empty")]
    MissingField(Field),
    #[error("rating `{0}` is not a whole number")]
    RatingNotANumber(String),
}

/// Tagged outcome of a failed form submission.
#[derive(Error, Debug)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("network failure: {0}")]
    Network(String),
    #[error("rejected by the data service: {0}")]
    Rejected(String),
    #[error("smoothie {0} does not exist")]
    NotFound(SmoothieId),
}

impl From<StoreError> for FormError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Network(msg) => FormError::Network(msg),
            StoreError::NotFound(id) => FormError::NotFound(id),
            StoreError::Rejected { message, .. } => FormError::Rejected(message),
            e @ (StoreError::Decode(_) | StoreError::Database(_)) => {
                FormError::Rejected(e.to_string())
            }
        }
    }
}

impl FormError {
    /// Text shown next to the form or list.
    pub fn user_message(&self) -> String {
        match self {
            FormError::Validation(ValidationError::MissingField(_)) => {
                MISSING_FIELDS_MESSAGE.to_string()
            }
            FormError::Validation(ValidationError::RatingNotANumber(value)) => {
                format!("Rating must be a whole number, got \"{}\"", value)
            }
            FormError::Network(_) => {
                "Could not reach the smoothie service, please try again".to_string()
            }
            FormError::Rejected(msg) => {
                format!("The smoothie service rejected the request: {}", msg)
            }
            FormError::NotFound(id) => format!("Smoothie {} no longer exists", id),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("invalid value `{value}` for {var}")]
    Invalid { var: &'static str, value: String },
    #[error("could not build the HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_cause() {
        let network: FormError = StoreError::Network("connection refused".into()).into();
        assert!(matches!(network, FormError::Network(_)));

        let rejected: FormError = StoreError::Rejected {
            status: 400,
            message: "invalid input syntax for type bigint".into(),
        }
        .into();
        assert_eq!(
            rejected.user_message(),
            "The smoothie service rejected the request: invalid input syntax for type bigint"
        );

        let missing: FormError = StoreError::NotFound(9).into();
        assert_eq!(missing.user_message(), "Smoothie 9 no longer exists");
    }

    #[test]
    fn validation_messages() {
        let empty = FormError::from(ValidationError::MissingField(Field::Method));
        assert_eq!(empty.user_message(), MISSING_FIELDS_MESSAGE);

        let nan = FormError::from(ValidationError::RatingNotANumber("ten".into()));
        assert_eq!(nan.user_message(), "Rating must be a whole number, got \"ten\"");
    }
}
