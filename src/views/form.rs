use std::fmt;

use crate::error::ValidationError;
use crate::smoothie::{NewSmoothie, Smoothie};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Method,
    Rating,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Method, Field::Rating];

    pub fn next(self) -> Option<Field> {
        match self {
            Field::Title => Some(Field::Method),
            Field::Method => Some(Field::Rating),
            Field::Rating => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Title => "title",
            Field::Method => "method",
            Field::Rating => "rating",
        })
    }
}

/// Raw text of the three editable inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmoothieForm {
    pub title: String,
    pub method: String,
    pub rating: String,
}

impl SmoothieForm {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Method => &self.method,
            Field::Rating => &self.rating,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Title => self.title = value,
            Field::Method => self.method = value,
            Field::Rating => self.rating = value,
        }
    }

    /// Presence check on every field, then integer coercion of the rating.
    pub fn validate(&self) -> Result<NewSmoothie, ValidationError> {
        if let Some(field) = Field::ALL
            .into_iter()
            .find(|f| self.get(*f).trim().is_empty())
        {
            return Err(ValidationError::MissingField(field));
        }
        let rating = self.rating.trim();
        let rating = rating
            .parse()
            .map_err(|_| ValidationError::RatingNotANumber(rating.to_string()))?;
        Ok(NewSmoothie {
            title: self.title.trim().to_string(),
            method: self.method.trim().to_string(),
            rating,
        })
    }
}

impl From<&Smoothie> for SmoothieForm {
    fn from(smoothie: &Smoothie) -> Self {
        SmoothieForm {
            title: smoothie.title.clone(),
            method: smoothie.method.clone(),
            rating: smoothie.rating.to_string(),
        }
    }
}
