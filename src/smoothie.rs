use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type SmoothieId = i64;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Smoothie {
    pub id: SmoothieId,
    pub title: String,
    pub method: String,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

/// Payload of an insert or a full-field update.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewSmoothie {
    pub title: String,
    pub method: String,
    pub rating: i64,
}

/// Column a list is sorted by, always descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    CreatedAt,
    Title,
    Rating,
}

impl OrderBy {
    pub const ALL: [OrderBy; 3] = [OrderBy::CreatedAt, OrderBy::Title, OrderBy::Rating];

    pub fn column(self) -> &'static str {
        match self {
            OrderBy::CreatedAt => "created_at",
            OrderBy::Title => "title",
            OrderBy::Rating => "rating",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderBy::CreatedAt => "Time Created",
            OrderBy::Title => "Title",
            OrderBy::Rating => "Rating",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ordering key `{0}`, expected created_at, title or rating")]
pub struct UnknownOrderKey(pub String);

impl FromStr for OrderBy {
    type Err = UnknownOrderKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created_at" | "created" | "time" => Ok(OrderBy::CreatedAt),
            "title" => Ok(OrderBy::Title),
            "rating" => Ok(OrderBy::Rating),
            other => Err(UnknownOrderKey(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_key_parses_columns_and_aliases() {
        assert_eq!("created_at".parse(), Ok(OrderBy::CreatedAt));
        assert_eq!(" Time ".parse(), Ok(OrderBy::CreatedAt));
        assert_eq!("TITLE".parse(), Ok(OrderBy::Title));
        assert_eq!("rating".parse(), Ok(OrderBy::Rating));
        assert_eq!(
            "colour".parse::<OrderBy>(),
            Err(UnknownOrderKey("colour".to_string()))
        );
    }

    #[test]
    fn smoothie_decodes_from_service_json() {
        let json = r#"{
            "id": 4,
            "title": "Mango Tango",
            "method": "Blend mango with ice",
            "rating": 8,
            "created_at": "2023-02-11T10:15:30.123456+00:00"
        }"#;
        let smoothie: Smoothie = serde_json::from_str(json).unwrap();
        assert_eq!(smoothie.id, 4);
        assert_eq!(smoothie.rating, 8);
        assert_eq!(smoothie.title, "Mango Tango");
    }
}
