use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;

use crate::error::{ConfigError, StoreError};
use crate::smoothie::{NewSmoothie, OrderBy, Smoothie, SmoothieId};
use crate::store::SmoothieStore;

const REST_PATH: &str = "rest/v1";
const MAX_ERROR_BODY: usize = 500;

/// Client for a hosted Postgres table exposed through PostgREST.
pub struct PostgrestStore {
    client: reqwest::Client,
    table_url: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(api_key)?)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(PostgrestStore {
            client,
            table_url: table_url(base_url, table),
        })
    }

    fn returning(request: RequestBuilder) -> RequestBuilder {
        request.header("Prefer", "return=representation")
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Smoothie>, StoreError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        check_status(status, &body)?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

pub fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), REST_PATH, table)
}

fn default_headers(api_key: &str) -> Result<HeaderMap, ConfigError> {
    let invalid = || ConfigError::Invalid {
        var: "SUPABASE_KEY",
        value: "<redacted>".to_string(),
    };
    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(api_key).map_err(|_| invalid())?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| invalid())?,
    );
    Ok(headers)
}

fn id_filter(id: SmoothieId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

fn transport(e: reqwest::Error) -> StoreError {
    if e.is_decode() {
        StoreError::Decode(e.to_string())
    } else if e.is_timeout() {
        StoreError::Network(format!("request timed out: {}", e))
    } else {
        StoreError::Network(e.to_string())
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), StoreError> {
    if status.is_success() {
        return Ok(());
    }
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message: error_message(body),
    })
}

/// PostgREST reports failures as `{"code", "message", "details", "hint"}`.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    match parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(|m| m.as_str())
    {
        Some(message) => message.to_string(),
        None if body.len() > MAX_ERROR_BODY => {
            let mut end = MAX_ERROR_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated)", &body[..end])
        }
        None => body.to_string(),
    }
}

#[async_trait]
impl SmoothieStore for PostgrestStore {
    async fn list(&self, order: OrderBy) -> Result<Vec<Smoothie>, StoreError> {
        let request = self.client.get(&self.table_url).query(&[
            ("select", "*".to_string()),
            ("order", format!("{}.desc,id.desc", order.column())),
        ]);
        let rows = self.rows(request).await?;
        log::debug!("Listed {} smoothies ordered by {}", rows.len(), order);
        Ok(rows)
    }

    async fn fetch(&self, id: SmoothieId) -> Result<Smoothie, StoreError> {
        let request = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*")])
            .query(&id_filter(id));
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound(id))
    }

    async fn insert(&self, smoothie: &NewSmoothie) -> Result<Smoothie, StoreError> {
        let request = Self::returning(self.client.post(&self.table_url).json(&[smoothie]));
        let row = self.rows(request).await?.into_iter().next().ok_or_else(|| {
            StoreError::Decode("insert returned no representation".to_string())
        })?;
        log::debug!("Inserted smoothie {}", row.id);
        Ok(row)
    }

    async fn update(
        &self,
        id: SmoothieId,
        smoothie: &NewSmoothie,
    ) -> Result<Vec<Smoothie>, StoreError> {
        let request = Self::returning(
            self.client
                .patch(&self.table_url)
                .query(&id_filter(id))
                .json(smoothie),
        );
        let rows = self.rows(request).await?;
        log::debug!("Updated {} rows for smoothie {}", rows.len(), id);
        Ok(rows)
    }

    async fn delete(&self, id: SmoothieId) -> Result<Vec<Smoothie>, StoreError> {
        let request =
            Self::returning(self.client.delete(&self.table_url).query(&id_filter(id)));
        let rows = self.rows(request).await?;
        log::debug!("Deleted {} rows for smoothie {}", rows.len(), id);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_table_url() {
        assert_eq!(
            table_url("https://abc.supabase.co/", "smoothies"),
            "https://abc.supabase.co/rest/v1/smoothies"
        );
    }

    #[test]
    fn key_goes_into_both_headers() {
        let headers = default_headers("anon-key").unwrap();
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers[AUTHORIZATION], "Bearer anon-key");
        assert!(default_headers("bad\nkey").is_err());
    }

    #[test]
    fn rejected_requests_carry_the_service_message() {
        let body = r#"{"code":"22P02","details":null,"hint":null,"message":"invalid input syntax for type bigint: \"ten\""}"#;
        match check_status(StatusCode::BAD_REQUEST, body) {
            Err(StoreError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid input syntax for type bigint: \"ten\"");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(check_status(StatusCode::CREATED, "[]").is_ok());
    }

    #[test]
    fn long_plain_bodies_are_truncated() {
        let body = "é".repeat(400);
        let message = error_message(&body);
        assert!(message.ends_with("... (truncated)"));
        assert!(message.len() < body.len());
        assert_eq!(error_message("Bad gateway"), "Bad gateway");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let store = PostgrestStore::new("http://127.0.0.1:9", "anon-key", "smoothies").unwrap();
        assert!(matches!(
            store.list(OrderBy::Title).await,
            Err(StoreError::Network(_))
        ));
    }
}
