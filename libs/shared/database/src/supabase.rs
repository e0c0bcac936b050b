use std::sync::OnceLock;

use regex::Regex;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::{StoreError, StoreResult, UniqueKey};

pub const PREFER_REPRESENTATION: &str = "return=representation";
pub const PREFER_MINIMAL: &str = "return=minimal";

/// Thin PostgREST client authenticated with the service-role key.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.supabase_url, &config.supabase_service_key)
    }

    pub fn with_base_url(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn get_headers(&self) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| StoreError::Backend(format!("Invalid service key header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| StoreError::Backend(format!("Invalid authorization header: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> StoreResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers).query(query);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 409 {
                debug!("Unique violation on {}: {}", path, error_text);
                return Err(StoreError::Duplicate(conflicting_key(&error_text)));
            }

            error!("API error ({}): {}", status, error_text);
            return Err(StoreError::Backend(format!("API error ({}): {}", status, error_text)));
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, query: &[(&str, String)], body: Option<Value>) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, query, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, query, body, headers).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("Invalid response from {}: {}", path, e)))
    }

    /// For writes sent with `Prefer: return=minimal`, whose response has no body.
    pub async fn execute(&self, method: Method, path: &str, query: &[(&str, String)], body: Option<Value>) -> StoreResult<()> {
        self.send(method, path, query, body, Some(prefer(PREFER_MINIMAL))).await?;
        Ok(())
    }

    /// Reads a page together with the exact total row count from `Content-Range`.
    pub async fn request_with_count<T>(&self, path: &str, query: &[(&str, String)]) -> StoreResult<(T, u64)>
    where
        T: DeserializeOwned,
    {
        let response = self
            .send(Method::GET, path, query, None, Some(prefer("count=exact")))
            .await?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_total)
            .unwrap_or(0);

        let data = response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("Invalid response from {}: {}", path, e)))?;

        Ok((data, total))
    }

    /// Calls a Postgres function exposed under `/rest/v1/rpc/`.
    pub async fn rpc<T>(&self, function: &str, args: Value) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, &[], Some(args)).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

pub fn prefer(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static(value));
    headers
}

/// `Content-Range: 0-9/42` → 42. `*/0` for empty result sets.
fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit('/').next()?.parse().ok()
}

fn conflicting_key(error_text: &str) -> UniqueKey {
    static CONSTRAINT: OnceLock<Option<Regex>> = OnceLock::new();

    let pattern = CONSTRAINT.get_or_init(|| Regex::new(r#"constraint \\?"([A-Za-z0-9_]+)\\?""#).ok());

    pattern
        .as_ref()
        .and_then(|re| re.captures(error_text))
        .and_then(|caps| caps.get(1))
        .map(|m| UniqueKey::from_constraint(m.as_str()))
        .unwrap_or_else(|| UniqueKey::Other(error_text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_total_from_content_range() {
        assert_eq!(parse_total("0-9/42"), Some(42));
        assert_eq!(parse_total("*/0"), Some(0));
        assert_eq!(parse_total("garbage"), None);
    }

    #[test]
    fn extracts_constraint_name_from_postgrest_body() {
        let body = r#"{"code":"23505","details":"Key (email)=(a@b.c) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"users_email_key\""}"#;
        assert_eq!(conflicting_key(body), UniqueKey::Email);
    }
}
