//! HTTP client abstraction for making requests to the storefront API

use crate::error::Error;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Append query parameters, keeping their order
    pub fn query<K: Into<String>, V: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.query_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Build the request
    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let req = self
            .client
            .request(self.method.clone(), url.as_str())
            .headers(self.headers.clone());

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let req = self.build()?;
        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(Error::account(error_message(status, &text)));
        }

        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request, tolerating empty or non-JSON success bodies
    pub async fn execute_lenient(&self) -> Result<Value, Error> {
        let req = self.build()?;
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::account(error_message(status, &text)));
        }

        Ok(serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Default::default())))
    }
}

/// `message` or `detail` from a JSON error body, else the raw text
fn error_message(status: reqwest::StatusCode, text: &str) -> String {
    if let Ok(data) = serde_json::from_str::<Value>(text) {
        let field = data
            .get("message")
            .or_else(|| data.get("detail"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        if let Some(message) = field {
            return message.to_string();
        }
    }

    if text.trim().is_empty() {
        format!("Request failed with status {}", status)
    } else {
        text.to_string()
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a PATCH request
    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(error_message(status, r#"{"message":"Bad date"}"#), "Bad date");
        assert_eq!(error_message(status, r#"{"detail":"Not allowed"}"#), "Not allowed");
        assert_eq!(error_message(status, "plain"), "plain");
        assert_eq!(
            error_message(status, ""),
            "Request failed with status 400 Bad Request"
        );
    }
}
