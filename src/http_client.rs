use crate::storage::{AUTH_TOKEN_KEY, LocalStorage};
use anyhow::{Context, Result, ensure};
use log::warn;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

/// HTTP client that authorizes every request it sends
///
/// The bearer token is read from local storage at send time, so a token
/// provisioned or rotated while the service runs is picked up by the next
/// request. Without a token the request is sent unauthenticated.
#[derive(Clone, Debug)]
pub struct AuthorizedClient<S>
where
    S: LocalStorage,
{
    client: Client,
    storage: S,
}

impl<S> AuthorizedClient<S>
where
    S: LocalStorage,
{
    pub fn new(client: Client, storage: S) -> Self {
        Self { client, storage }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Attach the current token (if any) and send the request
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        authorize(request, self.token().as_deref())
            .send()
            .await
            .context("failed to send request")
    }

    fn token(&self) -> Option<String> {
        match self.storage.get_item(AUTH_TOKEN_KEY) {
            Ok(token) => token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("failed to read auth token, sending unauthenticated: {e:#}");
                None
            }
        }
    }
}

/// Add an `Authorization: Bearer` header if a token is given
pub fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Handle HTTP response by checking status and extracting body
///
/// # Arguments
/// * `res` - The HTTP response to handle
/// * `context_msg` - Context message describing the request (e.g., "GET /network/status")
///
/// # Returns
/// * `Ok(String)` - The response body if the status is successful
/// * `Err` - If the status is not successful or reading the body fails
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String> {
    let status = res.status();
    let body = res.text().await.context("failed to read response body")?;

    ensure!(
        status.is_success(),
        "{context_msg} failed with status {status} and body: {body}"
    );

    Ok(body)
}

/// Parse a JSON response body, an empty body is `null`
pub fn parse_json_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(body).context("failed to parse response body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    fn header(request: RequestBuilder) -> Option<String> {
        request
            .build()
            .unwrap()
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn authorize_adds_bearer_header() {
        let request = Client::new().get("http://localhost/api");
        assert_eq!(
            header(authorize(request, Some("abc"))).as_deref(),
            Some("Bearer abc")
        );
    }

    #[test]
    fn authorize_without_token_leaves_request_untouched() {
        let request = Client::new().get("http://localhost/api");
        assert_eq!(header(authorize(request, None)), None);
    }

    #[test]
    fn token_is_read_from_storage() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        let client = AuthorizedClient::new(Client::new(), storage.clone());

        assert_eq!(client.token(), None);

        storage.set_item(AUTH_TOKEN_KEY, "secret").unwrap();
        assert_eq!(client.token().as_deref(), Some("secret"));

        storage.set_item(AUTH_TOKEN_KEY, "secret\n").unwrap();
        assert_eq!(client.token().as_deref(), Some("secret"));

        storage.set_item(AUTH_TOKEN_KEY, "").unwrap();
        assert_eq!(client.token(), None);
    }

    #[test]
    fn parse_json_body_handles_empty_body() {
        assert_eq!(parse_json_body("").unwrap(), Value::Null);
        assert_eq!(parse_json_body("  \n").unwrap(), Value::Null);
        assert_eq!(
            parse_json_body(r#"{"online":true}"#).unwrap()["online"],
            Value::Bool(true)
        );
        assert!(parse_json_body("not json").is_err());
    }
}
