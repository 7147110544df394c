use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::ApiError;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// JSON client bound to the API base url (`.../api`).
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
}

impl RestClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url.trim())
            .map_err(|err| ClientError::Validation(format!("invalid API url '{base_url}': {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::Validation(format!("invalid API path '{path}': {err}")))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.request(Method::GET, path)?;
        let response = self.execute(Method::GET, path, request).await?;
        decode_json(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        let response = self.execute(Method::POST, path, request).await?;
        decode_json(response).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path)?.json(body);
        let response = self.execute(Method::PUT, path, request).await?;
        decode_json(response).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, path)?;
        self.execute(Method::DELETE, path, request).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json"))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<Response> {
        debug!(%method, path, "events API request");
        let response = request.send().await?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "events API response");
        if status.is_success() {
            return Ok(response);
        }
        Err(error_from_response(&method, path, status, response).await)
    }
}

async fn error_from_response(
    method: &Method,
    path: &str,
    status: StatusCode,
    response: Response,
) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiError>(&body)
        .map(|err| err.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let message = if detail.is_empty() {
        format!("{method} {path} failed with status {status}")
    } else {
        format!("{method} {path} failed with status {status}: {detail}")
    };
    ClientError::Transport {
        message,
        status: Some(status.as_u16()),
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !content_type.starts_with("application/json") {
        return Err(ClientError::Transport {
            message: format!(
                "events API answered {} with content type '{content_type}' instead of JSON",
                response.url().path()
            ),
            status: Some(response.status().as_u16()),
        });
    }
    Ok(response.json::<T>().await?)
}
