use std::time::Duration;

use composer_logging::composer_debug;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{SubmitError, SubmitFailureKind};

const CREATE_POST_PATH: &str = "/api/post/create";
const CREATE_COMMENT_PATH: &str = "/api/comment/create";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Raw `Cookie` header value carrying the session, e.g. `access_token=...`.
    pub session_cookie: Option<String>,
    pub connect_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            session_cookie: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPostResponse {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: String,
    pub content: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedCommentResponse {
    #[serde(alias = "_id")]
    pub id: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[async_trait::async_trait]
pub trait PostApi: Send + Sync {
    async fn create_post(
        &self,
        request: &CreatePostRequest,
    ) -> Result<CreatedPostResponse, SubmitError>;

    async fn create_comment(
        &self,
        request: &CreateCommentRequest,
    ) -> Result<CreatedCommentResponse, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestPostApi {
    settings: ApiSettings,
}

impl ReqwestPostApi {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }

    fn endpoint(&self, path: &str) -> Result<Url, SubmitError> {
        Url::parse(&self.settings.base_url)
            .and_then(|base| base.join(path))
            .map_err(|err| SubmitError::new(SubmitFailureKind::InvalidEndpoint, err.to_string()))
    }

    fn build_client(&self) -> Result<reqwest::Client, SubmitError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| SubmitError::new(SubmitFailureKind::Network, err.to_string()))
    }

    /// POSTs `request` as JSON with the session cookie. Only 201 counts as
    /// success; anything else carries the server's message.
    async fn post_json<T, R>(&self, path: &str, request: &T) -> Result<R, SubmitError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let endpoint = self.endpoint(path)?;
        let client = self.build_client()?;
        let body = serde_json::to_vec(request)
            .map_err(|err| SubmitError::new(SubmitFailureKind::InvalidResponse, err.to_string()))?;

        let mut builder = client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(cookie) = &self.settings.session_cookie {
            builder = builder.header(COOKIE, cookie.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| SubmitError::new(SubmitFailureKind::Network, err.to_string()))?;
        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|err| SubmitError::new(SubmitFailureKind::Network, err.to_string()))?;

        if status == StatusCode::CREATED {
            return serde_json::from_slice(&raw).map_err(|err| {
                SubmitError::new(SubmitFailureKind::InvalidResponse, err.to_string())
            });
        }

        Err(SubmitError::new(
            SubmitFailureKind::Rejected(status.as_u16()),
            server_message(status, &raw),
        ))
    }
}

#[async_trait::async_trait]
impl PostApi for ReqwestPostApi {
    async fn create_post(
        &self,
        request: &CreatePostRequest,
    ) -> Result<CreatedPostResponse, SubmitError> {
        composer_debug!("Submitting post title_len={}", request.title.chars().count());
        self.post_json(CREATE_POST_PATH, request).await
    }

    async fn create_comment(
        &self,
        request: &CreateCommentRequest,
    ) -> Result<CreatedCommentResponse, SubmitError> {
        composer_debug!(
            "Submitting comment post_id={} len={}",
            request.post_id,
            request.content.chars().count()
        );
        self.post_json(CREATE_COMMENT_PATH, request).await
    }
}

/// The server's `message` field verbatim, or the status line when the body
/// carries none.
fn server_message(status: StatusCode, raw: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(raw)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_optional_fields() {
        let request = CreatePostRequest {
            title: "Title".to_string(),
            content: "Body".to_string(),
            category: None,
            image: None,
        };

        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"title":"Title","content":"Body"}"#
        );
    }

    #[test]
    fn comment_request_uses_camel_case_keys() {
        let request = CreateCommentRequest {
            post_id: "p1".to_string(),
            content: "Nice".to_string(),
            user_id: "u1".to_string(),
        };

        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"postId":"p1","content":"Nice","userId":"u1"}"#
        );
    }

    #[test]
    fn server_message_falls_back_to_status() {
        assert_eq!(
            server_message(StatusCode::BAD_REQUEST, br#"{"message":"Duplicated title"}"#),
            "Duplicated title"
        );
        assert_eq!(
            server_message(StatusCode::BAD_GATEWAY, b"<html>oops</html>"),
            "502 Bad Gateway"
        );
    }
}
