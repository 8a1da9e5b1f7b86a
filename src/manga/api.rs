use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use crate::{
    configuration,
    http::{
        HttpError, RetryPolicy,
        error::{FALLBACK_MESSAGE, extract_message},
    },
};

use super::ChapterOrder;

/// Every chapter of a comic is requested in one page.
pub const CHAPTER_REQUEST_LIMIT: u32 = 9999;

/// Read-only client for the public manga metadata API.
#[derive(Clone)]
pub struct MangaApi {
    http: reqwest::Client,
    base_url: String,
    image_origin: String,
    retry: RetryPolicy,
}

impl MangaApi {
    pub fn new(config: &configuration::MangaApi) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_origin: config.image_origin.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from(&config.retry),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cover_url(&self, b2key: &str) -> String {
        format!("{}/{}", self.image_origin, b2key)
    }

    pub async fn hot_chapters(&self, page: u32, limit: usize) -> Result<Value, HttpError> {
        self.get(
            "/chapter/",
            &[
                ("page", page.to_string()),
                ("order", "hot".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn new_chapters(&self, page: u32, limit: usize) -> Result<Value, HttpError> {
        self.get(
            "/chapter/",
            &[
                ("page", page.to_string()),
                ("order", "new".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn trending(&self) -> Result<Value, HttpError> {
        self.get(
            "/top",
            &[
                ("day", "180".to_string()),
                ("type", "trending".to_string()),
                ("accept_mature_content", "false".to_string()),
            ],
        )
        .await
    }

    pub async fn comic(&self, slug: &str) -> Result<Value, HttpError> {
        self.get(&format!("/comic/{slug}"), &[]).await
    }

    pub async fn chapters(&self, hid: &str, order: ChapterOrder) -> Result<Value, HttpError> {
        self.get(
            &format!("/comic/{hid}/chapters"),
            &[
                ("limit", CHAPTER_REQUEST_LIMIT.to_string()),
                ("page", "1".to_string()),
                ("chap-order", order.as_param().to_string()),
                ("lang", "en".to_string()),
            ],
        )
        .await
    }

    pub async fn search(&self, query: &str, page: u32, limit: usize) -> Result<Value, HttpError> {
        self.get(
            "/v1.0/search/",
            &[
                ("q", query.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn chapter_images(&self, hid: &str) -> Result<Value, HttpError> {
        self.get(&format!("/chapter/{hid}/get_images"), &[]).await
    }

    pub async fn chapter(&self, hid: &str) -> Result<Value, HttpError> {
        self.get(&format!("/chapter/{hid}"), &[]).await
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, HttpError> {
        self.retry.run(|| self.get_once(path, query)).await
    }

    #[tracing::instrument(
        name = "metadata request",
        skip(self, query),
        fields(status = tracing::field::Empty)
    )]
    async fn get_once(&self, path: &str, query: &[(&str, String)]) -> Result<Value, HttpError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|error| HttpError::NetworkUnreachable(error.to_string()))?;

        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());

        if status.is_success() {
            return response.json().await.map_err(|error| HttpError::MalformedResponse {
                status: Some(status),
                message: error.to_string(),
            });
        }

        let body: Value = response.json().await.unwrap_or_default();

        Err(HttpError::ServerRejected {
            status,
            message: rejection_message(status, &body),
        })
    }
}

fn rejection_message(status: StatusCode, body: &Value) -> String {
    let message = extract_message(body);
    if message == FALLBACK_MESSAGE {
        format!("API responded with status: {}", status.as_u16())
    } else {
        message
    }
}
