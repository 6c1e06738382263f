//! `reqwest`-backed implementation of the API traits.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::types::{
    CreateUserResponse, MessageRequest, MessageResponse, ReportKind, ReportLink, ReportStatus, StartSessionResponse,
    SurveyAnswer, SurveyQuestion, UserProfile,
};
use super::{AssessmentApi, SurveyApi};
use crate::config::{ClientConfig, Timeouts};
use crate::error::ApiError;

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client for an already-normalized base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to
    /// initialize.
    pub fn new(base_url: impl Into<String>, timeouts: Timeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    /// Build a client from parsed config.
    ///
    /// # Errors
    ///
    /// Same as [`HttpApi::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        debug!(method = "GET", path, "api request");
        let request = self.http.get(self.url(path)).query(query);
        let response = self.send(request, path).await?;
        decode(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(method = "POST", path, "api request");
        let request = self.http.post(self.url(path));
        let request = if let Some(body) = body { request.json(body) } else { request };
        let response = self.send(request, path).await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait::async_trait]
impl AssessmentApi for HttpApi {
    async fn start_session(&self) -> Result<StartSessionResponse, ApiError> {
        self.post_json::<_, Value>("start_session", None).await
    }

    async fn send_message(&self, session_id: &str, message: &str) -> Result<MessageResponse, ApiError> {
        self.post_json("message", Some(&MessageRequest { session_id, message }))
            .await
    }

    async fn get_report(&self, session_id: &str) -> Result<ReportStatus, ApiError> {
        let value: Value = self
            .get_json("get_report", &[("session_id", session_id)])
            .await?;
        ReportStatus::from_value(value)
    }

    async fn download_report(&self, session_id: &str, kind: ReportKind) -> Result<Vec<u8>, ApiError> {
        let path = "download_report";
        debug!(method = "GET", path, %kind, "api request");
        let request = self
            .http
            .get(self.url(path))
            .query(&[("session_id", session_id), ("type", kind.as_str())]);
        let response = self.send(request, path).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl SurveyApi for HttpApi {
    async fn create_user(&self, profile: &UserProfile) -> Result<CreateUserResponse, ApiError> {
        self.post_json("user", Some(profile)).await
    }

    async fn survey_question(&self) -> Result<Option<String>, ApiError> {
        let body: SurveyQuestion = self.get_json("survey/question", &[]).await?;
        Ok(body.question.filter(|q| !q.trim().is_empty()))
    }

    async fn submit_survey_answer(&self, user_id: &str, question: &str, answer: &str) -> Result<(), ApiError> {
        let path = "survey";
        debug!(method = "POST", path, "api request");
        let request = self
            .http
            .post(self.url(path))
            .json(&SurveyAnswer { user_id, question, answer });
        self.send(request, path).await?;
        Ok(())
    }

    async fn report_link(&self, kind: ReportKind, user_id: &str) -> Result<String, ApiError> {
        let path = format!("report/{kind}");
        let link: ReportLink = self.get_json(&path, &[("user_id", user_id)]).await?;
        Ok(link.report_url)
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
