//! HTTP client of the statistics server.
//!
//! Every JSON payload is validated right after decoding; a payload that
//! breaks an invariant surfaces as [`DashboardError::InvalidPayload`].

use crate::config::ClientConfig;
use crate::error::{DashboardError, Result};
use crate::model::{
    ComparisonReport, ComparisonWithCi, CorrelationHighlights, CorrelationMatrix, CorrelationMethod,
    DemographicsReport, ErrorBody, GroupSummary, HealthStatus, HomepageContent, HomepageUpdate, ImportSummary,
    LikertQuestion, LoginResponse, Overview, QuestionCatalog, QuestionStatsResponse, RespondentDetail,
    RespondentList, RespondentType, TeacherCategory, TeacherFilter, ToolsSummary, UsageAnalysis,
    Validate,
};
use log::debug;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

/// The four dashboard payloads plus the health and import calls the loader
/// depends on
///
/// Implemented by [`ApiClient`]; tests provide scripted implementations.
pub trait DashboardApi: Send + Sync {
    fn health(&self) -> impl Future<Output = Result<HealthStatus>> + Send;
    fn import(&self) -> impl Future<Output = Result<ImportSummary>> + Send;
    fn students(&self) -> impl Future<Output = Result<GroupSummary>> + Send;
    fn teachers(&self, filter: TeacherFilter) -> impl Future<Output = Result<GroupSummary>> + Send;
    fn comparison(&self, filter: TeacherFilter) -> impl Future<Output = Result<ComparisonReport>> + Send;
    fn tools(&self) -> impl Future<Output = Result<ToolsSummary>> + Send;
}

/// reqwest-backed client of the server API
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct PasswordBody<'a> {
    password: &'a str,
}

#[derive(Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

impl ApiClient {
    /// Build a client from its configuration
    ///
    /// # Arguments
    /// * `config` - Base URL and per-request timeout
    ///
    /// # Returns
    /// * `Result<ApiClient>` - Fails only if the TLS backend cannot be initialised
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(ApiClient {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.http.request(method, url)
    }

    /// Turn a non-success response into [`DashboardError::Status`], using the
    /// server's `detail` message when there is one
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.detail)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("errore").to_string());
        Err(DashboardError::Status {
            code: status.as_u16(),
            detail,
        })
    }

    async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let response = Self::check(builder.send().await?).await?;
        let payload: T = response.json().await?;
        payload.validate()?;
        Ok(payload)
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        self.send_json(self.request(Method::GET, path).query(query)).await
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let response = Self::check(self.request(Method::GET, path).query(query).send().await?).await?;
        Ok(response.text().await?)
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let response = Self::check(self.request(Method::GET, path).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn overview(&self) -> Result<Overview> {
        self.get_json("/api/overview", &[]).await
    }

    pub async fn questions(&self) -> Result<QuestionCatalog> {
        self.get_json("/api/questions", &[]).await
    }

    pub async fn demographics(&self) -> Result<DemographicsReport> {
        self.get_json("/api/demographics", &[]).await
    }

    pub async fn usage_analysis(&self) -> Result<UsageAnalysis> {
        self.get_json("/api/usage-analysis", &[]).await
    }

    pub async fn correlations(&self) -> Result<CorrelationHighlights> {
        self.get_json("/api/correlations", &[]).await
    }

    pub async fn likert_questions(&self) -> Result<Vec<LikertQuestion>> {
        self.get_json("/api/likert-questions", &[]).await
    }

    pub async fn comparison_with_ci(&self, filter: TeacherFilter) -> Result<ComparisonWithCi> {
        self.get_json("/api/statistics/comparison-with-ci", &filter.query_pairs())
            .await
    }

    pub async fn correlation_matrix(
        &self,
        respondent_type: RespondentType,
        method: CorrelationMethod,
        filter: TeacherFilter,
    ) -> Result<CorrelationMatrix> {
        let mut query = filter.query_pairs();
        query.push(("method", method.as_str().to_string()));
        let path = format!("/api/statistics/correlation-matrix/{}", respondent_type);
        self.get_json(&path, &query).await
    }

    /// Statistics of one question; `teacher_type` narrows teacher questions to
    /// active or in-training respondents
    pub async fn question_stats(
        &self,
        respondent_type: RespondentType,
        column_index: u32,
        teacher_type: Option<TeacherCategory>,
    ) -> Result<QuestionStatsResponse> {
        let query: Vec<(&str, String)> = match teacher_type {
            Some(TeacherCategory::Active) => vec![("teacher_type", "active".to_string())],
            Some(TeacherCategory::Training) => vec![("teacher_type", "training".to_string())],
            _ => Vec::new(),
        };
        let path = format!("/api/questions/{}/{}/stats", respondent_type, column_index);
        self.get_json(&path, &query).await
    }

    pub async fn respondents(&self, respondent_type: Option<&str>) -> Result<RespondentList> {
        let query: Vec<(&str, String)> = respondent_type
            .map(|rt| vec![("respondent_type", rt.to_string())])
            .unwrap_or_default();
        self.get_json("/api/respondents/list", &query).await
    }

    pub async fn respondent(&self, code: &str) -> Result<RespondentDetail> {
        self.get_json(&format!("/api/respondent/{}", code), &[]).await
    }

    pub async fn homepage(&self) -> Result<HomepageContent> {
        self.get_json("/api/homepage", &[]).await
    }

    /// Replace the homepage; needs a token from [`ApiClient::login`]
    pub async fn update_homepage(&self, token: &str, content: &str) -> Result<HomepageUpdate> {
        let builder = self
            .request(Method::POST, "/api/homepage")
            .bearer_auth(token)
            .json(&ContentBody { content });
        self.send_json(builder).await
    }

    pub async fn login(&self, password: &str) -> Result<LoginResponse> {
        let builder = self
            .request(Method::POST, "/api/login")
            .json(&PasswordBody { password });
        self.send_json(builder).await
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        let builder = self.request(Method::POST, "/api/logout").bearer_auth(token);
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    pub async fn comparison_chart(&self, filter: TeacherFilter) -> Result<String> {
        self.get_text("/charts/comparison.svg", &filter.query_pairs()).await
    }

    pub async fn correlation_chart(
        &self,
        respondent_type: RespondentType,
        min_correlation: f64,
        significant_only: bool,
        grouped: bool,
    ) -> Result<String> {
        let query = vec![
            ("min_correlation", min_correlation.to_string()),
            ("significant_only", significant_only.to_string()),
            ("grouped", grouped.to_string()),
        ];
        self.get_text(&format!("/charts/correlation/{}.svg", respondent_type), &query)
            .await
    }

    pub async fn export_comparison_csv(&self) -> Result<String> {
        self.get_text("/api/export/comparison.csv", &[]).await
    }

    pub async fn export_correlation_xlsx(&self, respondent_type: RespondentType) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/api/export/correlation/{}.xlsx", respondent_type))
            .await
    }
}

impl DashboardApi for ApiClient {
    async fn health(&self) -> Result<HealthStatus> {
        self.get_json("/health", &[]).await
    }

    async fn import(&self) -> Result<ImportSummary> {
        self.send_json(self.request(Method::POST, "/api/import")).await
    }

    async fn students(&self) -> Result<GroupSummary> {
        self.get_json("/api/students", &[]).await
    }

    async fn teachers(&self, filter: TeacherFilter) -> Result<GroupSummary> {
        self.get_json("/api/teachers", &filter.query_pairs()).await
    }

    async fn comparison(&self, filter: TeacherFilter) -> Result<ComparisonReport> {
        self.get_json("/api/comparison", &filter.query_pairs()).await
    }

    async fn tools(&self) -> Result<ToolsSummary> {
        self.get_json("/api/tools", &[]).await
    }
}
