//! Management API client for branch comparison and merge endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use tracing::{debug, info, instrument};

use crate::api::types::{ComparePage, FieldDiffResponse, MergeQueueResponse, MergeResponse};
use crate::api::{BranchApi, MergeApi};
use crate::errors::ApiError;
use crate::merge::MergeRequestPayload;
use crate::models::DiffModule;

/// Asynchronous management API client bound to one stack.
#[derive(Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    api_url: String,
}

impl CmsClient {
    /// Build a client for the stack identified by `api_key`.
    pub fn new(
        api_url: impl Into<String>,
        api_key: &str,
        management_token: &str,
    ) -> Result<Self, ApiError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("branchmerge/0.1"));
        headers.insert(
            "api_key",
            HeaderValue::from_str(api_key)
                .map_err(|_| ApiError::AuthenticationFailed("API key is not a valid header value".into()))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(management_token).map_err(|_| {
                ApiError::AuthenticationFailed("management token is not a valid header value".into())
            })?,
        );
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        info!(api_url = %api_url, "created CmsClient");
        Ok(Self { http, api_url })
    }

    fn compare_url(&self, module: DiffModule) -> String {
        match module.path_segment() {
            Some(segment) => format!("{}/v3/stacks/branches_compare/{}", self.api_url, segment),
            None => format!("{}/v3/stacks/branches_compare", self.api_url),
        }
    }

    fn check_response(&self, resp: &reqwest::Response) -> Result<(), ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ApiError::AuthenticationFailed(format!("HTTP {}", status)));
        }
        if status.as_u16() == 429 {
            return Err(ApiError::RateLimited);
        }
        Err(ApiError::ApiError {
            status: status.as_u16(),
            body: format!("HTTP {}", status),
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        self.check_response(&resp)?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl BranchApi for CmsClient {
    #[instrument(skip(self))]
    async fn compare_branches(
        &self,
        base_branch: &str,
        compare_branch: &str,
        module: DiffModule,
        skip: u32,
        limit: u32,
    ) -> Result<ComparePage, ApiError> {
        let resp = self
            .http
            .get(self.compare_url(module))
            .query(&[("base_branch", base_branch), ("compare_branch", compare_branch)])
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await?;
        let page: ComparePage = self.read_json(resp).await?;
        debug!(count = page.diff.len(), more = page.next_url.is_some(), "fetched compare page");
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn fetch_field_diff(
        &self,
        base_branch: &str,
        compare_branch: &str,
        module: DiffModule,
        uid: &str,
    ) -> Result<FieldDiffResponse, ApiError> {
        let url = format!("{}/{}", self.compare_url(module), uid);
        let resp = self
            .http
            .get(&url)
            .query(&[("base_branch", base_branch), ("compare_branch", compare_branch)])
            .send()
            .await?;
        let diff: FieldDiffResponse = self.read_json(resp).await?;
        debug!(uid, status = %diff.diff.status, "fetched field diff");
        Ok(diff)
    }
}

#[async_trait]
impl MergeApi for CmsClient {
    #[instrument(skip(self, payload), fields(base = %payload.base_branch, compare = %payload.compare_branch))]
    async fn submit_merge(&self, payload: &MergeRequestPayload) -> Result<MergeResponse, ApiError> {
        let url = format!("{}/v3/stacks/branches_merge", self.api_url);
        let resp = self.http.post(&url).json(payload).send().await?;
        let merge: MergeResponse = self.read_json(resp).await?;
        info!(uid = %merge.uid, status = %merge.merge_details.status, "submitted merge");
        Ok(merge)
    }

    #[instrument(skip(self))]
    async fn poll_merge_queue(&self, job_uid: &str) -> Result<MergeQueueResponse, ApiError> {
        let url = format!("{}/v3/stacks/branches_queue/{}", self.api_url, job_uid);
        let resp = self.http.get(&url).send().await?;
        let queue: MergeQueueResponse = self.read_json(resp).await?;
        debug!(entries = queue.queue.len(), "fetched merge queue");
        Ok(queue)
    }
}
