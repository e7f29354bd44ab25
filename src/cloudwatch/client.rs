use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use tracing::debug;

use crate::args::{DEFAULT_USER_AGENT, DashboardArgs};
use crate::error::{AppError, AppResult, HttpError, MetricsError};

use super::MetricSource;
use super::query::{MetricQuery, MetricWindow, ServiceErrorBody, decode_response, merge_page};
use super::series::MetricSeries;
use super::signing::{AwsCredentials, SigningScope, sigv4_headers};

const SERVICE_NAME: &str = "monitoring";
const AMZ_TARGET: &str = "GraniteServiceVersion20100801.GetMetricData";
const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
/// Upper bound on `NextToken` pages followed for one fetch.
const MAX_PAGES: usize = 100;

#[derive(Debug, Clone)]
pub struct CloudWatchSettings {
    pub region: String,
    pub endpoint: Option<String>,
    pub request_timeout: Duration,
    pub query: MetricQuery,
}

impl CloudWatchSettings {
    #[must_use]
    pub fn from_args(args: &DashboardArgs) -> Self {
        Self {
            region: args.region.clone(),
            endpoint: args.cloudwatch_endpoint.clone(),
            request_timeout: args.request_timeout,
            query: MetricQuery::from_args(args),
        }
    }
}

/// Minimal CloudWatch client speaking the AWS JSON 1.0 protocol.
#[derive(Debug, Clone)]
pub struct CloudWatchClient {
    http: Client,
    endpoint: Url,
    region: String,
    credentials: AwsCredentials,
    query: MetricQuery,
}

impl CloudWatchClient {
    /// Builds a client for the configured region or endpoint override.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(settings: CloudWatchSettings, credentials: AwsCredentials) -> AppResult<Self> {
        let endpoint_str = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://monitoring.{}.amazonaws.com/", settings.region));
        let endpoint = Url::parse(&endpoint_str).map_err(|err| {
            AppError::http(HttpError::InvalidUrl {
                url: endpoint_str.clone(),
                source: err,
            })
        })?;
        let http = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
        Ok(Self {
            http,
            endpoint,
            region: settings.region,
            credentials,
            query: settings.query,
        })
    }

    #[must_use]
    pub const fn query(&self) -> &MetricQuery {
        &self.query
    }

    /// Fetches every page of `query` over `window`, ordered by timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, a malformed
    /// body, or when the response carries no result for the query.
    pub async fn get_metric_data(
        &self,
        query: &MetricQuery,
        window: &MetricWindow,
    ) -> AppResult<MetricSeries> {
        let mut series = MetricSeries::default();
        let mut found = false;
        let mut next_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let body = serde_json::to_vec(&query.request_body(window, next_token.as_deref()))
                .map_err(|err| AppError::http(HttpError::SerializeBody { source: err }))?;
            let page = decode_response(&self.post(&body).await?)?;
            next_token = page.next_token.clone().filter(|token| !token.is_empty());
            found |= merge_page(&mut series, page, &query.id)?;
            if next_token.is_none() {
                break;
            }
            debug!("GetMetricData returned a NextToken; fetching next page");
        }

        if !found {
            return Err(AppError::metrics(MetricsError::NoResults {
                id: query.id.clone(),
            }));
        }
        series.sort_ascending();
        Ok(series)
    }

    async fn post(&self, body: &[u8]) -> AppResult<Vec<u8>> {
        let headers = [
            ("content-type", AMZ_JSON_CONTENT_TYPE),
            ("x-amz-target", AMZ_TARGET),
        ];
        let host = host_header(&self.endpoint);
        let mut signed_headers: Vec<(&str, &str)> = headers.to_vec();
        signed_headers.push(("host", host.as_str()));
        let scope = SigningScope {
            region: &self.region,
            service: SERVICE_NAME,
            time: SystemTime::now(),
        };
        let header_map = sigv4_headers(
            &self.endpoint,
            &signed_headers,
            body,
            &self.credentials,
            &scope,
        )?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(header_map)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|err| AppError::metrics(MetricsError::Transport { source: err }))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AppError::metrics(MetricsError::Transport { source: err }))?;

        if !status.is_success() {
            let error_body: ServiceErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            return Err(AppError::metrics(MetricsError::Service {
                status: status.as_u16(),
                kind: error_body.short_kind(),
                message: error_body
                    .message
                    .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned()),
            }));
        }
        Ok(bytes.to_vec())
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    url.port()
        .map_or_else(|| host.to_owned(), |port| format!("{}:{}", host, port))
}

#[async_trait]
impl MetricSource for CloudWatchClient {
    async fn fetch(&self, now: DateTime<Utc>) -> AppResult<MetricSeries> {
        let window = self.query.window_at(now);
        debug!(
            "Fetching {}/{} from {} to {}",
            self.query.namespace, self.query.metric_name, window.start, window.end
        );
        self.get_metric_data(&self.query, &window).await
    }

    fn describe(&self) -> String {
        format!(
            "cloudwatch {} {}/{} ({} {}s)",
            self.endpoint, self.query.namespace, self.query.metric_name, self.query.stat,
            self.query.period_secs
        )
    }
}
