use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use http::HeaderMap;
use reqwest::Url;

use crate::error::{AppError, AppResult, HttpError, MetricsError};

const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Static credentials used to sign CloudWatch calls.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AwsCredentials {
    /// Reads credentials from the standard `AWS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when the access key or secret key is missing.
    pub fn from_env() -> AppResult<Self> {
        let access_key_id = non_empty_env(ACCESS_KEY_ENV).ok_or_else(|| {
            AppError::metrics(MetricsError::MissingCredentials {
                variable: ACCESS_KEY_ENV,
            })
        })?;
        let secret_access_key = non_empty_env(SECRET_KEY_ENV).ok_or_else(|| {
            AppError::metrics(MetricsError::MissingCredentials {
                variable: SECRET_KEY_ENV,
            })
        })?;
        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: non_empty_env(SESSION_TOKEN_ENV),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub(super) struct SigningScope<'scope> {
    pub(super) region: &'scope str,
    pub(super) service: &'scope str,
    pub(super) time: SystemTime,
}

/// Returns the SigV4 headers (`authorization`, `x-amz-date`, ...) for a POST.
pub(super) fn sigv4_headers(
    url: &Url,
    headers: &[(&str, &str)],
    body: &[u8],
    credentials: &AwsCredentials,
    scope: &SigningScope<'_>,
) -> AppResult<HeaderMap> {
    let identity: Identity = Credentials::new(
        &credentials.access_key_id,
        &credentials.secret_access_key,
        credentials.session_token.clone(),
        None,
        "raffle-ops",
    )
    .into();
    let signing_settings = SigningSettings::default();
    let signing_params = v4::SigningParams::builder()
        .identity(&identity)
        .region(scope.region)
        .name(scope.service)
        .time(scope.time)
        .settings(signing_settings)
        .build()
        .map_err(|err| {
            AppError::http(HttpError::SigV4Params {
                source: Box::new(err),
            })
        })?
        .into();

    let signable = SignableRequest::new(
        "POST",
        url.as_str(),
        headers.iter().copied(),
        SignableBody::Bytes(body),
    )
    .map_err(|err| {
        AppError::http(HttpError::SigV4Request {
            source: Box::new(err),
        })
    })?;

    let (instructions, _signature) = sign(signable, &signing_params)
        .map_err(|err| {
            AppError::http(HttpError::SigV4Sign {
                source: Box::new(err),
            })
        })?
        .into_parts();

    let mut http_req = http::Request::builder().method("POST").uri(url.as_str());
    for (key, value) in headers {
        http_req = http_req.header(*key, *value);
    }
    let mut http_req = http_req.body(()).map_err(|err| {
        AppError::http(HttpError::SigV4BuildSign {
            source: Box::new(err),
        })
    })?;
    instructions.apply_to_request_http1x(&mut http_req);

    Ok(http_req.headers().clone())
}
