use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::{AppError, AppResult, HttpError};

const USER_ID_PREFIX: &str = "testuser";
const USER_ID_RANGE: std::ops::RangeInclusive<u16> = 1000..=9999;
const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-session identity of one simulated user.
#[derive(Debug, Clone)]
pub struct SimulatedUser {
    pub user_id: String,
    pub raffle_id: String,
    headers: HeaderMap,
}

impl SimulatedUser {
    /// Picks a random user id and builds the static header set.
    ///
    /// # Errors
    ///
    /// Returns an error when the bearer token is not a valid header value.
    pub fn start<R: Rng + ?Sized>(rng: &mut R, raffle_id: &str, token: &str) -> AppResult<Self> {
        let user_id = format!("{}{}", USER_ID_PREFIX, rng.gen_range(USER_ID_RANGE));
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderValue {
                header: "authorization",
                source: err,
            })
        })?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(Self {
            user_id,
            raffle_id: raffle_id.to_owned(),
            headers,
        })
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
