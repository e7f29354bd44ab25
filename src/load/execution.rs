use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{AppError, AppResult, HttpError};
use crate::metrics::RequestEvent;

use super::signer::{SignedTransaction, TransactionSigner, sign_failure_event};
use super::tasks::RaffleTask;
use super::user::SimulatedUser;

const SUCCESS_STATUS: u16 = 200;

/// Purchase body; field order is part of the wire contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePayload<'payload> {
    pub raffle_id: &'payload str,
    pub user_wallet: &'payload str,
    pub user_id: &'payload str,
    pub ticket_count: u32,
    pub signature: &'payload str,
}

impl<'payload> PurchasePayload<'payload> {
    #[must_use]
    pub fn new(user: &'payload SimulatedUser, signed: &'payload SignedTransaction) -> Self {
        Self {
            raffle_id: &user.raffle_id,
            user_wallet: &signed.public_key,
            user_id: &user.user_id,
            ticket_count: 1,
            signature: &signed.signature,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelPayload<'payload> {
    raffle_id: &'payload str,
}

/// Appends `path` to the host URL the way the raffle API expects.
///
/// # Errors
///
/// Returns an error when the combined URL does not parse.
pub fn endpoint_url(base: &Url, path: &str) -> AppResult<Url> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|err| {
        AppError::http(HttpError::JoinUrlFailed {
            path: path.to_owned(),
            source: err,
        })
    })
}

/// Turns a completed response into a stats event.
#[must_use]
pub fn classify_response(
    task: RaffleTask,
    status: u16,
    body: &[u8],
    response_time: Duration,
) -> RequestEvent {
    if status == SUCCESS_STATUS {
        RequestEvent::Success {
            request_type: task.request_type(),
            name: task.name(),
            response_time,
            response_length: u64::try_from(body.len()).unwrap_or(u64::MAX),
        }
    } else {
        RequestEvent::Failure {
            request_type: task.request_type(),
            name: task.name(),
            response_time,
            message: format!(
                "Status code: {}, Text: {}",
                status,
                String::from_utf8_lossy(body)
            ),
        }
    }
}

fn failure(task: RaffleTask, response_time: Duration, message: String) -> RequestEvent {
    RequestEvent::Failure {
        request_type: task.request_type(),
        name: task.name(),
        response_time,
        message,
    }
}

/// Everything a user needs to issue requests against the raffle API.
pub struct TaskContext<'ctx> {
    pub client: &'ctx Client,
    pub base_url: &'ctx Url,
    pub signer: &'ctx dyn TransactionSigner,
}

/// Runs one task for `user` and returns the single event it produced.
pub async fn execute_task(
    task: RaffleTask,
    context: &TaskContext<'_>,
    user: &SimulatedUser,
) -> RequestEvent {
    match task {
        RaffleTask::PurchaseTicket => purchase_ticket(context, user).await,
        RaffleTask::CheckRaffleStatus => {
            let path = format!("/api/raffle-status/{}", user.raffle_id);
            send(context, user, task, Method::GET, &path, None).await
        }
        RaffleTask::CancelRaffle => {
            let payload = CancelPayload {
                raffle_id: &user.raffle_id,
            };
            match serde_json::to_vec(&payload) {
                Ok(body) => {
                    send(context, user, task, Method::POST, "/api/cancel-raffle", Some(body)).await
                }
                Err(err) => failure(task, Duration::ZERO, err.to_string()),
            }
        }
    }
}

async fn purchase_ticket(context: &TaskContext<'_>, user: &SimulatedUser) -> RequestEvent {
    let task = RaffleTask::PurchaseTicket;
    let signed = match context.signer.sign(&user.user_id).await {
        Ok(signed) => signed,
        Err(err) => {
            debug!("Signing failed for {}: {}", user.user_id, err);
            return sign_failure_event(&err);
        }
    };
    match serde_json::to_vec(&PurchasePayload::new(user, &signed)) {
        Ok(body) => {
            send(context, user, task, Method::POST, "/api/purchase-ticket", Some(body)).await
        }
        Err(err) => failure(task, Duration::ZERO, err.to_string()),
    }
}

async fn send(
    context: &TaskContext<'_>,
    user: &SimulatedUser,
    task: RaffleTask,
    method: Method,
    path: &str,
    body: Option<Vec<u8>>,
) -> RequestEvent {
    let url = match endpoint_url(context.base_url, path) {
        Ok(url) => url,
        Err(err) => return failure(task, Duration::ZERO, err.to_string()),
    };
    let mut request = context
        .client
        .request(method, url)
        .headers(user.headers().clone());
    if let Some(body) = body {
        request = request.body(body);
    }

    let started = Instant::now();
    match request.send().await {
        Ok(response) => {
            // Timed to the response head; the body download is not counted.
            let response_time = started.elapsed();
            let status = response.status().as_u16();
            match response.bytes().await {
                Ok(bytes) => classify_response(task, status, &bytes, response_time),
                Err(err) => failure(task, response_time, err.to_string()),
            }
        }
        Err(err) => failure(task, started.elapsed(), err.to_string()),
    }
}
