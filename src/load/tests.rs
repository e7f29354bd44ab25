use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::{Client, Url};

use super::*;
use crate::args::{Cli, Command};
use crate::error::SignError;
use crate::metrics::RequestEvent;
use crate::shutdown::shutdown_channel;

#[derive(Default)]
struct StubApi {
    status: AtomicU16,
    hits: AtomicUsize,
    bodies: Mutex<Vec<String>>,
    authorization: Mutex<Option<String>>,
}

async fn record_hit(
    State(api): State<Arc<StubApi>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    api.hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut bodies) = api.bodies.lock() {
        bodies.push(body);
    }
    if let Ok(mut authorization) = api.authorization.lock() {
        *authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
    }
    let status = StatusCode::from_u16(api.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let text = if status == StatusCode::OK {
        "{\"ok\":true}".to_owned()
    } else {
        "boom".to_owned()
    };
    (status, text)
}

async fn spawn_stub_api(status: u16) -> Result<(Url, Arc<StubApi>), String> {
    let api = Arc::new(StubApi::default());
    api.status.store(status, Ordering::SeqCst);
    let app = Router::new()
        .route("/api/purchase-ticket", post(record_hit))
        .route("/api/raffle-status/{raffle_id}", get(record_hit))
        .route("/api/cancel-raffle", post(record_hit))
        .with_state(Arc::clone(&api));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("local_addr failed: {}", err))?;
    tokio::spawn(async move {
        drop(axum::serve(listener, app).await);
    });
    let url = Url::parse(&format!("http://{}", addr)).map_err(|err| err.to_string())?;
    Ok((url, api))
}

struct FixedSigner {
    result: Result<SignedTransaction, String>,
    calls: AtomicUsize,
}

impl FixedSigner {
    fn ok() -> Self {
        Self {
            result: Ok(SignedTransaction {
                public_key: "pk1".to_owned(),
                signature: "sig1".to_owned(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(stderr: &str) -> Self {
        Self {
            result: Err(stderr.to_owned()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TransactionSigner for FixedSigner {
    async fn sign(&self, _user_id: &str) -> Result<SignedTransaction, SignError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|stderr| SignError::NonZeroExit {
            status: "exit status: 1".to_owned(),
            stderr,
        })
    }
}

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn test_user() -> Result<SimulatedUser, String> {
    let mut rng = StdRng::seed_from_u64(7);
    SimulatedUser::start(&mut rng, "raffle_001", "<your-jwt-token-here>").map_err(|err| err.to_string())
}

fn load_args(args: &[&str]) -> Result<LoadArgs, String> {
    let cli = Cli::try_parse_from(args).map_err(|err| format!("parse failed: {}", err))?;
    match cli.command {
        Command::Load(load) => Ok(load),
        Command::Dashboard(_) => Err("Expected load command".to_owned()),
    }
}

#[test]
fn user_ids_stay_in_range() -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let user = SimulatedUser::start(&mut rng, "raffle_001", "token")
            .map_err(|err| err.to_string())?;
        let number: u16 = user
            .user_id
            .strip_prefix("testuser")
            .and_then(|suffix| suffix.parse().ok())
            .ok_or_else(|| format!("Unexpected user id {}", user.user_id))?;
        if !(1000..=9999).contains(&number) {
            return Err(format!("User number out of range: {}", number));
        }
    }
    Ok(())
}

#[test]
fn user_headers_carry_json_and_bearer() -> Result<(), String> {
    let user = test_user()?;
    let content_type = user
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok());
    let authorization = user
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok());
    if content_type != Some("application/json")
        || authorization != Some("Bearer <your-jwt-token-here>")
    {
        return Err(format!("Unexpected headers {:?}", user.headers()));
    }
    Ok(())
}

#[test]
fn purchase_payload_matches_wire_format() -> Result<(), String> {
    let user = test_user()?;
    let signed = SignedTransaction {
        public_key: "pk1".to_owned(),
        signature: "sig1".to_owned(),
    };
    let json = serde_json::to_string(&PurchasePayload::new(&user, &signed))
        .map_err(|err| err.to_string())?;
    let expected = format!(
        "{{\"raffleId\":\"raffle_001\",\"userWallet\":\"pk1\",\"userId\":\"{}\",\"ticketCount\":1,\"signature\":\"sig1\"}}",
        user.user_id
    );
    if json != expected {
        return Err(format!("Unexpected payload {}", json));
    }
    Ok(())
}

#[test]
fn signed_transaction_parses_signer_output() -> Result<(), String> {
    let signed: SignedTransaction =
        serde_json::from_str(r#"{"publicKey":"pk1","signature":"sig1","extra":true}"#)
            .map_err(|err| err.to_string())?;
    if signed.public_key != "pk1" || signed.signature != "sig1" {
        return Err(format!("Unexpected signed transaction {:?}", signed));
    }
    Ok(())
}

#[test]
fn classify_response_success_and_failure() -> Result<(), String> {
    let ok = classify_response(
        RaffleTask::CheckRaffleStatus,
        200,
        b"hello",
        Duration::from_millis(12),
    );
    let expected_ok = RequestEvent::Success {
        request_type: "GET",
        name: "/api/raffle-status/:raffleId",
        response_time: Duration::from_millis(12),
        response_length: 5,
    };
    if ok != expected_ok {
        return Err(format!("Unexpected success event {:?}", ok));
    }

    let created = classify_response(RaffleTask::CancelRaffle, 201, b"made", Duration::ZERO);
    match created {
        RequestEvent::Failure { message, .. } if message == "Status code: 201, Text: made" => {
            Ok(())
        }
        other @ (RequestEvent::Failure { .. } | RequestEvent::Success { .. }) => {
            Err(format!("Expected failure for 201, got {:?}", other))
        }
    }
}

#[test]
fn sign_failure_event_uses_stderr() -> Result<(), String> {
    let event = sign_failure_event(&SignError::NonZeroExit {
        status: "exit status: 2".to_owned(),
        stderr: "bad key".to_owned(),
    });
    let expected = RequestEvent::Failure {
        request_type: "SignTransaction",
        name: "sign_transaction",
        response_time: Duration::ZERO,
        message: "Signing failed: bad key".to_owned(),
    };
    if event != expected {
        return Err(format!("Unexpected event {:?}", event));
    }
    Ok(())
}

#[test]
fn spawn_failure_message_is_lowercase_detail() -> Result<(), String> {
    let event = sign_failure_event(&SignError::Spawn {
        program: "node".to_owned(),
        source: std::io::Error::other("not found"),
    });
    match event {
        RequestEvent::Failure { message, .. }
            if message == "Signing failed: failed to start signer 'node': not found" =>
        {
            Ok(())
        }
        other @ (RequestEvent::Failure { .. } | RequestEvent::Success { .. }) => {
            Err(format!("Unexpected event {:?}", other))
        }
    }
}

#[test]
fn endpoint_url_appends_to_host_path() -> Result<(), String> {
    let base = Url::parse("http://raffle.local/stage/").map_err(|err| err.to_string())?;
    let url = endpoint_url(&base, "/api/cancel-raffle").map_err(|err| err.to_string())?;
    if url.as_str() != "http://raffle.local/stage/api/cancel-raffle" {
        return Err(format!("Unexpected url {}", url));
    }
    Ok(())
}

#[test]
fn task_weights_approximate_one_two_one() -> Result<(), String> {
    let picker = TaskPicker::new(TaskWeights::default()).map_err(|err| err.to_string())?;
    let mut rng = StdRng::seed_from_u64(1234);
    let mut counts: HashMap<RaffleTask, u32> = HashMap::new();
    for _ in 0..40_000 {
        let entry = counts.entry(picker.pick(&mut rng)).or_insert(0);
        *entry = entry.saturating_add(1);
    }
    let count = |task| counts.get(&task).copied().unwrap_or(0);
    let purchase = count(RaffleTask::PurchaseTicket);
    let status = count(RaffleTask::CheckRaffleStatus);
    let cancel = count(RaffleTask::CancelRaffle);
    if !(9_000..=11_000).contains(&purchase)
        || !(19_000..=21_000).contains(&status)
        || !(9_000..=11_000).contains(&cancel)
    {
        return Err(format!(
            "Unexpected distribution {} {} {}",
            purchase, status, cancel
        ));
    }
    Ok(())
}

#[test]
fn zero_weights_are_rejected() -> Result<(), String> {
    let weights = TaskWeights {
        purchase: 0,
        status: 0,
        cancel: 0,
    };
    if TaskPicker::new(weights).is_ok() {
        return Err("Expected Err for all-zero weights".to_owned());
    }
    Ok(())
}

#[test]
fn max_weights_are_accepted_without_overflow() -> Result<(), String> {
    let weights = TaskWeights {
        purchase: u32::MAX,
        status: u32::MAX,
        cancel: 1,
    };
    let picker = TaskPicker::new(weights).map_err(|err| err.to_string())?;
    let mut rng = StdRng::seed_from_u64(77);
    let mut counts: HashMap<RaffleTask, u32> = HashMap::new();
    for _ in 0..2_000 {
        let entry = counts.entry(picker.pick(&mut rng)).or_insert(0);
        *entry = entry.saturating_add(1);
    }
    let count = |task| counts.get(&task).copied().unwrap_or(0);
    if count(RaffleTask::PurchaseTicket) < 800
        || count(RaffleTask::CheckRaffleStatus) < 800
        || count(RaffleTask::CancelRaffle) > 1
    {
        return Err(format!("Unexpected distribution {:?}", counts));
    }
    Ok(())
}

#[test]
fn wait_range_validates_and_samples_within_bounds() -> Result<(), String> {
    if WaitRange::new(Duration::from_secs(5), Duration::from_secs(1)).is_ok() {
        return Err("Expected Err for inverted wait range".to_owned());
    }
    let range = WaitRange::new(Duration::from_secs(1), Duration::from_secs(5))
        .map_err(|err| err.to_string())?;
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..500 {
        let wait = range.sample(&mut rng);
        if wait < Duration::from_secs(1) || wait > Duration::from_secs(5) {
            return Err(format!("Wait out of range {:?}", wait));
        }
    }
    Ok(())
}

#[test]
fn load_plan_requires_valid_host() -> Result<(), String> {
    if LoadPlan::from_args(&load_args(&["raffle-ops", "load"])?).is_ok() {
        return Err("Expected Err without host".to_owned());
    }
    if LoadPlan::from_args(&load_args(&["raffle-ops", "load", "-H", "not a url"])?).is_ok() {
        return Err("Expected Err for invalid host".to_owned());
    }
    let plan = LoadPlan::from_args(&load_args(&[
        "raffle-ops",
        "load",
        "-H",
        "http://127.0.0.1:3000",
        "-u",
        "5",
    ])?)
    .map_err(|err| err.to_string())?;
    if plan.users != 5 || plan.raffle_id != "raffle_001" {
        return Err(format!("Unexpected plan {:?}", plan));
    }
    Ok(())
}

#[test]
fn signer_failure_sends_no_purchase_request() -> Result<(), String> {
    run_async_test(async {
        let (base_url, api) = spawn_stub_api(200).await?;
        let client = Client::new();
        let signer = FixedSigner::failing("key not found");
        let context = TaskContext {
            client: &client,
            base_url: &base_url,
            signer: &signer,
        };
        let event = execute_task(RaffleTask::PurchaseTicket, &context, &test_user()?).await;
        let expected = RequestEvent::Failure {
            request_type: "SignTransaction",
            name: "sign_transaction",
            response_time: Duration::ZERO,
            message: "Signing failed: key not found".to_owned(),
        };
        if event != expected {
            return Err(format!("Unexpected event {:?}", event));
        }
        if api.hits.load(Ordering::SeqCst) != 0 {
            return Err("Purchase request sent despite signing failure".to_owned());
        }
        Ok(())
    })
}

#[test]
fn purchase_success_reports_body_length() -> Result<(), String> {
    run_async_test(async {
        let (base_url, api) = spawn_stub_api(200).await?;
        let client = Client::new();
        let signer = FixedSigner::ok();
        let context = TaskContext {
            client: &client,
            base_url: &base_url,
            signer: &signer,
        };
        let user = test_user()?;
        let event = execute_task(RaffleTask::PurchaseTicket, &context, &user).await;
        match event {
            RequestEvent::Success {
                request_type: "POST",
                name: "/api/purchase-ticket",
                response_length: 11,
                ..
            } => {}
            other @ (RequestEvent::Success { .. } | RequestEvent::Failure { .. }) => {
                return Err(format!("Unexpected event {:?}", other));
            }
        }
        let body = api
            .bodies
            .lock()
            .map_err(|_poisoned| "bodies lock poisoned".to_owned())?
            .first()
            .cloned()
            .unwrap_or_default();
        if !body.contains("\"userWallet\":\"pk1\"") || !body.contains(&user.user_id) {
            return Err(format!("Unexpected purchase body {}", body));
        }
        let authorization = api
            .authorization
            .lock()
            .map_err(|_poisoned| "authorization lock poisoned".to_owned())?
            .clone();
        if authorization.as_deref() != Some("Bearer <your-jwt-token-here>") {
            return Err(format!("Unexpected authorization {:?}", authorization));
        }
        if signer.calls.load(Ordering::SeqCst) != 1 {
            return Err("Signer not called exactly once".to_owned());
        }
        Ok(())
    })
}

#[test]
fn non_200_status_is_a_failure_with_code() -> Result<(), String> {
    run_async_test(async {
        let (base_url, _api) = spawn_stub_api(500).await?;
        let client = Client::new();
        let signer = FixedSigner::ok();
        let context = TaskContext {
            client: &client,
            base_url: &base_url,
            signer: &signer,
        };
        let event = execute_task(RaffleTask::CheckRaffleStatus, &context, &test_user()?).await;
        match event {
            RequestEvent::Failure { name, message, .. }
                if name == "/api/raffle-status/:raffleId"
                    && message == "Status code: 500, Text: boom" =>
            {
                Ok(())
            }
            other @ (RequestEvent::Success { .. } | RequestEvent::Failure { .. }) => {
                Err(format!("Unexpected event {:?}", other))
            }
        }
    })
}

#[test]
fn transport_error_is_a_failure() -> Result<(), String> {
    run_async_test(async {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("local_addr failed: {}", err))?;
        drop(listener);
        let base_url = Url::parse(&format!("http://{}", addr)).map_err(|err| err.to_string())?;
        let client = Client::new();
        let signer = FixedSigner::ok();
        let context = TaskContext {
            client: &client,
            base_url: &base_url,
            signer: &signer,
        };
        let event = execute_task(RaffleTask::CancelRaffle, &context, &test_user()?).await;
        if !event.is_failure() || event.name() != "/api/cancel-raffle" {
            return Err(format!("Unexpected event {:?}", event));
        }
        Ok(())
    })
}

#[test]
fn run_load_stops_at_run_time_and_reports() -> Result<(), String> {
    run_async_test(async {
        let (base_url, api) = spawn_stub_api(200).await?;
        let host = base_url.to_string();
        let args = load_args(&[
            "raffle-ops",
            "load",
            "-H",
            &host,
            "-u",
            "3",
            "-r",
            "100",
            "-t",
            "500ms",
            "--wait-min",
            "10ms",
            "--wait-max",
            "20ms",
        ])?;
        let plan = LoadPlan::from_args(&args).map_err(|err| err.to_string())?;
        let (shutdown_tx, _shutdown_rx) = shutdown_channel();
        let signer: Arc<dyn TransactionSigner> = Arc::new(FixedSigner::ok());

        let report = tokio::time::timeout(
            Duration::from_secs(10),
            run_load(&plan, signer, &shutdown_tx),
        )
        .await
        .map_err(|err| format!("run_load did not stop: {}", err))?
        .map_err(|err| err.to_string())?;

        if report.aggregated.num_requests == 0 {
            return Err("No requests recorded".to_owned());
        }
        if report.aggregated.num_failures != 0 {
            return Err(format!("Unexpected failures {:?}", report.failures));
        }
        let hits = u64::try_from(api.hits.load(Ordering::SeqCst)).unwrap_or(u64::MAX);
        if hits < report.aggregated.num_requests {
            return Err(format!(
                "Server saw {} requests, report has {}",
                hits, report.aggregated.num_requests
            ));
        }
        Ok(())
    })
}

#[test]
fn response_time_excludes_body_download() -> Result<(), String> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const BODY_DELAY: Duration = Duration::from_millis(400);

    run_async_test(async {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("local_addr failed: {}", err))?;
        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buffer = [0u8; 4096];
            drop(stream.read(&mut buffer).await);
            let head = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n";
            if stream.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            drop(stream.flush().await);
            tokio::time::sleep(BODY_DELAY).await;
            drop(stream.write_all(b"ok").await);
            drop(stream.shutdown().await);
        });

        let base_url = Url::parse(&format!("http://{}", addr)).map_err(|err| err.to_string())?;
        let client = Client::new();
        let signer = FixedSigner::ok();
        let context = TaskContext {
            client: &client,
            base_url: &base_url,
            signer: &signer,
        };
        let event = execute_task(RaffleTask::CheckRaffleStatus, &context, &test_user()?).await;
        match event {
            RequestEvent::Success {
                response_time,
                response_length: 2,
                ..
            } if response_time < BODY_DELAY => Ok(()),
            other @ (RequestEvent::Success { .. } | RequestEvent::Failure { .. }) => {
                Err(format!("Body download counted in timing: {:?}", other))
            }
        }
    })
}

#[test]
fn run_load_handles_huge_user_counts() -> Result<(), String> {
    run_async_test(async {
        let (base_url, _api) = spawn_stub_api(200).await?;
        let host = base_url.to_string();
        let args = load_args(&[
            "raffle-ops",
            "load",
            "-H",
            &host,
            "-r",
            "1",
            "-t",
            "300ms",
            "--wait-min",
            "10ms",
            "--wait-max",
            "20ms",
        ])?;
        let mut plan = LoadPlan::from_args(&args).map_err(|err| err.to_string())?;
        plan.users = usize::MAX;
        let (shutdown_tx, _shutdown_rx) = shutdown_channel();
        let signer: Arc<dyn TransactionSigner> = Arc::new(FixedSigner::ok());

        let report = tokio::time::timeout(
            Duration::from_secs(10),
            run_load(&plan, signer, &shutdown_tx),
        )
        .await
        .map_err(|err| format!("run_load did not stop: {}", err))?
        .map_err(|err| err.to_string())?;
        if report.aggregated.num_requests == 0 {
            return Err("The first user never ran".to_owned());
        }
        Ok(())
    })
}

#[cfg(unix)]
#[test]
fn process_signer_reads_stdout_and_reports_exit() -> Result<(), String> {
    run_async_test(async {
        let ok = ProcessSigner::new(
            "sh".to_owned(),
            vec![
                "-c".to_owned(),
                r#"printf '{"publicKey":"pk-%s","signature":"sig1"}' "$1""#.to_owned(),
                "signer".to_owned(),
            ],
        );
        let signed = ok.sign("testuser1234").await.map_err(|err| err.to_string())?;
        if signed.public_key != "pk-testuser1234" {
            return Err(format!("Unexpected signer output {:?}", signed));
        }

        let failing = ProcessSigner::new(
            "sh".to_owned(),
            vec![
                "-c".to_owned(),
                "echo 'no wallet' >&2; exit 3".to_owned(),
                "signer".to_owned(),
            ],
        );
        match failing.sign("testuser1234").await {
            Err(SignError::NonZeroExit { stderr, .. }) if stderr == "no wallet" => Ok(()),
            Err(err) => Err(format!("Expected non-zero exit, got {}", err)),
            Ok(signed) => Err(format!("Expected failure, got {:?}", signed)),
        }
    })
}
