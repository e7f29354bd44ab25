use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::{Client, Url};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::args::{DEFAULT_USER_AGENT, LoadArgs};
use crate::error::{AppError, AppResult, HttpError, ValidationError};
use crate::metrics::{RequestEvent, StatsReport, setup_stats_collector};
use crate::shutdown::{ShutdownReceiver, ShutdownSender};

use super::execution::{TaskContext, execute_task};
use super::signer::TransactionSigner;
use super::tasks::{TaskPicker, TaskWeights};
use super::user::SimulatedUser;

/// Event channel size shared by all users.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Inclusive range a user sleeps for between tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitRange {
    min: Duration,
    max: Duration,
}

impl WaitRange {
    /// # Errors
    ///
    /// Returns an error when `min` is greater than `max`.
    pub fn new(min: Duration, max: Duration) -> AppResult<Self> {
        if min > max {
            return Err(AppError::validation(ValidationError::WaitRangeInverted {
                min_ms: min.as_millis(),
                max_ms: max.as_millis(),
            }));
        }
        Ok(Self { min, max })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Validated settings for one load run.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub base_url: Url,
    pub users: usize,
    pub spawn_rate: u64,
    pub run_time: Option<Duration>,
    pub raffle_id: String,
    pub token: String,
    pub wait: WaitRange,
    pub picker: TaskPicker,
    pub request_timeout: Duration,
}

impl LoadPlan {
    /// # Errors
    ///
    /// Returns an error when the host is missing or invalid, the wait range is
    /// inverted, or every task weight is zero.
    pub fn from_args(args: &LoadArgs) -> AppResult<Self> {
        let host = args
            .host
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| AppError::validation(ValidationError::MissingHost))?;
        let base_url = parse_host(host)?;
        Ok(Self {
            base_url,
            users: args.users.get(),
            spawn_rate: args.spawn_rate.get(),
            run_time: args.run_time,
            raffle_id: args.raffle_id.clone(),
            token: args.token.clone(),
            wait: WaitRange::new(args.wait_min, args.wait_max)?,
            picker: TaskPicker::new(TaskWeights::from_args(args))?,
            request_timeout: args.request_timeout,
        })
    }

    fn spawn_interval(&self) -> Duration {
        let rate = u32::try_from(self.spawn_rate).unwrap_or(u32::MAX);
        Duration::from_secs(1)
            .checked_div(rate)
            .unwrap_or(Duration::ZERO)
    }
}

fn parse_host(host: &str) -> AppResult<Url> {
    let url = Url::parse(host.trim()).map_err(|err| {
        AppError::http(HttpError::InvalidUrl {
            url: host.to_owned(),
            source: err,
        })
    })?;
    if url.cannot_be_a_base() {
        return Err(AppError::http(HttpError::CannotBeBase {
            url: host.to_owned(),
        }));
    }
    Ok(url)
}

struct UserContext {
    client: Client,
    base_url: Url,
    signer: Arc<dyn TransactionSigner>,
    picker: TaskPicker,
    wait: WaitRange,
}

/// Spawns users at the configured rate and returns the stats once all stop.
///
/// Stops on run-time expiry or any shutdown broadcast; in-flight requests are
/// abandoned.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built or a user cannot be
/// started.
pub async fn run_load(
    plan: &LoadPlan,
    signer: Arc<dyn TransactionSigner>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<StatsReport> {
    let client = Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .timeout(plan.request_timeout)
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
    let context = Arc::new(UserContext {
        client,
        base_url: plan.base_url.clone(),
        signer,
        picker: plan.picker.clone(),
        wait: plan.wait,
    });

    let run_start = Instant::now();
    let (events_tx, events_rx) = mpsc::channel::<RequestEvent>(EVENT_CHANNEL_CAPACITY);
    let collector = setup_stats_collector(run_start, events_rx);
    let mut shutdown_rx = shutdown_tx.subscribe();

    if let Some(run_time) = plan.run_time {
        spawn_run_timer(run_time, shutdown_tx);
    }

    info!(
        "Spawning {} users at {}/s against {}",
        plan.users, plan.spawn_rate, plan.base_url
    );
    let mut rng = StdRng::from_entropy();
    let spawn_interval = plan.spawn_interval();
    let mut users: Vec<JoinHandle<()>> = Vec::new();
    let mut spawn_error = None;
    for index in 0..plan.users {
        if index > 0 {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                () = tokio::time::sleep(spawn_interval) => {}
            }
        }
        let user = match SimulatedUser::start(&mut rng, &plan.raffle_id, &plan.token) {
            Ok(user) => user,
            Err(err) => {
                drop(shutdown_tx.send(()));
                spawn_error = Some(err);
                break;
            }
        };
        let user_shutdown_rx = shutdown_tx.subscribe();
        if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }
        debug!("Starting user {}", user.user_id);
        users.push(spawn_user(
            Arc::clone(&context),
            user,
            events_tx.clone(),
            user_shutdown_rx,
        ));
    }
    if spawn_error.is_none() && users.len() == plan.users {
        info!("All {} users spawned", users.len());
    }
    drop(events_tx);

    for handle in users {
        if let Err(err) = handle.await {
            warn!("User task failed: {}", err);
        }
    }
    let report = collector.await?;
    spawn_error.map_or(Ok(report), Err)
}

fn spawn_run_timer(run_time: Duration, shutdown_tx: &ShutdownSender) {
    let shutdown_tx = shutdown_tx.clone();
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_rx.recv() => {}
            () = tokio::time::sleep(run_time) => {
                info!("Run time of {:?} reached, stopping", run_time);
                drop(shutdown_tx.send(()));
            }
        }
    });
}

fn spawn_user(
    context: Arc<UserContext>,
    user: SimulatedUser,
    events_tx: mpsc::Sender<RequestEvent>,
    mut shutdown_rx: ShutdownReceiver,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let task_context = TaskContext {
            client: &context.client,
            base_url: &context.base_url,
            signer: context.signer.as_ref(),
        };

        loop {
            let task = context.picker.pick(&mut rng);
            let event = tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = execute_task(task, &task_context, &user) => event,
            };
            if events_tx.send(event).await.is_err() {
                break;
            }
            let wait = context.wait.sample(&mut rng);
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                () = tokio::time::sleep(wait) => {}
            }
        }
        debug!("User {} stopped", user.user_id);
    })
}
