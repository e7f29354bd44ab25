use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Child, Command, Output, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    hits: Arc<AtomicUsize>,
}

impl ServerHandle {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Canned response for one request path prefix.
#[derive(Clone)]
pub struct Route {
    pub prefix: &'static str,
    pub status: u16,
    pub body: String,
}

/// Spawn a lightweight HTTP server that answers by path prefix.
///
/// Unmatched paths get a 404.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server(routes: Vec<Route>) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let hits = Arc::new(AtomicUsize::new(0));
    let server_hits = Arc::clone(&hits);
    let routes = Arc::new(routes);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    server_hits.fetch_add(1, Ordering::SeqCst);
                    let routes = Arc::clone(&routes);
                    thread::spawn(move || handle_client(stream, &routes));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            hits,
        },
    ))
}

fn handle_client(mut stream: TcpStream, routes: &[Route]) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let mut buffer = [0u8; 8192];
    let Ok(read) = stream.read(&mut buffer) else {
        return;
    };
    let head = String::from_utf8_lossy(buffer.get(..read).unwrap_or_default()).into_owned();
    let path = head.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = routes
        .iter()
        .find(|route| path.starts_with(route.prefix))
        .map_or((404, "not found".to_owned()), |route| {
            (route.status, route.body.clone())
        });
    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// Run the `raffle-ops` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_raffle_ops<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(raffle_ops_bin()?)
        .args(args)
        .env("RAFFLE_OPS_LOG", "error")
        .env_remove("RAFFLE_OPS_TOKEN")
        .output()
        .map_err(|err| format!("run raffle-ops failed: {}", err))
}

/// Run the `raffle-ops` binary with AWS credentials cleared from the environment.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_raffle_ops_without_aws<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(raffle_ops_bin()?)
        .args(args)
        .env("RAFFLE_OPS_LOG", "error")
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY")
        .env_remove("AWS_SESSION_TOKEN")
        .output()
        .map_err(|err| format!("run raffle-ops failed: {}", err))
}

/// Start the `raffle-ops` binary in the background.
///
/// # Errors
///
/// Returns an error if the binary cannot be started.
pub fn spawn_raffle_ops<I, S>(args: I, envs: &[(&str, &str)]) -> Result<Child, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(raffle_ops_bin()?)
        .args(args)
        .env("RAFFLE_OPS_LOG", "error")
        .envs(envs.iter().copied())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| format!("spawn raffle-ops failed: {}", err))
}

/// Returns a port that was free a moment ago.
///
/// # Errors
///
/// Returns an error if no ephemeral port can be bound.
pub fn free_port() -> Result<u16, String> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(|err| format!("bind failed: {}", err))?;
    listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(|err| format!("local_addr failed: {}", err))
}

/// Sends a bare HTTP/1.1 request and returns `(status, body)`.
///
/// # Errors
///
/// Returns an error when the connection fails or the response is malformed.
pub fn http_request(
    port: u16,
    method: &str,
    path: &str,
    body: &str,
) -> Result<(u16, String), String> {
    let mut stream = TcpStream::connect(("127.0.0.1", port))
        .map_err(|err| format!("connect failed: {}", err))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .map_err(|err| format!("set_read_timeout failed: {}", err))?;
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        method,
        path,
        body.len(),
        body
    );
    stream
        .write_all(request.as_bytes())
        .map_err(|err| format!("write failed: {}", err))?;
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .map_err(|err| format!("read failed: {}", err))?;
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| format!("malformed response: {}", response))?;
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, rest)| rest.to_owned())
        .unwrap_or_default();
    Ok((status, body))
}

/// Polls `path` until it answers 200 or `timeout` passes.
///
/// # Errors
///
/// Returns an error when the server never becomes ready.
pub fn wait_until_ready(port: u16, path: &str, timeout: Duration) -> Result<(), String> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if matches!(http_request(port, "GET", path, ""), Ok((200, _))) {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(50));
    }
    Err(format!("server on port {} not ready after {:?}", port, timeout))
}

fn raffle_ops_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_raffle-ops").map_or_else(
        || Err("CARGO_BIN_EXE_raffle-ops missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
