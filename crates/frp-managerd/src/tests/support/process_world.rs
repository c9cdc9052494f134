//! Process lifecycle test world shared across BDD scenarios.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::health::HealthReporter;
use crate::process::launch::run_daemon_with;
use crate::process::{LaunchError, ShutdownError, ShutdownSignal};

use super::config_loader::TestConfigLoader;
use super::reporter::{HealthEvent, RecordingHealthReporter};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub type StepResult = Result<(), String>;

/// Minimal HTTP response captured from the running daemon.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_line: String,
    pub body: String,
}

pub struct ProcessTestWorld {
    loader: TestConfigLoader,
    reporter: Arc<RecordingHealthReporter>,
    shutdown: TestShutdownSignal,
    handle: Option<thread::JoinHandle<Result<(), LaunchError>>>,
    result: Option<Result<(), LaunchError>>,
    occupied: Option<TcpListener>,
    responses: Vec<RawResponse>,
}

impl Default for ProcessTestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTestWorld {
    pub fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            shutdown: TestShutdownSignal::new(),
            handle: None,
            result: None,
            occupied: None,
            responses: Vec::new(),
        }
    }

    /// Makes the configured listen address unavailable.
    pub fn occupy_listen_address(&mut self) -> StepResult {
        let listener = TcpListener::bind("127.0.0.1:0").map_err(|error| error.to_string())?;
        let address = listener.local_addr().map_err(|error| error.to_string())?;
        self.loader = self.loader.clone().listening_on(address);
        self.occupied = Some(listener);
        Ok(())
    }

    pub fn start(&mut self) -> StepResult {
        if self.handle.is_some() {
            return Err("daemon already running".to_owned());
        }
        let loader = self.loader.clone();
        let reporter = self.reporter.clone() as Arc<dyn HealthReporter>;
        let shutdown = self.shutdown.clone();
        self.handle = Some(thread::spawn(move || {
            run_daemon_with(&loader, reporter, shutdown)
        }));
        Ok(())
    }

    /// Waits until the daemon announces its listener or stops.
    pub fn wait_for_ready(&mut self) -> StepResult {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            if self.reporter.listener_address().is_some() {
                return Ok(());
            }
            if self.handle.as_ref().is_some_and(thread::JoinHandle::is_finished) {
                return self.join();
            }
            thread::sleep(POLL_INTERVAL);
        }
        Err("daemon did not become ready".to_owned())
    }

    pub fn post(&mut self, path: &str, body: &str) -> StepResult {
        let address = self
            .reporter
            .listener_address()
            .ok_or_else(|| "daemon is not listening".to_owned())?;
        let response = send_http(address, "POST", path, body).map_err(|error| error.to_string())?;
        self.responses.push(response);
        Ok(())
    }

    pub fn get(&mut self, path: &str) -> StepResult {
        let address = self
            .reporter
            .listener_address()
            .ok_or_else(|| "daemon is not listening".to_owned())?;
        let response = send_http(address, "GET", path, "").map_err(|error| error.to_string())?;
        self.responses.push(response);
        Ok(())
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    pub fn join(&mut self) -> StepResult {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| "daemon not running".to_owned())?;
        let result = handle
            .join()
            .map_err(|_| "daemon thread panicked".to_owned())?;
        self.result = Some(result);
        Ok(())
    }

    pub fn result(&self) -> Option<&Result<(), LaunchError>> {
        self.result.as_ref()
    }

    pub fn last_response(&self) -> Option<&RawResponse> {
        self.responses.last()
    }

    pub fn events(&self) -> Vec<HealthEvent> {
        self.reporter.events()
    }
}

impl Drop for ProcessTestWorld {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            drop(handle.join());
        }
    }
}

fn send_http(address: SocketAddr, method: &str, path: &str, body: &str) -> std::io::Result<RawResponse> {
    let mut stream = TcpStream::connect(address)?;
    stream.set_read_timeout(Some(WAIT_TIMEOUT))?;
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {address}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes())?;
    stream.flush()?;

    let mut raw = String::new();
    stream.read_to_string(&mut raw)?;
    let (head, payload) = raw.split_once("\r\n\r\n").unwrap_or((raw.as_str(), ""));
    let status_line = head.lines().next().unwrap_or_default().to_owned();
    Ok(RawResponse {
        status_line,
        body: payload.to_owned(),
    })
}

/// Shutdown signal released explicitly by the test.
#[derive(Clone)]
pub struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(())
    }
}
