//! Backend startup supervision.
//!
//! [`run`] is spawned once at process start. It launches the inference
//! daemon, waits for it to settle, makes sure the configured model is
//! present (pulling it if not), then probes the daemon until it answers.
//! The outcome is published to the shared [`StatusCell`]; there is no
//! transition out of `ready` or `error`, and a backend that crashes after
//! reaching `ready` is not re-detected.
//!
//! The monitor never gates the chat path. Requests issued before `ready`
//! are still forwarded and surface client errors on their own.

use std::future::Future;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::{BackendClient, ClientError};
use crate::status::{ReadinessStatus, StatusCell};

/// Timing knobs for the startup sequence.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Grace period after launching the daemon before talking to it.
    pub settle_delay: Duration,
    /// How many health probes to attempt before giving up.
    pub probe_attempts: u32,
    /// Pause between health probes.
    pub probe_interval: Duration,
    /// Deadline for a blocking model download.
    pub pull_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(5),
            probe_attempts: 10,
            probe_interval: Duration::from_secs(2),
            pull_timeout: Duration::from_secs(1800),
        }
    }
}

/// What the monitor needs from the backend: process launch plus the three
/// daemon calls. Split out so tests can script the daemon's behavior.
pub trait BackendAdmin: Send + Sync {
    /// Start the daemon as a detached child process.
    fn launch(&self) -> std::io::Result<()>;

    /// Whether the configured model is already present.
    fn model_present(&self) -> impl Future<Output = Result<bool, ClientError>> + Send;

    /// Download the configured model, blocking until done.
    fn pull_model(&self, timeout: Duration) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Cheap liveness probe.
    fn healthy(&self) -> impl Future<Output = bool> + Send;

    /// Model identifier, for status messages.
    fn model(&self) -> &str;
}

/// Production [`BackendAdmin`]: spawns the configured daemon command and
/// delegates the API calls to the shared [`BackendClient`].
pub struct DaemonAdmin {
    client: Arc<BackendClient>,
    command: String,
    args: Vec<String>,
}

impl DaemonAdmin {
    pub fn new(client: Arc<BackendClient>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self { client, command: command.into(), args }
    }
}

impl BackendAdmin for DaemonAdmin {
    fn launch(&self) -> std::io::Result<()> {
        info!(command = %self.command, args = ?self.args, "launching inference daemon");
        // Fire-and-forget: dropping the child handle leaves the daemon
        // running on its own.
        Command::new(&self.command)
            .args(&self.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }

    async fn model_present(&self) -> Result<bool, ClientError> {
        self.client.model_present().await
    }

    async fn pull_model(&self, timeout: Duration) -> Result<(), ClientError> {
        self.client.pull_model(timeout).await
    }

    async fn healthy(&self) -> bool {
        self.client.healthy().await
    }

    fn model(&self) -> &str {
        self.client.model()
    }
}

/// Run the startup sequence once, publishing progress into `cell`.
pub async fn run<A: BackendAdmin>(admin: A, config: MonitorConfig, cell: Arc<StatusCell>) {
    cell.publish(ReadinessStatus::loading("starting backend"));

    if let Err(e) = admin.launch() {
        warn!(error = %e, "daemon launch failed");
        cell.publish(ReadinessStatus::error(format!("failed to start backend: {e}")));
        return;
    }

    tokio::time::sleep(config.settle_delay).await;

    cell.publish(ReadinessStatus::loading(format!("checking for model {}", admin.model())));
    let present = match admin.model_present().await {
        Ok(present) => present,
        Err(e) => {
            // The daemon may still be warming up; let the pull step decide.
            warn!(error = %e, "model listing failed; assuming model is absent");
            false
        }
    };

    if !present {
        cell.publish(ReadinessStatus::loading(format!(
            "downloading model {} (this may take a few minutes)",
            admin.model()
        )));
        if let Err(e) = admin.pull_model(config.pull_timeout).await {
            warn!(error = %e, model = %admin.model(), "model pull failed");
            cell.publish(ReadinessStatus::error(format!(
                "failed to download model {}: {e}",
                admin.model()
            )));
            return;
        }
        info!(model = %admin.model(), "model downloaded");
    }

    cell.publish(ReadinessStatus::loading("testing connection"));
    for attempt in 1..=config.probe_attempts {
        if admin.healthy().await {
            info!(attempt, "backend answered health probe");
            cell.publish(ReadinessStatus::ready("backend is ready"));
            return;
        }
        debug!(attempt, "health probe unanswered");
        tokio::time::sleep(config.probe_interval).await;
    }

    cell.publish(ReadinessStatus::error("backend started but not responding"));
}

// ── Tests ──────────────────────────────────────────────────────────────────────
