//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

use parley_core::{GenerationOptions, MonitorConfig};

/// Runtime configuration for parley-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8080"`).
    pub bind_address: String,

    /// Base URL of the inference daemon's HTTP API
    /// (default: `"http://localhost:11434"`).
    pub backend_url: String,

    /// Model identifier the daemon should serve (default: `"llama3.1:8b"`).
    pub model: String,

    /// Fixed system instruction prepended to every prompt. Empty means no
    /// system prompt.
    pub system_prompt: String,

    /// How many trailing history turns are included in each prompt.
    pub context_window: usize,

    /// Maximum retained turns per session (forced even by the store).
    pub history_cap: usize,

    /// Idle lifetime of a session's conversation before it is swept.
    pub session_ttl: Duration,

    /// Deadline for one generate call to the daemon.
    pub request_timeout: Duration,

    /// Command used to launch the daemon, e.g. `"ollama"`.
    pub launch_command: String,

    /// Arguments for the launch command, e.g. `["serve"]`.
    pub launch_args: Vec<String>,

    /// Grace period after launch before the monitor talks to the daemon.
    pub settle_delay: Duration,

    /// Health-probe retry budget.
    pub probe_attempts: u32,

    /// Pause between health probes.
    pub probe_interval: Duration,

    /// Deadline for a blocking model download.
    pub pull_timeout: Duration,

    /// Sampling temperature attached to every generate call.
    pub temperature: f32,

    /// Nucleus-sampling p.
    pub top_p: f32,

    /// Top-k sampling cutoff.
    pub top_k: u32,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins; unset = wildcard.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui` (disable in production).
    pub enable_swagger: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("PARLEY_BIND", "0.0.0.0:8080"),
            backend_url: env_or("PARLEY_BACKEND_URL", "http://localhost:11434"),
            model: env_or("PARLEY_MODEL", "llama3.1:8b"),
            system_prompt: env_or("PARLEY_SYSTEM_PROMPT", ""),
            context_window: parse_env("PARLEY_CONTEXT_WINDOW", 6),
            history_cap: parse_env("PARLEY_HISTORY_CAP", 20),
            session_ttl: Duration::from_secs(parse_env("PARLEY_SESSION_TTL_SECS", 1800)),
            request_timeout: Duration::from_secs(parse_env("PARLEY_REQUEST_TIMEOUT_SECS", 30)),
            launch_command: env_or("PARLEY_BACKEND_COMMAND", "ollama"),
            launch_args: split_args(&env_or("PARLEY_BACKEND_ARGS", "serve")),
            settle_delay: Duration::from_secs(parse_env("PARLEY_SETTLE_DELAY_SECS", 5)),
            probe_attempts: parse_env("PARLEY_PROBE_ATTEMPTS", 10),
            probe_interval: Duration::from_secs(parse_env("PARLEY_PROBE_INTERVAL_SECS", 2)),
            pull_timeout: Duration::from_secs(parse_env("PARLEY_PULL_TIMEOUT_SECS", 1800)),
            temperature: parse_env("PARLEY_TEMPERATURE", 0.7),
            top_p: parse_env("PARLEY_TOP_P", 0.9),
            top_k: parse_env("PARLEY_TOP_K", 40),
            log_level: env_or("PARLEY_LOG", "info"),
            log_json: std::env::var("PARLEY_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_allowed_origins: std::env::var("PARLEY_CORS_ORIGINS").ok(),
            enable_swagger: std::env::var("PARLEY_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }

    /// The system prompt, or `None` when configured empty.
    pub fn system_prompt(&self) -> Option<&str> {
        let trimmed = self.system_prompt.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            settle_delay: self.settle_delay,
            probe_attempts: self.probe_attempts,
            probe_interval: self.probe_interval,
            pull_timeout: self.pull_timeout,
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
