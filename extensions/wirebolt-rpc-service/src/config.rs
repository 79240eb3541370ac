use crate::ConfigError;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use wirebolt::connection::HeartbeatSettings;
use wirebolt::constants::DEFAULT_MAX_FRAME_SIZE;
use wirebolt::serializer::SerializerKind;

/// Runtime options for Wirebolt servers and clients.
///
/// Every duration is expressed in milliseconds so the same struct can be
/// read from TOML and from `WIREBOLT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// I/O threads of the runtime built by [`RpcConfig::build_io_runtime`].
    pub worker_threads: usize,

    /// Threads of the server's business pool.
    pub business_threads: usize,

    /// Requests the business pool accepts (running plus queued) before it
    /// answers `Overloaded`.
    pub business_queue_capacity: usize,

    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub heartbeat_enabled: bool,
    pub heartbeat_interval_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub reader_idle_time_ms: u64,
    pub writer_idle_time_ms: u64,
    pub max_frame_size: usize,
    pub server_backlog: u32,

    /// Server-side bound on awaiting an async handler, independent of the
    /// client's request timeout.
    pub async_await_timeout_ms: u64,

    /// Period of the client's correlation-deadline sweep.
    pub deadline_sweep_interval_ms: u64,

    /// Serializer the client tags its requests with.
    pub serializer: SerializerKind,
}

impl Default for RpcConfig {
    fn default() -> Self {
        let worker_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            worker_threads,
            business_threads: 16,
            business_queue_capacity: 1024,
            connect_timeout_ms: 3_000,
            request_timeout_ms: 5_000,
            heartbeat_enabled: true,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 10_000,
            reader_idle_time_ms: 90_000,
            writer_idle_time_ms: 30_000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            server_backlog: 1024,
            async_await_timeout_ms: 30_000,
            deadline_sweep_interval_ms: 1_000,
            serializer: SerializerKind::default(),
        }
    }
}

fn env_override<T: FromStr>(name: &str, field: &mut T) {
    if let Ok(val) = std::env::var(name)
        && let Ok(parsed) = val.trim().parse::<T>()
    {
        *field = parsed;
    }
}

fn require_positive(value: u64, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive { field });
    }
    Ok(())
}

impl RpcConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with any `WIREBOLT_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlays `WIREBOLT_*` environment variables on top of `self`.
    ///
    /// Variables that are missing or fail to parse leave the field untouched.
    pub fn with_env_overrides(mut self) -> Self {
        env_override("WIREBOLT_WORKER_THREADS", &mut self.worker_threads);
        env_override("WIREBOLT_BUSINESS_THREADS", &mut self.business_threads);
        env_override(
            "WIREBOLT_BUSINESS_QUEUE_CAPACITY",
            &mut self.business_queue_capacity,
        );
        env_override("WIREBOLT_CONNECT_TIMEOUT_MS", &mut self.connect_timeout_ms);
        env_override("WIREBOLT_REQUEST_TIMEOUT_MS", &mut self.request_timeout_ms);
        env_override("WIREBOLT_HEARTBEAT_ENABLED", &mut self.heartbeat_enabled);
        env_override(
            "WIREBOLT_HEARTBEAT_INTERVAL_MS",
            &mut self.heartbeat_interval_ms,
        );
        env_override(
            "WIREBOLT_HEARTBEAT_TIMEOUT_MS",
            &mut self.heartbeat_timeout_ms,
        );
        env_override("WIREBOLT_READER_IDLE_TIME_MS", &mut self.reader_idle_time_ms);
        env_override("WIREBOLT_WRITER_IDLE_TIME_MS", &mut self.writer_idle_time_ms);
        env_override("WIREBOLT_MAX_FRAME_SIZE", &mut self.max_frame_size);
        env_override("WIREBOLT_SERVER_BACKLOG", &mut self.server_backlog);
        env_override(
            "WIREBOLT_ASYNC_AWAIT_TIMEOUT_MS",
            &mut self.async_await_timeout_ms,
        );
        env_override(
            "WIREBOLT_DEADLINE_SWEEP_INTERVAL_MS",
            &mut self.deadline_sweep_interval_ms,
        );

        if let Ok(val) = std::env::var("WIREBOLT_SERIALIZER") {
            match val.trim().to_ascii_lowercase().as_str() {
                "bitcode" => self.serializer = SerializerKind::Bitcode,
                "json" => self.serializer = SerializerKind::Json,
                other => tracing::warn!("Ignoring unknown WIREBOLT_SERIALIZER value `{other}`"),
            }
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(self.worker_threads as u64, "worker_threads")?;
        require_positive(self.business_threads as u64, "business_threads")?;
        require_positive(
            self.business_queue_capacity as u64,
            "business_queue_capacity",
        )?;
        require_positive(self.connect_timeout_ms, "connect_timeout_ms")?;
        require_positive(self.request_timeout_ms, "request_timeout_ms")?;
        require_positive(self.max_frame_size as u64, "max_frame_size")?;
        require_positive(u64::from(self.server_backlog), "server_backlog")?;
        require_positive(self.async_await_timeout_ms, "async_await_timeout_ms")?;
        require_positive(
            self.deadline_sweep_interval_ms,
            "deadline_sweep_interval_ms",
        )?;

        if self.max_frame_size > i32::MAX as usize {
            return Err(ConfigError::MaxFrameSizeTooLarge {
                max_frame_size: self.max_frame_size,
            });
        }

        if self.heartbeat_enabled {
            require_positive(self.heartbeat_interval_ms, "heartbeat_interval_ms")?;
            require_positive(self.heartbeat_timeout_ms, "heartbeat_timeout_ms")?;
            require_positive(self.reader_idle_time_ms, "reader_idle_time_ms")?;
            require_positive(self.writer_idle_time_ms, "writer_idle_time_ms")?;

            if self.heartbeat_timeout_ms >= self.heartbeat_interval_ms {
                return Err(ConfigError::HeartbeatTimeoutNotBelowInterval {
                    timeout_ms: self.heartbeat_timeout_ms,
                    interval_ms: self.heartbeat_interval_ms,
                });
            }

            if self.reader_idle_time_ms <= self.heartbeat_interval_ms {
                return Err(ConfigError::ReaderIdleNotAboveInterval {
                    reader_idle_ms: self.reader_idle_time_ms,
                    interval_ms: self.heartbeat_interval_ms,
                });
            }
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn async_await_timeout(&self) -> Duration {
        Duration::from_millis(self.async_await_timeout_ms)
    }

    pub fn deadline_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.deadline_sweep_interval_ms)
    }

    pub fn heartbeat_settings(&self) -> HeartbeatSettings {
        HeartbeatSettings {
            enabled: self.heartbeat_enabled,
            interval: Duration::from_millis(self.heartbeat_interval_ms),
            timeout: Duration::from_millis(self.heartbeat_timeout_ms),
            reader_idle_time: Duration::from_millis(self.reader_idle_time_ms),
            writer_idle_time: Duration::from_millis(self.writer_idle_time_ms),
        }
    }

    /// Builds the multi-threaded I/O runtime sized by `worker_threads`.
    pub fn build_io_runtime(&self) -> Result<tokio::runtime::Runtime, ConfigError> {
        self.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name("wirebolt-io")
            .enable_all()
            .build()?;

        Ok(runtime)
    }
}
