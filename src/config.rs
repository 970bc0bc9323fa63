use crate::error::{Error, Result};
use std::time::Duration;

/// How long a worker may sit idle before it retires.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Pool configuration. Immutable once the pool is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of live workers. `None` means one per CPU.
    pub capacity: Option<usize>,

    /// Idle time after which a worker retires. Also bounds each condvar wait
    /// so the retirement check re-runs even without a wakeup.
    pub idle_timeout: Duration,

    /// Prefix for worker thread names, suffixed with the worker id.
    pub thread_name_prefix: String,

    /// Stack size for worker threads, if overriding the platform default.
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            thread_name_prefix: "brigade-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.capacity {
            if n == 0 {
                return Err(Error::config("capacity must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("capacity too large (max 1024)"));
            }
        }

        if self.idle_timeout.is_zero() {
            return Err(Error::config("idle_timeout must be non-zero"));
        }

        Ok(())
    }

    /// Effective worker cap: the configured capacity or one per CPU.
    pub fn worker_capacity(&self) -> usize {
        self.capacity.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn capacity(mut self, n: usize) -> Self {
        self.config.capacity = Some(n);
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
