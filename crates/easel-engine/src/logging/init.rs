use std::sync::Once;

/// How the global logger is set up.
///
/// Filter precedence: `env_filter`, then `RUST_LOG`, then `default_level` for
/// everything with the wgpu stack lowered to `warn` when `quiet_gpu` is set.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter syntax, e.g. `"easel_engine=debug,wgpu_core=warn"`.
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    /// wgpu, wgpu-core, wgpu-hal and naga log a lot at `info`.
    pub quiet_gpu: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            quiet_gpu: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }

    fn builder(&self, rust_log: Option<String>) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();

        match self.env_filter.clone().or(rust_log) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(self.default_level);
                if self.quiet_gpu {
                    for module in GPU_MODULES {
                        builder.filter_module(module, log::LevelFilter::Warn);
                    }
                }
            }
        }

        builder.write_style(self.write_style);
        builder
    }
}

const GPU_MODULES: [&str; 4] = ["wgpu", "wgpu_core", "wgpu_hal", "naga"];

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has an effect.
///
/// Call it at the top of `main`, before [`crate::window::run`]. A logger
/// already installed by the host (or a test harness) is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        if config.builder(rust_log).try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_rust_log() {
        let config = LoggingConfig::with_filter("error");
        let logger = config.builder(Some("trace".to_string())).build();
        assert_eq!(logger.filter(), log::LevelFilter::Error);
    }

    #[test]
    fn rust_log_applies_without_explicit_filter() {
        let logger = LoggingConfig::default()
            .builder(Some("debug".to_string()))
            .build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn default_level_is_used_last() {
        let config = LoggingConfig {
            default_level: log::LevelFilter::Warn,
            ..LoggingConfig::default()
        };
        assert_eq!(config.builder(None).build().filter(), log::LevelFilter::Warn);
    }
}
