use clap::Args;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging flags shared by both binaries.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Log at debug level for this crate
    #[arg(long, global = true, conflicts_with = "log_level")]
    pub debug: bool,

    /// Log level for this crate (error|warn|info|debug|trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

impl LogArgs {
    /// Precedence: flags, then `RUST_LOG`, then `warn`.
    pub fn filter_spec(&self) -> String {
        if self.debug {
            return "scriptctl=debug".to_string();
        }
        if let Some(level) = &self.log_level {
            return format!("scriptctl={}", level.to_ascii_lowercase());
        }
        std::env::var("RUST_LOG").unwrap_or_else(|_| "scriptctl=warn".to_string())
    }
}

pub fn init(args: &LogArgs) {
    let filter = EnvFilter::try_new(args.filter_spec()).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_win_over_env() {
        let args = LogArgs {
            debug: true,
            log_level: None,
        };
        assert_eq!(args.filter_spec(), "scriptctl=debug");

        let args = LogArgs {
            debug: false,
            log_level: Some("TRACE".to_string()),
        };
        assert_eq!(args.filter_spec(), "scriptctl=trace");
    }
}
