use argh::FromArgs;
use std::path::PathBuf;

/// Default tracing filter when neither `RUST_LOG` nor `--log-level` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(FromArgs, Debug, Default, PartialEq)]
/// fsh: a small shell with touch, ls, pwd, cd and mkdir built in.
pub struct Config {
    #[argh(option, short = 'C')]
    /// directory to start in instead of the current one.
    pub directory: Option<PathBuf>,

    #[argh(option, short = 'c')]
    /// run a single command line and exit.
    pub command: Option<String>,

    #[argh(option)]
    /// tracing filter, e.g. "debug" or "fsh=trace". RUST_LOG takes precedence.
    pub log_level: Option<String>,
}

impl Config {
    /// Log filter from the command line, or the default.
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
