//! Tracing setup for the max5820 binaries.
//!
//! A binary calls [`init`] once at startup to install a tracing subscriber.
//! Library code only emits events, through `use tracing::{...}` or the
//! [`prelude`] here, and never installs anything itself.

use std::env;
use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{trace, debug, info, warn, error};
}

use prelude::*;

/// Install the process-wide subscriber.
///
/// Under systemd the events go to journald; anywhere else, to stdout with
/// `RUST_LOG` filtering on top of a default level of INFO.
pub fn init() {
    if env::var("JOURNAL_STREAM").is_ok() {
        if let Ok(layer) = tracing_journald::layer() {
            tracing_subscriber::registry().with(layer).init();
            return;
        }
        init_stdout();
        warn!("journald unavailable, logging to stdout instead");
        return;
    }
    init_stdout();
}

fn init_stdout() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_timer(ClockTimer))
        .init();
}

// Local wall-clock timestamps to the second; the stock formatter's full UTC
// timestamp is too wide for an interactive tool.
struct ClockTimer;

impl FormatTime for ClockTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now =
            OffsetDateTime::now_local().unwrap_or(OffsetDateTime::now_utc());
        write!(
            w,
            "{}",
            now.format(time::macros::format_description!(
                "[hour]:[minute]:[second]"
            ))
            .unwrap(),
        )
    }
}
