#![forbid(unsafe_code)]

use once_cell::sync::Lazy;
use std::time::Instant;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Timestamps as time since start.
struct UptimeTimer;

impl FormatTime for UptimeTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", uptime())
    }
}

fn uptime() -> String {
    let millis = START_TIME.elapsed().as_millis();
    let seconds = millis / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        hours % 24,
        minutes % 60,
        seconds % 60,
        millis % 1000
    )
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
/// Calling it twice is harmless.
pub fn init_logging(verbose: bool) {
    Lazy::force(&START_TIME);
    let level = if verbose { "debug" } else { "info" };

    let console = tracing_subscriber::fmt::layer()
        .with_timer(UptimeTimer)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(console)
        .try_init();
}
