//! Log output setup.
//!
//! `LOG_LEVEL` takes any `EnvFilter` directive string; without it the exam
//! workflow logs at debug and everything else at info. `LOG_FORMAT=json`
//! switches to one JSON object per line for log shippers.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,exam=debug,mockexam_backend=debug,tower_http=info,axum=info";

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}
