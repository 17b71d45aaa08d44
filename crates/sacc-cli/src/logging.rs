//! Tracing subscriber setup for the `saccjade` binary.
//!
//! `RUST_LOG` overrides the level given on the command line. Setting
//! `SACCJADE_LOG_JSON` to `1` or `true` switches to JSON lines, as does
//! `--json-logs`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const JSON_ENV_VAR: &str = "SACCJADE_LOG_JSON";

/// Install the global subscriber. Fails if one is already installed.
pub fn setup_logging(json: bool, default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

/// Whether JSON output was requested through the environment.
pub fn should_use_json() -> bool {
    json_flag(std::env::var(JSON_ENV_VAR).ok().as_deref())
}

fn json_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
