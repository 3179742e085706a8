//! Tracing setup for hosts.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVE: &str = "logivite_client=info";

/// Install a global fmt subscriber. `RUST_LOG` wins over `default_directive`.
///
/// Fails if a global subscriber is already installed.
pub fn init(default_directive: &str) -> anyhow::Result<()> {
    let filter = filter_from_env(EnvFilter::DEFAULT_ENV, default_directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber already installed: {e}"))
}

fn filter_from_env(var: &str, default_directive: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_env(var).or_else(|_| EnvFilter::try_new(default_directive))?)
}

/// [`init`] for tests and examples; a second call is a no-op.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_does_not_panic() {
        init_for_tests();
        init_for_tests();
        assert!(init(DEFAULT_DIRECTIVE).is_err());
    }

    #[test]
    fn test_directive_from_dotenv_file_wins_over_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "LOGIVITE_TELEMETRY_TEST_LOG=logivite_client=trace\n").unwrap();
        dotenvy::from_path(&path).unwrap();

        let filter = filter_from_env("LOGIVITE_TELEMETRY_TEST_LOG", "warn").unwrap();
        assert!(filter.to_string().contains("logivite_client=trace"));

        let fallback = filter_from_env("LOGIVITE_TELEMETRY_UNSET_LOG", "warn").unwrap();
        assert_eq!(fallback.to_string(), "warn");
    }
}
