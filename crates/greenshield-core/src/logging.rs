//! Logging setup and redaction helpers.
//!
//! The core only emits `tracing` events; installing a subscriber is left to the
//! binary that embeds it.

use tracing_subscriber::EnvFilter;

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbosity`
/// (0 = warn, 1 = info, 2 = debug, 3+ = trace). Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Returns a masked version of a token for display (first 6 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= 10 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token_hides_short_tokens() {
        assert_eq!(mask_token("abc123"), "***");
    }

    #[test]
    fn test_mask_token_keeps_prefix_only() {
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbG...");
    }
}
