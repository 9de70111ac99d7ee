//! Small shared helpers: logging init, wall-clock stamps, time formatting.

use std::sync::Once;
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_INIT: Once = Once::new();

/// Initialize env_logger once, defaulting to `info` when RUST_LOG is unset.
/// Safe to call repeatedly.
pub fn init_logging() {
    LOG_INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .init();
    });
}

/// Milliseconds since the Unix epoch, for unique export file names.
pub fn epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Format seconds as zero-padded `mm:ss`, flooring sub-second remainder.
pub fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(2.9), "00:02");
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(-3.0), "00:00");
    }

    #[test]
    fn test_epoch_ms_advances() {
        let a = epoch_ms();
        assert!(a > 1_600_000_000_000);
    }
}
