use rask_log_shipper::app::{LogFormat, LogLevel, setup_logging};
use rask_log_shipper::app::logging::build_filter_string;

#[test]
fn test_logging_setup_is_idempotent() {
    let first = setup_logging(LogLevel::Info, LogFormat::Compact);
    let second = setup_logging(LogLevel::Debug, LogFormat::Json);

    assert!(first.is_ok(), "first initialization should succeed");
    assert!(second.is_ok(), "repeated initialization should be a no-op");

    tracing::info!("logging initialized");
}

#[test]
fn test_filter_string_covers_every_level() {
    for level in [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ] {
        let filter = build_filter_string(level);
        assert!(filter.starts_with(level.as_str()));
        assert!(filter.contains("rustls=warn"));
    }
}
