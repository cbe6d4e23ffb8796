use accounts_logger::{LevelFilter, Logger, LoggerError};

#[test]
fn second_init_is_rejected() {
    let logger = Logger::builder()
        .name("accounts-init-twice")
        .level(LevelFilter::INFO)
        .init()
        .expect("first init should succeed");
    assert!(!logger.writes_to_file(), "console-only logger has no file writer");

    let err = Logger::builder()
        .name("accounts-init-twice-again")
        .init()
        .expect_err("second init should fail");

    assert!(matches!(err, LoggerError::Subscriber { .. }));
}
