use accounts_logger::{LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn file_layer_writes_rolling_log() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let directory = tmp.path().join("logs");

    let logger = Logger::builder()
        .name("accounts-file-logging")
        .console(false)
        .directory(&directory)
        .json(true)
        .level(LevelFilter::INFO)
        .init()?;
    assert!(logger.writes_to_file());

    tracing::info!(user_id = "u-1", "session created");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&directory)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("a log file should be created");

    let contents = fs::read_to_string(log_file)?;
    assert!(contents.contains("session created"));
    assert!(contents.trim_start().starts_with('{'), "json output expected");
    Ok(())
}
