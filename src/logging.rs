/// Per-run log file.
///
/// Every run writes `logs/runtime_<YYYY-mm-dd_HH-MM-SS>.log`. Nothing goes
/// to the terminal: the screen belongs to the renderer while the game runs.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use chrono::Local;
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

pub const LOG_DIR: &str = "logs";

/// Handle kept alive for the whole run so shutdown can report the runtime.
pub struct LogSession {
    started: Instant,
}

impl LogSession {
    /// Write the shutdown lines.
    pub fn finish(self) {
        let secs = self.started.elapsed().as_secs_f64();
        log::info!("Program shutting down");
        log::info!("Runtime: {:.2} seconds", secs);
    }
}

pub fn log_file_name() -> String {
    format!("runtime_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

/// Create the log file under `dir` and install it as the global logger.
pub fn init(dir: &Path, level: LevelFilter) -> io::Result<LogSession> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name());
    let file = File::create(&path)?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file)
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))?;

    log::info!("Program started, logging to {}", path.display());
    Ok(LogSession { started: Instant::now() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_carries_timestamp() {
        let name = log_file_name();
        assert!(name.starts_with("runtime_"));
        assert!(name.ends_with(".log"));
        // runtime_ + YYYY-mm-dd_HH-MM-SS + .log
        assert_eq!(name.len(), 8 + 19 + 4);
    }
}
