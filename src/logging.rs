/*
================================================================================
                            hdf5vis Logging
================================================================================

- `setup_logger()`: console logger on top of `env_logger`
- `setup_panic_hook()`: writes panics with a backtrace to panic.log and stderr
- `open_in_file_explorer()`: shows a directory in the platform file browser

**Log Levels**:
- Debug builds: Shows DEBUG and above
- Release builds: Shows INFO and above (unless RUST_LOG is set)

**File Locations**:
- Panic log: `<data dir>/hdf5vis/logs/panic.log` (data dir from the dirs crate)

================================================================================
*/

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;
use env_logger::fmt::{Color, Formatter};
use log::{Level, LevelFilter, Record};

#[allow(unused_imports)]
use log::{debug, error, info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn setup_logger(app_name: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let logger = build_logger(app_name, rust_log.as_deref());
    let max_level = logger.filter();

    match log::set_boxed_logger(Box::new(logger)) {
        Ok(()) => log::set_max_level(max_level),
        Err(e) => eprintln!("Failed to set logger: {e}"),
    }
}

/// Console logger for `RUST_LOG`-style `filters`, or the build's defaults without them.
fn build_logger(app_name: &str, filters: Option<&str>) -> env_logger::Logger {
    let mut builder = env_logger::Builder::new();

    match filters {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            let level = if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Info };
            builder.filter(Some(app_name), level);
            // Filter out all other crates' logs
            builder.filter(None, LevelFilter::Off);
        }
    }

    builder.format(|buf: &mut Formatter, record: &Record| {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT);

        let module_info = match (record.module_path(), record.line()) {
            (Some(module), Some(line)) => format!("{module}:{line}"),
            (Some(module), None) => module.to_string(),
            (None, Some(line)) => format!("line:{line}"),
            (None, None) => "unknown".to_string(),
        };

        let mut level_style = buf.style();
        let mut meta_style = buf.style();

        match record.level() {
            Level::Error => level_style.set_color(Color::Red).set_bold(true),
            Level::Warn => level_style.set_color(Color::Yellow).set_bold(true),
            Level::Info => level_style.set_color(Color::Green).set_bold(true),
            Level::Debug => level_style.set_color(Color::Blue).set_bold(true),
            Level::Trace => level_style.set_color(Color::White),
        };

        // Color::Rgb does not render on the macOS terminal
        #[cfg(target_os = "macos")]
        meta_style.set_color(Color::Blue);
        #[cfg(not(target_os = "macos"))]
        meta_style.set_color(Color::Rgb(120, 120, 120));

        writeln!(
            buf,
            "{} {} {} {}",
            meta_style.value(timestamp),
            level_style.value(record.level()),
            meta_style.value(module_info),
            record.args()
        )
    });

    builder.build()
}

pub fn get_log_directory(app_name: &str) -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(app_name).join("logs")
}

pub fn setup_panic_hook(app_name: &str) {
    let log_file_path = get_log_directory(app_name).join("panic.log");
    if let Err(e) = fs::create_dir_all(get_log_directory(app_name)) {
        warn!("Failed to create log directory: {}", e);
    }

    panic::set_hook(Box::new(move |info| {
        let backtrace = backtrace::Backtrace::new();
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT);

        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        let header_msg = format!("[PANIC] at {location} - {info}");
        let backtrace_lines: Vec<String> = format!("{backtrace:?}")
            .lines()
            .map(|line| format!("[BACKTRACE] {}", line.trim()))
            .collect();

        eprintln!("\n\n{header_msg}");
        eprintln!("[PANIC] Backtrace:");
        for line in &backtrace_lines {
            eprintln!("{line}");
        }

        let written = write_panic_log(&log_file_path, &timestamp.to_string(), &header_msg, &backtrace_lines);
        match written {
            Ok(()) => eprintln!("\nA complete crash log has been written to: {}", log_file_path.display()),
            Err(e) => eprintln!("\nFailed to write crash log {}: {e}", log_file_path.display()),
        }
    }));
}

fn write_panic_log(path: &Path, timestamp: &str, header: &str, backtrace_lines: &[String]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    writeln!(file, "{timestamp} {header}")?;
    writeln!(file, "{timestamp} [PANIC] Backtrace:")?;
    for line in backtrace_lines {
        writeln!(file, "{timestamp} {line}")?;
    }
    Ok(())
}

pub fn open_in_file_explorer(path: &str) {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "linux") {
        // Works with most desktop environments
        "xdg-open"
    } else {
        error!("Opening directories is not supported on this OS.");
        return;
    };

    match Command::new(program).arg(path).spawn() {
        Ok(_) => info!("Opened {} with {}", path, program),
        Err(e) => error!("Failed to open {} with {}: {}", path, program, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        use log::Log;
        logger.enabled(&log::Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn test_bare_rust_log_level_is_honored() {
        let logger = build_logger("hdf5vis", Some("info"));
        assert_eq!(logger.filter(), LevelFilter::Info);
        assert!(enabled(&logger, "hdf5vis::render", Level::Warn));

        let logger = build_logger("hdf5vis", Some("warn"));
        assert_ne!(logger.filter(), LevelFilter::Off);
        assert!(enabled(&logger, "hdf5vis::main", Level::Error));
        assert!(!enabled(&logger, "hdf5vis::main", Level::Info));
    }

    #[test]
    fn test_default_filter_is_app_only() {
        let logger = build_logger("hdf5vis", None);
        assert!(enabled(&logger, "hdf5vis::render", Level::Info));
        assert!(!enabled(&logger, "hdf5", Level::Error));

        let logger = build_logger("hdf5vis", Some("hdf5vis=info"));
        assert!(enabled(&logger, "hdf5vis::render", Level::Warn));
    }

    #[test]
    fn test_log_directory_is_per_app() {
        let dir = get_log_directory("hdf5vis");
        assert!(dir.ends_with(Path::new("hdf5vis").join("logs")));
    }

    #[test]
    fn test_panic_log_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panic.log");
        let lines = vec!["[BACKTRACE] frame 0".to_string()];

        write_panic_log(&path, "2024-01-01T00:00:00Z", "[PANIC] at main.rs:1 - boom", &lines).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("2024-01-01T00:00:00Z [PANIC] at main.rs:1 - boom\n"));
        assert!(text.contains("[BACKTRACE] frame 0"));
    }
}
