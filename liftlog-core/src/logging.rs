//! Logger wiring for binaries and tests. The library itself only logs
//! through the `log` facade; nothing here runs unless a host asks for it.

use log::LevelFilter;
use std::io::Write;

pub fn init(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}: {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stdout)
        .filter_level(level);

    let _ = builder.try_init();

    log::set_max_level(level);
}

/// Parse a level name; returns false (and touches nothing) on junk input.
pub fn init_from_str(level: &str) -> bool {
    let level = match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return false,
    };
    init(level);
    true
}
