//! Console logging
//! One line per record with a local timestamp; `RUST_LOG` overrides the level.

use std::io::Write;

use chrono::Local;
use log::LevelFilter;

/// Installs the console logger. Later calls are ignored.
pub fn init(level: LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::debug!("Logging initialized at {}", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init(LevelFilter::Info);
        init(LevelFilter::Debug);
        log::info!("still logging");
    }
}
