use chrono::Local;
use env_logger::{Builder, Env};
use std::io::Write;

/// Timestamped log lines on stderr; `RUST_LOG` overrides the `info` default.
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}
