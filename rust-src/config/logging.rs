//! Logger initialization.

use std::io::Write;

use log::LevelFilter;


/// Initialize `env_logger`.
///
/// `RUST_LOG` is honoured when set (default `info`); an explicit `level`
/// from the command line takes precedence over both.
pub fn init_logger(level: Option<LevelFilter>) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(level) = level {
        builder.filter_level(level);
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        )
    });

    // A second call (tests) keeps the first logger
    let _ = builder.try_init();
}
