use std::path::Path;

pub fn setup_console_log() {
    setup_log(None);
}

/// Console log always, plus a daily rolling file under `log_dir` when given.
pub fn setup_log(log_dir: Option<&Path>) {
    use std::io;
    use tracing_subscriber::{prelude::*, EnvFilter};

    let mut layers = vec![tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(io::stdout)
        .boxed()];

    if let Some(dir) = log_dir {
        let file_appender = tracing_appender::rolling::daily(dir, "foodgram.log");
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_appender)
                .boxed(),
        );
    }

    // A subscriber may already be installed, e.g. by the test constructor.
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(EnvFilter::from_default_env())
        .try_init();
}
