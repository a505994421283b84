//! Logging initialization for the CLI.
//!
//! Logging is owned by the CLI crate; the parser library only emits
//! `tracing` events. Everything goes to stderr so stdout stays reserved for
//! ESTree and `--json` output.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber. `verbosity` counts `-v` flags: none
/// logs warnings, one adds per-file results, two traces the parser.
///
/// With `json` each event is one line on stderr:
/// ```json
/// {"timestamp":"...","level":"INFO","fields":{"message":"parsed","file":"a.js","statements":3},"target":"esparse"}
/// ```
///
/// `RUST_LOG` is honored; the verbosity flag raises the level of the
/// `esparse` targets on top of it.
pub fn init(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Ok(directive) = format!("esparse={level}").parse() {
        filter = filter.add_directive(directive);
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
