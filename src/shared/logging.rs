use std::io::IsTerminal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize console logging for one-shot CLI tools.
///
/// Logs go to stderr so stdout only carries command output. `RUST_LOG` wins when
/// set; otherwise `verbose` picks between the crate at info and everything at warn.
pub fn init_cli_logging(crate_target: &str, verbose: bool) -> Result<(), anyhow::Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(crate_target, verbose)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()?;

    Ok(())
}

pub fn default_directive(crate_target: &str, verbose: bool) -> String {
    if verbose {
        format!("warn,{crate_target}=info")
    } else {
        "warn".to_string()
    }
}
