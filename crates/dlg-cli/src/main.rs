use tracing_subscriber::EnvFilter;

fn main() {
    // stdout carries the agent protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DLG_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(dlg_cli::run_cli_from_args(std::env::args_os()));
}
