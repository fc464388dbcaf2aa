//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_target(false)
        .init();
    if let Err(err) = terrane_cli::run() {
        eprintln!("terrane: {err}");
        std::process::exit(1);
    }
}
