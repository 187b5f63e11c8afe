use clap::Parser;
use log::error;
use neko_relay::cli::{run, Args};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(args).await {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
