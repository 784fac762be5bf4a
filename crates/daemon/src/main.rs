// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Deploy, Health, Id, Init, Keygen, Remove, Serve, Version};
use depot_daemon::process::LoggingConfig;

command_enum! {
    (Deploy, Deploy),
    (Health, Health),
    (Id, Id),
    (Init, Init),
    (Keygen, Keygen),
    (Remove, Remove),
    (Serve, Serve),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let ctx = cli::op::OpContext::new(
        args.config_path,
        LoggingConfig {
            log_level: args.log_level,
            log_dir: args.log_dir,
        },
    );

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
