mod cli;
mod commands;
mod ui;

use ccpkg::config::Config;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    let code = match cli.command {
        Commands::List { platform, all } => commands::list::list(&config, platform, all).await?,
        Commands::Versions { platform, sap_code } => {
            commands::versions::versions(&config, platform, &sap_code).await?
        }
        Commands::Download {
            platform,
            sap_code,
            version,
            language,
            destination,
            dry_run,
            no_driver,
            jobs,
        } => {
            let options = commands::download::DownloadOptions {
                platform,
                sap_code,
                version,
                language,
                destination,
                dry_run,
                no_driver,
                jobs,
            };
            commands::download::download(&config, options).await?
        }
    };

    std::process::exit(code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
