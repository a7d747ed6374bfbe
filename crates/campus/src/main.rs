mod cli;
mod commands;
mod error;
mod lock;
mod logging;
mod settings;

use std::process::ExitCode;
use std::time::Duration;

use campus_core::{Collaborators, ConfigurationManager, ManagerOptions};
use campus_platform::AppPaths;
use clap::Parser;

use cli::{Cli, Command};
use error::AppError;
use settings::AppSettings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let paths = match cli.data_dir {
        Some(dir) => AppPaths::under(dir),
        None => AppPaths::new().map_err(AppError::environment_unavailable)?,
    };
    paths
        .ensure_dirs()
        .map_err(AppError::environment_unavailable)?;

    let mut settings = AppSettings::load(&paths);
    if !paths.settings_file().exists()
        && let Err(error) = settings.save(&paths)
    {
        eprintln!("warning: could not write default settings: {error}");
    }
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(app_version) = cli.app_version {
        settings.app_version = app_version;
    }

    logging::init_logging(
        &paths,
        cli.verbose || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    log::debug!(
        "Using config server {} for app version {}",
        settings.server_url,
        settings.app_version
    );

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .user_agent(format!("campus/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default();

    let mut options = ManagerOptions::from_paths(&paths, settings.app_version.clone());
    options.clear_config_on_start = settings.clear_config_on_start;
    let manager = ConfigurationManager::new(
        Collaborators::local(&paths, &http_client, settings.server_url.clone()),
        options,
    );

    let result = match &cli.command {
        Command::Status => commands::status(&manager, &paths).await,
        Command::Check => commands::check(&manager).await,
        Command::Update => commands::update(&manager, &paths).await,
        Command::Show { file } => commands::show(&manager, file).await,
        Command::Reset => commands::reset(&manager).await,
    };

    manager.shutdown().await;
    result
}
