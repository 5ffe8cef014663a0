mod cli;
mod config;
mod github;
mod mapping;
mod reconcile;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boardsync=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = cli::parse_args(&args)?;
    if parsed.help {
        cli::print_help();
        return Ok(());
    }

    // Configuration problems are the only fatal exits; everything past this
    // point is best-effort per repository.
    let mut config = config::Config::from_env()?;
    if let Some(path) = parsed.mapping {
        config.mapping_path = path;
    }
    if let Some(master) = parsed.master {
        config.master_title = master;
    }
    if let Some(login) = parsed.login {
        config.login = Some(login);
    }

    let mut store = mapping::MappingStore::load(&config.mapping_path)?;
    info!(
        path = %config.mapping_path.display(),
        known_repos = store.mapping().repos.len(),
        "mapping loaded"
    );
    let api = github::GithubProjects::new(&config.token);
    let options = reconcile::SyncOptions {
        login: config.login.clone(),
        master_title: config.master_title.clone(),
    };

    let outcome = reconcile::run(&api, &mut store, &options).await?;
    info!(
        processed = outcome.processed,
        failed = outcome.failed,
        "run complete"
    );
    Ok(())
}
