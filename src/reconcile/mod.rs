mod boards;
mod items;
mod schema;

#[cfg(test)]
mod tests;

pub use boards::{ensure_board, repo_board_title};
pub use items::{is_repo_mirrored, mirror_repo, placeholder_title};
pub use schema::{ensure_status_field, DEFAULT_STATUS, STATUS_OPTIONS};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::github::{Field, ProjectsApi};
use crate::mapping::MappingStore;

pub struct SyncOptions {
    /// Account to reconcile; `None` means the token's own account.
    pub login: Option<String>,
    pub master_title: String,
}

#[derive(Debug, Default)]
pub struct Outcome {
    pub processed: usize,
    pub failed: usize,
}

/// Reconcile every repository of the account: a board per repository, a status
/// field on each board, and a placeholder item on the master board.
///
/// Fails only on configuration-grade problems (authentication, master board).
/// Per-repository errors are logged and counted; the run continues.
pub async fn run(
    api: &dyn ProjectsApi,
    store: &mut MappingStore,
    options: &SyncOptions,
) -> Result<Outcome> {
    let account = match &options.login {
        Some(login) => api.user_by_login(login).await,
        None => api.viewer().await,
    }
    .context("authenticating against the remote; check GITHUB_TOKEN")?;
    info!(login = %account.login, "authenticated");

    let (master_id, master_field) =
        ensure_master(api, store, &account.id, &options.master_title).await?;

    let repos = api
        .list_repositories(&account.login)
        .await
        .context("listing repositories")?;
    info!(count = repos.len(), "discovered repositories");

    let mut outcome = Outcome::default();
    for repo in &repos {
        debug!(repo = %repo.name, id = %repo.id, "reconciling repository");
        match sync_repo(api, store, &account.id, &master_id, &master_field, &repo.name).await {
            Ok(()) => outcome.processed += 1,
            Err(err) => {
                error!(repo = %repo.name, error = %format!("{err:#}"), "reconciliation failed; continuing");
                outcome.failed += 1;
            }
        }
    }
    Ok(outcome)
}

/// Resolve the master board and its status field, preferring the cached id.
/// A cached id the remote no longer resolves is dropped and re-provisioned.
async fn ensure_master(
    api: &dyn ProjectsApi,
    store: &mut MappingStore,
    owner_id: &str,
    title: &str,
) -> Result<(String, Field)> {
    if let Some(id) = store.master_board_id().map(str::to_owned) {
        match ensure_status_field(api, &id).await {
            Ok(field) => return Ok((id, field)),
            Err(err) if err.is_not_found() => {
                warn!(board = %id, "cached master board no longer exists; re-provisioning");
            }
            Err(err) => return Err(err).context("ensuring status field on master board"),
        }
    }

    let id = ensure_board(api, owner_id, title)
        .await
        .context("provisioning master board")?;
    store.set_master(&id)?;
    let field = ensure_status_field(api, &id)
        .await
        .context("ensuring status field on master board")?;
    Ok((id, field))
}

async fn sync_repo(
    api: &dyn ProjectsApi,
    store: &mut MappingStore,
    owner_id: &str,
    master_id: &str,
    master_field: &Field,
    repo_name: &str,
) -> Result<()> {
    let board_id = match store.repo_board_id(repo_name).map(str::to_owned) {
        Some(cached) => match ensure_status_field(api, &cached).await {
            Ok(_) => cached,
            Err(err) if err.is_not_found() => {
                warn!(repo = repo_name, board = %cached, "cached board no longer exists; re-provisioning");
                provision_repo_board(api, store, owner_id, repo_name).await?
            }
            Err(err) => return Err(err).context("ensuring status field on repo board"),
        },
        None => provision_repo_board(api, store, owner_id, repo_name).await?,
    };
    debug!(repo = repo_name, board = %board_id, "repo board ready");

    let mirrored = is_repo_mirrored(api, master_id, repo_name)
        .await
        .context("scanning master board items")?;
    if !mirrored {
        let item_id = mirror_repo(api, master_id, master_field, repo_name, DEFAULT_STATUS).await?;
        info!(repo = repo_name, item = %item_id, "mirrored repository onto master board");
    }
    Ok(())
}

async fn provision_repo_board(
    api: &dyn ProjectsApi,
    store: &mut MappingStore,
    owner_id: &str,
    repo_name: &str,
) -> Result<String> {
    let id = ensure_board(api, owner_id, &repo_board_title(repo_name))
        .await
        .context("provisioning repo board")?;
    // Persist immediately so a crash after this point resumes without a
    // duplicate board.
    store.record_repo(repo_name, &id)?;
    ensure_status_field(api, &id)
        .await
        .context("ensuring status field on repo board")?;
    Ok(id)
}
