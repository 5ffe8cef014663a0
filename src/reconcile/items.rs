use anyhow::{Context, Result};
use tracing::warn;

use crate::github::{Field, FieldOption, GatewayError, ItemContent, ProjectsApi};

/// Reserved title pattern for the draft placeholder that mirrors a repository
/// on the master board. Repositories cannot be added as items directly.
pub fn placeholder_title(repo_name: &str) -> String {
    format!("Repository: {repo_name}")
}

/// Whether the master board already carries a placeholder for this repository.
/// Only draft items are considered; issues or pull requests with a colliding
/// title do not count.
pub async fn is_repo_mirrored(
    api: &dyn ProjectsApi,
    master_board_id: &str,
    repo_name: &str,
) -> Result<bool, GatewayError> {
    let wanted = placeholder_title(repo_name);
    let items = api.list_items(master_board_id).await?;
    Ok(items.iter().any(|item| {
        matches!(&item.content, Some(ItemContent::Draft { title }) if *title == wanted)
    }))
}

/// Create the draft placeholder for a repository and set its status.
pub async fn mirror_repo(
    api: &dyn ProjectsApi,
    master_board_id: &str,
    status_field: &Field,
    repo_name: &str,
    status: &str,
) -> Result<String> {
    let option = select_option(status_field, status)?;
    let title = placeholder_title(repo_name);
    let body = format!("Tracks the `{repo_name}` repository's project board.");

    let item_id = api
        .create_draft_item(master_board_id, &title, &body)
        .await
        .context("creating placeholder item")?;
    api.set_item_status(master_board_id, &item_id, &status_field.id, &option.id)
        .await
        .context("setting placeholder status")?;
    Ok(item_id)
}

/// Resolve a status name to an option. An unknown name falls back to the
/// first option so one misnamed status never stalls the whole run; the
/// mislabel is logged rather than silent.
fn select_option<'a>(field: &'a Field, status: &str) -> Result<&'a FieldOption> {
    if let Some(option) = field.options.iter().find(|o| o.name == status) {
        return Ok(option);
    }
    let first = field
        .options
        .first()
        .with_context(|| format!("status field {} has no options", field.name))?;
    warn!(
        requested = status,
        fallback = %first.name,
        field = %field.name,
        "status option not found; falling back to first option"
    );
    Ok(first)
}
