use tracing::{debug, info};

use crate::github::{GatewayError, ProjectsApi};

/// Title given to a repository's own board.
pub fn repo_board_title(repo_name: &str) -> String {
    format!("{repo_name} Project")
}

/// Return the id of the owner's board with this exact title, creating one when
/// none exists. Matching is case-sensitive and exact.
///
/// Not transactional: a concurrent writer between the listing and the create
/// can still duplicate a title. The remote enforces no uniqueness, so this
/// stays best-effort.
pub async fn ensure_board(
    api: &dyn ProjectsApi,
    owner_id: &str,
    title: &str,
) -> Result<String, GatewayError> {
    let boards = api.list_boards(owner_id).await?;
    if let Some(board) = boards.into_iter().find(|b| b.title == title) {
        debug!(title, board = %board.id, "reusing existing board");
        return Ok(board.id);
    }
    info!(title, "creating board");
    api.create_board(owner_id, title).await
}
