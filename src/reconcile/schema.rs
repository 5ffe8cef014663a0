use tracing::{debug, info};

use crate::github::{Field, GatewayError, OptionSpec, ProjectsApi};

/// Canonical status field name. Lookup and provisioning share this constant so
/// option ids resolved later always come from the same field that was created.
pub const STATUS_FIELD: &str = "Status";

/// Names used by earlier revisions of the sync job. Accepted on lookup so
/// boards they provisioned do not grow a second status field.
pub const LEGACY_STATUS_FIELDS: &[&str] = &["Custom Status"];

/// Ordered option set for a freshly created status field.
pub const STATUS_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "Backlog",
        color: "GRAY",
        description: "Queued, not started",
    },
    OptionSpec {
        name: "In Progress",
        color: "YELLOW",
        description: "Actively being worked",
    },
    OptionSpec {
        name: "In Review",
        color: "BLUE",
        description: "Awaiting review or verification",
    },
    OptionSpec {
        name: "Done",
        color: "GREEN",
        description: "Released or closed out",
    },
];

/// Status given to newly mirrored repositories.
pub const DEFAULT_STATUS: &str = "Backlog";

/// Return the board's status field, creating it when absent.
///
/// Existing fields are returned as-is: option drift between the canonical
/// table and what exists remotely is tolerated, not corrected.
pub async fn ensure_status_field(
    api: &dyn ProjectsApi,
    board_id: &str,
) -> Result<Field, GatewayError> {
    let fields = api.list_fields(board_id).await?;
    if let Some(field) = fields.into_iter().find(|f| is_status_name(&f.name)) {
        debug!(board = board_id, field = %field.name, "status field already present");
        return Ok(field);
    }
    info!(board = board_id, field = STATUS_FIELD, "creating status field");
    api.create_status_field(board_id, STATUS_FIELD, STATUS_OPTIONS)
        .await
}

fn is_status_name(name: &str) -> bool {
    name == STATUS_FIELD || LEGACY_STATUS_FIELDS.contains(&name)
}
