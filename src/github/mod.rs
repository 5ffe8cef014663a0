pub mod client;
pub mod gateway;

pub use client::GithubProjects;
pub use gateway::{GatewayError, RemoteError};

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub login: String,
}

#[derive(Debug, Clone)]
pub struct Repository {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct BoardSummary {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

/// A single-select field with its options. Option ids are board-scoped;
/// setting a value requires the id, names alone are insufficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub options: Vec<FieldOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    Draft { title: String },
    Issue { title: String },
    PullRequest { title: String },
}

#[derive(Debug, Clone)]
pub struct BoardItem {
    pub id: String,
    pub content: Option<ItemContent>,
}

/// Metadata for one option when a status field is created.
pub struct OptionSpec {
    pub name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

/// The remote operations the reconciler needs, decoded into typed values at
/// this boundary so nothing downstream touches raw JSON.
#[async_trait]
pub trait ProjectsApi: Send + Sync {
    async fn viewer(&self) -> Result<Account, GatewayError>;
    async fn user_by_login(&self, login: &str) -> Result<Account, GatewayError>;
    async fn list_repositories(&self, login: &str) -> Result<Vec<Repository>, GatewayError>;
    async fn list_boards(&self, owner_id: &str) -> Result<Vec<BoardSummary>, GatewayError>;
    async fn create_board(&self, owner_id: &str, title: &str) -> Result<String, GatewayError>;
    /// Single-select fields only; other field kinds are dropped at decode time.
    async fn list_fields(&self, board_id: &str) -> Result<Vec<Field>, GatewayError>;
    async fn create_status_field(
        &self,
        board_id: &str,
        name: &str,
        options: &[OptionSpec],
    ) -> Result<Field, GatewayError>;
    async fn list_items(&self, board_id: &str) -> Result<Vec<BoardItem>, GatewayError>;
    async fn create_draft_item(
        &self,
        board_id: &str,
        title: &str,
        body: &str,
    ) -> Result<String, GatewayError>;
    async fn set_item_status(
        &self,
        board_id: &str,
        item_id: &str,
        field_id: &str,
        option_id: &str,
    ) -> Result<(), GatewayError>;
}
