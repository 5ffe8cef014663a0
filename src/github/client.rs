use serde::Deserialize;
use serde_json::{json, Value};

use super::gateway::{GatewayError, GraphqlGateway};
use super::{
    Account, BoardItem, BoardSummary, Field, FieldOption, ItemContent, OptionSpec, ProjectsApi,
    Repository,
};
use async_trait::async_trait;

const BOARDS_PAGE: u32 = 100;
const FIELDS_PAGE: u32 = 50;
const ITEMS_PAGE: u32 = 100;
const REPOS_PAGE: u32 = 100;

const VIEWER_QUERY: &str = r#"query {
  viewer { id login }
}"#;

const USER_QUERY: &str = r#"query($login: String!) {
  user(login: $login) { id login }
}"#;

const REPOSITORIES_QUERY: &str = r#"query($login: String!, $first: Int!, $cursor: String) {
  user(login: $login) {
    repositories(first: $first, after: $cursor, ownerAffiliations: OWNER) {
      nodes { id name }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

const BOARDS_QUERY: &str = r#"query($owner: ID!, $first: Int!, $cursor: String) {
  node(id: $owner) {
    ... on User {
      projectsV2(first: $first, after: $cursor) {
        nodes { id title }
        pageInfo { hasNextPage endCursor }
      }
    }
    ... on Organization {
      projectsV2(first: $first, after: $cursor) {
        nodes { id title }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}"#;

const CREATE_BOARD_MUTATION: &str = r#"mutation($owner: ID!, $title: String!) {
  createProjectV2(input: { ownerId: $owner, title: $title }) {
    projectV2 { id }
  }
}"#;

const FIELDS_QUERY: &str = r#"query($board: ID!, $first: Int!) {
  node(id: $board) {
    ... on ProjectV2 {
      fields(first: $first) {
        nodes {
          ... on ProjectV2FieldCommon { id name dataType }
          ... on ProjectV2SingleSelectField { id name dataType options { id name } }
        }
      }
    }
  }
}"#;

const CREATE_FIELD_MUTATION: &str = r#"mutation($board: ID!, $name: String!, $options: [ProjectV2SingleSelectFieldOptionInput!]) {
  createProjectV2Field(input: {
    projectId: $board,
    dataType: SINGLE_SELECT,
    name: $name,
    singleSelectOptions: $options
  }) {
    projectV2Field {
      ... on ProjectV2SingleSelectField { id name dataType options { id name } }
    }
  }
}"#;

const ITEMS_QUERY: &str = r#"query($board: ID!, $first: Int!, $cursor: String) {
  node(id: $board) {
    ... on ProjectV2 {
      items(first: $first, after: $cursor) {
        nodes {
          id
          content {
            __typename
            ... on DraftIssue { title }
            ... on Issue { title }
            ... on PullRequest { title }
          }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}"#;

const CREATE_DRAFT_MUTATION: &str = r#"mutation($board: ID!, $title: String!, $body: String!) {
  addProjectV2DraftIssue(input: { projectId: $board, title: $title, body: $body }) {
    projectItem { id }
  }
}"#;

const SET_STATUS_MUTATION: &str = r#"mutation($board: ID!, $item: ID!, $field: ID!, $option: String!) {
  updateProjectV2ItemFieldValue(input: {
    projectId: $board,
    itemId: $item,
    fieldId: $field,
    value: { singleSelectOptionId: $option }
  }) {
    projectV2Item { id }
  }
}"#;

// ---- response shapes, decoded once at this boundary ----

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct AccountNode {
    id: String,
    login: String,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: AccountNode,
}

#[derive(Deserialize)]
struct UserData<T> {
    user: Option<T>,
}

#[derive(Deserialize)]
struct NodeData<T> {
    node: Option<T>,
}

#[derive(Deserialize)]
struct RepositoriesPage {
    repositories: Connection<RepositoryNode>,
}

#[derive(Deserialize)]
struct RepositoryNode {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct BoardsPage {
    #[serde(rename = "projectsV2")]
    projects: Connection<BoardNode>,
}

#[derive(Deserialize)]
struct BoardNode {
    id: String,
    title: String,
}

#[derive(Deserialize)]
struct CreateBoardData {
    #[serde(rename = "createProjectV2")]
    create: CreatedBoard,
}

#[derive(Deserialize)]
struct CreatedBoard {
    #[serde(rename = "projectV2")]
    board: IdNode,
}

#[derive(Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Deserialize)]
struct FieldsPage {
    fields: FieldNodes,
}

#[derive(Deserialize)]
struct FieldNodes {
    nodes: Vec<FieldNode>,
}

#[derive(Deserialize)]
struct FieldNode {
    id: String,
    name: String,
    #[serde(rename = "dataType")]
    data_type: String,
    #[serde(default)]
    options: Option<Vec<OptionNode>>,
}

#[derive(Deserialize)]
struct OptionNode {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct CreateFieldData {
    #[serde(rename = "createProjectV2Field")]
    create: CreatedField,
}

#[derive(Deserialize)]
struct CreatedField {
    #[serde(rename = "projectV2Field")]
    field: FieldNode,
}

#[derive(Deserialize)]
struct ItemsPage {
    items: Connection<ItemNode>,
}

#[derive(Deserialize)]
struct ItemNode {
    id: String,
    content: Option<ContentNode>,
}

#[derive(Deserialize)]
#[serde(tag = "__typename")]
enum ContentNode {
    DraftIssue { title: String },
    Issue { title: String },
    PullRequest { title: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct CreateDraftData {
    #[serde(rename = "addProjectV2DraftIssue")]
    create: CreatedDraft,
}

#[derive(Deserialize)]
struct CreatedDraft {
    #[serde(rename = "projectItem")]
    item: IdNode,
}

fn into_field(node: FieldNode) -> Option<Field> {
    if node.data_type != "SINGLE_SELECT" {
        return None;
    }
    let options = node
        .options
        .unwrap_or_default()
        .into_iter()
        .map(|o| FieldOption {
            id: o.id,
            name: o.name,
        })
        .collect();
    Some(Field {
        id: node.id,
        name: node.name,
        options,
    })
}

fn into_item(node: ItemNode) -> BoardItem {
    let content = match node.content {
        Some(ContentNode::DraftIssue { title }) => Some(ItemContent::Draft { title }),
        Some(ContentNode::Issue { title }) => Some(ItemContent::Issue { title }),
        Some(ContentNode::PullRequest { title }) => Some(ItemContent::PullRequest { title }),
        Some(ContentNode::Other) | None => None,
    };
    BoardItem {
        id: node.id,
        content,
    }
}

/// GitHub Projects v2 over the GraphQL gateway.
pub struct GithubProjects {
    gateway: GraphqlGateway,
}

impl GithubProjects {
    pub fn new(token: &str) -> Self {
        Self {
            gateway: GraphqlGateway::new(token),
        }
    }
}

fn missing(what: &str) -> GatewayError {
    GatewayError::Schema(format!("{what} missing from response"))
}

#[async_trait]
impl ProjectsApi for GithubProjects {
    async fn viewer(&self) -> Result<Account, GatewayError> {
        let data: ViewerData = self.gateway.execute(VIEWER_QUERY, json!({})).await?;
        Ok(Account {
            id: data.viewer.id,
            login: data.viewer.login,
        })
    }

    async fn user_by_login(&self, login: &str) -> Result<Account, GatewayError> {
        let data: UserData<AccountNode> = self
            .gateway
            .execute(USER_QUERY, json!({ "login": login }))
            .await?;
        let user = data.user.ok_or_else(|| missing("user"))?;
        Ok(Account {
            id: user.id,
            login: user.login,
        })
    }

    async fn list_repositories(&self, login: &str) -> Result<Vec<Repository>, GatewayError> {
        let mut repos = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let variables = json!({ "login": login, "first": REPOS_PAGE, "cursor": cursor });
            let data: UserData<RepositoriesPage> =
                self.gateway.execute(REPOSITORIES_QUERY, variables).await?;
            let page = data.user.ok_or_else(|| missing("user"))?.repositories;
            repos.extend(page.nodes.into_iter().map(|r| Repository {
                id: r.id,
                name: r.name,
            }));
            if !page.page_info.has_next_page {
                return Ok(repos);
            }
            cursor = page.page_info.end_cursor;
        }
    }

    async fn list_boards(&self, owner_id: &str) -> Result<Vec<BoardSummary>, GatewayError> {
        let mut boards = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let variables = json!({ "owner": owner_id, "first": BOARDS_PAGE, "cursor": cursor });
            let data: NodeData<BoardsPage> = self.gateway.execute(BOARDS_QUERY, variables).await?;
            let page = data.node.ok_or_else(|| missing("owner node"))?.projects;
            boards.extend(page.nodes.into_iter().map(|b| BoardSummary {
                id: b.id,
                title: b.title,
            }));
            if !page.page_info.has_next_page {
                return Ok(boards);
            }
            cursor = page.page_info.end_cursor;
        }
    }

    async fn create_board(&self, owner_id: &str, title: &str) -> Result<String, GatewayError> {
        let variables = json!({ "owner": owner_id, "title": title });
        let data: CreateBoardData = self
            .gateway
            .execute(CREATE_BOARD_MUTATION, variables)
            .await?;
        Ok(data.create.board.id)
    }

    async fn list_fields(&self, board_id: &str) -> Result<Vec<Field>, GatewayError> {
        // Single page by design: boards carry far fewer than 50 fields.
        let variables = json!({ "board": board_id, "first": FIELDS_PAGE });
        let data: NodeData<FieldsPage> = self.gateway.execute(FIELDS_QUERY, variables).await?;
        let page = data.node.ok_or_else(|| missing("board node"))?;
        Ok(page.fields.nodes.into_iter().filter_map(into_field).collect())
    }

    async fn create_status_field(
        &self,
        board_id: &str,
        name: &str,
        options: &[OptionSpec],
    ) -> Result<Field, GatewayError> {
        let option_inputs: Vec<Value> = options
            .iter()
            .map(|o| json!({ "name": o.name, "color": o.color, "description": o.description }))
            .collect();
        let variables = json!({ "board": board_id, "name": name, "options": option_inputs });
        let data: CreateFieldData = self
            .gateway
            .execute(CREATE_FIELD_MUTATION, variables)
            .await?;
        into_field(data.create.field).ok_or_else(|| missing("single-select field"))
    }

    async fn list_items(&self, board_id: &str) -> Result<Vec<BoardItem>, GatewayError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let variables = json!({ "board": board_id, "first": ITEMS_PAGE, "cursor": cursor });
            let data: NodeData<ItemsPage> = self.gateway.execute(ITEMS_QUERY, variables).await?;
            let page = data.node.ok_or_else(|| missing("board node"))?.items;
            items.extend(page.nodes.into_iter().map(into_item));
            if !page.page_info.has_next_page {
                return Ok(items);
            }
            cursor = page.page_info.end_cursor;
        }
    }

    async fn create_draft_item(
        &self,
        board_id: &str,
        title: &str,
        body: &str,
    ) -> Result<String, GatewayError> {
        let variables = json!({ "board": board_id, "title": title, "body": body });
        let data: CreateDraftData = self
            .gateway
            .execute(CREATE_DRAFT_MUTATION, variables)
            .await?;
        Ok(data.create.item.id)
    }

    async fn set_item_status(
        &self,
        board_id: &str,
        item_id: &str,
        field_id: &str,
        option_id: &str,
    ) -> Result<(), GatewayError> {
        let variables = json!({
            "board": board_id,
            "item": item_id,
            "field": field_id,
            "option": option_id,
        });
        let _: Value = self.gateway.execute(SET_STATUS_MUTATION, variables).await?;
        Ok(())
    }
}
