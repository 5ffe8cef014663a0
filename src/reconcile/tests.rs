use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::github::{
    Account, BoardItem, BoardSummary, Field, FieldOption, GatewayError, ItemContent, OptionSpec,
    ProjectsApi, RemoteError, Repository,
};
use crate::mapping::MappingStore;

const OWNER_ID: &str = "U_kgDOB0000001";

fn not_found() -> GatewayError {
    GatewayError::Protocol(vec![RemoteError {
        message: "Could not resolve to a node with the global id".into(),
        kind: Some("NOT_FOUND".into()),
    }])
}

fn internal_error() -> GatewayError {
    GatewayError::Protocol(vec![RemoteError {
        message: "Something went wrong".into(),
        kind: Some("INTERNAL".into()),
    }])
}

struct MockBoard {
    id: String,
    owner: String,
    title: String,
    fields: Vec<Field>,
    items: Vec<BoardItem>,
}

#[derive(Default)]
struct RemoteState {
    boards: Vec<MockBoard>,
    /// (board, item, field, option) tuples recorded by set_item_status.
    set_values: Vec<(String, String, String, String)>,
    counter: usize,
}

/// In-memory stand-in for the remote platform. Every mutation goes through the
/// same Mutex-guarded state so assertions can inspect what a run produced.
struct MockApi {
    login: String,
    repos: Vec<Repository>,
    state: Mutex<RemoteState>,
    /// Board titles whose creation should fail, for error-isolation tests.
    fail_board_titles: Vec<String>,
}

impl MockApi {
    fn new(repos: &[&str]) -> Self {
        Self {
            login: "octocat".into(),
            repos: repos
                .iter()
                .enumerate()
                .map(|(i, name)| Repository {
                    id: format!("R_kgDO{i:08}"),
                    name: name.to_string(),
                })
                .collect(),
            state: Mutex::new(RemoteState::default()),
            fail_board_titles: Vec::new(),
        }
    }

    fn failing_board(mut self, title: &str) -> Self {
        self.fail_board_titles.push(title.to_string());
        self
    }

    fn next_id(state: &mut RemoteState, prefix: &str) -> String {
        state.counter += 1;
        format!("{prefix}{:08}", state.counter)
    }

    fn seed_board(&self, title: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state, "PVT_kwDO");
        state.boards.push(MockBoard {
            id: id.clone(),
            owner: OWNER_ID.into(),
            title: title.to_string(),
            fields: Vec::new(),
            items: Vec::new(),
        });
        id
    }

    fn seed_field(&self, board_id: &str, name: &str, option_names: &[&str]) -> Field {
        let mut state = self.state.lock().unwrap();
        let field_id = Self::next_id(&mut state, "PVTSSF_");
        let options = option_names
            .iter()
            .map(|name| {
                let id = Self::next_id(&mut state, "opt_");
                FieldOption {
                    id,
                    name: name.to_string(),
                }
            })
            .collect();
        let field = Field {
            id: field_id,
            name: name.to_string(),
            options,
        };
        let board = state
            .boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .expect("seeding field on unknown board");
        board.fields.push(field.clone());
        field
    }

    fn board_count(&self) -> usize {
        self.state.lock().unwrap().boards.len()
    }

    fn board_id_by_title(&self, title: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .boards
            .iter()
            .find(|b| b.title == title)
            .map(|b| b.id.clone())
    }

    fn field_count(&self, board_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .map(|b| b.fields.len())
            .unwrap_or(0)
    }

    fn item_titles(&self, board_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .map(|b| {
                b.items
                    .iter()
                    .filter_map(|item| match &item.content {
                        Some(ItemContent::Draft { title }) => Some(title.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn recorded_values(&self) -> Vec<(String, String, String, String)> {
        self.state.lock().unwrap().set_values.clone()
    }
}

#[async_trait]
impl ProjectsApi for MockApi {
    async fn viewer(&self) -> Result<Account, GatewayError> {
        Ok(Account {
            id: OWNER_ID.into(),
            login: self.login.clone(),
        })
    }

    async fn user_by_login(&self, login: &str) -> Result<Account, GatewayError> {
        if login == self.login {
            self.viewer().await
        } else {
            Err(not_found())
        }
    }

    async fn list_repositories(&self, _login: &str) -> Result<Vec<Repository>, GatewayError> {
        Ok(self.repos.clone())
    }

    async fn list_boards(&self, owner_id: &str) -> Result<Vec<BoardSummary>, GatewayError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .boards
            .iter()
            .filter(|b| b.owner == owner_id)
            .map(|b| BoardSummary {
                id: b.id.clone(),
                title: b.title.clone(),
            })
            .collect())
    }

    async fn create_board(&self, owner_id: &str, title: &str) -> Result<String, GatewayError> {
        if self.fail_board_titles.iter().any(|t| t == title) {
            return Err(internal_error());
        }
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state, "PVT_kwDO");
        state.boards.push(MockBoard {
            id: id.clone(),
            owner: owner_id.to_string(),
            title: title.to_string(),
            fields: Vec::new(),
            items: Vec::new(),
        });
        Ok(id)
    }

    async fn list_fields(&self, board_id: &str) -> Result<Vec<Field>, GatewayError> {
        let state = self.state.lock().unwrap();
        let board = state
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .ok_or_else(not_found)?;
        Ok(board.fields.clone())
    }

    async fn create_status_field(
        &self,
        board_id: &str,
        name: &str,
        options: &[OptionSpec],
    ) -> Result<Field, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let field_id = Self::next_id(&mut state, "PVTSSF_");
        let options = options
            .iter()
            .map(|spec| {
                let id = Self::next_id(&mut state, "opt_");
                FieldOption {
                    id,
                    name: spec.name.to_string(),
                }
            })
            .collect();
        let field = Field {
            id: field_id,
            name: name.to_string(),
            options,
        };
        let board = state
            .boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(not_found)?;
        board.fields.push(field.clone());
        Ok(field)
    }

    async fn list_items(&self, board_id: &str) -> Result<Vec<BoardItem>, GatewayError> {
        let state = self.state.lock().unwrap();
        let board = state
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .ok_or_else(not_found)?;
        Ok(board.items.clone())
    }

    async fn create_draft_item(
        &self,
        board_id: &str,
        title: &str,
        _body: &str,
    ) -> Result<String, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state, "PVTI_");
        let board = state
            .boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(not_found)?;
        board.items.push(BoardItem {
            id: id.clone(),
            content: Some(ItemContent::Draft {
                title: title.to_string(),
            }),
        });
        Ok(id)
    }

    async fn set_item_status(
        &self,
        board_id: &str,
        item_id: &str,
        field_id: &str,
        option_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        let board = state
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .ok_or_else(not_found)?;
        if !board.items.iter().any(|i| i.id == item_id) {
            return Err(not_found());
        }
        // Option ids are board-scoped: reject any id the field does not carry,
        // like the real platform would.
        let valid = board
            .fields
            .iter()
            .find(|f| f.id == field_id)
            .is_some_and(|f| f.options.iter().any(|o| o.id == option_id));
        if !valid {
            return Err(internal_error());
        }
        state.set_values.push((
            board_id.to_string(),
            item_id.to_string(),
            field_id.to_string(),
            option_id.to_string(),
        ));
        Ok(())
    }
}

fn options() -> SyncOptions {
    SyncOptions {
        login: None,
        master_title: "Master Project".into(),
    }
}

fn store_in(dir: &tempfile::TempDir) -> MappingStore {
    MappingStore::load(dir.path().join("mapping.json")).unwrap()
}

#[tokio::test]
async fn ensure_board_reuses_existing_title() {
    let api = MockApi::new(&[]);
    let seeded = api.seed_board("svc-a Project");

    let id = ensure_board(&api, OWNER_ID, "svc-a Project").await.unwrap();
    assert_eq!(id, seeded);
    assert_eq!(api.board_count(), 1);
}

#[tokio::test]
async fn ensure_board_creates_then_reuses() {
    let api = MockApi::new(&[]);

    let first = ensure_board(&api, OWNER_ID, "svc-a Project").await.unwrap();
    let second = ensure_board(&api, OWNER_ID, "svc-a Project").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(api.board_count(), 1);
}

#[tokio::test]
async fn ensure_board_title_match_is_case_sensitive() {
    let api = MockApi::new(&[]);
    api.seed_board("svc-a project");

    ensure_board(&api, OWNER_ID, "svc-a Project").await.unwrap();
    assert_eq!(api.board_count(), 2);
}

#[tokio::test]
async fn ensure_status_field_is_idempotent() {
    let api = MockApi::new(&[]);
    let board = api.seed_board("svc-a Project");

    let first = ensure_status_field(&api, &board).await.unwrap();
    let second = ensure_status_field(&api, &board).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(api.field_count(&board), 1);
    assert_eq!(first.options.len(), STATUS_OPTIONS.len());
}

#[tokio::test]
async fn ensure_status_field_accepts_legacy_name() {
    let api = MockApi::new(&[]);
    let board = api.seed_board("svc-a Project");
    let legacy = api.seed_field(&board, "Custom Status", &["Backlog", "Done"]);

    let field = ensure_status_field(&api, &board).await.unwrap();
    assert_eq!(field.id, legacy.id);
    assert_eq!(api.field_count(&board), 1);
}

#[tokio::test]
async fn mirrored_flag_flips_after_mirror() {
    let api = MockApi::new(&[]);
    let master = api.seed_board("Master Project");
    let field = ensure_status_field(&api, &master).await.unwrap();

    assert!(!is_repo_mirrored(&api, &master, "svc-a").await.unwrap());
    mirror_repo(&api, &master, &field, "svc-a", DEFAULT_STATUS)
        .await
        .unwrap();
    assert!(is_repo_mirrored(&api, &master, "svc-a").await.unwrap());
}

#[tokio::test]
async fn issue_with_placeholder_title_does_not_count_as_mirrored() {
    let api = MockApi::new(&[]);
    let master = api.seed_board("Master Project");
    {
        let mut state = api.state.lock().unwrap();
        let board = state.boards.iter_mut().find(|b| b.id == master).unwrap();
        board.items.push(BoardItem {
            id: "PVTI_issue01".into(),
            content: Some(ItemContent::Issue {
                title: placeholder_title("svc-a"),
            }),
        });
    }

    assert!(!is_repo_mirrored(&api, &master, "svc-a").await.unwrap());
}

#[tokio::test]
async fn unknown_status_falls_back_to_first_option() {
    let api = MockApi::new(&[]);
    let master = api.seed_board("Master Project");
    let field = ensure_status_field(&api, &master).await.unwrap();

    mirror_repo(&api, &master, &field, "svc-a", "Archived")
        .await
        .unwrap();

    let recorded = api.recorded_values();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].3, field.options[0].id);
}

#[tokio::test]
async fn full_run_from_empty_state() {
    let api = MockApi::new(&["svc-a"]);
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);

    let outcome = run(&api, &mut store, &options()).await.unwrap();
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.failed, 0);

    let master = api.board_id_by_title("Master Project").unwrap();
    let repo_board = api.board_id_by_title("svc-a Project").unwrap();
    assert_eq!(api.board_count(), 2);
    assert_eq!(api.field_count(&master), 1);
    assert_eq!(api.field_count(&repo_board), 1);
    assert_eq!(api.item_titles(&master), vec!["Repository: svc-a"]);

    // The placeholder got the default status, by option id.
    let recorded = api.recorded_values();
    assert_eq!(recorded.len(), 1);
    let master_field = ensure_status_field(&api, &master).await.unwrap();
    let backlog = master_field
        .options
        .iter()
        .find(|o| o.name == DEFAULT_STATUS)
        .unwrap();
    assert_eq!(recorded[0].3, backlog.id);

    // Mapping persisted both ids.
    assert_eq!(store.master_board_id(), Some(master.as_str()));
    assert_eq!(store.repo_board_id("svc-a"), Some(repo_board.as_str()));
    let reloaded = MappingStore::load(dir.path().join("mapping.json")).unwrap();
    assert_eq!(reloaded.mapping(), store.mapping());
}

#[tokio::test]
async fn second_run_creates_nothing_new() {
    let api = MockApi::new(&["svc-a"]);
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);

    run(&api, &mut store, &options()).await.unwrap();
    let boards_after_first = api.board_count();
    let values_after_first = api.recorded_values().len();

    let outcome = run(&api, &mut store, &options()).await.unwrap();
    assert_eq!(outcome.failed, 0);
    assert_eq!(api.board_count(), boards_after_first);
    assert_eq!(api.recorded_values().len(), values_after_first);

    let master = api.board_id_by_title("Master Project").unwrap();
    assert_eq!(api.item_titles(&master).len(), 1);
}

#[tokio::test]
async fn stale_repo_mapping_is_reprovisioned() {
    let api = MockApi::new(&["svc-a"]);
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);
    store.record_repo("svc-a", "PVT_kwDOstale001").unwrap();

    let outcome = run(&api, &mut store, &options()).await.unwrap();
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.failed, 0);

    let repo_board = api.board_id_by_title("svc-a Project").unwrap();
    assert_eq!(store.repo_board_id("svc-a"), Some(repo_board.as_str()));
}

#[tokio::test]
async fn stale_master_mapping_is_reprovisioned() {
    let api = MockApi::new(&[]);
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);
    store.set_master("PVT_kwDOstale001").unwrap();

    run(&api, &mut store, &options()).await.unwrap();

    let master = api.board_id_by_title("Master Project").unwrap();
    assert_eq!(store.master_board_id(), Some(master.as_str()));
}

#[tokio::test]
async fn one_bad_repository_does_not_stop_the_run() {
    let api = MockApi::new(&["bad-repo", "svc-b"]).failing_board("bad-repo Project");
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);

    let outcome = run(&api, &mut store, &options()).await.unwrap();
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.failed, 1);

    assert!(api.board_id_by_title("svc-b Project").is_some());
    assert_eq!(store.repo_board_id("bad-repo"), None);
    assert!(store.repo_board_id("svc-b").is_some());
}

#[tokio::test]
async fn unknown_login_fails_before_touching_boards() {
    let api = MockApi::new(&["svc-a"]);
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(&dir);
    let opts = SyncOptions {
        login: Some("ghost".into()),
        master_title: "Master Project".into(),
    };

    let result = run(&api, &mut store, &opts).await;
    assert!(result.is_err());
    assert_eq!(api.board_count(), 0);
}
