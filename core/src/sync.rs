//! Client-side mirror of the server list.
//!
//! # Overview
//! `ListState` is the only place the front end keeps list state. It holds a
//! read-through copy of every item on the server (the mirror), the selected
//! category filter and the draft text of the next item. Its methods are the
//! only way to change that state.
//!
//! # Design
//! - The mirror has no authority of its own. Every successful mutation ends
//!   with `refresh`, which replaces the mirror wholesale with a fresh,
//!   unfiltered listing and recomputes the active count for the filter.
//! - A failed request is logged and reported as `Outcome::Failed`; the
//!   mirror is left as it was and nothing is retried.
//! - Guards that block an action before any request is sent (empty draft,
//!   `All` as a create category, nothing to delete) come back as
//!   `Outcome::Notice`.
//! - `toggle` deletes the item when the *update response* says
//!   `completed == false`, which is the completed-to-active transition.
//!   Checking an item leaves it on the list as completed.

use std::fmt;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{CategoryFilter, CreateItem, Item, ItemId, UpdateItem};

/// A user-visible warning raised before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Empty draft, or the filter is `All` so no category can be assigned.
    InvalidDraft,
    /// The current view has no items to delete.
    NothingToDelete,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::InvalidDraft => f.write_str("Please select a valid category and enter a task."),
            Notice::NothingToDelete => f.write_str("No tasks to delete."),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// Every request succeeded and the mirror was refreshed.
    Applied,
    Notice(Notice),
    /// The user declined the confirmation prompt.
    Cancelled,
    /// A request failed; the mirror was not refreshed.
    Failed(ApiError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

pub struct ListState<T> {
    client: TodoClient,
    transport: T,
    mirror: Vec<Item>,
    filter: CategoryFilter,
    draft_text: String,
    active_count: usize,
}

impl<T: Transport> ListState<T> {
    /// Empty state with the `All` filter. Call `refresh` to populate it.
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self {
            client,
            transport,
            mirror: Vec::new(),
            filter: CategoryFilter::All,
            draft_text: String::new(),
            active_count: 0,
        }
    }

    /// Every item on the server as of the last successful refresh.
    pub fn items(&self) -> &[Item] {
        &self.mirror
    }

    /// Mirror items in the selected category, completed ones included.
    pub fn visible_items(&self) -> impl Iterator<Item = &Item> + '_ {
        let filter = self.filter;
        self.mirror.iter().filter(move |item| filter.matches(item))
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    #[cfg(test)]
    fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Replace the mirror with the server's full list and recount.
    pub fn refresh(&mut self) -> Outcome {
        match self.fetch_all() {
            Ok(items) => {
                self.mirror = items;
                self.recount();
                tracing::debug!(
                    items = self.mirror.len(),
                    active = self.active_count,
                    "mirror refreshed"
                );
                Outcome::Applied
            }
            Err(e) => failed("fetching todos", e),
        }
    }

    /// Change the filter. The fetch is unfiltered; only the count and the
    /// visible items depend on the filter.
    pub fn set_category_filter(&mut self, filter: CategoryFilter) -> Outcome {
        self.filter = filter;
        self.refresh()
    }

    /// Create an item from the draft text in the selected category.
    pub fn create(&mut self) -> Outcome {
        let category = match self.filter.category() {
            Some(category) if !self.draft_text.trim().is_empty() => category,
            _ => return Outcome::Notice(Notice::InvalidDraft),
        };
        let input = CreateItem {
            text: self.draft_text.clone(),
            category: category.to_string(),
            completed: false,
        };
        match self.send_create(&input) {
            Ok(item) => {
                tracing::info!(id = %item.id, category = %item.category, "todo added");
                self.mirror.push(item);
                self.draft_text.clear();
                self.refresh()
            }
            Err(e) => failed("adding todo", e),
        }
    }

    /// Flip `completed` on an item, deleting it when the server reports it
    /// as active afterwards.
    pub fn toggle(&mut self, id: ItemId) -> Outcome {
        let Some(current) = self.mirror.iter().find(|item| item.id == id) else {
            return failed("toggling task", ApiError::NotFound);
        };
        let flipped = !current.completed;
        match self.send_toggle(id, flipped) {
            Ok(()) => self.refresh(),
            Err(e) => failed("toggling task", e),
        }
    }

    /// Delete every item in the current view, one request at a time.
    ///
    /// `confirm` receives the number of targeted items and must return
    /// `true` for anything to be sent. The first failure stops the run;
    /// items already deleted stay deleted.
    pub fn delete_all_in_view(&mut self, confirm: impl FnOnce(usize) -> bool) -> Outcome {
        let targets: Vec<ItemId> = self.visible_items().map(|item| item.id).collect();
        if targets.is_empty() {
            return Outcome::Notice(Notice::NothingToDelete);
        }
        if !confirm(targets.len()) {
            return Outcome::Cancelled;
        }
        for id in targets {
            if let Err(e) = self.send_delete(id) {
                return failed("deleting todos", e);
            }
        }
        self.refresh()
    }

    fn recount(&mut self) {
        let filter = self.filter;
        self.active_count = self
            .mirror
            .iter()
            .filter(|item| !item.completed && filter.matches(item))
            .count();
    }

    fn fetch_all(&mut self) -> Result<Vec<Item>, ApiError> {
        let response = self.transport.execute(self.client.build_list_items())?;
        self.client.parse_list_items(response)
    }

    fn send_create(&mut self, input: &CreateItem) -> Result<Item, ApiError> {
        let request = self.client.build_create_item(input)?;
        let response = self.transport.execute(request)?;
        self.client.parse_create_item(response)
    }

    fn send_toggle(&mut self, id: ItemId, completed: bool) -> Result<(), ApiError> {
        let request = self
            .client
            .build_update_item(id, &UpdateItem::completed(completed))?;
        let response = self.transport.execute(request)?;
        let updated = self.client.parse_update_item(response)?;
        if !updated.completed {
            self.send_delete(id)?;
        }
        Ok(())
    }

    fn send_delete(&mut self, id: ItemId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_item(id))?;
        self.client.parse_delete_item(response)?;
        tracing::debug!(id = %id, "todo deleted");
        Ok(())
    }
}

fn failed(action: &str, error: ApiError) -> Outcome {
    tracing::warn!("error {action}: {error}");
    Outcome::Failed(error)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};
    use crate::types::Category;

    const BASE_URL: &str = "http://todo.test";

    /// In-memory stand-in for the REST service.
    #[derive(Default)]
    struct FakeServer {
        items: Vec<Item>,
        requests: Vec<(HttpMethod, String)>,
        /// Number of deletes to allow before the transport starts failing.
        deletes_before_outage: Option<usize>,
        /// Answer every POST with a storage error.
        reject_posts: bool,
        offline: bool,
    }

    impl FakeServer {
        fn with_items(items: Vec<Item>) -> Self {
            Self {
                items,
                ..Self::default()
            }
        }

        fn json(status: u16, value: impl serde::Serialize) -> HttpResponse {
            HttpResponse::new(status, serde_json::to_string(&value).unwrap())
        }

        fn not_found() -> HttpResponse {
            Self::json(404, serde_json::json!({ "error": "todo not found" }))
        }

        fn count(&self, method: HttpMethod) -> usize {
            self.requests.iter().filter(|(m, _)| *m == method).count()
        }
    }

    impl Transport for FakeServer {
        fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let path = request.url.strip_prefix(BASE_URL).unwrap().to_string();
            self.requests.push((request.method, path.clone()));
            if self.offline {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            let id = path
                .strip_prefix("/todos/")
                .map(|raw| raw.parse::<Uuid>().unwrap());
            let body = request
                .body
                .map(|b| serde_json::from_str::<serde_json::Value>(&b).unwrap());

            let response = match (request.method, id) {
                (HttpMethod::Get, None) => Self::json(200, &self.items),
                (HttpMethod::Post, None) if self.reject_posts => {
                    Self::json(500, serde_json::json!({ "error": "disk full" }))
                }
                (HttpMethod::Post, None) => {
                    let body = body.unwrap();
                    let item = Item {
                        id: Uuid::new_v4(),
                        text: body["text"].as_str().unwrap().to_string(),
                        category: body["category"].as_str().unwrap().to_string(),
                        completed: body["completed"].as_bool().unwrap_or(false),
                    };
                    self.items.push(item.clone());
                    Self::json(201, item)
                }
                (HttpMethod::Put, Some(id)) => {
                    let body = body.unwrap();
                    match self.items.iter_mut().find(|item| item.id == id) {
                        Some(item) => {
                            if let Some(completed) = body["completed"].as_bool() {
                                item.completed = completed;
                            }
                            Self::json(200, item.clone())
                        }
                        None => Self::not_found(),
                    }
                }
                (HttpMethod::Delete, Some(id)) => {
                    if let Some(remaining) = self.deletes_before_outage.as_mut() {
                        if *remaining == 0 {
                            return Err(ApiError::Transport("connection reset".to_string()));
                        }
                        *remaining -= 1;
                    }
                    match self.items.iter().position(|item| item.id == id) {
                        Some(index) => {
                            self.items.remove(index);
                            Self::json(200, serde_json::json!({ "message": "Todo deleted." }))
                        }
                        None => Self::not_found(),
                    }
                }
                _ => Self::json(405, serde_json::json!({ "error": "method not allowed" })),
            };
            Ok(response)
        }
    }

    fn item(text: &str, category: &str, completed: bool) -> Item {
        Item {
            id: Uuid::new_v4(),
            text: text.to_string(),
            category: category.to_string(),
            completed,
        }
    }

    fn state(items: Vec<Item>) -> ListState<FakeServer> {
        let mut state = ListState::new(TodoClient::new(BASE_URL), FakeServer::with_items(items));
        assert!(state.refresh().is_applied());
        state
    }

    fn expected_active(state: &ListState<FakeServer>) -> usize {
        state
            .items()
            .iter()
            .filter(|i| !i.completed && state.filter().matches(i))
            .count()
    }

    #[test]
    fn refresh_replaces_mirror_and_counts_active_items() {
        let mut state = state(vec![
            item("a", "Work", false),
            item("b", "Work", true),
            item("c", "Personal", false),
        ]);
        assert_eq!(state.items().len(), 3);
        assert_eq!(state.active_count(), 2);

        state.transport_mut().items.clear();
        assert!(state.refresh().is_applied());
        assert!(state.items().is_empty());
        assert_eq!(state.active_count(), 0);
    }

    #[test]
    fn filter_changes_count_but_not_fetch() {
        let mut state = state(vec![
            item("a", "Work", false),
            item("b", "Work", true),
            item("c", "Personal", false),
            item("d", "Urgent", false),
        ]);

        assert!(state
            .set_category_filter(CategoryFilter::Only(Category::Work))
            .is_applied());
        assert_eq!(state.items().len(), 4);
        assert_eq!(state.visible_items().count(), 2);
        assert_eq!(state.active_count(), 1);
        assert_eq!(state.active_count(), expected_active(&state));

        let (_, last) = state.transport().requests.last().unwrap();
        assert_eq!(last, "/todos");
    }

    #[test]
    fn create_adds_item_and_clears_draft() {
        let mut state = state(Vec::new());
        state.set_category_filter(CategoryFilter::Only(Category::Personal));
        state.set_draft_text("Buy milk");

        assert!(state.create().is_applied());
        assert_eq!(state.draft_text(), "");
        assert_eq!(state.items().len(), 1);
        let created = &state.items()[0];
        assert_eq!(created.text, "Buy milk");
        assert_eq!(created.category, "Personal");
        assert!(!created.completed);
        assert_eq!(state.active_count(), 1);
    }

    #[test]
    fn create_with_all_filter_is_rejected_without_request() {
        let mut state = state(Vec::new());
        state.set_draft_text("Buy milk");
        let before = state.transport().requests.len();

        let outcome = state.create();
        assert!(matches!(outcome, Outcome::Notice(Notice::InvalidDraft)));
        assert_eq!(state.transport().requests.len(), before);
        assert_eq!(state.draft_text(), "Buy milk");
    }

    #[test]
    fn create_with_blank_draft_is_rejected() {
        let mut state = state(Vec::new());
        state.set_category_filter(CategoryFilter::Only(Category::Work));
        state.set_draft_text("   ");

        assert!(matches!(state.create(), Outcome::Notice(Notice::InvalidDraft)));
        assert_eq!(state.transport().count(HttpMethod::Post), 0);
    }

    #[test]
    fn checking_an_active_item_keeps_it_as_completed() {
        let target = item("Buy milk", "Personal", false);
        let id = target.id;
        let mut state = state(vec![target]);

        assert!(state.toggle(id).is_applied());
        assert_eq!(state.transport().count(HttpMethod::Put), 1);
        assert_eq!(state.transport().count(HttpMethod::Delete), 0);
        assert_eq!(state.items().len(), 1);
        assert!(state.items()[0].completed);
        assert_eq!(state.active_count(), 0);
    }

    #[test]
    fn unchecking_a_completed_item_deletes_it() {
        let target = item("Old", "Work", true);
        let id = target.id;
        let mut state = state(vec![target, item("Other", "Work", false)]);

        assert!(state.toggle(id).is_applied());
        assert_eq!(state.transport().count(HttpMethod::Delete), 1);
        assert!(state.items().iter().all(|i| i.id != id));
        assert_eq!(state.active_count(), 1);
    }

    #[test]
    fn toggle_unknown_id_sends_nothing() {
        let mut state = state(vec![item("a", "Work", false)]);
        let before = state.transport().requests.len();

        assert!(matches!(
            state.toggle(Uuid::new_v4()),
            Outcome::Failed(ApiError::NotFound)
        ));
        assert_eq!(state.transport().requests.len(), before);
    }

    #[test]
    fn delete_all_with_all_filter_empties_the_store() {
        let mut state = state(vec![
            item("a", "Work", false),
            item("b", "Personal", true),
            item("c", "Urgent", false),
        ]);

        let mut asked = None;
        let outcome = state.delete_all_in_view(|n| {
            asked = Some(n);
            true
        });
        assert!(outcome.is_applied());
        assert_eq!(asked, Some(3));
        assert!(state.transport().items.is_empty());
        assert!(state.items().is_empty());
        assert_eq!(state.active_count(), 0);
    }

    #[test]
    fn delete_all_in_category_leaves_others() {
        let mut state = state(vec![
            item("a", "Work", false),
            item("b", "Personal", false),
            item("c", "Work", true),
        ]);
        state.set_category_filter(CategoryFilter::Only(Category::Work));

        assert!(state.delete_all_in_view(|_| true).is_applied());
        let remaining: Vec<_> = state.items().iter().map(|i| i.text.as_str()).collect();
        assert_eq!(remaining, ["b"]);
        assert_eq!(state.visible_items().count(), 0);
    }

    #[test]
    fn delete_all_on_empty_view_is_a_notice() {
        let mut state = state(vec![item("a", "Work", false)]);
        state.set_category_filter(CategoryFilter::Only(Category::Urgent));
        let before = state.transport().requests.len();

        let outcome = state.delete_all_in_view(|_| panic!("must not ask"));
        assert!(matches!(outcome, Outcome::Notice(Notice::NothingToDelete)));
        assert_eq!(state.transport().requests.len(), before);
    }

    #[test]
    fn declined_confirmation_deletes_nothing() {
        let mut state = state(vec![item("a", "Work", false)]);

        assert!(matches!(
            state.delete_all_in_view(|_| false),
            Outcome::Cancelled
        ));
        assert_eq!(state.transport().count(HttpMethod::Delete), 0);
        assert_eq!(state.transport().items.len(), 1);
    }

    #[test]
    fn partial_delete_failure_keeps_stale_mirror() {
        let mut state = state(vec![
            item("a", "Work", false),
            item("b", "Work", false),
            item("c", "Work", false),
        ]);
        state.transport_mut().deletes_before_outage = Some(1);

        let outcome = state.delete_all_in_view(|_| true);
        assert!(matches!(outcome, Outcome::Failed(ApiError::Transport(_))));
        // One delete went through on the server; the mirror was not refreshed.
        assert_eq!(state.transport().items.len(), 2);
        assert_eq!(state.items().len(), 3);

        state.transport_mut().deletes_before_outage = None;
        assert!(state.refresh().is_applied());
        assert_eq!(state.items().len(), 2);
    }

    #[test]
    fn failed_refresh_leaves_mirror_untouched() {
        let mut state = state(vec![item("a", "Work", false)]);
        state.transport_mut().offline = true;
        state.transport_mut().items.clear();

        assert!(matches!(state.refresh(), Outcome::Failed(ApiError::Transport(_))));
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.active_count(), 1);
    }

    #[test]
    fn failed_create_keeps_mirror_and_draft() {
        let mut state = state(vec![item("a", "Work", false)]);
        state.set_category_filter(CategoryFilter::Only(Category::Work));
        state.set_draft_text("Ship it");
        state.transport_mut().reject_posts = true;
        let gets = state.transport().count(HttpMethod::Get);

        let outcome = state.create();
        assert!(matches!(
            outcome,
            Outcome::Failed(ApiError::HttpError { status: 500, ref message }) if message == "disk full"
        ));
        assert_eq!(state.draft_text(), "Ship it");
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.active_count(), 1);
        assert_eq!(state.transport().count(HttpMethod::Get), gets);
    }

    #[test]
    fn failed_delete_after_unchecking_skips_refresh() {
        let target = item("Old", "Work", true);
        let id = target.id;
        let mut state = state(vec![target]);
        state.transport_mut().deletes_before_outage = Some(0);
        let gets = state.transport().count(HttpMethod::Get);

        let outcome = state.toggle(id);
        assert!(matches!(outcome, Outcome::Failed(ApiError::Transport(_))));
        assert_eq!(state.transport().count(HttpMethod::Put), 1);
        assert_eq!(state.transport().count(HttpMethod::Delete), 1);
        assert_eq!(state.transport().count(HttpMethod::Get), gets);
        // The server applied the update; the mirror still shows the old flag.
        assert!(!state.transport().items[0].completed);
        assert_eq!(state.items().len(), 1);
        assert!(state.items()[0].completed);
        assert_eq!(state.active_count(), 0);
    }
}
