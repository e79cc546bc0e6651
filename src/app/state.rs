//! App state - pure data structure with no I/O logic

use chrono::Utc;

use crate::error::{RequestBuildError, WorkbenchError};
use crate::messages::AuthStatus;
use crate::models::{
    display_url, extract_query, scope_for_url, Group, HistoryEntry, RequestDefinition, Tab,
};

/// Everything one workbench session owns: tabs, groups, saved requests and history.
///
/// At least one tab always exists, and `selected` always points at a live tab.
pub struct WorkbenchState {
    pub(crate) tabs: Vec<Tab>,
    /// Position of the selected tab in `tabs`
    pub(crate) selected: usize,
    next_tab_index: usize,

    pub(crate) groups: Vec<Group>,
    pub(crate) selected_group: Option<usize>,

    pub(crate) requests: Vec<RequestDefinition>,
    pub(crate) selected_request: Option<usize>,

    pub(crate) history: Vec<HistoryEntry>,

    next_send_id: u64,
    /// Pending sends whose tabs were closed or replaced
    abandoned: Vec<u64>,
    default_scope: String,
    pub(crate) auth_status: AuthStatus,
    pub(crate) notice: Option<String>,
}

impl WorkbenchState {
    pub fn new(default_scope: impl Into<String>) -> Self {
        WorkbenchState {
            tabs: vec![Tab::new(0, RequestDefinition::default())],
            selected: 0,
            next_tab_index: 1,
            groups: Vec::new(),
            selected_group: None,
            requests: Vec::new(),
            selected_request: None,
            history: Vec::new(),
            next_send_id: 1,
            abandoned: Vec::new(),
            default_scope: default_scope.into(),
            auth_status: AuthStatus::NotAuthenticated,
            notice: None,
        }
    }

    /// Generate a unique send ID
    pub(crate) fn next_id(&mut self) -> u64 {
        let id = self.next_send_id;
        self.next_send_id += 1;
        id
    }

    fn fresh_tab(&mut self, definition: RequestDefinition) -> Tab {
        let index = self.next_tab_index;
        self.next_tab_index += 1;
        Tab::new(index, definition)
    }

    fn position(&self, index: usize) -> Result<usize, WorkbenchError> {
        self.tabs
            .iter()
            .position(|t| t.index == index)
            .ok_or(WorkbenchError::NoSuchTab(index))
    }

    // ========================
    // Tabs
    // ========================

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, index: usize) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.index == index)
    }

    pub(crate) fn tab_mut(&mut self, index: usize) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.index == index)
    }

    pub fn selected_tab(&self) -> &Tab {
        &self.tabs[self.selected]
    }

    /// Open a new default tab and select it; returns its index
    pub fn add_tab(&mut self) -> usize {
        let tab = self.fresh_tab(RequestDefinition::default());
        let index = tab.index;
        self.tabs.push(tab);
        self.selected = self.tabs.len() - 1;
        index
    }

    /// Close a tab. Returns `false` when it is the last one, which is kept.
    pub fn close_tab(&mut self, index: usize) -> Result<bool, WorkbenchError> {
        let pos = self.position(index)?;
        if self.tabs.len() == 1 {
            return Ok(false);
        }
        let closed = self.tabs.remove(pos);
        self.abandoned.extend(closed.pending);
        if self.selected == pos {
            self.selected = pos.min(self.tabs.len() - 1);
        } else if self.selected > pos {
            self.selected -= 1;
        }
        Ok(true)
    }

    pub fn select_tab(&mut self, index: usize) -> Result<(), WorkbenchError> {
        self.selected = self.position(index)?;
        Ok(())
    }

    pub fn set_definition(
        &mut self,
        index: usize,
        definition: RequestDefinition,
    ) -> Result<(), WorkbenchError> {
        let tab = self.tab_mut(index).ok_or(WorkbenchError::NoSuchTab(index))?;
        tab.definition = definition;
        Ok(())
    }

    /// Apply an edit to the selected tab's definition
    pub fn edit_selected(&mut self, edit: impl FnOnce(&mut RequestDefinition)) {
        edit(&mut self.tabs[self.selected].definition);
    }

    /// Move a query string embedded in the tab's URL into its query field
    pub fn extract_tab_query(&mut self, index: usize) -> Result<(), WorkbenchError> {
        let tab = self.tab_mut(index).ok_or(WorkbenchError::NoSuchTab(index))?;
        let (base, query) = extract_query(&tab.definition.url);
        if !query.is_empty() {
            tab.definition.url = base;
            tab.definition.query = query;
        }
        Ok(())
    }

    /// Replace every live tab with fresh copies of `definitions`
    fn materialize(&mut self, definitions: Vec<RequestDefinition>) {
        let mut tabs: Vec<Tab> = definitions
            .into_iter()
            .map(|d| self.fresh_tab(d))
            .collect();
        if tabs.is_empty() {
            tabs.push(self.fresh_tab(RequestDefinition::default()));
        }
        let replaced = std::mem::replace(&mut self.tabs, tabs);
        self.abandoned
            .extend(replaced.into_iter().filter_map(|t| t.pending));
        self.selected = 0;
    }

    // ========================
    // Groups
    // ========================

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn selected_group(&self) -> Option<usize> {
        self.selected_group
    }

    /// Snapshot the live tabs. Overwrites the selected group, else appends
    /// and selects the new one. Returns the group's position.
    pub fn save_group(&mut self, name: &str) -> usize {
        let snapshot: Vec<RequestDefinition> =
            self.tabs.iter().map(|t| t.definition.clone()).collect();
        let name = name.trim();

        match self.selected_group {
            Some(pos) if pos < self.groups.len() => {
                let group = &mut self.groups[pos];
                if !name.is_empty() {
                    group.name = name.to_string();
                }
                group.requests = snapshot;
                tracing::info!(group = %group.name, "Group updated");
                pos
            }
            _ => {
                let name = if name.is_empty() {
                    format!("Group {}", self.groups.len() + 1)
                } else {
                    name.to_string()
                };
                tracing::info!(group = %name, "Group saved");
                self.groups.push(Group::new(name, snapshot));
                let pos = self.groups.len() - 1;
                self.selected_group = Some(pos);
                pos
            }
        }
    }

    /// New group holding one default request; selected and opened
    pub fn add_group(&mut self) -> usize {
        let name = format!("Group {}", self.groups.len() + 1);
        self.groups
            .push(Group::new(name, vec![RequestDefinition::default()]));
        let pos = self.groups.len() - 1;
        self.selected_group = Some(pos);
        self.materialize(vec![RequestDefinition::default()]);
        pos
    }

    /// Open a copy of the group's requests as the live tabs
    pub fn select_group(&mut self, pos: usize) -> Result<(), WorkbenchError> {
        let requests = self
            .groups
            .get(pos)
            .map(|g| g.requests.clone())
            .ok_or(WorkbenchError::NoSuchGroup(pos))?;
        self.selected_group = Some(pos);
        self.materialize(requests);
        Ok(())
    }

    pub fn delete_group(&mut self, pos: usize) -> Result<(), WorkbenchError> {
        if pos >= self.groups.len() {
            return Err(WorkbenchError::NoSuchGroup(pos));
        }
        let removed = self.groups.remove(pos);
        tracing::info!(group = %removed.name, "Group deleted");

        if self.groups.is_empty() {
            self.selected_group = None;
            self.materialize(Vec::new());
            return Ok(());
        }
        self.select_group(pos.saturating_sub(1))
    }

    /// Leave the current group and start over with one default tab
    pub fn clear_group(&mut self) {
        self.selected_group = None;
        self.materialize(Vec::new());
    }

    // ========================
    // Saved requests
    // ========================

    pub fn requests(&self) -> &[RequestDefinition] {
        &self.requests
    }

    pub fn selected_request(&self) -> Option<usize> {
        self.selected_request
    }

    /// Mark a saved request as selected and open a copy in the selected tab
    pub fn select_request(&mut self, pos: usize) -> Result<(), WorkbenchError> {
        let definition = self
            .requests
            .get(pos)
            .cloned()
            .ok_or(WorkbenchError::NoSuchRequest(pos))?;
        self.selected_request = Some(pos);
        self.tabs[self.selected].definition = definition;
        Ok(())
    }

    /// Replace the selected saved request, or append when none is selected.
    /// The selection is cleared either way. Returns the saved position.
    pub fn save_request(&mut self, mut definition: RequestDefinition) -> Result<usize, WorkbenchError> {
        if definition.url.trim().is_empty() {
            return Err(RequestBuildError::MissingUrl.into());
        }
        definition.header_pairs()?;

        let pos = match self.selected_request.take() {
            Some(pos) if pos < self.requests.len() => pos,
            _ => {
                self.requests.push(RequestDefinition::default());
                self.requests.len() - 1
            }
        };
        if definition.name.trim().is_empty() {
            definition.name = format!("Request {}", pos + 1);
        }
        tracing::info!(name = %definition.name, "Request saved");
        self.requests[pos] = definition;
        Ok(pos)
    }

    /// Save the selected tab's definition
    pub fn save_selected_request(&mut self) -> Result<usize, WorkbenchError> {
        let definition = self.selected_tab().definition.clone();
        self.save_request(definition)
    }

    pub fn delete_request(&mut self, pos: usize) -> Result<(), WorkbenchError> {
        if pos >= self.requests.len() {
            return Err(WorkbenchError::NoSuchRequest(pos));
        }
        self.requests.remove(pos);
        self.selected_request = match self.selected_request {
            Some(sel) if sel == pos => None,
            Some(sel) if sel > pos => Some(sel - 1),
            other => other,
        };
        Ok(())
    }

    pub fn clear_request_selection(&mut self) {
        self.selected_request = None;
    }

    // ========================
    // History and auth
    // ========================

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub(crate) fn record_history(&mut self, tab_index: usize, definition: &RequestDefinition) {
        let url = definition.effective_url();
        self.history.push(HistoryEntry {
            method: definition.method,
            display_url: display_url(&url).to_string(),
            tab_index,
            sent_at: Utc::now(),
        });
    }

    /// Scope to request for a definition's target host
    pub fn scopes_for(&self, definition: &RequestDefinition) -> Vec<String> {
        vec![scope_for_url(&definition.url).unwrap_or_else(|| self.default_scope.clone())]
    }

    pub fn auth_status(&self) -> &AuthStatus {
        &self.auth_status
    }

    /// Drain the ids of sends left without a tab; the network side should stop them
    pub fn take_abandoned(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.abandoned)
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_SCOPE;
    use crate::models::HttpMethod;

    fn state() -> WorkbenchState {
        WorkbenchState::new(DEFAULT_SCOPE)
    }

    fn indices(state: &WorkbenchState) -> Vec<usize> {
        state.tabs().iter().map(|t| t.index).collect()
    }

    #[test]
    fn test_close_last_tab_is_noop() {
        let mut state = state();
        state.edit_selected(|d| d.url = String::from("https://h/api/x"));
        let before = state.selected_tab().definition.clone();

        assert!(!state.close_tab(0).unwrap());
        assert_eq!(state.tabs().len(), 1);
        assert_eq!(state.selected_tab().definition, before);
    }

    #[test]
    fn test_add_then_close_restores_tabs() {
        let mut state = state();
        state.add_tab();
        let before = indices(&state);

        let added = state.add_tab();
        assert!(state.close_tab(added).unwrap());

        assert_eq!(indices(&state), before);
    }

    #[test]
    fn test_tab_indices_never_reused() {
        let mut state = state();
        let first = state.add_tab();
        state.close_tab(first).unwrap();
        let second = state.add_tab();

        assert!(second > first);
    }

    #[test]
    fn test_close_selected_moves_to_same_position_or_last() {
        let mut state = state();
        let one = state.add_tab();
        let two = state.add_tab();

        state.select_tab(one).unwrap();
        state.close_tab(one).unwrap();
        assert_eq!(state.selected_tab().index, two);

        state.close_tab(two).unwrap();
        assert_eq!(state.selected_tab().index, 0);
    }

    #[test]
    fn test_close_unknown_tab() {
        let mut state = state();
        assert_eq!(state.close_tab(9), Err(WorkbenchError::NoSuchTab(9)));
    }

    #[test]
    fn test_extract_tab_query() {
        let mut state = state();
        state.edit_selected(|d| d.url = String::from("https://h/api?a=1&b=2"));
        state.extract_tab_query(0).unwrap();

        let def = &state.selected_tab().definition;
        assert_eq!(def.url, "https://h/api");
        assert_eq!(def.query, "a=1&b=2");
        assert_eq!(def.effective_url(), "https://h/api?a=1&b=2");
    }

    #[test]
    fn test_select_group_copies_requests() {
        let mut state = state();
        state.edit_selected(|d| d.url = String::from("https://h/api/one"));
        let second = state.add_tab();
        state
            .set_definition(second, RequestDefinition::new(HttpMethod::POST, "https://h/api/two"))
            .unwrap();
        state.save_group("pair");

        state.select_group(0).unwrap();
        state.edit_selected(|d| d.url = String::from("https://h/api/changed"));
        state.select_group(0).unwrap();

        assert_eq!(state.tabs().len(), 2);
        assert_eq!(state.selected_tab().definition.url, "https://h/api/one");
        assert_eq!(state.groups()[0].requests[0].url, "https://h/api/one");
    }

    #[test]
    fn test_save_group_overwrites_selected() {
        let mut state = state();
        assert_eq!(state.save_group(""), 0);
        assert_eq!(state.groups()[0].name, "Group 1");

        state.add_tab();
        assert_eq!(state.save_group(""), 0);
        assert_eq!(state.groups().len(), 1);
        assert_eq!(state.groups()[0].requests.len(), 2);
        assert_eq!(state.groups()[0].name, "Group 1");
    }

    #[test]
    fn test_delete_group_selects_previous() {
        let mut state = state();
        state.edit_selected(|d| d.url = String::from("https://h/api/a"));
        state.save_group("a");
        state.add_group();
        state.delete_group(1).unwrap();

        assert_eq!(state.selected_group(), Some(0));
        assert_eq!(state.selected_tab().definition.url, "https://h/api/a");

        state.delete_group(0).unwrap();
        assert_eq!(state.selected_group(), None);
        assert_eq!(state.tabs().len(), 1);
        assert_eq!(state.selected_tab().definition, RequestDefinition::default());
    }

    #[test]
    fn test_replacing_tabs_abandons_pending_sends() {
        let mut state = state();
        state.edit_selected(|d| d.url = String::from("https://h/api/a"));
        state.save_group("a");
        let busy = state.selected_tab().index;
        let job = state.prepare_send(busy).unwrap().unwrap();

        state.select_group(0).unwrap();

        assert_eq!(state.take_abandoned(), vec![job.id]);
        assert!(state.take_abandoned().is_empty());
        assert!(state.tabs().iter().all(|t| t.pending.is_none()));
    }

    #[test]
    fn test_closing_busy_tab_abandons_send() {
        let mut state = state();
        let extra = state.add_tab();
        state
            .set_definition(extra, RequestDefinition::new(HttpMethod::GET, "https://h/api/x"))
            .unwrap();
        let job = state.prepare_send(extra).unwrap().unwrap();

        state.close_tab(extra).unwrap();

        assert_eq!(state.take_abandoned(), vec![job.id]);
    }

    #[test]
    fn test_add_group_opens_one_default_tab() {
        let mut state = state();
        state.add_tab();
        state.add_group();

        assert_eq!(state.groups()[0].name, "Group 1");
        assert_eq!(state.tabs().len(), 1);
        assert_eq!(state.selected_group(), Some(0));
    }

    #[test]
    fn test_save_request_appends_then_replaces() {
        let mut state = state();
        let def = RequestDefinition::new(HttpMethod::GET, "https://h/api/a");
        assert_eq!(state.save_request(def).unwrap(), 0);
        assert_eq!(state.requests()[0].name, "Request 1");
        assert_eq!(state.selected_request(), None);

        state.select_request(0).unwrap();
        state.edit_selected(|d| d.name = String::from("renamed"));
        assert_eq!(state.save_selected_request().unwrap(), 0);

        assert_eq!(state.requests().len(), 1);
        assert_eq!(state.requests()[0].name, "renamed");
        assert_eq!(state.selected_request(), None);
    }

    #[test]
    fn test_save_request_rejects_invalid() {
        let mut state = state();
        assert_eq!(
            state.save_request(RequestDefinition::default()),
            Err(WorkbenchError::InvalidRequest(RequestBuildError::MissingUrl))
        );

        let mut def = RequestDefinition::new(HttpMethod::GET, "https://h/api");
        def.headers = String::from("{not json");
        assert!(matches!(
            state.save_request(def),
            Err(WorkbenchError::InvalidRequest(RequestBuildError::InvalidHeaders { .. }))
        ));
        assert!(state.requests().is_empty());
    }

    #[test]
    fn test_delete_request_shifts_selection() {
        let mut state = state();
        for url in ["https://h/api/a", "https://h/api/b", "https://h/api/c"] {
            state
                .save_request(RequestDefinition::new(HttpMethod::GET, url))
                .unwrap();
        }
        state.select_request(2).unwrap();
        state.delete_request(0).unwrap();
        assert_eq!(state.selected_request(), Some(1));

        state.delete_request(1).unwrap();
        assert_eq!(state.selected_request(), None);
        assert_eq!(state.delete_request(5), Err(WorkbenchError::NoSuchRequest(5)));
    }

    #[test]
    fn test_scopes_fall_back_to_default() {
        let state = state();
        let def = RequestDefinition::new(HttpMethod::GET, "not a url");
        assert_eq!(state.scopes_for(&def), vec![DEFAULT_SCOPE.to_string()]);
    }
}
