//! Command handlers - send lifecycle, sign-in and network responses

use crate::app::WorkbenchState;
use crate::auth::scope_key;
use crate::error::{AuthError, RequestBuildError, WorkbenchError};
use crate::messages::{AuthStatus, NetworkResponse, RenderState, SendJob, TabSummary};
use crate::models::{Outcome, RequestResult, SendStatus};
use crate::network::SendPipeline;

impl WorkbenchState {
    // ========================
    // Sending
    // ========================

    /// Start a send on a tab. Returns the job to run, or `None` when nothing
    /// should be dispatched: the tab is already busy, or its URL is empty (an
    /// aborted result is recorded instead).
    pub fn prepare_send(&mut self, index: usize) -> Result<Option<SendJob>, WorkbenchError> {
        let tab = self.tab(index).ok_or(WorkbenchError::NoSuchTab(index))?;
        if tab.status != SendStatus::Idle {
            tracing::debug!(tab = index, "Send ignored, tab busy");
            return Ok(None);
        }
        if tab.definition.url.trim().is_empty() {
            if let Some(tab) = self.tab_mut(index) {
                tab.last_result = Some(RequestResult::aborted(&RequestBuildError::MissingUrl));
            }
            return Ok(None);
        }

        let definition = tab.definition.clone();
        let scopes = self.scopes_for(&definition);
        let id = self.next_id();
        if let Some(tab) = self.tab_mut(index) {
            tab.status = SendStatus::Authenticating;
            tab.pending = Some(id);
            tab.in_flight = Some(definition.clone());
        }
        tracing::info!(id, tab = index, scope = %scope_key(&scopes), "Send prepared");

        Ok(Some(SendJob {
            id,
            tab_index: index,
            definition,
            scopes,
        }))
    }

    /// A token was obtained for send `id` and the request is going on the wire
    pub fn begin_sending(&mut self, id: u64) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.pending == Some(id)) else {
            return false;
        };
        tab.status = SendStatus::Sending;
        true
    }

    /// Store the result of send `id`; late results for closed tabs or
    /// superseded sends are dropped. Dispatched sends are logged to history
    /// with the definition that was actually sent.
    pub fn complete_send(&mut self, id: u64, result: RequestResult) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.pending == Some(id)) else {
            tracing::debug!(id, "Dropping stale result");
            return false;
        };
        let dispatched = result.outcome.dispatched();
        match result.outcome {
            Outcome::Completed => {
                tracing::info!(id, status = ?result.status_code, elapsed_ms = ?result.elapsed_ms, "Send completed")
            }
            outcome => tracing::warn!(id, ?outcome, dispatched, "Send did not complete"),
        }
        tab.last_result = Some(result);
        tab.status = SendStatus::Idle;
        tab.pending = None;
        let (index, sent) = (tab.index, tab.in_flight.take());

        if let (true, Some(sent)) = (dispatched, sent) {
            self.record_history(index, &sent);
        }
        true
    }

    /// Abandon a tab's pending send; returns its id so the network side can stop it
    pub fn cancel_send(&mut self, index: usize) -> Option<u64> {
        let tab = self.tab_mut(index)?;
        let id = tab.pending.take()?;
        tab.in_flight = None;
        tab.status = SendStatus::Idle;
        tab.last_result = Some(RequestResult::cancelled());
        Some(id)
    }

    /// Run a whole send inline: derive the scope, acquire a token silently,
    /// execute and store the result
    pub async fn send(&mut self, index: usize, pipeline: &SendPipeline) -> Result<(), WorkbenchError> {
        let Some(job) = self.prepare_send(index)? else {
            return Ok(());
        };
        let id = job.id;
        let result = pipeline.run(&job, || {
            self.begin_sending(id);
        })
        .await;
        self.complete_send(job.id, result);
        Ok(())
    }

    // ========================
    // Sign-in
    // ========================

    /// Scopes to sign in for: the given ones, else the selected tab's host
    pub fn begin_login(&mut self, scopes: Vec<String>) -> Vec<String> {
        let scopes = if scopes.is_empty() {
            self.scopes_for(&self.selected_tab().definition)
        } else {
            scopes
        };
        self.auth_status = AuthStatus::Authenticating;
        scopes
    }

    pub fn finish_login(&mut self, scope: &str, outcome: Result<(), AuthError>) {
        self.auth_status = match outcome {
            Ok(()) => {
                tracing::info!(scope, "Signed in");
                AuthStatus::Authenticated
            }
            Err(e) => {
                tracing::warn!(scope, error = %e, "Sign-in failed");
                AuthStatus::Failed(e.to_string())
            }
        };
    }

    pub async fn login(&mut self, scopes: Vec<String>, pipeline: &SendPipeline) {
        let scopes = self.begin_login(scopes);
        let outcome = pipeline.login(&scopes).await;
        self.finish_login(&scope_key(&scopes), outcome);
    }

    // ========================
    // Network responses
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) {
        if let Some(id) = response.send_id() {
            tracing::debug!(id, "Network response for send");
        }
        match response {
            NetworkResponse::Authenticated { id } => {
                self.begin_sending(id);
            }
            NetworkResponse::Finished { id, result } => {
                self.complete_send(id, result);
            }
            NetworkResponse::Cancelled { id } => {
                self.complete_send(id, RequestResult::cancelled());
            }
            NetworkResponse::LoginFinished { scope, outcome } => {
                self.finish_login(&scope, outcome);
            }
            NetworkResponse::LoggedOut => {
                self.auth_status = AuthStatus::NotAuthenticated;
            }
        }
    }

    /// Convert state to RenderState for the presentation layer
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            tabs: self
                .tabs
                .iter()
                .map(|t| TabSummary {
                    index: t.index,
                    label: t.label(),
                    method: t.definition.method,
                    status: t.status,
                })
                .collect(),
            active: Some(self.selected_tab().clone()),
            groups: self.groups.iter().map(|g| g.name.clone()).collect(),
            selected_group: self.selected_group,
            requests: self
                .requests
                .iter()
                .map(|r| format!("{} ({} {})", r.name, r.method.as_str(), r.url))
                .collect(),
            selected_request: self.selected_request,
            history: self.history.clone(),
            auth: self.auth_status.clone(),
            notice: self.notice.clone(),
        }
    }
}
