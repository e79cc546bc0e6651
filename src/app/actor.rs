//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::WorkbenchState;
use crate::constants::DEFAULT_HEADERS;
use crate::error::WorkbenchError;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use crate::models::RequestDefinition;

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: WorkbenchState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: WorkbenchState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    self.render();
                }
                Some(response) = net_rx.recv() => {
                    self.state.handle_response(response);
                    self.render();
                }
                else => break,
            }
        }
    }

    fn render(&mut self) {
        let _ = self.render_tx.send(self.state.to_render_state());
        self.state.take_notice();
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        if let UiEvent::Quit = event {
            return true;
        }
        if let Err(e) = self.apply(event) {
            tracing::warn!(error = %e, "Action rejected");
            self.state.set_notice(e.to_string());
        }
        for id in self.state.take_abandoned() {
            tracing::info!(id, "Cancelling send of a replaced tab");
            let _ = self.network_tx.send(NetworkCommand::Cancel(id));
        }
        false
    }

    fn apply(&mut self, event: UiEvent) -> Result<(), WorkbenchError> {
        let selected = self.state.selected_tab().index;

        match event {
            // Tabs
            UiEvent::AddTab => {
                self.state.add_tab();
            }
            UiEvent::CloseTab(index) => {
                if !self.state.close_tab(index)? {
                    self.state.set_notice("The last tab cannot be closed");
                }
            }
            UiEvent::SelectTab(index) => self.state.select_tab(index)?,

            // Editing
            UiEvent::SetName(name) => self.state.edit_selected(|d| d.name = name),
            UiEvent::SetMethod(method) => self.state.edit_selected(|d| d.method = method),
            UiEvent::SetUrl(url) => self.state.edit_selected(|d| d.url = url),
            UiEvent::SetQuery(query) => self.state.edit_selected(|d| d.query = query),
            UiEvent::SetHeaders(headers) => self.state.edit_selected(|d| d.headers = headers),
            UiEvent::SetPayload(payload) => self.state.edit_selected(|d| d.payload = payload),
            UiEvent::ResetHeaders => self
                .state
                .edit_selected(|d| d.headers = String::from(DEFAULT_HEADERS)),
            UiEvent::ExtractQuery => self.state.extract_tab_query(selected)?,

            // Sending
            UiEvent::SendRequest => {
                if let Some(job) = self.state.prepare_send(selected)? {
                    let _ = self.network_tx.send(NetworkCommand::Send(job));
                }
            }
            UiEvent::CancelRequest => {
                if let Some(id) = self.state.cancel_send(selected) {
                    let _ = self.network_tx.send(NetworkCommand::Cancel(id));
                }
            }

            // Saved requests
            UiEvent::SaveRequest => {
                self.state.save_selected_request()?;
            }
            UiEvent::OpenRequest(pos) => self.state.select_request(pos)?,
            UiEvent::DeleteRequest(pos) => self.state.delete_request(pos)?,
            UiEvent::NewRequest => {
                self.state.clear_request_selection();
                self.state.set_definition(selected, RequestDefinition::default())?;
            }

            // Groups
            UiEvent::SaveGroup(name) => {
                self.state.save_group(&name);
            }
            UiEvent::AddGroup => {
                self.state.add_group();
            }
            UiEvent::SelectGroup(pos) => self.state.select_group(pos)?,
            UiEvent::DeleteGroup(pos) => self.state.delete_group(pos)?,
            UiEvent::ClearGroup => self.state.clear_group(),

            // Auth
            UiEvent::Login(scopes) => {
                let scopes = self.state.begin_login(scopes);
                let _ = self.network_tx.send(NetworkCommand::Login { scopes });
            }
            UiEvent::Logout => {
                let _ = self.network_tx.send(NetworkCommand::Logout);
            }

            UiEvent::Quit => {}
        }

        Ok(())
    }
}
