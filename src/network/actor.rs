//! Network actor - runs sends and sign-ins in the Tokio runtime

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::auth::scope_key;
use crate::messages::{NetworkCommand, NetworkResponse, SendJob};
use crate::network::pipeline::SendPipeline;

/// Network actor that processes send and auth commands
pub struct NetworkActor {
    pipeline: Arc<SendPipeline>,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<Option<u64>>,
    cancel_handles: HashMap<u64, oneshot::Sender<()>>,
}

impl NetworkActor {
    pub fn new(
        pipeline: Arc<SendPipeline>,
        response_tx: mpsc::UnboundedSender<NetworkResponse>,
    ) -> Self {
        NetworkActor {
            pipeline,
            response_tx,
            active_requests: JoinSet::new(),
            cancel_handles: HashMap::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Send(job)) => {
                            let (cancel_tx, cancel_rx) = oneshot::channel();
                            self.cancel_handles.insert(job.id, cancel_tx);

                            let pipeline = self.pipeline.clone();
                            let response_tx = self.response_tx.clone();
                            self.active_requests.spawn(async move {
                                Some(run_send(&pipeline, job, &response_tx, cancel_rx).await)
                            });
                        }

                        Some(NetworkCommand::Cancel(id)) => {
                            if let Some(cancel_tx) = self.cancel_handles.remove(&id) {
                                tracing::info!(id, "Cancelling request");
                                let _ = cancel_tx.send(());
                            }
                        }

                        Some(NetworkCommand::Login { scopes }) => {
                            let pipeline = self.pipeline.clone();
                            let response_tx = self.response_tx.clone();
                            self.active_requests.spawn(async move {
                                let outcome = pipeline.login(&scopes).await;
                                let _ = response_tx.send(NetworkResponse::LoginFinished {
                                    scope: scope_key(&scopes),
                                    outcome,
                                });
                                None
                            });
                        }

                        Some(NetworkCommand::Logout) => {
                            self.pipeline.cache().clear().await;
                            tracing::info!("Token cache cleared");
                            let _ = self.response_tx.send(NetworkResponse::LoggedOut);
                        }

                        Some(NetworkCommand::Shutdown) => {
                            for (_, cancel_tx) in self.cancel_handles.drain() {
                                let _ = cancel_tx.send(());
                            }
                            break;
                        }

                        None => break,
                    }
                }

                Some(joined) = self.active_requests.join_next() => {
                    if let Ok(Some(id)) = joined {
                        self.cancel_handles.remove(&id);
                    }
                }
            }
        }
    }
}

/// Authorize and execute one job, reporting progress; returns the job id
async fn run_send(
    pipeline: &SendPipeline,
    job: SendJob,
    response_tx: &mpsc::UnboundedSender<NetworkResponse>,
    mut cancel_rx: oneshot::Receiver<()>,
) -> u64 {
    let id = job.id;
    let work = pipeline.run(&job, || {
        let _ = response_tx.send(NetworkResponse::Authenticated { id });
    });

    tokio::select! {
        biased;

        _ = &mut cancel_rx => {
            let _ = response_tx.send(NetworkResponse::Cancelled { id });
        }
        result = work => {
            let _ = response_tx.send(NetworkResponse::Finished { id, result });
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::cache::tests::FakeProvider;
    use crate::auth::TokenCache;
    use crate::models::{HttpMethod, Outcome, RequestDefinition};
    use crate::network::executor::tests::RecordingTransport;
    use crate::network::executor::RequestExecutor;

    fn spawn_actor(
        bound: bool,
    ) -> (
        mpsc::UnboundedSender<NetworkCommand>,
        mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        let pipeline = Arc::new(SendPipeline::new(
            TokenCache::new(Arc::new(FakeProvider::new(bound))),
            RequestExecutor::new(Arc::new(RecordingTransport::replying(200, "ok"))),
        ));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();
        tokio::spawn(NetworkActor::new(pipeline, resp_tx).run(cmd_rx));
        (cmd_tx, resp_rx)
    }

    fn job(id: u64) -> SendJob {
        SendJob {
            id,
            tab_index: 0,
            definition: RequestDefinition::new(HttpMethod::GET, "https://h/api/x"),
            scopes: vec![String::from("https://h/.default")],
        }
    }

    #[tokio::test]
    async fn test_send_reports_progress_then_result() {
        let (cmd_tx, mut resp_rx) = spawn_actor(true);
        cmd_tx.send(NetworkCommand::Send(job(7))).unwrap();

        assert!(matches!(
            resp_rx.recv().await,
            Some(NetworkResponse::Authenticated { id: 7 })
        ));
        match resp_rx.recv().await {
            Some(NetworkResponse::Finished { id, result }) => {
                assert_eq!(id, 7);
                assert_eq!(result.status_code, Some(200));
            }
            other => panic!("unexpected response: {:?}", other),
        }
        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_send_finishes_with_auth_failure() {
        let (cmd_tx, mut resp_rx) = spawn_actor(false);
        cmd_tx.send(NetworkCommand::Send(job(1))).unwrap();

        match resp_rx.recv().await {
            Some(NetworkResponse::Finished { result, .. }) => {
                assert_eq!(result.outcome, Outcome::AuthFailed);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let (cmd_tx, mut resp_rx) = spawn_actor(false);
        cmd_tx
            .send(NetworkCommand::Login {
                scopes: vec![String::from("a"), String::from("b")],
            })
            .unwrap();

        match resp_rx.recv().await {
            Some(NetworkResponse::LoginFinished { scope, outcome }) => {
                assert_eq!(scope, "a b");
                assert!(outcome.is_ok());
            }
            other => panic!("unexpected response: {:?}", other),
        }

        cmd_tx.send(NetworkCommand::Logout).unwrap();
        assert!(matches!(resp_rx.recv().await, Some(NetworkResponse::LoggedOut)));
    }
}
