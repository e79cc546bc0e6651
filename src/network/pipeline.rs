//! Send pipeline - token cache and executor wired together for one send

use crate::auth::{scope_key, TokenCache};
use crate::error::AuthError;
use crate::messages::SendJob;
use crate::models::RequestResult;
use crate::network::executor::RequestExecutor;

/// The collaborators a send needs, owned explicitly rather than held globally
pub struct SendPipeline {
    cache: TokenCache,
    executor: RequestExecutor,
}

impl SendPipeline {
    pub fn new(cache: TokenCache, executor: RequestExecutor) -> Self {
        SendPipeline { cache, executor }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Token for the job's scope; sends never prompt the user
    pub async fn authorize(&self, job: &SendJob) -> Result<String, AuthError> {
        self.cache.acquire(&job.scopes, false).await
    }

    pub async fn execute(&self, job: &SendJob, token: &str) -> RequestResult {
        self.executor.execute(&job.definition, token).await
    }

    /// Authorize then execute; an auth failure becomes the result.
    /// `on_authorized` runs once the token is in hand, before dispatch.
    pub async fn run(&self, job: &SendJob, on_authorized: impl FnOnce()) -> RequestResult {
        match self.authorize(job).await {
            Ok(token) => {
                on_authorized();
                self.execute(job, &token).await
            }
            Err(e) => {
                tracing::warn!(id = job.id, error = %e, "Send not authorized");
                RequestResult::auth_failed(&e)
            }
        }
    }

    /// Explicit sign-in: the one path allowed to prompt
    pub async fn login(&self, scopes: &[String]) -> Result<(), AuthError> {
        tracing::info!(scope = %scope_key(scopes), "Login requested");
        self.cache.acquire(scopes, true).await.map(|_| ())
    }
}
