use crate::domain::models::{BatchResult, NotificationRecord};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Port for handling one invocation's worth of upload notifications
#[async_trait]
pub trait BatchService: Send + Sync + 'static {
    /// Process every record in order and aggregate the results
    async fn handle(&self, batch: Vec<NotificationRecord>) -> BatchResult {
        self.handle_until(batch, CancellationToken::new()).await
    }

    /// As `handle`, returning whatever was accumulated once `cancel` fires
    async fn handle_until(
        &self,
        batch: Vec<NotificationRecord>,
        cancel: CancellationToken,
    ) -> BatchResult;
}
