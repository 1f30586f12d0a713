//! Plumbing for chaining asynchronous processing stages with bounded queues.

mod builder;
mod receiver;

pub use builder::Pipeline;
pub use receiver::StageReceiver;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A processing stage: consumes items from its input queue and produces items for the next
/// stage.
#[async_trait]
pub trait PipelineComponent: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Name used in logs.
    const NAME: &'static str;
    /// Capacity of the queue between this stage and the next one.
    const OUTPUT_BUFFER_SIZE: usize;

    /// Runs until the input queue is closed and drained, or until an unrecoverable error.
    async fn run(
        self,
        input: StageReceiver<Self::Input>,
        output: mpsc::Sender<Self::Output>,
    ) -> anyhow::Result<()>;
}
