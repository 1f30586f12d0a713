use crate::PipelineComponent;
use crate::receiver::StageReceiver;
use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

/// A named pipeline task: component name and its spawnable task function
type PipelineTask = (&'static str, BoxFuture<'static, Result<()>>);

/// Pipeline with an active output stream that can be piped to more components
pub struct Pipeline<Output: Send + 'static> {
    tasks: Vec<PipelineTask>,
    receiver: StageReceiver<Output>,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Starts a pipeline fed from an external queue, e.g. requests arriving over HTTP.
    pub fn from_receiver(receiver: mpsc::Receiver<T>) -> Self {
        Self {
            tasks: vec![],
            receiver: StageReceiver::new(receiver),
        }
    }

    /// Starts a pipeline that yields exactly `items` and then reports end of input.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let (_sender, receiver) = mpsc::channel(1);
        Self {
            tasks: vec![],
            receiver: StageReceiver::new(receiver).prepend(items),
        }
    }
}

impl<Output: Send + 'static> Pipeline<Output> {
    /// Add a transformer component to the pipeline
    pub fn pipe<C>(mut self, component: C) -> Pipeline<C::Output>
    where
        C: PipelineComponent<Input = Output>,
    {
        let (output_sender, output_receiver) = mpsc::channel(C::OUTPUT_BUFFER_SIZE);
        let input_receiver = self.receiver;

        self.tasks.push((
            C::NAME,
            async move { component.run(input_receiver, output_sender).await }.boxed(),
        ));

        Pipeline {
            tasks: self.tasks,
            receiver: StageReceiver::new(output_receiver),
        }
    }

    /// Spawn all pipeline component tasks into a JoinSet.
    ///
    /// The output of the last component is dropped, so it must not produce anything.
    pub fn spawn(self, tasks: &mut tokio::task::JoinSet<()>) {
        for (name, task_fn) in self.tasks {
            tasks.spawn(async move {
                match task_fn.await {
                    Ok(_) => tracing::info!("{name} component finished"),
                    Err(err) => tracing::error!(?err, "{name} component failed"),
                }
            });
        }
        drop(self.receiver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Double;

    #[async_trait]
    impl PipelineComponent for Double {
        type Input = u64;
        type Output = u64;

        const NAME: &'static str = "double";
        const OUTPUT_BUFFER_SIZE: usize = 1;

        async fn run(
            self,
            mut input: StageReceiver<u64>,
            output: mpsc::Sender<u64>,
        ) -> Result<()> {
            while let Some(item) = input.recv().await {
                output.send(item * 2).await?;
            }
            Ok(())
        }
    }

    struct Sum(Arc<AtomicU64>);

    #[async_trait]
    impl PipelineComponent for Sum {
        type Input = u64;
        type Output = ();

        const NAME: &'static str = "sum";
        const OUTPUT_BUFFER_SIZE: usize = 1;

        async fn run(self, mut input: StageReceiver<u64>, _output: mpsc::Sender<()>) -> Result<()> {
            while let Some(item) = input.recv().await {
                self.0.fetch_add(item, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn stages_run_until_input_is_exhausted() {
        let total = Arc::new(AtomicU64::new(0));
        let mut tasks = tokio::task::JoinSet::new();
        Pipeline::from_items([1, 2, 3])
            .pipe(Double)
            .pipe(Sum(total.clone()))
            .spawn(&mut tasks);

        while tasks.join_next().await.is_some() {}
        assert_eq!(total.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn external_queue_feeds_the_first_stage() {
        let total = Arc::new(AtomicU64::new(0));
        let (sender, receiver) = mpsc::channel(4);
        let mut tasks = tokio::task::JoinSet::new();
        Pipeline::from_receiver(receiver)
            .pipe(Sum(total.clone()))
            .spawn(&mut tasks);

        sender.send(5).await.unwrap();
        sender.send(7).await.unwrap();
        drop(sender);

        while tasks.join_next().await.is_some() {}
        assert_eq!(total.load(Ordering::SeqCst), 12);
    }
}
