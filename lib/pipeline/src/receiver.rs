use std::collections::VecDeque;

use tokio::sync::mpsc;

/// Input side of a stage queue. Items can be prepended, in which case they are yielded before
/// anything received from the channel.
#[derive(Debug)]
pub struct StageReceiver<T> {
    prepended: VecDeque<T>,
    receiver: mpsc::Receiver<T>,
}

impl<T> StageReceiver<T> {
    pub fn new(receiver: mpsc::Receiver<T>) -> Self {
        Self {
            prepended: VecDeque::new(),
            receiver,
        }
    }

    pub fn prepend(mut self, items: impl IntoIterator<Item = T>) -> Self {
        let mut items: VecDeque<T> = items.into_iter().collect();
        items.append(&mut self.prepended);
        self.prepended = items;
        self
    }

    /// Next item, or `None` once prepended items are exhausted and the channel is closed.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(item) = self.prepended.pop_front() {
            return Some(item);
        }
        self.receiver.recv().await
    }

    /// Number of items available without waiting.
    pub fn len(&self) -> usize {
        self.prepended.len() + self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
