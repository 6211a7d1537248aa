use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// In-process fan-out of an ordered stream of values to any number of subscribers.
///
/// Each subscriber gets its own unbounded channel, so a slow consumer never blocks
/// the producer and never loses values. Latest-value feeds replay the most recent
/// value to a new subscriber.
pub struct StateFeed<T> {
    inner: Mutex<FeedInner<T>>,
    replay_latest: bool,
}

struct FeedInner<T> {
    subscribers: Vec<UnboundedSender<T>>,
    latest: Option<T>,
}

impl<T: Clone> StateFeed<T> {
    /// Plain event stream: subscribers only see values published after they joined.
    pub fn events() -> Self {
        Self::with_replay(false)
    }

    /// Latest-value stream: a new subscriber first receives the current value, if any.
    pub fn latest_value() -> Self {
        Self::with_replay(true)
    }

    fn with_replay(replay_latest: bool) -> Self {
        Self {
            inner: Mutex::new(FeedInner {
                subscribers: Vec::new(),
                latest: None,
            }),
            replay_latest,
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();

        if self.replay_latest {
            if let Some(latest) = inner.latest.clone() {
                let _ = tx.send(latest);
            }
        }

        inner.subscribers.push(tx);
        rx
    }

    pub fn publish(&self, value: T) {
        let mut inner = self.inner.lock();

        inner
            .subscribers
            .retain(|subscriber| subscriber.send(value.clone()).is_ok());
        inner.latest = Some(value);
    }

    pub fn latest(&self) -> Option<T> {
        self.inner.lock().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|subscriber| !subscriber.is_closed())
            .count()
    }
}
