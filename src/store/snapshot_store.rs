use std::sync::Arc;
use tokio::sync::watch;

/// Create the live store for one domain: the publisher goes to the domain's
/// aggregator, readers are handed to every subscriber.
///
/// Snapshots are swapped in as whole `Arc`s, so a reader holds either the
/// previous value or the new one and never a partial update.
pub fn snapshot_store<T>(initial: T) -> (SnapshotPublisher<T>, SnapshotReader<T>) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (SnapshotPublisher { tx }, SnapshotReader { rx })
}

/// Write half. Not `Clone`: each store has exactly one writer.
pub struct SnapshotPublisher<T> {
    tx: watch::Sender<Arc<T>>,
}

impl<T> SnapshotPublisher<T> {
    /// Replace the current snapshot. Succeeds with or without live readers.
    pub fn publish(&self, snapshot: T) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    pub fn current(&self) -> Arc<T> {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> SnapshotReader<T> {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

pub struct SnapshotReader<T> {
    rx: watch::Receiver<Arc<T>>,
}

impl<T> Clone for SnapshotReader<T> {
    fn clone(&self) -> Self {
        SnapshotReader { rx: self.rx.clone() }
    }
}

impl<T> SnapshotReader<T> {
    pub fn current(&self) -> Arc<T> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_initial_value() {
        let (_publisher, reader) = snapshot_store(0u32);
        assert_eq!(*reader.current(), 0);
    }

    #[test]
    fn publish_replaces_whole_value() {
        let (publisher, reader) = snapshot_store(vec![1, 2, 3]);
        let before = reader.current();

        publisher.publish(vec![4]);

        assert_eq!(*before, vec![1, 2, 3]);
        assert_eq!(*reader.current(), vec![4]);
        assert_eq!(*publisher.current(), vec![4]);
    }

    #[test]
    fn publish_without_readers_is_kept() {
        let (publisher, reader) = snapshot_store(1u32);
        drop(reader);

        publisher.publish(2);

        assert_eq!(*publisher.reader().current(), 2);
    }

    #[test]
    fn cloned_readers_see_the_same_snapshot() {
        let (publisher, reader) = snapshot_store(1u32);
        let other = reader.clone();

        publisher.publish(7);

        assert_eq!(*reader.current(), 7);
        assert_eq!(*other.current(), 7);
    }
}
