//! Work queue of channels shared by the worker pool.

use std::collections::{HashSet, VecDeque};

use tokio::sync::Mutex;

use crate::types::Channel;

/// Fixed set of channels to export, drained concurrently by the workers
///
/// The queue is filled once at construction and has no way to add work later,
/// so an empty queue means every channel has been handed out: [`WorkQueue::next`]
/// returning `None` is the workers' signal to stop.
#[derive(Debug)]
pub struct WorkQueue {
    channels: Mutex<VecDeque<Channel>>,
    capacity: usize,
}

impl WorkQueue {
    /// Build the queue from the guild's channel listing, keeping only exportable
    /// channels that are not excluded, in listing order.
    pub fn from_listing(listing: Vec<Channel>, excluded: &HashSet<String>) -> Self {
        Self::new(eligible_channels(listing, excluded))
    }

    /// Build the queue from an already filtered list; repeated ids keep their first occurrence
    pub fn new(channels: Vec<Channel>) -> Self {
        let mut seen = HashSet::with_capacity(channels.len());
        let channels: VecDeque<Channel> = channels
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();

        Self {
            capacity: channels.len(),
            channels: Mutex::new(channels),
        }
    }

    /// Hand the next channel to a worker; `None` once the queue is drained
    pub async fn next(&self) -> Option<Channel> {
        self.channels.lock().await.pop_front()
    }

    /// Number of channels the queue was built with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of channels not yet handed out
    pub async fn remaining(&self) -> usize {
        self.channels.lock().await.len()
    }
}

/// Text and announcement channels whose id is not in `excluded`, in listing order
pub fn eligible_channels(listing: Vec<Channel>, excluded: &HashSet<String>) -> Vec<Channel> {
    listing
        .into_iter()
        .filter(|c| c.kind.is_exportable() && !excluded.contains(&c.id))
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelKind;
    use std::sync::Arc;

    fn channel(id: &str, kind: ChannelKind) -> Channel {
        Channel {
            id: id.to_string(),
            name: format!("channel-{id}"),
            kind,
        }
    }

    fn ids(channels: &[Channel]) -> Vec<&str> {
        channels.iter().map(|c| c.id.as_str()).collect()
    }

    fn listing() -> Vec<Channel> {
        vec![
            channel("1", ChannelKind::Text),
            channel("2", ChannelKind::Other(2)),
            channel("3", ChannelKind::Announcement),
            channel("4", ChannelKind::Other(4)),
            channel("5", ChannelKind::Text),
            channel("6", ChannelKind::Other(15)),
            channel("7", ChannelKind::Text),
        ]
    }

    #[test]
    fn keeps_text_and_announcement_in_listing_order() {
        let eligible = eligible_channels(listing(), &HashSet::new());
        assert_eq!(ids(&eligible), vec!["1", "3", "5", "7"]);
    }

    #[test]
    fn drops_excluded_ids() {
        let excluded = HashSet::from(["3".to_string(), "7".to_string(), "2".to_string()]);
        let eligible = eligible_channels(listing(), &excluded);
        assert_eq!(ids(&eligible), vec!["1", "5"]);
    }

    #[test]
    fn excluding_unknown_ids_changes_nothing() {
        let excluded = HashSet::from(["999".to_string()]);
        let eligible = eligible_channels(listing(), &excluded);
        assert_eq!(ids(&eligible), vec!["1", "3", "5", "7"]);
    }

    #[tokio::test]
    async fn drains_in_order_then_signals_end_of_work() {
        let queue = WorkQueue::from_listing(listing(), &HashSet::new());
        assert_eq!(queue.capacity(), 4);

        let mut drained = Vec::new();
        while let Some(channel) = queue.next().await {
            drained.push(channel.id);
        }
        assert_eq!(drained, vec!["1", "3", "5", "7"]);
        assert_eq!(queue.remaining().await, 0);
        assert!(queue.next().await.is_none(), "drained queue stays drained");
    }

    #[tokio::test]
    async fn duplicate_ids_are_queued_once() {
        let queue = WorkQueue::new(vec![
            channel("1", ChannelKind::Text),
            channel("2", ChannelKind::Text),
            channel("1", ChannelKind::Text),
        ]);
        assert_eq!(queue.capacity(), 2);
        assert_eq!(queue.next().await.unwrap().id, "1");
        assert_eq!(queue.next().await.unwrap().id, "2");
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_queue_ends_immediately() {
        let queue = WorkQueue::new(Vec::new());
        assert_eq!(queue.capacity(), 0);
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_consumers_receive_each_channel_once() {
        let channels: Vec<Channel> = (0..500)
            .map(|i| channel(&i.to_string(), ChannelKind::Text))
            .collect();
        let queue = Arc::new(WorkQueue::new(channels));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(channel) = queue.next().await {
                    got.push(channel.id);
                    tokio::task::yield_now().await;
                }
                got
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort_by_key(|id| id.parse::<u32>().unwrap());
        let expected: Vec<String> = (0..500).map(|i| i.to_string()).collect();
        assert_eq!(all, expected);
    }
}
