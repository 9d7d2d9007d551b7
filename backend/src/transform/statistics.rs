//! Per-sender transfer statistics.
//!
//! Every row counts toward the unique-style total. Rows with a sending store
//! count toward that sender; rows with both stores also fill the
//! sender × receiver matrix.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{SenderStats, StatisticsSnapshot, TableRow};

/// Fold a row set into a [`StatisticsSnapshot`].
pub fn aggregate<'a, I>(rows: I) -> StatisticsSnapshot
where
    I: IntoIterator<Item = &'a TableRow>,
{
    let mut unique_styles: BTreeSet<&str> = BTreeSet::new();
    let mut sender_styles: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut sender_stats: BTreeMap<String, SenderStats> = BTreeMap::new();

    for row in rows {
        unique_styles.insert(&row.style);

        if row.from.is_empty() {
            continue;
        }

        let stats = sender_stats.entry(row.from.clone()).or_default();
        stats.total_styles_sent += 1;
        sender_styles.entry(&row.from).or_default().insert(&row.style);

        if !row.to.is_empty() {
            *stats.styles_to_receivers.entry(row.to.clone()).or_default() += 1;
        }
    }

    for (sender, styles) in sender_styles {
        if let Some(stats) = sender_stats.get_mut(sender) {
            stats.unique_styles_sent_count = styles.len();
        }
    }

    StatisticsSnapshot {
        sender_stats,
        total_unique_styles: unique_styles.len(),
    }
}

impl StatisticsSnapshot {
    /// Senders in display order.
    pub fn senders(&self) -> Vec<&str> {
        self.sender_stats.keys().map(String::as_str).collect()
    }

    /// Every receiver appearing under any sender, sorted.
    pub fn receivers(&self) -> Vec<&str> {
        self.sender_stats
            .values()
            .flat_map(|stats| stats.styles_to_receivers.keys())
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Matrix cell; zero when the pair never occurs.
    pub fn count(&self, sender: &str, receiver: &str) -> usize {
        self.sender_stats
            .get(sender)
            .and_then(|stats| stats.styles_to_receivers.get(receiver))
            .copied()
            .unwrap_or(0)
    }

    /// Column total for one receiver.
    pub fn receiver_total(&self, receiver: &str) -> usize {
        self.sender_stats
            .values()
            .filter_map(|stats| stats.styles_to_receivers.get(receiver))
            .sum()
    }

    /// Rows that left any sender.
    pub fn total_sent(&self) -> usize {
        self.sender_stats.values().map(|s| s.total_styles_sent).sum()
    }

    /// Rows routed to a receiver.
    pub fn total_routed(&self) -> usize {
        self.sender_stats
            .values()
            .flat_map(|s| s.styles_to_receivers.values())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sender_stats.is_empty()
    }
}
