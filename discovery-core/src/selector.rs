//! Deterministic, bounded selection of brokers.

use crate::broker::BrokerDescriptor;

/// Number of brokers handed out in a connection string by default.
pub const DEFAULT_BROKER_LIMIT: usize = 3;

/// Sort `brokers` ascending by id and keep the first `min(n, len)`.
///
/// Ids are unique because they come from distinct registry paths, so the sort
/// key alone fixes the order.
pub fn select_top(mut brokers: Vec<BrokerDescriptor>, n: usize) -> Vec<BrokerDescriptor> {
    brokers.sort_unstable_by_key(|broker| broker.id);
    brokers.truncate(n);
    brokers
}
