//! Renders selected brokers as a client bootstrap string.

use crate::broker::BrokerDescriptor;

/// Join brokers as `host:port,host:port,...` in the order given.
///
/// Returns `None` when there are no brokers: callers get an explicit
/// "no brokers" signal instead of an empty bootstrap string.
pub fn build(brokers: &[BrokerDescriptor]) -> Option<String> {
    if brokers.is_empty() {
        return None;
    }
    Some(
        brokers
            .iter()
            .map(BrokerDescriptor::address)
            .collect::<Vec<_>>()
            .join(","),
    )
}
