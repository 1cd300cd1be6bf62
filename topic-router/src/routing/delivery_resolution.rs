//! Delivery-target resolution: which queues a published message lands in.

use crate::definition::routing_table::{RoutingTable, Subscription};
use crate::message::Message;
use crate::observability::{events, fields};
use std::collections::BTreeSet;
use tracing::trace;

const COMPONENT: &str = "delivery_resolution";

/// Resolves matching subscriptions for messages published on one routing table.
pub(crate) struct DeliveryResolver<'a> {
    table: &'a RoutingTable,
}

impl<'a> DeliveryResolver<'a> {
    pub(crate) fn new(table: &'a RoutingTable) -> Self {
        Self { table }
    }

    /// Returns every subscription whose filter accepts the message, in declaration order.
    ///
    /// Subscriptions are evaluated independently; overlapping filters fan out.
    pub(crate) fn matching_subscriptions(&self, message: &Message) -> Vec<&'a Subscription> {
        self.table
            .subscriptions()
            .iter()
            .filter(|subscription| {
                let matched = subscription.filter().matches(message);
                if !matched {
                    trace!(
                        event = events::DELIVERY_FILTER_SKIPPED,
                        component = COMPONENT,
                        topic = self.table.topic().name(),
                        queue = subscription.queue(),
                        attribute = subscription.filter().attribute().unwrap_or(fields::NONE),
                        attributes = %fields::format_attributes(message),
                        "subscription filter rejected message"
                    );
                }
                matched
            })
            .collect()
    }
}

/// Returns the names of the queues whose subscription filter accepts `message`.
///
/// Pure: the same message and table always produce the same set.
///
/// # Examples
///
/// ```
/// use topic_router::{delivery_targets, payload_key_table, Message};
///
/// let table = payload_key_table().unwrap();
///
/// let v1 = delivery_targets(&Message::new("m").with_attribute("version", 1), &table);
/// assert_eq!(v1.into_iter().collect::<Vec<_>>(), vec!["payload-v1-key-queue"]);
///
/// let v3 = delivery_targets(&Message::new("m").with_attribute("version", 3), &table);
/// assert!(v3.is_empty());
/// ```
pub fn delivery_targets(message: &Message, table: &RoutingTable) -> BTreeSet<String> {
    DeliveryResolver::new(table)
        .matching_subscriptions(message)
        .into_iter()
        .map(|subscription| subscription.queue().to_string())
        .collect()
}
