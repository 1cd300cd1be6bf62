//! Routing-table data model and definition-time validation.

use crate::definition::filter_policy::{FilterPolicy, FilterPolicyError};
use crate::observability::events;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracing::{debug, warn};

const COMPONENT: &str = "routing_table";

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
/// The broadcast channel messages are published on.
pub struct Topic {
    logical_id: String,
    name: String,
}

impl Topic {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
/// A durable buffer that receives the messages its subscription lets through.
pub struct Queue {
    logical_id: String,
    name: String,
}

impl Queue {
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Binding of the topic to exactly one queue.
///
/// Has no identity beyond its `(topic, queue, filter)` tuple.
pub struct Subscription {
    topic: String,
    queue: String,
    filter: FilterPolicy,
    raw_message_delivery: bool,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn filter(&self) -> &FilterPolicy {
        &self.filter
    }

    pub fn raw_message_delivery(&self) -> bool {
        self.raw_message_delivery
    }
}

/// Topic input for [`definition_of`]. The logical id defaults to the topic name.
#[derive(Clone, Debug)]
pub struct TopicDefinition {
    name: String,
    logical_id: Option<String>,
}

impl TopicDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_id: None,
        }
    }

    pub fn with_logical_id(mut self, logical_id: impl Into<String>) -> Self {
        self.logical_id = Some(logical_id.into());
        self
    }
}

impl From<&str> for TopicDefinition {
    fn from(name: &str) -> Self {
        TopicDefinition::new(name)
    }
}

impl From<String> for TopicDefinition {
    fn from(name: String) -> Self {
        TopicDefinition::new(name)
    }
}

/// Queue input for [`definition_of`]: the queue plus how it subscribes to the topic.
#[derive(Clone, Debug)]
pub struct QueueDefinition {
    name: String,
    logical_id: Option<String>,
    filter: FilterPolicy,
    raw_message_delivery: bool,
}

impl QueueDefinition {
    /// Unfiltered, enveloped delivery unless configured otherwise.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_id: None,
            filter: FilterPolicy::NoFilter,
            raw_message_delivery: false,
        }
    }

    pub fn with_logical_id(mut self, logical_id: impl Into<String>) -> Self {
        self.logical_id = Some(logical_id.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterPolicy) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_raw_message_delivery(mut self, raw_message_delivery: bool) -> Self {
        self.raw_message_delivery = raw_message_delivery;
        self
    }
}

/// Configuration-validation failures, raised when a table is built.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDefinitionError {
    EmptyTopicName,
    EmptyQueueName,
    EmptyLogicalId,
    DuplicateQueueName(String),
    DuplicateLogicalId(String),
    InvalidFilter {
        queue: String,
        reason: FilterPolicyError,
    },
    TopicMismatch {
        expected: String,
        found: String,
    },
    UnknownQueue(String),
    DuplicateSubscription(String),
}

impl Display for RoutingDefinitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingDefinitionError::EmptyTopicName => write!(f, "topic name must not be empty"),
            RoutingDefinitionError::EmptyQueueName => write!(f, "queue name must not be empty"),
            RoutingDefinitionError::EmptyLogicalId => write!(f, "logical id must not be empty"),
            RoutingDefinitionError::DuplicateQueueName(name) => {
                write!(f, "duplicate queue name '{name}'")
            }
            RoutingDefinitionError::DuplicateLogicalId(logical_id) => {
                write!(f, "duplicate logical id '{logical_id}'")
            }
            RoutingDefinitionError::InvalidFilter { queue, reason } => {
                write!(f, "invalid filter for queue '{queue}': {reason}")
            }
            RoutingDefinitionError::TopicMismatch { expected, found } => {
                write!(
                    f,
                    "subscription references topic '{found}' but the declared topic is '{expected}'"
                )
            }
            RoutingDefinitionError::UnknownQueue(name) => {
                write!(f, "subscription references undeclared queue '{name}'")
            }
            RoutingDefinitionError::DuplicateSubscription(name) => {
                write!(f, "queue '{name}' has more than one subscription")
            }
        }
    }
}

impl Error for RoutingDefinitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RoutingDefinitionError::InvalidFilter { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Immutable routing table: one topic, its queues, and one subscription per bound queue.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutingTable {
    topic: Topic,
    queues: Vec<Queue>,
    subscriptions: Vec<Subscription>,
}

impl RoutingTable {
    /// Validates and assembles a table from already separated parts.
    ///
    /// Queues without a subscription are legal and receive nothing.
    pub(crate) fn from_parts(
        topic: Topic,
        queues: Vec<Queue>,
        subscriptions: Vec<Subscription>,
    ) -> Result<Self, RoutingDefinitionError> {
        let table = Self {
            topic,
            queues,
            subscriptions,
        };

        match table.validate() {
            Ok(()) => {
                debug!(
                    event = events::ROUTING_TABLE_DEFINED,
                    component = COMPONENT,
                    topic = table.topic.name.as_str(),
                    queues = table.queues.len(),
                    subscriptions = table.subscriptions.len(),
                    "routing table defined"
                );
                Ok(table)
            }
            Err(err) => {
                warn!(
                    event = events::ROUTING_TABLE_REJECTED,
                    component = COMPONENT,
                    topic = table.topic.name.as_str(),
                    err = %err,
                    "routing table rejected"
                );
                Err(err)
            }
        }
    }

    fn validate(&self) -> Result<(), RoutingDefinitionError> {
        if self.topic.name.trim().is_empty() {
            return Err(RoutingDefinitionError::EmptyTopicName);
        }

        let mut logical_ids = HashSet::new();
        if self.topic.logical_id.trim().is_empty() {
            return Err(RoutingDefinitionError::EmptyLogicalId);
        }
        logical_ids.insert(self.topic.logical_id.as_str());

        let mut queue_names = HashSet::new();
        for queue in &self.queues {
            if queue.name.trim().is_empty() {
                return Err(RoutingDefinitionError::EmptyQueueName);
            }
            if queue.logical_id.trim().is_empty() {
                return Err(RoutingDefinitionError::EmptyLogicalId);
            }
            if !queue_names.insert(queue.name.as_str()) {
                return Err(RoutingDefinitionError::DuplicateQueueName(
                    queue.name.clone(),
                ));
            }
            if !logical_ids.insert(queue.logical_id.as_str()) {
                return Err(RoutingDefinitionError::DuplicateLogicalId(
                    queue.logical_id.clone(),
                ));
            }
        }

        let mut bound_queues = HashSet::new();
        for subscription in &self.subscriptions {
            if subscription.topic != self.topic.name {
                return Err(RoutingDefinitionError::TopicMismatch {
                    expected: self.topic.name.clone(),
                    found: subscription.topic.clone(),
                });
            }
            if !queue_names.contains(subscription.queue.as_str()) {
                return Err(RoutingDefinitionError::UnknownQueue(
                    subscription.queue.clone(),
                ));
            }
            if !bound_queues.insert(subscription.queue.as_str()) {
                return Err(RoutingDefinitionError::DuplicateSubscription(
                    subscription.queue.clone(),
                ));
            }
            subscription
                .filter
                .validate()
                .map_err(|reason| RoutingDefinitionError::InvalidFilter {
                    queue: subscription.queue.clone(),
                    reason,
                })?;
        }

        Ok(())
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn queue(&self, name: &str) -> Option<&Queue> {
        self.queues.iter().find(|queue| queue.name == name)
    }

    pub fn subscription_for(&self, queue_name: &str) -> Option<&Subscription> {
        self.subscriptions
            .iter()
            .find(|subscription| subscription.queue == queue_name)
    }
}

pub(crate) fn topic(logical_id: String, name: String) -> Topic {
    Topic { logical_id, name }
}

pub(crate) fn queue(logical_id: String, name: String) -> Queue {
    Queue { logical_id, name }
}

pub(crate) fn subscription(
    topic: String,
    queue: String,
    filter: FilterPolicy,
    raw_message_delivery: bool,
) -> Subscription {
    Subscription {
        topic,
        queue,
        filter,
        raw_message_delivery,
    }
}

/// Builds the static routing table for one topic and its filtered queues.
///
/// Every queue gets exactly one subscription to the topic. Fails on empty or duplicate
/// names and on malformed filters; nothing is deferred to delivery time.
///
/// # Examples
///
/// ```
/// use topic_router::{definition_of, FilterPolicy, QueueDefinition, RoutingDefinitionError};
///
/// let table = definition_of(
///     "orders",
///     [
///         QueueDefinition::new("orders-eu")
///             .with_filter(FilterPolicy::numeric_allowlist("region", [1.0])),
///         QueueDefinition::new("orders-audit"),
///     ],
/// )
/// .unwrap();
/// assert_eq!(table.queues().len(), 2);
///
/// let duplicate = definition_of(
///     "orders",
///     [QueueDefinition::new("orders-eu"), QueueDefinition::new("orders-eu")],
/// );
/// assert_eq!(
///     duplicate,
///     Err(RoutingDefinitionError::DuplicateQueueName("orders-eu".to_string()))
/// );
/// ```
pub fn definition_of(
    topic_definition: impl Into<TopicDefinition>,
    queue_definitions: impl IntoIterator<Item = QueueDefinition>,
) -> Result<RoutingTable, RoutingDefinitionError> {
    let topic_definition = topic_definition.into();
    let topic_logical_id = topic_definition
        .logical_id
        .unwrap_or_else(|| topic_definition.name.clone());
    let topic_name = topic_definition.name;

    let mut queues = Vec::new();
    let mut subscriptions = Vec::new();
    for definition in queue_definitions {
        let logical_id = definition
            .logical_id
            .unwrap_or_else(|| definition.name.clone());
        queues.push(queue(logical_id, definition.name.clone()));
        subscriptions.push(subscription(
            topic_name.clone(),
            definition.name,
            definition.filter,
            definition.raw_message_delivery,
        ));
    }

    RoutingTable::from_parts(topic(topic_logical_id, topic_name), queues, subscriptions)
}

#[cfg(test)]
mod tests {
    use super::{definition_of, QueueDefinition, RoutingDefinitionError, TopicDefinition};
    use crate::definition::filter_policy::{FilterPolicy, FilterPolicyError};
    use std::error::Error;

    #[test]
    fn logical_ids_default_to_names() {
        let table = definition_of("topic-a", [QueueDefinition::new("queue-a")])
            .expect("table should build");

        assert_eq!(table.topic().logical_id(), "topic-a");
        assert_eq!(table.queues()[0].logical_id(), "queue-a");
        assert_eq!(table.subscriptions()[0].topic(), "topic-a");
        assert!(!table.subscriptions()[0].raw_message_delivery());
    }

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(
            definition_of("  ", [QueueDefinition::new("queue-a")]),
            Err(RoutingDefinitionError::EmptyTopicName)
        );
        assert_eq!(
            definition_of("topic-a", [QueueDefinition::new("")]),
            Err(RoutingDefinitionError::EmptyQueueName)
        );
    }

    #[test]
    fn logical_id_shared_between_topic_and_queue_is_rejected() {
        let result = definition_of(
            TopicDefinition::new("topic-a").with_logical_id("shared"),
            [QueueDefinition::new("queue-a").with_logical_id("shared")],
        );

        assert_eq!(
            result,
            Err(RoutingDefinitionError::DuplicateLogicalId(
                "shared".to_string()
            ))
        );
    }

    #[test]
    fn queue_named_like_topic_is_a_logical_id_clash() {
        let result = definition_of("same", [QueueDefinition::new("same")]);

        assert_eq!(
            result,
            Err(RoutingDefinitionError::DuplicateLogicalId("same".to_string()))
        );
    }

    #[test]
    fn malformed_filter_names_the_queue_and_exposes_source() {
        let error = definition_of(
            "topic-a",
            [QueueDefinition::new("queue-a")
                .with_filter(FilterPolicy::numeric_allowlist("version", Vec::new()))],
        )
        .expect_err("empty allowlist must be rejected");

        assert_eq!(
            error,
            RoutingDefinitionError::InvalidFilter {
                queue: "queue-a".to_string(),
                reason: FilterPolicyError::EmptyAllowlist {
                    attribute: "version".to_string()
                },
            }
        );
        assert!(error.to_string().contains("queue-a"));
        assert!(error.source().is_some());
    }

    #[test]
    fn lookup_by_queue_name() {
        let table = definition_of(
            "topic-a",
            [
                QueueDefinition::new("queue-a").with_raw_message_delivery(true),
                QueueDefinition::new("queue-b"),
            ],
        )
        .expect("table should build");

        assert!(table.queue("queue-b").is_some());
        assert!(table.queue("queue-c").is_none());
        assert!(table
            .subscription_for("queue-a")
            .expect("queue-a is subscribed")
            .raw_message_delivery());
    }

    #[test]
    fn topic_without_queues_is_legal() {
        let table = definition_of("topic-a", Vec::new()).expect("table should build");

        assert!(table.queues().is_empty());
        assert!(table.subscriptions().is_empty());
    }
}
