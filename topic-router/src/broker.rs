/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::definition::routing_table::{RoutingDefinitionError, RoutingTable};
use crate::delivery::envelope::{EnvelopeError, QueueEntry};
use crate::delivery::queue_store::{QueueDepth, QueueStore, ReceivedEntry};
use crate::message::{AttributeParseError, Message};
use crate::observability::{events, fields};
use crate::routing::declaration_source::{DeclarationSourceError, RoutingDeclarationSource};
use crate::routing::delivery_resolution::DeliveryResolver;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "topic_broker";

/// Failures surfaced by [`TopicBroker`].
#[derive(Debug)]
pub enum BrokerError {
    Definition(RoutingDefinitionError),
    Source(DeclarationSourceError),
    Envelope(EnvelopeError),
    InvalidAttribute {
        name: String,
        reason: AttributeParseError,
    },
    UnknownQueue(String),
    UnknownReceipt { queue: String, receipt_handle: Uuid },
    Withdrawn,
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::Definition(err) => write!(f, "invalid routing definition: {err}"),
            BrokerError::Source(err) => write!(f, "routing declaration unavailable: {err}"),
            BrokerError::Envelope(err) => write!(f, "unable to build queue entry: {err}"),
            BrokerError::InvalidAttribute { name, reason } => {
                write!(f, "message attribute '{name}' rejected: {reason}")
            }
            BrokerError::UnknownQueue(queue) => write!(f, "queue '{queue}' is not declared"),
            BrokerError::UnknownReceipt {
                queue,
                receipt_handle,
            } => write!(
                f,
                "receipt handle {receipt_handle} is unknown or stale for queue '{queue}'"
            ),
            BrokerError::Withdrawn => write!(f, "routing configuration has been withdrawn"),
        }
    }
}

impl Error for BrokerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BrokerError::Definition(err) => Some(err),
            BrokerError::Source(err) => Some(err),
            BrokerError::Envelope(err) => Some(err),
            BrokerError::InvalidAttribute { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<RoutingDefinitionError> for BrokerError {
    fn from(err: RoutingDefinitionError) -> Self {
        BrokerError::Definition(err)
    }
}

impl From<DeclarationSourceError> for BrokerError {
    fn from(err: DeclarationSourceError) -> Self {
        BrokerError::Source(err)
    }
}

/// Outcome of one publish: the assigned id and the queues the message was delivered to.
#[derive(Clone, Debug, PartialEq)]
pub struct PublishReceipt {
    pub message_id: Uuid,
    pub sent_at: DateTime<Utc>,
    pub targets: BTreeSet<String>,
}

struct BrokerInner {
    name: String,
    table: RoutingTable,
    queues: HashMap<String, QueueStore>,
    withdrawn: AtomicBool,
}

///
/// [`TopicBroker`] is an in-memory stand-in for the managed messaging service: it owns one
/// routing table, fans published messages out to the queues whose filters accept them, and
/// serves queue entries to consumers.
///
/// All queues are created with the broker and torn down together by
/// [`withdraw`](TopicBroker::withdraw). Clones share the same queues.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use topic_router::{payload_key_table, Message, TopicBroker, PAYLOAD_V1_KEY_QUEUE};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let broker = TopicBroker::new("doc", payload_key_table().unwrap());
///
/// let receipt = broker
///     .publish(Message::new("Message to version 1.").with_attribute("version", 1))
///     .await
///     .unwrap();
/// assert!(receipt.targets.contains(PAYLOAD_V1_KEY_QUEUE));
///
/// let received = broker
///     .receive(PAYLOAD_V1_KEY_QUEUE, 1, Duration::from_secs(5))
///     .await
///     .unwrap();
/// assert_eq!(received[0].entry.body(), "Message to version 1.");
///
/// broker
///     .delete(PAYLOAD_V1_KEY_QUEUE, received[0].receipt_handle)
///     .await
///     .unwrap();
/// # });
/// ```
#[derive(Clone)]
pub struct TopicBroker {
    inner: Arc<BrokerInner>,
}

impl TopicBroker {
    /// Creates every declared queue and starts accepting publishes.
    pub fn new(name: &str, table: RoutingTable) -> Self {
        let queues = table
            .queues()
            .iter()
            .map(|queue| (queue.name().to_string(), QueueStore::new(queue.name())))
            .collect();

        info!(
            event = events::BROKER_CREATE,
            component = COMPONENT,
            broker = name,
            topic = table.topic().name(),
            queues = table.queues().len(),
            "broker created"
        );

        Self {
            inner: Arc::new(BrokerInner {
                name: name.to_string(),
                table,
                queues,
                withdrawn: AtomicBool::new(false),
            }),
        }
    }

    /// Fetches and validates a declaration, then creates the broker from it.
    pub async fn from_source(
        name: &str,
        source: &dyn RoutingDeclarationSource,
    ) -> Result<Self, BrokerError> {
        let table = match source.fetch_declaration().await {
            Ok(declaration) => declaration.to_routing_table().map_err(BrokerError::from),
            Err(err) => Err(BrokerError::from(err)),
        };

        match table {
            Ok(table) => Ok(Self::new(name, table)),
            Err(err) => {
                warn!(
                    event = events::BROKER_CREATE_FAILED,
                    component = COMPONENT,
                    broker = name,
                    err = %err,
                    "unable to create broker from declaration source"
                );
                Err(err)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn table(&self) -> &RoutingTable {
        &self.inner.table
    }

    fn ensure_active(&self) -> Result<(), BrokerError> {
        if self.inner.withdrawn.load(Ordering::Acquire) {
            return Err(BrokerError::Withdrawn);
        }
        Ok(())
    }

    fn queue_store(&self, queue: &str) -> Result<&QueueStore, BrokerError> {
        self.ensure_active()?;
        self.inner
            .queues
            .get(queue)
            .ok_or_else(|| BrokerError::UnknownQueue(queue.to_string()))
    }

    /// Publishes a message on the topic and delivers one entry to every matching queue.
    ///
    /// Messages carrying a non-finite numeric attribute are rejected before routing.
    ///
    /// Entries are built before any queue is touched, so a message is delivered to all of its
    /// targets or to none.
    pub async fn publish(&self, message: Message) -> Result<PublishReceipt, BrokerError> {
        self.ensure_active()?;
        message
            .validate_attributes()
            .map_err(|(name, reason)| BrokerError::InvalidAttribute { name, reason })?;

        let table = &self.inner.table;
        let message_id = Uuid::new_v4();
        let sent_at = Utc::now();

        let mut deliveries = Vec::new();
        for subscription in DeliveryResolver::new(table).matching_subscriptions(&message) {
            let entry = if subscription.raw_message_delivery() {
                QueueEntry::raw(message_id, sent_at, &message)
            } else {
                QueueEntry::enveloped(table.topic().name(), message_id, sent_at, &message)
                    .map_err(BrokerError::Envelope)?
            };
            deliveries.push((subscription.queue(), entry));
        }

        let mut targets = BTreeSet::new();
        for (queue, entry) in deliveries {
            self.queue_store(queue)?.enqueue(entry).await;
            targets.insert(queue.to_string());
        }

        if targets.is_empty() {
            debug!(
                event = events::PUBLISH_UNROUTED,
                component = COMPONENT,
                topic = table.topic().name(),
                msg_id = %message_id,
                attributes = %fields::format_attributes(&message),
                "message matched no subscription"
            );
        } else {
            debug!(
                event = events::PUBLISH_ROUTED,
                component = COMPONENT,
                topic = table.topic().name(),
                msg_id = %message_id,
                targets = %fields::format_targets(&targets),
                "message delivered"
            );
        }

        Ok(PublishReceipt {
            message_id,
            sent_at,
            targets,
        })
    }

    /// Receives up to `max_entries` entries from `queue`, hiding them for
    /// `visibility_timeout`.
    pub async fn receive(
        &self,
        queue: &str,
        max_entries: usize,
        visibility_timeout: Duration,
    ) -> Result<Vec<ReceivedEntry>, BrokerError> {
        Ok(self
            .queue_store(queue)?
            .receive(max_entries, visibility_timeout)
            .await)
    }

    /// Deletes a received entry using the receipt handle of its latest delivery.
    pub async fn delete(&self, queue: &str, receipt_handle: Uuid) -> Result<(), BrokerError> {
        if self.queue_store(queue)?.delete(&receipt_handle).await {
            Ok(())
        } else {
            Err(BrokerError::UnknownReceipt {
                queue: queue.to_string(),
                receipt_handle,
            })
        }
    }

    pub async fn depth(&self, queue: &str) -> Result<QueueDepth, BrokerError> {
        Ok(self.queue_store(queue)?.depth().await)
    }

    /// Tears every queue down at once. Later calls on any clone fail with
    /// [`BrokerError::Withdrawn`].
    pub async fn withdraw(&self) -> Result<(), BrokerError> {
        if self.inner.withdrawn.swap(true, Ordering::AcqRel) {
            return Err(BrokerError::Withdrawn);
        }

        for queue in self.inner.queues.values() {
            queue.purge().await;
        }

        info!(
            event = events::BROKER_WITHDRAW,
            component = COMPONENT,
            broker = self.inner.name.as_str(),
            topic = self.inner.table.topic().name(),
            "routing configuration withdrawn"
        );
        Ok(())
    }
}
