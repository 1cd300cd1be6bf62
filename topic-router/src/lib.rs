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

//! # topic-router
//!
//! `topic-router` models a publish/subscribe routing configuration: one topic, a set of
//! durable queues, and one filtered subscription per queue. It provides the delivery
//! contract a managed messaging service must honor, the declaration handed to provisioning
//! tools, and an in-memory broker that reproduces delivery end to end.
//!
//! ## Delivery contract
//!
//! ```
//! use topic_router::{
//!     delivery_targets, payload_key_table, Message, PAYLOAD_V1_KEY_QUEUE, PAYLOAD_V2_KEY_QUEUE,
//! };
//!
//! let table = payload_key_table().unwrap();
//!
//! for (version, queue) in [(1, PAYLOAD_V1_KEY_QUEUE), (2, PAYLOAD_V2_KEY_QUEUE)] {
//!     let message = Message::new("payload").with_attribute("version", version);
//!     let targets = delivery_targets(&message, &table);
//!     assert_eq!(targets.len(), 1);
//!     assert!(targets.contains(queue));
//! }
//!
//! assert!(delivery_targets(&Message::new("no version"), &table).is_empty());
//! ```
//!
//! ## Declaring a configuration
//!
//! ```
//! use topic_router::{definition_of, FilterPolicy, QueueDefinition, RoutingDeclaration};
//!
//! let table = definition_of(
//!     "payload-key-topic",
//!     [QueueDefinition::new("payload-v1-key-queue")
//!         .with_filter(FilterPolicy::numeric_allowlist("version", [1.0]))
//!         .with_raw_message_delivery(true)],
//! )
//! .unwrap();
//!
//! let json = RoutingDeclaration::from(&table).to_json_pretty().unwrap();
//! assert!(json.contains("numeric-equals-one-of"));
//! ```
//!
//! ## Internal architecture map
//!
//! - Definition: routing-table model, filter predicates, validation, interchange declaration
//! - Routing: filter evaluation and the declaration-source seam
//! - Delivery: raw/enveloped queue entries and visibility-timeout queue stores
//! - Broker: outward facade tying the three together
//!
//! ## Observability model
//!
//! Library code emits `tracing` events and never installs a global subscriber. Binaries and
//! tests initialize `tracing_subscriber` once at their process boundary.

mod broker;
pub use broker::{BrokerError, PublishReceipt, TopicBroker};

mod definition;
pub use definition::declaration::{
    FilterPolicyDeclaration, ResourceDeclaration, RoutingDeclaration, SubscriptionDeclaration,
};
pub use definition::filter_policy::{FilterPolicy, FilterPolicyError, NUMERIC_EQUALS_ONE_OF};
pub use definition::presets::{
    payload_key_table, PAYLOAD_KEY_TOPIC, PAYLOAD_V1_KEY_QUEUE, PAYLOAD_V2_KEY_QUEUE,
    VERSION_ATTRIBUTE,
};
pub use definition::routing_table::{
    definition_of, Queue, QueueDefinition, RoutingDefinitionError, RoutingTable, Subscription,
    Topic, TopicDefinition,
};

mod delivery;
pub use delivery::envelope::{EnvelopeError, NotificationEnvelope, QueueEntry};
pub use delivery::queue_store::{QueueDepth, ReceivedEntry, MAX_VISIBILITY_TIMEOUT};

mod message;
pub use message::{AttributeParseError, AttributeValue, Message};

#[doc(hidden)]
pub mod observability;

mod routing;
pub use routing::declaration_source::{DeclarationSourceError, RoutingDeclarationSource};
pub use routing::delivery_resolution::delivery_targets;
