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

//! Interchange form of a routing table, as handed to a provisioning collaborator.

use crate::definition::filter_policy::{FilterPolicy, FilterPolicyError, NUMERIC_EQUALS_ONE_OF};
use crate::definition::routing_table::{
    self, RoutingDefinitionError, RoutingTable, Subscription,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RoutingDeclaration {
    pub topic: ResourceDeclaration,
    pub queues: Vec<ResourceDeclaration>,
    pub subscriptions: Vec<SubscriptionDeclaration>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResourceDeclaration {
    pub logical_id: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionDeclaration {
    pub topic: String,
    pub queue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_policy: Option<FilterPolicyDeclaration>,
    #[serde(default)]
    pub raw_message_delivery: bool,
}

/// Allowlist entries stay untyped here so that a non-numeric entry surfaces as a
/// validation error instead of a parse error.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterPolicyDeclaration {
    pub attribute: String,
    pub op: String,
    pub allowlist: Vec<Value>,
}

impl FilterPolicyDeclaration {
    fn to_filter_policy(&self) -> Result<FilterPolicy, FilterPolicyError> {
        if self.op != NUMERIC_EQUALS_ONE_OF {
            return Err(FilterPolicyError::UnsupportedOperator(self.op.clone()));
        }

        let allowlist = self
            .allowlist
            .iter()
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| FilterPolicyError::NonNumericAllowlistValue {
                        attribute: self.attribute.clone(),
                        value: value.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, FilterPolicyError>>()?;

        Ok(FilterPolicy::numeric_allowlist(
            self.attribute.clone(),
            allowlist,
        ))
    }
}

/// Integral values are written as JSON integers so `[1]` stays `[1]`, not `[1.0]`.
fn allowlist_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

impl From<&Subscription> for SubscriptionDeclaration {
    fn from(subscription: &Subscription) -> Self {
        let filter_policy = match subscription.filter() {
            FilterPolicy::NoFilter => None,
            FilterPolicy::AttributeEquals {
                attribute,
                allowlist,
            } => Some(FilterPolicyDeclaration {
                attribute: attribute.clone(),
                op: NUMERIC_EQUALS_ONE_OF.to_string(),
                allowlist: allowlist.iter().copied().map(allowlist_value).collect(),
            }),
        };

        Self {
            topic: subscription.topic().to_string(),
            queue: subscription.queue().to_string(),
            filter_policy,
            raw_message_delivery: subscription.raw_message_delivery(),
        }
    }
}

impl From<&RoutingTable> for RoutingDeclaration {
    fn from(table: &RoutingTable) -> Self {
        Self {
            topic: ResourceDeclaration {
                logical_id: table.topic().logical_id().to_string(),
                name: table.topic().name().to_string(),
            },
            queues: table
                .queues()
                .iter()
                .map(|queue| ResourceDeclaration {
                    logical_id: queue.logical_id().to_string(),
                    name: queue.name().to_string(),
                })
                .collect(),
            subscriptions: table
                .subscriptions()
                .iter()
                .map(SubscriptionDeclaration::from)
                .collect(),
        }
    }
}

impl RoutingDeclaration {
    /// Validates the declaration and turns it into a routing table.
    pub fn to_routing_table(&self) -> Result<RoutingTable, RoutingDefinitionError> {
        let topic = routing_table::topic(self.topic.logical_id.clone(), self.topic.name.clone());
        let queues = self
            .queues
            .iter()
            .map(|queue| routing_table::queue(queue.logical_id.clone(), queue.name.clone()))
            .collect();

        let mut subscriptions = Vec::with_capacity(self.subscriptions.len());
        for declaration in &self.subscriptions {
            let filter = match &declaration.filter_policy {
                None => FilterPolicy::NoFilter,
                Some(filter_policy) => filter_policy.to_filter_policy().map_err(|reason| {
                    RoutingDefinitionError::InvalidFilter {
                        queue: declaration.queue.clone(),
                        reason,
                    }
                })?,
            };
            subscriptions.push(routing_table::subscription(
                declaration.topic.clone(),
                declaration.queue.clone(),
                filter,
                declaration.raw_message_delivery,
            ));
        }

        RoutingTable::from_parts(topic, queues, subscriptions)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::RoutingDeclaration;
    use crate::definition::filter_policy::{FilterPolicy, FilterPolicyError};
    use crate::definition::routing_table::{definition_of, QueueDefinition, RoutingDefinitionError};
    use serde_json::json;

    fn declaration(value: serde_json::Value) -> RoutingDeclaration {
        serde_json::from_value(value).expect("declaration should deserialize")
    }

    #[test]
    fn export_uses_integer_allowlists_and_omits_missing_filters() {
        let table = definition_of(
            "topic-a",
            [
                QueueDefinition::new("queue-a")
                    .with_filter(FilterPolicy::numeric_allowlist("version", [1.0, 2.5]))
                    .with_raw_message_delivery(true),
                QueueDefinition::new("queue-b"),
            ],
        )
        .expect("table should build");

        let exported =
            serde_json::to_value(RoutingDeclaration::from(&table)).expect("serializes");

        assert_eq!(
            exported["subscriptions"][0]["filter_policy"],
            json!({"attribute": "version", "op": "numeric-equals-one-of", "allowlist": [1, 2.5]})
        );
        assert_eq!(exported["subscriptions"][0]["raw_message_delivery"], json!(true));
        assert!(exported["subscriptions"][1].get("filter_policy").is_none());
    }

    #[test]
    fn import_rebuilds_equivalent_table() {
        let table = definition_of(
            "topic-a",
            [QueueDefinition::new("queue-a")
                .with_filter(FilterPolicy::numeric_allowlist("version", [3.0]))],
        )
        .expect("table should build");

        let rebuilt = RoutingDeclaration::from(&table)
            .to_routing_table()
            .expect("declaration should import");

        assert_eq!(rebuilt, table);
    }

    #[test]
    fn import_rejects_non_numeric_allowlist_values() {
        let result = declaration(json!({
            "topic": {"logical_id": "t", "name": "t"},
            "queues": [{"logical_id": "q", "name": "q"}],
            "subscriptions": [{
                "topic": "t",
                "queue": "q",
                "filter_policy": {"attribute": "version", "op": "numeric-equals-one-of", "allowlist": ["one"]},
                "raw_message_delivery": true
            }]
        }))
        .to_routing_table();

        assert_eq!(
            result,
            Err(RoutingDefinitionError::InvalidFilter {
                queue: "q".to_string(),
                reason: FilterPolicyError::NonNumericAllowlistValue {
                    attribute: "version".to_string(),
                    value: "\"one\"".to_string(),
                },
            })
        );
    }

    #[test]
    fn import_rejects_unknown_operator() {
        let result = declaration(json!({
            "topic": {"logical_id": "t", "name": "t"},
            "queues": [{"logical_id": "q", "name": "q"}],
            "subscriptions": [{
                "topic": "t",
                "queue": "q",
                "filter_policy": {"attribute": "version", "op": "prefix", "allowlist": [1]}
            }]
        }))
        .to_routing_table();

        assert!(matches!(
            result,
            Err(RoutingDefinitionError::InvalidFilter {
                reason: FilterPolicyError::UnsupportedOperator(_),
                ..
            })
        ));
    }

    #[test]
    fn import_rejects_dangling_and_doubled_subscriptions() {
        let unknown_queue = declaration(json!({
            "topic": {"logical_id": "t", "name": "t"},
            "queues": [],
            "subscriptions": [{"topic": "t", "queue": "missing"}]
        }))
        .to_routing_table();
        assert_eq!(
            unknown_queue,
            Err(RoutingDefinitionError::UnknownQueue("missing".to_string()))
        );

        let wrong_topic = declaration(json!({
            "topic": {"logical_id": "t", "name": "t"},
            "queues": [{"logical_id": "q", "name": "q"}],
            "subscriptions": [{"topic": "other", "queue": "q"}]
        }))
        .to_routing_table();
        assert!(matches!(
            wrong_topic,
            Err(RoutingDefinitionError::TopicMismatch { .. })
        ));

        let doubled = declaration(json!({
            "topic": {"logical_id": "t", "name": "t"},
            "queues": [{"logical_id": "q", "name": "q"}],
            "subscriptions": [
                {"topic": "t", "queue": "q"},
                {"topic": "t", "queue": "q", "raw_message_delivery": true}
            ]
        }))
        .to_routing_table();
        assert_eq!(
            doubled,
            Err(RoutingDefinitionError::DuplicateSubscription("q".to_string()))
        );
    }

    #[test]
    fn unsubscribed_queue_is_accepted() {
        let table = declaration(json!({
            "topic": {"logical_id": "t", "name": "t"},
            "queues": [{"logical_id": "q", "name": "q"}],
            "subscriptions": []
        }))
        .to_routing_table()
        .expect("declaration should import");

        assert!(table.subscription_for("q").is_none());
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let parsed: Result<RoutingDeclaration, _> = serde_json::from_value(json!({
            "topic": {"logical_id": "t", "name": "t", "fifo": true},
            "queues": [],
            "subscriptions": []
        }));

        assert!(parsed.is_err());
    }
}
