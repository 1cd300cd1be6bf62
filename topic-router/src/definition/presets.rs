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

//! The payload-key routing configuration: one topic, one queue per payload version.

use crate::definition::filter_policy::FilterPolicy;
use crate::definition::routing_table::{
    definition_of, QueueDefinition, RoutingDefinitionError, RoutingTable,
};

pub const PAYLOAD_KEY_TOPIC: &str = "payload-key-topic";
pub const PAYLOAD_V1_KEY_QUEUE: &str = "payload-v1-key-queue";
pub const PAYLOAD_V2_KEY_QUEUE: &str = "payload-v2-key-queue";
pub const VERSION_ATTRIBUTE: &str = "version";

/// Builds the payload-key table: `version = 1` goes to the v1 queue, `version = 2` to the
/// v2 queue, both with raw delivery.
pub fn payload_key_table() -> Result<RoutingTable, RoutingDefinitionError> {
    definition_of(
        PAYLOAD_KEY_TOPIC,
        [
            versioned_queue(PAYLOAD_V1_KEY_QUEUE, 1.0),
            versioned_queue(PAYLOAD_V2_KEY_QUEUE, 2.0),
        ],
    )
}

fn versioned_queue(name: &str, version: f64) -> QueueDefinition {
    QueueDefinition::new(name)
        .with_filter(FilterPolicy::numeric_allowlist(VERSION_ATTRIBUTE, [version]))
        .with_raw_message_delivery(true)
}
