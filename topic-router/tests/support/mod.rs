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

use std::collections::BTreeSet;
use topic_router::{payload_key_table, Message, RoutingTable, TopicBroker, VERSION_ATTRIBUTE};

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub(crate) fn payload_table() -> RoutingTable {
    payload_key_table().expect("payload-key table should build")
}

#[allow(dead_code)]
pub(crate) fn make_broker(name: &str) -> TopicBroker {
    TopicBroker::new(name, payload_table())
}

pub(crate) fn versioned_message(version: i32) -> Message {
    Message::new(format!("Message to version {version}.")).with_attribute(VERSION_ATTRIBUTE, version)
}

#[allow(dead_code)]
pub(crate) fn queue_set(queues: &[&str]) -> BTreeSet<String> {
    queues.iter().map(|queue| queue.to_string()).collect()
}
