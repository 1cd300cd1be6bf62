/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
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

use crate::config::ConsumerConfig;
use std::time::Duration;
use tokio::sync::watch;
use topic_router::{BrokerError, TopicBroker};
use tracing::{info, warn};

/// Receives one entry at a time from `queue`, logs and deletes it, until shutdown.
/// Returns how many entries were consumed.
pub(crate) async fn run_consumer(
    broker: TopicBroker,
    queue: String,
    config: ConsumerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, BrokerError> {
    let visibility_timeout = config.visibility_timeout();
    let poll_interval = config.poll_interval();
    let mut consumed = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let received = broker.receive(&queue, 1, visibility_timeout).await?;
        for entry in received {
            match entry.entry.decode() {
                Ok(message) => info!("{queue}: {}", message.body()),
                Err(err) => warn!("{queue}: undecodable entry {}: {err}", entry.entry.message_id()),
            }
            broker.delete(&queue, entry.receipt_handle).await?;
            consumed += 1;
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("Stopping dequeue from '{queue}' after {consumed} message(s)");
    Ok(consumed)
}

/// Polls every queue until none holds a visible or in-flight entry.
pub(crate) async fn wait_until_drained(
    broker: &TopicBroker,
    poll_interval: Duration,
) -> Result<(), BrokerError> {
    loop {
        let mut pending = 0;
        for queue in broker.table().queues() {
            let depth = broker.depth(queue.name()).await?;
            pending += depth.visible + depth.in_flight;
        }
        if pending == 0 {
            return Ok(());
        }
        tokio::time::sleep(poll_interval).await;
    }
}
