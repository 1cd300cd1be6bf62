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

use crate::config::PublisherConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::watch;
use topic_router::{BrokerError, Message, TopicBroker, VERSION_ATTRIBUTE};
use tracing::info;

pub(crate) fn versioned_message(version: i32) -> Message {
    Message::new(format!("Message to version {version}.")).with_attribute(VERSION_ATTRIBUTE, version)
}

/// Publishes one message per interval with a randomly chosen version until shutdown or until
/// `message_limit` messages went out. Returns how many were published.
pub(crate) async fn run_publisher<R: Rng + Send>(
    broker: TopicBroker,
    config: PublisherConfig,
    mut rng: R,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, BrokerError> {
    let interval = config.publish_interval();
    let mut published = 0;

    info!("Starting publish loop on topic '{}'", broker.table().topic().name());
    loop {
        if *shutdown.borrow() {
            break;
        }
        if config
            .message_limit
            .is_some_and(|limit| published >= limit)
        {
            break;
        }

        let Some(version) = config.versions.choose(&mut rng).copied() else {
            break;
        };
        let receipt = broker.publish(versioned_message(version)).await?;
        published += 1;
        info!(
            "Enqueued message for version {version} ({} target(s))",
            receipt.targets.len()
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("Publish loop stopped after {published} message(s)");
    Ok(published)
}

#[cfg(test)]
mod tests {
    use super::run_publisher;
    use crate::config::PublisherConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;
    use tokio::sync::watch;
    use topic_router::{payload_key_table, TopicBroker, PAYLOAD_V1_KEY_QUEUE, PAYLOAD_V2_KEY_QUEUE};

    fn broker() -> TopicBroker {
        TopicBroker::new("publisher-test", payload_key_table().expect("preset builds"))
    }

    #[tokio::test(start_paused = true)]
    async fn message_limit_stops_the_publisher() {
        let broker = broker();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = PublisherConfig {
            publish_interval_secs: 1,
            versions: vec![1, 2],
            message_limit: Some(6),
        };

        let published = run_publisher(
            broker.clone(),
            config,
            StdRng::seed_from_u64(7),
            shutdown_rx,
        )
        .await
        .expect("publisher should finish");

        assert_eq!(published, 6);
        let v1 = broker.depth(PAYLOAD_V1_KEY_QUEUE).await.expect("depth").visible;
        let v2 = broker.depth(PAYLOAD_V2_KEY_QUEUE).await.expect("depth").visible;
        assert_eq!(v1 + v2, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_stops_the_publisher() {
        let broker = broker();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = PublisherConfig {
            publish_interval_secs: 10,
            versions: vec![2],
            message_limit: None,
        };

        let task = tokio::spawn(run_publisher(
            broker.clone(),
            config,
            StdRng::seed_from_u64(1),
            shutdown_rx,
        ));
        tokio::time::sleep(Duration::from_secs(15)).await;
        shutdown_tx.send(true).expect("publisher is listening");

        let published = task
            .await
            .expect("publisher task joins")
            .expect("publisher should finish");
        assert_eq!(published, 2);
        assert_eq!(
            broker.depth(PAYLOAD_V2_KEY_QUEUE).await.expect("depth").visible,
            2
        );
    }
}
