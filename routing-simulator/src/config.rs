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

use serde::{Deserialize, Serialize};
use std::time::Duration;
use topic_router::MAX_VISIBILITY_TIMEOUT;

const MIN_INTERVAL_SECS: u64 = 1;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) routing_config: RoutingConfig,
    #[serde(default)]
    pub(crate) publisher: PublisherConfig,
    #[serde(default)]
    pub(crate) consumer: ConsumerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    pub(crate) file_path: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    #[serde(default = "default_publish_interval_secs")]
    pub(crate) publish_interval_secs: u64,
    #[serde(default = "default_versions")]
    pub(crate) versions: Vec<i32>,
    #[serde(default)]
    pub(crate) message_limit: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConsumerConfig {
    #[serde(default = "default_visibility_timeout_secs")]
    pub(crate) visibility_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub(crate) poll_interval_secs: u64,
}

fn default_publish_interval_secs() -> u64 {
    3
}

fn default_versions() -> Vec<i32> {
    vec![1, 2]
}

fn default_visibility_timeout_secs() -> u64 {
    5
}

fn default_poll_interval_secs() -> u64 {
    1
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            publish_interval_secs: default_publish_interval_secs(),
            versions: default_versions(),
            message_limit: None,
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            visibility_timeout_secs: default_visibility_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Config {
    pub fn from_json5(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config = json5::from_str(contents)?;
        if config.publisher.versions.is_empty() {
            return Err("publisher.versions must list at least one version".into());
        }
        Ok(config)
    }
}

impl PublisherConfig {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs.max(MIN_INTERVAL_SECS))
    }
}

impl ConsumerConfig {
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs).min(MAX_VISIBILITY_TIMEOUT)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_INTERVAL_SECS))
    }
}
