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

//! Value-format helpers for structured event fields.

use crate::message::Message;
use std::collections::BTreeSet;

pub const NONE: &str = "none";

/// Formats attributes as `name=value` pairs in name order.
pub fn format_attributes(message: &Message) -> String {
    if message.attributes().is_empty() {
        return NONE.to_string();
    }

    message
        .attributes()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_targets(targets: &BTreeSet<String>) -> String {
    if targets.is_empty() {
        return NONE.to_string();
    }

    targets.iter().cloned().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::{format_attributes, format_targets, NONE};
    use crate::message::Message;
    use std::collections::BTreeSet;

    #[test]
    fn format_attributes_is_sorted_and_compact() {
        let message = Message::new("m")
            .with_attribute("version", 1)
            .with_attribute("origin", "publisher");

        assert_eq!(format_attributes(&message), "origin=publisher,version=1");
    }

    #[test]
    fn empty_values_format_as_none() {
        assert_eq!(format_attributes(&Message::new("m")), NONE);
        assert_eq!(format_targets(&BTreeSet::new()), NONE);
    }

    #[test]
    fn format_targets_joins_in_order() {
        let targets: BTreeSet<String> = ["b", "a"].iter().map(|name| name.to_string()).collect();

        assert_eq!(format_targets(&targets), "a,b");
    }
}
