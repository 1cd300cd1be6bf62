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

//! Queue entries in raw or enveloped form.

use crate::message::{AttributeParseError, AttributeValue, Message};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const NOTIFICATION_TYPE: &str = "Notification";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct EnvelopeAttribute {
    #[serde(rename = "Type")]
    data_type: String,
    value: String,
}

/// JSON wrapper written to queues whose subscription does not ask for raw delivery.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationEnvelope {
    #[serde(rename = "Type")]
    pub kind: String,
    pub message_id: Uuid,
    pub topic_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    message_attributes: BTreeMap<String, EnvelopeAttribute>,
}

impl NotificationEnvelope {
    fn wrap(topic_name: &str, message_id: Uuid, sent_at: DateTime<Utc>, message: &Message) -> Self {
        Self {
            kind: NOTIFICATION_TYPE.to_string(),
            message_id,
            topic_name: topic_name.to_string(),
            message: message.body().to_string(),
            timestamp: sent_at,
            message_attributes: message
                .attributes()
                .iter()
                .map(|(name, value)| {
                    (
                        name.clone(),
                        EnvelopeAttribute {
                            data_type: value.data_type().to_string(),
                            value: value.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    fn unwrap_message(self) -> Result<Message, EnvelopeError> {
        let mut attributes = BTreeMap::new();
        for (name, attribute) in self.message_attributes {
            let value = AttributeValue::from_parts(&attribute.data_type, &attribute.value)
                .map_err(|reason| EnvelopeError::InvalidAttribute {
                    name: name.clone(),
                    reason,
                })?;
            attributes.insert(name, value);
        }
        Ok(Message::from_parts(self.message, attributes))
    }
}

/// Failures while building or decoding an enveloped entry.
#[derive(Debug)]
pub enum EnvelopeError {
    Encode(serde_json::Error),
    Malformed(serde_json::Error),
    InvalidAttribute {
        name: String,
        reason: AttributeParseError,
    },
}

impl Display for EnvelopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeError::Encode(err) => write!(f, "unable to encode envelope: {err}"),
            EnvelopeError::Malformed(err) => write!(f, "malformed envelope: {err}"),
            EnvelopeError::InvalidAttribute { name, reason } => {
                write!(f, "invalid envelope attribute '{name}': {reason}")
            }
        }
    }
}

impl Error for EnvelopeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EnvelopeError::Encode(err) | EnvelopeError::Malformed(err) => Some(err),
            EnvelopeError::InvalidAttribute { reason, .. } => Some(reason),
        }
    }
}

/// One delivered copy of a published message, as stored in a queue.
///
/// Raw entries carry the published body and attributes untouched. Enveloped entries carry a
/// JSON [`NotificationEnvelope`] as body and no attributes of their own.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueEntry {
    message_id: Uuid,
    sent_at: DateTime<Utc>,
    body: String,
    attributes: BTreeMap<String, AttributeValue>,
    raw: bool,
}

impl QueueEntry {
    pub(crate) fn raw(message_id: Uuid, sent_at: DateTime<Utc>, message: &Message) -> Self {
        Self {
            message_id,
            sent_at,
            body: message.body().to_string(),
            attributes: message.attributes().clone(),
            raw: true,
        }
    }

    pub(crate) fn enveloped(
        topic_name: &str,
        message_id: Uuid,
        sent_at: DateTime<Utc>,
        message: &Message,
    ) -> Result<Self, EnvelopeError> {
        let envelope = NotificationEnvelope::wrap(topic_name, message_id, sent_at, message);
        let body = serde_json::to_string(&envelope).map_err(EnvelopeError::Encode)?;

        Ok(Self {
            message_id,
            sent_at,
            body,
            attributes: BTreeMap::new(),
            raw: false,
        })
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// The stored body: the published payload for raw entries, envelope JSON otherwise.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Parses the envelope of a non-raw entry.
    pub fn envelope(&self) -> Option<Result<NotificationEnvelope, EnvelopeError>> {
        if self.raw {
            return None;
        }
        Some(serde_json::from_str(&self.body).map_err(EnvelopeError::Malformed))
    }

    /// Recovers the published message regardless of delivery mode.
    pub fn decode(&self) -> Result<Message, EnvelopeError> {
        match self.envelope() {
            None => Ok(Message::from_parts(
                self.body.clone(),
                self.attributes.clone(),
            )),
            Some(envelope) => envelope?.unwrap_message(),
        }
    }
}
