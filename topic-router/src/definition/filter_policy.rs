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

//! Subscription filter predicates over message attributes.

use crate::message::Message;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Operator name used for numeric allowlist filters in exported declarations.
pub const NUMERIC_EQUALS_ONE_OF: &str = "numeric-equals-one-of";

/// Filter predicate attached to a subscription.
///
/// # Examples
///
/// ```
/// use topic_router::{FilterPolicy, Message};
///
/// let filter = FilterPolicy::numeric_allowlist("version", [1.0]);
///
/// assert!(filter.matches(&Message::new("a").with_attribute("version", 1)));
/// assert!(!filter.matches(&Message::new("b").with_attribute("version", 2)));
/// assert!(!filter.matches(&Message::new("c")));
/// assert!(FilterPolicy::NoFilter.matches(&Message::new("d")));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum FilterPolicy {
    /// Every message matches.
    #[default]
    NoFilter,
    /// The numeric attribute must equal one of the allowlisted values.
    AttributeEquals {
        attribute: String,
        allowlist: Vec<f64>,
    },
}

impl FilterPolicy {
    pub fn numeric_allowlist(
        attribute: impl Into<String>,
        allowlist: impl IntoIterator<Item = f64>,
    ) -> Self {
        FilterPolicy::AttributeEquals {
            attribute: attribute.into(),
            allowlist: allowlist.into_iter().collect(),
        }
    }

    /// Checks the predicate is well formed. Called once at definition time.
    pub fn validate(&self) -> Result<(), FilterPolicyError> {
        match self {
            FilterPolicy::NoFilter => Ok(()),
            FilterPolicy::AttributeEquals {
                attribute,
                allowlist,
            } => {
                if attribute.trim().is_empty() {
                    return Err(FilterPolicyError::EmptyAttributeName);
                }
                if allowlist.is_empty() {
                    return Err(FilterPolicyError::EmptyAllowlist {
                        attribute: attribute.clone(),
                    });
                }
                if let Some(value) = allowlist.iter().find(|value| !value.is_finite()) {
                    return Err(FilterPolicyError::NonFiniteAllowlistValue {
                        attribute: attribute.clone(),
                        value: value.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Evaluates the predicate against one message's attributes.
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            FilterPolicy::NoFilter => true,
            FilterPolicy::AttributeEquals {
                attribute,
                allowlist,
            } => message
                .attribute(attribute)
                .and_then(|value| value.as_number())
                .map(|number| allowlist.iter().any(|allowed| *allowed == number))
                .unwrap_or(false),
        }
    }

    /// Name of the attribute this predicate reads, if any.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            FilterPolicy::NoFilter => None,
            FilterPolicy::AttributeEquals { attribute, .. } => Some(attribute),
        }
    }
}

/// Malformed filter definitions.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPolicyError {
    EmptyAttributeName,
    EmptyAllowlist { attribute: String },
    NonFiniteAllowlistValue { attribute: String, value: String },
    NonNumericAllowlistValue { attribute: String, value: String },
    UnsupportedOperator(String),
}

impl Display for FilterPolicyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterPolicyError::EmptyAttributeName => {
                write!(f, "filter attribute name must not be empty")
            }
            FilterPolicyError::EmptyAllowlist { attribute } => {
                write!(f, "allowlist for attribute '{attribute}' must not be empty")
            }
            FilterPolicyError::NonFiniteAllowlistValue { attribute, value } => {
                write!(
                    f,
                    "allowlist for attribute '{attribute}' contains non-finite value {value}"
                )
            }
            FilterPolicyError::NonNumericAllowlistValue { attribute, value } => {
                write!(
                    f,
                    "allowlist for attribute '{attribute}' contains non-numeric value {value}"
                )
            }
            FilterPolicyError::UnsupportedOperator(op) => {
                write!(f, "unsupported filter operator '{op}'")
            }
        }
    }
}

impl Error for FilterPolicyError {}
