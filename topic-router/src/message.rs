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

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Data type tags used when an attribute is carried in textual form.
pub const NUMBER_DATA_TYPE: &str = "Number";
pub const STRING_DATA_TYPE: &str = "String";

/// A typed message attribute value.
///
/// Numeric filters only ever match [`AttributeValue::Number`]; a string that happens to
/// contain digits is still a string.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    String(String),
}

impl AttributeValue {
    /// Returns the textual data type tag (`"Number"` or `"String"`).
    pub fn data_type(&self) -> &'static str {
        match self {
            AttributeValue::Number(_) => NUMBER_DATA_TYPE,
            AttributeValue::String(_) => STRING_DATA_TYPE,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(value) => Some(*value),
            AttributeValue::String(_) => None,
        }
    }

    /// Rebuilds a value from its data type tag and textual form.
    pub fn from_parts(data_type: &str, value: &str) -> Result<Self, AttributeParseError> {
        match data_type {
            NUMBER_DATA_TYPE => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(AttributeValue::Number)
                .ok_or_else(|| AttributeParseError::InvalidNumber(value.to_string())),
            STRING_DATA_TYPE => Ok(AttributeValue::String(value.to_string())),
            other => Err(AttributeParseError::UnknownDataType(other.to_string())),
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Number(value) => write!(f, "{value}"),
            AttributeValue::String(value) => write!(f, "{value}"),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Number(f64::from(value))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

/// Failures while rebuilding an [`AttributeValue`] from text.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeParseError {
    UnknownDataType(String),
    InvalidNumber(String),
}

impl Display for AttributeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeParseError::UnknownDataType(data_type) => {
                write!(f, "unknown attribute data type '{data_type}'")
            }
            AttributeParseError::InvalidNumber(value) => {
                write!(f, "'{value}' is not a finite number")
            }
        }
    }
}

impl std::error::Error for AttributeParseError {}

///
/// A [`Message`] is one unit published onto a topic: a UTF-8 payload plus a set of named,
/// typed attributes that subscription filters are evaluated against.
///
/// # Examples
///
/// ```
/// use topic_router::{AttributeValue, Message};
///
/// let message = Message::new("Message to version 1.").with_attribute("version", 1);
///
/// assert_eq!(message.attribute("version"), Some(&AttributeValue::Number(1.0)));
/// assert_eq!(message.attribute("missing"), None);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Message {
    body: String,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) one attribute.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn from_parts(body: String, attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self { body, attributes }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// Checks that every numeric attribute is finite, naming the first one that is not.
    pub fn validate_attributes(&self) -> Result<(), (String, AttributeParseError)> {
        match self
            .attributes
            .iter()
            .find(|(_, value)| matches!(value, AttributeValue::Number(n) if !n.is_finite()))
        {
            Some((name, value)) => Err((
                name.clone(),
                AttributeParseError::InvalidNumber(value.to_string()),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeParseError, AttributeValue, Message};

    #[test]
    fn integer_attributes_are_numbers() {
        let message = Message::new("body").with_attribute("version", 2);

        assert_eq!(
            message.attribute("version").and_then(AttributeValue::as_number),
            Some(2.0)
        );
        assert_eq!(
            message.attribute("version").map(AttributeValue::data_type),
            Some("Number")
        );
    }

    #[test]
    fn string_attribute_is_not_a_number() {
        let message = Message::new("body").with_attribute("version", "1");

        assert_eq!(
            message.attribute("version").and_then(AttributeValue::as_number),
            None
        );
    }

    #[test]
    fn from_parts_parses_numbers_and_rejects_garbage() {
        assert_eq!(
            AttributeValue::from_parts("Number", "1"),
            Ok(AttributeValue::Number(1.0))
        );
        assert_eq!(
            AttributeValue::from_parts("String", "1"),
            Ok(AttributeValue::String("1".to_string()))
        );
        assert_eq!(
            AttributeValue::from_parts("Number", "one"),
            Err(AttributeParseError::InvalidNumber("one".to_string()))
        );
        assert_eq!(
            AttributeValue::from_parts("Number", "NaN"),
            Err(AttributeParseError::InvalidNumber("NaN".to_string()))
        );
        assert!(matches!(
            AttributeValue::from_parts("Binary", "AAEC"),
            Err(AttributeParseError::UnknownDataType(_))
        ));
    }

    #[test]
    fn non_finite_numbers_fail_validation() {
        assert_eq!(
            Message::new("m")
                .with_attribute("version", 1)
                .validate_attributes(),
            Ok(())
        );
        assert_eq!(
            Message::new("m")
                .with_attribute("version", f64::NAN)
                .validate_attributes(),
            Err((
                "version".to_string(),
                AttributeParseError::InvalidNumber("NaN".to_string())
            ))
        );
        assert!(Message::new("m")
            .with_attribute("weight", f64::NEG_INFINITY)
            .validate_attributes()
            .is_err());
    }

    #[test]
    fn number_display_drops_trailing_zero_fraction() {
        assert_eq!(AttributeValue::Number(1.0).to_string(), "1");
        assert_eq!(AttributeValue::Number(1.5).to_string(), "1.5");
    }
}
