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

use crate::definition::declaration::RoutingDeclaration;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures while fetching a routing declaration from its backing store.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationSourceError {
    NotFound(String),
    Unreadable(String),
    Malformed(String),
}

impl Display for DeclarationSourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationSourceError::NotFound(detail) => {
                write!(f, "routing declaration not found: {detail}")
            }
            DeclarationSourceError::Unreadable(detail) => {
                write!(f, "unable to read routing declaration: {detail}")
            }
            DeclarationSourceError::Malformed(detail) => {
                write!(f, "unable to parse routing declaration: {detail}")
            }
        }
    }
}

impl Error for DeclarationSourceError {}

/// Where a [`TopicBroker`](crate::TopicBroker) gets its routing declaration from.
///
/// A static file is the usual backing store; tests can hand over a
/// [`RoutingDeclaration`] value directly.
#[async_trait]
pub trait RoutingDeclarationSource: Send + Sync {
    async fn fetch_declaration(&self) -> Result<RoutingDeclaration, DeclarationSourceError>;
}

#[async_trait]
impl RoutingDeclarationSource for RoutingDeclaration {
    async fn fetch_declaration(&self) -> Result<RoutingDeclaration, DeclarationSourceError> {
        Ok(self.clone())
    }
}
