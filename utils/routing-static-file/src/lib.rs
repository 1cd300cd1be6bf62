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

use async_trait::async_trait;
use std::fs::{self, canonicalize};
use std::path::PathBuf;
use topic_router::{DeclarationSourceError, RoutingDeclaration, RoutingDeclarationSource};
use tracing::debug;

/// Reads a routing declaration from a JSON or json5 file on every fetch.
pub struct RoutingStaticFile {
    static_file: String,
}

impl RoutingStaticFile {
    pub fn new(static_file: String) -> Self {
        RoutingStaticFile { static_file }
    }

    fn read_declaration(&self) -> Result<RoutingDeclaration, DeclarationSourceError> {
        let declaration_file = PathBuf::from(&self.static_file);

        debug!("declaration_file: {declaration_file:?}");
        let canonicalized_result = canonicalize(declaration_file);
        debug!("canonicalize: {canonicalized_result:?}");

        let declaration_file = canonicalized_result.map_err(|e| {
            DeclarationSourceError::NotFound(format!(
                "static routing file '{}': {e}",
                self.static_file
            ))
        })?;

        let data = fs::read_to_string(&declaration_file).map_err(|e| {
            DeclarationSourceError::Unreadable(format!("{}: {e}", declaration_file.display()))
        })?;

        // json5 is a superset of JSON, so plain .json files parse here too.
        let declaration: RoutingDeclaration = json5::from_str(&data).map_err(|e| {
            DeclarationSourceError::Malformed(format!("{}: {e}", declaration_file.display()))
        })?;

        debug!(
            "Finished reading routing declaration for topic '{}' with {} queue(s)",
            declaration.topic.name,
            declaration.queues.len()
        );
        Ok(declaration)
    }
}

#[async_trait]
impl RoutingDeclarationSource for RoutingStaticFile {
    async fn fetch_declaration(&self) -> Result<RoutingDeclaration, DeclarationSourceError> {
        self.read_declaration()
    }
}
