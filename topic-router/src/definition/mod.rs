//! Definition layer.
//!
//! Owns the routing-table data model, filter predicates, definition-time validation and the
//! interchange declaration consumed by provisioning tools. Nothing here touches delivery.

pub(crate) mod declaration;
pub(crate) mod filter_policy;
pub(crate) mod presets;
pub(crate) mod routing_table;
