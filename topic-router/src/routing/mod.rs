//! Routing layer.
//!
//! Evaluates subscription filters against published messages and defines the seam a
//! routing declaration is fetched through.

pub(crate) mod declaration_source;
pub(crate) mod delivery_resolution;
