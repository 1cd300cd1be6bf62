//! Delivery layer.
//!
//! Turns routing decisions into stored queue entries (raw or enveloped) and serves them to
//! consumers with visibility timeouts.

pub(crate) mod envelope;
pub(crate) mod queue_store;
