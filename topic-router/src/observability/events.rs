//! Canonical structured event names used across `topic-router`.

// Definition events.
pub const ROUTING_TABLE_DEFINED: &str = "routing_table_defined";
pub const ROUTING_TABLE_REJECTED: &str = "routing_table_rejected";

// Routing events.
pub const DELIVERY_FILTER_SKIPPED: &str = "delivery_filter_skipped";
pub const PUBLISH_ROUTED: &str = "publish_routed";
pub const PUBLISH_UNROUTED: &str = "publish_unrouted";

// Queue store events.
pub const QUEUE_ENQUEUE: &str = "queue_enqueue";
pub const QUEUE_RECEIVE: &str = "queue_receive";
pub const QUEUE_VISIBILITY_EXPIRED: &str = "queue_visibility_expired";
pub const QUEUE_DELETE_OK: &str = "queue_delete_ok";
pub const QUEUE_DELETE_UNKNOWN_RECEIPT: &str = "queue_delete_unknown_receipt";

// Broker lifecycle events.
pub const BROKER_CREATE: &str = "broker_create";
pub const BROKER_CREATE_FAILED: &str = "broker_create_failed";
pub const BROKER_WITHDRAW: &str = "broker_withdraw";
