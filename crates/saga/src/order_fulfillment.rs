//! Order fulfillment saga constants.

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: reserve stock for the order.
pub const STEP_RESERVE_STOCK: &str = "reserve_stock";

/// Step name: process payment for the order.
pub const STEP_PROCESS_PAYMENT: &str = "process_payment";
