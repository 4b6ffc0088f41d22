//! Internal order domain types
//!
//! The order aggregate itself lives outside this crate boundary; what is
//! shared here is the event snapshot the sync pipeline inspects and the
//! order-creation command it produces.

mod new_order;
mod snapshot;
mod types;

pub use new_order::{ContactField, FormFieldValue, NewOrderCommand, OrderDelivery, ProductLine};
pub use snapshot::{OrderChanged, OrderEvent};
pub use types::{
    DeliveryEventId, DeliveryType, OrderEventId, OrderId, OrderStatus, PaymentType, ProductRef,
    ProfileId, ProfileType,
};
