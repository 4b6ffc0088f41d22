//! Commands carried by the sync command bus
//!
//! Commands are ephemeral: owned by the queue, destroyed on successful
//! handling or after redelivery is exhausted. They always carry the bare
//! shipment id; prefix stripping happens at construction.

use serde::{Deserialize, Serialize};

use crate::market::strip_order_prefix;
use crate::order::ProfileId;

/// Intake of a newly discovered remote order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntakeCommand {
    /// Bare shipment id
    pub shipment: String,
    /// Owning local profile
    pub profile: ProfileId,
}

impl OrderIntakeCommand {
    pub fn new(shipment: impl AsRef<str>, profile: ProfileId) -> Self {
        Self {
            shipment: strip_order_prefix(shipment.as_ref()).to_string(),
            profile,
        }
    }
}

/// Follow-up notification of a local status transition
///
/// Carries identity only; the worker re-fetches remote detail to build the
/// notification body. Redelivered with delay on transient failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeCommand {
    /// Bare shipment id
    pub number: String,
    /// Owning local profile
    pub profile: ProfileId,
    /// Redelivery counter, 0 on first dispatch
    pub attempt: u32,
}

impl StatusChangeCommand {
    pub fn new(number: impl AsRef<str>, profile: ProfileId) -> Self {
        Self {
            number: strip_order_prefix(number.as_ref()).to_string(),
            profile,
            attempt: 0,
        }
    }

    /// The same command, one redelivery later
    pub fn next_attempt(&self) -> Self {
        Self {
            number: self.number.clone(),
            profile: self.profile,
            attempt: self.attempt + 1,
        }
    }
}

/// Union of everything the bus transports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncCommand {
    Intake(OrderIntakeCommand),
    Package(StatusChangeCommand),
    Close(StatusChangeCommand),
}
