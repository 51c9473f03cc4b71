//! Final identifier and device class for a detection.

use chrono::{DateTime, Utc};
use classtap_core::{CustomIdentifier, DeviceClass, RawIdentifier, ResolvedScan, RoomId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub identifier: String,
    pub device_class: DeviceClass,
}

impl Resolution {
    pub fn into_scan(
        self,
        hardware_id: RawIdentifier,
        room_id: RoomId,
        timestamp: DateTime<Utc>,
    ) -> ResolvedScan {
        ResolvedScan {
            identifier: self.identifier,
            device_class: self.device_class,
            room_id,
            hardware_id,
            timestamp,
        }
    }
}

/// Prefer the custom identifier; otherwise use the hardware UID.
pub fn resolve(raw: &RawIdentifier, custom: Option<&CustomIdentifier>) -> Resolution {
    match custom {
        Some(id) => Resolution {
            identifier: id.to_hex(),
            device_class: DeviceClass::CustomBroadcast,
        },
        None => Resolution {
            identifier: raw.to_hex(),
            device_class: DeviceClass::PhysicalTag,
        },
    }
}
