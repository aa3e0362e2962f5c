//! Delivery channels of the broadcast queue.
//!
//! SMS and email share one queue protocol. A [`Channel`] only decides which
//! table holds its messages and which recipient field the device receives.

use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    /// Short text messages sent through the device's GSM modem
    Sms,
    /// Email alerts relayed by the device
    Email,
}

/// Recipient field a channel delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Phone,
    Email,
}

impl ContactField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

impl Channel {
    /// Table holding this channel's queued messages.
    pub fn table(self) -> &'static str {
        match self {
            Self::Sms => "sms_queue",
            Self::Email => "email_queue",
        }
    }

    pub fn contact_field(self) -> ContactField {
        match self {
            Self::Sms => ContactField::Phone,
            Self::Email => ContactField::Email,
        }
    }
}
