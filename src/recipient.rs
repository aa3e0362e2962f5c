use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::channel::{Channel, ContactField};

/// An emergency contact.
///
/// Recipients are managed outside of the broadcast queue; the queue only reads the
/// active ones.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Recipient {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
}

impl Recipient {
    /// Contact address for `channel`, if the recipient has a usable one.
    pub fn contact(&self, channel: Channel) -> Option<&str> {
        let contact = match channel.contact_field() {
            ContactField::Phone => self.phone.as_deref(),
            ContactField::Email => self.email.as_deref(),
        };

        contact.filter(|c| !c.trim().is_empty())
    }
}

/// Projection of an active recipient for one channel.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct RecipientContact {
    pub contact: String,
    pub name: String,
}
