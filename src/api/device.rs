//! Routes called by the polling device.
//!
//! Every channel is served by the same resource, `/device/{channel}`:
//!
//! - `OPTIONS` answers cross-origin pre-flight requests without touching the store.
//! - `GET` returns the pending messages (oldest first) and the active recipients.
//! - `PATCH` with `{"id": ...}` marks a message as sent after transmission.
//!
//! Any other method is rejected with `405`.

use actix_web::{
    http::Method,
    web::{self, Bytes, Data, Json, Path},
    HttpResponse, Scope,
};
use serde::{Deserialize, Serialize};

use crate::{
    channel::Channel,
    error::Error,
    message::QueuedMessage,
    service::{PollResponse, Service},
};

/// Identifier of the message being acknowledged.
///
/// Devices send it either as a JSON number or as a string of digits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageRef {
    Number(i64),
    Text(String),
}

impl MessageRef {
    /// Resolves the reference to a message ID. `0` and blank strings count as missing.
    fn resolve(self) -> Result<Option<i64>, Error> {
        match self {
            Self::Number(0) => Ok(None),
            Self::Number(id) => Ok(Some(id)),
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }

                match text.parse::<i64>() {
                    Ok(0) => Ok(None),
                    Ok(id) => Ok(Some(id)),
                    Err(_) => Err(Error::invalid_parameter(format!(
                        "message id must be an integer, got {text:?}"
                    ))),
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    #[serde(default)]
    pub id: Option<MessageRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    pub success: bool,
    pub updated: Vec<QueuedMessage>,
}

fn missing_id() -> Error {
    Error::missing_parameter("Missing message id")
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn poll(service: Data<Service>, channel: Path<Channel>) -> Result<Json<PollResponse>, Error> {
    service.poll(channel.into_inner()).await.map(Json)
}

async fn acknowledge(
    service: Data<Service>,
    channel: Path<Channel>,
    body: Bytes,
) -> Result<Json<AcknowledgeResponse>, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(missing_id());
    }

    let request: AcknowledgeRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::invalid_parameter(format!("invalid request body: {e}")))?;

    let id = match request.id {
        Some(id) => id.resolve()?.ok_or_else(missing_id)?,
        None => return Err(missing_id()),
    };

    let updated = service.acknowledge(channel.into_inner(), id).await?;

    Ok(Json(AcknowledgeResponse {
        success: true,
        updated,
    }))
}

async fn method_not_allowed() -> Result<HttpResponse, Error> {
    Err(Error::MethodNotAllowed)
}

pub fn service() -> Scope {
    web::scope("/device").service(
        web::resource("/{channel}")
            .route(web::method(Method::OPTIONS).to(preflight))
            .route(web::get().to(poll))
            .route(web::patch().to(acknowledge))
            .default_service(web::to(method_not_allowed)),
    )
}
