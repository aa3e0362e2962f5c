use actix_web::{
    post,
    web::{self, Data, Json, Path},
    HttpResponse, Scope,
};
use serde::{Deserialize, Serialize};

use crate::{channel::Channel, error::Error, service::Service};

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub body: String,
    /// Operator that is sending the alert
    pub triggered_by: String,
}

#[post("/{channel}")]
pub async fn submit(
    service: Data<Service>,
    channel: Path<Channel>,
    data: Json<SubmitRequest>,
) -> Result<HttpResponse, Error> {
    let SubmitRequest { body, triggered_by } = data.into_inner();

    let message = service
        .submit(channel.into_inner(), body, triggered_by)
        .await?;

    Ok(HttpResponse::Created().json(message))
}

pub fn service() -> Scope {
    web::scope("/broadcast").service(submit)
}
