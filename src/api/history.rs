use actix_web::{
    get,
    web::{self, Data, Json, Path, Query},
    Scope,
};
use serde::Deserialize;

use crate::{
    channel::Channel,
    error::Error,
    message::{MessageStatus, QueuedMessage},
    service::Service,
};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub status: Option<MessageStatus>,
    pub limit: Option<u32>,
}

#[get("/{channel}")]
pub async fn list_history(
    service: Data<Service>,
    channel: Path<Channel>,
    query: Query<HistoryQuery>,
) -> Result<Json<Vec<QueuedMessage>>, Error> {
    let HistoryQuery { status, limit } = query.into_inner();

    service
        .history(channel.into_inner(), status, limit)
        .await
        .map(Json)
}

pub fn service() -> Scope {
    web::scope("/history").service(list_history)
}
