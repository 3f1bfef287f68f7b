use tokio::sync::broadcast;

use crate::{
    db::{DbPool, OrmConn},
    events::{Envelope, EVENT_BUS_CAPACITY},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub events: broadcast::Sender<Envelope>,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { pool, orm, events }
    }
}
