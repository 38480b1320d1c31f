//! Tracks one [`TableActor`](crate::actor::TableActor) mailbox per live
//! table id and reaps tables that have gone empty.
//!
//! The registry itself never touches `TableState`; it only hands out
//! `ActorCommand` senders. Creation and reaping share one mutex so a join
//! racing a reap for the same table id can never observe a half-torn-down
//! table -- either the join finds the actor still registered, or the reap
//! has already removed it and the join spawns a fresh one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use holdem_engine::TableConfig;
use tokio::sync::{oneshot, Mutex};

use crate::actor::{ActorCommand, TableActor};

#[derive(Clone)]
pub struct Registry {
    tables: Arc<Mutex<HashMap<String, tokio::sync::mpsc::UnboundedSender<ActorCommand>>>>,
    config: TableConfig,
}

impl Registry {
    pub fn new(config: TableConfig) -> Self {
        Self { tables: Arc::new(Mutex::new(HashMap::new())), config }
    }

    /// Returns the sender for `table_id`'s actor, spawning a fresh one on
    /// first reference. Table creation is implicit: there is no dedicated
    /// "create table" request, only the first `join_table` for an id that
    /// doesn't exist yet.
    pub async fn get_or_create(&self, table_id: &str) -> tokio::sync::mpsc::UnboundedSender<ActorCommand> {
        let mut tables = self.tables.lock().await;
        if let Some(tx) = tables.get(table_id) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }
        let tx = TableActor::spawn(table_id.to_string(), self.config.clone());
        tables.insert(table_id.to_string(), tx.clone());
        tx
    }

    /// Periodically scans every registered table and drops the ones that
    /// report themselves reapable (empty, `waiting_for_players`), freeing
    /// their actor task. Runs for the life of the process; spawn it once
    /// from `main`.
    pub async fn run_reaper(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let mut tables = self.tables.lock().await;
            let mut drained = Vec::new();
            for (id, tx) in tables.iter() {
                if tx.is_closed() {
                    drained.push(id.clone());
                    continue;
                }
                let (reply_tx, reply_rx) = oneshot::channel();
                if tx.send(ActorCommand::IsReapable(reply_tx)).is_err() {
                    drained.push(id.clone());
                    continue;
                }
                if matches!(reply_rx.await, Ok(true)) {
                    drained.push(id.clone());
                }
            }
            for id in drained {
                tables.remove(&id);
                tracing::info!(table_id = %id, "reaped empty table");
            }
        }
    }
}
