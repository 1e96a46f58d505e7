//! Typed domain events. Publishers never wait on subscribers: every
//! subscriber owns a channel and drains it on its own schedule.

use crate::error::LedgerError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Expenses,
    Rollups,
    Plans,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    ExpenseSaved { key: String, total_expenses: f64 },
    RollupComputed { key: String, total_electricity_kwh: f64 },
    PlanChanged { plan_id: String },
}

impl LedgerEvent {
    pub fn topic(&self) -> Topic {
        match self {
            LedgerEvent::ExpenseSaved { .. } => Topic::Expenses,
            LedgerEvent::RollupComputed { .. } => Topic::Rollups,
            LedgerEvent::PlanChanged { .. } => Topic::Plans,
        }
    }

    /// One-line JSON form, tagged by `type`.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A cloneable handle to a shared set of topic subscriptions.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<HashMap<Topic, Vec<Sender<LedgerEvent>>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: Topic) -> Receiver<LedgerEvent> {
        let (tx, rx) = mpsc::channel();
        self.lock().entry(topic).or_default().push(tx);
        rx
    }

    /// Sends `event` to every live subscriber of its topic and returns how
    /// many received it. Subscribers whose receiver was dropped are removed.
    pub fn publish(&self, event: LedgerEvent) -> usize {
        let mut subscribers = self.lock();
        let Some(senders) = subscribers.get_mut(&event.topic()) else {
            return 0;
        };
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        senders.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lock().get(&topic).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Topic, Vec<Sender<LedgerEvent>>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
