use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use courier_core::counter::{self, CounterOp};
use courier_core::state::{CounterState, CounterStatus};
use courier_core::storage::keys::{COUNTER_UPDATED_KEY, COUNTER_VALUE_KEY};
use courier_core::{KeyValueStore, StoreError};

use super::{Bloc, BlocHandler, Emitter};

pub type CounterBloc = Bloc<CounterHandler>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterEvent {
    /// Read the persisted value.
    Load,
    Increment,
    Decrement,
    Reset,
}

/// Persisted counter demo.
pub struct CounterHandler {
    store: Arc<dyn KeyValueStore>,
}

impl CounterHandler {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn spawn(store: Arc<dyn KeyValueStore>) -> CounterBloc {
        Bloc::new(Self::new(store), CounterState::default())
    }

    async fn load(&self) -> Result<CounterState, StoreError> {
        let value = self.store.get(COUNTER_VALUE_KEY).await?;
        let updated = self.store.get(COUNTER_UPDATED_KEY).await?;
        let snapshot = counter::decode(value.as_deref(), updated.as_deref());
        Ok(CounterState::from_snapshot(snapshot))
    }

    async fn save(&self, state: &CounterState) -> Result<(), StoreError> {
        let (value, updated) = counter::encode(&state.snapshot());
        self.store.set(COUNTER_VALUE_KEY, &value).await?;
        match updated {
            Some(updated) => self.store.set(COUNTER_UPDATED_KEY, &updated).await,
            None => self.store.remove(COUNTER_UPDATED_KEY).await,
        }
    }
}

#[async_trait]
impl BlocHandler for CounterHandler {
    type Event = CounterEvent;
    type State = CounterState;

    async fn handle(&self, event: CounterEvent, emit: &Emitter<CounterState>) {
        let current = emit.state();

        let op = match event {
            CounterEvent::Load => {
                emit.emit(current.clone().with_status(CounterStatus::Loading));
                match self.load().await {
                    Ok(state) => emit.emit(state),
                    Err(e) => {
                        tracing::error!("Failed to load counter: {}", e);
                        emit.emit(current.with_status(CounterStatus::Error(e.to_string())));
                    }
                }
                return;
            }
            CounterEvent::Increment => CounterOp::Increment,
            CounterEvent::Decrement => CounterOp::Decrement,
            CounterEvent::Reset => CounterOp::Reset,
        };

        let next = CounterState::from_snapshot(counter::apply(current.snapshot(), op, Utc::now()));
        match self.save(&next).await {
            Ok(()) => emit.emit(next),
            Err(e) => {
                tracing::error!("Failed to save counter: {}", e);
                emit.emit(current.with_status(CounterStatus::Error(e.to_string())));
            }
        }
    }
}
