//! Intent/state dispatcher.
//!
//! A [`Bloc`] owns a queue of events and a single task that feeds them, one
//! at a time, to a [`BlocHandler`]. The handler publishes states through an
//! [`Emitter`]; subscribers see every state in emission order.

mod auth;
mod counter;
mod profile;
mod upload;

pub use auth::{AuthBloc, AuthEvent, AuthHandler};
pub use counter::{CounterBloc, CounterEvent, CounterHandler};
pub use profile::{ProfileBloc, ProfileEvent, ProfileHandler};
pub use upload::{Transfer, UploadBloc, UploadEvent, UploadHandler};

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::Stream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::{ClientError, Result};

/// States buffered per subscriber before the oldest are dropped.
const STATE_CAPACITY: usize = 256;

/// Business logic behind a bloc.
#[async_trait]
pub trait BlocHandler: Send + Sync + 'static {
    type Event: Send + 'static;
    type State: Clone + Send + Sync + 'static;

    /// Handle one event. Events are never handled concurrently.
    async fn handle(&self, event: Self::Event, emit: &Emitter<Self::State>);
}

/// Publishes states and remembers the latest one.
#[derive(Debug)]
pub struct Emitter<S> {
    current: Arc<Mutex<S>>,
    states: broadcast::Sender<S>,
}

impl<S> Clone for Emitter<S> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            states: self.states.clone(),
        }
    }
}

impl<S: Clone> Emitter<S> {
    fn new(initial: S) -> Self {
        let (states, _) = broadcast::channel(STATE_CAPACITY);
        Self {
            current: Arc::new(Mutex::new(initial)),
            states,
        }
    }

    pub fn emit(&self, state: S) {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state.clone();
        // No subscribers is fine.
        let _ = self.states.send(state);
    }

    pub fn state(&self) -> S {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Running dispatcher for one handler.
pub struct Bloc<H: BlocHandler> {
    events: mpsc::UnboundedSender<H::Event>,
    emitter: Emitter<H::State>,
    task: JoinHandle<()>,
}

impl<H: BlocHandler> Bloc<H> {
    /// Start the bloc on the current tokio runtime.
    pub fn new(handler: H, initial: H::State) -> Self {
        let (events, mut queue) = mpsc::unbounded_channel::<H::Event>();
        let emitter = Emitter::new(initial);

        let task_emitter = emitter.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = queue.recv().await {
                handler.handle(event, &task_emitter).await;
            }
            tracing::debug!("bloc event queue closed");
        });

        Self {
            events,
            emitter,
            task,
        }
    }

    /// Queue an event.
    pub fn add(&self, event: H::Event) -> Result<()> {
        self.events.send(event).map_err(|_| ClientError::BlocClosed)
    }

    /// The most recently emitted state.
    pub fn state(&self) -> H::State {
        self.emitter.state()
    }

    /// Every state emitted from now on.
    pub fn subscribe(&self) -> StateStream<H::State> {
        StateStream {
            inner: BroadcastStream::new(self.emitter.states.subscribe()),
        }
    }

    /// Queue `event` and wait for the first state matching `done`.
    ///
    /// Every state seen on the way, including the final one, is passed to
    /// `on_state`. Returns `None` if the bloc stops first.
    pub async fn dispatch<F, P>(&self, event: H::Event, done: P, mut on_state: F) -> Option<H::State>
    where
        P: Fn(&H::State) -> bool,
        F: FnMut(&H::State),
    {
        let mut states = self.subscribe();
        self.add(event).ok()?;
        while let Some(state) = states.next_state().await {
            on_state(&state);
            if done(&state) {
                return Some(state);
            }
        }
        None
    }

    /// Stop accepting events, finish the queued ones and wait for the task.
    pub async fn close(self) {
        let Self { events, task, .. } = self;
        drop(events);
        if let Err(e) = task.await {
            tracing::error!("bloc task failed: {}", e);
        }
    }
}

/// Stream of emitted states. States missed by a slow subscriber are
/// skipped.
pub struct StateStream<S> {
    inner: BroadcastStream<S>,
}

impl<S: Clone + Send + 'static> StateStream<S> {
    pub async fn next_state(&mut self) -> Option<S> {
        futures_util::StreamExt::next(self).await
    }
}

impl<S: Clone + Send + 'static> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(state))) => return Poll::Ready(Some(state)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    tracing::warn!(skipped, "state subscriber lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
