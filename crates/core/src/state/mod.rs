//! Presentation states emitted by blocs.

mod auth;
mod counter;
mod view;

pub use auth::AuthState;
pub use counter::{CounterState, CounterStatus};
pub use view::ViewState;
