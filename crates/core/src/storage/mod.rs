mod error;
pub mod keys;
mod traits;

pub use error::{Result, StoreError};
pub use traits::KeyValueStore;
