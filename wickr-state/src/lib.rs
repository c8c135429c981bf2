//! Wickr State
//!
//! Records what the last apply handed to the provisioning engine, so that a
//! later plan can tell what would change.
//!
//! - **StateFile**: the recorded resources, in dependency order
//! - **StateBackend**: where the state file lives
//! - **LockInfo**: lock held while a state-changing command runs
//!
//! # Example
//!
//! ```ignore
//! use wickr_state::{create_backend, BackendConfig, Operation};
//!
//! let backend = create_backend(&BackendConfig::local("wickr.state.json")).await?;
//! let lock = backend.acquire_lock(Operation::Apply).await?;
//!
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! state.record(&resources);
//! state.increment_serial();
//! backend.write_state(&state).await?;
//!
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::{LockInfo, Operation};
pub use state::{ResourceState, StateFile};
