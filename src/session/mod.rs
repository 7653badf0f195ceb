//! Authentication session
//!
//! - `handle` - the shared token and state, mutated only from this crate
//! - `store` - login, registration, logout and identity resolution
//! - `guard` - the gate protected views consult

pub mod guard;
pub mod handle;
pub mod store;

pub use guard::{decide, resolve, GuardDecision};
pub use handle::{SessionHandle, SessionState};
pub use store::{RegisterInput, SessionError, SessionStore};
