//! Session collaborator interface.
//!
//! This module provides:
//! - `Session`: file-backed bearer token persistence
//! - `SessionStore`: the "clear stored session" operation the HTTP layer calls
//! - `SessionEvents`: process-wide broadcast of session expiry
//!
//! The HTTP layer never decides where credentials live; it only clears them
//! and announces expiry.

pub mod events;
pub mod session;

pub use events::{SessionEvent, SessionEvents};
pub use session::{Session, SessionData, SessionStore};
