//! Loading/error/data bookkeeping shared by every backend call.
//!
//! An [`AsyncAction`] is one call-site binding: it owns a [`RequestState`], knows which
//! [`BackendOperation`] to run and with which static parameters, and exposes a trigger
//! that callers may fire repeatedly. Overlapping triggers are not prevented; how their
//! settlements interact is decided by the binding's [`SettlementPolicy`].

mod action;
mod state;


pub use action::{AsyncAction, BackendOperation, Pending, SettlementPolicy};
pub use state::{ActionError, ActionErrorKind, RequestState};
