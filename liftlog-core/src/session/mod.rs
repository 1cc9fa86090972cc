//! The write side of the store.
//!
//! [`Session`] owns the pool and the change bus; its impl blocks are split
//! by concern (workouts, routines, exercises, sets, profile). Every mutation
//! publishes the tables it touched so live queries recompute.

mod exercises;
mod profile;
mod routine;
mod session;
mod sets;
mod workout;

pub use session::{Session, SessionConfig};
pub use workout::RoutineDrift;
