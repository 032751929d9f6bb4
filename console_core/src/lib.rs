//! Workflow logic of the Burhani Guards duty console.
//!
//! Nothing in here touches the DOM or the network. Screens hold the state
//! objects ([`workflow::DutyAssignment`], [`incharge::InchargeAssignment`],
//! [`masters::MasterEditor`]) and plug a concrete backend into the traits
//! in [`api`].

pub mod access;
pub mod api;
pub mod cascade;
pub mod config;
pub mod confirm;
pub mod error;
pub mod grid;
pub mod ids;
pub mod incharge;
pub mod masters;
pub mod model;
pub mod quota;
pub mod reports;
pub mod session;
pub mod staging;
pub mod toast;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use error::{AuthError, ConsoleError};
