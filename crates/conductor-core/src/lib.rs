//! Core delegation engine for the conductor orchestration framework.
//!
//! Delegations flow through the [`dispatcher::Dispatcher`]: the agent type is
//! resolved to a profile ([`profiles`]), the shared context is filtered for
//! that agent ([`context`]), an execution mode is chosen ([`detect`]), and the
//! task runs either in-process on the [`bus`] or in an isolated worker
//! process ([`subprocess`] / [`worker`]). Outcomes land in [`metrics`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bus;
pub mod context;
pub mod delegation;
pub mod detect;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod profiles;
pub mod subprocess;
pub mod worker;

pub use bus::{AgentHandler, AgentOutcome, MessageBus};
pub use delegation::{
    DelegationRequest, DelegationResult, DelegationStatus, OrchestrationMode, Priority,
    TaskContext,
};
pub use dispatcher::{build_dispatcher, Dispatcher, DispatcherConfig};
pub use error::{Error, Result};
