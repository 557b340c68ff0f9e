//! Request dispatching for the OtoService license engine.
//!
//! The [`Dispatcher`] turns inbound transport events into outbound render
//! instructions:
//! - Commands (`/start`, `/master`, ...) and menu selections start flows
//! - Free text completes the actor's pending interaction, if any
//! - Master issuance is gated on the [`RolePolicy`] before any state changes
//!
//! The transport itself stays outside; it feeds [`Inbound`] events in and
//! hands the returned [`Outbound`] values to a [`Presenter`].

mod dispatcher;
mod error;
mod policy;
mod presenter;
pub mod protocol;
pub mod render;
mod session;

pub use dispatcher::{DispatchConfig, Dispatcher, MAX_ISSUE_ATTEMPTS};
pub use error::{DispatchError, DispatchResult, PresentError};
pub use policy::{AdminAllowList, RolePolicy};
pub use presenter::{deliver, Presenter, RecordingPresenter};
pub use protocol::{Action, Choice, Inbound, Outbound};
pub use session::{Accepted, InputError, PendingInteraction, SessionTable};
