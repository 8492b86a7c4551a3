//! The external subsystem seam.
//!
//! The coordinator never talks to an OS radio stack directly. It goes through
//! two traits supplied by the host:
//!
//! - [`Subsystem`]: the one-time setup routine, run at most once.
//! - [`Radio`]: the live handle produced by a successful setup. It is owned by
//!   the home context and never shared outward.
//!
//! Events raised by the radio arrive through an [`EventSink`] on whatever thread
//! the subsystem chooses.
//!
//! ## Contents
//! - [`Subsystem`], [`Radio`], [`EventSink`] traits and handles
//! - [`RadioState`], [`RadioStatus`], [`Availability`], [`Peer`], [`PeerId`],
//!   [`RadioEvent`], [`StreamKind`], [`RegistrationToken`] plain data

mod subsystem;
mod types;

pub use subsystem::{EventSink, Radio, Subsystem};
pub use types::{
    Availability, Peer, PeerId, RadioEvent, RadioState, RadioStatus, RegistrationToken,
    StreamKind,
};
