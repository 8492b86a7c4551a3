//! Plain data exchanged with the radio subsystem.

use std::fmt;
use std::sync::Arc;

/// Power/support state reported by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadioState {
    /// Not yet reported.
    #[default]
    Unknown,
    /// Powered on and usable.
    On,
    /// Present but powered off.
    Off,
    /// Present but disabled by policy.
    Disabled,
    /// No radio hardware or driver.
    Unsupported,
}

/// Whether the requested capability is usable.
///
/// `Unavailable` is a normal answer, not an error path: setup succeeded but the
/// hardware or policy rules the capability out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl RadioState {
    /// Maps the radio state onto capability availability.
    pub fn availability(self) -> Availability {
        match self {
            RadioState::Disabled | RadioState::Unsupported => Availability::Unavailable,
            RadioState::Unknown | RadioState::On | RadioState::Off => Availability::Available,
        }
    }
}

/// Snapshot answered by [`Coordinator::status`](crate::Coordinator::status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioStatus {
    /// Last state reported by the radio.
    pub state: RadioState,
    /// Availability derived from `state`.
    pub availability: Availability,
    /// Number of currently discovered peers.
    pub peers: usize,
    /// Number of live connection records.
    pub connections: usize,
}

/// Identifier of a remote peer (e.g. a device address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub Arc<str>);

impl PeerId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: PeerId,
    /// Advertised name, if any.
    pub name: Option<Arc<str>>,
    /// Signal strength at discovery time (dBm).
    pub rssi: Option<i16>,
}

impl Peer {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: PeerId::new(id),
            name: None,
            rssi: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }
}

/// External event streams the coordinator subscribes to once the radio is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Power/support state changes.
    StateChanges,
    /// Peer discovered / lost.
    Discovery,
    /// Peer connected / disconnected.
    Connections,
}

impl StreamKind {
    /// Every stream, in subscription order.
    pub const ALL: [StreamKind; 3] = [
        StreamKind::StateChanges,
        StreamKind::Discovery,
        StreamKind::Connections,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::StateChanges => "state_changes",
            StreamKind::Discovery => "discovery",
            StreamKind::Connections => "connections",
        }
    }
}

/// Notification raised by the radio on one of its own threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    StateChanged(RadioState),
    PeerDiscovered(Peer),
    PeerLost(PeerId),
    Connected(PeerId),
    Disconnected(PeerId),
}

/// Token returned by [`Radio::subscribe`](crate::Radio::subscribe); revoked
/// during teardown before the radio is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationToken {
    /// Subsystem-assigned identifier.
    pub id: u64,
    /// Stream this token subscribes to.
    pub stream: StreamKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_and_disabled_are_unavailable() {
        assert_eq!(
            RadioState::Unsupported.availability(),
            Availability::Unavailable
        );
        assert_eq!(RadioState::Disabled.availability(), Availability::Unavailable);
        assert_eq!(RadioState::Off.availability(), Availability::Available);
        assert_eq!(RadioState::On.availability(), Availability::Available);
    }
}
