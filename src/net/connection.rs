//! Per-connection identity and state machine.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track where a connection is in its single request/response exchange
//! - Reject transitions the exchange never makes

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global atomic counter for connection IDs.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Stage of a connection's one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepted,
    /// Request bytes received.
    Read,
    Parsed,
    ParseFailed,
    Allowed,
    Denied,
    /// Records loaded (or the load failed and a rejection was chosen).
    Fetched,
    /// Reply bytes assembled and handed to the socket.
    Responded,
    Closed,
}

impl ConnectionState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (Accepted, Read)
                | (Read, Parsed)
                | (Read, ParseFailed)
                | (Parsed, Allowed)
                | (Parsed, Denied)
                | (Allowed, Fetched)
                | (Allowed, Responded)
                | (Fetched, Responded)
                | (Denied, Responded)
                | (ParseFailed, Responded)
        ) || (next == Closed && self != Closed)
    }
}

/// One accepted client connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    state: ConnectionState,
    accepted_at: Instant,
}

impl Connection {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            peer,
            state: ConnectionState::Accepted,
            accepted_at: Instant::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// When the connection was accepted.
    pub fn accepted_at(&self) -> Instant {
        self.accepted_at
    }

    /// Move to `next`, logging illegal transitions instead of panicking.
    pub fn advance(&mut self, next: ConnectionState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                connection_id = %self.id,
                from = ?self.state,
                to = ?next,
                "Unexpected connection state transition"
            );
        }
        tracing::trace!(connection_id = %self.id, from = ?self.state, to = ?next, "State change");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ConnectionState::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn happy_path_is_legal() {
        let path = [Accepted, Read, Parsed, Allowed, Fetched, Responded, Closed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn denial_and_parse_failure_paths() {
        assert!(Parsed.can_transition_to(Denied));
        assert!(Denied.can_transition_to(Responded));
        assert!(Read.can_transition_to(ParseFailed));
        assert!(ParseFailed.can_transition_to(Closed));
        assert!(ParseFailed.can_transition_to(Responded));
    }

    #[test]
    fn any_state_can_close_once() {
        for state in [Accepted, Read, Parsed, ParseFailed, Allowed, Denied, Fetched, Responded] {
            assert!(state.can_transition_to(Closed));
        }
        assert!(!Closed.can_transition_to(Closed));
    }

    #[test]
    fn skipping_stages_is_illegal() {
        assert!(!Accepted.can_transition_to(Parsed));
        assert!(!Denied.can_transition_to(Fetched));
        assert!(!Parsed.can_transition_to(Fetched));
        assert!(!Responded.can_transition_to(Read));
    }

    #[test]
    fn connection_tracks_state() {
        let mut conn = Connection::new("127.0.0.1:5000".parse().unwrap());
        assert_eq!(conn.state(), Accepted);
        conn.advance(Read);
        conn.advance(ParseFailed);
        conn.advance(Closed);
        assert_eq!(conn.state(), Closed);
        assert_eq!(conn.peer().port(), 5000);
    }
}
