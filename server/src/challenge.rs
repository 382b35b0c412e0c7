//! Challenge issuing and verification for player queries
//!
//! Two policies are supported:
//! - **Fixed**: one well-known challenge handed to every peer. No state is
//!   kept between datagrams. Suitable for tests and simulation.
//! - **Per-peer**: a random challenge per source address, remembered for a
//!   limited time in a bounded table. A spoofed request never sees the
//!   challenge sent to the real address, so it cannot complete the exchange.

use a2s::REQUEST_CHALLENGE;
use log::debug;
use rand::Rng;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Challenge handed out under [`ChallengePolicy::Fixed`] by default
pub const FIXED_CHALLENGE: u32 = 1_876_276_358;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePolicy {
    Fixed(u32),
    PerPeer { ttl: Duration, capacity: usize },
}

impl Default for ChallengePolicy {
    fn default() -> Self {
        ChallengePolicy::Fixed(FIXED_CHALLENGE)
    }
}

#[derive(Debug, Clone, Copy)]
struct IssuedChallenge {
    value: u32,
    issued_at: Instant,
}

/// Tracks issued challenges according to a [`ChallengePolicy`]
#[derive(Debug)]
pub struct ChallengeTable {
    policy: ChallengePolicy,
    issued: HashMap<SocketAddr, IssuedChallenge>,
}

impl ChallengeTable {
    pub fn new(policy: ChallengePolicy) -> Self {
        Self {
            policy,
            issued: HashMap::new(),
        }
    }

    pub fn policy(&self) -> ChallengePolicy {
        self.policy
    }

    /// Returns the challenge `peer` must echo in its next player request
    pub fn issue(&mut self, peer: SocketAddr) -> u32 {
        let (ttl, capacity) = match self.policy {
            ChallengePolicy::Fixed(value) => return value,
            ChallengePolicy::PerPeer { ttl, capacity } => (ttl, capacity.max(1)),
        };

        self.purge_expired(ttl);

        if !self.issued.contains_key(&peer) && self.issued.len() >= capacity {
            self.evict_oldest();
        }

        let value = random_challenge();
        self.issued.insert(
            peer,
            IssuedChallenge {
                value,
                issued_at: Instant::now(),
            },
        );
        value
    }

    /// Checks an echoed challenge. The marker value never verifies.
    pub fn verify(&self, peer: SocketAddr, value: u32) -> bool {
        if value == REQUEST_CHALLENGE {
            return false;
        }

        match self.policy {
            ChallengePolicy::Fixed(expected) => value == expected,
            ChallengePolicy::PerPeer { ttl, .. } => self
                .issued
                .get(&peer)
                .map(|issued| issued.value == value && issued.issued_at.elapsed() <= ttl)
                .unwrap_or(false),
        }
    }

    /// Number of peers currently holding a challenge
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    fn purge_expired(&mut self, ttl: Duration) {
        let before = self.issued.len();
        self.issued.retain(|_, issued| issued.issued_at.elapsed() <= ttl);

        let purged = before - self.issued.len();
        if purged > 0 {
            debug!("Purged {} expired challenges", purged);
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .issued
            .iter()
            .min_by_key(|(_, issued)| issued.issued_at)
            .map(|(addr, _)| *addr);

        if let Some(addr) = oldest {
            debug!("Challenge table full, evicting {}", addr);
            self.issued.remove(&addr);
        }
    }
}

fn random_challenge() -> u32 {
    let mut rng = rand::thread_rng();
    loop {
        let value: u32 = rng.gen();
        if value != REQUEST_CHALLENGE {
            return value;
        }
    }
}
