//! # Network Simulation
//!
//! Wraps any [`Sender`] with artificial packet loss, duplication and
//! reordering so the synchronization protocol can be exercised under bad
//! conditions. Randomness is seeded, so every run with the same seed drops
//! exactly the same messages.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vectrek_core::Sender;
use vectrek_shared::ComponentMessage;

/// Network conditions for simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConditions {
    /// Packet loss percentage (0-100).
    pub drop_percent: u8,
    /// Duplicate packet percentage (0-100).
    pub duplicate_percent: u8,
    /// Out-of-order percentage (0-100).
    pub reorder_percent: u8,
    /// RNG seed.
    pub seed: u64,
}

impl LinkConditions {
    /// Nothing lost, nothing reordered.
    pub const PERFECT: Self = Self {
        drop_percent: 0,
        duplicate_percent: 0,
        reorder_percent: 0,
        seed: 0,
    };

    /// Poor network conditions (mobile/wifi).
    pub const POOR: Self = Self {
        drop_percent: 5,
        duplicate_percent: 2,
        reorder_percent: 5,
        seed: 0,
    };

    /// True when the link passes everything through untouched.
    #[must_use]
    pub const fn is_perfect(&self) -> bool {
        self.drop_percent == 0 && self.duplicate_percent == 0 && self.reorder_percent == 0
    }
}

impl Default for LinkConditions {
    fn default() -> Self {
        Self::PERFECT
    }
}

/// Counters for a [`LossyLink`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Messages handed to the link.
    pub offered: u64,
    /// Messages passed to the inner sender, duplicates included.
    pub forwarded: u64,
    /// Messages discarded.
    pub dropped: u64,
    /// Extra copies sent.
    pub duplicated: u64,
    /// Messages held back and delivered after their successor.
    pub reordered: u64,
}

/// A sender that loses, duplicates and reorders what passes through it.
#[derive(Debug)]
pub struct LossyLink<S> {
    inner: S,
    conditions: LinkConditions,
    rng: ChaCha8Rng,
    held: Option<ComponentMessage>,
    stats: LinkStats,
}

impl<S: Sender> LossyLink<S> {
    /// Wraps `inner` under the given conditions.
    pub fn new(inner: S, conditions: LinkConditions) -> Self {
        Self {
            inner,
            conditions: Self::clamped(conditions),
            rng: ChaCha8Rng::seed_from_u64(conditions.seed),
            held: None,
            stats: LinkStats::default(),
        }
    }

    fn clamped(mut conditions: LinkConditions) -> LinkConditions {
        conditions.drop_percent = conditions.drop_percent.min(100);
        conditions.duplicate_percent = conditions.duplicate_percent.min(100);
        conditions.reorder_percent = conditions.reorder_percent.min(100);
        conditions
    }

    fn roll(&mut self, percent: u8) -> bool {
        percent > 0 && self.rng.gen_range(0..100_u8) < percent
    }

    fn forward(&mut self, msg: ComponentMessage) {
        self.stats.forwarded += 1;
        self.inner.send(msg);
    }

    /// Delivers a message still being held back for reordering.
    pub fn flush(&mut self) {
        if let Some(msg) = self.held.take() {
            self.forward(msg);
        }
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Active conditions.
    #[must_use]
    pub const fn conditions(&self) -> &LinkConditions {
        &self.conditions
    }

    /// The wrapped sender.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps, delivering any held message first.
    pub fn into_inner(mut self) -> S {
        self.flush();
        self.inner
    }
}

impl<S: Sender> Sender for LossyLink<S> {
    fn send(&mut self, msg: ComponentMessage) {
        self.stats.offered += 1;

        if self.roll(self.conditions.drop_percent) {
            self.stats.dropped += 1;
            tracing::trace!(entity = %msg.entity, "simulated loss");
            return;
        }

        // Hold this one back; it goes out right after the next message
        if self.held.is_none() && self.roll(self.conditions.reorder_percent) {
            self.stats.reordered += 1;
            self.held = Some(msg);
            return;
        }

        self.forward(msg);
        if self.roll(self.conditions.duplicate_percent) {
            self.stats.duplicated += 1;
            self.forward(msg);
        }
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::pipe;
    use vectrek_core::Receiver;
    use vectrek_shared::{EntityId, HelmInput};

    fn msg(id: u64) -> ComponentMessage {
        ComponentMessage::new(EntityId::new(id), HelmInput::THRUST)
    }

    fn drain(rx: &mut impl Receiver) -> Vec<u64> {
        std::iter::from_fn(|| rx.receive())
            .map(|m| m.entity.raw())
            .collect()
    }

    #[test]
    fn test_perfect_link_is_transparent() {
        let (tx, mut rx) = pipe(64);
        let mut link = LossyLink::new(tx, LinkConditions::PERFECT);
        for i in 0..10 {
            link.send(msg(i));
        }

        assert_eq!(drain(&mut rx), (0..10).collect::<Vec<_>>());
        assert_eq!(link.stats().forwarded, 10);
    }

    #[test]
    fn test_total_loss() {
        let (tx, mut rx) = pipe(64);
        let mut link = LossyLink::new(
            tx,
            LinkConditions {
                drop_percent: 100,
                ..LinkConditions::PERFECT
            },
        );
        for i in 0..10 {
            link.send(msg(i));
        }

        assert!(drain(&mut rx).is_empty());
        assert_eq!(link.stats().dropped, 10);
    }

    #[test]
    fn test_reorder_swaps_neighbours() {
        let (tx, mut rx) = pipe(64);
        let mut link = LossyLink::new(
            tx,
            LinkConditions {
                reorder_percent: 100,
                ..LinkConditions::PERFECT
            },
        );
        for i in 0..4 {
            link.send(msg(i));
        }

        assert_eq!(drain(&mut rx), vec![1, 0, 3, 2]);
        assert_eq!(link.stats().reordered, 2);
    }

    #[test]
    fn test_flush_releases_held() {
        let (tx, mut rx) = pipe(64);
        let mut link = LossyLink::new(
            tx,
            LinkConditions {
                reorder_percent: 100,
                ..LinkConditions::PERFECT
            },
        );
        link.send(msg(7));
        assert!(drain(&mut rx).is_empty());

        link.flush();
        assert_eq!(drain(&mut rx), vec![7]);
    }

    #[test]
    fn test_same_seed_same_losses() {
        let conditions = LinkConditions {
            drop_percent: 30,
            duplicate_percent: 10,
            reorder_percent: 10,
            seed: 42,
        };
        let run = || {
            let (tx, mut rx) = pipe(256);
            let mut link = LossyLink::new(tx, conditions);
            for i in 0..100 {
                link.send(msg(i));
            }
            link.flush();
            drain(&mut rx)
        };

        let first = run();
        assert_eq!(first, run());
        assert!(first.len() < 100);
    }
}
