//! The five-phase animation cycle and its progress clock.
//!
//! ```text
//! Clustering ─▶ ClusterMoving ─▶ Settling ─▶ Scattering ─▶ ClusterTransitioning ─┐
//!     ▲                                                                           │
//!     └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each phase runs for a fixed duration. [`PhaseDriver::advance`] turns wall
//! clock milliseconds into a progress fraction and reports when the current
//! phase has completed. The side effects of entering a phase are described by
//! [`EntryAction`] and applied by [`World`](crate::world::World), so the
//! transition table below is the single place that says what happens where.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One stage of the animation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Points ease towards their cluster's anchor; cluster targets track the centroid.
    #[default]
    Clustering,
    /// Clusters glide to their centroid, points chase them.
    ClusterMoving,
    /// Clusters snap to the centroid, points tighten around it.
    Settling,
    /// Points fly outwards and fade back to the default color.
    Scattering,
    /// Clusters travel to fresh positions and colors for the next cycle.
    ClusterTransitioning,
}

/// Side effect applied once when a phase is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Snapshot each cluster's position as the phase-start anchor.
    AnchorClusters,
    /// Move each cluster onto its computed target.
    SnapClustersToTarget,
    /// Record scatter anchors for points, stage next positions and colors for clusters.
    PrepareScatter,
    /// Nothing to do.
    None,
    /// Commit staged cluster positions and colors, reset and reassign points.
    CommitNextCycle,
}

/// `(from, to, action applied on entering "to")`.
pub const TRANSITIONS: [(Phase, Phase, EntryAction); 5] = [
    (Phase::Clustering, Phase::ClusterMoving, EntryAction::AnchorClusters),
    (Phase::ClusterMoving, Phase::Settling, EntryAction::SnapClustersToTarget),
    (Phase::Settling, Phase::Scattering, EntryAction::PrepareScatter),
    (Phase::Scattering, Phase::ClusterTransitioning, EntryAction::None),
    (Phase::ClusterTransitioning, Phase::Clustering, EntryAction::CommitNextCycle),
];

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Clustering,
        Phase::ClusterMoving,
        Phase::Settling,
        Phase::Scattering,
        Phase::ClusterTransitioning,
    ];

    /// The phase that follows this one.
    pub fn next(self) -> Phase {
        self.transition().1
    }

    /// Action to run when this phase is entered from its predecessor.
    pub fn entry_action(self) -> EntryAction {
        TRANSITIONS
            .iter()
            .find(|(_, to, _)| *to == self)
            .map(|(_, _, action)| *action)
            .unwrap_or(EntryAction::None)
    }

    fn transition(self) -> (Phase, Phase, EntryAction) {
        TRANSITIONS[self as usize]
    }

    /// Whether points draw connecting lines to their cluster in this phase.
    pub fn shows_links(self) -> bool {
        matches!(self, Phase::Clustering | Phase::ClusterMoving | Phase::Settling)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Clustering => "clustering",
            Phase::ClusterMoving => "cluster_moving",
            Phase::Settling => "settling",
            Phase::Scattering => "scattering",
            Phase::ClusterTransitioning => "cluster_transitioning",
        };
        f.write_str(name)
    }
}

/// Length of each phase in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub clustering: f64,
    pub cluster_moving: f64,
    pub settling: f64,
    pub scattering: f64,
    pub cluster_transitioning: f64,
}

impl PhaseDurations {
    pub fn of(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Clustering => self.clustering,
            Phase::ClusterMoving => self.cluster_moving,
            Phase::Settling => self.settling,
            Phase::Scattering => self.scattering,
            Phase::ClusterTransitioning => self.cluster_transitioning,
        }
    }

    /// Length of one full cycle.
    pub fn cycle(&self) -> f64 {
        Phase::ALL.iter().map(|p| self.of(*p)).sum()
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            clustering: 8000.0,
            cluster_moving: 2000.0,
            settling: 700.0,
            scattering: 2000.0,
            cluster_transitioning: 1500.0,
        }
    }
}

/// Result of one [`PhaseDriver::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTick {
    /// Phase the tick was measured in.
    pub phase: Phase,
    /// Progress reached in that phase.
    pub progress: f32,
    /// The phase has run its full duration.
    pub completed: bool,
}

/// Tracks the current phase, when it started, and how far through it we are.
///
/// Progress never decreases within a phase and never exceeds 1. At most one
/// phase completes per `advance`, so a long stall between frames still visits
/// every phase in order.
#[derive(Debug, Clone)]
pub struct PhaseDriver {
    phase: Phase,
    started_at: f64,
    progress: f32,
    durations: PhaseDurations,
}

impl PhaseDriver {
    pub fn new(durations: PhaseDurations, now: f64) -> Self {
        Self {
            phase: Phase::Clustering,
            started_at: now,
            progress: 0.0,
            durations,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    /// Recompute progress for `now`.
    pub fn advance(&mut self, now: f64) -> PhaseTick {
        let duration = self.durations.of(self.phase);
        let raw = if duration > 0.0 {
            ((now - self.started_at) / duration).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        self.progress = self.progress.max(raw);

        PhaseTick {
            phase: self.phase,
            progress: self.progress,
            completed: self.progress >= 1.0,
        }
    }

    /// Enter `phase` at `now` with progress reset to zero.
    pub fn enter(&mut self, phase: Phase, now: f64) {
        self.phase = phase;
        self.started_at = now;
        self.progress = 0.0;
    }

    /// Move on to the next phase in the cycle and return it.
    pub fn enter_next(&mut self, now: f64) -> Phase {
        let next = self.phase.next();
        self.enter(next, now);
        next
    }

    /// Restart the cycle from Clustering.
    pub fn restart(&mut self, now: f64) {
        self.enter(Phase::Clustering, now);
    }
}
