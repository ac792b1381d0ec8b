//! The simulation context: every point, every cluster, and the phase driver.
//!
//! A [`World`] is owned by its caller and advanced one [`tick`](World::tick) per
//! frame. Nothing in here is global, so several worlds can coexist and tests can
//! drive one with hand-picked timestamps.
//!
//! # Cluster references
//!
//! Points refer to clusters by index. Any operation that replaces the cluster
//! list ([`replace_clusters`](World::replace_clusters),
//! [`set_cluster_count`](World::set_cluster_count),
//! [`clear`](World::clear)) re-resolves or clears every point's index before
//! returning, so indices are never stale at a tick boundary.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info, trace};

use crate::assign::{assign_all, assign_point, update_centroids};
use crate::cluster::Cluster;
use crate::color::{ClusterPalette, Rgba};
use crate::config::Config;
use crate::phase::{EntryAction, Phase, PhaseDriver};
use crate::point::{FrameState, Point};

/// Distance kept between freshly spawned points and the surface edge.
const SPAWN_MARGIN: f32 = 20.0;
/// Share of initial points placed in a blob rather than uniformly.
const BLOB_SHARE: f32 = 0.85;

pub struct World {
    points: Vec<Point>,
    clusters: Vec<Cluster>,
    driver: PhaseDriver,
    bounds: Vec2,
    cluster_count: usize,
    max_points: usize,
    palette: ClusterPalette,
    point_color: Rgba,
    settle_wobble: bool,
    rng: SmallRng,
}

impl World {
    /// An empty world. Call [`populate`](Self::populate) to fill it.
    pub fn new(config: &Config, bounds: Vec2, now: f64, rng: SmallRng) -> Self {
        Self {
            points: Vec::new(),
            clusters: Vec::new(),
            driver: PhaseDriver::new(config.durations, now),
            bounds,
            cluster_count: config.cluster_count,
            max_points: config.max_points,
            palette: ClusterPalette::new(config.palette.clone()),
            point_color: config.point_color,
            settle_wobble: config.settle_wobble,
            rng,
        }
    }

    // ========== Accessors ==========

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.driver.phase()
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.driver.progress()
    }

    pub fn driver(&self) -> &PhaseDriver {
        &self.driver
    }

    #[inline]
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    #[inline]
    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Every point's cluster index is either unset or in range.
    pub fn cluster_refs_valid(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.cluster.map_or(true, |i| i < self.clusters.len()))
    }

    pub fn frame_state(&self, now: f64) -> FrameState {
        FrameState {
            phase: self.driver.phase(),
            progress: self.driver.progress(),
            now,
            bounds: self.bounds,
            settle_wobble: self.settle_wobble,
        }
    }

    // ========== Setup ==========

    /// Spawn `point_count` points and the configured number of clusters,
    /// assign every point, and start the cycle at Clustering.
    pub fn populate(&mut self, point_count: usize, now: f64) {
        self.points = self.spawn_points(point_count.min(self.max_points));
        self.clusters = self.spawn_clusters(self.cluster_count);
        assign_all(&mut self.points, &self.clusters);
        self.driver.restart(now);
        debug!(
            points = self.points.len(),
            clusters = self.clusters.len(),
            "world populated"
        );
    }

    /// Points bunched around a few random blobs, with some spread uniformly.
    fn spawn_points(&mut self, count: usize) -> Vec<Point> {
        let Vec2 { x: w, y: h } = self.bounds;
        let short_side = self.bounds.min_element();
        let blob_count = self.rng.gen_range(3..6);
        let blobs: Vec<(Vec2, f32)> = (0..blob_count)
            .map(|_| {
                let center = Vec2::new(self.rng.gen::<f32>() * w, self.rng.gen::<f32>() * h);
                let spread = short_side * (0.1 + self.rng.gen::<f32>() * 0.1);
                (center, spread)
            })
            .collect();

        (0..count)
            .map(|_| {
                let pos = if self.rng.gen::<f32>() < BLOB_SHARE {
                    let (center, spread) = blobs[self.rng.gen_range(0..blobs.len())];
                    center
                        + Vec2::new(
                            (self.rng.gen::<f32>() - 0.5) * 2.0 * spread,
                            (self.rng.gen::<f32>() - 0.5) * 2.0 * spread,
                        )
                } else {
                    Vec2::new(self.rng.gen::<f32>() * w, self.rng.gen::<f32>() * h)
                };
                let pos = Vec2::new(
                    pos.x.min(w - SPAWN_MARGIN).max(SPAWN_MARGIN),
                    pos.y.min(h - SPAWN_MARGIN).max(SPAWN_MARGIN),
                );
                Point::new(pos, self.point_color, &mut self.rng)
            })
            .collect()
    }

    fn spawn_clusters(&mut self, count: usize) -> Vec<Cluster> {
        (0..count)
            .map(|_| {
                let pos = Vec2::new(
                    self.rng.gen::<f32>() * self.bounds.x,
                    self.rng.gen::<f32>() * self.bounds.y,
                );
                Cluster::new(pos, &self.palette, &mut self.rng)
            })
            .collect()
    }

    // ========== Frame update ==========

    /// Advance the phase clock to `now` and update every entity.
    ///
    /// At most one phase transition happens per call. Clusters update before
    /// points so points chase the clusters' current positions.
    pub fn tick(&mut self, now: f64) {
        let tick = self.driver.advance(now);

        if tick.phase == Phase::Clustering {
            update_centroids(&self.points, &mut self.clusters);
        }

        if tick.completed {
            let next = self.driver.enter_next(now);
            trace!(from = %tick.phase, to = %next, "phase transition");
            self.apply_entry(next.entry_action());
        }

        let frame = self.frame_state(now);
        for cluster in &mut self.clusters {
            cluster.update(&frame);
        }
        for point in &mut self.points {
            point.update(&frame, &self.clusters);
        }
    }

    fn apply_entry(&mut self, action: EntryAction) {
        match action {
            EntryAction::AnchorClusters => {
                for c in &mut self.clusters {
                    c.anchor = c.pos;
                }
            }
            EntryAction::SnapClustersToTarget => {
                for c in &mut self.clusters {
                    c.pos = c.target;
                }
            }
            EntryAction::PrepareScatter => {
                if self.clusters.is_empty() {
                    return;
                }
                for p in &mut self.points {
                    p.prepare_scatter(&self.clusters, self.bounds, &mut self.rng);
                }
                for c in &mut self.clusters {
                    c.prepare_transition(self.bounds, &self.palette, &mut self.rng);
                }
            }
            EntryAction::None => {}
            EntryAction::CommitNextCycle => {
                for c in &mut self.clusters {
                    c.commit_next();
                }
                for p in &mut self.points {
                    p.reset_for_next_cycle();
                }
                assign_all(&mut self.points, &self.clusters);
            }
        }
    }

    // ========== Mutation between frames ==========

    /// Add a point at `pos` and attach it to the nearest cluster.
    ///
    /// Returns the new point's index, or `None` once the population is at
    /// its cap.
    pub fn add_point(&mut self, pos: Vec2) -> Option<usize> {
        if self.points.len() >= self.max_points {
            info!(max = self.max_points, "max points reached");
            return None;
        }
        let mut point = Point::new(pos, self.point_color, &mut self.rng);
        assign_point(&mut point, &self.clusters);
        self.points.push(point);

        let index = self.points.len() - 1;
        debug!(
            "added point {}/{} at {:.0}, {:.0}, assigned to cluster {:?}",
            self.points.len(),
            self.max_points,
            pos.x,
            pos.y,
            self.points[index].cluster
        );
        Some(index)
    }

    /// Replace the whole cluster list, reassign every point, and restart the
    /// cycle at Clustering.
    pub fn replace_clusters(&mut self, clusters: Vec<Cluster>, now: f64) {
        self.clusters = clusters;
        self.cluster_count = self.clusters.len();
        for p in &mut self.points {
            p.cluster = None;
            assign_point(p, &self.clusters);
        }
        self.driver.restart(now);
    }

    /// Rebuild the cluster list with `count` fresh clusters (at least one).
    pub fn set_cluster_count(&mut self, count: usize, now: f64) {
        let count = count.max(1);
        let clusters = self.spawn_clusters(count);
        self.replace_clusters(clusters, now);
        info!(clusters = count, "cluster list rebuilt");
    }

    /// Record a new surface size. Existing positions are left where they are.
    pub fn resize(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }

    /// Drop every point and cluster.
    pub fn clear(&mut self) {
        self.points.clear();
        self.clusters.clear();
    }

    /// Draw randomness from the world's generator.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}
