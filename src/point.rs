//! Point entities: the small dots that gather into clusters and scatter again.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::canvas::DrawTarget;
use crate::cluster::Cluster;
use crate::color::Rgba;
use crate::easing::{ease_in_out_quad, ease_out_cubic};
use crate::phase::Phase;

/// Per-tick view of the simulation handed to entity updates.
#[derive(Debug, Clone, Copy)]
pub struct FrameState {
    pub phase: Phase,
    pub progress: f32,
    /// Milliseconds on the animation clock.
    pub now: f64,
    /// Surface size in pixels.
    pub bounds: Vec2,
    /// Apply the sinusoidal wobble while settling.
    pub settle_wobble: bool,
}

impl FrameState {
    /// Longest link drawn between a point and its cluster.
    pub fn max_link_distance(&self) -> f32 {
        self.bounds.min_element() / 2.0
    }
}

/// A single point.
///
/// `cluster` is an index into the world's cluster list, not an owning handle.
/// It is cleared or re-resolved whenever that list is rebuilt; a stale index
/// found anyway is treated as unassigned.
#[derive(Debug, Clone)]
pub struct Point {
    pub pos: Vec2,
    /// Where the point was when the current clustering pass began.
    pub initial: Vec2,
    pub cluster_target: Vec2,
    pub settle_target: Vec2,
    pub scatter_start: Vec2,
    pub scatter_target: Vec2,
    pub cluster: Option<usize>,

    pub display_color: Rgba,
    pub pre_scatter_color: Rgba,
    pub default_color: Rgba,

    pub size: f32,
    pub speed_factor: f32,
    pub settle_magnitude: f32,
    pub phase: f32,
    pub oscillation_speed: f32,
}

impl Point {
    /// Create a point at `pos` with randomized per-point constants.
    pub fn new<R: Rng + ?Sized>(pos: Vec2, default_color: Rgba, rng: &mut R) -> Self {
        Self {
            pos,
            initial: pos,
            cluster_target: pos,
            settle_target: pos,
            scatter_start: pos,
            scatter_target: pos,
            cluster: None,
            display_color: default_color,
            pre_scatter_color: default_color,
            default_color,
            size: rng.gen_range(1.5..4.0),
            speed_factor: rng.gen_range(0.8..1.2),
            settle_magnitude: rng.gen_range(0.1..0.4),
            phase: rng.gen_range(0.0..TAU),
            oscillation_speed: rng.gen_range(0.001..0.003),
        }
    }

    /// Resolve the assigned cluster, ignoring indices that are out of range.
    pub fn cluster_in<'a>(&self, clusters: &'a [Cluster]) -> Option<&'a Cluster> {
        self.cluster.and_then(|i| clusters.get(i))
    }

    /// Pick a random scatter destination around `origin`.
    pub fn set_scatter_target<R: Rng + ?Sized>(&mut self, origin: Vec2, bounds: Vec2, rng: &mut R) {
        let angle = rng.gen_range(0.0..TAU);
        let base = bounds.min_element() / 2.8;
        let distance = base * (0.6 + rng.gen::<f32>() * 0.8);
        self.scatter_target = origin + Vec2::new(angle.cos(), angle.sin()) * distance;
    }

    /// Snapshot scatter anchors and choose where to fly.
    pub fn prepare_scatter<R: Rng + ?Sized>(&mut self, clusters: &[Cluster], bounds: Vec2, rng: &mut R) {
        self.scatter_start = self.pos;
        self.pre_scatter_color = self.display_color;
        let origin = self.cluster_in(clusters).map_or(self.pos, |c| c.pos);
        self.set_scatter_target(origin, bounds, rng);
    }

    /// Forget the cluster and start the next cycle from the current position.
    pub fn reset_for_next_cycle(&mut self) {
        self.initial = self.pos;
        self.cluster = None;
        self.display_color = self.default_color;
    }

    pub fn update(&mut self, frame: &FrameState, clusters: &[Cluster]) {
        let cluster = self.cluster_in(clusters);

        match frame.phase {
            Phase::Clustering => match cluster {
                Some(c) => {
                    self.cluster_target = c.anchor;
                    self.display_color = c.color;
                    let eased = ease_in_out_quad(frame.progress);
                    let t = (eased * self.speed_factor).min(1.0);
                    self.pos = self.initial.lerp(self.cluster_target, t);
                }
                None => self.display_color = self.default_color,
            },
            Phase::ClusterMoving => match cluster {
                Some(c) => {
                    self.display_color = c.color;
                    self.pos += (c.pos - self.pos) * 0.1 * self.speed_factor;
                }
                None => self.display_color = self.default_color,
            },
            Phase::Settling => match cluster {
                Some(c) => {
                    self.display_color = c.color;
                    self.settle_target = c.pos;
                    let rate = 0.1 + frame.progress * 0.2;
                    self.pos += (self.settle_target - self.pos) * rate;
                    if frame.settle_wobble {
                        self.pos += self.wobble(frame);
                    }
                }
                None => self.display_color = self.default_color,
            },
            Phase::Scattering => {
                let eased = ease_out_cubic(frame.progress);
                let t = (eased * self.speed_factor * 1.1).min(1.0);
                self.pos = self.scatter_start.lerp(self.scatter_target, t);
                let fade = (frame.progress * 1.2).min(1.0);
                self.display_color = self.pre_scatter_color.blend(self.default_color, fade);
            }
            Phase::ClusterTransitioning => {
                self.display_color = self.default_color;
            }
        }
    }

    /// Settling oscillation, shrinking to nothing as the phase ends.
    pub fn wobble(&self, frame: &FrameState) -> Vec2 {
        let amplitude = (1.0 - frame.progress) * 5.0 * self.settle_magnitude;
        let arg = (frame.now * self.oscillation_speed as f64) as f32 + self.phase;
        Vec2::new(arg.sin(), (arg + 1.0).cos()) * amplitude
    }

    /// Opacity of the link to the cluster, or `None` when no link is drawn.
    pub fn link_alpha(&self, frame: &FrameState, cluster_pos: Vec2) -> Option<f32> {
        if !frame.phase.shows_links() {
            return None;
        }
        let dist = self.pos.distance(cluster_pos);
        let max = frame.max_link_distance();
        if dist <= 1.0 || dist >= max {
            return None;
        }

        let falloff = 0.08 + 0.20 * (1.0 - dist / max);
        let p = frame.progress;
        let phase_factor = match frame.phase {
            Phase::Clustering => (p / 0.5).min(1.0),
            Phase::ClusterMoving => 1.0 - (p - 0.5).max(0.0) / 0.5,
            Phase::Settling => 1.0 - p * 0.8,
            _ => 0.0,
        };
        if phase_factor <= 0.0 {
            return None;
        }

        Some((falloff * phase_factor * self.display_color.a).clamp(0.01, 0.7))
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, frame: &FrameState, clusters: &[Cluster]) {
        let color = self.display_color;
        target.fill_circle(self.pos, self.size * 3.0, color.with_alpha(color.a * 0.20));
        target.fill_circle(self.pos, self.size, color);

        if let Some(cluster) = self.cluster_in(clusters) {
            if let Some(alpha) = self.link_alpha(frame, cluster.pos) {
                target.stroke_line(self.pos, cluster.pos, 0.8, color.with_alpha(alpha));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ClusterPalette;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const WHITE_HALF: Rgba = Rgba::new(255, 255, 255, 0.5);

    fn frame(phase: Phase, progress: f32) -> FrameState {
        FrameState {
            phase,
            progress,
            now: 0.0,
            bounds: Vec2::new(800.0, 600.0),
            settle_wobble: false,
        }
    }

    fn cluster_at(x: f32, y: f32) -> Cluster {
        let mut rng = SmallRng::seed_from_u64(3);
        Cluster::new(Vec2::new(x, y), &ClusterPalette::default(), &mut rng)
    }

    fn point_at(x: f32, y: f32) -> Point {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut p = Point::new(Vec2::new(x, y), WHITE_HALF, &mut rng);
        p.speed_factor = 1.0;
        p
    }

    #[test]
    fn test_new_point_constants_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            let p = Point::new(Vec2::ZERO, WHITE_HALF, &mut rng);
            assert!((1.5..4.0).contains(&p.size));
            assert!((0.8..1.2).contains(&p.speed_factor));
            assert!((0.1..0.4).contains(&p.settle_magnitude));
            assert!(p.cluster.is_none());
            assert_eq!(p.display_color, WHITE_HALF);
        }
    }

    #[test]
    fn test_clustering_reaches_anchor() {
        let clusters = vec![cluster_at(100.0, 0.0)];
        let mut p = point_at(0.0, 0.0);
        p.cluster = Some(0);

        p.update(&frame(Phase::Clustering, 0.0), &clusters);
        assert_eq!(p.pos, Vec2::ZERO);
        assert_eq!(p.display_color, clusters[0].color);

        p.update(&frame(Phase::Clustering, 1.0), &clusters);
        assert!(p.pos.distance(Vec2::new(100.0, 0.0)) < 1e-3);
    }

    #[test]
    fn test_stale_cluster_index_is_unassigned() {
        let clusters = vec![cluster_at(100.0, 0.0)];
        let mut p = point_at(5.0, 5.0);
        p.cluster = Some(4);
        p.display_color = Rgba::new(1, 2, 3, 1.0);

        p.update(&frame(Phase::Clustering, 0.5), &clusters);
        assert_eq!(p.pos, Vec2::new(5.0, 5.0));
        assert_eq!(p.display_color, WHITE_HALF);
    }

    #[test]
    fn test_cluster_moving_converges_ten_percent() {
        let mut c = cluster_at(100.0, 0.0);
        c.pos = Vec2::new(100.0, 0.0);
        let clusters = vec![c];
        let mut p = point_at(0.0, 0.0);
        p.cluster = Some(0);

        p.update(&frame(Phase::ClusterMoving, 0.3), &clusters);
        assert!(p.pos.distance(Vec2::new(10.0, 0.0)) < 1e-4);
    }

    #[test]
    fn test_settling_rate_grows_with_progress() {
        let clusters = vec![cluster_at(100.0, 0.0)];

        let mut early = point_at(0.0, 0.0);
        early.cluster = Some(0);
        early.update(&frame(Phase::Settling, 0.0), &clusters);

        let mut late = point_at(0.0, 0.0);
        late.cluster = Some(0);
        late.update(&frame(Phase::Settling, 1.0), &clusters);

        assert!((early.pos.x - 10.0).abs() < 1e-4);
        assert!((late.pos.x - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_settling_wobble_only_when_enabled() {
        let clusters = vec![cluster_at(100.0, 0.0)];
        let mut f = frame(Phase::Settling, 0.0);
        f.now = 1234.0;

        let mut dormant = point_at(0.0, 0.0);
        dormant.cluster = Some(0);
        dormant.update(&f, &clusters);

        let mut wobbling = dormant.clone();
        wobbling.pos = Vec2::ZERO;
        f.settle_wobble = true;
        wobbling.update(&f, &clusters);

        assert_eq!(dormant.pos, Vec2::new(10.0, 0.0));
        let expected = Vec2::new(10.0, 0.0) + wobbling.wobble(&f);
        assert!(wobbling.pos.distance(expected) < 1e-4);
    }

    #[test]
    fn test_scattering_reaches_target_and_fades() {
        let clusters = vec![cluster_at(100.0, 0.0)];
        let mut p = point_at(0.0, 0.0);
        p.cluster = Some(0);
        p.display_color = clusters[0].color;
        let mut rng = SmallRng::seed_from_u64(5);
        p.prepare_scatter(&clusters, Vec2::new(800.0, 600.0), &mut rng);

        p.update(&frame(Phase::Scattering, 1.0), &clusters);
        assert!(p.pos.distance(p.scatter_target) < 1e-3);
        assert_eq!(p.display_color, WHITE_HALF);
    }

    #[test]
    fn test_scattering_midway() {
        let clusters = vec![cluster_at(100.0, 0.0)];
        let mut p = point_at(0.0, 0.0);
        p.cluster = Some(0);
        p.display_color = clusters[0].color;
        let mut rng = SmallRng::seed_from_u64(5);
        p.prepare_scatter(&clusters, Vec2::new(800.0, 600.0), &mut rng);

        p.update(&frame(Phase::Scattering, 0.5), &clusters);
        // ease_out_cubic(0.5) = 0.875, times 1.1
        let expected = p.scatter_start.lerp(p.scatter_target, 0.9625);
        assert!(p.pos.distance(expected) < 1e-3);
        assert_eq!(p.display_color, clusters[0].color.blend(WHITE_HALF, 0.6));
    }

    #[test]
    fn test_scatter_target_distance_band() {
        let clusters = vec![cluster_at(400.0, 300.0)];
        let bounds = Vec2::new(800.0, 600.0);
        let base = 600.0 / 2.8;
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut p = point_at(10.0, 10.0);
            p.cluster = Some(0);
            p.prepare_scatter(&clusters, bounds, &mut rng);
            let d = p.scatter_target.distance(Vec2::new(400.0, 300.0));
            assert!(d >= base * 0.6 - 1e-3 && d <= base * 1.4 + 1e-3);
            assert_eq!(p.scatter_start, Vec2::new(10.0, 10.0));
        }
    }

    #[test]
    fn test_unassigned_scatters_around_itself() {
        let mut p = point_at(50.0, 50.0);
        let mut rng = SmallRng::seed_from_u64(2);
        p.prepare_scatter(&[], Vec2::new(800.0, 600.0), &mut rng);
        let d = p.scatter_target.distance(Vec2::new(50.0, 50.0));
        assert!(d > 0.0);
    }

    #[test]
    fn test_transitioning_resets_color_and_holds_position() {
        let mut p = point_at(20.0, 30.0);
        p.display_color = Rgba::new(9, 9, 9, 1.0);
        p.update(&frame(Phase::ClusterTransitioning, 0.4), &[]);
        assert_eq!(p.pos, Vec2::new(20.0, 30.0));
        assert_eq!(p.display_color, WHITE_HALF);
    }

    #[test]
    fn test_link_alpha_rules() {
        let p = point_at(0.0, 0.0);
        let near = Vec2::new(100.0, 0.0);

        // Fades in over the first half of clustering.
        assert_eq!(p.link_alpha(&frame(Phase::Clustering, 0.0), near), None);
        let a = p.link_alpha(&frame(Phase::Clustering, 0.5), near).unwrap();
        let expected = (0.08 + 0.20 * (1.0 - 100.0 / 300.0)) * 0.5;
        assert!((a - expected).abs() < 1e-5);

        // Gone at the end of cluster moving.
        assert_eq!(p.link_alpha(&frame(Phase::ClusterMoving, 1.0), near), None);

        // Too far, too close, wrong phase.
        assert_eq!(p.link_alpha(&frame(Phase::Settling, 0.0), Vec2::new(400.0, 0.0)), None);
        assert_eq!(p.link_alpha(&frame(Phase::Settling, 0.0), Vec2::new(0.5, 0.0)), None);
        assert_eq!(p.link_alpha(&frame(Phase::Scattering, 0.5), near), None);
    }

    #[test]
    fn test_link_alpha_phase_ramps() {
        let p = point_at(0.0, 0.0);
        let near = Vec2::new(100.0, 0.0);
        let falloff = 0.08 + 0.20 * (1.0 - 100.0 / 300.0);
        let at = |phase, progress| p.link_alpha(&frame(phase, progress), near).unwrap();

        // Full strength until halfway through cluster moving, then fading out.
        assert!((at(Phase::ClusterMoving, 0.25) - falloff * 0.5).abs() < 1e-5);
        assert!((at(Phase::ClusterMoving, 0.75) - falloff * 0.5 * 0.5).abs() < 1e-5);

        // Settling keeps a fifth at the end.
        assert!((at(Phase::Settling, 0.5) - falloff * 0.6 * 0.5).abs() < 1e-5);
        assert!((at(Phase::Settling, 1.0) - falloff * 0.2 * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_link_alpha_floor() {
        let mut p = point_at(0.0, 0.0);
        p.display_color = WHITE_HALF.with_alpha(0.001);
        let a = p.link_alpha(&frame(Phase::Settling, 0.0), Vec2::new(100.0, 0.0)).unwrap();
        assert_eq!(a, 0.01);
    }
}
