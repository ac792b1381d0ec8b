//! Cluster entities: the pulsing centroids points gravitate towards.

use glam::Vec2;
use rand::Rng;

use crate::canvas::{DrawTarget, GradientStop};
use crate::color::{ClusterPalette, Rgba};
use crate::easing::{ease_in_out_cubic, ease_in_out_quad};
use crate::phase::Phase;
use crate::point::FrameState;

#[derive(Debug, Clone)]
pub struct Cluster {
    pub pos: Vec2,
    /// Phase-start anchor.
    pub anchor: Vec2,
    /// Centroid of the assigned points.
    pub target: Vec2,
    pub transition_start: Vec2,
    /// Where the cluster begins the next cycle.
    pub next_anchor: Vec2,

    pub color: Rgba,
    pub next_color: Rgba,
    pub transition_start_color: Rgba,

    pub size: f32,
    pub opacity: f32,
    pub pulse: f32,
}

impl Cluster {
    pub fn new<R: Rng + ?Sized>(pos: Vec2, palette: &ClusterPalette, rng: &mut R) -> Self {
        let color = palette.pick(rng);
        Self {
            pos,
            anchor: pos,
            target: pos,
            transition_start: pos,
            next_anchor: pos,
            color,
            next_color: color,
            transition_start_color: color,
            size: 8.0,
            opacity: 1.0,
            pulse: 1.0,
        }
    }

    /// Pre-pick the color for the next cycle, always different from the current one.
    pub fn stage_next_color<R: Rng + ?Sized>(&mut self, palette: &ClusterPalette, rng: &mut R) {
        self.next_color = palette.pick_other(self.color, rng);
    }

    /// Snapshot the transition start and choose the next position and color.
    ///
    /// The next position keeps a 10% margin from every edge of `bounds`.
    pub fn prepare_transition<R: Rng + ?Sized>(
        &mut self,
        bounds: Vec2,
        palette: &ClusterPalette,
        rng: &mut R,
    ) {
        self.transition_start = self.pos;
        self.transition_start_color = self.color;
        self.next_anchor = Vec2::new(
            rng.gen::<f32>() * bounds.x * 0.8 + bounds.x * 0.1,
            rng.gen::<f32>() * bounds.y * 0.8 + bounds.y * 0.1,
        );
        self.stage_next_color(palette, rng);
    }

    /// Adopt the staged position and color as the start of a new cycle.
    pub fn commit_next(&mut self) {
        self.pos = self.next_anchor;
        self.anchor = self.pos;
        self.target = self.pos;
        self.color = self.next_color;
        self.opacity = 1.0;
        self.pulse = 1.0;
    }

    pub fn update(&mut self, frame: &FrameState) {
        let p = frame.progress;
        let t = frame.now;
        self.opacity = 1.0;

        match frame.phase {
            Phase::Clustering => {
                self.pos = self.anchor;
                self.pulse = 1.0 + breathe(t, 0.0015, self.anchor.x) * 0.08;
            }
            Phase::ClusterMoving => {
                self.pos = self.anchor.lerp(self.target, ease_in_out_quad(p));
                self.pulse = 1.0 + breathe(t, 0.002, self.anchor.y) * 0.1 * (1.0 - p);
            }
            Phase::Settling => {
                self.pos = self.target;
                self.pulse = 1.0 + breathe(t, 0.0025, self.pos.x) * 0.15 * (1.0 - p);
            }
            Phase::Scattering => {
                self.pos = self.target;
                self.pulse = 1.0;
            }
            Phase::ClusterTransitioning => {
                let eased = ease_in_out_cubic(p);
                self.pos = self.transition_start.lerp(self.next_anchor, eased);
                self.color = self.transition_start_color.blend(self.next_color, eased);
                self.pulse = 1.0;
            }
        }
    }

    pub fn draw(&self, target: &mut dyn DrawTarget) {
        if self.opacity <= 0.0 {
            return;
        }
        let radius = self.size * self.pulse;
        let c = self.color;
        let a = c.a * self.opacity;

        target.fill_radial_gradient(
            self.pos,
            radius * 0.2,
            radius * 5.0,
            &[
                GradientStop::new(0.0, c.with_alpha(c.a * 0.5 * self.opacity)),
                GradientStop::new(0.5, c.with_alpha(c.a * 0.2 * self.opacity)),
                GradientStop::new(1.0, c.with_alpha(0.0)),
            ],
        );
        target.fill_circle(self.pos, radius, c.with_alpha(a));
        target.stroke_circle(self.pos, radius, 1.0, Rgba::WHITE.with_alpha(0.3 * self.opacity));
    }
}

/// Sinusoid seeded by a coordinate so clusters breathe out of step.
#[inline]
fn breathe(now: f64, speed: f64, seed: f32) -> f32 {
    (now * speed + seed as f64).sin() as f32
}
