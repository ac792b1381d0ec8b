//! Frame rendering.
//!
//! Order matters: background, then points (with their links), then clusters,
//! so cluster glows sit on top of the links.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::canvas::DrawTarget;
use crate::color::Rgba;
use crate::world::World;

pub struct Renderer {
    background: Rgba,
    starburst_chance: f32,
    rng: SmallRng,
}

impl Renderer {
    pub fn new(background: Rgba, starburst_chance: f32, rng: SmallRng) -> Self {
        Self {
            background,
            starburst_chance,
            rng,
        }
    }

    /// Draw one frame of `world` as of `now`.
    pub fn draw(&mut self, world: &World, now: f64, target: &mut dyn DrawTarget) {
        self.draw_background(target);

        let frame = world.frame_state(now);
        for point in world.points() {
            point.draw(target, &frame, world.clusters());
        }
        for cluster in world.clusters() {
            cluster.draw(target);
        }
    }

    /// Clear, and now and then sprinkle a faint star.
    pub fn draw_background(&mut self, target: &mut dyn DrawTarget) {
        target.clear(self.background);

        if self.rng.gen::<f32>() < self.starburst_chance {
            let (w, h) = target.size();
            let center = Vec2::new(self.rng.gen::<f32>() * w as f32, self.rng.gen::<f32>() * h as f32);
            let radius = self.rng.gen::<f32>() * 0.8;
            let alpha = self.rng.gen::<f32>() * 0.2 + 0.1;
            target.fill_circle(center, radius, Rgba::WHITE.with_alpha(alpha));
        }
    }
}
