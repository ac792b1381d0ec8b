//! Start/stop lifecycle around a [`World`].
//!
//! [`ClusterAnimation`] is what a host drives. It knows whether a drawing
//! surface exists, whether a frame is scheduled, and which input listeners
//! are registered. Nothing here returns an error: a missing or lost surface
//! just means no animation.
//!
//! ```ignore
//! let mut anim = ClusterAnimation::new(Config::default());
//! anim.attach_surface(1280, 720);
//! anim.init(clock.now_ms());
//!
//! // Each frame:
//! let keep_going = anim.frame(clock.tick(), Some(&mut canvas));
//! ```

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::canvas::DrawTarget;
use crate::config::Config;
use crate::phase::Phase;
use crate::render::Renderer;
use crate::world::World;

/// Host events the animation subscribes to while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    Resize,
    Click,
}

/// Mixed into a fixed seed so the renderer's stream differs from the world's.
const RENDER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

pub struct ClusterAnimation {
    config: Config,
    surface: Option<(u32, u32)>,
    world: Option<World>,
    renderer: Renderer,
    frame_pending: bool,
    /// Frames stay scheduled but neither tick nor draw.
    paused: bool,
    listeners: Vec<Listener>,
}

impl ClusterAnimation {
    pub fn new(config: Config) -> Self {
        let render_rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed ^ RENDER_SEED_SALT),
            None => SmallRng::from_entropy(),
        };
        let renderer = Renderer::new(config.background, config.starburst_chance, render_rng);
        Self {
            config,
            surface: None,
            world: None,
            renderer,
            frame_pending: false,
            paused: false,
            listeners: Vec::new(),
        }
    }

    // ========== Host surface ==========

    /// Record the host surface and its size in pixels.
    pub fn attach_surface(&mut self, width: u32, height: u32) {
        self.surface = Some((width, height));
    }

    /// The host surface went away.
    pub fn detach_surface(&mut self) {
        self.surface = None;
    }

    pub fn surface(&self) -> Option<(u32, u32)> {
        self.surface
    }

    // ========== Lifecycle ==========

    /// Start the animation.
    ///
    /// Returns `false` without changing anything when the animation is
    /// already running or there is no usable surface.
    pub fn init(&mut self, now: f64) -> bool {
        let (width, height) = match self.surface {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            _ => {
                error!("surface not ready, clustering animation not started");
                return false;
            }
        };
        if self.world.is_some() {
            debug!("clustering animation already running");
            return false;
        }

        let rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let bounds = Vec2::new(width as f32, height as f32);
        let mut world = World::new(&self.config, bounds, now, rng);
        world.populate(self.config.point_count, now);
        self.world = Some(world);

        for listener in [Listener::Resize, Listener::Click] {
            if !self.listeners.contains(&listener) {
                self.listeners.push(listener);
            }
        }
        self.frame_pending = true;

        info!(
            width,
            height,
            points = self.config.point_count.min(self.config.max_points),
            clusters = self.config.cluster_count,
            "clustering animation started"
        );
        true
    }

    /// Cancel the frame loop, drop the listeners and clear all state.
    ///
    /// Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        let was_running = self.world.is_some() || self.frame_pending;
        self.frame_pending = false;
        self.listeners.clear();
        if let Some(mut world) = self.world.take() {
            world.clear();
        }
        if was_running {
            info!("clustering animation stopped");
        }
    }

    /// `stop` then `init`.
    pub fn reset(&mut self, now: f64) -> bool {
        self.stop();
        self.init(now)
    }

    /// Run one tick and draw it.
    ///
    /// `target` is `None` when the host surface's drawing context is gone;
    /// the loop then cancels itself. While paused nothing moves and nothing
    /// is drawn, so the target keeps the last frame. Returns whether another
    /// frame is scheduled.
    pub fn frame(&mut self, now: f64, target: Option<&mut dyn DrawTarget>) -> bool {
        if !self.frame_pending {
            return false;
        }
        let Some(target) = target else {
            warn!("drawing context unavailable, cancelling clustering animation");
            self.frame_pending = false;
            return false;
        };
        let Some(world) = self.world.as_mut() else {
            self.frame_pending = false;
            return false;
        };
        if self.paused {
            return true;
        }

        world.tick(now);
        self.renderer.draw(world, now, target);
        true
    }

    /// Draw only the background, for hosts that keep the animation off.
    pub fn draw_idle(&mut self, target: &mut dyn DrawTarget) {
        self.renderer.draw_background(target);
    }

    /// Hold every entity where it is. Survives `stop` and `reset`.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ========== Listeners ==========

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// Surface was resized. Entity positions are not rescaled.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if !self.listeners.contains(&Listener::Resize) {
            return;
        }
        if let Some(world) = self.world.as_mut() {
            world.resize(Vec2::new(width as f32, height as f32));
        }
    }

    /// Click at `(x, y)` surface pixels: add a point there.
    ///
    /// Returns the new point's index, or `None` if the click was ignored.
    pub fn handle_click(&mut self, x: f32, y: f32) -> Option<usize> {
        if !self.listeners.contains(&Listener::Click) {
            return None;
        }
        self.world.as_mut()?.add_point(Vec2::new(x, y))
    }

    // ========== Between frames ==========

    /// Rebuild the cluster list with `count` clusters.
    pub fn set_cluster_count(&mut self, count: usize, now: f64) {
        if let Some(world) = self.world.as_mut() {
            world.set_cluster_count(count, now);
        }
    }

    // ========== Accessors ==========

    /// A frame is scheduled.
    pub fn is_running(&self) -> bool {
        self.frame_pending
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.world.as_ref().map(|w| w.phase())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CommandRecorder, DrawCommand};

    fn config() -> Config {
        Config {
            seed: Some(11),
            point_count: 40,
            ..Config::default()
        }
    }

    fn running() -> ClusterAnimation {
        let mut anim = ClusterAnimation::new(config());
        anim.attach_surface(400, 300);
        assert!(anim.init(0.0));
        anim
    }

    #[test]
    fn test_init_without_surface_does_nothing() {
        let mut anim = ClusterAnimation::new(config());
        assert!(!anim.init(0.0));
        assert!(!anim.is_running());
        assert!(anim.world().is_none());
        assert!(anim.listeners().is_empty());

        anim.attach_surface(0, 300);
        assert!(!anim.init(0.0));
        assert!(anim.world().is_none());
    }

    #[test]
    fn test_init_populates_and_registers() {
        let anim = running();
        assert!(anim.is_running());
        assert_eq!(anim.world().map(|w| w.points().len()), Some(40));
        assert_eq!(anim.phase(), Some(Phase::Clustering));
        assert_eq!(anim.listeners(), &[Listener::Resize, Listener::Click]);
    }

    #[test]
    fn test_frame_draws_when_running() {
        let mut anim = running();
        let mut rec = CommandRecorder::new(400, 300);
        assert!(anim.frame(16.0, Some(&mut rec)));
        assert!(matches!(rec.commands.first(), Some(DrawCommand::Clear(_))));
        assert!(rec.commands.len() > 1);
    }

    #[test]
    fn test_frame_when_stopped_is_not_scheduled() {
        let mut anim = ClusterAnimation::new(config());
        let mut rec = CommandRecorder::new(10, 10);
        assert!(!anim.frame(0.0, Some(&mut rec)));
        assert!(rec.commands.is_empty());
    }

    #[test]
    fn test_paused_frames_hold_positions() {
        let mut anim = running();
        let mut rec = CommandRecorder::new(400, 300);
        anim.frame(0.0, Some(&mut rec));
        anim.frame(8000.0, Some(&mut rec));
        anim.frame(9000.0, Some(&mut rec));
        assert_eq!(anim.phase(), Some(Phase::ClusterMoving));

        let positions = |a: &ClusterAnimation| -> Vec<Vec2> {
            a.world().map(|w| w.points().iter().map(|p| p.pos).collect()).unwrap_or_default()
        };
        let before = positions(&anim);

        anim.pause();
        rec.commands.clear();
        for _ in 0..60 {
            assert!(anim.frame(9000.0, Some(&mut rec)));
        }
        assert_eq!(positions(&anim), before);
        assert!(rec.commands.is_empty());
        assert!(anim.is_running());

        anim.resume();
        anim.frame(9016.0, Some(&mut rec));
        assert_ne!(positions(&anim), before);
        assert!(!rec.commands.is_empty());
    }

    #[test]
    fn test_pause_survives_reset() {
        let mut anim = running();
        anim.pause();
        assert!(anim.reset(10.0));
        assert!(anim.is_paused());

        let mut rec = CommandRecorder::new(400, 300);
        assert!(anim.frame(20.0, Some(&mut rec)));
        assert!(rec.commands.is_empty());
    }

    #[test]
    fn test_lost_context_cancels_loop() {
        let mut anim = running();
        assert!(!anim.frame(16.0, None));
        assert!(!anim.is_running());

        let mut rec = CommandRecorder::new(400, 300);
        assert!(!anim.frame(32.0, Some(&mut rec)));
        assert!(rec.commands.is_empty());
    }

    #[test]
    fn test_click_adds_point_only_while_listening() {
        let mut anim = ClusterAnimation::new(config());
        assert_eq!(anim.handle_click(10.0, 10.0), None);

        anim.attach_surface(400, 300);
        anim.init(0.0);
        assert_eq!(anim.handle_click(10.0, 10.0), Some(40));

        anim.stop();
        assert_eq!(anim.handle_click(10.0, 10.0), None);
    }

    #[test]
    fn test_resize_updates_world_bounds() {
        let mut anim = running();
        anim.handle_resize(800, 600);
        assert_eq!(anim.world().map(|w| w.bounds()), Some(Vec2::new(800.0, 600.0)));
    }

    #[test]
    fn test_reset_restarts() {
        let mut anim = running();
        anim.handle_click(5.0, 5.0);
        assert!(anim.reset(100.0));
        assert_eq!(anim.world().map(|w| w.points().len()), Some(40));
        assert_eq!(anim.world().map(|w| w.driver().started_at()), Some(100.0));
    }

    #[test]
    fn test_set_cluster_count() {
        let mut anim = running();
        anim.set_cluster_count(3, 50.0);
        assert_eq!(anim.world().map(|w| w.clusters().len()), Some(3));

        let mut idle = ClusterAnimation::new(config());
        idle.set_cluster_count(3, 0.0);
        assert!(idle.world().is_none());
    }

    #[test]
    fn test_draw_idle_is_background_only() {
        let mut anim = ClusterAnimation::new(Config {
            starburst_chance: 0.0,
            ..config()
        });
        let mut rec = CommandRecorder::new(10, 10);
        anim.draw_idle(&mut rec);
        assert_eq!(rec.commands.len(), 1);
    }
}
