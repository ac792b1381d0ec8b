//! # clusterglow
//!
//! A particle clustering animation. A few hundred points drift toward a
//! handful of glowing clusters, the clusters settle on their members'
//! centroid, then everything scatters and the clusters recolor and move
//! before the next round.
//!
//! ## Quick Start
//!
//! ```ignore
//! use clusterglow::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     clusterglow::run(Config::default())
//! }
//! ```
//!
//! ## The cycle
//!
//! One round runs through five phases, each for a fixed time:
//!
//! | Phase | Default | What happens |
//! |---|---|---|
//! | Clustering | 8000ms | points ease toward their cluster, cluster targets track the centroid |
//! | ClusterMoving | 2000ms | clusters glide to their target, points follow |
//! | Settling | 700ms | clusters snap to target, points close in |
//! | Scattering | 2000ms | points fly outward and fade to white |
//! | ClusterTransitioning | 1500ms | clusters move to new spots and new colors |
//!
//! Then every point is reassigned to its nearest cluster and the cycle
//! starts over.
//!
//! ## Headless use
//!
//! The simulation does not need a window. Drive a [`World`] directly, or a
//! [`ClusterAnimation`] with any [`DrawTarget`]:
//!
//! ```ignore
//! use clusterglow::prelude::*;
//!
//! let mut anim = ClusterAnimation::new(Config { seed: Some(1), ..Config::default() });
//! anim.attach_surface(640, 480);
//! anim.init(0.0);
//!
//! let mut canvas = Canvas::new(640, 480);
//! for frame in 0..600 {
//!     anim.frame(frame as f64 * 16.0, Some(&mut canvas));
//! }
//! canvas.save_png("frame.png")?;
//! ```

pub mod animation;
pub mod assign;
pub mod canvas;
pub mod cluster;
pub mod color;
pub mod config;
pub mod easing;
pub mod error;
pub mod gpu;
pub mod input;
pub mod phase;
pub mod point;
pub mod render;
mod shader;
pub mod time;
mod window;
pub mod world;

pub use animation::{ClusterAnimation, Listener};
pub use canvas::{Canvas, CommandRecorder, DrawCommand, DrawTarget, GradientStop};
pub use cluster::Cluster;
pub use color::{ClusterPalette, Rgba};
pub use config::Config;
pub use error::{AppError, ColorParseError, ConfigError, GpuError, SnapshotError};
pub use glam::Vec2;
pub use phase::{EntryAction, Phase, PhaseDriver, PhaseDurations};
pub use point::{FrameState, Point};
pub use render::Renderer;
pub use window::{run, App};
pub use world::World;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::animation::{ClusterAnimation, Listener};
    pub use crate::canvas::{Canvas, DrawTarget};
    pub use crate::color::{ClusterPalette, Rgba};
    pub use crate::config::Config;
    pub use crate::error::AppError;
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::phase::{Phase, PhaseDurations};
    pub use crate::time::Clock;
    pub use crate::world::World;
    pub use crate::Vec2;
}
