//! Windowed runner.
//!
//! Opens a winit window, rasterizes the animation into a [`Canvas`] every
//! frame and hands it to the [`Presenter`]. Keys:
//!
//! | Key | Action |
//! |---|---|
//! | Click | add a point |
//! | Space | pause / resume |
//! | R | restart the animation |
//! | Up / Down | one more / one fewer cluster |
//! | S | save a PNG snapshot |
//! | Esc | quit |

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::animation::ClusterAnimation;
use crate::canvas::{Canvas, DrawTarget};
use crate::config::Config;
use crate::error::AppError;
use crate::gpu::Presenter;
use crate::input::{Input, KeyCode};
use crate::time::Clock;

const TITLE_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

pub struct App {
    config: Config,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    canvas: Canvas,
    clock: Clock,
    input: Input,
    animation: ClusterAnimation,
    last_title_update: Instant,
    /// First fatal error, returned from [`run`] once the loop exits.
    error: Option<AppError>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let animation = ClusterAnimation::new(config.clone());
        Self {
            config,
            window: None,
            presenter: None,
            canvas: Canvas::new(0, 0),
            clock: Clock::new(),
            input: Input::new(),
            animation,
            last_title_update: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(width, height);
        }
        self.canvas.resize(width, height);
        self.animation.attach_surface(width, height);
        self.animation.handle_resize(width, height);
    }

    /// Apply the keys and clicks gathered since the last frame.
    fn apply_input(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.now_ms();

        if self.input.key_pressed(KeyCode::Escape) {
            self.animation.stop();
            event_loop.exit();
            return;
        }
        if self.input.key_pressed(KeyCode::Space) {
            if self.clock.is_paused() {
                self.clock.resume();
                self.animation.resume();
            } else {
                self.clock.pause();
                self.animation.pause();
            }
            info!(paused = self.clock.is_paused(), "pause toggled");
        }
        if self.input.key_pressed(KeyCode::R) && !self.config.reduced_motion {
            self.animation.reset(now);
        }

        let clusters = self.animation.world().map(|w| w.cluster_count());
        if let Some(count) = clusters {
            if self.input.key_pressed(KeyCode::Up) {
                self.animation.set_cluster_count(count + 1, now);
            } else if self.input.key_pressed(KeyCode::Down) && count > 1 {
                self.animation.set_cluster_count(count - 1, now);
            }
        }

        if self.input.key_pressed(KeyCode::S) {
            let path = format!("clusterglow-{}.png", self.clock.frame());
            match self.canvas.save_png(&path) {
                Ok(()) => info!(path = %path, "snapshot saved"),
                Err(e) => warn!("{}", e),
            }
        }

        for click in self.input.take_clicks() {
            self.animation.handle_click(click.x, click.y);
        }
    }

    fn update_title(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_title_update) < TITLE_UPDATE_INTERVAL {
            return;
        }
        self.last_title_update = now;

        if let Some(window) = &self.window {
            let mut title = format!("{} - {:.0} fps", self.config.title, self.clock.fps());
            if self.clock.is_paused() {
                title.push_str(" (paused)");
            }
            window.set_title(&title);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.clock.tick();
        self.apply_input(event_loop);
        self.input.begin_frame();
        let now = self.clock.now_ms();

        let (width, height) = self.canvas.size();
        if width > 0 && height > 0 {
            if self.config.reduced_motion {
                self.animation.draw_idle(&mut self.canvas);
            } else {
                // No presenter means the drawing context is gone.
                let target: Option<&mut dyn DrawTarget> = if self.presenter.is_some() {
                    Some(&mut self.canvas)
                } else {
                    None
                };
                self.animation.frame(now, target);
            }
        }

        if let Some(presenter) = &mut self.presenter {
            match presenter.present(&self.canvas) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    warn!("surface lost, reconfiguring");
                    presenter.reconfigure();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory, exiting");
                    event_loop.exit();
                }
                Err(e) => warn!("render error: {:?}", e),
            }
        }

        self.update_title();

        if !self.config.reduced_motion {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = match &self.window {
            Some(window) => window.clone(),
            None => {
                let window_attrs = Window::default_attributes()
                    .with_title(self.config.title.clone())
                    .with_inner_size(winit::dpi::LogicalSize::new(self.config.width, self.config.height));
                match event_loop.create_window(window_attrs) {
                    Ok(window) => {
                        let window = Arc::new(window);
                        self.window = Some(window.clone());
                        window
                    }
                    Err(e) => return self.fail(event_loop, e.into()),
                }
            }
        };

        if self.presenter.is_none() {
            match pollster::block_on(Presenter::new(window.clone())) {
                Ok(presenter) => self.presenter = Some(presenter),
                Err(e) => return self.fail(event_loop, e.into()),
            }
        }

        let size = window.inner_size();
        self.resize(size.width, size.height);

        if self.config.reduced_motion {
            info!("reduced motion requested, animation disabled");
        } else if !self.animation.is_running() {
            self.animation.reset(self.clock.now_ms());
        }
        window.request_redraw();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.presenter = None;
        self.animation.detach_surface();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                self.animation.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.resize(physical_size.width, physical_size.height);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window and run the animation until it is closed.
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(if config.reduced_motion {
        ControlFlow::Wait
    } else {
        ControlFlow::Poll
    });

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
