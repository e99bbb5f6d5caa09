use std::rc::Rc;

use glam::{Mat4, Vec2};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseWheelDirection;
use sdl2::video::Window;
use sdl2::{EventPump, VideoSubsystem};

use crate::renderer::Renderer;
use crate::scene::mesh::Light;
use crate::scene::Drawable;
use crate::trackball::Trackball;

/// What an input event asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Close,
    Key(Keycode),
    Pointer {
        old: Vec2,
        new: Vec2,
        rotate: bool,
        pan: bool,
    },
    Zoom(f32),
    Resize,
}

/// Translates one SDL event. `pointer` holds the last pointer position with a
/// bottom-left origin and is updated by motion events.
pub fn interpret(event: &Event, pointer: &mut Vec2, window_height: u32) -> Option<Action> {
    match event {
        Event::Quit { .. } => Some(Action::Close),
        Event::KeyDown {
            keycode: Some(keycode),
            ..
        } => Some(match *keycode {
            Keycode::Escape | Keycode::Q => Action::Close,
            key => Action::Key(key),
        }),
        Event::MouseMotion {
            x, y, mousestate, ..
        } => {
            let old = *pointer;
            *pointer = Vec2::new(*x as f32, window_height as f32 - *y as f32);
            Some(Action::Pointer {
                old,
                new: *pointer,
                rotate: mousestate.left(),
                pan: mousestate.right(),
            })
        }
        Event::MouseWheel { y, direction, .. } => {
            let y = match direction {
                MouseWheelDirection::Flipped => -*y,
                _ => *y,
            };
            // Wheel away from the user zooms in.
            Some(Action::Zoom(-y as f32))
        }
        Event::Window {
            win_event: WindowEvent::SizeChanged(..) | WindowEvent::Resized(..),
            ..
        } => Some(Action::Resize),
        _ => None,
    }
}

/// Owns the window, the camera, the light and the root drawables, and runs
/// the frame loop until the window is closed.
pub struct Viewer {
    window: Window,
    event_pump: EventPump,
    renderer: Renderer,
    trackball: Trackball,
    light: Rc<Light>,
    drawables: Vec<Rc<dyn Drawable>>,
    pointer: Vec2,
}

impl Viewer {
    pub fn new(
        video: &VideoSubsystem,
        window: Window,
        event_pump: EventPump,
        light: Rc<Light>,
    ) -> Viewer {
        Viewer {
            renderer: Renderer::new(video, &window),
            window,
            event_pump,
            trackball: Trackball::default(),
            light,
            drawables: Vec::new(),
            pointer: Vec2::ZERO,
        }
    }

    pub fn add(&mut self, drawables: impl IntoIterator<Item = Rc<dyn Drawable>>) {
        self.drawables.extend(drawables);
    }

    pub fn run(&mut self) {
        loop {
            let events: Vec<Event> = self.event_pump.poll_iter().collect();
            for event in &events {
                let height = self.window.size().1;
                match interpret(event, &mut self.pointer, height) {
                    Some(Action::Close) => return,
                    Some(action) => self.apply(action),
                    None => {}
                }
            }
            self.render();
            self.window.gl_swap_window();
            self.light.advance();
        }
    }

    fn apply(&mut self, action: Action) {
        let (width, height) = self.window.size();
        let viewport = Vec2::new(width as f32, height as f32);
        match action {
            Action::Close => {}
            Action::Key(key) => {
                if key == Keycode::W {
                    self.renderer.cycle_polygon_mode();
                }
                for drawable in &self.drawables {
                    if let Some(handler) = drawable.key_handler() {
                        handler.handle_key(key);
                    }
                }
            }
            Action::Pointer {
                old,
                new,
                rotate,
                pan,
            } => {
                if rotate {
                    self.trackball.drag(old, new, viewport);
                }
                if pan {
                    self.trackball.pan(old, new);
                }
            }
            Action::Zoom(delta) => {
                self.trackball.zoom(delta, viewport.y);
                log::trace!("camera distance {:.3}", self.trackball.distance());
            }
            Action::Resize => {
                let (w, h) = self.window.drawable_size();
                self.renderer.resize(w, h);
            }
        }
    }

    fn render(&mut self) {
        self.renderer.clear();
        let (width, height) = self.window.size();
        let view = self.trackball.view_matrix();
        let projection = self
            .trackball
            .projection_matrix(Vec2::new(width as f32, height as f32));
        for drawable in &self.drawables {
            drawable.draw(&projection, &view, &Mat4::IDENTITY);
        }
    }
}
