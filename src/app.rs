//! Window messages and the viewer that handles them.
//!
//! winit events are converted into owned [`Message`]s and routed through a
//! [`MessageTable`] to handlers that get `&mut Viewer` directly.

use std::collections::HashMap;

use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::renderer::Renderer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Resize { width: u32, height: u32 },
    Redraw,
    Close,
    Key { key: KeyCode, pressed: bool },
    MouseButton { pressed: bool },
    CursorMoved { x: f64, y: f64 },
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Resize,
    Redraw,
    Close,
    Key,
    MouseButton,
    CursorMoved,
    Tick,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Resize { .. } => MessageKind::Resize,
            Message::Redraw => MessageKind::Redraw,
            Message::Close => MessageKind::Close,
            Message::Key { .. } => MessageKind::Key,
            Message::MouseButton { .. } => MessageKind::MouseButton,
            Message::CursorMoved { .. } => MessageKind::CursorMoved,
            Message::Tick => MessageKind::Tick,
        }
    }

    /// Messages the viewer cares about. Only the left button drives the camera.
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::Resized(size) => Some(Message::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::RedrawRequested => Some(Message::Redraw),
            WindowEvent::CloseRequested => Some(Message::Close),
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(key) => Some(Message::Key {
                    key,
                    pressed: event.state == ElementState::Pressed,
                }),
                PhysicalKey::Unidentified(_) => None,
            },
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(Message::MouseButton {
                pressed: *state == ElementState::Pressed,
            }),
            WindowEvent::CursorMoved { position, .. } => Some(Message::CursorMoved {
                x: position.x,
                y: position.y,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Yes,
    No,
}

pub type Handler<S> = fn(&mut S, &Message) -> Result<Handled, RenderError>;

/// Handlers keyed by message kind.
pub struct MessageTable<S> {
    handlers: HashMap<MessageKind, Handler<S>>,
}

impl<S> MessageTable<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: MessageKind, handler: Handler<S>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn is_registered(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Unregistered kinds fall through as `Handled::No`.
    pub fn dispatch(&self, state: &mut S, message: &Message) -> Result<Handled, RenderError> {
        match self.handlers.get(&message.kind()) {
            Some(handler) => handler(state, message),
            None => Ok(Handled::No),
        }
    }
}

impl<S> Default for MessageTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The application: a renderer plus the quit flag. Quitting only takes
/// effect between ticks.
pub struct Viewer<G: GpuContext> {
    renderer: Renderer<G>,
    table: MessageTable<Viewer<G>>,
    quit_requested: bool,
}

impl<G: GpuContext> Viewer<G> {
    pub fn new(renderer: Renderer<G>) -> Self {
        let mut table: MessageTable<Self> = MessageTable::new();
        table
            .register(MessageKind::Resize, Self::on_resize)
            .register(MessageKind::Close, Self::on_close)
            .register(MessageKind::Key, Self::on_key)
            .register(MessageKind::MouseButton, Self::on_mouse_button)
            .register(MessageKind::CursorMoved, Self::on_cursor_moved)
            .register(MessageKind::Tick, Self::on_tick);

        Self {
            renderer,
            table,
            quit_requested: false,
        }
    }

    pub fn renderer(&self) -> &Renderer<G> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<G> {
        &mut self.renderer
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn handle(&mut self, message: &Message) -> Result<Handled, RenderError> {
        // The table lives inside the viewer, so lift it out for the call.
        let table = std::mem::take(&mut self.table);
        let result = table.dispatch(self, message);
        self.table = table;
        result
    }

    /// Final GPU wait. Must run before the viewer drops its GPU objects.
    pub fn shutdown(&mut self) -> Result<(), RenderError> {
        self.renderer.shutdown()
    }

    fn on_resize(&mut self, message: &Message) -> Result<Handled, RenderError> {
        if let Message::Resize { width, height } = message {
            log::debug!("Ignoring resize to {}x{}", width, height);
        }
        Ok(Handled::Yes)
    }

    fn on_close(&mut self, _message: &Message) -> Result<Handled, RenderError> {
        log::info!("Close requested");
        self.request_quit();
        Ok(Handled::Yes)
    }

    fn on_key(&mut self, message: &Message) -> Result<Handled, RenderError> {
        let Message::Key { key, pressed } = *message else {
            return Ok(Handled::No);
        };

        if key == KeyCode::Escape {
            if pressed {
                self.request_quit();
            }
            return Ok(Handled::Yes);
        }

        if self.renderer.input_mut().process_key(key, pressed) {
            Ok(Handled::Yes)
        } else {
            Ok(Handled::No)
        }
    }

    fn on_mouse_button(&mut self, message: &Message) -> Result<Handled, RenderError> {
        if let Message::MouseButton { pressed } = *message {
            self.renderer.input_mut().process_mouse_button(pressed);
        }
        Ok(Handled::Yes)
    }

    fn on_cursor_moved(&mut self, message: &Message) -> Result<Handled, RenderError> {
        if let Message::CursorMoved { x, y } = *message {
            self.renderer.input_mut().process_cursor(x, y);
        }
        Ok(Handled::Yes)
    }

    fn on_tick(&mut self, _message: &Message) -> Result<Handled, RenderError> {
        if self.quit_requested {
            return Ok(Handled::No);
        }
        let report = self.renderer.tick()?;
        log::trace!("Frame {} presented", report.signaled);
        Ok(Handled::Yes)
    }
}
