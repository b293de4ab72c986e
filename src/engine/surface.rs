use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use ratatui::style::Color;

/// Drawing primitives in game pixel space. The hub rasterizes these to
/// terminal cells, scaled to whatever region the surface is shown in.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Fill { x: f32, y: f32, w: f32, h: f32, color: Color },
    Frame { x: f32, y: f32, w: f32, h: f32, color: Color },
    HLine { y: f32, color: Color },
    VLine { x: f32, color: Color },
    Label { x: f32, y: f32, text: String, color: Color },
}

/// A retained 2D drawing surface with fixed pixel dimensions. Contents
/// persist until the owning game clears and redraws them.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    width: f32,
    height: f32,
    shapes: Vec<Shape>,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_blank(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.shapes.push(Shape::Fill { x, y, w, h, color });
    }

    pub fn frame_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.shapes.push(Shape::Frame { x, y, w, h, color });
    }

    pub fn hline(&mut self, y: f32, color: Color) {
        self.shapes.push(Shape::HLine { y, color });
    }

    pub fn vline(&mut self, x: f32, color: Color) {
        self.shapes.push(Shape::VLine { x, color });
    }

    pub fn label(&mut self, x: f32, y: f32, text: impl Into<String>, color: Color) {
        self.shapes.push(Shape::Label {
            x,
            y,
            text: text.into(),
            color,
        });
    }
}

/// The slot the hub hands a game at construction. The game allocates its
/// fixed-size surface into it and exclusively draws it; the hub keeps a clone
/// to rasterize from between pumps.
#[derive(Clone, Default)]
pub struct RenderTarget {
    slot: Rc<RefCell<Surface>>,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a blank surface sized to the game's fixed dimensions.
    pub fn allocate(&self, width: f32, height: f32) {
        *self.slot.borrow_mut() = Surface::new(width, height);
    }

    /// Mutable access for the owning game's draw pass.
    pub fn frame(&self) -> RefMut<'_, Surface> {
        self.slot.borrow_mut()
    }

    /// Read access for the hub's rasterizer.
    pub fn view(&self) -> Ref<'_, Surface> {
        self.slot.borrow()
    }

    /// Wipe the surface contents (cleanup). Dimensions are kept.
    pub fn wipe(&self) {
        self.slot.borrow_mut().clear();
    }
}
