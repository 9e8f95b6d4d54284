//! Draw list contract
//!
//! The renderer's only output is one rounded, textured rectangle per frame appended to
//! the host's draw list. Batching and z-order belong to the host.

use crate::geometry::{Color, Point, Rect};

/// Host UI draw list able to composite a texture as a rounded rectangle
///
/// `T` is the texture handle type the host's UI backend samples; for the renderer it
/// is the device's read view type.
pub trait DrawList<T> {
    #[allow(clippy::too_many_arguments)]
    fn add_image_rounded(
        &mut self,
        image: &T,
        min: Point,
        max: Point,
        uv_min: Point,
        uv_max: Point,
        tint: Color,
        rounding: f32,
    );
}

/// A recorded draw command
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand<T> {
    ImageRounded {
        image: T,
        rect: Rect,
        uv_min: Point,
        uv_max: Point,
        tint: Color,
        rounding: f32,
    },
}

/// Draw list that records commands for later replay
#[derive(Clone, Debug)]
pub struct CommandList<T> {
    commands: Vec<DrawCommand<T>>,
}

impl<T> CommandList<T> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand<T>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take the recorded commands, leaving the list empty for the next frame
    pub fn drain(&mut self) -> Vec<DrawCommand<T>> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl<T> Default for CommandList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> DrawList<T> for CommandList<T> {
    fn add_image_rounded(
        &mut self,
        image: &T,
        min: Point,
        max: Point,
        uv_min: Point,
        uv_max: Point,
        tint: Color,
        rounding: f32,
    ) {
        self.commands.push(DrawCommand::ImageRounded {
            image: image.clone(),
            rect: Rect::new(min.x, min.y, max.x - min.x, max.y - min.y),
            uv_min,
            uv_max,
            tint,
            rounding,
        });
    }
}
