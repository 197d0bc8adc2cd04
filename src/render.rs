//! Render commands and the sink interface the terrain grid draws into.

/// Depth layer of the main tile for a cell.
pub const PRIMARY_DEPTH: u8 = 0;
/// Depth layer of an underlay, one step behind the primary tile.
pub const UNDERLAY_DEPTH: u8 = 1;

/// One tile placement: sprite `image_index` at grid cell `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderCommand {
    pub x: usize,
    pub y: usize,
    pub image_index: i32,
    pub depth: u8,
}

impl RenderCommand {
    pub fn is_underlay(&self) -> bool {
        self.depth == UNDERLAY_DEPTH
    }
}

/// Receives tile placements from a render pass.
///
/// Called once per cell, or twice when a transition needs an underlay
/// (underlay first). Whether `image_index` exists in the sprite set is the
/// sink's concern.
pub trait RenderSink {
    fn place(&mut self, position: (usize, usize), image_index: i32, depth: u8);
}

/// Sink that records every placement in call order.
#[derive(Clone, Debug, Default)]
pub struct CommandBuffer {
    pub commands: Vec<RenderCommand>,
}

impl CommandBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn underlay_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_underlay()).count()
    }

    /// Primary command for a cell, if one was placed.
    pub fn primary_at(&self, x: usize, y: usize) -> Option<&RenderCommand> {
        self.commands
            .iter()
            .find(|c| c.x == x && c.y == y && c.depth == PRIMARY_DEPTH)
    }

    /// Underlay command for a cell, if one was placed.
    pub fn underlay_at(&self, x: usize, y: usize) -> Option<&RenderCommand> {
        self.commands
            .iter()
            .find(|c| c.x == x && c.y == y && c.is_underlay())
    }
}

impl RenderSink for CommandBuffer {
    fn place(&mut self, (x, y): (usize, usize), image_index: i32, depth: u8) {
        self.commands.push(RenderCommand { x, y, image_index, depth });
    }
}
