use crate::foundation::error::{PipelineError, PipelineResult};

/// Monotonic frame counter carried by every [`Frame`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// The index that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Pixel dimensions of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Build a non-empty frame size.
    pub fn new(width: u32, height: u32) -> PipelineResult<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::invalid_parameters(
                "frame width/height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered by this size.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Opaque handle to a GPU texture owned by the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TextureId(pub u64);

/// Frame descriptor pushed from stage to stage.
///
/// The pipeline core only forwards frames; what a texture contains is the concern of the node
/// that receives it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Position of the frame in its stream.
    pub index: FrameIndex,
    /// Dimensions of the texture.
    pub size: FrameSize,
    /// Texture holding the pixels.
    pub texture: TextureId,
}

impl Frame {
    /// Build a frame descriptor.
    pub fn new(index: FrameIndex, size: FrameSize, texture: TextureId) -> Self {
        Self {
            index,
            size,
            texture,
        }
    }

    /// Same frame backed by a different texture, as produced by a stage that rendered it.
    pub fn with_texture(self, texture: TextureId) -> Self {
        Self { texture, ..self }
    }
}

/// Out-of-band structural notice delivered to inputs outside the frame path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The upstream frame size changed.
    InputSize(FrameSize),
    /// The upstream source stopped producing frames.
    EndProcessing,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
