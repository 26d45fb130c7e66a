pub mod graphics;

pub use graphics::Graphics;
pub use tiny_skia::Color;
