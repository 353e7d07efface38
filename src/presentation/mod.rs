// Presentation layer - Render collaborators for replayed frames
pub mod log_renderer;
pub mod svg_renderer;
