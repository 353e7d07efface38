// Application layer - Windowing, smoothing and stacking pipeline plus the frame loop
pub mod feed_repository;
pub mod frame_renderer;
pub mod frame_scheduler;
pub mod smoother;
pub mod spline;
pub mod stacker;
pub mod window_selector;
