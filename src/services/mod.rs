pub mod event_listener;
pub mod fade_scheduler;
pub mod interpolator;
pub mod opacity_sink;
pub mod window_state;

pub use event_listener::create_event_listener;
pub use fade_scheduler::FadeScheduler;
pub use opacity_sink::{create_opacity_sink, OpacitySink};
