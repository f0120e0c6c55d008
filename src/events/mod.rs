pub mod window;

pub use window::{ContainerKind, WindowDescriptor, WindowEvent, WindowId};
