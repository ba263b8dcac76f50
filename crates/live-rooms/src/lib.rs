pub mod registry;
pub mod room;
pub mod session;

pub use registry::{EmitReport, RegistryError, RoomRegistry};
pub use room::{Room, RoomParseError};
pub use session::SessionId;
