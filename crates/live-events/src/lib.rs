pub mod events;
pub mod messages;

pub use events::{ErrorPayload, Event, EventType, JoinedPayload, LiveStateCleared, ObjectLiveUpdate, SceneLiveUpdate, TimerAction, TimerUpdate};
pub use messages::{ClientMessage, JoinRequest};
