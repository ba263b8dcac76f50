pub mod store;
pub mod timer;
pub mod types;

pub use store::{LiveStateStore, ObjectOverride, RunningTimer, SceneFlag, SceneTransition};
pub use timer::{TimeFormat, TimeFormatParseError, TimerRecord, TimerState};
pub use types::{ChannelId, ObjectId, ProjectName, SceneId, StateKey};
