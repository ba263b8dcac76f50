use crate::fanout;
use crate::AppState;
use live_events::{Event, TimerAction, TimerUpdate};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

/// Spawn the single server-wide timer loop. One tick per second until the
/// cancellation token fires.
pub fn spawn(state: AppState) -> JoinHandle<()> {
	tokio::spawn(run(state))
}

async fn run(state: AppState) {
	let mut tick = interval(Duration::from_secs(1));
	tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
	info!("timer ticker started");

	loop {
		tokio::select! {
			() = state.cancel_token.cancelled() => {
				info!("timer ticker stopped");
				break;
			}
			_ = tick.tick() => {
				if let Err(e) = tick_once(&state).await {
					warn!(error = %e, "timer tick failed");
				}
			}
		}
	}
}

/// Advance every running timer once: snapshot under the store guard,
/// build payloads and resolve recipients outside it, then emit.
/// A failure for one timer never stalls the others.
async fn tick_once(state: &AppState) -> Result<(), sqlx::Error> {
	let running = state.live.running_timers();

	for timer in running {
		let payload = TimerUpdate::now(
			timer.object_id.as_i64(),
			TimerAction::Update,
			timer.time_format.render(timer.elapsed),
			timer.elapsed,
			timer.time_format.as_str(),
			timer.key.channel.as_str(),
		);
		let event = Event::TimerUpdate(payload);

		// the live-state key carries only the project name; every project
		// row under that name fans out to its own audience
		let projects = state.db.projects_by_name(timer.key.project.as_str()).await?;
		for project in projects {
			match fanout::recipient_rooms(&state.db, &project).await {
				Ok(rooms) => fanout::broadcast(&state.rooms, &rooms, &event),
				Err(e) => warn!(project = %project.name, error = %e, "failed to resolve tick recipients"),
			}
		}
	}
	Ok(())
}
