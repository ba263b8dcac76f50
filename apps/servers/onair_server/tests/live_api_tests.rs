mod common;

use axum::http::StatusCode;
use common::{app, body_json, drain_frames, get_request, post_json, test_state, token_for, ALICE, BOB, CAROL};
use live_rooms::Room;
use live_state::{ChannelId, ProjectName, SceneId};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn push_fans_out_to_owner_overlay() {
	let state = test_state().await;
	let app = app(&state);

	// overlay session living in the owner's user room
	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();

	let response = app.oneshot(post_json("/api/scenes/1/push", Some(&token_for(ALICE)), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;
	assert_eq!(body["status"], "success");
	assert_eq!(body["scene_id"], 1);
	assert_eq!(body["channel_id"], "default");

	let frames = drain_frames(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0]["event"], "scene_live_update");
	assert_eq!(frames[0]["data"]["scene_id"], 1);
	assert_eq!(frames[0]["data"]["is_live"], true);
	assert_eq!(frames[0]["data"]["channel_id"], "default");

	let scenes = state.live.get_all_live_scenes(&ProjectName::new("news"), &ChannelId::default());
	assert_eq!(scenes.get(&SceneId::new(1)), Some(&true));
}

#[tokio::test]
async fn second_push_clears_sibling_in_order() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(ALICE);

	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();

	let response = app.clone().oneshot(post_json("/api/scenes/1/push", Some(&token), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	drain_frames(&mut rx);

	let response = app.oneshot(post_json("/api/scenes/2/push", Some(&token), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let frames = drain_frames(&mut rx);
	assert_eq!(frames.len(), 2);
	assert_eq!(frames[0]["data"]["scene_id"], 1);
	assert_eq!(frames[0]["data"]["is_live"], false);
	assert_eq!(frames[1]["data"]["scene_id"], 2);
	assert_eq!(frames[1]["data"]["is_live"], true);

	let project = ProjectName::new("news");
	let channel = ChannelId::default();
	let scenes = state.live.get_all_live_scenes(&project, &channel);
	assert_eq!(scenes.get(&SceneId::new(1)), Some(&false));
	assert_eq!(scenes.get(&SceneId::new(2)), Some(&true));
}

#[tokio::test]
async fn push_then_out_leaves_channel_dark() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(ALICE);

	app.clone().oneshot(post_json("/api/scenes/1/push", Some(&token), &json!({}))).await.unwrap();
	let response = app.oneshot(post_json("/api/scenes/1/out", Some(&token), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let scenes = state.live.get_all_live_scenes(&ProjectName::new("news"), &ChannelId::default());
	let live_count = scenes.values().filter(|is_live| **is_live).count();
	assert_eq!(live_count, 0);
}

#[tokio::test]
async fn text_override_merges_into_overlay_and_clear_restores_baseline() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(ALICE);

	let body = json!({"project_name": "news", "content": "World"});
	let response = app.clone().oneshot(post_json("/api/live/objects/42/text", Some(&token), &body)).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let response_body = body_json(response).await;
	assert_eq!(response_body["object_id"], 42);
	assert_eq!(response_body["content"], "World");

	// overlay read sees the override merged over the baseline
	let response = app.clone().oneshot(get_request("/overlay/scenes/1", None)).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let scene = body_json(response).await;
	let object = scene["objects"].as_array().unwrap().iter().find(|o| o["id"] == 42).unwrap();
	assert_eq!(object["properties"]["content"], "World");
	assert_eq!(object["properties"]["size"], 24);

	// clear drains the override; baseline comes back
	let response = app
		.clone()
		.oneshot(post_json("/api/live/projects/news/clear", Some(&token), &json!({})))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let response = app.oneshot(get_request("/overlay/scenes/1", None)).await.unwrap();
	let scene = body_json(response).await;
	let object = scene["objects"].as_array().unwrap().iter().find(|o| o["id"] == 42).unwrap();
	assert_eq!(object["properties"]["content"], "Hello");
}

#[tokio::test]
async fn image_and_shape_updates_emit_their_property() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(ALICE);

	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();

	let body = json!({"project_name": "news", "src": "/media/new.png", "channel_id": "main"});
	let response = app.clone().oneshot(post_json("/api/live/objects/43/image", Some(&token), &body)).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let body = json!({"project_name": "news", "color": "#ff0000", "channel_id": "main"});
	let response = app.oneshot(post_json("/api/live/objects/44/shape", Some(&token), &body)).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let frames = drain_frames(&mut rx);
	assert_eq!(frames.len(), 2);
	assert_eq!(frames[0]["event"], "object_live_update");
	assert_eq!(frames[0]["data"]["property"], "src");
	assert_eq!(frames[0]["data"]["value"], "/media/new.png");
	assert_eq!(frames[0]["data"]["channel_id"], "main");
	assert_eq!(frames[1]["data"]["property"], "color");
	assert_eq!(frames[1]["data"]["value"], "#ff0000");
}

#[tokio::test]
async fn repeated_text_updates_emit_twice_but_converge() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(ALICE);

	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();

	let body = json!({"project_name": "news", "content": "x"});
	app.clone().oneshot(post_json("/api/live/objects/42/text", Some(&token), &body)).await.unwrap();
	app.oneshot(post_json("/api/live/objects/42/text", Some(&token), &body)).await.unwrap();

	assert_eq!(drain_frames(&mut rx).len(), 2);

	let overrides = state.live.get_project_live_state(&ProjectName::new("news"), &ChannelId::default());
	let record = overrides.get(&live_state::ObjectId::new(42)).unwrap();
	assert_eq!(record.properties.get("content"), Some(&json!("x")));
	assert_eq!(record.properties.len(), 1);
}

#[tokio::test]
async fn channel_isolation_keeps_other_channel_dark() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(ALICE);

	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();

	let response = app
		.clone()
		.oneshot(post_json("/api/scenes/1/push", Some(&token), &json!({"channel_id": "main"})))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	// the raw event reaches the shared user room tagged with its channel
	let frames = drain_frames(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0]["data"]["channel_id"], "main");

	// the other channel's live view is untouched
	let response = app
		.clone()
		.oneshot(get_request("/api/live/projects/news/state?channel_id=stream2", Some(&token)))
		.await
		.unwrap();
	let body = body_json(response).await;
	assert_eq!(body["scene_states"], json!({}));

	let response = app.oneshot(get_request("/api/live/projects/news/state?channel_id=main", Some(&token))).await.unwrap();
	let body = body_json(response).await;
	assert_eq!(body["scene_states"]["1"], true);
}

#[tokio::test]
async fn permission_denied_mutates_nothing_and_emits_nothing() {
	let state = test_state().await;
	let app = app(&state);

	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();
	let (editor, mut editor_rx) = state.rooms.register(Some(ALICE));
	state.rooms.join(&editor, Room::project("news")).unwrap();

	let response = app.oneshot(post_json("/api/scenes/1/push", Some(&token_for(BOB)), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::FORBIDDEN);

	let body = body_json(response).await;
	assert_eq!(body["error"], "unauthorized");

	assert!(drain_frames(&mut rx).is_empty());
	assert!(drain_frames(&mut editor_rx).is_empty());
	assert!(state.live.get_all_live_scenes(&ProjectName::new("news"), &ChannelId::default()).is_empty());
}

#[tokio::test]
async fn viewer_may_read_but_not_mutate() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(CAROL);

	let response = app.clone().oneshot(get_request("/api/live/projects/news/state", Some(&token))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let response = app.oneshot(post_json("/api/scenes/1/push", Some(&token), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn grant_holders_receive_fanout_in_their_user_room() {
	let state = test_state().await;
	let app = app(&state);

	let (carol_overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&carol_overlay, Room::user(CAROL)).unwrap();

	let response = app.oneshot(post_json("/api/scenes/1/push", Some(&token_for(ALICE)), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let frames = drain_frames(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0]["data"]["scene_id"], 1);
}

#[tokio::test]
async fn events_do_not_leak_across_projects() {
	let state = test_state().await;
	let app = app(&state);

	// session watching only bob's project rooms
	let (session, mut rx) = state.rooms.register(None);
	state.rooms.join(&session, Room::project("sports")).unwrap();
	state.rooms.join(&session, Room::user(BOB)).unwrap();

	let response = app.oneshot(post_json("/api/scenes/1/push", Some(&token_for(ALICE)), &json!({}))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	assert!(drain_frames(&mut rx).is_empty());
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
	let state = test_state().await;
	let app = app(&state);

	let response = app.oneshot(post_json("/api/scenes/1/push", None, &json!({}))).await.unwrap();

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	let body = body_json(response).await;
	assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn unknown_scene_is_not_found() {
	let state = test_state().await;
	let app = app(&state);

	let response = app.oneshot(post_json("/api/scenes/999/push", Some(&token_for(ALICE)), &json!({}))).await.unwrap();

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	let body = body_json(response).await;
	assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn wrong_object_type_is_rejected_without_side_effects() {
	let state = test_state().await;
	let app = app(&state);

	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();

	// text command aimed at the image object
	let body = json!({"project_name": "news", "content": "nope"});
	let response = app.oneshot(post_json("/api/live/objects/43/text", Some(&token_for(ALICE)), &body)).await.unwrap();

	assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
	assert!(drain_frames(&mut rx).is_empty());
	assert!(state.live.get_project_live_state(&ProjectName::new("news"), &ChannelId::default()).is_empty());
}

#[tokio::test]
async fn mismatched_project_name_is_rejected() {
	let state = test_state().await;
	let app = app(&state);

	let body = json!({"project_name": "sports", "content": "nope"});
	let response = app.oneshot(post_json("/api/live/objects/42/text", Some(&token_for(ALICE)), &body)).await.unwrap();

	assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn clear_with_channel_only_drops_that_channel() {
	let state = test_state().await;
	let app = app(&state);
	let token = token_for(ALICE);

	app
		.clone()
		.oneshot(post_json("/api/scenes/1/push", Some(&token), &json!({"channel_id": "main"})))
		.await
		.unwrap();
	app
		.clone()
		.oneshot(post_json("/api/scenes/2/push", Some(&token), &json!({"channel_id": "stream2"})))
		.await
		.unwrap();

	let response = app
		.clone()
		.oneshot(post_json("/api/live/projects/news/clear", Some(&token), &json!({"channel_id": "main"})))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let project = ProjectName::new("news");
	assert!(state.live.get_all_live_scenes(&project, &ChannelId::new("main")).is_empty());
	assert!(!state.live.get_all_live_scenes(&project, &ChannelId::new("stream2")).is_empty());
}

#[tokio::test]
async fn clear_emits_cleared_event() {
	let state = test_state().await;
	let app = app(&state);

	let (overlay, mut rx) = state.rooms.register(None);
	state.rooms.join(&overlay, Room::user(ALICE)).unwrap();

	let response = app
		.oneshot(post_json("/api/live/projects/news/clear", Some(&token_for(ALICE)), &json!({})))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let frames = drain_frames(&mut rx);
	assert_eq!(frames.len(), 1);
	assert_eq!(frames[0]["event"], "live_state_cleared");
	assert_eq!(frames[0]["data"]["project_name"], "news");
}

#[tokio::test]
async fn overlay_scene_requires_no_auth() {
	let state = test_state().await;
	let app = app(&state);

	let response = app.oneshot(get_request("/overlay/scenes/1", None)).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let scene = body_json(response).await;
	assert_eq!(scene["id"], 1);
	assert_eq!(scene["project_name"], "news");
	assert_eq!(scene["channel_id"], "default");

	// objects come back in display order
	let ids: Vec<i64> = scene["objects"].as_array().unwrap().iter().map(|o| o["id"].as_i64().unwrap()).collect();
	assert_eq!(ids, vec![42, 43, 44, 7]);
}

#[tokio::test]
async fn health_reports_ok() {
	let state = test_state().await;
	let app = app(&state);

	let response = app.oneshot(get_request("/api/health", None)).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let body = body_json(response).await;
	assert_eq!(body["status"], "ok");
}
