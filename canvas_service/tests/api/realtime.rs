use std::time::Duration;

use serde_json::json;

use crate::helpers::{new_room_id, next_event, send_event, send_frame, spawn_app};

const EVENT_WAIT: Duration = Duration::from_secs(2);
const SILENCE_WAIT: Duration = Duration::from_millis(300);

#[tokio::test]
async fn a_card_move_reaches_the_other_members_of_the_room_only() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let card_id = app.create_card(&room_id, "Quiet forest cabin").await;
    let mut mover = app.join_room(&room_id, "u1").await;
    let mut peer = app.join_room(&room_id, "u2").await;
    let mut stranger = app.join_room(&new_room_id(), "u3").await;

    send_event(
        &mut mover,
        json!({"event": "card-move", "data": {"cardId": card_id, "x": 120.0, "y": 80.5}}),
    )
    .await;

    assert_eq!(
        next_event(&mut peer, EVENT_WAIT).await,
        Some(json!({"event": "card-move", "data": {"cardId": card_id, "x": 120.0, "y": 80.5}}))
    );
    assert_eq!(next_event(&mut mover, SILENCE_WAIT).await, None);
    assert_eq!(next_event(&mut stranger, SILENCE_WAIT).await, None);

    let body: serde_json::Value = app.get_canvas(&room_id).await.json().await.unwrap();
    assert_eq!(body["cards"][0]["x"], 120.0);
    assert_eq!(body["cards"][0]["y"], 80.5);
}

#[tokio::test]
async fn a_card_of_another_room_is_not_moved_over_the_websocket() {
    let app = spawn_app().await;
    let owner_room_id = new_room_id();
    let card_id = app.create_card(&owner_room_id, "Quiet forest cabin").await;
    let room_id = new_room_id();
    let mut mover = app.join_room(&room_id, "u1").await;
    let mut owner = app.join_room(&owner_room_id, "u2").await;

    send_event(
        &mut mover,
        json!({"event": "card-move", "data": {"cardId": card_id, "x": 999.0, "y": 999.0}}),
    )
    .await;

    assert_eq!(next_event(&mut owner, SILENCE_WAIT).await, None);
    let body: serde_json::Value = app.get_canvas(&owner_room_id).await.json().await.unwrap();
    assert_ne!(body["cards"][0]["x"], 999.0);
}

#[tokio::test]
async fn magnet_results_are_echoed_to_the_whole_room() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let mut sender = app.join_room(&room_id, "u1").await;
    let mut peer = app.join_room(&room_id, "u2").await;

    send_event(
        &mut sender,
        json!({"event": "magnet-applied", "data": {"roomId": room_id, "match": ["a"], "noMatch": ["b"]}}),
    )
    .await;

    let expected = Some(json!({"event": "magnet-applied", "data": {"match": ["a"], "noMatch": ["b"]}}));
    assert_eq!(next_event(&mut sender, EVENT_WAIT).await, expected);
    assert_eq!(next_event(&mut peer, EVENT_WAIT).await, expected);
}

#[tokio::test]
async fn malformed_frames_do_not_close_the_connection() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let mut sender = app.join_room(&room_id, "u1").await;
    let mut peer = app.join_room(&room_id, "u2").await;

    send_frame(&mut sender, "not json").await;
    send_frame(&mut sender, r#"{"event": "teleport", "data": {}}"#).await;
    send_event(
        &mut sender,
        json!({"event": "cursor-move", "data": {"x": 3.0, "y": 4.0}}),
    )
    .await;

    let event = next_event(&mut peer, EVENT_WAIT).await.unwrap();
    assert_eq!(event["event"], "cursor-move");
    assert_eq!(event["data"]["userId"], "u1");
}

#[tokio::test]
async fn closing_the_last_connection_closes_the_room() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let client = app.join_room(&room_id, "u1").await;

    drop(client);

    tokio::time::timeout(EVENT_WAIT, async {
        while app.room_registry.is_active(&room_id) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("The room outlived its last connection.");
}
