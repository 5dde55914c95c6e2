use serde_json::{json, Value as JsonValue};

use crate::helpers::{new_room_id, spawn_app};

#[tokio::test]
async fn magnet_on_an_empty_room_matches_nothing() {
    let app = spawn_app().await;

    let response = app
        .post_magnet(&json!({"query": "finance", "roomId": new_room_id()}))
        .await;

    assert!(response.status().is_success());
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body, json!({"match": [], "noMatch": []}));
}

#[tokio::test]
async fn magnet_attracts_cards_close_to_the_query() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let first = app.create_card(&room_id, "budget").await;
    let second = app.create_card(&room_id, "revenue").await;

    let response = app
        .post_magnet(&json!({"query": "finance", "roomId": room_id}))
        .await;

    let body: JsonValue = response.json().await.unwrap();
    let matched: Vec<&str> = body["match"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(JsonValue::as_str)
        .collect();
    assert_eq!(matched.len(), 2);
    assert!(matched.contains(&first.as_str()));
    assert!(matched.contains(&second.as_str()));
    assert_eq!(body["noMatch"], json!([]));
}

#[tokio::test]
async fn magnet_returns_400_without_a_room_id() {
    let app = spawn_app().await;

    let response = app.post_magnet(&json!({"query": "finance"})).await;

    assert_eq!(400, response.status().as_u16());
}
