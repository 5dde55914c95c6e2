use serde_json::{json, Value as JsonValue};

use crate::helpers::{new_room_id, spawn_app};

#[tokio::test]
async fn an_unknown_room_has_an_empty_canvas() {
    let app = spawn_app().await;

    let response = app.get_canvas(&new_room_id()).await;

    assert!(response.status().is_success());
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["cards"], json!([]));
}

#[tokio::test]
async fn the_canvas_lists_the_room_artifacts_by_order() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    app.post_generate(&json!({"prompt": "a dashboard", "roomId": room_id}))
        .await;
    let card_id = app.create_card(&room_id, "an idea").await;

    let response = app.get_canvas(&room_id).await;

    let body: JsonValue = response.json().await.unwrap();
    let cards = body["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 3);
    assert_eq!(cards[2]["id"], card_id.as_str());
    assert_eq!(cards[2]["order"], 2);
    assert_eq!(cards[2]["content"], "an idea");
}
