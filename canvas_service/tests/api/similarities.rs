use serde_json::{json, Value as JsonValue};

use crate::helpers::{new_room_id, spawn_app};

#[tokio::test]
async fn similarities_returns_400_without_a_room_id() {
    let app = spawn_app().await;

    for query in ["", "?roomId="] {
        let response = app.get_similarities(query).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for the query `{}`.",
            query
        );
    }
}

#[tokio::test]
async fn a_room_with_a_single_card_has_no_pairs() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    app.create_card(&room_id, "alone").await;

    let response = app
        .get_similarities(&format!("?roomId={}", room_id))
        .await;

    assert!(response.status().is_success());
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn cards_embedded_to_the_same_point_form_a_pair() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let first = app.create_card(&room_id, "rust").await;
    let second = app.create_card(&room_id, "crab").await;

    let response = app
        .get_similarities(&format!("?roomId={}", room_id))
        .await;

    let body: JsonValue = response.json().await.unwrap();
    let pairs = body.as_array().unwrap();
    assert_eq!(pairs.len(), 1);
    let ids = [
        pairs[0]["cardA"].as_str().unwrap(),
        pairs[0]["cardB"].as_str().unwrap(),
    ];
    assert!(ids.contains(&first.as_str()));
    assert!(ids.contains(&second.as_str()));
    assert!(pairs[0]["score"].as_f64().unwrap() > 0.99);
}
