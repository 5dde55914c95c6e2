use fake::{faker::lorem::en::Sentence, Fake};
use serde_json::{json, Value as JsonValue};

use crate::helpers::{new_room_id, spawn_app};

#[tokio::test]
async fn create_card_returns_the_stored_card() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let text: String = Sentence(3..8).fake();

    let response = app
        .post_card(&json!({"text": text, "roomId": room_id, "userId": "u1"}))
        .await;

    assert!(response.status().is_success());
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["card"]["type"], "text");
    assert_eq!(body["card"]["content"], text.as_str());
    assert_eq!(body["card"]["roomId"], room_id.as_str());
    assert_eq!(body["card"]["order"], 0);
    assert_eq!(body["card"]["coordinates"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn create_card_returns_400_for_invalid_payloads() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"text": "", "roomId": "r1"}), "empty text"),
        (json!({"text": "   ", "roomId": "r1"}), "blank text"),
        (json!({"text": "an idea"}), "missing roomId"),
    ];

    for (body, description) in test_cases {
        let response = app.post_card(&body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn concurrent_cards_get_distinct_orders() {
    let app = spawn_app().await;
    let room_id = new_room_id();

    let (a, b, c) = tokio::join!(
        app.create_card(&room_id, "first"),
        app.create_card(&room_id, "second"),
        app.create_card(&room_id, "third"),
    );
    assert!(a != b && b != c);

    let body: JsonValue = app.get_canvas(&room_id).await.json().await.unwrap();
    let mut orders: Vec<i64> = body["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["order"].as_i64().unwrap())
        .collect();
    orders.sort();
    assert_eq!(orders, vec![0, 1, 2]);
}
