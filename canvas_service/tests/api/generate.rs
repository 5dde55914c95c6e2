use serde_json::{json, Value as JsonValue};

use crate::helpers::{new_room_id, spawn_app, spawn_app_with, FakeGenerator};

#[tokio::test]
async fn generate_returns_400_without_a_room_id() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"prompt": "a dashboard"}), "missing roomId"),
        (json!({"prompt": "a dashboard", "roomId": "  "}), "blank roomId"),
    ];

    for (body, description) in test_cases {
        let response = app.post_generate(&body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(body["error"], "roomId is required");
    }
}

#[tokio::test]
async fn generate_numbers_the_batch_by_suggested_order() {
    let app = spawn_app().await;
    let room_id = new_room_id();

    let response = app
        .post_generate(&json!({"prompt": "a dashboard", "roomId": room_id}))
        .await;

    assert!(response.status().is_success());
    let body: JsonValue = response.json().await.unwrap();
    let components = body["components"].as_array().unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(components[0]["type"], "text");
    assert_eq!(components[0]["order"], 0);
    assert_eq!(components[1]["type"], "metric");
    assert_eq!(components[1]["order"], 1);
    assert!(components.iter().all(|component| component["roomId"] == room_id.as_str()));
}

#[tokio::test]
async fn a_second_generation_is_appended_to_the_timeline() {
    let app = spawn_app().await;
    let room_id = new_room_id();
    let body = json!({"prompt": "a dashboard", "roomId": room_id});

    app.post_generate(&body).await;
    let response = app.post_generate(&body).await;

    let body: JsonValue = response.json().await.unwrap();
    let orders: Vec<i64> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|component| component["order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn a_failed_generation_adds_a_failure_card() {
    let app = spawn_app_with(FakeGenerator::failing()).await;
    let room_id = new_room_id();

    let response = app
        .post_generate(&json!({"prompt": "a dashboard", "roomId": room_id}))
        .await;

    assert!(response.status().is_success());
    let body: JsonValue = response.json().await.unwrap();
    let components = body["components"].as_array().unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0]["type"], "card");
    assert_eq!(components[0]["title"], "Architect Protocol Failure");
}

#[tokio::test]
async fn rooms_do_not_share_their_timeline() {
    let app = spawn_app().await;
    let room_a = new_room_id();
    let room_b = new_room_id();

    app.post_generate(&json!({"prompt": "a dashboard", "roomId": room_a}))
        .await;
    let response = app
        .post_generate(&json!({"prompt": "a dashboard", "roomId": room_b}))
        .await;

    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["components"].as_array().unwrap().len(), 2);
}
