use async_trait::async_trait;
use canvas_service::{
    configuration::{
        get_configuration, CoordinatesMode, DocumentStoreSettings, VectorIndexSettings,
    },
    domain::entities::{artifact::GeneratedComponent, coordinates::Coordinates},
    ports::{
        component_generator::{ComponentGenerator, GenerationError},
        embedding_service::{EmbeddingError, EmbeddingService},
    },
    realtime::room_registry::RoomRegistry,
    startup::{Application, Collaborators},
};
use common::telemetry::{get_tracing_subscriber, init_tracing_subscriber};
use futures::{SinkExt, StreamExt};
use once_cell::sync::Lazy;
use serde_json::{json, Value as JsonValue};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

pub type RealtimeClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Ensures that the `tracing` stack is only initialized once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    // The sink is part of the type returned by `get_tracing_subscriber`, hence the two branches
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber =
            get_tracing_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_tracing_subscriber(subscriber);
    } else {
        let subscriber =
            get_tracing_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_tracing_subscriber(subscriber);
    };
});

/// Answers every prompt with the same two components, or fails when `batch` is `None`
pub struct FakeGenerator {
    batch: Option<Vec<JsonValue>>,
}

impl FakeGenerator {
    pub fn answering_a_title_and_a_metric() -> Self {
        Self {
            batch: Some(vec![
                json!({"type": "metric", "order": 2, "label": "Users", "value": 1200, "trend": "up"}),
                json!({"type": "text", "order": 1, "content": "Dashboard", "style": "h1"}),
            ]),
        }
    }

    pub fn failing() -> Self {
        Self { batch: None }
    }
}

#[async_trait]
impl ComponentGenerator for FakeGenerator {
    async fn generate_components(
        &self,
        _prompt: &str,
        _start_order: i64,
    ) -> Result<Vec<GeneratedComponent>, GenerationError> {
        match &self.batch {
            Some(batch) => Ok(GeneratedComponent::parse_batch(batch.clone())),
            None => Err(GenerationError::RequestFailed("model overloaded".into())),
        }
    }
}

/// Embeds every text to the same point, so every artifact of a room is similar to the others
pub struct SamePointEmbeddings;

#[async_trait]
impl EmbeddingService for SamePointEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Coordinates, EmbeddingError> {
        Ok(Coordinates::from_lossy(vec![
            0.9, 0.1, 0.5, 0.5, 0.3, 0.7, 0.2, 0.8, 0.4, 0.6,
        ]))
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub room_registry: Arc<RoomRegistry>,
}

/// A test API client / test suite
impl TestApp {
    pub async fn post_generate(&self, body: &JsonValue) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/generate", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_card(&self, body: &JsonValue) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/card", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_magnet(&self, body: &JsonValue) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/magnet", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_canvas(&self, room_id: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/canvas/{}", &self.address, room_id))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_similarities(&self, query: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/similarities{}", &self.address, query))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Creates a card and returns its id
    pub async fn create_card(&self, room_id: &str, text: &str) -> String {
        let response = self
            .post_card(&json!({"text": text, "roomId": room_id, "userId": "tester"}))
            .await;
        assert!(response.status().is_success());

        let body: JsonValue = response.json().await.expect("Invalid card response");
        body["card"]["id"]
            .as_str()
            .expect("Card without id")
            .to_string()
    }
}

impl TestApp {
    /// Opens a websocket and joins the room, returns once the server registered the session
    pub async fn join_room(&self, room_id: &str, user_id: &str) -> RealtimeClient {
        let (mut client, _) = connect_async(format!("ws://127.0.0.1:{}/ws", self.port))
            .await
            .expect("Failed to open the websocket.");
        let members = self.room_registry.member_count(room_id);

        send_event(
            &mut client,
            json!({"event": "join-room", "data": {"roomId": room_id, "userId": user_id}}),
        )
        .await;

        tokio::time::timeout(Duration::from_secs(2), async {
            while self.room_registry.member_count(room_id) == members {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("The session never joined the room.");

        client
    }
}

pub async fn send_event(client: &mut RealtimeClient, event: JsonValue) {
    send_frame(client, &event.to_string()).await;
}

pub async fn send_frame(client: &mut RealtimeClient, frame: &str) {
    client
        .send(Message::Text(frame.to_string()))
        .await
        .expect("Failed to send the frame.");
}

/// Next event pushed by the server, `None` if nothing arrives within `wait`
pub async fn next_event(client: &mut RealtimeClient, wait: Duration) -> Option<JsonValue> {
    tokio::time::timeout(wait, async {
        while let Some(message) = client.next().await {
            if let Message::Text(text) = message.expect("Websocket error.") {
                return Some(serde_json::from_str(&text).expect("Invalid event frame."));
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// A room id no other test uses
pub fn new_room_id() -> String {
    format!("room-{}", Uuid::new_v4())
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(FakeGenerator::answering_a_title_and_a_metric()).await
}

/// Launches the server as a background task, with in-memory stores and fake language model
///
/// When a tokio runtime is shut down all tasks spawned on it are dropped.
/// tokio::test spins up a new runtime for each test case, so nothing leaks between tests.
pub async fn spawn_app_with(generator: FakeGenerator) -> TestApp {
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // Port 0 makes the OS pick an available port
        c.application.port = 0;
        c.document_store = DocumentStoreSettings::InMemory;
        c.vector_index = VectorIndexSettings::InMemory;
        c.coordinates.mode = CoordinatesMode::Embedding;
        // Layouts must not move while tests assert on them
        c.gravity.enabled = false;
        c
    };

    let collaborators = Collaborators {
        component_generator: Arc::new(generator),
        embedding_service: Arc::new(SamePointEmbeddings),
    };

    let application = Application::build_with_collaborators(configuration, Some(1), collaborators)
        .await
        .expect("Failed to build application.");
    let application_port = application.port();
    let room_registry = application.room_registry();

    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        port: application_port,
        api_client: reqwest::Client::new(),
        room_registry,
    }
}
