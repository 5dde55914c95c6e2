use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::warn;
use uuid::Uuid;

use super::coordinates::Coordinates;

/// A generated or user-submitted UI element of a room.
///
/// `id`, `room_id`, `order` and the component type never change once created.
/// Only the canvas position (`x`, `y`) is mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub room_id: String,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(flatten)]
    pub component: Component,
}

/// Type-specific payload, tagged by the `type` field.
///
/// Only the tag is checked, the payload is carried through as received.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Text(Payload),
    Metric(Payload),
    Card(Payload),
    List(Payload),
    Chart(Payload),
}

/// Fields of a component besides its type, kept untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Payload(Map<String, JsonValue>);

/// Artifact fields the service owns, never taken from a component payload
const RESERVED_FIELDS: [&str; 8] = ["id", "roomId", "order", "x", "y", "w", "h", "coordinates"];

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// The field rendered as text, if it is a string or a number
    fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(as_text)
    }

    fn strip_reserved_fields(&mut self) {
        self.0
            .retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
    }
}

fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Accepts a number or a numeric string, anything else is ignored
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::Number(number)) => number.as_f64(),
        Some(JsonValue::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// A component as proposed by the generation collaborator, before it joins a room
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeneratedComponent {
    /// Order suggested by the model, only used to sort the batch
    #[serde(default, deserialize_with = "lenient_number")]
    pub order: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub w: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub h: Option<f64>,
    #[serde(flatten)]
    pub component: Component,
}

impl GeneratedComponent {
    /// Parses the raw components of a generated batch.
    ///
    /// Components without a `type`, or with an unknown one, are skipped,
    /// the rest of the batch is kept.
    pub fn parse_batch(values: Vec<JsonValue>) -> Vec<Self> {
        values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Self>(value.clone()) {
                Ok(component) => Some(component),
                Err(error) => {
                    warn!(%error, %value, "Skipping invalid generated component");
                    None
                }
            })
            .collect()
    }
}

impl Artifact {
    /// Creates a new artifact with a fresh, globally unique id
    pub fn new(
        room_id: &str,
        order: i64,
        generated: GeneratedComponent,
        coordinates: Coordinates,
    ) -> Self {
        let mut component = generated.component;
        component.payload_mut().strip_reserved_fields();

        Self {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            order,
            x: None,
            y: None,
            w: generated.w,
            h: generated.h,
            coordinates,
            component,
        }
    }

    /// A card typed by a user
    pub fn new_text(room_id: &str, order: i64, content: &str, coordinates: Coordinates) -> Self {
        Self::new(
            room_id,
            order,
            GeneratedComponent {
                order: None,
                w: None,
                h: None,
                component: Component::text(content),
            },
            coordinates,
        )
    }

    /// Placeholder shown in the timeline when generation failed
    pub fn generation_failure(room_id: &str, order: i64, coordinates: Coordinates) -> Self {
        Self {
            x: Some(50.0),
            y: Some(50.0),
            w: Some(300.0),
            ..Self::new(
                room_id,
                order,
                GeneratedComponent {
                    order: None,
                    w: None,
                    h: None,
                    component: Component::Card(
                        Payload::new()
                            .with("title", "Architect Protocol Failure")
                            .with("content", "Unable to parse reality request."),
                    ),
                },
                coordinates,
            )
        }
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }

    /// First order available after the artifacts of a room, 0 for an empty room
    pub fn next_order(artifacts: &[Artifact]) -> i64 {
        artifacts
            .iter()
            .map(|artifact| artifact.order)
            .max()
            .map_or(0, |max_order| max_order + 1)
    }
}

impl Component {
    /// A body text, as typed by a user
    pub fn text(content: &str) -> Self {
        Component::Text(
            Payload::new()
                .with("content", content)
                .with("style", "body"),
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Component::Text(_) => "text",
            Component::Metric(_) => "metric",
            Component::Card(_) => "card",
            Component::List(_) => "list",
            Component::Chart(_) => "chart",
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Component::Text(payload)
            | Component::Metric(payload)
            | Component::Card(payload)
            | Component::List(payload)
            | Component::Chart(payload) => payload,
        }
    }

    fn payload_mut(&mut self) -> &mut Payload {
        match self {
            Component::Text(payload)
            | Component::Metric(payload)
            | Component::Card(payload)
            | Component::List(payload)
            | Component::Chart(payload) => payload,
        }
    }

    /// Human readable text of the component, what gets embedded.
    ///
    /// Missing or oddly typed fields are left out.
    pub fn semantic_text(&self) -> String {
        let payload = self.payload();
        let labels = |key: &str| -> Vec<String> {
            match payload.get(key) {
                Some(JsonValue::Array(values)) => values
                    .iter()
                    .filter_map(|value| match value {
                        JsonValue::Object(point) => point.get("label").and_then(as_text),
                        other => as_text(other),
                    })
                    .collect(),
                _ => vec![],
            }
        };

        let parts: Vec<String> = match self {
            Component::Text(_) => payload.text("content").into_iter().collect(),
            Component::Metric(_) => payload
                .text("label")
                .into_iter()
                .chain(payload.text("value"))
                .collect(),
            Component::Card(_) => payload
                .text("title")
                .into_iter()
                .chain(payload.text("content"))
                .collect(),
            Component::List(_) => payload
                .text("title")
                .into_iter()
                .chain(labels("items"))
                .collect(),
            Component::Chart(_) => payload
                .text("title")
                .into_iter()
                .chain(labels("data"))
                .collect(),
        };

        parts.join(". ")
    }
}
