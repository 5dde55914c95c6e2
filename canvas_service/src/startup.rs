use std::{net::TcpListener, sync::Arc, time::Duration};

use actix_web::{
    dev::Server,
    web::{self, Data},
    App, HttpServer,
};
use qdrant_client::prelude::{QdrantClient, QdrantClientConfig};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use tracing_actix_web::TracingLogger;

use crate::{
    adapters::anthropic_client::AnthropicClient,
    configuration::{
        DatabaseSettings, DocumentStoreSettings, QdrantSettings, Settings, VectorIndexSettings,
    },
    domain::{
        services::{coordinates_assigner::CoordinatesAssigner, room_sequencer::RoomSequencer},
        use_cases::{
            compute_similarities::ComputeSimilaritiesUseCase, create_card::CreateCardUseCase,
            generate_components::GenerateComponentsUseCase, load_canvas::LoadCanvasUseCase,
            relax_room::RelaxRoomUseCase, search_magnet::SearchMagnetUseCase,
        },
    },
    ports::{
        artifact_repository::ArtifactRepository, component_generator::ComponentGenerator,
        embedding_service::EmbeddingService,
        vector_index::{VectorIndex, VectorIndexError},
    },
    realtime::{room_registry::RoomRegistry, session::RealtimeContext},
    repositories::{
        artifact_in_memory_repository::ArtifactInMemoryRepository,
        artifact_point_qdrant_repository::ArtifactPointQdrantRepository,
        artifact_postgres_repository::ArtifactPostgresRepository,
        artifact_vector_in_memory_index::ArtifactVectorInMemoryIndex,
    },
    routes::{canvas, create_card, generate, health_check, magnet, realtime_ws, similarities},
};

/// Prefix of the in-memory index name, the schema version is appended to it
const IN_MEMORY_INDEX_PREFIX: &str = "artifacts";

/// The language model collaborators the service relies on
pub struct Collaborators {
    pub component_generator: Arc<dyn ComponentGenerator>,
    pub embedding_service: Arc<dyn EmbeddingService>,
}

/// Holds the newly built server, and some useful properties
pub struct Application {
    server: Server,
    port: u16,
    // Used for integration tests
    room_registry: Arc<RoomRegistry>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApplicationBuildError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("Error from Qdrant: {0}")]
    QdrantError(String),
    #[error(transparent)]
    VectorIndexError(#[from] VectorIndexError),
    #[error("Failed to build the Anthropic client: {0}")]
    AnthropicClientError(#[from] reqwest::Error),
}

impl Application {
    /// Builds the application with the Anthropic API as language model
    ///
    /// # Parameters
    /// - nb_workers: number of actix-web workers
    ///   if `None`, the number of available physical CPUs is used as the worker count.
    #[tracing::instrument(name = "Building application", skip(settings))]
    pub async fn build(
        settings: Settings,
        nb_workers: Option<usize>,
    ) -> Result<Self, ApplicationBuildError> {
        let anthropic_client = Arc::new(AnthropicClient::try_new(&settings.anthropic)?);

        let collaborators = Collaborators {
            component_generator: anthropic_client.clone(),
            embedding_service: anthropic_client,
        };

        Self::build_with_collaborators(settings, nb_workers, collaborators).await
    }

    /// Builds the application around the given language model collaborators
    #[tracing::instrument(name = "Building application with collaborators", skip(settings, collaborators))]
    pub async fn build_with_collaborators(
        settings: Settings,
        nb_workers: Option<usize>,
        collaborators: Collaborators,
    ) -> Result<Self, ApplicationBuildError> {
        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let artifact_repository = get_artifact_repository(&settings.document_store).await?;
        let vector_index = get_vector_index(&settings.vector_index).await?;
        let room_registry = Arc::new(RoomRegistry::new());

        let server = run(
            listener,
            settings,
            nb_workers,
            artifact_repository,
            vector_index,
            collaborators,
            room_registry.clone(),
        )?;

        Ok(Self {
            server,
            port,
            room_registry,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn room_registry(&self) -> Arc<RoomRegistry> {
        self.room_registry.clone()
    }

    /// This function only returns when the application is stopped
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        info!("Running server ...");
        self.server.await
    }
}

/// listener: the consumer binds their own port
///
/// TracingLogger middleware: helps collecting telemetry data.
/// It generates a unique identifier for each incoming request: `request_id`.
///
/// # Parameters
/// - nb_workers: number of actix-web workers
///   if `None`, the number of available physical CPUs is used as the worker count.
pub fn run(
    listener: TcpListener,
    settings: Settings,
    nb_workers: Option<usize>,
    artifact_repository: Arc<dyn ArtifactRepository>,
    vector_index: Arc<dyn VectorIndex>,
    collaborators: Collaborators,
    room_registry: Arc<RoomRegistry>,
) -> Result<Server, std::io::Error> {
    let coordinates_assigner = Arc::new(CoordinatesAssigner::new(
        settings.coordinates.mode,
        collaborators.embedding_service,
    ));
    // Shared by every use case creating artifacts, so orders stay unique per room
    let room_sequencer = Arc::new(RoomSequencer::new());

    // Use cases are shared among all workers
    let generate_components_use_case = Data::new(GenerateComponentsUseCase::new(
        artifact_repository.clone(),
        vector_index.clone(),
        collaborators.component_generator,
        coordinates_assigner.clone(),
        room_sequencer.clone(),
        room_registry.clone(),
    ));
    let create_card_use_case = Data::new(CreateCardUseCase::new(
        artifact_repository.clone(),
        vector_index.clone(),
        coordinates_assigner.clone(),
        room_sequencer,
        room_registry.clone(),
    ));
    let load_canvas_use_case = Data::new(LoadCanvasUseCase::new(artifact_repository.clone()));
    let compute_similarities_use_case = Data::new(ComputeSimilaritiesUseCase::new(
        artifact_repository.clone(),
        &settings.similarity,
    ));
    let search_magnet_use_case = Data::new(SearchMagnetUseCase::new(
        artifact_repository.clone(),
        vector_index,
        coordinates_assigner,
        &settings.similarity,
    ));

    let relax_room = settings.gravity.enabled.then(|| {
        Arc::new(RelaxRoomUseCase::new(
            artifact_repository.clone(),
            room_registry.clone(),
            &settings.similarity,
            &settings.gravity,
        ))
    });
    let realtime_context = Data::new(RealtimeContext {
        room_registry,
        artifact_repository,
        relax_room,
        gravity_interval: Duration::from_secs(settings.gravity.interval_secs),
    });

    // `move` to capture variables from the surrounding environment
    let server = HttpServer::new(move || {
        info!("Starting actix-web worker");

        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/generate", web::post().to(generate))
            .route("/canvas/{room_id}", web::get().to(canvas))
            .route("/similarities", web::get().to(similarities))
            .route("/magnet", web::post().to(magnet))
            .route("/card", web::post().to(create_card))
            .route("/ws", web::get().to(realtime_ws))
            .app_data(generate_components_use_case.clone())
            .app_data(create_card_use_case.clone())
            .app_data(load_canvas_use_case.clone())
            .app_data(compute_similarities_use_case.clone())
            .app_data(search_magnet_use_case.clone())
            .app_data(realtime_context.clone())
    })
    .listen(listener)?;

    // If no workers were set, use the actix-web settings (number of workers = number of physical CPUs)
    if let Some(nb_workers) = nb_workers {
        return Ok(server.workers(nb_workers).run());
    }

    // No await
    Ok(server.run())
}

#[tracing::instrument(name = "Setting up document store", skip(settings))]
async fn get_artifact_repository(
    settings: &DocumentStoreSettings,
) -> Result<Arc<dyn ArtifactRepository>, ApplicationBuildError> {
    match settings {
        DocumentStoreSettings::InMemory => {
            info!("Artifacts are kept in memory");
            Ok(Arc::new(ArtifactInMemoryRepository::new()))
        }
        DocumentStoreSettings::Postgres(database_settings) => {
            let repository = ArtifactPostgresRepository::new(get_connection_pool(database_settings));
            repository.migrate().await?;
            Ok(Arc::new(repository))
        }
    }
}

/// Creates the vector index if it does not exist yet
#[tracing::instrument(name = "Setting up vector index", skip(settings))]
async fn get_vector_index(
    settings: &VectorIndexSettings,
) -> Result<Arc<dyn VectorIndex>, ApplicationBuildError> {
    let vector_index: Arc<dyn VectorIndex> = match settings {
        VectorIndexSettings::InMemory => {
            Arc::new(ArtifactVectorInMemoryIndex::new(IN_MEMORY_INDEX_PREFIX))
        }
        VectorIndexSettings::Qdrant(qdrant_settings) => Arc::new(ArtifactPointQdrantRepository::new(
            get_qdrant_client(qdrant_settings)?,
            &qdrant_settings.collection_prefix,
        )),
    };

    vector_index.build().await?;
    Ok(vector_index)
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(settings.with_db())
}

pub fn get_qdrant_client(settings: &QdrantSettings) -> Result<QdrantClient, ApplicationBuildError> {
    let qdrant_config = QdrantClientConfig::from_url(&settings.get_grpc_base_url());
    QdrantClient::new(Some(qdrant_config))
        .map_err(|e| ApplicationBuildError::QdrantError(e.to_string()))
}
