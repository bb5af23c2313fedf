//! # shelf-client: Client Runtime for Shelf
//!
//! Wires the pure domain logic of `shelf-core` to the outside world: the
//! marketplace's GraphQL endpoint, the SQLite offline store and the shared
//! state container the page controllers dispatch into.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ShelfClient                                   │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ Catalog-       │  │ Detail-        │  │ CartController         │    │
//! │  │ Controller     │  │ Controller     │  │                        │    │
//! │  │ allBooks,      │  │ getBookById,   │  │ hydrate, quantities,   │    │
//! │  │ categories     │  │ addComment     │  │ remove, clear          │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          │ dispatch          │ dispatch              │ dispatch         │
//! │          ▼                   ▼                       ▼                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              StateContainer (ClientState + reducer)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │          │ mirror                                                       │
//! │          ▼                                                              │
//! │  ┌────────────────┐     ┌────────────────┐     ┌──────────────────┐    │
//! │  │ OfflineWriter  │────►│ OfflineStore   │────►│ SQLite           │    │
//! │  │ bounded queue  │     │ (trait)        │     │ offline_records  │    │
//! │  └────────────────┘     └────────────────┘     └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Book list loading with the dispatch guard
//! - [`detail`] - Book page, add-to-cart and comments
//! - [`cart`] - Cart hydration and edits
//! - [`store`] - The state container
//! - [`persist`] - Offline store trait and the background write queue
//! - [`graphql`] - Request/response envelope and the HTTP transport
//! - [`queries`] - Typed marketplace operations
//! - [`session`] - Login state
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Client error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_client::{ClientConfig, ShelfClient};
//!
//! let client = ShelfClient::connect(ClientConfig::load_or_default(None)).await?;
//! client.cart().hydrate().await?;
//!
//! let view = client.catalog().load(&[]).await;
//! let change = client.detail("b1").add_to_cart().await?;
//!
//! client.shutdown().await?;
//! ```

pub mod cart;
pub mod catalog;
pub mod config;
pub mod detail;
pub mod error;
pub mod graphql;
pub mod persist;
pub mod queries;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use cart::CartController;
pub use catalog::CatalogController;
pub use config::{ApiSettings, ClientConfig, PersistSettings, StorageSettings};
pub use detail::DetailController;
pub use error::{ClientError, ClientResult};
pub use graphql::{GraphqlRequest, GraphqlTransport, HttpTransport};
pub use persist::{OfflineStore, OfflineWriter, OfflineWriterHandle, WriteOp, WriteReport, WriteStats};
pub use queries::BookApi;
pub use session::Session;
pub use store::StateContainer;

use std::sync::Arc;
use tracing::info;

use shelf_db::{Database, DbConfig};

// =============================================================================
// Client Facade
// =============================================================================

/// One client session: shared state, one write queue, one API.
pub struct ShelfClient {
    config: ClientConfig,
    api: BookApi,
    state: StateContainer,
    session: Session,
    writer: OfflineWriterHandle,
    offline: Arc<dyn OfflineStore>,
    catalog: Arc<CatalogController>,
    database: Option<Database>,
}

impl ShelfClient {
    /// Opens the offline database and starts the write queue.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let session = Session::with_token(config.api.token.clone());
        let transport = Arc::new(HttpTransport::from_config(&config, session.clone())?);

        let path = config.database_path().ok_or_else(|| {
            ClientError::InvalidConfig("no database path and no platform data directory".into())
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let database = Database::new(DbConfig::new(&path)).await?;
        if !database.health_check().await {
            database.close().await;
            return Err(ClientError::Database(format!(
                "offline store at {} is not usable",
                path.display()
            )));
        }
        let offline: Arc<dyn OfflineStore> = Arc::new(database.offline_records());
        info!(endpoint = %config.api.endpoint, db = %path.display(), "Shelf client connected");

        let mut client = Self::with_parts(config, transport, offline, session);
        client.database = Some(database);
        Ok(client)
    }

    /// Builds a client from explicit parts, without opening a database.
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn GraphqlTransport>,
        offline: Arc<dyn OfflineStore>,
        session: Session,
    ) -> Self {
        let api = BookApi::new(transport);
        let state = StateContainer::new();
        let writer = OfflineWriter::spawn(offline.clone(), config.persist.clone());
        let catalog = Arc::new(CatalogController::new(
            api.clone(),
            state.clone(),
            writer.clone(),
            offline.clone(),
        ));

        ShelfClient {
            config,
            api,
            state,
            session,
            writer,
            offline,
            catalog,
            database: None,
        }
    }

    pub fn catalog(&self) -> Arc<CatalogController> {
        self.catalog.clone()
    }

    pub fn cart(&self) -> CartController {
        CartController::new(self.state.clone(), self.writer.clone(), self.offline.clone())
    }

    pub fn detail(&self, book_id: impl Into<String>) -> DetailController {
        DetailController::new(
            self.api.clone(),
            self.state.clone(),
            self.writer.clone(),
            self.session.clone(),
            book_id,
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &StateContainer {
        &self.state
    }

    pub fn writer(&self) -> &OfflineWriterHandle {
        &self.writer
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Cancels catalog fetches, drains the write queue and closes the
    /// database.
    pub async fn shutdown(&self) -> ClientResult<()> {
        self.catalog.teardown();
        let drained = self.writer.shutdown().await;
        if let Some(database) = &self.database {
            database.close().await;
        }

        let stats = self.writer.stats();
        info!(
            completed = stats.completed,
            failed = stats.failed,
            "Shelf client shut down"
        );
        drained
    }
}
