use url::Url;

use super::config::Config;
use super::database::{Database, DatabaseSetupError};
use super::ipfs::IpfsClient;

use common::lifecycle::TestStore;

/// The orchestrator over the daemon's concrete collaborators: the Kubo node
/// for content and naming, SQLite for the index
pub type Store = TestStore<IpfsClient, IpfsClient, Database>;

/// Main service state - orchestrates all components
#[derive(Clone)]
pub struct State {
    database: Database,
    ipfs: IpfsClient,
    store: Store,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => Url::parse(&format!("sqlite://{}", path.display()))
                .map_err(|_| StateSetupError::InvalidDatabaseUrl),
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup the Kubo RPC client
        let ipfs = IpfsClient::new(config.ipfs_api_url.clone());
        tracing::info!("Kubo RPC URL: {}", config.ipfs_api_url);

        // 3. Wire the orchestrator to its collaborators
        let store = TestStore::new(ipfs.clone(), ipfs.clone(), database.clone());

        Ok(Self {
            database,
            ipfs,
            store,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn ipfs(&self) -> &IpfsClient {
        &self.ipfs
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        &self.database
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
}
