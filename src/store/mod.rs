//! Persistent pan-genome store.
//!
//! Strains, genes, clusters, representatives and annotations live in a single SQLite
//! database. Every pipeline stage receives an explicit [`PangenomeStore`] handle; there
//! is no global connection.
//!
//! ## Tables
//!
//! | Table             | Contents |
//! |-------------------|----------|
//! | `Tags`            | schema version and creation time |
//! | `Strains`         | strain names in ingestion order |
//! | `Genes`           | gene sequences, their strain and their leaf cluster |
//! | `Clusters`        | leaf and parent clusters; leaves point to their parent |
//! | `Representatives` | one gene per cluster |
//! | `Annotations`     | at most one accepted hit per cluster and tier |
//!
//! ## Example
//!
//! ```rust
//! use pancluster::store::PangenomeStore;
//! use pancluster::core::NewGene;
//!
//! let mut store = PangenomeStore::open_in_memory().unwrap();
//! let strain = store.add_strain("strain1").unwrap();
//! store.add_genes(strain, &[NewGene::new("strain1_00001", "MKV")]).unwrap();
//! assert_eq!(store.gene_count().unwrap(), 1);
//! ```

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::error::PangenomeError;

mod annotations;
mod clusters;
mod genes;

pub use clusters::{LeafClusterData, ParentClusterData};

/// A connection to a pan-genome database
#[derive(Debug)]
pub struct PangenomeStore {
    connection: Connection,
}

/// Opening and creating the database.
impl PangenomeStore {
    /// Current database schema version.
    pub const VERSION: &'static str = "pancluster-db v1";

    // Key for database version.
    const KEY_VERSION: &'static str = "version";

    // Key for creation timestamp.
    const KEY_CREATED_AT: &'static str = "created_at";

    /// Creates a new database file with an empty schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the file already exists. Passes through any database errors.
    pub fn create<P: AsRef<Path>>(filename: P) -> Result<Self, PangenomeError> {
        let filename = filename.as_ref();
        if filename.exists() {
            return Err(PangenomeError::configuration(format!(
                "Database {} already exists",
                filename.display()
            )));
        }
        info!("Creating database {}", filename.display());
        let mut connection = Connection::open(filename)?;
        Self::initialize(&mut connection)?;
        Ok(Self { connection })
    }

    /// Opens an existing database for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema version does not match. Passes through any
    /// database errors.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, PangenomeError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(filename.as_ref(), flags)?;
        connection.execute_batch("PRAGMA foreign_keys = ON")?;

        let version: Option<String> = connection
            .query_row(
                "SELECT value FROM Tags WHERE key = ?1",
                [Self::KEY_VERSION],
                |row| row.get(0),
            )
            .optional()?;
        let version = version.unwrap_or_default();
        if version != Self::VERSION {
            return Err(PangenomeError::SchemaVersion {
                found: version,
                expected: Self::VERSION.to_string(),
            });
        }

        debug!("Opened database {}", filename.as_ref().display());
        Ok(Self { connection })
    }

    /// Opens a fresh database that lives in memory only.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn open_in_memory() -> Result<Self, PangenomeError> {
        let mut connection = Connection::open_in_memory()?;
        Self::initialize(&mut connection)?;
        Ok(Self { connection })
    }

    /// Opens the database if it exists, creates it otherwise.
    ///
    /// # Errors
    ///
    /// See [`Self::open`] and [`Self::create`].
    pub fn open_or_create<P: AsRef<Path>>(filename: P) -> Result<Self, PangenomeError> {
        if filename.as_ref().exists() {
            Self::open(filename)
        } else {
            Self::create(filename)
        }
    }

    fn initialize(connection: &mut Connection) -> rusqlite::Result<()> {
        connection.execute_batch(
            "PRAGMA foreign_keys = ON;
            CREATE TABLE Tags (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            ) STRICT;
            CREATE TABLE Strains (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            ) STRICT;
            CREATE TABLE Clusters (
                id INTEGER PRIMARY KEY,
                cutoff INTEGER NOT NULL,
                is_parent_cluster INTEGER NOT NULL,
                number_of_members INTEGER NOT NULL,
                number_of_strains INTEGER NOT NULL,
                parent_id INTEGER REFERENCES Clusters(id)
            ) STRICT;
            CREATE TABLE Genes (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                strain_id INTEGER NOT NULL REFERENCES Strains(id),
                sequence TEXT NOT NULL,
                sequence_md5 TEXT NOT NULL,
                description TEXT,
                cluster_id INTEGER REFERENCES Clusters(id)
            ) STRICT;
            CREATE INDEX GenesBySequence ON Genes(sequence_md5);
            CREATE INDEX GenesByCluster ON Genes(cluster_id);
            CREATE INDEX ClustersByParent ON Clusters(parent_id);
            CREATE TABLE Representatives (
                cluster_id INTEGER PRIMARY KEY REFERENCES Clusters(id),
                gene_id INTEGER NOT NULL REFERENCES Genes(id)
            ) STRICT;
            CREATE TABLE Annotations (
                id INTEGER PRIMARY KEY,
                cluster_id INTEGER NOT NULL REFERENCES Clusters(id),
                tier TEXT NOT NULL,
                description TEXT NOT NULL,
                hit_id TEXT NOT NULL,
                percent_identity REAL NOT NULL,
                hit_length INTEGER NOT NULL,
                UNIQUE (cluster_id, tier)
            ) STRICT;",
        )?;

        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare("INSERT INTO Tags(key, value) VALUES (?1, ?2)")?;
            insert.execute((Self::KEY_VERSION, Self::VERSION))?;
            insert.execute((Self::KEY_CREATED_AT, chrono::Utc::now().to_rfc3339()))?;
        }
        transaction.commit()
    }

    /// Returns the filename of the database, or `None` for in-memory databases.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.connection.path().filter(|path| !path.is_empty())
    }

    /// Returns the creation timestamp recorded in the database.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn created_at(&self) -> Result<Option<String>, PangenomeError> {
        let value = self
            .connection
            .query_row(
                "SELECT value FROM Tags WHERE key = ?1",
                [Self::KEY_CREATED_AT],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}
