use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;

use crate::core::{Gene, GeneId, NewGene, Strain, StrainId};
use crate::error::PangenomeError;
use crate::store::PangenomeStore;
use crate::utils::validation::sequence_digest;

pub(super) const GENE_COLUMNS: &str = "id, name, strain_id, sequence, description";

pub(super) fn gene_from_row(row: &Row) -> rusqlite::Result<Gene> {
    Ok(Gene {
        id: GeneId(row.get(0)?),
        name: row.get(1)?,
        strain_id: StrainId(row.get(2)?),
        sequence: row.get(3)?,
        description: row.get(4)?,
    })
}

/// Strains and genes.
impl PangenomeStore {
    /// Adds a strain and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a strain with the same name exists.
    pub fn add_strain(&mut self, name: &str) -> Result<StrainId, PangenomeError> {
        insert_strain(&self.connection, name)
    }

    /// Adds a strain together with its genes in a single transaction.
    ///
    /// Either the strain and all of its genes are stored, or nothing is, so a failed
    /// ingest never leaves a strain without genes behind.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the strain or one of the gene names already
    /// exists. Passes through any database errors.
    pub fn add_strain_with_genes(
        &mut self,
        name: &str,
        genes: &[NewGene],
    ) -> Result<(StrainId, Vec<GeneId>), PangenomeError> {
        let transaction = self.connection.transaction()?;
        let strain = insert_strain(&transaction, name)?;
        let ids = insert_genes(&transaction, strain, genes)?;
        transaction.commit()?;

        info!("Inserted strain {name} with {} genes", ids.len());
        Ok((strain, ids))
    }

    /// Returns all strains in ingestion order.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn strains(&self) -> Result<Vec<Strain>, PangenomeError> {
        let mut statement = self
            .connection
            .prepare("SELECT id, name FROM Strains ORDER BY id")?;
        let strains = statement
            .query_map([], |row| {
                Ok(Strain {
                    id: StrainId(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(strains)
    }

    /// Looks up a strain by name.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn strain_by_name(&self, name: &str) -> Result<Option<Strain>, PangenomeError> {
        let strain = self
            .connection
            .query_row(
                "SELECT id, name FROM Strains WHERE name = ?1",
                [name],
                |row| {
                    Ok(Strain {
                        id: StrainId(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(strain)
    }

    /// Adds the genes of one strain in a single transaction and returns their ids.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a gene name is already taken, in which case
    /// none of the genes are stored. Passes through any database errors.
    pub fn add_genes(
        &mut self,
        strain: StrainId,
        genes: &[NewGene],
    ) -> Result<Vec<GeneId>, PangenomeError> {
        let transaction = self.connection.transaction()?;
        let ids = insert_genes(&transaction, strain, genes)?;
        transaction.commit()?;

        info!("Inserted {} genes for strain {}", ids.len(), strain);
        Ok(ids)
    }

    /// Returns the number of genes.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn gene_count(&self) -> Result<usize, PangenomeError> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM Genes", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Returns the genes whose sequence digest matches, in ascending id order.
    ///
    /// Digest equality is only a candidate filter; callers compare sequences.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn genes_with_digest(&self, digest: &str) -> Result<Vec<Gene>, PangenomeError> {
        let sql = format!("SELECT {GENE_COLUMNS} FROM Genes WHERE sequence_md5 = ?1 ORDER BY id");
        let mut statement = self.connection.prepare(&sql)?;
        let genes = statement
            .query_map([digest], gene_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genes)
    }

    /// Maps gene names to ids.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn gene_ids_by_name(&self) -> Result<HashMap<String, GeneId>, PangenomeError> {
        let mut statement = self.connection.prepare("SELECT name, id FROM Genes")?;
        let ids = statement
            .query_map([], |row| Ok((row.get(0)?, GeneId(row.get(1)?))))?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(ids)
    }

    /// Returns the number of genes not yet assigned to a leaf cluster.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn unclustered_gene_count(&self) -> Result<usize, PangenomeError> {
        let count: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM Genes WHERE cluster_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn insert_strain(connection: &Connection, name: &str) -> Result<StrainId, PangenomeError> {
    let exists = connection
        .prepare("SELECT 1 FROM Strains WHERE name = ?1")?
        .exists([name])?;
    if exists {
        return Err(PangenomeError::invariant(format!(
            "Strain '{name}' already exists"
        )));
    }
    connection.execute("INSERT INTO Strains(name) VALUES (?1)", [name])?;
    Ok(StrainId(connection.last_insert_rowid()))
}

/// Inserts genes inside a caller's transaction; the caller commits.
fn insert_genes(
    connection: &Connection,
    strain: StrainId,
    genes: &[NewGene],
) -> Result<Vec<GeneId>, PangenomeError> {
    let mut exists = connection.prepare("SELECT 1 FROM Genes WHERE name = ?1")?;
    let mut insert = connection.prepare(
        "INSERT INTO Genes(name, strain_id, sequence, sequence_md5, description)
            VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut ids = Vec::with_capacity(genes.len());
    for gene in genes {
        if exists.exists([&gene.name])? {
            return Err(PangenomeError::invariant(format!(
                "Gene '{}' already exists",
                gene.name
            )));
        }
        insert.execute((
            &gene.name,
            strain.0,
            &gene.sequence,
            sequence_digest(&gene.sequence),
            &gene.description,
        ))?;
        ids.push(GeneId(connection.last_insert_rowid()));
    }
    Ok(ids)
}
