use std::collections::BTreeSet;

use rusqlite::{OptionalExtension, Row, Transaction};
use tracing::info;

use crate::core::{Cluster, ClusterId, ClusterKind, Gene, GeneId, StrainId};
use crate::error::PangenomeError;
use crate::store::genes::gene_from_row;
use crate::store::PangenomeStore;

const CLUSTER_COLUMNS: &str =
    "id, cutoff, is_parent_cluster, number_of_members, number_of_strains, parent_id";

// Genes of a cluster: its own genes for a leaf, the genes of its children for a parent.
const TRANSITIVE_GENES: &str =
    "cluster_id = ?1 OR cluster_id IN (SELECT id FROM Clusters WHERE parent_id = ?1)";

fn cluster_from_row(row: &Row) -> rusqlite::Result<Cluster> {
    let is_parent_cluster: bool = row.get(2)?;
    Ok(Cluster {
        id: ClusterId(row.get(0)?),
        cutoff: row.get(1)?,
        kind: ClusterKind::from_parent_flag(is_parent_cluster),
        number_of_members: row.get(3)?,
        number_of_strains: row.get(4)?,
        parent: row.get::<_, Option<i64>>(5)?.map(ClusterId),
    })
}

/// A leaf cluster ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafClusterData {
    pub genes: Vec<GeneId>,
    pub representative: Option<GeneId>,
}

/// A parent cluster ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentClusterData {
    pub children: Vec<ClusterId>,
    pub representative: Option<GeneId>,
}

/// Clusters and representatives.
impl PangenomeStore {
    /// Stores leaf clusters and links their genes, all in one transaction.
    ///
    /// Cluster ids are assigned in slice order. `number_of_members` is the gene count
    /// and `number_of_strains` is computed from the linked genes.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation, and stores nothing, if a gene does not exist or
    /// already belongs to a cluster, or if a representative is not a member.
    pub fn insert_leaf_clusters(
        &mut self,
        cutoff: u8,
        clusters: &[LeafClusterData],
    ) -> Result<Vec<ClusterId>, PangenomeError> {
        let transaction = self.connection.transaction()?;
        let mut ids = Vec::with_capacity(clusters.len());
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Clusters(
                    cutoff, is_parent_cluster, number_of_members, number_of_strains
                ) VALUES (?1, FALSE, ?2, 0)",
            )?;
            let mut link = transaction.prepare(
                "UPDATE Genes SET cluster_id = ?1 WHERE id = ?2 AND cluster_id IS NULL",
            )?;

            for cluster in clusters {
                if let Some(representative) = cluster.representative {
                    if !cluster.genes.contains(&representative) {
                        return Err(PangenomeError::invariant(format!(
                            "Representative gene {representative} is not a member of its cluster"
                        )));
                    }
                }

                insert.execute((cutoff, cluster.genes.len()))?;
                let id = ClusterId(transaction.last_insert_rowid());
                for gene in &cluster.genes {
                    if link.execute((id.0, gene.0))? != 1 {
                        return Err(PangenomeError::invariant(format!(
                            "Gene {gene} does not exist or already belongs to a cluster"
                        )));
                    }
                }
                update_strain_count(&transaction, id)?;
                if let Some(representative) = cluster.representative {
                    insert_representative(&transaction, id, representative)?;
                }
                ids.push(id);
            }
        }
        transaction.commit()?;

        info!("Inserted {} leaf clusters at cutoff {}", ids.len(), cutoff);
        Ok(ids)
    }

    /// Stores parent clusters and attaches their children, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation, and stores nothing, if a child is not a leaf
    /// cluster or already has a parent.
    pub fn insert_parent_clusters(
        &mut self,
        cutoff: u8,
        clusters: &[ParentClusterData],
    ) -> Result<Vec<ClusterId>, PangenomeError> {
        let transaction = self.connection.transaction()?;
        let mut ids = Vec::with_capacity(clusters.len());
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Clusters(
                    cutoff, is_parent_cluster, number_of_members, number_of_strains
                ) VALUES (?1, TRUE, ?2, 0)",
            )?;
            let mut attach = transaction.prepare(
                "UPDATE Clusters SET parent_id = ?1
                    WHERE id = ?2 AND is_parent_cluster = FALSE AND parent_id IS NULL",
            )?;

            for cluster in clusters {
                insert.execute((cutoff, cluster.children.len()))?;
                let id = ClusterId(transaction.last_insert_rowid());
                for child in &cluster.children {
                    if attach.execute((id.0, child.0))? != 1 {
                        return Err(PangenomeError::invariant(format!(
                            "Cluster {child} is not a leaf cluster or already has a parent"
                        )));
                    }
                }
                update_strain_count(&transaction, id)?;
                if let Some(representative) = cluster.representative {
                    insert_representative(&transaction, id, representative)?;
                }
                ids.push(id);
            }
        }
        transaction.commit()?;

        info!("Inserted {} parent clusters at cutoff {}", ids.len(), cutoff);
        Ok(ids)
    }

    /// Returns the number of clusters of the given kind, or of all kinds.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn cluster_count(&self, kind: Option<ClusterKind>) -> Result<usize, PangenomeError> {
        let count: i64 = match kind {
            Some(kind) => self.connection.query_row(
                "SELECT COUNT(*) FROM Clusters WHERE is_parent_cluster = ?1",
                [kind.is_parent()],
                |row| row.get(0),
            )?,
            None => self
                .connection
                .query_row("SELECT COUNT(*) FROM Clusters", [], |row| row.get(0))?,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Returns a cluster by id.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn cluster(&self, id: ClusterId) -> Result<Option<Cluster>, PangenomeError> {
        let sql = format!("SELECT {CLUSTER_COLUMNS} FROM Clusters WHERE id = ?1");
        let cluster = self
            .connection
            .query_row(&sql, [id.0], cluster_from_row)
            .optional()?;
        Ok(cluster)
    }

    /// Returns the clusters of the given kind, or of all kinds, in ascending id order.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn clusters(&self, kind: Option<ClusterKind>) -> Result<Vec<Cluster>, PangenomeError> {
        let clusters = match kind {
            Some(kind) => {
                let sql = format!(
                    "SELECT {CLUSTER_COLUMNS} FROM Clusters
                        WHERE is_parent_cluster = ?1 ORDER BY id"
                );
                let mut statement = self.connection.prepare(&sql)?;
                let rows = statement.query_map([kind.is_parent()], cluster_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!("SELECT {CLUSTER_COLUMNS} FROM Clusters ORDER BY id");
                let mut statement = self.connection.prepare(&sql)?;
                let rows = statement.query_map([], cluster_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(clusters)
    }

    /// Returns the child clusters of a parent in ascending id order.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn children(&self, parent: ClusterId) -> Result<Vec<ClusterId>, PangenomeError> {
        let mut statement = self
            .connection
            .prepare("SELECT id FROM Clusters WHERE parent_id = ?1 ORDER BY id")?;
        let children = statement
            .query_map([parent.0], |row| Ok(ClusterId(row.get(0)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(children)
    }

    /// Returns the genes of a cluster: its own for a leaf, the union of its children's
    /// for a parent.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn cluster_genes(&self, id: ClusterId) -> Result<Vec<Gene>, PangenomeError> {
        let sql = format!(
            "SELECT id, name, strain_id, sequence, description FROM Genes
                WHERE {TRANSITIVE_GENES} ORDER BY id"
        );
        let mut statement = self.connection.prepare(&sql)?;
        let genes = statement
            .query_map([id.0], gene_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genes)
    }

    /// Returns the distinct strains among the (transitive) genes of a cluster.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn cluster_strains(&self, id: ClusterId) -> Result<BTreeSet<StrainId>, PangenomeError> {
        let sql = format!("SELECT DISTINCT strain_id FROM Genes WHERE {TRANSITIVE_GENES}");
        let mut statement = self.connection.prepare(&sql)?;
        let strains = statement
            .query_map([id.0], |row| Ok(StrainId(row.get(0)?)))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(strains)
    }

    /// Returns the distinct (leaf cluster, strain) pairs.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn leaf_strain_pairs(&self) -> Result<Vec<(ClusterId, StrainId)>, PangenomeError> {
        let mut statement = self.connection.prepare(
            "SELECT DISTINCT Genes.cluster_id, Genes.strain_id FROM Genes
                JOIN Clusters ON Clusters.id = Genes.cluster_id
                WHERE Clusters.is_parent_cluster = FALSE
                ORDER BY Genes.cluster_id, Genes.strain_id",
        )?;
        let pairs = statement
            .query_map([], |row| {
                Ok((ClusterId(row.get(0)?), StrainId(row.get(1)?)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pairs)
    }

    /// Returns the leaf cluster a gene belongs to.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn gene_cluster(&self, gene: GeneId) -> Result<Option<ClusterId>, PangenomeError> {
        let cluster: Option<Option<i64>> = self
            .connection
            .query_row("SELECT cluster_id FROM Genes WHERE id = ?1", [gene.0], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(cluster.flatten().map(ClusterId))
    }

    /// Returns the representative gene of a cluster.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn representative(&self, cluster: ClusterId) -> Result<Option<Gene>, PangenomeError> {
        let gene = self
            .connection
            .query_row(
                "SELECT Genes.id, Genes.name, Genes.strain_id, Genes.sequence, Genes.description
                    FROM Representatives JOIN Genes ON Genes.id = Representatives.gene_id
                    WHERE Representatives.cluster_id = ?1",
                [cluster.0],
                gene_from_row,
            )
            .optional()?;
        Ok(gene)
    }

    /// Records the representative of a cluster that does not have one yet.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the cluster already has a representative.
    pub fn set_representative(
        &mut self,
        cluster: ClusterId,
        gene: GeneId,
    ) -> Result<(), PangenomeError> {
        let transaction = self.connection.transaction()?;
        insert_representative(&transaction, cluster, gene)?;
        transaction.commit()?;
        Ok(())
    }

    /// Returns the representatives of all clusters of the given kind, in ascending
    /// cluster id order. Clusters without a representative are skipped.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn representatives(
        &self,
        kind: ClusterKind,
    ) -> Result<Vec<(ClusterId, Gene)>, PangenomeError> {
        let mut statement = self.connection.prepare(
            "SELECT Representatives.cluster_id,
                    Genes.id, Genes.name, Genes.strain_id, Genes.sequence, Genes.description
                FROM Representatives
                JOIN Genes ON Genes.id = Representatives.gene_id
                JOIN Clusters ON Clusters.id = Representatives.cluster_id
                WHERE Clusters.is_parent_cluster = ?1
                ORDER BY Representatives.cluster_id",
        )?;
        let representatives = statement
            .query_map([kind.is_parent()], |row| {
                let gene = Gene {
                    id: GeneId(row.get(1)?),
                    name: row.get(2)?,
                    strain_id: StrainId(row.get(3)?),
                    sequence: row.get(4)?,
                    description: row.get(5)?,
                };
                Ok((ClusterId(row.get(0)?), gene))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(representatives)
    }
}

fn update_strain_count(transaction: &Transaction, cluster: ClusterId) -> rusqlite::Result<()> {
    let sql = format!(
        "UPDATE Clusters SET number_of_strains =
            (SELECT COUNT(DISTINCT strain_id) FROM Genes WHERE {TRANSITIVE_GENES})
            WHERE id = ?1"
    );
    transaction.execute(&sql, [cluster.0])?;
    Ok(())
}

fn insert_representative(
    transaction: &Transaction,
    cluster: ClusterId,
    gene: GeneId,
) -> Result<(), PangenomeError> {
    let existing: Option<i64> = transaction
        .query_row(
            "SELECT gene_id FROM Representatives WHERE cluster_id = ?1",
            [cluster.0],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(existing) = existing {
        return Err(PangenomeError::invariant(format!(
            "Cluster {cluster} already has representative gene {existing}"
        )));
    }
    transaction.execute(
        "INSERT INTO Representatives(cluster_id, gene_id) VALUES (?1, ?2)",
        (cluster.0, gene.0),
    )?;
    Ok(())
}
