use std::collections::{BTreeMap, HashSet};

use rusqlite::types::Type;
use rusqlite::Row;

use crate::core::annotation::best_annotation;
use crate::core::{Annotation, AnnotationTier, ClusterId};
use crate::error::PangenomeError;
use crate::store::PangenomeStore;

const ANNOTATION_COLUMNS: &str =
    "cluster_id, tier, description, hit_id, percent_identity, hit_length";

fn annotation_from_row(row: &Row) -> rusqlite::Result<Annotation> {
    let tier: String = row.get(1)?;
    let tier = AnnotationTier::parse(&tier)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(1, "tier".to_string(), Type::Text))?;
    Ok(Annotation {
        cluster_id: ClusterId(row.get(0)?),
        tier,
        description: row.get(2)?,
        hit_id: row.get(3)?,
        percent_identity: row.get(4)?,
        hit_length: row.get(5)?,
    })
}

/// Annotations.
impl PangenomeStore {
    /// Stores the annotations of one cluster resolution in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation, and stores nothing, if any (cluster, tier) pair
    /// is already annotated.
    pub fn insert_annotations(&mut self, annotations: &[Annotation]) -> Result<(), PangenomeError> {
        let transaction = self.connection.transaction()?;
        {
            let mut exists = transaction
                .prepare("SELECT 1 FROM Annotations WHERE cluster_id = ?1 AND tier = ?2")?;
            let mut insert = transaction.prepare(&format!(
                "INSERT INTO Annotations({ANNOTATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ))?;
            for annotation in annotations {
                let key = (annotation.cluster_id.0, annotation.tier.as_str());
                if exists.exists(key)? {
                    return Err(PangenomeError::invariant(format!(
                        "Cluster {} already has an annotation from {}",
                        annotation.cluster_id, annotation.tier
                    )));
                }
                insert.execute((
                    annotation.cluster_id.0,
                    annotation.tier.as_str(),
                    &annotation.description,
                    &annotation.hit_id,
                    annotation.percent_identity,
                    annotation.hit_length,
                ))?;
            }
        }
        transaction.commit()?;
        Ok(())
    }

    /// Returns the number of stored annotations.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn annotation_count(&self) -> Result<usize, PangenomeError> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM Annotations", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Returns the annotations of a cluster, highest precedence first.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn annotations(&self, cluster: ClusterId) -> Result<Vec<Annotation>, PangenomeError> {
        let sql = format!("SELECT {ANNOTATION_COLUMNS} FROM Annotations WHERE cluster_id = ?1");
        let mut statement = self.connection.prepare(&sql)?;
        let mut annotations = statement
            .query_map([cluster.0], annotation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        annotations.sort_by_key(|a| a.tier);
        Ok(annotations)
    }

    /// Returns the (cluster, tier) pairs that already have an annotation.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn annotated_tiers(&self) -> Result<HashSet<(ClusterId, AnnotationTier)>, PangenomeError> {
        let sql = format!("SELECT {ANNOTATION_COLUMNS} FROM Annotations");
        let mut statement = self.connection.prepare(&sql)?;
        let pairs = statement
            .query_map([], annotation_from_row)?
            .map(|annotation| annotation.map(|a| (a.cluster_id, a.tier)))
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(pairs)
    }

    /// Returns the highest-precedence annotation of every annotated cluster.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn best_annotations(&self) -> Result<BTreeMap<ClusterId, Annotation>, PangenomeError> {
        let sql = format!("SELECT {ANNOTATION_COLUMNS} FROM Annotations");
        let mut statement = self.connection.prepare(&sql)?;
        let mut by_cluster: BTreeMap<ClusterId, Vec<Annotation>> = BTreeMap::new();
        for annotation in statement.query_map([], annotation_from_row)? {
            let annotation = annotation?;
            by_cluster.entry(annotation.cluster_id).or_default().push(annotation);
        }

        Ok(by_cluster
            .into_iter()
            .filter_map(|(cluster, annotations)| {
                best_annotation(&annotations).map(|best| (cluster, best.clone()))
            })
            .collect())
    }
}
