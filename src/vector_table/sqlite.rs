//! SQLite persistence for the vector table.
//!
//! A table is written to a temporary file next to the target and renamed
//! over it, so readers see either the old table or the new one. Embeddings
//! are stored as little-endian `f32` bytes and round-trip bit for bit.

use super::{Chunk, VectorTable};
use crate::error::{Result, VidragError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE chunks (
        position INTEGER PRIMARY KEY,
        chunk_id INTEGER NOT NULL UNIQUE,
        video_number TEXT NOT NULL,
        video_title TEXT NOT NULL,
        start_seconds REAL NOT NULL,
        end_seconds REAL NOT NULL,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// Descriptive metadata stored alongside the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    pub rows: usize,
    pub dimensions: usize,
    pub embedding_model: Option<String>,
    pub built_at: Option<DateTime<Utc>>,
}

impl VectorTable {
    /// Persist the table to `path`, replacing any existing table.
    #[instrument(skip(self), fields(rows = self.len()))]
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let tmp = NamedTempFile::new_in(parent)?;
        {
            let mut conn = Connection::open(tmp.path())?;
            conn.execute_batch(SCHEMA)?;

            let tx = conn.transaction()?;
            {
                let mut insert = tx.prepare(
                    r#"
                    INSERT INTO chunks
                    (position, chunk_id, video_number, video_title, start_seconds, end_seconds, text, embedding)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )?;

                for (position, chunk) in self.rows.iter().enumerate() {
                    insert.execute(params![
                        to_sql_int(position as u64)?,
                        to_sql_int(chunk.chunk_id)?,
                        chunk.video_number,
                        chunk.video_title,
                        chunk.start,
                        chunk.end,
                        chunk.text,
                        embedding_to_bytes(&chunk.embedding),
                    ])?;
                }

                let mut meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
                meta.execute(params!["dimensions", self.dimensions.to_string()])?;
                meta.execute(params!["built_at", Utc::now().to_rfc3339()])?;
                if let Some(model) = &self.embedding_model {
                    meta.execute(params!["embedding_model", model])?;
                }
            }
            tx.commit()?;

            conn.close().map_err(|(_, e)| VidragError::Database(e))?;
        }

        tmp.persist(path).map_err(|e| VidragError::Io(e.error))?;

        info!("Saved vector table with {} rows to {:?}", self.len(), path);
        Ok(())
    }

    /// Load a persisted table, re-validating its invariants.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let conn = open_read_only(path)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT chunk_id, video_number, video_title, start_seconds, end_seconds, text, embedding
            FROM chunks
            ORDER BY position
            "#,
        )?;

        let raw = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Vec<u8>>(6)?,
            ))
        })?;

        let mut rows = Vec::new();
        for entry in raw {
            let (chunk_id, video_number, video_title, start, end, text, blob) = entry?;
            let chunk_id = u64::try_from(chunk_id).map_err(|_| {
                VidragError::MalformedInput(format!("negative chunk_id {}", chunk_id))
            })?;

            rows.push(Chunk {
                chunk_id,
                video_number,
                video_title,
                start,
                end,
                text,
                embedding: bytes_to_embedding(&blob).ok_or_else(|| {
                    VidragError::MalformedInput(format!(
                        "chunk {} has a {}-byte embedding, not a whole number of f32 values",
                        chunk_id,
                        blob.len()
                    ))
                })?,
            });
        }

        let meta = read_meta_from(&conn)?;
        let mut table = VectorTable::new(rows)?;
        if !table.is_empty() && meta.dimensions != table.dimensions() {
            return Err(VidragError::DimensionMismatch {
                expected: meta.dimensions,
                actual: table.dimensions(),
            });
        }
        table.embedding_model = meta.embedding_model;

        debug!("Loaded {} rows ({} dimensions)", table.len(), table.dimensions());
        Ok(table)
    }

    /// Read only the metadata of a persisted table.
    pub fn read_meta(path: &Path) -> Result<TableMeta> {
        let conn = open_read_only(path)?;
        read_meta_from(&conn)
    }
}

fn open_read_only(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(VidragError::VectorTable(format!(
            "No vector table at {}. Run 'vidrag index' first.",
            path.display()
        )));
    }

    Ok(Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?)
}

fn read_meta_from(conn: &Connection) -> Result<TableMeta> {
    let get = |key: &str| -> Result<Option<String>> {
        Ok(conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    };

    let dimensions = get("dimensions")?
        .ok_or_else(|| VidragError::MalformedInput("table metadata lacks dimensions".to_string()))?
        .parse::<usize>()
        .map_err(|e| VidragError::MalformedInput(format!("invalid dimensions: {}", e)))?;

    let built_at = get("built_at")?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc)));

    let rows: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;

    Ok(TableMeta {
        rows: rows as usize,
        dimensions,
        embedding_model: get("embedding_model")?,
        built_at,
    })
}

fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| VidragError::VectorTable(format!("{} does not fit in an SQLite integer", value)))
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes, or `None` if the length is not a multiple of 4.
fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }

    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_table::test_chunk;

    #[test]
    fn test_save_load_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.db");

        let mut odd = test_chunk(7, vec![f32::MIN_POSITIVE, -0.0, 1.0e-38, 0.1 + 0.2]);
        odd.video_number = "007".to_string();
        odd.video_title = "Flexbox ｜ layout".to_string();
        odd.start = 0.1 + 0.2;
        odd.end = 1.0 / 3.0;
        odd.text = " यह एक test\nwith newline".to_string();

        let table = VectorTable::new(vec![
            test_chunk(3, vec![0.123_456_79, -2.5, 3.0e10, 0.0]),
            odd,
        ])
        .unwrap()
        .with_embedding_model("bge-m3");

        table.save(&path).unwrap();
        let loaded = VectorTable::load(&path).unwrap();

        assert_eq!(loaded, table);
        for (a, b) in loaded.rows().iter().zip(table.rows()) {
            let a_bits: Vec<u32> = a.embedding.iter().map(|f| f.to_bits()).collect();
            let b_bits: Vec<u32> = b.embedding.iter().map(|f| f.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
            assert_eq!(a.start.to_bits(), b.start.to_bits());
        }
    }

    #[test]
    fn test_load_preserves_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.db");

        let table = VectorTable::new(vec![
            test_chunk(9, vec![1.0]),
            test_chunk(2, vec![2.0]),
            test_chunk(5, vec![3.0]),
        ])
        .unwrap();
        table.save(&path).unwrap();

        let ids: Vec<u64> = VectorTable::load(&path)
            .unwrap()
            .rows()
            .iter()
            .map(|c| c.chunk_id)
            .collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }

    #[test]
    fn test_save_replaces_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.db");

        VectorTable::new(vec![test_chunk(0, vec![1.0, 0.0]), test_chunk(1, vec![0.0, 1.0])])
            .unwrap()
            .save(&path)
            .unwrap();
        VectorTable::new(vec![test_chunk(0, vec![0.5, 0.5, 0.5])])
            .unwrap()
            .save(&path)
            .unwrap();

        let meta = VectorTable::read_meta(&path).unwrap();
        assert_eq!(meta.rows, 1);
        assert_eq!(meta.dimensions, 3);
        assert!(meta.built_at.is_some());

        // Only the table file remains; the temporary file was renamed over it.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_empty_table_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");

        VectorTable::default().save(&path).unwrap();
        let loaded = VectorTable::load(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let result = VectorTable::load(&dir.path().join("missing.db"));
        assert!(matches!(result, Err(VidragError::VectorTable(_))));
    }

    #[test]
    fn test_truncated_embedding_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.db");
        VectorTable::new(vec![test_chunk(0, vec![1.0, 2.0])]).unwrap().save(&path).unwrap();

        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE chunks SET embedding = ?1", params![vec![0u8; 7]])
            .unwrap();
        drop(conn);

        assert!(matches!(
            VectorTable::load(&path),
            Err(VidragError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_bytes_to_embedding() {
        let v = vec![1.5f32, -2.25];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)), Some(v));
        assert_eq!(bytes_to_embedding(&[0u8; 5]), None);
    }
}
