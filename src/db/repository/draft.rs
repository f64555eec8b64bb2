use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::parse_json;
use crate::db::DatabaseError;
use crate::models::SavedDraft;

const TABLE: &str = "drafts";

/// Sort order for the saved-draft list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftOrder {
    #[default]
    Newest,
    Oldest,
    Name,
}

impl DraftOrder {
    fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "saved_at DESC, name ASC",
            Self::Oldest => "saved_at ASC, name ASC",
            Self::Name => "name COLLATE NOCASE ASC",
        }
    }
}

/// Save a draft, overwriting any draft with the same name.
pub fn save_draft(conn: &Connection, draft: &SavedDraft) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO drafts (name, snapshot_json, note_text, saved_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(name) DO UPDATE SET
         snapshot_json = ?2, note_text = ?3, saved_at = ?4",
        params![
            draft.name,
            serde_json::to_string(&draft.snapshot)?,
            draft.note_text,
            draft.saved_at,
        ],
    )?;
    Ok(())
}

pub fn load_draft(conn: &Connection, name: &str) -> Result<Option<SavedDraft>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT name, snapshot_json, note_text, saved_at FROM drafts WHERE name = ?1",
            [name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    raw.map(|(name, snapshot_json, note_text, saved_at)| {
        Ok(SavedDraft {
            name,
            snapshot: parse_json(TABLE, &snapshot_json)?,
            note_text,
            saved_at,
        })
    })
    .transpose()
}

pub fn delete_draft(conn: &Connection, name: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute("DELETE FROM drafts WHERE name = ?1", [name])?;
    Ok(changed > 0)
}

/// Names and save times of every draft, without their snapshots.
pub fn list_drafts(
    conn: &Connection,
    order: DraftOrder,
) -> Result<Vec<(String, i64)>, DatabaseError> {
    let sql = format!("SELECT name, saved_at FROM drafts ORDER BY {}", order.order_by());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::ObservationSnapshot;

    fn draft(name: &str, saved_at: i64) -> SavedDraft {
        SavedDraft {
            name: name.into(),
            snapshot: ObservationSnapshot {
                notes: format!("brouillon {name}"),
                ..Default::default()
            },
            note_text: String::new(),
            saved_at,
        }
    }

    #[test]
    fn save_and_load() {
        let conn = open_memory_database().unwrap();
        let d = draft("Chambre 12", 1_000);
        save_draft(&conn, &d).unwrap();
        assert_eq!(load_draft(&conn, "Chambre 12").unwrap(), Some(d));
        assert_eq!(load_draft(&conn, "absent").unwrap(), None);
    }

    #[test]
    fn save_same_name_overwrites() {
        let conn = open_memory_database().unwrap();
        save_draft(&conn, &draft("A", 1)).unwrap();
        let mut updated = draft("A", 2);
        updated.note_text = "Note affichée".into();
        save_draft(&conn, &updated).unwrap();

        assert_eq!(list_drafts(&conn, DraftOrder::Newest).unwrap().len(), 1);
        assert_eq!(load_draft(&conn, "A").unwrap(), Some(updated));
    }

    #[test]
    fn list_orders() {
        let conn = open_memory_database().unwrap();
        save_draft(&conn, &draft("b", 10)).unwrap();
        save_draft(&conn, &draft("C", 30)).unwrap();
        save_draft(&conn, &draft("a", 20)).unwrap();

        let names = |order| -> Vec<String> {
            list_drafts(&conn, order).unwrap().into_iter().map(|(n, _)| n).collect()
        };
        assert_eq!(names(DraftOrder::Newest), ["C", "a", "b"]);
        assert_eq!(names(DraftOrder::Oldest), ["b", "a", "C"]);
        assert_eq!(names(DraftOrder::Name), ["a", "b", "C"]);
    }

    #[test]
    fn delete_reports_presence() {
        let conn = open_memory_database().unwrap();
        save_draft(&conn, &draft("x", 1)).unwrap();
        assert!(delete_draft(&conn, "x").unwrap());
        assert!(!delete_draft(&conn, "x").unwrap());
    }
}
