use coffer_shared::types::UserId;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::FileEntry;

impl Database {
    /// Store `data` under `(owner, name)`, overwriting any existing payload.
    pub fn upsert_file(&self, owner: UserId, name: &str, data: &[u8]) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO files (owner_id, name, data) VALUES (?1, ?2, ?3)
             ON CONFLICT (owner_id, name) DO UPDATE SET data = excluded.data",
            params![owner.0, name, data],
        )?;
        Ok(())
    }

    pub fn get_file(&self, owner: UserId, name: &str) -> Result<Vec<u8>> {
        let data = self.conn()?.query_row(
            "SELECT data FROM files WHERE owner_id = ?1 AND name = ?2",
            params![owner.0, name],
            |row| row.get(0),
        )?;
        Ok(data)
    }

    /// Rename one of `owner`'s files.
    ///
    /// [`StoreError::NotFound`] if `name` does not exist,
    /// [`StoreError::Conflict`] if `new_name` is already taken.
    pub fn rename_file(&self, owner: UserId, name: &str, new_name: &str) -> Result<()> {
        let affected = self.conn()?.execute(
            "UPDATE files SET name = ?3 WHERE owner_id = ?1 AND name = ?2",
            params![owner.0, name, new_name],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn delete_file(&self, owner: UserId, name: &str) -> Result<bool> {
        let affected = self.conn()?.execute(
            "DELETE FROM files WHERE owner_id = ?1 AND name = ?2",
            params![owner.0, name],
        )?;
        Ok(affected > 0)
    }

    pub fn list_files(&self, owner: UserId) -> Result<Vec<FileEntry>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT name FROM files WHERE owner_id = ?1 ORDER BY name ASC")?;
        let rows = stmt.query_map(params![owner.0], |row| {
            Ok(FileEntry { name: row.get(0)? })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}
