use quiz_core::model::{NewUser, Page, User, UserFilter, UserId};

use super::SqliteRepository;
use super::mapping::{db, map_user_row, new_row_id, row_key};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        let res = sqlx::query("INSERT INTO users (name, created_at) VALUES (?1, ?2)")
            .bind(user.name())
            .bind(user.created_at())
            .execute(&self.pool)
            .await
            .map_err(db)?;

        let id = UserId::new(new_row_id("user_id", res.last_insert_rowid())?);
        Ok(user.into_user(id))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let Some(key) = row_key(id.value()) else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT id, name, created_at FROM users WHERE id = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>, StorageError> {
        let keys: Vec<i64> = filter.ids.iter().filter_map(|id| row_key(id.value())).collect();
        if !filter.ids.is_empty() && keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from("SELECT id, name, created_at FROM users WHERE 1 = 1");
        let mut next_param = 1;
        if !keys.is_empty() {
            sql.push_str(" AND id IN (");
            for i in 0..keys.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push('?');
                sql.push_str(&next_param.to_string());
                next_param += 1;
            }
            sql.push(')');
        }
        let fragment = filter.name_fragment();
        if fragment.is_some() {
            sql.push_str(&format!(" AND name LIKE ?{next_param} ESCAPE '\\'"));
            next_param += 1;
        }
        sql.push_str(&format!(
            " ORDER BY id ASC LIMIT ?{next_param} OFFSET ?{}",
            next_param + 1
        ));

        let mut q = sqlx::query(&sql);
        for key in keys {
            q = q.bind(key);
        }
        if let Some(fragment) = fragment {
            q = q.bind(format!("%{}%", escape_like(fragment)));
        }
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        q = q.bind(i64::from(page.size)).bind(offset);

        let rows = q.fetch_all(&self.pool).await.map_err(db)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_user_row(row)?);
        }
        Ok(out)
    }

    async fn rename_user(&self, id: UserId, name: &str) -> Result<bool, StorageError> {
        let Some(key) = row_key(id.value()) else {
            return Ok(false);
        };
        let res = sqlx::query("UPDATE users SET name = ?2 WHERE id = ?1")
            .bind(key)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StorageError> {
        let Some(key) = row_key(id.value()) else {
            return Ok(false);
        };
        let res = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(res.rows_affected() > 0)
    }
}

fn escape_like(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
