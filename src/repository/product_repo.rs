// ==========================================
// OEE 分析引擎 - 产品仓储
// ==========================================
// 职责: 管理 product 表 (产品名称参考数据)
// ==========================================

use crate::db::{open_sqlite_connection, PRODUCT_DDL};
use crate::domain::machine::Product;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        {
            let conn = repo.get_conn()?;
            conn.execute_batch(PRODUCT_DDL)?;
        }
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn upsert(&self, product: &Product) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO product (product_id, product_name) VALUES (?1, ?2)
            ON CONFLICT(product_id) DO UPDATE SET product_name = excluded.product_name
            "#,
            params![product.product_id, product.product_name],
        )?;
        Ok(())
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT product_id, product_name FROM product ORDER BY product_id ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Product {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
