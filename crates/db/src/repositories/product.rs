use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use vendaflow_core::domain::product::{Product, ProductId};

use super::{decode_err, ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, description, category, original_price,
                               promotional_price, unit, featured, image_url, stock";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_price(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|e| RepositoryError::Decode(format!("invalid {column} `{raw}`: {e}")))
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let original_price: String = row.try_get("original_price").map_err(decode_err)?;
    let promotional_price: String = row.try_get("promotional_price").map_err(decode_err)?;

    Ok(Product {
        id: ProductId(id),
        name: row.try_get("name").map_err(decode_err)?,
        description: row.try_get("description").map_err(decode_err)?,
        category: row.try_get("category").map_err(decode_err)?,
        original_price: parse_price("original_price", &original_price)?,
        promotional_price: parse_price("promotional_price", &promotional_price)?,
        unit: row.try_get("unit").map_err(decode_err)?,
        featured: row.try_get("featured").map_err(decode_err)?,
        image_url: row.try_get("image_url").map_err(decode_err)?,
        stock: row.try_get("stock").map_err(decode_err)?,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list_featured(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE featured = 1
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, name, description, category, original_price,
                                  promotional_price, unit, featured, image_url, stock, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 category = excluded.category,
                 original_price = excluded.original_price,
                 promotional_price = excluded.promotional_price,
                 unit = excluded.unit,
                 featured = excluded.featured,
                 image_url = excluded.image_url,
                 stock = excluded.stock",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.original_price.to_string())
        .bind(product.promotional_price.to_string())
        .bind(&product.unit)
        .bind(product.featured)
        .bind(&product.image_url)
        .bind(product.stock)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use vendaflow_core::domain::product::{Product, ProductId};

    use super::SqlProductRepository;
    use crate::repositories::ProductRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlProductRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlProductRepository::new(pool)
    }

    fn product(id: &str, featured: bool) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: format!("Porcelanato {id}"),
            description: None,
            category: "Porcelanatos".to_string(),
            original_price: Decimal::new(8990, 2),
            promotional_price: Decimal::new(6990, 2),
            unit: "m²".to_string(),
            featured,
            image_url: None,
            stock: 40,
        }
    }

    #[tokio::test]
    async fn list_featured_filters_and_limits() {
        let repo = setup().await;
        for (id, featured) in
            [("P1", true), ("P2", false), ("P3", true), ("P4", true), ("P5", true)]
        {
            repo.save(product(id, featured)).await.expect("save");
        }

        let featured = repo.list_featured(3).await.expect("list");
        assert_eq!(featured.len(), 3);
        assert!(featured.iter().all(|product| product.featured));
        assert_eq!(featured[0].id.0, "P1");
    }

    #[tokio::test]
    async fn prices_keep_their_decimal_value() {
        let repo = setup().await;
        repo.save(product("P1", true)).await.expect("save");

        let all = repo.list_all().await.expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].original_price, Decimal::new(8990, 2));
        assert_eq!(all[0].promotional_price.to_string(), "69.90");
    }

    #[tokio::test]
    async fn save_upserts_existing_product() {
        let repo = setup().await;
        repo.save(product("P1", true)).await.expect("save");

        let mut updated = product("P1", false);
        updated.stock = 0;
        repo.save(updated).await.expect("upsert");

        let all = repo.list_all().await.expect("list");
        assert_eq!(all.len(), 1);
        assert!(!all[0].featured);
        assert!(repo.list_featured(3).await.expect("featured").is_empty());
    }
}
