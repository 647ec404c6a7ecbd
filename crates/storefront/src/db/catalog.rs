//! Catalog repository: categories, products and stock.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use smart_shop_core::{CategoryId, Money, ProductId};

use super::RepositoryError;
use crate::models::{Category, Product};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: i32,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    image: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.price.is_sign_negative() {
            return Err(RepositoryError::corrupt("price", row.price));
        }

        Ok(Self {
            id: ProductId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            description: row.description,
            price: Money::new(row.price),
            stock: row.stock,
            image: row.image,
        })
    }
}

/// Product fields supplied when seeding the catalog.
#[derive(Debug, Clone)]
pub struct NewProduct<'p> {
    pub category_id: CategoryId,
    pub name: &'p str,
    pub description: &'p str,
    pub price: Money,
    pub stock: i32,
    pub image: Option<&'p str>,
}

fn collect_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM shop.category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM shop.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Products, optionally restricted to one category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list_products(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, description, price, stock, image
            FROM shop.product
            WHERE $1::INTEGER IS NULL OR category_id = $1
            ORDER BY id DESC
            ",
        )
        .bind(category.map(|id| id.as_i32()))
        .fetch_all(self.pool)
        .await?;

        collect_products(rows)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, description, price, stock, image
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get every product whose ID is in `ids`. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::get_products_in(&mut conn, ids).await
    }

    /// Like [`get_products`](Self::get_products), on an open connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_products_in(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, description, price, stock, image
            FROM shop.product
            WHERE id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(ids)
        .fetch_all(conn)
        .await?;

        collect_products(rows)
    }

    /// Take `quantity` units out of stock, only if that many are available.
    ///
    /// Returns `false` without changing anything when stock is insufficient,
    /// so concurrent checkouts can never drive stock below zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn decrement_stock(
        conn: &mut PgConnection,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.product SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Products at or below `threshold` units of stock, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, description, price, stock, image
            FROM shop.product
            WHERE stock <= $1
            ORDER BY stock, name
            ",
        )
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        collect_products(rows)
    }

    /// Insert a category, or rename the existing one with the same slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(&self, name: &str, slug: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, slug
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;

        Ok(Category::from(row))
    }

    /// Insert a product, or update the one with the same name in the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_product(&self, product: &NewProduct<'_>) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM shop.product WHERE category_id = $1 AND name = $2 LIMIT 1",
        )
        .bind(product.category_id.as_i32())
        .bind(product.name)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match existing {
            Some(id) => {
                sqlx::query_as::<_, ProductRow>(
                    r"
                    UPDATE shop.product
                    SET description = $2, price = $3, stock = $4, image = $5
                    WHERE id = $1
                    RETURNING id, category_id, name, description, price, stock, image
                    ",
                )
                .bind(id)
                .bind(product.description)
                .bind(product.price.amount())
                .bind(product.stock)
                .bind(product.image)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(
                    r"
                    INSERT INTO shop.product (category_id, name, description, price, stock, image)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id, category_id, name, description, price, stock, image
                    ",
                )
                .bind(product.category_id.as_i32())
                .bind(product.name)
                .bind(product.description)
                .bind(product.price.amount())
                .bind(product.stock)
                .bind(product.image)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Product::try_from(row)
    }
}
