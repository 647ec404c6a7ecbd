//! Seed the catalog from a YAML file.
//!
//! Categories are matched by slug and products by name within their
//! category, so running the same file twice updates rather than duplicates.
//!
//! ```yaml
//! categories:
//!   - name: Electronics
//!     slug: electronics
//!     products:
//!       - name: Wireless Earbuds
//!         description: Bluetooth 5.3, 24h battery.
//!         price: 1499.00
//!         stock: 25
//!         image: products/earbuds.jpg
//! ```

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use smart_shop_core::Money;
use smart_shop_storefront::db::CatalogRepository;
use smart_shop_storefront::db::catalog::NewProduct;

use super::{CommandError, connect};

/// Top level of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub image: Option<String>,
}

/// Totals reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

impl CatalogFile {
    /// Parse a catalog from YAML text.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Problems that would make the seed write bad rows. Empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut slugs = HashSet::new();

        for category in &self.categories {
            if category.name.trim().is_empty() {
                errors.push(format!("category '{}' has an empty name", category.slug));
            }
            if category.slug.is_empty()
                || !category
                    .slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                errors.push(format!(
                    "category '{}' needs a slug of lowercase letters, digits and dashes",
                    category.name
                ));
            }
            if !slugs.insert(category.slug.as_str()) {
                errors.push(format!("duplicate category slug '{}'", category.slug));
            }

            let mut names = HashSet::new();
            for product in &category.products {
                if product.name.trim().is_empty() {
                    errors.push(format!("a product in '{}' has an empty name", category.slug));
                }
                if !names.insert(product.name.as_str()) {
                    errors.push(format!(
                        "duplicate product '{}' in '{}'",
                        product.name, category.slug
                    ));
                }
                if product.price.is_sign_negative() {
                    errors.push(format!("product '{}' has a negative price", product.name));
                }
                if product.stock < 0 {
                    errors.push(format!("product '{}' has negative stock", product.name));
                }
            }
        }

        errors
    }
}

/// Seed the catalog from `file_path`.
///
/// The file is parsed and validated before connecting to the database.
pub async fn run(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let catalog = CatalogFile::parse(&content)?;

    let errors = catalog.validate();
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidCatalog(errors.len()));
    }

    let pool = connect().await?;
    let repo = CatalogRepository::new(&pool);
    let mut summary = SeedSummary::default();

    for category_seed in &catalog.categories {
        let category = repo
            .upsert_category(category_seed.name.trim(), &category_seed.slug)
            .await?;
        summary.categories += 1;

        for product in &category_seed.products {
            repo.upsert_product(&NewProduct {
                category_id: category.id,
                name: product.name.trim(),
                description: &product.description,
                price: Money::new(product.price),
                stock: product.stock,
                image: product.image.as_deref(),
            })
            .await?;
            summary.products += 1;
        }
        info!(slug = %category.slug, products = category_seed.products.len(), "Seeded category");
    }

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Products:   {}", summary.products);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = CatalogFile::parse(include_str!("../../seed/catalog.yaml")).unwrap();
        assert!(!catalog.categories.is_empty());
        assert_eq!(catalog.validate(), Vec::<String>::new());
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let catalog = CatalogFile::parse(
            "categories:\n  - name: Books\n    slug: books\n    products:\n      - name: Atlas\n        price: 10\n        stock: 1\n",
        )
        .unwrap();

        let product = &catalog.categories[0].products[0];
        assert_eq!(product.description, "");
        assert!(product.image.is_none());
        assert_eq!(Money::new(product.price).to_string(), "10.00");
    }

    #[test]
    fn test_validation_reports_each_problem() {
        let catalog = CatalogFile::parse(
            r"
categories:
  - name: Books
    slug: books
    products:
      - name: Atlas
        price: -1
        stock: -2
      - name: Atlas
        price: 5
        stock: 1
  - name: More Books
    slug: books
  - name: Bad
    slug: Bad Slug
",
        )
        .unwrap();

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("negative price")));
        assert!(errors.iter().any(|e| e.contains("negative stock")));
        assert!(errors.iter().any(|e| e.contains("duplicate product 'Atlas'")));
        assert!(errors.iter().any(|e| e.contains("duplicate category slug 'books'")));
        assert!(errors.iter().any(|e| e.contains("needs a slug")));
    }

    #[test]
    fn test_missing_price_is_a_parse_error() {
        assert!(
            CatalogFile::parse("categories:\n  - name: A\n    slug: a\n    products:\n      - name: X\n        stock: 1\n")
                .is_err()
        );
    }
}
