//! Catalog route handlers: product listing, category filter, product detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use smart_shop_core::ProductId;

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::{Nav, RequireAuth};
use crate::models::{Category, Product};
use crate::routes::{MessageQuery, parse_id};
use crate::state::AppState;

/// Product listing, for every product or one category.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub nav: Nav,
    pub categories: Vec<Category>,
    pub current: Option<Category>,
    pub products: Vec<Product>,
}

/// Product detail page.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/product.html")]
pub struct ProductTemplate {
    pub nav: Nav,
    pub product: Product,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Display every product.
#[instrument(skip_all)]
pub async fn home(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    nav: Nav,
) -> Result<CatalogTemplate> {
    let catalog = CatalogRepository::new(state.pool());

    Ok(CatalogTemplate {
        nav,
        categories: catalog.list_categories().await?,
        current: None,
        products: catalog.list_products(None).await?,
    })
}

/// Display the products of one category.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn category(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    nav: Nav,
    Path(slug): Path<String>,
) -> Result<CatalogTemplate> {
    let catalog = CatalogRepository::new(state.pool());

    let category = catalog
        .get_category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    let products = catalog.list_products(Some(category.id)).await?;

    Ok(CatalogTemplate {
        nav,
        categories: catalog.list_categories().await?,
        current: Some(category),
        products,
    })
}

/// Display a single product.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn product(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    nav: Nav,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<ProductTemplate> {
    let id: ProductId = parse_id(&id)?;

    let product = CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductTemplate {
        nav,
        product,
        error: query.error,
        info: query.info,
    })
}
