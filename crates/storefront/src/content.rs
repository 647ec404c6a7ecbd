//! Markdown-backed informational pages.
//!
//! Pages (privacy policy, terms, shipping and refund policies, contact) are
//! loaded from `<content_dir>/pages/*.md` at startup. Each file starts with
//! YAML frontmatter carrying at least a `title`; the body is rendered to HTML
//! once and kept in memory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;

/// Slugs served as top-level routes.
pub const PAGE_SLUGS: [&str; 5] = [
    "privacy-policy",
    "terms",
    "shipping-policy",
    "refund-policy",
    "contact",
];

/// Frontmatter of a page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// All loaded pages, keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load every page under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store. Files that fail to parse
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` if the directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!(?dir, "Pages directory does not exist");
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                match load_page(&path) {
                    Ok(page) => {
                        tracing::info!(slug = %page.slug, "Loaded page");
                        pages.insert(page.slug.clone(), page);
                    }
                    Err(e) => {
                        tracing::error!(?path, error = %e, "Failed to load page");
                    }
                }
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Get a page by slug.
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn load_page(path: &Path) -> Result<Page, ContentError> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?
        .to_string();

    let (meta, body) = parse_page(&content)?;

    Ok(Page {
        slug,
        meta,
        content_html: render_markdown(&body),
    })
}

/// Split frontmatter from body.
fn parse_page(content: &str) -> Result<(PageMeta, String), ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(content)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;
    Ok((meta, parsed.content))
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(content, &options)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
