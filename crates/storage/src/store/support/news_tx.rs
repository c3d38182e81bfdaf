#![forbid(unsafe_code)]

use super::super::StoreError;
use hub_core::ids::NewsId;
use hub_core::news::Article;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

const ARTICLE_COLUMNS: &str =
    "id, title, author, description, link, image_ref, created_at_ms, created_by";

/// Upserts the article row at `article.id`. Writing the same article twice leaves one identical
/// row.
pub(in crate::store) fn write_article_tx(
    tx: &Transaction<'_>,
    article: &Article,
) -> Result<(), StoreError> {
    tx.execute(
        r#"
        INSERT INTO news(id, title, author, description, link, image_ref, created_at_ms, created_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
          title=excluded.title,
          author=excluded.author,
          description=excluded.description,
          link=excluded.link,
          image_ref=excluded.image_ref,
          created_at_ms=excluded.created_at_ms,
          created_by=excluded.created_by
        "#,
        params![
            article.id.get(),
            article.title,
            article.author,
            article.description,
            article.link,
            article.image_ref,
            article.created_at_ms,
            article.created_by,
        ],
    )?;
    Ok(())
}

pub(in crate::store) fn article_by_id(
    conn: &Connection,
    id: NewsId,
) -> Result<Option<Article>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {ARTICLE_COLUMNS} FROM news WHERE id=?1"),
            params![id.get()],
            article_row,
        )
        .optional()?;
    row.map(into_article).transpose()
}

pub(in crate::store) fn articles_page(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Article>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM news ORDER BY id DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let mut rows = stmt.query(params![limit, offset])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(into_article(article_row(row)?)?);
    }
    Ok(out)
}

struct ArticleRow {
    id: i64,
    title: String,
    author: String,
    description: Option<String>,
    link: Option<String>,
    image_ref: Option<String>,
    created_at_ms: i64,
    created_by: String,
}

fn article_row(row: &Row<'_>) -> rusqlite::Result<ArticleRow> {
    Ok(ArticleRow {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        link: row.get(4)?,
        image_ref: row.get(5)?,
        created_at_ms: row.get(6)?,
        created_by: row.get(7)?,
    })
}

fn into_article(row: ArticleRow) -> Result<Article, StoreError> {
    let id = NewsId::try_new(row.id).map_err(|_| StoreError::InvalidInput("invalid news row"))?;
    Ok(Article {
        id,
        title: row.title,
        author: row.author,
        description: row.description,
        link: row.link,
        image_ref: row.image_ref,
        created_at_ms: row.created_at_ms,
        created_by: row.created_by,
    })
}
