#![forbid(unsafe_code)]

mod error;
mod requests;
mod support;

pub use error::StoreError;
pub use requests::*;

use hub_core::ids::NewsId;
use hub_core::news::Article;
use rusqlite::{Connection, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use support::*;
use tracing::{debug, info};

pub const DB_FILE_NAME: &str = "hub.db";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long a writer waits for the database lock before giving up with
    /// [`StoreError::Conflict`].
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_options(storage_dir, StoreOptions::default())
    }

    pub fn open_with_options(
        storage_dir: impl AsRef<Path>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(options.busy_timeout)?;
        install_schema(&conn)?;

        debug!(path = %db_path.display(), "store opened");
        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Allocates the next news id and writes the article under it in one immediate
    /// transaction: either both the counter bump and the article row persist, or neither does.
    pub fn publish_news(&mut self, request: PublishNewsRequest) -> Result<Article, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let next = next_counter_tx(&tx, NEWS_COUNTER)?;
        let id = NewsId::try_new(next).map_err(|_| StoreError::InvalidInput("invalid news id"))?;
        debug!(stage = "id_allocated", news_id = id.get(), "news id allocated");
        let article = article_from_request(id, request);
        write_article_tx(&tx, &article)?;

        tx.commit()?;
        info!(news_id = id.get(), created_by = %article.created_by, "news published");
        Ok(article)
    }

    /// Writes an article under an id that was already allocated. Repeating the call with the
    /// same content leaves the stored row unchanged.
    pub fn write_article(
        &mut self,
        id: NewsId,
        request: PublishNewsRequest,
    ) -> Result<Article, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if id.get() > counter_value(&tx, NEWS_COUNTER)? {
            return Err(StoreError::UnknownId);
        }
        let article = article_from_request(id, request);
        write_article_tx(&tx, &article)?;

        tx.commit()?;
        debug!(news_id = id.get(), "news article rewritten");
        Ok(article)
    }

    pub fn get_article(&self, id: NewsId) -> Result<Option<Article>, StoreError> {
        article_by_id(&self.conn, id)
    }

    pub fn list_articles(&self, request: ListArticlesRequest) -> Result<Vec<Article>, StoreError> {
        let limit = to_sqlite_i64(request.limit)?;
        let offset = to_sqlite_i64(request.offset)?;
        articles_page(&self.conn, limit, offset)
    }

    /// Counter value: the most recently allocated news id, or 0 before the first publish.
    pub fn latest_news_id(&self) -> Result<i64, StoreError> {
        counter_value(&self.conn, NEWS_COUNTER)
    }

    /// Records the object reference produced by the image upload step.
    pub fn set_article_image(
        &mut self,
        id: NewsId,
        image_ref: &str,
    ) -> Result<Article, StoreError> {
        let image_ref = image_ref.trim();
        if image_ref.is_empty() {
            return Err(StoreError::InvalidInput("image_ref must not be empty"));
        }

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE news SET image_ref=?2 WHERE id=?1",
            params![id.get(), image_ref],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownId);
        }
        let article = article_by_id(&tx, id)?.ok_or(StoreError::UnknownId)?;
        tx.commit()?;
        Ok(article)
    }
}

fn article_from_request(id: NewsId, request: PublishNewsRequest) -> Article {
    let PublishNewsRequest {
        news,
        created_by,
        created_at_ms,
    } = request;
    Article {
        id,
        title: news.title().to_string(),
        author: news.author().to_string(),
        description: news.description().map(str::to_string),
        link: news.link().map(str::to_string),
        image_ref: news.image_ref().map(str::to_string),
        created_at_ms,
        created_by,
    }
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}
