//! PostgreSQL media catalog repository.
//!
//! One row per logical asset with the variant set embedded as JSONB.
//! Reference counts are mutated only with single-statement atomic updates
//! so concurrent attach/detach on the same row never lose updates, and the
//! hard-delete path re-checks the count under a row lock in the same
//! transaction (TOCTOU guard).

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use atelier_core::defaults::{PAGE_LIMIT, PAGE_LIMIT_MAX};
use atelier_core::{
    Error, ListMediaRequest, ListMediaResponse, MediaAsset, MediaCatalog, MediaKind,
    NewMediaAsset, Result, VariantMap,
};

const ASSET_COLUMNS: &str = r#"id, original_filename, display_filename, content_type, kind,
       size_bytes, storage_path, main_url, width, height, placeholder,
       dominant_color, content_hash, variants, alt_text, ref_count,
       deleted_at, created_at, updated_at"#;

/// Media catalog backed by PostgreSQL.
#[derive(Clone)]
pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaCatalog for PgMediaRepository {
    async fn insert(&self, asset: NewMediaAsset) -> Result<MediaAsset> {
        let variants = serde_json::to_value(&asset.variants)?;
        let row = sqlx::query(&format!(
            r#"INSERT INTO media_asset
               (id, original_filename, display_filename, content_type, kind,
                size_bytes, storage_path, main_url, width, height, placeholder,
                dominant_color, content_hash, variants, alt_text)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
               RETURNING {}"#,
            ASSET_COLUMNS
        ))
        .bind(asset.id)
        .bind(&asset.original_filename)
        .bind(&asset.display_filename)
        .bind(&asset.content_type)
        .bind(asset.kind.to_string())
        .bind(asset.size_bytes)
        .bind(&asset.storage_path)
        .bind(&asset.main_url)
        .bind(asset.width)
        .bind(asset.height)
        .bind(&asset.placeholder)
        .bind(&asset.dominant_color)
        .bind(&asset.content_hash)
        .bind(variants)
        .bind(&asset.alt_text)
        .fetch_one(&self.pool)
        .await?;

        info!(
            subsystem = "db",
            component = "media",
            op = "insert",
            asset_id = %asset.id,
            kind = %asset.kind,
            "Catalog row created"
        );
        media_asset_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> Result<MediaAsset> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM media_asset WHERE id = $1 AND deleted_at IS NULL",
            ASSET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AssetNotFound(id))?;

        media_asset_from_row(&row)
    }

    async fn list(&self, req: ListMediaRequest) -> Result<ListMediaResponse> {
        let limit = req.limit.unwrap_or(PAGE_LIMIT).clamp(1, PAGE_LIMIT_MAX);
        let offset = req.offset.unwrap_or(0).max(0);

        let rows = sqlx::query(&format!(
            r#"SELECT {}, COUNT(*) OVER() AS total
               FROM media_asset
               WHERE deleted_at IS NULL
                 AND ($1::text IS NULL OR kind = $1)
                 AND ($2::text IS NULL
                      OR original_filename ILIKE '%' || $2 || '%'
                      OR display_filename ILIKE '%' || $2 || '%')
                 AND (NOT $3 OR ref_count = 0)
               ORDER BY created_at DESC
               LIMIT $4 OFFSET $5"#,
            ASSET_COLUMNS
        ))
        .bind(req.kind.map(|k| k.to_string()))
        .bind(&req.search)
        .bind(req.unused_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = rows
            .first()
            .map(|row| row.get::<i64, _>("total"))
            .unwrap_or(0);
        let assets = rows
            .iter()
            .map(media_asset_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(ListMediaResponse { assets, total })
    }

    async fn update_alt_text(&self, id: Uuid, alt_text: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            r#"UPDATE media_asset
               SET alt_text = $2, updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .bind(alt_text)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AssetNotFound(id));
        }
        Ok(())
    }

    async fn attach(&self, id: Uuid) -> Result<i32> {
        let row = sqlx::query(
            r#"UPDATE media_asset
               SET ref_count = ref_count + 1, updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL
               RETURNING ref_count"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AssetNotFound(id))?;

        let ref_count: i32 = row.get("ref_count");
        debug!(
            subsystem = "db",
            component = "media",
            op = "attach",
            asset_id = %id,
            ref_count,
            "Reference attached"
        );
        Ok(ref_count)
    }

    async fn detach(&self, id: Uuid) -> Result<i32> {
        // Floored at zero: double-detach bugs in callers clamp, not underflow.
        let row = sqlx::query(
            r#"UPDATE media_asset
               SET ref_count = GREATEST(ref_count - 1, 0), updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL
               RETURNING ref_count"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AssetNotFound(id))?;

        let ref_count: i32 = row.get("ref_count");
        debug!(
            subsystem = "db",
            component = "media",
            op = "detach",
            asset_id = %id,
            ref_count,
            "Reference detached"
        );
        Ok(ref_count)
    }

    async fn remove(&self, id: Uuid, force: bool) -> Result<MediaAsset> {
        let mut tx = self.pool.begin().await?;

        // Lock the row and read the count at delete time, not request time.
        let row = sqlx::query(&format!(
            "SELECT {} FROM media_asset WHERE id = $1 FOR UPDATE",
            ASSET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::AssetNotFound(id))?;

        let asset = media_asset_from_row(&row)?;
        if !force && asset.ref_count > 0 {
            return Err(Error::AssetInUse {
                ref_count: asset.ref_count,
            });
        }

        sqlx::query("DELETE FROM media_asset WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            subsystem = "db",
            component = "media",
            op = "remove",
            asset_id = %id,
            force,
            "Catalog row removed"
        );
        Ok(asset)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"UPDATE media_asset
               SET deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AssetNotFound(id));
        }
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"UPDATE media_asset
               SET deleted_at = NULL, updated_at = NOW()
               WHERE id = $1 AND deleted_at IS NOT NULL"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AssetNotFound(id));
        }
        Ok(())
    }

    async fn list_cleanup_candidates(&self, min_age_hours: i32) -> Result<Vec<MediaAsset>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {} FROM media_asset
               WHERE ref_count = 0
                 AND deleted_at IS NOT NULL
                 AND deleted_at < NOW() - make_interval(hours => $1)
               ORDER BY deleted_at"#,
            ASSET_COLUMNS
        ))
        .bind(min_age_hours)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(media_asset_from_row).collect()
    }
}

/// Convert a database row to a MediaAsset.
fn media_asset_from_row(row: &sqlx::postgres::PgRow) -> Result<MediaAsset> {
    let kind: String = row.get("kind");
    let kind = kind
        .parse::<MediaKind>()
        .map_err(Error::Internal)?;
    let variants: VariantMap = serde_json::from_value(row.get("variants"))?;

    Ok(MediaAsset {
        id: row.get("id"),
        original_filename: row.get("original_filename"),
        display_filename: row.get("display_filename"),
        content_type: row.get("content_type"),
        kind,
        size_bytes: row.get("size_bytes"),
        storage_path: row.get("storage_path"),
        main_url: row.get("main_url"),
        width: row.get("width"),
        height: row.get("height"),
        placeholder: row.get("placeholder"),
        dominant_color: row.get("dominant_color"),
        content_hash: row.get("content_hash"),
        variants,
        alt_text: row.get("alt_text"),
        ref_count: row.get("ref_count"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// Postgres-backed tests; run with a live DATABASE_URL:
//   cargo test -p atelier-db -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::MediaKind;

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::pool::create_pool(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn new_asset(name: &str) -> NewMediaAsset {
        NewMediaAsset {
            id: Uuid::now_v7(),
            original_filename: format!("{}.jpg", name),
            display_filename: format!("{}-deadbeef.jpg", name),
            content_type: "image/jpeg".to_string(),
            kind: MediaKind::Image,
            size_bytes: 1234,
            storage_path: format!("media/2026/08/{}-deadbeef.jpg", name),
            main_url: format!("https://cdn.test/media/2026/08/{}-deadbeef.jpg", name),
            width: Some(800),
            height: Some(600),
            placeholder: Some("LKO2?U%2Tw=w".to_string()),
            dominant_color: Some("#aabbcc".to_string()),
            content_hash: Some("blake3:abc".to_string()),
            variants: VariantMap::new(),
            alt_text: None,
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_insert_and_get_roundtrip() {
        let repo = PgMediaRepository::new(test_pool().await);
        let created = repo.insert(new_asset("roundtrip")).await.unwrap();
        assert_eq!(created.ref_count, 0);
        assert!(created.deleted_at.is_none());

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched.display_filename, created.display_filename);
        assert_eq!(fetched.kind, MediaKind::Image);

        repo.remove(created.id, true).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_attach_detach_floor() {
        let repo = PgMediaRepository::new(test_pool().await);
        let asset = repo.insert(new_asset("refcount")).await.unwrap();

        assert_eq!(repo.attach(asset.id).await.unwrap(), 1);
        assert_eq!(repo.attach(asset.id).await.unwrap(), 2);
        assert_eq!(repo.detach(asset.id).await.unwrap(), 1);
        assert_eq!(repo.detach(asset.id).await.unwrap(), 0);
        // Double detach clamps at zero.
        assert_eq!(repo.detach(asset.id).await.unwrap(), 0);

        repo.remove(asset.id, true).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_remove_blocked_while_referenced() {
        let repo = PgMediaRepository::new(test_pool().await);
        let asset = repo.insert(new_asset("inuse")).await.unwrap();
        repo.attach(asset.id).await.unwrap();

        let err = repo.remove(asset.id, false).await.unwrap_err();
        assert!(matches!(err, Error::AssetInUse { ref_count: 1 }));
        // Row still present.
        assert!(repo.get(asset.id).await.is_ok());

        repo.detach(asset.id).await.unwrap();
        repo.remove(asset.id, false).await.unwrap();
        assert!(matches!(
            repo.get(asset.id).await.unwrap_err(),
            Error::AssetNotFound(_)
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_soft_delete_hides_from_listing() {
        let repo = PgMediaRepository::new(test_pool().await);
        let asset = repo.insert(new_asset("softdel")).await.unwrap();

        repo.soft_delete(asset.id).await.unwrap();
        assert!(matches!(
            repo.get(asset.id).await.unwrap_err(),
            Error::AssetNotFound(_)
        ));

        repo.restore(asset.id).await.unwrap();
        assert!(repo.get(asset.id).await.is_ok());

        repo.remove(asset.id, true).await.unwrap();
    }
}
