//! Shop link persistence

use crate::error::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New shop link row
#[derive(Debug, Clone)]
pub struct NewShopLink {
    pub guid: Uuid,
    pub patient_guid: Uuid,
    pub url: String,
    pub label: Option<String>,
    pub legacy_ref: String,
}

pub async fn insert_shop_link(conn: &mut SqliteConnection, link: &NewShopLink) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO shop_links (guid, patient_guid, url, label, legacy_ref)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(link.guid.to_string())
    .bind(link.patient_guid.to_string())
    .bind(&link.url)
    .bind(&link.label)
    .bind(&link.legacy_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_shop_links(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop_links")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
