//! Target-store access for the migration engine
//!
//! All statements are parameterized and take a `&mut SqliteConnection`, so
//! they run inside the single transaction that wraps a migration run. The
//! schema itself is owned by `nmdp_common::db` and assumed to exist.

pub mod accounts;
pub mod interviews;
pub mod messages;
pub mod notes;
pub mod patients;
pub mod recommendations;
pub mod referrals;
pub mod results;
pub mod runs;
pub mod shop_links;

use crate::error::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Tables carrying a `legacy_ref` column, preloaded into the registry
pub const LEGACY_REF_TABLES: [(&str, crate::registry::EntityKind); 7] = [
    ("referrals", crate::registry::EntityKind::Referral),
    ("notes", crate::registry::EntityKind::Note),
    ("messages", crate::registry::EntityKind::Message),
    ("shop_links", crate::registry::EntityKind::ShopLink),
    ("recommendations", crate::registry::EntityKind::Recommendation),
    ("results", crate::registry::EntityKind::LabResult),
    ("interviews", crate::registry::EntityKind::Interview),
];

/// Load `(legacy_ref, guid)` pairs for one migrated table.
///
/// The table name comes from the fixed list above, never from input.
pub async fn legacy_ref_pairs(
    conn: &mut SqliteConnection,
    table: &'static str,
) -> Result<Vec<(String, Uuid)>> {
    let sql = format!("SELECT legacy_ref, guid FROM {table} WHERE legacy_ref IS NOT NULL");
    let rows: Vec<(String, String)> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    let mut pairs = Vec::with_capacity(rows.len());
    for (legacy_ref, guid) in rows {
        pairs.push((legacy_ref, Uuid::parse_str(&guid)?));
    }
    Ok(pairs)
}
