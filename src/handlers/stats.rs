use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;

use crate::errors::Result;
use crate::models::stats::{monthly_pipeline, MonthlyCount, MonthlyStats};

/// Totals plus per-month creation counts for one collection.
///
/// `active_filter` adds an `active` count, e.g. `{ "is_active": true }`.
pub async fn monthly_stats(
    collection: Collection<Document>,
    active_filter: Option<Document>,
) -> Result<MonthlyStats> {
    let total = collection.count_documents(doc! {}).await?;

    let active = match active_filter {
        Some(filter) => Some(collection.count_documents(filter).await?),
        None => None,
    };

    let rows: Vec<Document> = collection
        .aggregate(monthly_pipeline())
        .await?
        .try_collect()
        .await?;

    let by_month = rows.iter().filter_map(MonthlyCount::from_document).collect();

    Ok(MonthlyStats {
        total,
        active,
        by_month,
    })
}
