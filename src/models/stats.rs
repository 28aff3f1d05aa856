use mongodb::bson::{doc, Bson, Document};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<u64>,
    pub by_month: Vec<MonthlyCount>,
}

/// Groups documents by the year and month of `created_at`, oldest first.
pub fn monthly_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": {
                    "year": { "$year": "$created_at" },
                    "month": { "$month": "$created_at" }
                },
                "count": { "$sum": 1 }
            }
        },
        doc! { "$sort": { "_id.year": 1, "_id.month": 1 } },
    ]
}

fn as_i64(value: Option<&Bson>) -> Option<i64> {
    match value? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) => Some(*v as i64),
        _ => None,
    }
}

impl MonthlyCount {
    /// Reads one `$group` output row. Rows without a date bucket are skipped.
    pub fn from_document(row: &Document) -> Option<Self> {
        let bucket = row.get_document("_id").ok()?;
        let year = as_i64(bucket.get("year"))?;
        let month = as_i64(bucket.get("month"))?;
        let count = as_i64(row.get("count")).unwrap_or(0);

        Some(Self {
            year: i32::try_from(year).ok()?,
            month: u32::try_from(month).ok()?,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_group_rows_with_mixed_integer_widths() {
        let row = doc! { "_id": { "year": 2024_i32, "month": 3_i32 }, "count": 12_i64 };
        assert_eq!(
            MonthlyCount::from_document(&row),
            Some(MonthlyCount { year: 2024, month: 3, count: 12 })
        );
    }

    #[test]
    fn skips_rows_without_dates() {
        // $year of a missing field yields null
        let row = doc! { "_id": { "year": Bson::Null, "month": Bson::Null }, "count": 2 };
        assert_eq!(MonthlyCount::from_document(&row), None);
    }

    #[test]
    fn pipeline_sorts_chronologically() {
        let pipeline = monthly_pipeline();
        let sort = pipeline[1].get_document("$sort").unwrap();
        assert_eq!(sort.keys().collect::<Vec<_>>(), vec!["_id.year", "_id.month"]);
    }
}
