#![forbid(unsafe_code)]

use fr_core::RankedItem;
use fr_core::ranked::Removal;
use fr_storage::StoreError;
use serde::Serialize;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Serialize)]
struct ItemView<'a> {
    #[serde(flatten)]
    item: &'a RankedItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_activity_at: Option<String>,
}

fn item_view(item: &RankedItem) -> ItemView<'_> {
    ItemView {
        item,
        last_activity_at: item.last_activity_at_ms.and_then(format_ms),
    }
}

pub(crate) fn format_ms(ms: i64) -> Option<String> {
    let nanos = i128::from(ms).checked_mul(1_000_000)?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

pub(crate) fn now_ms() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(nanos).unwrap_or(i64::MAX)
}

pub(crate) fn item(item: &RankedItem) -> Value {
    json!({ "item": item_view(item) })
}

pub(crate) fn items(items: &[RankedItem]) -> Value {
    json!({
        "count": items.len(),
        "items": items.iter().map(item_view).collect::<Vec<_>>(),
    })
}

pub(crate) fn removal(removal: &Removal) -> Value {
    json!({
        "removed": item_view(&removal.removed),
        "count": removal.items.len(),
        "items": removal.items.iter().map(item_view).collect::<Vec<_>>(),
    })
}

pub(crate) fn cleared(count: usize) -> Value {
    json!({ "cleared": count })
}

pub(crate) fn error(err: &StoreError) -> Value {
    json!({
        "error": {
            "code": err.code(),
            "message": err.to_string(),
        }
    })
}
