//! List Mutation Module
//!
//! Fixed optimistic-updater families for list-shaped and paginated cache
//! values. These plug into the same controller as any other mutation.

use serde_json::{json, Value};

use crate::mutation::descriptor::{KeyResolver, OptimisticUpdater};
use crate::store::QueryKey;
use std::sync::Arc;

// == List Op ==
/// The three list-shaped optimistic operations.
///
/// Items are matched by their `id` field: create appends the variables as
/// the new item, update replaces the item whose id matches, delete removes
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Create,
    Update,
    Delete,
}

// == List Updater ==
/// Builds an optimistic updater over a plain JSON array.
///
/// A missing or non-array prior value is treated as an empty list, so a
/// create on a cold cache yields a single-item list.
pub fn list_updater(op: ListOp) -> OptimisticUpdater {
    Arc::new(move |old, vars| {
        let mut items = as_items(old);
        apply_list_op(op, &mut items, vars);
        Value::Array(items)
    })
}

// == Paginated Updater ==
/// Builds an optimistic updater over a `{ items, total }` page object.
///
/// The total counter is adjusted by +1 for create, 0 for update, and -1
/// (floored at zero) for delete.
pub fn paginated_updater(op: ListOp) -> OptimisticUpdater {
    Arc::new(move |old, vars| {
        let (mut items, total) = as_page(old);
        apply_list_op(op, &mut items, vars);
        let total = match op {
            ListOp::Create => total + 1,
            ListOp::Update => total,
            ListOp::Delete => total.saturating_sub(1),
        };
        json!({ "items": items, "total": total })
    })
}

// == Page Key Resolver ==
/// Resolves the page key a paginated invocation targets.
///
/// Reads the `page` field from the variables, falling back to
/// `default_page` (the currently displayed page) when absent. The resulting
/// key is `base:page:<n>`.
pub fn page_key(base: &QueryKey, vars: &Value, default_page: u64) -> QueryKey {
    let page = vars
        .get("page")
        .and_then(Value::as_u64)
        .unwrap_or(default_page);
    base.join("page").join(page)
}

/// Key resolver wrapping [`page_key`] for use in a mutation descriptor.
pub fn paginated_key_resolver(base: QueryKey, default_page: u64) -> KeyResolver {
    Arc::new(move |vars| vec![page_key(&base, vars, default_page)])
}

// == Internals ==
fn as_items(old: Option<Value>) -> Vec<Value> {
    match old {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn as_page(old: Option<Value>) -> (Vec<Value>, u64) {
    match old {
        Some(Value::Object(mut page)) => {
            let items = match page.remove("items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            let total = page.get("total").and_then(Value::as_u64).unwrap_or(0);
            (items, total)
        }
        _ => (Vec::new(), 0),
    }
}

fn apply_list_op(op: ListOp, items: &mut Vec<Value>, vars: &Value) {
    match op {
        ListOp::Create => items.push(vars.clone()),
        ListOp::Update => {
            for item in items.iter_mut() {
                if item.get("id") == vars.get("id") {
                    *item = vars.clone();
                }
            }
        }
        ListOp::Delete => {
            items.retain(|item| item.get("id") != vars.get("id"));
        }
    }
}
