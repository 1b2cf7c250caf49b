use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use tracing::debug;

use crate::database::{Collection, DocumentStore};
use crate::error::ApiResult;
use crate::filter::{FieldPath, Filter, FilterExpr, FindOptions, Pagination, Populate, Projection};
use crate::filter::filter_order::FilterOrder;
use crate::state::AppState;

/// One page of a translated list query
#[derive(Debug, Clone)]
pub struct ListPage {
    pub data: Vec<Value>,
    /// Documents on this page
    pub count: u64,
    /// Documents matching the filter across all pages
    pub total: u64,
    pub pagination: Option<Pagination>,
}

/// Runs the full list pipeline for a collection: translate the query
/// string, count and fetch one page concurrently, project, populate and
/// hide stored-only fields.
pub async fn run_listing(
    state: &AppState,
    collection: Collection,
    params: &[(String, String)],
    populate: &[Populate],
) -> ApiResult<ListPage> {
    let filter = Filter::from_params(params, &state.config.filter)?;
    let page = filter.page();
    let options = FindOptions {
        sort: filter.sort().to_vec(),
        skip: page.skip(),
        limit: Some(page.limit),
    };
    debug!(collection = %collection, ?options, "running list query");

    let store = state.store.as_ref();
    let (total, docs) = futures::try_join!(
        store.count(collection, filter.where_expr()),
        store.find(collection, filter.where_expr(), &options),
    )?;

    let bodies: Vec<Value> = docs.into_iter().map(|d| d.body).collect();
    let data = shape(store, collection, bodies, filter.projection(), populate).await?;

    Ok(ListPage {
        count: data.len() as u64,
        data,
        total,
        pagination: Some(Pagination::compute(page, total)),
    })
}

/// Every document matching `scope`, newest first, without a page window
pub async fn run_scoped(
    state: &AppState,
    collection: Collection,
    scope: FilterExpr,
    populate: &[Populate],
) -> ApiResult<ListPage> {
    let options = FindOptions {
        sort: FilterOrder::default_sort(),
        ..Default::default()
    };
    let docs = state.store.find(collection, &scope, &options).await?;
    let bodies: Vec<Value> = docs.into_iter().map(|d| d.body).collect();
    let data = shape(state.store.as_ref(), collection, bodies, None, populate).await?;
    Ok(ListPage {
        count: data.len() as u64,
        total: data.len() as u64,
        data,
        pagination: None,
    })
}

/// Applies population rules to a single document
pub async fn populate_one(
    state: &AppState,
    collection: Collection,
    body: Value,
    populate: &[Populate],
) -> ApiResult<Value> {
    let mut shaped = shape(state.store.as_ref(), collection, vec![body], None, populate).await?;
    Ok(shaped.pop().unwrap_or(Value::Null))
}

async fn shape(
    store: &dyn DocumentStore,
    collection: Collection,
    bodies: Vec<Value>,
    projection: Option<&Projection>,
    populate: &[Populate],
) -> ApiResult<Vec<Value>> {
    // A projection keeps only the populated fields it names. Join keys come
    // from the stored documents, so the projection need not select them.
    let rules = populate
        .iter()
        .filter(|rule| projection.map_or(true, |p| p.includes(rule.as_field)));
    let mut attachments: Vec<Vec<(&'static str, Value)>> = vec![Vec::new(); bodies.len()];
    for rule in rules {
        let related = fetch_related(store, rule, &bodies).await?;
        for (i, body) in bodies.iter().enumerate() {
            let key = body.get(rule.local_field).and_then(join_key);
            let matched = key.and_then(|k| related.get(&k));
            let value = if rule.single {
                matched.and_then(|docs| docs.first().cloned()).unwrap_or(Value::Null)
            } else {
                Value::Array(matched.cloned().unwrap_or_default())
            };
            attachments[i].push((rule.as_field, value));
        }
    }

    let hidden = collection.hidden_fields();
    Ok(bodies
        .into_iter()
        .zip(attachments)
        .map(|(body, attached)| {
            let mut out = match projection {
                Some(p) => p.apply(&body),
                None => body,
            };
            if let Value::Object(map) = &mut out {
                for field in hidden {
                    map.remove(*field);
                }
                for (name, value) in attached {
                    map.insert(name.to_string(), value);
                }
            }
            out
        })
        .collect())
}

/// Related documents grouped by their join key
async fn fetch_related(
    store: &dyn DocumentStore,
    rule: &Populate,
    bodies: &[Value],
) -> ApiResult<HashMap<String, Vec<Value>>> {
    let keys: BTreeSet<String> = bodies
        .iter()
        .filter_map(|b| b.get(rule.local_field).and_then(join_key))
        .collect();
    let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
    if keys.is_empty() {
        return Ok(grouped);
    }

    let foreign = FieldPath::single(rule.foreign_field);
    let filter = FilterExpr::In(foreign, keys.into_iter().map(Value::String).collect());
    let options = FindOptions {
        sort: FilterOrder::default_sort(),
        ..Default::default()
    };
    let hidden = rule.collection.hidden_fields();
    for doc in store.find(rule.collection, &filter, &options).await? {
        let Some(key) = doc.body.get(rule.foreign_field).and_then(join_key) else {
            continue;
        };
        let mut shaped = match &rule.select {
            Some(p) => p.apply(&doc.body),
            None => doc.body,
        };
        if let Value::Object(map) = &mut shaped {
            for field in hidden {
                map.remove(*field);
            }
        }
        grouped.entry(key).or_default().push(shaped);
    }
    Ok(grouped)
}

fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
