// src/db/memory_store.rs

//! Armazenamento em memória, usado nos testes e quando não há `DATABASE_URL`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::store::{
    compare_values, lookup, DocumentStore, Filter, Query, SortDirection, TextSearch,
};

/// Uma `DashMap` por coleção; cada documento é escrito de forma atômica sob o
/// lock do shard da coleção.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, HashMap<Uuid, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn matching(&self, collection: &str, filter: &Filter, text: Option<&TextSearch>) -> Vec<(f64, Value)> {
        let Some(docs) = self.collections.get(collection) else {
            return Vec::new();
        };

        docs.values()
            .filter(|doc| matches(doc, filter))
            .filter_map(|doc| match text {
                Some(search) => {
                    let score = text_score(doc, search);
                    (score > 0.0).then(|| (score, doc.clone()))
                }
                None => Some((0.0, doc.clone())),
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), AppError> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(AppError::Conflict(format!("documento {} já existe em '{}'", id, collection)));
        }
        docs.insert(id, doc);
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(&id).cloned()))
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Value>, AppError> {
        let mut scored = self.matching(collection, &query.filter, query.text.as_ref());

        scored.sort_by(|(score_a, a), (score_b, b)| {
            let by_score = score_b.partial_cmp(score_a).unwrap_or(Ordering::Equal);
            query
                .sort
                .iter()
                .fold(by_score, |ordering, sort| {
                    ordering.then_with(|| {
                        let cmp = compare_values(lookup(a, &sort.field), lookup(b, &sort.field));
                        match sort.direction {
                            SortDirection::Asc => cmp,
                            SortDirection::Desc => cmp.reverse(),
                        }
                    })
                })
                // Desempate estável pelo id, como o ORDER BY do Postgres
                .then_with(|| compare_values(lookup(a, "id"), lookup(b, "id")))
        });

        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(scored
            .into_iter()
            .skip(usize::try_from(query.skip).unwrap_or(usize::MAX))
            .take(limit)
            .map(|(_, doc)| doc)
            .collect())
    }

    async fn count(
        &self,
        collection: &str,
        filter: &Filter,
        text: Option<&TextSearch>,
    ) -> Result<u64, AppError> {
        Ok(self.matching(collection, filter, text).len() as u64)
    }

    async fn replace(&self, collection: &str, id: Uuid, doc: Value) -> Result<bool, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        match docs.get_mut(&id) {
            Some(existing) => {
                *existing = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .collections
            .get_mut(collection)
            .map(|mut docs| docs.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, doc| !matches(doc, filter));
        Ok((before - docs.len()) as u64)
    }

    async fn increment(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        by: i64,
    ) -> Result<bool, AppError> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(doc) = docs.get_mut(&id) else {
            return Ok(false);
        };
        let current = lookup(doc, field).and_then(Value::as_i64).unwrap_or(0);
        set_path(doc, field, Value::from(current + by));
        Ok(true)
    }

    async fn distinct(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
    ) -> Result<Vec<Value>, AppError> {
        let mut values: Vec<Value> = Vec::new();
        for (_, doc) in self.matching(collection, filter, None) {
            let candidates = match lookup(&doc, field) {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::Null) | None => Vec::new(),
                Some(other) => vec![other.clone()],
            };
            for candidate in candidates {
                if !candidate.is_null() && !values.contains(&candidate) {
                    values.push(candidate);
                }
            }
        }
        values.sort_by(|a, b| compare_values(Some(a), Some(b)));
        Ok(values)
    }

    async fn numeric_range(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
    ) -> Result<Option<(f64, f64)>, AppError> {
        Ok(self
            .matching(collection, filter, None)
            .iter()
            .filter_map(|(_, doc)| lookup(doc, field).and_then(Value::as_f64))
            .fold(None, |range, x| match range {
                None => Some((x, x)),
                Some((min, max)) => Some((f64::min(min, x), f64::max(max, x))),
            }))
    }
}

// ---
// Avaliação de filtros sobre JSON
// ---

pub(crate) fn matches(doc: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::Eq(field, expected) => lookup(doc, field) == Some(expected),
        Filter::In(field, options) => lookup(doc, field).is_some_and(|v| options.contains(v)),
        Filter::Contains(field, contained) => {
            lookup(doc, field).is_some_and(|v| json_contains(v, contained))
        }
        Filter::ILike(field, needle) => lookup(doc, field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
        Filter::Range { field, min, max } => match lookup(doc, field).and_then(Value::as_f64) {
            Some(x) => min.is_none_or(|m| x >= m) && max.is_none_or(|m| x <= m),
            None => false,
        },
        Filter::And(filters) => filters.iter().all(|f| matches(doc, f)),
        Filter::Or(filters) => filters.iter().any(|f| matches(doc, f)),
        Filter::Not(inner) => !matches(doc, inner),
    }
}

/// Mesma semântica do operador `@>` do JSONB.
fn json_contains(container: &Value, contained: &Value) -> bool {
    match (container, contained) {
        (Value::Object(outer), Value::Object(inner)) => inner
            .iter()
            .all(|(key, value)| outer.get(key).is_some_and(|o| json_contains(o, value))),
        (Value::Array(outer), Value::Array(inner)) => inner
            .iter()
            .all(|value| outer.iter().any(|o| json_contains(o, value))),
        (Value::Array(outer), scalar) if !scalar.is_object() => outer.contains(scalar),
        (a, b) => a == b,
    }
}

/// Relevância: número de termos encontrados nos campos de texto.
fn text_score(doc: &Value, search: &TextSearch) -> f64 {
    let terms: Vec<String> = search
        .term
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() {
        return 0.0;
    }

    let mut haystacks: Vec<String> = Vec::new();
    for field in &search.fields {
        match lookup(doc, field) {
            Some(Value::String(s)) => haystacks.push(s.to_lowercase()),
            Some(Value::Array(items)) => haystacks.extend(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_lowercase),
            ),
            _ => {}
        }
    }

    terms
        .iter()
        .map(|term| haystacks.iter().filter(|h| h.contains(term.as_str())).count() as f64)
        .sum()
}

fn set_path(doc: &mut Value, field: &str, value: Value) {
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    let Value::Object(map) = doc else { return };
    match field.split_once('.') {
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set_path(child, rest, value);
        }
        None => {
            map.insert(field.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::Sort;
    use serde_json::json;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        let docs = [
            json!({ "id": Uuid::from_u128(1).to_string(), "name": "Sofá Oslo", "tags": ["sala", "nórdico"], "price": { "retail": 1200 }, "popularity": 5 }),
            json!({ "id": Uuid::from_u128(2).to_string(), "name": "Mesa de Jantar", "tags": ["jantar"], "price": { "retail": 800 }, "popularity": 9 }),
            json!({ "id": Uuid::from_u128(3).to_string(), "name": "Poltrona Oslo", "tags": ["sala"], "price": { "retail": 450 }, "popularity": 1 }),
        ];
        for (i, doc) in docs.into_iter().enumerate() {
            store.insert("furniture", Uuid::from_u128(i as u128 + 1), doc).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = seeded().await;
        let err = store
            .insert("furniture", Uuid::from_u128(1), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn find_sorts_and_paginates() {
        let store = seeded().await;
        let query = Query::new(Filter::All).sort(Sort::desc("popularity"));
        let all = store.find("furniture", &query).await.unwrap();
        let names: Vec<_> = all.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["Mesa de Jantar", "Sofá Oslo", "Poltrona Oslo"]);

        let mut second = query.clone();
        second.skip = 1;
        second.limit = Some(1);
        let page = store.find("furniture", &second).await.unwrap();
        assert_eq!(page[0]["name"], "Sofá Oslo");
    }

    #[tokio::test]
    async fn range_and_containment_filters() {
        let store = seeded().await;
        let cheap = Filter::range("price.retail", None, Some(900.0));
        assert_eq!(store.count("furniture", &cheap, None).await.unwrap(), 2);

        let living = Filter::contains_any("tags", [json!("sala")]);
        assert_eq!(store.count("furniture", &living, None).await.unwrap(), 2);

        let both = cheap.and(living);
        assert_eq!(store.count("furniture", &both, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn text_search_ranks_before_secondary_sort() {
        let store = seeded().await;
        let search = TextSearch {
            term: "oslo sala".into(),
            fields: vec!["name".into(), "tags".into()],
        };
        let query = Query::new(Filter::All)
            .text(Some(search.clone()))
            .sort(Sort::desc("popularity"));
        let found = store.find("furniture", &query).await.unwrap();
        assert_eq!(found.len(), 2);
        // Ambos têm relevância 2; o desempate é a popularidade.
        assert_eq!(found[0]["name"], "Sofá Oslo");
        assert_eq!(store.count("furniture", &Filter::All, Some(&search)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn increment_creates_missing_counters() {
        let store = seeded().await;
        let id = Uuid::from_u128(3);
        assert!(store.increment("furniture", id, "stats.views", 1).await.unwrap());
        assert!(store.increment("furniture", id, "stats.views", 1).await.unwrap());
        let doc = store.find_by_id("furniture", id).await.unwrap().unwrap();
        assert_eq!(doc["stats"]["views"], 2);
        assert!(!store.increment("furniture", Uuid::nil(), "popularity", 1).await.unwrap());
    }

    #[tokio::test]
    async fn distinct_unwinds_arrays_and_range_spans_all() {
        let store = seeded().await;
        let tags = store.distinct("furniture", &Filter::All, "tags").await.unwrap();
        assert_eq!(tags, vec![json!("jantar"), json!("nórdico"), json!("sala")]);

        let range = store
            .numeric_range("furniture", &Filter::All, "price.retail")
            .await
            .unwrap();
        assert_eq!(range, Some((450.0, 1200.0)));
    }

    #[tokio::test]
    async fn delete_many_removes_only_matches() {
        let store = seeded().await;
        let removed = store
            .delete_many("furniture", &Filter::contains_any("tags", [json!("sala")]))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("furniture", &Filter::All, None).await.unwrap(), 1);
    }

    #[test]
    fn containment_matches_objects_inside_arrays() {
        let doc = json!({ "collaborators": [{ "user": "u1", "role": "editor" }] });
        assert!(matches(&doc, &Filter::contains("collaborators", json!([{ "user": "u1" }]))));
        assert!(!matches(&doc, &Filter::contains("collaborators", json!([{ "user": "u2" }]))));
    }
}
