// src/db/store.rs

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::common::{
    error::AppError,
    pagination::{Page, PageRequest, PaginationMeta},
};

// ---
// 1. Filtros, Ordenação e Busca Textual
// ---
// Campos são caminhos pontuados sobre o JSON do documento (ex: "price.retail").

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    In(String, Vec<Value>),
    /// Contém o valor JSON (semântica do `@>` do Postgres).
    Contains(String, Value),
    /// Substring, sem diferenciar maiúsculas/minúsculas.
    ILike(String, String),
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: Value) -> Self {
        Filter::Eq(field.to_string(), value)
    }

    pub fn contains(field: &str, value: Value) -> Self {
        Filter::Contains(field.to_string(), value)
    }

    pub fn ilike(field: &str, needle: &str) -> Self {
        Filter::ILike(field.to_string(), needle.to_string())
    }

    pub fn range(field: &str, min: Option<f64>, max: Option<f64>) -> Self {
        Filter::Range {
            field: field.to_string(),
            min,
            max,
        }
    }

    /// Qualquer um dos valores presente no array `field`.
    pub fn contains_any(field: &str, values: impl IntoIterator<Item = Value>) -> Self {
        Filter::Or(
            values
                .into_iter()
                .map(|v| Filter::Contains(field.to_string(), Value::Array(vec![v])))
                .collect(),
        )
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, other) => Filter::And(vec![f, other]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Asc }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Desc }
    }
}

/// Busca textual: filtra por relevância > 0 e ordena pela relevância antes do `sort`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    pub term: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Vec<Sort>,
    pub text: Option<TextSearch>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: Vec::new(),
            text: None,
            skip: 0,
            limit: None,
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn text(mut self, text: Option<TextSearch>) -> Self {
        self.text = text;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.skip = page.skip();
        self.limit = Some(page.limit);
        self
    }
}

// ---
// 2. O contrato do armazenamento de documentos
// ---

/// Interface genérica de persistência sobre documentos JSON.
///
/// Cada escrita é atômica no nível de um único documento; não há transação
/// entre documentos (last-writer-wins).
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), AppError>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, AppError>;

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Value>, AppError>;

    /// Conta os documentos do filtro (respeitando a busca textual, se houver).
    async fn count(
        &self,
        collection: &str,
        filter: &Filter,
        text: Option<&TextSearch>,
    ) -> Result<u64, AppError>;

    /// Substitui o documento inteiro. Retorna `false` se ele não existe.
    async fn replace(&self, collection: &str, id: Uuid, doc: Value) -> Result<bool, AppError>;

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, AppError>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, AppError>;

    /// Incremento atômico de um contador inteiro. Retorna `false` se o documento não existe.
    async fn increment(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        by: i64,
    ) -> Result<bool, AppError>;

    /// Valores distintos de um campo (arrays são "desenrolados"), em ordem crescente.
    async fn distinct(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
    ) -> Result<Vec<Value>, AppError>;

    async fn numeric_range(
        &self,
        collection: &str,
        filter: &Filter,
        field: &str,
    ) -> Result<Option<(f64, f64)>, AppError>;
}

// ---
// 3. Documentos tipados
// ---

pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
}

/// Acesso tipado a uma coleção; faz a (de)serialização com `serde_json`.
pub struct Collection<D> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> D>,
}

impl<D> Clone for Collection<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<D: Document> Collection<D> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, _marker: PhantomData }
    }

    pub async fn insert(&self, doc: &D) -> Result<(), AppError> {
        self.store
            .insert(D::COLLECTION, doc.id(), serde_json::to_value(doc)?)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<D>, AppError> {
        match self.store.find_by_id(D::COLLECTION, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<D>, AppError> {
        self.store
            .find(D::COLLECTION, query)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(AppError::from))
            .collect()
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        self.store.count(D::COLLECTION, filter, None).await
    }

    /// Busca paginada: uma contagem + uma leitura da página pedida.
    pub async fn find_page(&self, query: Query, page: PageRequest) -> Result<Page<D>, AppError>
    where
        D: Serialize,
    {
        let total = self
            .store
            .count(D::COLLECTION, &query.filter, query.text.as_ref())
            .await?;
        let items = self.find(&query.page(page)).await?;
        Ok(Page {
            items,
            pagination: PaginationMeta::new(page, total),
        })
    }

    pub async fn replace(&self, doc: &D) -> Result<bool, AppError> {
        self.store
            .replace(D::COLLECTION, doc.id(), serde_json::to_value(doc)?)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.store.delete(D::COLLECTION, id).await
    }

    pub async fn delete_many(&self, filter: &Filter) -> Result<u64, AppError> {
        self.store.delete_many(D::COLLECTION, filter).await
    }

    pub async fn increment(&self, id: Uuid, field: &str, by: i64) -> Result<bool, AppError> {
        self.store.increment(D::COLLECTION, id, field, by).await
    }

    pub async fn distinct(&self, filter: &Filter, field: &str) -> Result<Vec<Value>, AppError> {
        self.store.distinct(D::COLLECTION, filter, field).await
    }

    pub async fn numeric_range(
        &self,
        filter: &Filter,
        field: &str,
    ) -> Result<Option<(f64, f64)>, AppError> {
        self.store.numeric_range(D::COLLECTION, filter, field).await
    }
}

// ---
// 4. Helpers de JSON compartilhados pelas implementações
// ---

/// Resolve um caminho pontuado dentro do documento.
pub(crate) fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(doc, |current, key| current.as_object()?.get(key))
}

/// Ordem total usada na ordenação e nos facets: null < bool < número < string.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
