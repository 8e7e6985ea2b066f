use std::collections::VecDeque;
use std::marker::PhantomData;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ApiError, Session};
use crate::model::V3Model;
use crate::tql::Tql;

/// Default page size for collection requests.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

fn take_data(mut body: Value) -> Result<Value, ApiError> {
    match body.get_mut("data") {
        Some(data) => Ok(data.take()),
        None => Err(ApiError::Decode(format!("missing 'data' in {body}"))),
    }
}

/// One API resource held in memory, with create/read/update/delete.
#[derive(Debug, Clone)]
pub struct ObjectItem<M> {
    session: Session,
    endpoint: &'static str,
    model: M,
}

impl<M: V3Model> ObjectItem<M> {
    pub fn new(session: Session, endpoint: &'static str, model: M) -> Self {
        Self {
            session,
            endpoint,
            model,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    fn item_url(&self) -> Result<Url, ApiError> {
        let id = self.model.id().ok_or(ApiError::MissingId)?;
        self.session.url(&format!("{}/{id}", self.endpoint))
    }

    /// Fetch the item by id, replacing the in-memory model.
    ///
    /// `fields` requests additional field groups (`fields=tags`); fields the
    /// API does not return stay unset.
    pub fn get(&mut self, fields: &[&str]) -> Result<&M, ApiError> {
        let mut url = self.item_url()?;
        if !fields.is_empty() {
            let mut query = url.query_pairs_mut();
            for field in fields {
                query.append_pair("fields", field);
            }
        }
        let body = self.session.send(Method::GET, url, None)?;
        self.model = serde_json::from_value(take_data(body)?)?;
        Ok(&self.model)
    }

    /// Create the item (`POST`) when it has no id, otherwise update it
    /// (`PUT`) without the fields the API refuses on update.
    pub fn submit(&mut self) -> Result<&M, ApiError> {
        let mut body = serde_json::to_value(&self.model)?;
        let (method, url) = match self.model.id() {
            None => (Method::POST, self.session.url(self.endpoint)?),
            Some(_) => {
                if let Value::Object(map) = &mut body {
                    for key in M::non_updatable() {
                        map.remove(*key);
                    }
                }
                (Method::PUT, self.item_url()?)
            }
        };
        debug!(endpoint = self.endpoint, %method, "Submitting item");
        let response = self.session.send(method, url, Some(&body))?;
        self.model = serde_json::from_value(take_data(response)?)?;
        Ok(&self.model)
    }

    pub fn delete(&self) -> Result<(), ApiError> {
        let url = self.item_url()?;
        self.session.send(Method::DELETE, url, None)?;
        Ok(())
    }
}

/// A filtered view of a collection endpoint.
#[derive(Debug, Clone)]
pub struct ObjectCollection<M> {
    session: Session,
    endpoint: &'static str,
    result_limit: usize,
    params: Vec<(String, String)>,
    _model: PhantomData<M>,
}

impl<M: V3Model> ObjectCollection<M> {
    pub fn new(session: Session, endpoint: &'static str) -> Self {
        Self {
            session,
            endpoint,
            result_limit: DEFAULT_RESULT_LIMIT,
            params: Vec::new(),
            _model: PhantomData,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit.max(1);
        self
    }

    /// Extra query parameter sent with the first page request.
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Iterate over every item matching `tql`, page by page.
    pub fn iter(&self, tql: &Tql) -> CollectionIter<'_, M> {
        CollectionIter {
            collection: self,
            tql: (!tql.is_empty()).then(|| tql.as_str()),
            buffer: VecDeque::new(),
            next: None,
            started: false,
            done: false,
        }
    }

    fn first_page_url(&self, tql: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.session.url(self.endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(tql) = tql {
                query.append_pair("tql", tql);
            }
            query.append_pair("resultStart", "0");
            query.append_pair("resultLimit", &self.result_limit.to_string());
            for (k, v) in &self.params {
                query.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

/// Iterator returned by [`ObjectCollection::iter`].
///
/// Follows the `next` link of each page until a page has none. A failed
/// request is yielded once, then iteration ends.
pub struct CollectionIter<'a, M> {
    collection: &'a ObjectCollection<M>,
    tql: Option<String>,
    buffer: VecDeque<M>,
    next: Option<Url>,
    started: bool,
    done: bool,
}

impl<M: V3Model> CollectionIter<'_, M> {
    fn fetch_page(&mut self) -> Result<(), ApiError> {
        let url = match self.next.take() {
            Some(url) => url,
            None => self.collection.first_page_url(self.tql.as_deref())?,
        };
        self.started = true;
        let body = self.collection.session.send(Method::GET, url, None)?;
        self.next = body
            .get("next")
            .and_then(Value::as_str)
            .map(Url::parse)
            .transpose()?;
        let items: Vec<M> = serde_json::from_value(take_data(body)?)?;
        debug!(
            endpoint = self.collection.endpoint,
            count = items.len(),
            has_next = self.next.is_some(),
            "Fetched page"
        );
        if items.is_empty() {
            self.next = None;
        }
        self.buffer.extend(items);
        Ok(())
    }
}

impl<M: V3Model> Iterator for CollectionIter<'_, M> {
    type Item = Result<M, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done || (self.started && self.next.is_none()) {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
