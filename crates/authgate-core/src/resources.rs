//! Typed CRUD operations issued through the gateway.
//!
//! Each operation is one request at `/{collection}` or `/{collection}/{id}`;
//! credential handling and unauthorized recovery come from the pipeline.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::ApiError;
use crate::pipeline::Gateway;

pub trait Resource: DeserializeOwned + Send {
    /// Collection path segment, e.g. `"widgets"`.
    const COLLECTION: &'static str;
    type Id: Display;
}

pub struct Resources<'a, R> {
    gateway: &'a Gateway,
    _resource: PhantomData<R>,
}

impl Gateway {
    pub fn resources<R: Resource>(&self) -> Resources<'_, R> {
        Resources {
            gateway: self,
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Resources<'_, R> {
    fn collection_path() -> String {
        format!("/{}", R::COLLECTION)
    }

    fn item_path(id: &R::Id) -> String {
        format!("/{}/{}", R::COLLECTION, urlencoding::encode(&id.to_string()))
    }

    pub async fn create<B: Serialize + ?Sized>(&self, input: &B) -> Result<R, ApiError> {
        self.gateway.post_json(&Self::collection_path(), input).await
    }

    pub async fn list(&self) -> Result<Vec<R>, ApiError> {
        self.gateway.get_json(&Self::collection_path()).await
    }

    pub async fn get(&self, id: &R::Id) -> Result<R, ApiError> {
        self.gateway.get_json(&Self::item_path(id)).await
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: &R::Id, changes: &B) -> Result<R, ApiError> {
        self.gateway.put_json(&Self::item_path(id), changes).await
    }

    pub async fn delete(&self, id: &R::Id) -> Result<(), ApiError> {
        self.gateway.delete(&Self::item_path(id)).await
    }
}
