//! The transport seam.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{HttpClient, Request, Response, Result};

/// Something that can put a [`Request`] on the wire and hand back the
/// [`Response`].
///
/// A non-2xx status is still `Ok`: interpreting service errors is the
/// caller's business. `Err` means the exchange itself did not complete.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response.
    async fn send(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: Request) -> Result<Response> {
        self.execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request).await
    }
}
