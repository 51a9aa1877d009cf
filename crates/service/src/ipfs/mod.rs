//! Kubo RPC adapter
//!
//! One client serves as both collaborators of the orchestrator: content goes
//! through `/api/v0/add` and `/api/v0/cat`, naming goes through the IPNS
//! keystore and publish/resolve endpoints. Handles are IPNS key ids; the
//! keypair itself never leaves the Kubo node.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use common::content::{ContentError, ContentHash, ContentStore};
use common::naming::{Handle, NameResolver, NamingError};

#[derive(Clone, Debug)]
pub struct IpfsClient {
    http: reqwest::Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyEntry {
    name: String,
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyListResponse {
    keys: Vec<KeyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResolveResponse {
    path: String,
}

impl IpfsClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, anyhow::Error> {
        self.base
            .join(path)
            .map_err(|e| anyhow::anyhow!("invalid rpc url {}/{}: {}", self.base, path, e))
    }

    async fn key_list(&self) -> Result<Vec<KeyEntry>, anyhow::Error> {
        let url = self.endpoint("/api/v0/key/list")?;
        let response = self
            .http
            .post(url)
            .send()
            .await?
            .error_for_status()?
            .json::<KeyListResponse>()
            .await?;
        Ok(response.keys)
    }
}

#[async_trait]
impl ContentStore for IpfsClient {
    async fn put(&self, bytes: Bytes, pin: bool) -> Result<ContentHash, ContentError> {
        let url = self.endpoint("/api/v0/add").map_err(ContentError::Provider)?;
        let form = Form::new().part("file", Part::bytes(bytes.to_vec()));

        let response = self
            .http
            .post(url)
            .query(&[("pin", pin.to_string()), ("cid-version", "0".to_string())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| ContentError::Provider(e.into()))?
            .error_for_status()
            .map_err(|e| ContentError::Provider(e.into()))?
            .json::<AddResponse>()
            .await
            .map_err(|e| ContentError::Provider(e.into()))?;

        Ok(ContentHash::from(response.hash))
    }

    async fn get(&self, hash: &ContentHash, timeout: Duration) -> Result<Bytes, ContentError> {
        let url = self.endpoint("/api/v0/cat").map_err(ContentError::Provider)?;

        // cat on an unknown hash keeps searching the network, so the deadline
        // is what turns "not here yet" into an error
        let response = self
            .http
            .post(url)
            .query(&[("arg", hash.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ContentError::Timeout(timeout)
                } else {
                    ContentError::Provider(e.into())
                }
            })?;

        if response.status() == http::StatusCode::INTERNAL_SERVER_ERROR {
            return Err(ContentError::NotFound(hash.clone()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| ContentError::Provider(e.into()))?;

        response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ContentError::Timeout(timeout)
            } else {
                ContentError::Provider(e.into())
            }
        })
    }
}

#[async_trait]
impl NameResolver for IpfsClient {
    async fn generate_handle(&self, label: &str) -> Result<Handle, NamingError> {
        let url = self
            .endpoint("/api/v0/key/gen")
            .map_err(NamingError::Provider)?;

        let response = self
            .http
            .post(url)
            .query(&[("arg", label), ("type", "rsa"), ("size", "2048")])
            .send()
            .await
            .map_err(|e| NamingError::Provider(e.into()))?
            .error_for_status()
            .map_err(|e| NamingError::Provider(e.into()))?
            .json::<KeyEntry>()
            .await
            .map_err(|e| NamingError::Provider(e.into()))?;

        tracing::debug!(label, handle = %response.id, "generated ipns key");
        Ok(Handle::from(response.id))
    }

    async fn find_handle(&self, label: &str) -> Result<Option<Handle>, NamingError> {
        let keys = self.key_list().await.map_err(NamingError::Provider)?;
        Ok(keys
            .into_iter()
            .find(|k| k.name == label)
            .map(|k| Handle::from(k.id)))
    }

    async fn publish(
        &self,
        handle: &Handle,
        hash: &ContentHash,
        allow_offline: bool,
    ) -> Result<(), NamingError> {
        // publish is keyed by key name, not key id; map the handle back
        let keys = self.key_list().await.map_err(NamingError::Provider)?;
        let key_name = keys
            .into_iter()
            .find(|k| k.id == handle.as_str())
            .map(|k| k.name)
            .ok_or_else(|| NamingError::Unresolved(handle.clone()))?;

        let url = self
            .endpoint("/api/v0/name/publish")
            .map_err(NamingError::Provider)?;
        self.http
            .post(url)
            .query(&[
                ("arg", format!("/ipfs/{}", hash)),
                ("key", key_name),
                ("allow-offline", allow_offline.to_string()),
            ])
            .send()
            .await
            .map_err(|e| NamingError::Provider(e.into()))?
            .error_for_status()
            .map_err(|e| NamingError::Provider(e.into()))?;

        Ok(())
    }

    async fn resolve(&self, handle: &Handle, timeout: Duration) -> Result<ContentHash, NamingError> {
        let url = self
            .endpoint("/api/v0/name/resolve")
            .map_err(NamingError::Provider)?;

        let response = self
            .http
            .post(url)
            .query(&[("arg", format!("/ipns/{}", handle))])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NamingError::Timeout(timeout)
                } else {
                    NamingError::Provider(e.into())
                }
            })?;

        if response.status() == http::StatusCode::INTERNAL_SERVER_ERROR {
            return Err(NamingError::Unresolved(handle.clone()));
        }
        let resolved = response
            .error_for_status()
            .map_err(|e| NamingError::Provider(e.into()))?
            .json::<ResolveResponse>()
            .await
            .map_err(|e| NamingError::Provider(e.into()))?;

        let hash = resolved
            .path
            .strip_prefix("/ipfs/")
            .unwrap_or(resolved.path.as_str());
        Ok(ContentHash::from(hash))
    }
}
