//! OpenDAL Operator factory for the remote frame store

use anyhow::{Context, Result};
use opendal::Operator;

use mask_core::config::StorageConfig;

/// Connection parameters for the S3-compatible frame store.
/// Credentials arrive separately from config (environment, never the file).
#[derive(Debug, Clone)]
pub struct StoreParams {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Build an OpenDAL Operator for the frame store.
///
/// Uses path-style addressing (the opendal 0.55 default), which most
/// self-hosted S3 gateways require.
pub fn build_operator(params: &StoreParams) -> Result<Operator> {
    let builder = opendal::services::S3::default()
        .endpoint(&params.endpoint)
        .region(&params.region)
        .bucket(&params.bucket)
        .access_key_id(&params.access_key_id)
        .secret_access_key(&params.secret_access_key);

    let op = Operator::new(builder)
        .context("creating OpenDAL S3 operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .finish();

    Ok(op)
}

/// Build an operator from config plus credentials loaded from the
/// environment.
///
/// If `enforce_tls` is set and the endpoint uses HTTP, this fails;
/// otherwise plaintext endpoints only log a warning (local development).
pub fn build_from_config(
    storage: &StorageConfig,
    access_key_id: &str,
    secret_access_key: &str,
) -> Result<Operator> {
    if storage.endpoint.starts_with("http://") {
        if storage.enforce_tls {
            anyhow::bail!(
                "store endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                 Use an HTTPS endpoint or set storage.enforce_tls = false for local development.",
                storage.endpoint
            );
        }
        tracing::warn!(
            endpoint = %storage.endpoint,
            "store endpoint uses plaintext HTTP — credentials are transmitted unencrypted"
        );
    }

    build_operator(&StoreParams {
        endpoint: storage.endpoint.clone(),
        region: storage.region.clone(),
        bucket: storage.bucket.clone(),
        access_key_id: access_key_id.to_string(),
        secret_access_key: secret_access_key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StoreParams {
        StoreParams {
            endpoint: "http://localhost:8333".to_string(),
            region: "us-east-1".to_string(),
            bucket: "test-bucket".to_string(),
            access_key_id: "test-key".to_string(),
            secret_access_key: "test-secret".to_string(),
        }
    }

    #[test]
    fn build_operator_valid() {
        assert!(build_operator(&params()).is_ok());
    }

    #[test]
    fn http_endpoint_with_enforce_tls_fails() {
        let storage = StorageConfig {
            endpoint: "http://insecure:8333".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let result = build_from_config(&storage, "key", "secret");
        assert!(result.is_err(), "HTTP + enforce_tls must fail");
        assert!(result.unwrap_err().to_string().contains("enforce_tls"));
    }

    #[test]
    fn http_endpoint_without_enforce_tls_succeeds() {
        let storage = StorageConfig {
            endpoint: "http://localhost:8333".into(),
            enforce_tls: false,
            ..Default::default()
        };
        assert!(build_from_config(&storage, "key", "secret").is_ok());
    }

    #[test]
    fn https_endpoint_succeeds() {
        let storage = StorageConfig {
            endpoint: "https://s3.example.com".into(),
            enforce_tls: true,
            ..Default::default()
        };
        assert!(build_from_config(&storage, "key", "secret").is_ok());
    }
}
