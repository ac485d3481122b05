//! Blob store implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Blob storage capability consumed by the asset layer.
///
/// Implemented by [`OpendalStore`] in production; tests substitute an
/// in-memory store so failure paths can be injected.
pub trait BlobStore: Send + Sync {
    /// Writes a blob under `key`.
    fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Deletes the blob under `key`.
    fn delete(&self, key: &str) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Checks whether a blob exists.
    fn exists(&self, key: &str) -> impl std::future::Future<Output = bool> + Send;

    /// Validates an upload against size and MIME constraints.
    fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError>;

    /// Full public URL the blob is served under.
    fn public_url(&self, key: &str) -> String;
}

/// Generate a collision-resistant blob key.
///
/// Format: `{prefix}/{uuid}{.ext}`. The key is opaque; the original filename
/// only contributes its extension and is kept as row metadata instead.
#[must_use]
pub fn generate_blob_key(prefix: &str, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase);

    match ext {
        Some(ext) => format!("{prefix}/{}.{ext}", Uuid::new_v4()),
        None => format!("{prefix}/{}", Uuid::new_v4()),
    }
}

/// Joins the public base URL and a blob key.
fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Production blob store backed by an OpenDAL operator.
pub struct OpendalStore {
    operator: Operator,
    config: StorageConfig,
}

impl OpendalStore {
    /// Create a new blob store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
        };
        Ok(operator)
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }
}

impl BlobStore for OpendalStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.operator
            .write_with(key, bytes)
            .content_type(content_type)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(size, self.config.max_file_size));
        }
        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.config.public_base_url, key)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Property: generated keys never contain characters that need URL escaping
    // and always carry the requested prefix.
    proptest! {
        #[test]
        fn prop_blob_key_is_url_safe(file_name in ".*") {
            let key = generate_blob_key("community", &file_name);

            prop_assert!(key.starts_with("community/"));
            let tail = &key["community/".len()..];
            for c in tail.chars() {
                prop_assert!(
                    c.is_ascii_alphanumeric() || c == '-' || c == '.',
                    "unexpected character in blob key: {}", c
                );
            }
        }
    }

    // Property: the extension, when kept, is lowercase ascii alphanumeric.
    proptest! {
        #[test]
        fn prop_blob_key_extension_normalized(ext in "[a-zA-Z0-9]{1,8}") {
            let key = generate_blob_key("notice", &format!("file.{ext}"));
            let (_, kept) = key.rsplit_once('.').unwrap();
            prop_assert_eq!(kept, ext.to_ascii_lowercase());
        }
    }

    // Property: size validation accepts exactly the sizes within the limit.
    proptest! {
        #[test]
        fn prop_file_size_validation(
            max_size in 1u64..10_000_000,
            file_size in 0u64..20_000_000,
        ) {
            let config = StorageConfig::new(
                StorageProvider::local_fs("./test_media"),
                "https://cdn.example.com/media",
            )
            .with_max_file_size(max_size);
            let store = OpendalStore::from_config(config).expect("should create store");

            let result = store.validate_upload("image/png", file_size);
            if file_size <= max_size {
                prop_assert!(result.is_ok());
            } else {
                let is_too_large = matches!(result, Err(StorageError::FileTooLarge { .. }));
                prop_assert!(is_too_large);
            }
        }
    }
}
