use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client};
use std::path::Path;

use crate::object::{guess_content_type, ObjectEntry};
use crate::store::{ObjectStore, StoreError, StoreResult, StoredObject};

#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    pub async fn new(bucket: String) -> Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        // If AWS_ENDPOINT_URL is set, use it (for MinIO/LocalStack/etc)
        if let Ok(endpoint_url) = std::env::var("AWS_ENDPOINT_URL") {
            config_loader = config_loader.endpoint_url(&endpoint_url);
        }

        // Deployments configured with AWS_SECRET_KEY instead of the SDK's
        // AWS_SECRET_ACCESS_KEY still get static credentials.
        if let (Ok(access_key), Ok(secret_key)) = (
            std::env::var("AWS_ACCESS_KEY_ID"),
            std::env::var("AWS_SECRET_KEY"),
        ) {
            config_loader = config_loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "gallery-env",
            ));
        }

        let config = config_loader.load().await;
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&config);

        // For S3-compatible services, force path-style addressing
        if std::env::var("AWS_ENDPOINT_URL").is_ok() {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        Ok(Self::from_conf(s3_config_builder.build(), bucket))
    }

    /// Client over an explicit SDK config, bypassing the environment.
    pub fn from_conf(config: aws_sdk_s3::Config, bucket: String) -> Self {
        Self {
            client: Client::from_conf(config),
            bucket,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a file to S3
    pub async fn upload_file(&self, local_path: &Path, s3_key: &str) -> Result<()> {
        tracing::debug!("S3 PUT: bucket={}, key={}, local_path={:?}", self.bucket, s3_key, local_path);

        let body = ByteStream::from_path(local_path)
            .await
            .context("Failed to read file")?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(s3_key)
            .body(body)
            .content_type(guess_content_type(s3_key))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))
            .context(format!("Failed to upload {s3_key}"))?;

        tracing::debug!("S3 PUT success: key={}", s3_key);
        Ok(())
    }

    /// Upload bytes to S3. An empty body under a `folder/` key is a folder marker.
    pub async fn upload_bytes(&self, data: Vec<u8>, s3_key: &str) -> Result<()> {
        tracing::debug!("S3 PUT (bytes): bucket={}, key={}, size={} bytes", self.bucket, s3_key, data.len());

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(s3_key)
            .body(ByteStream::from(data));

        if !s3_key.ends_with('/') {
            request = request.content_type(guess_content_type(s3_key));
        }

        request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))
            .context(format!("Failed to upload {s3_key}"))?;

        tracing::debug!("S3 PUT (bytes) success: key={}", s3_key);
        Ok(())
    }

    /// Every key under `prefix`, following continuation tokens.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))
                .context(format!("Failed to list objects under {prefix}"))?;

            keys.extend(page.contents().iter().filter_map(|o| o.key()).map(str::to_string));

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    /// Delete all objects with a prefix (folder deletion). Returns the number removed.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys = self.keys_with_prefix(prefix).await?;

        for key in &keys {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))
                .context(format!("Failed to delete {key}"))?;
        }

        Ok(keys.len())
    }

    /// Check if object exists. Only a 404 means "no"; other failures are errors.
    pub async fn object_exists(&self, s3_key: &str) -> Result<bool> {
        match self.client
            .head_object()
            .bucket(&self.bucket)
            .key(s3_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().map(|s| s.is_not_found()).unwrap_or(false) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("{}", DisplayErrorContext(&e)))
                .context(format!("Failed to check {s3_key}")),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(&self) -> StoreResult<Vec<ObjectEntry>> {
        tracing::debug!("S3 LIST: bucket={}", self.bucket);

        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("S3 LIST failed: bucket={}, {}", self.bucket, DisplayErrorContext(&e));
                    StoreError::Upstream(DisplayErrorContext(&e).to_string())
                })?;

            entries.extend(page.contents().iter().filter_map(|object| {
                let key = object.key()?;
                let size = object.size().unwrap_or_default().max(0) as u64;
                Some(ObjectEntry::new(key, size))
            }));

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!("S3 LIST success: bucket={}, objects={}", self.bucket, entries.len());
        Ok(entries)
    }

    async fn get_object(&self, key: &str) -> StoreResult<StoredObject> {
        tracing::debug!("S3 GET: bucket={}, key={}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                let missing = e
                    .as_service_error()
                    .map(|service| service.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    StoreError::NotFound(message)
                } else {
                    StoreError::Upstream(message)
                }
            })?;

        let content_type = response.content_type().map(str::to_string);
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Upstream(format!("Failed to read S3 object body: {e}")))?;

        let body = data.into_bytes();
        tracing::debug!("S3 GET success: key={}, size={} bytes", key, body.len());
        Ok(StoredObject { content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Region};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> S3Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url(server.uri())
            .force_path_style(true)
            .build();
        S3Client::from_conf(config, "photos".into())
    }

    fn listing_page(keys: &[(&str, u64)], next: Option<&str>) -> String {
        let contents: String = keys
            .iter()
            .map(|(key, size)| format!("<Contents><Key>{key}</Key><Size>{size}</Size></Contents>"))
            .collect();
        let continuation = match next {
            Some(token) => format!(
                "<IsTruncated>true</IsTruncated><NextContinuationToken>{token}</NextContinuationToken>"
            ),
            None => "<IsTruncated>false</IsTruncated>".to_string(),
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>photos</Name><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys>{continuation}{contents}</ListBucketResult>"#,
            keys.len()
        )
    }

    fn xml(status: u16, body: String) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body, "application/xml")
    }

    fn error_body(code: &str, message: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>{code}</Code><Message>{message}</Message><RequestId>req-1</RequestId></Error>"#
        )
    }

    #[tokio::test]
    async fn listing_follows_continuation_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/photos"))
            .and(query_param("continuation-token", "page2"))
            .respond_with(xml(200, listing_page(&[("trip/dive.mp4", 9)], None)))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/photos"))
            .and(query_param("list-type", "2"))
            .respond_with(xml(
                200,
                listing_page(&[("trip/", 0), ("trip/trip.jpg", 5)], Some("page2")),
            ))
            .mount(&server)
            .await;

        let entries = client_for(&server).list_objects().await.unwrap();
        assert_eq!(
            entries,
            vec![
                ObjectEntry::new("trip/", 0),
                ObjectEntry::new("trip/trip.jpg", 5),
                ObjectEntry::new("trip/dive.mp4", 9),
            ]
        );
    }

    #[tokio::test]
    async fn listing_failure_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/photos"))
            .respond_with(xml(403, error_body("AccessDenied", "Access Denied")))
            .mount(&server)
            .await;

        match client_for(&server).list_objects().await {
            Err(StoreError::Upstream(message)) => assert!(message.contains("AccessDenied")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_object_returns_body_and_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/photos/trip/trip.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"jpeg-bytes".to_vec(), "image/jpeg"),
            )
            .mount(&server)
            .await;

        let object = client_for(&server).get_object("trip/trip.jpg").await.unwrap();
        assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(&object.body[..], b"jpeg-bytes");
    }

    #[tokio::test]
    async fn missing_key_is_not_found_with_upstream_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/photos/trip/nope.jpg"))
            .respond_with(xml(
                404,
                error_body("NoSuchKey", "The specified key does not exist."),
            ))
            .mount(&server)
            .await;

        match client_for(&server).get_object("trip/nope.jpg").await {
            Err(StoreError::NotFound(message)) => assert!(message.contains("NoSuchKey")),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_get_failures_are_upstream_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/photos/trip/locked.jpg"))
            .respond_with(xml(403, error_body("AccessDenied", "Access Denied")))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).get_object("trip/locked.jpg").await,
            Err(StoreError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn keys_with_prefix_sends_the_prefix() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/photos"))
            .and(query_param("prefix", "trip/"))
            .respond_with(xml(200, listing_page(&[("trip/", 0), ("trip/trip.png", 3)], None)))
            .mount(&server)
            .await;

        let keys = client_for(&server).keys_with_prefix("trip/").await.unwrap();
        assert_eq!(keys, vec!["trip/", "trip/trip.png"]);
    }

    #[tokio::test]
    async fn object_exists_only_treats_404_as_absent() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/photos/trip/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Mock::given(method("HEAD"))
            .and(path("/photos/gone/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("HEAD"))
            .and(path("/photos/locked/"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let s3 = client_for(&server);
        assert!(s3.object_exists("trip/").await.unwrap());
        assert!(!s3.object_exists("gone/").await.unwrap());
        assert!(s3.object_exists("locked/").await.is_err());
    }
}
