//! AWS S3 SDK integration
//!
//! Wraps the async SDK behind blocking methods so scan and transfer threads
//! never touch the runtime directly. The SDK configuration is loaded once per
//! run; every worker then builds its own client from it, which keeps
//! connections independent across the pool.

use std::collections::HashMap;
use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, StorageClass};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Handle;

use crate::error::{Result, SyncError};

/// Listing page cap. The store may return fewer per response; the cursor
/// loop keeps going until the listing is no longer truncated.
const PAGE_LIMIT: i32 = 10_000;

/// Client-level retry budget for every request.
const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Shared per-run context: the loaded SDK configuration, the runtime handle,
/// and the transfer part size in bytes.
pub struct StoreContext {
    sdk_config: aws_config::SdkConfig,
    handle: Handle,
    part_size: u64,
}

impl StoreContext {
    /// Load the SDK configuration once. Credentials come from the default
    /// provider chain; the region falls back to the environment when not
    /// given on the command line.
    pub fn load(handle: Handle, region: Option<String>, part_size: u64) -> StoreContext {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .retry_config(
                aws_config::retry::RetryConfig::standard().with_max_attempts(MAX_RETRY_ATTEMPTS),
            );
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let sdk_config = handle.block_on(loader.load());
        StoreContext {
            sdk_config,
            handle,
            part_size,
        }
    }
}

/// Head-request result reduced to what the normalizer consumes.
#[derive(Debug)]
pub struct HeadOutput {
    pub size: u64,
    /// Last-modified time, Unix seconds.
    pub modified: i64,
    pub metadata: HashMap<String, String>,
}

/// One row of a listing page.
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub modified: i64,
}

/// One page of a cursor-based listing.
#[derive(Debug)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub next: Option<String>,
}

/// Blocking S3 access owned by a single thread.
pub struct RemoteStore {
    client: aws_sdk_s3::Client,
    handle: Handle,
    part_size: u64,
}

impl RemoteStore {
    /// Build a client from the shared context.
    pub fn connect(context: &StoreContext) -> RemoteStore {
        RemoteStore {
            client: aws_sdk_s3::Client::new(&context.sdk_config),
            handle: context.handle.clone(),
            part_size: context.part_size,
        }
    }

    /// Point lookup for one object.
    pub fn head(&self, bucket: &str, key: &str) -> Result<HeadOutput> {
        self.handle.block_on(async {
            let output = self
                .client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| SyncError::remote("head_object", e))?;
            Ok(HeadOutput {
                size: output.content_length().unwrap_or(0).max(0) as u64,
                modified: output.last_modified().map(|t| t.secs()).unwrap_or(0),
                metadata: output.metadata().cloned().unwrap_or_default(),
            })
        })
    }

    /// Fetch one listing page under a prefix.
    pub fn list_page(&self, bucket: &str, prefix: &str, token: Option<&str>) -> Result<ListPage> {
        self.handle.block_on(async {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .max_keys(PAGE_LIMIT);
            if let Some(token) = token {
                request = request.continuation_token(token);
            }
            let output = request
                .send()
                .await
                .map_err(|e| SyncError::remote("list_objects_v2", e))?;
            let objects = output
                .contents()
                .iter()
                .map(|obj| ObjectSummary {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    modified: obj.last_modified().map(|t| t.secs()).unwrap_or(0),
                })
                .collect();
            let next = if output.is_truncated().unwrap_or(false) {
                output.next_continuation_token().map(String::from)
            } else {
                None
            };
            Ok(ListPage { objects, next })
        })
    }

    /// Upload a local file. Files larger than one part go through multipart
    /// upload; empty files become bodyless puts.
    pub fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        storage_class: Option<StorageClass>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<u64> {
        self.handle.block_on(async {
            let size = tokio::fs::metadata(path)
                .await
                .map_err(|e| SyncError::io(path, e))?
                .len();
            if size == 0 {
                self.put_empty(bucket, key, metadata).await?;
            } else if size > self.part_size {
                self.put_multipart(bucket, key, path, size, storage_class, metadata)
                    .await?;
            } else {
                let body = ByteStream::from_path(path)
                    .await
                    .map_err(|e| SyncError::remote("read_body", e))?;
                self.client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(body)
                    .set_storage_class(storage_class)
                    .set_metadata(metadata)
                    .send()
                    .await
                    .map_err(|e| SyncError::remote("put_object", e))?;
            }
            Ok(size)
        })
    }

    /// Upload a small in-memory body (symbolic link targets).
    pub fn put_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        storage_class: Option<StorageClass>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()> {
        self.handle.block_on(async {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(data.into())
                .set_storage_class(storage_class)
                .set_metadata(metadata)
                .send()
                .await
                .map_err(|e| SyncError::remote("put_object", e))?;
            Ok(())
        })
    }

    /// Create a bodyless object (directory markers).
    pub fn put_marker(
        &self,
        bucket: &str,
        key: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()> {
        self.handle.block_on(self.put_empty(bucket, key, metadata))
    }

    async fn put_empty(
        &self,
        bucket: &str,
        key: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .set_metadata(metadata)
            .send()
            .await
            .map_err(|e| SyncError::remote("put_object", e))?;
        Ok(())
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        size: u64,
        storage_class: Option<StorageClass>,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<()> {
        let create = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .set_storage_class(storage_class)
            .set_metadata(metadata)
            .send()
            .await
            .map_err(|e| SyncError::remote("create_multipart_upload", e))?;
        let upload_id = create
            .upload_id()
            .ok_or_else(|| SyncError::remote("create_multipart_upload", "missing upload id"))?
            .to_string();

        match self.upload_parts(bucket, key, &upload_id, path, size).await {
            Ok(parts) => {
                let completed = CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build();
                self.client
                    .complete_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(completed)
                    .send()
                    .await
                    .map_err(|e| SyncError::remote("complete_multipart_upload", e))?;
                Ok(())
            }
            Err(err) => {
                let _ = self
                    .client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await;
                Err(err)
            }
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        path: &Path,
        size: u64,
    ) -> Result<Vec<CompletedPart>> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        let mut parts = Vec::new();
        let mut part_number = 1i32;
        for (start, end) in byte_ranges(size, self.part_size) {
            let mut chunk = vec![0u8; (end - start + 1) as usize];
            file.read_exact(&mut chunk)
                .await
                .map_err(|e| SyncError::io(path, e))?;
            let uploaded = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(chunk.into())
                .send()
                .await
                .map_err(|e| SyncError::remote("upload_part", e))?;
            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(uploaded.e_tag().unwrap_or_default().to_string())
                    .build(),
            );
            part_number += 1;
        }
        Ok(parts)
    }

    /// Download an object to a local file. Objects larger than one part are
    /// fetched as a sequence of ranged requests; either way the body streams
    /// to disk chunk by chunk.
    pub fn get_to_file(&self, bucket: &str, key: &str, path: &Path, size: u64) -> Result<u64> {
        self.handle.block_on(async {
            let mut file = tokio::fs::File::create(path)
                .await
                .map_err(|e| SyncError::io(path, e))?;
            let mut written = 0u64;
            if size > self.part_size {
                for (start, end) in byte_ranges(size, self.part_size) {
                    let output = self
                        .client
                        .get_object()
                        .bucket(bucket)
                        .key(key)
                        .range(format!("bytes={start}-{end}"))
                        .send()
                        .await
                        .map_err(|e| SyncError::remote("get_object", e))?;
                    written += stream_to_file(output.body, &mut file, path).await?;
                }
            } else {
                let output = self
                    .client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| SyncError::remote("get_object", e))?;
                written += stream_to_file(output.body, &mut file, path).await?;
            }
            file.flush().await.map_err(|e| SyncError::io(path, e))?;
            Ok(written)
        })
    }

    /// Fetch a whole object body into memory (symbolic link targets).
    pub fn get_to_vec(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.handle.block_on(async {
            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| SyncError::remote("get_object", e))?;
            let body = output
                .body
                .collect()
                .await
                .map_err(|e| SyncError::remote("read_body", e))?;
            Ok(body.into_bytes().to_vec())
        })
    }

    /// Server-side copy between object locations. Callers pass `None` for
    /// directory markers; the storage class only applies to real content.
    pub fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        storage_class: Option<StorageClass>,
    ) -> Result<()> {
        self.handle.block_on(async {
            self.client
                .copy_object()
                .copy_source(format!("{src_bucket}/{src_key}"))
                .bucket(dst_bucket)
                .key(dst_key)
                .set_storage_class(storage_class)
                .send()
                .await
                .map_err(|e| SyncError::remote("copy_object", e))?;
            Ok(())
        })
    }
}

async fn stream_to_file(
    mut body: ByteStream,
    file: &mut tokio::fs::File,
    path: &Path,
) -> Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| SyncError::remote("read_body", e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        written += chunk.len() as u64;
    }
    Ok(written)
}

/// Inclusive byte ranges covering `size` bytes in `part_size` steps.
fn byte_ranges(size: u64, part_size: u64) -> Vec<(u64, u64)> {
    let mut ranges = Vec::new();
    let mut start = 0u64;
    while start < size {
        let end = (start + part_size).min(size) - 1;
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_ranges_exact_multiple() {
        assert_eq!(byte_ranges(20, 10), vec![(0, 9), (10, 19)]);
    }

    #[test]
    fn test_byte_ranges_with_remainder() {
        assert_eq!(byte_ranges(25, 10), vec![(0, 9), (10, 19), (20, 24)]);
    }

    #[test]
    fn test_byte_ranges_single_part() {
        assert_eq!(byte_ranges(5, 10), vec![(0, 4)]);
    }

    #[test]
    fn test_byte_ranges_empty() {
        assert!(byte_ranges(0, 10).is_empty());
    }
}
