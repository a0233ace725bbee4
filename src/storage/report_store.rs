use crate::config::StorageConfig;
use crate::types::{AppError, AppResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Sidecar metadata stored next to every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReportMetadata {
    topic: String,
    timestamp: String,
    filename: String,
    user_id: String,
}

/// Listing entry for a stored report.
#[derive(Debug, Clone, Serialize)]
pub struct SavedReport {
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub filename: String,
    pub path: String,
}

pub struct ReportStore {
    bucket: Box<Bucket>,
}

impl ReportStore {
    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let credentials = match (&config.s3_access_key_id, &config.s3_secret_access_key) {
            (Some(access_key), Some(secret_key)) => Credentials::new(
                Some(access_key.as_str()),
                Some(secret_key.as_str()),
                None,
                None,
                None,
            ),
            _ => Credentials::default(),
        }
        .map_err(|e| AppError::Storage(format!("S3 credentials: {}", e)))?;

        let region = match &config.s3_endpoint {
            Some(endpoint) => Region::Custom {
                region: config.s3_region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .s3_region
                .parse()
                .map_err(|e| AppError::Storage(format!("S3 region: {}", e)))?,
        };

        let bucket = Bucket::new(&config.s3_bucket, region, credentials)
            .map_err(|e| AppError::Storage(format!("S3 bucket: {}", e)))?
            .with_path_style();

        Ok(Self {
            bucket: Box::new(bucket),
        })
    }

    /// Upload a report plus its metadata sidecar. Returns the stored path.
    pub async fn save(&self, user_id: &str, topic: &str, content: &str) -> AppResult<String> {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let file_name = report_file_name(topic, &timestamp);
        let file_path = format!("{}/{}", user_id, file_name);

        info!(path = %file_path, "uploading report");
        let response = self
            .bucket
            .put_object(&file_path, content.as_bytes())
            .await
            .map_err(|e| AppError::Storage(format!("upload failed: {}", e)))?;
        if response.status_code() >= 300 {
            return Err(AppError::Storage(format!(
                "upload failed with status {}",
                response.status_code()
            )));
        }

        let metadata = ReportMetadata {
            topic: topic.to_string(),
            timestamp,
            filename: file_name,
            user_id: user_id.to_string(),
        };
        let metadata_path = format!("{}.meta.json", file_path);
        let metadata_bytes = serde_json::to_vec(&metadata)
            .map_err(|e| AppError::Internal(format!("metadata serialization: {}", e)))?;
        if let Err(e) = self.bucket.put_object(&metadata_path, &metadata_bytes).await {
            // The report itself made it; a missing sidecar only hides it
            // from the listing.
            warn!(path = %metadata_path, error = %e, "metadata upload failed");
        }

        Ok(file_path)
    }

    /// List a user's saved reports, newest first, from the metadata
    /// sidecars. Unreadable sidecars are skipped.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<SavedReport>> {
        let prefix = format!("{}/", user_id);
        let pages = self
            .bucket
            .list(prefix.clone(), None)
            .await
            .map_err(|e| AppError::Storage(format!("list failed: {}", e)))?;

        let mut reports = Vec::new();
        for page in pages {
            for object in page.contents {
                if !object.key.ends_with(".meta.json") {
                    continue;
                }
                let data = match self.bucket.get_object(&object.key).await {
                    Ok(data) => data,
                    Err(e) => {
                        warn!(key = %object.key, error = %e, "skipping unreadable metadata");
                        continue;
                    }
                };
                let metadata: ReportMetadata = match serde_json::from_slice(data.as_slice()) {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(key = %object.key, error = %e, "skipping malformed metadata");
                        continue;
                    }
                };
                let Some(timestamp) = parse_timestamp(&metadata.timestamp) else {
                    warn!(key = %object.key, "skipping metadata with bad timestamp");
                    continue;
                };
                reports.push(SavedReport {
                    path: format!("{}{}", prefix, metadata.filename),
                    topic: metadata.topic,
                    timestamp,
                    filename: metadata.filename,
                });
            }
        }

        reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(reports)
    }

    /// Download one report's markdown content.
    pub async fn get(&self, user_id: &str, filename: &str) -> AppResult<String> {
        let path = object_path(user_id, filename);
        let data = self
            .bucket
            .get_object(&path)
            .await
            .map_err(|e| AppError::Storage(format!("download failed: {}", e)))?;
        if data.status_code() == 404 {
            return Err(AppError::NotFound(format!("report {}", filename)));
        }
        String::from_utf8(data.as_slice().to_vec())
            .map_err(|e| AppError::Storage(format!("report is not valid UTF-8: {}", e)))
    }

    /// Delete a report and its metadata sidecar. A missing sidecar is not
    /// an error.
    pub async fn delete(&self, user_id: &str, filename: &str) -> AppResult<bool> {
        let path = object_path(user_id, filename);
        self.bucket
            .delete_object(&path)
            .await
            .map_err(|e| AppError::Storage(format!("delete failed: {}", e)))?;

        let metadata_path = format!("{}.meta.json", path);
        if let Err(e) = self.bucket.delete_object(&metadata_path).await {
            warn!(path = %metadata_path, error = %e, "could not delete metadata");
        }

        info!(path = %path, "report deleted");
        Ok(true)
    }
}

/// `{safe_topic}_{ts}.md`, with separators that are unsafe in object keys
/// replaced.
fn report_file_name(topic: &str, timestamp: &str) -> String {
    let safe_topic = topic.replace(' ', "_").replace('/', "_");
    format!("{}_{}.md", safe_topic, timestamp)
}

/// A filename that already carries a folder is used as-is; otherwise it is
/// resolved inside the user's folder.
fn object_path(user_id: &str, filename: &str) -> String {
    if filename.contains('/') {
        filename.to_string()
    } else {
        format!("{}/{}", user_id, filename)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
