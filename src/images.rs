use std::collections::HashMap;
use std::path::PathBuf;

use axum::body::Bytes;
use chrono::Utc;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
const RESOURCE_PREFIX: &str = "/uploads/";

/// Uploaded food images on local disk, fronted by a keyed byte cache so
/// repeated menu renders don't re-read the same file.
pub struct ImageStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Bytes>>,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn init(&self) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("create upload dir: {e}")))?;
        Ok(())
    }

    /// External URLs are stored as-is on food items; only `/uploads/...`
    /// references point at this store.
    pub fn is_external(reference: &str) -> bool {
        reference.starts_with("http://") || reference.starts_with("https://")
    }

    pub fn allowed_extension(file_name: &str) -> Option<String> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
    }

    pub fn content_type(file_name: &str) -> &'static str {
        match Self::allowed_extension(file_name).as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
    }

    /// Validate and persist an upload, returning the resource path to store
    /// on the food item.
    pub async fn store(&self, original_name: &str, bytes: Bytes) -> AppResult<String> {
        let ext = Self::allowed_extension(original_name).ok_or_else(|| {
            AppError::Validation(
                "invalid file type: only jpg, jpeg, png and gif are supported".to_string(),
            )
        })?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(
                "file too large: maximum size is 5MB".to_string(),
            ));
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let unique = Uuid::new_v4().simple().to_string();
        let file_name = format!("food_{}_{}.{}", timestamp, &unique[..8], ext);

        fs::write(self.dir.join(&file_name), &bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("write image: {e}")))?;

        self.cache.write().await.insert(file_name.clone(), bytes);
        Ok(format!("{RESOURCE_PREFIX}{file_name}"))
    }

    pub async fn load(&self, file_name: &str) -> AppResult<Bytes> {
        validate_file_name(file_name)?;

        if let Some(bytes) = self.cache.read().await.get(file_name) {
            return Ok(bytes.clone());
        }

        let bytes = match fs::read(self.dir.join(file_name)).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
            Err(e) => return Err(AppError::Internal(anyhow::anyhow!("read image: {e}"))),
        };

        self.cache
            .write()
            .await
            .insert(file_name.to_string(), bytes.clone());
        Ok(bytes)
    }

    pub async fn delete(&self, file_name: &str) -> AppResult<()> {
        validate_file_name(file_name)?;
        self.cache.write().await.remove(file_name);

        match fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!("delete image: {e}"))),
        }
    }
}

fn validate_file_name(file_name: &str) -> AppResult<()> {
    if file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
    {
        return Err(AppError::NotFound);
    }
    Ok(())
}
