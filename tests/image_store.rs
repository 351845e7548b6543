use axum::body::Bytes;
use uuid::Uuid;

use canteen_api::error::AppError;
use canteen_api::images::{ImageStore, MAX_IMAGE_BYTES};

async fn temp_store() -> ImageStore {
    let dir = std::env::temp_dir().join(format!("canteen-images-{}", Uuid::new_v4()));
    let store = ImageStore::new(dir);
    store.init().await.expect("init upload dir");
    store
}

#[tokio::test]
async fn upload_roundtrip_and_cache() {
    let store = temp_store().await;
    let payload = Bytes::from_static(b"not really a png");

    let resource = store.store("lunch.png", payload.clone()).await.unwrap();
    assert!(resource.starts_with("/uploads/food_"));
    assert!(resource.ends_with(".png"));

    let file = resource.strip_prefix("/uploads/").unwrap();
    let loaded = store.load(file).await.unwrap();
    assert_eq!(loaded, payload);
}

#[tokio::test]
async fn rejects_disallowed_extensions() {
    let store = temp_store().await;
    for name in ["menu.pdf", "script.sh", "noextension", "image.png.exe"] {
        let err = store
            .store(name, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{name}");
    }

    // Extension matching is case-insensitive.
    assert!(ImageStore::allowed_extension("PHOTO.JPG").is_some());
    assert!(ImageStore::allowed_extension("photo.jpeg").is_some());
    assert!(ImageStore::allowed_extension("photo.gif").is_some());
}

#[tokio::test]
async fn rejects_oversized_uploads() {
    let store = temp_store().await;
    let payload = Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]);
    let err = store.store("big.jpg", payload).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn load_refuses_path_traversal() {
    let store = temp_store().await;
    for name in ["../etc/passwd", "a/b.png", "..", ""] {
        let err = store.load(name).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound), "{name}");
    }
}

#[tokio::test]
async fn delete_removes_file_and_cache_entry() {
    let store = temp_store().await;
    let resource = store
        .store("snack.gif", Bytes::from_static(b"gif bytes"))
        .await
        .unwrap();
    let file = resource.strip_prefix("/uploads/").unwrap().to_string();

    store.delete(&file).await.unwrap();
    let err = store.load(&file).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = store.delete(&file).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[test]
fn external_references_are_left_alone() {
    assert!(ImageStore::is_external("https://cdn.example.com/food.png"));
    assert!(ImageStore::is_external("http://cdn.example.com/food.png"));
    assert!(!ImageStore::is_external("/uploads/food_x.png"));
}

#[test]
fn content_types_match_extension() {
    assert_eq!(ImageStore::content_type("a.jpg"), "image/jpeg");
    assert_eq!(ImageStore::content_type("a.jpeg"), "image/jpeg");
    assert_eq!(ImageStore::content_type("a.png"), "image/png");
    assert_eq!(ImageStore::content_type("a.gif"), "image/gif");
    assert_eq!(ImageStore::content_type("a.bin"), "application/octet-stream");
}
