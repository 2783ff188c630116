use async_trait::async_trait;

/// Boundary for optional photo capture. Yields an opaque blob reference;
/// `None` degrades the entry to photo-less but never fails the operation.
#[async_trait]
pub trait PhotoCapture: Send + Sync {
    async fn capture(&self) -> Option<String>;
}

/// No camera attached to this deployment.
pub struct NoPhotoCapture;

#[async_trait]
impl PhotoCapture for NoPhotoCapture {
    async fn capture(&self) -> Option<String> {
        None
    }
}
