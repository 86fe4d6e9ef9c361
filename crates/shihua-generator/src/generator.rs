use async_trait::async_trait;
use shihua_core::PoemRecord;

/// Turns an image into a poem.
///
/// Implementations may be random and may take a while, but they never fail:
/// every call returns a record with non-empty title, content and author.
#[async_trait]
pub trait PoemGenerator: Send + Sync {
    async fn generate(&self, image_reference: &str) -> PoemRecord;
}
