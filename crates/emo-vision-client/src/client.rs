//! Interpretation client trait.

use std::sync::Arc;

use async_trait::async_trait;
use emo_models::{Interpretation, PreparedImage};

use crate::error::ClientResult;

/// Remote model that turns a frame into a natural-language interpretation.
#[async_trait]
pub trait InterpretationClient: Send + Sync {
    async fn interpret(&self, image: &PreparedImage, context: &str) -> ClientResult<Interpretation>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "interpretation"
    }
}

#[async_trait]
impl<T: InterpretationClient + ?Sized> InterpretationClient for Arc<T> {
    async fn interpret(&self, image: &PreparedImage, context: &str) -> ClientResult<Interpretation> {
        (**self).interpret(image, context).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
