use std::sync::Arc;

use tracing::info;

use crate::{
    compose::Compositor,
    error::{BoothError, BoothResult},
    filter::Filter,
    layout::Layout,
    loader,
    surface::Surface,
};

/// Owns the last successfully composed surface.
///
/// `render` takes `&mut self`, so a target has at most one composition in
/// flight. The stored output is replaced only after a render succeeds; an
/// error, or dropping the future early, leaves it as it was.
pub struct RenderTarget {
    compositor: Compositor,
    output: Option<Surface>,
    generation: u64,
}

impl RenderTarget {
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            output: None,
            generation: 0,
        }
    }

    pub fn output(&self) -> Option<&Surface> {
        self.output.as_ref()
    }

    /// Number of successful renders so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn take_output(&mut self) -> Option<Surface> {
        self.output.take()
    }

    /// Decodes every source, composes them into `layout` and stores the
    /// result. Nothing is composed unless all sources decode.
    #[tracing::instrument(skip_all, fields(layout = %layout.id, generation = self.generation))]
    pub async fn render<I, B>(
        &mut self,
        sources: I,
        layout: &Layout,
        filter: Option<&Filter>,
    ) -> BoothResult<&Surface>
    where
        I: IntoIterator<Item = B>,
        B: Into<Arc<[u8]>>,
    {
        let photos = loader::load_all(sources).await?;

        let compositor = self.compositor.clone();
        let layout_owned = layout.clone();
        let filter_owned = filter.cloned();
        let surface = tokio::task::spawn_blocking(move || {
            compositor.compose(&photos, &layout_owned, filter_owned.as_ref())
        })
        .await
        .map_err(|e| BoothError::composition(format!("compose task failed: {e}")))??;

        self.generation += 1;
        info!(
            generation = self.generation,
            width = surface.width(),
            height = surface.height(),
            "render complete"
        );
        Ok(&*self.output.insert(surface))
    }
}
