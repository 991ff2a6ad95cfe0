use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::table::Generation;

/// Holder of the most recent successful generation.
///
/// Writers replace the whole generation with one atomic pointer swap, so a
/// reader sees either the previous generation or the next one, never a mix.
pub struct PublishedState {
    current: ArcSwapOption<Generation>,
}

impl PublishedState {
    /// Create an empty state; nothing is published until the first good cycle
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// Swap in a new generation and return the shared handle to it
    pub fn publish(&self, generation: Generation) -> Arc<Generation> {
        let generation = Arc::new(generation);
        self.current.store(Some(Arc::clone(&generation)));
        generation
    }

    /// Get the current generation, if any
    pub fn load(&self) -> Option<Arc<Generation>> {
        self.current.load_full()
    }

    /// Whether a generation has been published yet
    pub fn is_empty(&self) -> bool {
        self.current.load().is_none()
    }
}

impl Default for PublishedState {
    fn default() -> Self {
        Self::new()
    }
}
