/// Per-call record carrying parallelism hints and diagnostic labeling.
///
/// A `Context` is built fresh for each public call (from a `Descriptor`,
/// see `descriptor::descriptor_get`) and never outlives it — it carries
/// no long-lived state.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Maximum number of worker threads to use; `0` means "let the engine
    /// decide".
    pub nthreads_max: usize,
    /// Target chunk size (in entries) for splitting parallel work.
    pub chunk: usize,
    /// Name of the public function this call originated from, used only
    /// for error messages.
    pub where_fn_name: &'static str,
}

impl Context {
    /// Build a context for `where_fn_name` using the global default
    /// thread count and chunk size.
    pub fn new(where_fn_name: &'static str) -> Context {
        let cfg = crate::config::global();
        Context {
            nthreads_max: cfg.default_nthreads,
            chunk: cfg.default_chunk,
            where_fn_name,
        }
    }

    /// Number of worker threads this call should use, given `work` items
    /// and this context's `chunk` hint: `min(nthreads_max,
    /// ceil(work/chunk))`.
    pub fn nthreads_for_work(&self, work: usize) -> usize {
        if work == 0 || self.chunk == 0 {
            return 1;
        }
        let by_chunks = work.div_ceil(self.chunk);
        self.nthreads_max.max(1).min(by_chunks.max(1))
    }
}
