// src/progress.rs
/// Progress reporting for paged loads. Frontends implement this to surface
/// status; the library only calls it.
pub trait Progress {
    /// Called once the total page count is known.
    fn begin(&mut self, _pages: u32) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Called after one page is ingested.
    fn page_done(&mut self, _page: u32, _records: usize) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
