// # Import Module
//
// Search-then-import orchestration over the Discogs catalog:
//
// - **ImportWorkflow**: debounced search, barcode lookup, pagination, selection
// - **ImportState**: observable state for a UI, via `subscribe()`

mod workflow;

pub use workflow::{ImportPhase, ImportState, ImportWorkflow, Outcome, SearchMode, SEARCH_DEBOUNCE};
