// # Import Workflow
//
// Drives the search-then-import sequence a collection UI walks through:
//
//   Idle -> Searching -> ResultsShown -> Selecting -> Importing -> Idle
//
// Every operation owns a CancellationToken. Starting a new operation cancels the
// previous token under the state lock, in-flight network calls race against
// `cancelled()`, and results are applied only while the token is still live.
// Nothing is persisted here; `select_result` hands finished form data back.

use crate::discogs::client::DEFAULT_PER_PAGE;
use crate::discogs::transform::{
    primary_cover_image_url, transform_release_to_vinyl_form, transform_search_result,
};
use crate::discogs::{validate_barcode, DiscogsError, DiscogsSearchResponse, ReleaseCatalog};
use crate::image_proxy::ImageProxy;
use crate::models::{PageInfo, SearchResultDisplay, VinylFormData};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Quiet period before a free-text search is sent
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

const SEARCH_FAILED: &str = "Failed to search Discogs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ImportPhase {
    #[default]
    Idle,
    Searching,
    ResultsShown,
    Selecting,
    Importing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchMode {
    Query,
    Barcode,
}

/// Everything a UI needs to render the import panel
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportState {
    pub phase: ImportPhase,
    pub query: String,
    pub mode: Option<SearchMode>,
    pub results: Vec<SearchResultDisplay>,
    pub pagination: Option<PageInfo>,
    /// Inline error for the control that triggered the last operation
    pub error: Option<String>,
    pub is_loading: bool,
}

/// How an operation ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T = ()> {
    Completed(T),
    /// A newer operation (or `clear`) took over; state was left untouched
    Superseded,
    /// Nothing to do, e.g. `load_more` on the last page
    Ignored,
    /// Input failed validation before any request was made
    Rejected,
}

struct Inner {
    state: ImportState,
    active: CancellationToken,
}

pub struct ImportWorkflow {
    catalog: Arc<dyn ReleaseCatalog>,
    image_proxy: Arc<dyn ImageProxy>,
    debounce: Duration,
    per_page: u32,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ImportState>,
}

impl ImportWorkflow {
    pub fn new(catalog: Arc<dyn ReleaseCatalog>, image_proxy: Arc<dyn ImageProxy>) -> Self {
        let (state_tx, _) = watch::channel(ImportState::default());

        Self {
            catalog,
            image_proxy,
            debounce: SEARCH_DEBOUNCE,
            per_page: DEFAULT_PER_PAGE,
            inner: Mutex::new(Inner {
                state: ImportState::default(),
                active: CancellationToken::new(),
            }),
            state_tx,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<ImportState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ImportState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Debounced free-text search. Blank text resets to idle.
    pub async fn search(&self, text: &str) -> Outcome {
        let query = text.trim().to_string();
        if query.is_empty() {
            self.clear();
            return Outcome::Completed(());
        }

        let token = self.begin(|state| {
            state.phase = ImportPhase::Searching;
            state.query = query.clone();
            state.mode = Some(SearchMode::Query);
            state.error = None;
            state.is_loading = true;
        });

        tokio::select! {
            _ = token.cancelled() => return Outcome::Superseded,
            _ = sleep(self.debounce) => {}
        }

        debug!("Debounce elapsed, searching Discogs for '{}'", query);

        let result = tokio::select! {
            _ = token.cancelled() => return Outcome::Superseded,
            result = self.catalog.search_releases(&query, 1, self.per_page) => result,
        };

        self.apply_search(&token, result, false)
    }

    /// Barcode lookup. Sent immediately, validated first.
    pub async fn search_by_barcode(&self, code: &str) -> Outcome {
        let barcode = match validate_barcode(code) {
            Ok(barcode) => barcode,
            Err(e) => {
                debug!("Rejected barcode '{}': {}", code, e);
                self.update(|state| state.error = Some(e.to_string()));
                return Outcome::Rejected;
            }
        };

        let token = self.begin(|state| {
            state.phase = ImportPhase::Searching;
            state.query = barcode.clone();
            state.mode = Some(SearchMode::Barcode);
            state.error = None;
            state.is_loading = true;
        });

        let result = tokio::select! {
            _ = token.cancelled() => return Outcome::Superseded,
            result = self.catalog.search_by_barcode(&barcode) => result,
        };

        // Barcode lookups are not paged: only the first page is ever shown
        let result = result.map(|mut response| {
            response.pagination.pages = response.pagination.page;
            response
        });

        self.apply_search(&token, result, false)
    }

    /// Fetch the next page of the current free-text search and append it
    pub async fn load_more(&self) -> Outcome {
        let (token, query, next_page) = {
            let mut inner = self.inner.lock().unwrap();
            let state = &inner.state;

            let next_page = match state.pagination {
                Some(pagination)
                    if pagination.has_more()
                        && state.phase == ImportPhase::ResultsShown
                        && state.mode == Some(SearchMode::Query) =>
                {
                    pagination.page + 1
                }
                _ => return Outcome::Ignored,
            };
            let query = state.query.clone();

            let token = Self::replace_token(&mut inner);
            inner.state.phase = ImportPhase::Searching;
            inner.state.error = None;
            inner.state.is_loading = true;
            self.publish(&inner.state);

            (token, query, next_page)
        };

        let result = tokio::select! {
            _ = token.cancelled() => return Outcome::Superseded,
            result = self.catalog.search_releases(&query, next_page, self.per_page) => result,
        };

        self.apply_search(&token, result, true)
    }

    /// Fetch a release, proxy its cover and return form data ready to save.
    ///
    /// A failed release fetch returns the error string and goes back to the
    /// result list. A failed cover proxy only drops the cover.
    pub async fn select_result(&self, release_id: u64) -> Outcome<Result<VinylFormData, String>> {
        let token = self.begin(|state| {
            state.phase = ImportPhase::Selecting;
            state.error = None;
            state.is_loading = true;
        });

        let fetched = tokio::select! {
            _ = token.cancelled() => return Outcome::Superseded,
            result = self.catalog.get_release(release_id) => result,
        };

        let release = match fetched {
            Ok(release) => release,
            Err(e) => {
                let message = e.to_string();
                warn!("Failed to fetch release {}: {}", release_id, message);
                let applied = self.apply(&token, |state| {
                    state.phase = if state.results.is_empty() {
                        ImportPhase::Idle
                    } else {
                        ImportPhase::ResultsShown
                    };
                    state.error = Some(message.clone());
                    state.is_loading = false;
                });
                return if applied {
                    Outcome::Completed(Err(message))
                } else {
                    Outcome::Superseded
                };
            }
        };

        if !self.apply(&token, |state| state.phase = ImportPhase::Importing) {
            return Outcome::Superseded;
        }

        let mut form = transform_release_to_vinyl_form(&release);

        if let Some(image_url) = primary_cover_image_url(&release) {
            let discogs_id = release.id.to_string();
            let proxied = tokio::select! {
                _ = token.cancelled() => return Outcome::Superseded,
                result = self.image_proxy.proxy_image(&image_url, Some(discogs_id.as_str())) => result,
            };

            match proxied {
                Ok(url) => form.cover_art_url = Some(url),
                Err(e) => warn!(
                    "Cover proxy failed for release {}, importing without cover: {}",
                    release_id, e
                ),
            }
        } else {
            debug!("Release {} has no images, skipping cover proxy", release_id);
        }

        if !self.apply(&token, |state| *state = ImportState::default()) {
            return Outcome::Superseded;
        }

        info!(
            "Prepared import of '{}' by '{}' (release {})",
            form.album, form.artist, release_id
        );
        Outcome::Completed(Ok(form))
    }

    /// Cancel whatever is in flight and return to idle
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        Self::replace_token(&mut inner);
        inner.state = ImportState::default();
        self.publish(&inner.state);
    }

    fn apply_search(
        &self,
        token: &CancellationToken,
        result: Result<DiscogsSearchResponse, DiscogsError>,
        append: bool,
    ) -> Outcome {
        let applied = self.apply(token, |state| {
            state.is_loading = false;
            match &result {
                Ok(response) => {
                    let page: Vec<SearchResultDisplay> = response
                        .results
                        .iter()
                        .map(transform_search_result)
                        .collect();
                    if append {
                        state.results.extend(page);
                    } else {
                        state.results = page;
                    }
                    state.pagination = Some(PageInfo {
                        page: response.pagination.page,
                        pages: response.pagination.pages,
                        total: response.pagination.items,
                    });
                    state.phase = ImportPhase::ResultsShown;
                    state.error = None;
                }
                Err(e) => {
                    state.error = Some(search_error_message(e));
                    if append {
                        state.phase = ImportPhase::ResultsShown;
                    } else {
                        state.results.clear();
                        state.pagination = None;
                        state.phase = ImportPhase::Idle;
                    }
                }
            }
        });

        if !applied {
            return Outcome::Superseded;
        }
        if let Err(e) = &result {
            warn!("Discogs search failed: {}", e);
        }
        Outcome::Completed(())
    }

    /// Cancel the active operation and start a new one
    fn begin(&self, f: impl FnOnce(&mut ImportState)) -> CancellationToken {
        let mut inner = self.inner.lock().unwrap();
        let token = Self::replace_token(&mut inner);
        f(&mut inner.state);
        self.publish(&inner.state);
        token
    }

    /// Mutate state only if `token` is still the live operation
    fn apply(&self, token: &CancellationToken, f: impl FnOnce(&mut ImportState)) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if token.is_cancelled() {
            return false;
        }
        f(&mut inner.state);
        self.publish(&inner.state);
        true
    }

    fn update(&self, f: impl FnOnce(&mut ImportState)) {
        let mut inner = self.inner.lock().unwrap();
        f(&mut inner.state);
        self.publish(&inner.state);
    }

    fn replace_token(inner: &mut Inner) -> CancellationToken {
        inner.active.cancel();
        inner.active = CancellationToken::new();
        inner.active.clone()
    }

    fn publish(&self, state: &ImportState) {
        self.state_tx.send_replace(state.clone());
    }
}

/// Transport failures get a generic message, everything else is shown as-is
fn search_error_message(err: &DiscogsError) -> String {
    match err {
        DiscogsError::Request(_) => SEARCH_FAILED.to_string(),
        other => other.to_string(),
    }
}
