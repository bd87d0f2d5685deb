//! Hero search overlay.
//!
//! Owns the search box text, the submitted query, the overlay's open flag,
//! the latest results and the loading indicator, and mirrors
//! `(current query, open)` into a [`SessionRepository`] after every change.
//!
//! # Hydration gate
//!
//! [`SearchOverlay::mount`] reads the persisted session first and only then
//! opens the gate. Transitions before that never write, so the initial
//! defaults cannot clobber the stored values. [`SearchOverlay::close`] is
//! the exception: an explicit close always clears storage.
//!
//! # Request fencing
//!
//! Each accepted search gets a sequence number. A response is applied only
//! if it is newer than the one on screen, so a slow early request cannot
//! overwrite a later one. Closing the overlay fences off everything still
//! in flight.

use tracing::{debug, info, warn};

use crate::conversation::Responder;
use crate::dispatch::Surface;
use crate::models::{Query, ResponsePayload, SearchSession};
use crate::render::{render_payload, RenderTree, NO_RESULTS_MESSAGE};
use crate::session::SessionRepository;

pub const SEARCHING_MESSAGE: &str = "Searching for answers...";

pub const CLOSE_RESULTS_LABEL: &str = "Close Results";

/// A suggested query offered under the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularSearch {
    pub label: &'static str,
    pub query: &'static str,
}

pub const POPULAR_SEARCHES: [PopularSearch; 3] = [
    PopularSearch {
        label: "Seed Funding",
        query: "Seed Funding",
    },
    PopularSearch {
        label: "Tech Mentors",
        query: "Find a mentor in tech",
    },
    PopularSearch {
        label: "Business Registration",
        query: "Business registration process",
    },
];

/// What the overlay area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayView {
    Hidden,
    Loading { message: String },
    /// An error banner; its own close control replaces the footer.
    Error(RenderTree),
    Results { body: RenderTree, close_label: String },
}

/// A search that has been accepted and is waiting for its response.
#[derive(Debug)]
#[must_use = "finish the search or the overlay stays in the loading state"]
pub struct PendingSearch {
    seq: u64,
    query: Query,
}

impl PendingSearch {
    pub fn query(&self) -> &Query {
        &self.query
    }
}

pub struct SearchOverlay<R> {
    repository: R,
    hydrated: bool,
    input: String,
    current_query: String,
    show_results: bool,
    results: Option<ResponsePayload>,
    loading: bool,
    issued: u64,
    displayed: u64,
}

impl<R: SessionRepository> SearchOverlay<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            hydrated: false,
            input: String::new(),
            current_query: String::new(),
            show_results: false,
            results: None,
            loading: false,
            issued: 0,
            displayed: 0,
        }
    }

    /// Restores a persisted session, then opens the hydration gate.
    ///
    /// A restored session reopens the overlay with its query but does not
    /// fetch; the overlay shows no results until the user searches again.
    pub fn mount(&mut self) {
        match self.repository.load() {
            Ok(Some(session)) if session.should_persist() => {
                info!(query = %session.query, "restoring search session");
                self.input = session.query.clone();
                self.current_query = session.query;
                self.show_results = true;
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "failed to load search session"),
        }
        self.hydrated = true;
        self.persist();
    }

    /// Text currently in the search box.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// The last submitted query.
    pub fn current_query(&self) -> &str {
        &self.current_query
    }

    pub fn is_open(&self) -> bool {
        self.show_results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn results(&self) -> Option<&ResponsePayload> {
        self.results.as_ref()
    }

    /// The state mirrored to storage.
    pub fn session(&self) -> SearchSession {
        SearchSession {
            query: self.current_query.clone(),
            is_active: self.show_results,
        }
    }

    /// Accepts the search box text as a new search.
    ///
    /// Returns `None` and changes nothing if the box is blank.
    pub fn begin_search(&mut self) -> Option<PendingSearch> {
        let query = Query::parse(&self.input)?;
        self.issued += 1;
        self.current_query = query.as_str().to_string();
        self.loading = true;
        self.show_results = true;
        self.persist();
        Some(PendingSearch {
            seq: self.issued,
            query,
        })
    }

    /// Applies the response for `pending` unless a newer one is showing.
    pub fn finish_search(&mut self, pending: PendingSearch, payload: ResponsePayload) {
        self.loading = false;
        if pending.seq <= self.displayed {
            debug!(
                query = %pending.query,
                seq = pending.seq,
                displayed = self.displayed,
                "discarding stale search response"
            );
            return;
        }
        self.displayed = pending.seq;
        self.results = Some(payload);
    }

    /// Runs the search in the box to completion.
    ///
    /// A responder error is shown as the overlay's failure banner. Returns
    /// false if the box was blank.
    pub async fn search<Q: Responder + ?Sized>(&mut self, responder: &Q) -> bool {
        let Some(pending) = self.begin_search() else {
            return false;
        };
        let payload = match responder.respond(pending.query()).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "search failed");
                Surface::Search.failure_payload()
            }
        };
        self.finish_search(pending, payload);
        true
    }

    /// Fills in a suggested query and opens the overlay without fetching.
    pub fn popular_search(&mut self, query: &str) {
        self.input = query.to_string();
        self.current_query = query.to_string();
        self.show_results = true;
        self.persist();
    }

    /// Resets all search state and removes the persisted session.
    pub fn close(&mut self) {
        self.show_results = false;
        self.current_query.clear();
        self.input.clear();
        self.results = None;
        self.displayed = self.issued;
        if let Err(err) = self.repository.clear() {
            warn!(error = %err, "failed to clear search session");
        }
    }

    pub fn view(&self) -> OverlayView {
        if !self.show_results {
            return OverlayView::Hidden;
        }
        if self.loading {
            return OverlayView::Loading {
                message: SEARCHING_MESSAGE.to_string(),
            };
        }
        let body = match &self.results {
            Some(payload) => render_payload(payload, Surface::Search),
            None => RenderTree::Placeholder {
                message: NO_RESULTS_MESSAGE.to_string(),
            },
        };
        match body {
            RenderTree::ErrorBanner { .. } => OverlayView::Error(body),
            body => OverlayView::Results {
                body,
                close_label: CLOSE_RESULTS_LABEL.to_string(),
            },
        }
    }

    fn persist(&self) {
        if !self.hydrated {
            return;
        }
        let session = self.session();
        let result = if session.should_persist() {
            self.repository.save(&session)
        } else {
            self.repository.clear()
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to persist search session");
        }
    }
}
