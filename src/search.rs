//! Hero search commands.
//!
//! Each invocation behaves like a page load: the overlay is mounted from
//! the session file (restoring an open search without re-fetching), one
//! action is applied, and the overlay is printed.

use anyhow::Result;

use dockyard_assist_core::dispatch::{QueryDispatcher, Surface};
use dockyard_assist_core::search::{OverlayView, SearchOverlay, POPULAR_SEARCHES};
use dockyard_assist_core::session::KeyedSessionRepository;

use crate::client::HttpBackend;
use crate::config::Config;
use crate::output::format_overlay;
use crate::storage::FileStorage;

pub type FileSessionRepository = KeyedSessionRepository<FileStorage>;

/// What to do with the overlay after mounting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// Show whatever was restored.
    Show,
    /// Submit a query to the backend.
    Submit(String),
    /// Open a suggested query without fetching.
    Popular(String),
    /// Close the overlay and forget the session.
    Close,
}

/// A mounted overlay backed by the configured session file.
pub fn mount_overlay(config: &Config) -> SearchOverlay<FileSessionRepository> {
    let storage = FileStorage::new(&config.session.path);
    let mut overlay = SearchOverlay::new(KeyedSessionRepository::new(
        storage,
        &config.session.namespace,
    ));
    overlay.mount();
    overlay
}

/// Matches `name` against popular search labels or queries, ignoring case.
/// Unknown names are used as the query verbatim.
pub fn resolve_popular(name: &str) -> String {
    POPULAR_SEARCHES
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(name) || p.query.eq_ignore_ascii_case(name))
        .map(|p| p.query.to_string())
        .unwrap_or_else(|| name.to_string())
}

pub async fn run_search(config: &Config, action: SearchAction) -> Result<()> {
    let mut overlay = mount_overlay(config);

    match action {
        SearchAction::Show => {}
        SearchAction::Submit(query) => {
            let dispatcher =
                QueryDispatcher::new(HttpBackend::from_config(config)?, Surface::Search);
            overlay.set_input(query);
            overlay.search(&dispatcher).await;
        }
        SearchAction::Popular(name) => {
            overlay.popular_search(&resolve_popular(&name));
        }
        SearchAction::Close => {
            overlay.close();
            println!("Search closed.");
            return Ok(());
        }
    }

    match overlay.view() {
        OverlayView::Hidden => println!("No active search."),
        view => {
            println!("Results for \"{}\":\n", overlay.current_query());
            println!("{}", format_overlay(&view));
        }
    }
    Ok(())
}

pub fn list_popular() {
    for p in POPULAR_SEARCHES.iter() {
        println!("{:<24} {}", p.label, p.query);
    }
}
