//! Per-URL scraper state machine
//!
//! A scraper is a single-use unit of work: it binds one URL pulled from an
//! injected [`UrlSource`] at construction, fetches it through the
//! [`PageFetcher`] collaborator, runs the page extractor over the result,
//! and hands the link and email lists to every registered callback. After
//! reaching a terminal state a scraper is done for good.

mod fetch;

pub use fetch::{build_http_client, FetchError, HttpFetcher, PageFetcher};

use crate::extract::{extract, EmailAddress};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use url::Url;

/// Hands out the next URL to crawl, if any
pub trait UrlSource: Send + Sync {
    fn next_url(&self) -> Option<Url>;
}

/// Why a scrape finished in error
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("URL source had no URL to scrape")]
    NoUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Observable lifecycle of a scraper.
///
/// `FinishedSuccess` and `FinishedError` are terminal; no transition ever
/// leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Idle,
    Scraping,
    FinishedSuccess,
    FinishedError,
}

impl ScrapeState {
    /// Whether this state ends the scraper's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinishedSuccess | Self::FinishedError)
    }
}

type LinksCallback = Box<dyn FnOnce(Arc<Vec<Url>>) + Send>;
type EmailsCallback = Box<dyn FnOnce(Arc<Vec<EmailAddress>>) + Send>;
type ErrorCallback = Box<dyn FnOnce(Arc<ScrapeError>) + Send>;

struct Inner {
    state: ScrapeState,
    links: Arc<Vec<Url>>,
    emails: Arc<Vec<EmailAddress>>,
    error: Option<Arc<ScrapeError>>,
    pending_links: Vec<(LinksCallback, ErrorCallback)>,
    pending_emails: Vec<(EmailsCallback, ErrorCallback)>,
}

impl Inner {
    fn new(state: ScrapeState, error: Option<ScrapeError>) -> Self {
        Self {
            state,
            links: Arc::new(Vec::new()),
            emails: Arc::new(Vec::new()),
            error: error.map(Arc::new),
            pending_links: Vec::new(),
            pending_emails: Vec::new(),
        }
    }
}

/// Single-use page scraper
pub struct Scraper {
    url: Option<Url>,
    fetcher: Arc<dyn PageFetcher>,
    inner: Arc<Mutex<Inner>>,
}

impl Scraper {
    /// Creates a scraper bound to the next URL from the source.
    ///
    /// If the source yields nothing, the scraper lands directly in
    /// `FinishedError` with [`ScrapeError::NoUrl`]; it never enters
    /// `Scraping`.
    pub fn new(source: &dyn UrlSource, fetcher: Arc<dyn PageFetcher>) -> Self {
        let url = source.next_url();

        let inner = match &url {
            Some(url) => {
                tracing::debug!(url = %url, "scraper created");
                Inner::new(ScrapeState::Idle, None)
            }
            None => Inner::new(ScrapeState::FinishedError, Some(ScrapeError::NoUrl)),
        };

        Self {
            url,
            fetcher,
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// The provenance of this scraper's results: the bound URL, or
    /// `"[none]"` when the source came up empty.
    pub fn source(&self) -> String {
        self.url
            .as_ref()
            .map_or_else(|| "[none]".to_string(), |u| u.to_string())
    }

    /// Current state
    pub fn state(&self) -> ScrapeState {
        self.inner.lock().unwrap().state
    }

    /// Kicks off the fetch. Valid only from `Idle`.
    ///
    /// # Panics
    ///
    /// Calling this on a scraper that has already run is a violated
    /// state-machine precondition and panics.
    pub fn start(&self) {
        let mut inner = self.inner.lock().unwrap();
        assert!(
            inner.state == ScrapeState::Idle,
            "start() called on a scraper that has already run (state: {:?})",
            inner.state
        );
        self.begin_locked(&mut inner);
    }

    /// Registers callbacks for the link list.
    ///
    /// If the scraper is already terminal the matching callback fires
    /// synchronously; otherwise it is queued and fires exactly once at the
    /// terminal transition. A call from `Idle` lazily starts the scrape.
    pub fn request_links<D, E>(&self, on_done: D, on_error: E)
    where
        D: FnOnce(Arc<Vec<Url>>) + Send + 'static,
        E: FnOnce(Arc<ScrapeError>) + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            ScrapeState::FinishedSuccess => {
                let links = Arc::clone(&inner.links);
                drop(inner);
                on_done(links);
            }
            ScrapeState::FinishedError => {
                let error = Arc::clone(inner.error.as_ref().expect("terminal error state"));
                drop(inner);
                on_error(error);
            }
            ScrapeState::Scraping => {
                inner
                    .pending_links
                    .push((Box::new(on_done), Box::new(on_error)));
            }
            ScrapeState::Idle => {
                inner
                    .pending_links
                    .push((Box::new(on_done), Box::new(on_error)));
                self.begin_locked(&mut inner);
            }
        }
    }

    /// Registers callbacks for the email list; same contract as
    /// [`request_links`](Self::request_links).
    pub fn request_emails<D, E>(&self, on_done: D, on_error: E)
    where
        D: FnOnce(Arc<Vec<EmailAddress>>) + Send + 'static,
        E: FnOnce(Arc<ScrapeError>) + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            ScrapeState::FinishedSuccess => {
                let emails = Arc::clone(&inner.emails);
                drop(inner);
                on_done(emails);
            }
            ScrapeState::FinishedError => {
                let error = Arc::clone(inner.error.as_ref().expect("terminal error state"));
                drop(inner);
                on_error(error);
            }
            ScrapeState::Scraping => {
                inner
                    .pending_emails
                    .push((Box::new(on_done), Box::new(on_error)));
            }
            ScrapeState::Idle => {
                inner
                    .pending_emails
                    .push((Box::new(on_done), Box::new(on_error)));
                self.begin_locked(&mut inner);
            }
        }
    }

    /// Transitions `Idle -> Scraping` and spawns the fetch task. Caller
    /// holds the state lock.
    fn begin_locked(&self, inner: &mut Inner) {
        debug_assert!(inner.state == ScrapeState::Idle);
        inner.state = ScrapeState::Scraping;

        let url = self.url.clone().expect("Idle scraper always has a URL");
        tracing::info!(url = %url, "starting scrape");

        let fetcher = Arc::clone(&self.fetcher);
        let shared = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match fetcher.fetch(&url).await {
                Ok(text) => {
                    // Extraction runs here, on the fetch completion path
                    let result = extract(&text, &url);
                    tracing::debug!(
                        url = %url,
                        links = result.links.len(),
                        emails = result.emails.len(),
                        "scrape succeeded"
                    );
                    finish_success(&shared, result.links, result.emails);
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "scrape failed");
                    finish_error(&shared, ScrapeError::Fetch(e));
                }
            }
        });
    }
}

fn finish_success(shared: &Mutex<Inner>, links: Vec<Url>, emails: Vec<EmailAddress>) {
    let (links, emails, pending_links, pending_emails) = {
        let mut inner = shared.lock().unwrap();
        inner.links = Arc::new(links);
        inner.emails = Arc::new(emails);
        inner.state = ScrapeState::FinishedSuccess;
        (
            Arc::clone(&inner.links),
            Arc::clone(&inner.emails),
            std::mem::take(&mut inner.pending_links),
            std::mem::take(&mut inner.pending_emails),
        )
    };

    // Callbacks run outside the lock; they may re-enter the scraper
    for (on_done, _) in pending_links {
        on_done(Arc::clone(&links));
    }
    for (on_done, _) in pending_emails {
        on_done(Arc::clone(&emails));
    }
}

fn finish_error(shared: &Mutex<Inner>, error: ScrapeError) {
    let (error, pending_links, pending_emails) = {
        let mut inner = shared.lock().unwrap();
        let error = Arc::new(error);
        inner.error = Some(Arc::clone(&error));
        inner.state = ScrapeState::FinishedError;
        (
            error,
            std::mem::take(&mut inner.pending_links),
            std::mem::take(&mut inner.pending_emails),
        )
    };

    for (_, on_error) in pending_links {
        on_error(Arc::clone(&error));
    }
    for (_, on_error) in pending_emails {
        on_error(Arc::clone(&error));
    }
}
