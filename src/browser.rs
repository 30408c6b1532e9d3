use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::clients::{
    entities::Song,
    errors::{Error, FailureKind, Result},
    itunes::SongSearch,
};

/// Which response wins when searches overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Only the response to the most recently issued query is applied.
    #[default]
    LatestRequest,
    /// Every response is applied as it arrives, so the slowest one wins.
    LastArrival,
}

/// A search the state asked for. Carries the generation it was issued at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    query: String,
}

impl Ticket {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What applying a completed search did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated { count: usize },
    Failed(FailureKind),
    Discarded,
}

/// What the front end should show.
#[derive(Debug, PartialEq, Eq)]
pub enum View<'a> {
    Prompt,
    Results(&'a [Song]),
}

/// Query text and the songs currently on screen.
///
/// Both start empty. An empty query never clears `songs`, it only switches
/// the view back to the prompt.
#[derive(Debug, Default)]
pub struct BrowserState {
    query: String,
    songs: Vec<Song>,
    last_error: Option<String>,
    issued: u64,
    ordering: ResponseOrdering,
}

impl BrowserState {
    pub fn new(ordering: ResponseOrdering) -> Self {
        BrowserState {
            ordering,
            ..Default::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replaces the query text. Returns a ticket when a search must be run.
    ///
    /// Unchanged text is not an edit. Blank text issues no search but still
    /// bumps the generation, so answers to earlier queries become stale.
    pub fn set_query(&mut self, text: impl Into<String>) -> Option<Ticket> {
        let text = text.into();
        if text == self.query {
            return None;
        }
        self.query = text;
        self.issued += 1;

        if self.query.trim().is_empty() {
            debug!("Query cleared at generation {}", self.issued);
            return None;
        }
        Some(Ticket {
            generation: self.issued,
            query: self.query.clone(),
        })
    }

    pub fn apply(&mut self, ticket: &Ticket, result: Result<Vec<Song>>) -> Outcome {
        if self.ordering == ResponseOrdering::LatestRequest && ticket.generation < self.issued {
            debug!(
                "Discarding response for {:?}, generation {} < {}",
                ticket.query, ticket.generation, self.issued
            );
            return Outcome::Discarded;
        }

        match result {
            Ok(songs) => {
                let count = songs.len();
                self.songs = songs;
                self.last_error = None;
                Outcome::Updated { count }
            }
            Err(e) => {
                let kind = e.kind();
                self.last_error = Some(e.to_string());
                Outcome::Failed(kind)
            }
        }
    }

    pub fn view(&self) -> View<'_> {
        if self.query.trim().is_empty() {
            View::Prompt
        } else {
            View::Results(&self.songs)
        }
    }
}

struct Completion {
    ticket: Ticket,
    result: Result<Vec<Song>>,
}

// Reports exactly one completion per spawned search. If the task ends
// without calling `finish` (the search panicked or the task was aborted)
// the drop reports a network failure instead, so `in_flight` always drains.
struct Reporter {
    ticket: Option<Ticket>,
    sender: mpsc::UnboundedSender<Completion>,
}

impl Reporter {
    fn finish(mut self, result: Result<Vec<Song>>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<Vec<Song>>) {
        if let Some(ticket) = self.ticket.take() {
            // Receiver is gone only when the browser was dropped
            let _ = self.sender.send(Completion { ticket, result });
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if self.ticket.is_some() {
            self.send(Err(Error::NetworkError(
                "search task ended without a result".into(),
            )));
        }
    }
}

/// Drives a [`BrowserState`] with searches running in the background.
///
/// Searches are spawned onto the tokio runtime and never cancelled. Their
/// results only touch the state inside [`Browser::next_completion`], so all
/// mutation happens on whichever task owns the browser.
pub struct Browser<S> {
    state: BrowserState,
    source: Arc<S>,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl<S> Browser<S>
where
    S: SongSearch + Send + Sync + 'static,
{
    pub fn new(source: S, ordering: ResponseOrdering) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Browser {
            state: BrowserState::new(ordering),
            source: Arc::new(source),
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Updates the query and starts a search if one is needed. Returns
    /// immediately; the result arrives through `next_completion`.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        let Some(ticket) = self.state.set_query(text) else {
            return false;
        };
        info!("Searching for {:?}", ticket.query);

        let source = Arc::clone(&self.source);
        let query = ticket.query.clone();
        let reporter = Reporter {
            ticket: Some(ticket),
            sender: self.sender.clone(),
        };
        tokio::spawn(async move {
            let result = source.search(&query).await;
            reporter.finish(result);
        });
        self.in_flight += 1;
        true
    }

    /// Waits for the next search to finish and applies it. Returns `None`
    /// straight away when nothing is in flight.
    ///
    /// Cancel safe: if the future is dropped before a completion is received
    /// the completion stays queued.
    pub async fn next_completion(&mut self) -> Option<Outcome> {
        if self.in_flight == 0 {
            return None;
        }
        let Completion { ticket, result } = self.receiver.recv().await?;
        self.in_flight -= 1;

        let outcome = self.state.apply(&ticket, result);
        match outcome {
            Outcome::Updated { count } => info!("{count} songs for {:?}", ticket.query),
            Outcome::Failed(kind) => warn!("Search for {:?} failed ({kind:?})", ticket.query),
            Outcome::Discarded => {}
        }
        Some(outcome)
    }

    /// Applies every outstanding search.
    pub async fn settle(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(self.in_flight);
        while let Some(outcome) = self.next_completion().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}
