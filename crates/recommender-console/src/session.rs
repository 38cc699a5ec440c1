//! Search session: query, current results, loading flag and global error.
//!
//! Transitions never perform I/O. A user action returns the `Command` the
//! caller should execute; the caller feeds the outcome back as an `Event`.

use recommender_common::error::ClientError;
use recommender_common::model::{GenerateDescriptionRequest, Product, RecommendRequest};
use tracing::{debug, info, warn};

use crate::model::{ListId, Query, ResultItem, SearchSeq};
use crate::results::{GenerateApplied, GenerateTicket, ResultList};

pub const NOT_FOUND_MESSAGE: &str = "Product not found. Try another title.";
pub const SEARCH_FAILED_MESSAGE: &str = "Product not found or an error occurred. Try another title.";

/// Inputs to the recommend page state machine.
#[derive(Debug)]
pub enum Event {
    /// The user submitted raw search text.
    Search(String),
    SearchCompleted {
        seq: SearchSeq,
        outcome: Result<Vec<Product>, ClientError>,
    },
    /// The user asked for a generated description of the item at `position`.
    Generate { position: usize },
    GenerateCompleted {
        ticket: GenerateTicket,
        outcome: Result<String, ClientError>,
    },
}

/// Requests the session wants issued against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Recommend { seq: SearchSeq, query: Query, top_k: usize },
    GenerateDescription(GenerateTicket),
}

impl Command {
    pub fn recommend_request(query: &Query, top_k: usize) -> RecommendRequest {
        RecommendRequest {
            query: query.as_str().to_string(),
            top_k,
        }
    }

    pub fn generate_request(ticket: &GenerateTicket) -> GenerateDescriptionRequest {
        GenerateDescriptionRequest {
            uniq_id: ticket.uniq_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSession {
    top_k: usize,
    query: Option<Query>,
    results: ResultList,
    loading: bool,
    error: Option<String>,
    latest: SearchSeq,
}

impl SearchSession {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            query: None,
            results: ResultList::empty(),
            loading: false,
            error: None,
            latest: SearchSeq::INITIAL,
        }
    }

    /// Last submitted query, if any.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn results(&self) -> &ResultList {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Apply one event and return the successor state with the command to run.
    pub fn step(mut self, event: Event) -> (Self, Option<Command>) {
        let command = self.apply(event);
        (self, command)
    }

    /// In-place form of [`SearchSession::step`].
    pub fn apply(&mut self, event: Event) -> Option<Command> {
        match event {
            Event::Search(raw) => self.search(&raw),
            Event::SearchCompleted { seq, outcome } => {
                self.complete_search(seq, outcome);
                None
            }
            Event::Generate { position } => self.generate(position),
            Event::GenerateCompleted { ticket, outcome } => {
                self.complete_generate(&ticket, outcome);
                None
            }
        }
    }

    /// Start a search. Blank input changes nothing and issues nothing.
    ///
    /// A search submitted while another is outstanding supersedes it.
    pub fn search(&mut self, raw: &str) -> Option<Command> {
        let Some(query) = Query::parse(raw) else {
            debug!("ignoring blank query");
            return None;
        };
        if self.loading {
            debug!(superseded = %self.latest, "search superseded by a newer query");
        }

        let seq = self.latest.next();
        self.latest = seq;
        self.loading = true;
        self.error = None;
        self.query = Some(query.clone());
        info!(seq = %seq, query = %query, top_k = self.top_k, "searching");

        Some(Command::Recommend {
            seq,
            query,
            top_k: self.top_k,
        })
    }

    /// Apply a search response. Responses for anything but the latest issued
    /// search are dropped and leave loading untouched.
    pub fn complete_search(&mut self, seq: SearchSeq, outcome: Result<Vec<Product>, ClientError>) {
        if seq != self.latest {
            debug!(seq = %seq, latest = %self.latest, "discarding stale search response");
            return;
        }

        match outcome {
            Ok(products) => {
                info!(seq = %seq, results = products.len(), "search completed");
                let found = !products.is_empty();
                self.replace_results(ListId::from(seq), products);
                if !found {
                    self.error = Some(NOT_FOUND_MESSAGE.to_string());
                }
            }
            Err(e) => {
                warn!(seq = %seq, error = %e, "search failed");
                self.error = Some(SEARCH_FAILED_MESSAGE.to_string());
            }
        }
        self.loading = false;
    }

    /// The single place results are replaced. The new list carries a fresh
    /// augmentation state, so nothing from the previous list survives.
    fn replace_results(&mut self, id: ListId, products: Vec<Product>) {
        let items = products.into_iter().map(ResultItem::from).collect();
        self.results = ResultList::new(id, items);
        debug_assert!(self.results.augmentation().is_empty());
    }

    pub fn generate(&mut self, position: usize) -> Option<Command> {
        self.results
            .begin_generate(position)
            .map(Command::GenerateDescription)
    }

    /// Failures stay local to the item; the global error is never touched.
    pub fn complete_generate(
        &mut self,
        ticket: &GenerateTicket,
        outcome: Result<String, ClientError>,
    ) -> GenerateApplied {
        self.results.finish_generate(ticket, outcome)
    }
}
