//! Single-threaded event loop tying the state machines to the backend.
//!
//! Commands run as local tasks on the current thread; their outcomes come
//! back over a channel and are applied one at a time, followed by a redraw.
//! Must be driven inside a `tokio::task::LocalSet`.

use std::io::{BufRead, Write};
use std::sync::Arc;

use recommender_common::client::Backend;
use recommender_common::error::ClientError;
use recommender_common::model::{AnalyticsSnapshot, Product};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsView, FetchAnalytics, MountId};
use crate::error::AppError;
use crate::model::SearchSeq;
use crate::render;
use crate::results::GenerateTicket;
use crate::session::{Command, Event, SearchSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Recommend,
    Analytics,
    NotFound(String),
}

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Free text: run a search.
    Submit(String),
    /// `:gen N`, stored zero-based.
    Generate(usize),
    Navigate(Route),
    Quit,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix(':') else {
            return Input::Submit(line.to_string());
        };

        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or("");
        match name {
            "q" | "quit" => Input::Quit,
            "recommend" | "/" => Input::Navigate(Route::Recommend),
            "analytics" => Input::Navigate(Route::Analytics),
            "gen" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n >= 1 => Input::Generate(n - 1),
                _ => Input::Navigate(Route::NotFound(trimmed.to_string())),
            },
            _ => Input::Navigate(Route::NotFound(trimmed.to_string())),
        }
    }
}

/// The outcome of a backend call, tagged with what it was issued for.
#[derive(Debug)]
pub enum Completion {
    Search {
        seq: SearchSeq,
        outcome: Result<Vec<Product>, ClientError>,
    },
    Generate {
        ticket: GenerateTicket,
        outcome: Result<String, ClientError>,
    },
    Analytics {
        mount: MountId,
        outcome: Result<AnalyticsSnapshot, ClientError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

enum Step {
    Line(Option<String>),
    Completion(Option<Completion>),
}

pub struct App {
    backend: Arc<dyn Backend>,
    route: Route,
    session: SearchSession,
    analytics: Option<AnalyticsView>,
    mounts: u64,
    pending: usize,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, top_k: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            route: Route::Recommend,
            session: SearchSession::new(top_k),
            analytics: None,
            mounts: 0,
            pending: 0,
            tx,
            rx,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn analytics(&self) -> Option<&AnalyticsView> {
        self.analytics.as_ref()
    }

    /// Backend calls issued and not yet applied.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn handle_input(&mut self, input: Input) -> Flow {
        match input {
            Input::Quit => return Flow::Exit,
            Input::Navigate(route) => self.navigate(route),
            Input::Submit(raw) => {
                if self.route == Route::Recommend {
                    if let Some(command) = self.session.apply(Event::Search(raw)) {
                        self.execute(command);
                    }
                } else {
                    debug!(route = ?self.route, "search input outside the recommend page");
                }
            }
            Input::Generate(position) => {
                if self.route == Route::Recommend {
                    if let Some(command) = self.session.apply(Event::Generate { position }) {
                        self.execute(command);
                    }
                } else {
                    debug!(route = ?self.route, "generate input outside the recommend page");
                }
            }
        }
        Flow::Continue
    }

    pub fn handle_completion(&mut self, completion: Completion) {
        self.pending = self.pending.saturating_sub(1);
        match completion {
            Completion::Search { seq, outcome } => {
                self.session.apply(Event::SearchCompleted { seq, outcome });
            }
            Completion::Generate { ticket, outcome } => {
                self.session.apply(Event::GenerateCompleted { ticket, outcome });
            }
            Completion::Analytics { mount, outcome } => match self.analytics.as_mut() {
                Some(view) => view.complete(mount, outcome),
                None => debug!(mount = mount.0, "analytics completion with no mounted view"),
            },
        }
    }

    /// Wait for the next backend outcome and apply it.
    /// Returns `false` when nothing is outstanding.
    pub async fn pump(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(completion) => {
                self.handle_completion(completion);
                true
            }
            None => false,
        }
    }

    pub fn render(&self) -> String {
        let page = match &self.route {
            Route::Recommend => render::recommend_page(&self.session),
            Route::Analytics => match &self.analytics {
                Some(view) => render::analytics_page(view),
                None => render::not_found_page("/analytics"),
            },
            Route::NotFound(path) => render::not_found_page(path),
        };
        format!("{}\n\n{page}", render::nav_bar(&self.route))
    }

    /// Consume input lines until `:quit` or until the sender closes, redrawing
    /// after every state change. Outstanding calls are applied before
    /// returning when input closes.
    pub async fn run<W: Write>(
        mut self,
        mut lines: mpsc::Receiver<String>,
        out: &mut W,
    ) -> Result<(), AppError> {
        self.draw(out)?;

        loop {
            let step = tokio::select! {
                line = lines.recv() => Step::Line(line),
                completion = self.rx.recv() => Step::Completion(completion),
            };
            match step {
                Step::Line(Some(line)) => {
                    if self.handle_input(Input::parse(&line)) == Flow::Exit {
                        info!("quit requested");
                        break;
                    }
                }
                Step::Line(None) => {
                    info!(pending = self.pending, "input closed");
                    while self.pump().await {
                        self.draw(out)?;
                    }
                    break;
                }
                Step::Completion(Some(completion)) => self.handle_completion(completion),
                Step::Completion(None) => break,
            }
            self.draw(out)?;
        }
        Ok(())
    }

    fn draw<W: Write>(&self, out: &mut W) -> Result<(), AppError> {
        writeln!(out, "{}", self.render())?;
        writeln!(out, "{}", "-".repeat(60))?;
        out.flush()?;
        Ok(())
    }

    /// Entering the analytics page remounts it, which refetches.
    fn navigate(&mut self, route: Route) {
        info!(route = ?route, "navigate");
        if route == Route::Analytics {
            self.mounts += 1;
            let mut view = AnalyticsView::new(MountId(self.mounts));
            let fetch = view.activate();
            self.analytics = Some(view);
            if let Some(fetch) = fetch {
                self.fetch_analytics(fetch);
            }
        } else {
            self.analytics = None;
        }
        self.route = route;
    }

    fn execute(&mut self, command: Command) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.pending += 1;
        match command {
            Command::Recommend { seq, query, top_k } => {
                let request = Command::recommend_request(&query, top_k);
                tokio::task::spawn_local(async move {
                    let outcome = backend.recommend(request).await.map(|r| r.results);
                    let _ = tx.send(Completion::Search { seq, outcome });
                });
            }
            Command::GenerateDescription(ticket) => {
                let request = Command::generate_request(&ticket);
                tokio::task::spawn_local(async move {
                    let outcome = backend
                        .generate_description(request)
                        .await
                        .map(|r| r.generated);
                    let _ = tx.send(Completion::Generate { ticket, outcome });
                });
            }
        }
    }

    fn fetch_analytics(&mut self, fetch: FetchAnalytics) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.pending += 1;
        tokio::task::spawn_local(async move {
            let outcome = backend.analytics().await;
            let _ = tx.send(Completion::Analytics {
                mount: fetch.mount,
                outcome,
            });
        });
    }
}

/// Read stdin on a dedicated thread. A blocking read parked in the runtime's
/// pool would keep the process alive after `:quit`; a detached thread does not.
pub fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>, AppError> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}
