//! `gallery-viewer` -- terminal browser for a gallery backend.
//!
//! Pages through the backend's item listing with a cursor-paginated feed,
//! keeps items fresh from the realtime notifier, and edits tags. Reads one
//! command per line from stdin; `help` lists them. Logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable                       | Required | Default                         | Description                    |
//! |--------------------------------|----------|---------------------------------|--------------------------------|
//! | `GALLERY_API_URL`              | yes      | --                              | Backend base URL               |
//! | `GALLERY_WS_URL`               | no       | derived from `GALLERY_API_URL`  | Realtime notifier endpoint     |
//! | `GALLERY_TOKEN`                | no       | anonymous                       | Bearer token; enables tagging  |
//! | `GALLERY_PAGE_SIZE`            | no       | `60`                            | Items per page (1-500)         |
//! | `GALLERY_REQUEST_TIMEOUT_SECS` | no       | `30`                            | HTTP request timeout           |

use std::sync::Arc;

use anyhow::Context;
use gallery_client::api::GalleryApi;
use gallery_client::client::NotifierClient;
use gallery_client::config::ClientConfig;
use gallery_client::notifier::RealtimeNotifier;
use gallery_client::reconnect::default_reconnect_backoff;
use gallery_core::context::ViewingContext;
use gallery_core::types::{ItemId, TagId};
use gallery_events::EventBus;
use gallery_feed::driver::{self, DriverReport};
use gallery_feed::live::{LiveRefresher, LiveUpdate};
use gallery_feed::tags::{TagEditor, TagStore, ToggleOutcome};
use gallery_feed::{FeedController, FetchOutcome, ItemLookup};
use gallery_viewer::command::{Command, CommandError, HELP};
use gallery_viewer::context::next_context;
use gallery_viewer::render;
use gallery_viewer::session::handle_rejection;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pending sentinel edges; extra edges are dropped while the buffer is full.
const SENTINEL_BUFFER: usize = 4;

type Feed = FeedController<Arc<GalleryApi>>;

struct Viewer {
    api: Arc<GalleryApi>,
    bus: Arc<EventBus>,
    feed: Arc<Feed>,
    sentinel: mpsc::Sender<()>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gallery_viewer=info,gallery_feed=info,gallery_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env().context("Invalid gallery configuration")?;
    tracing::info!(
        api_url = %config.api_url,
        ws_url = %config.ws_url,
        page_size = config.page_size,
        authenticated = config.token.is_some(),
        "Starting gallery-viewer",
    );

    let api = Arc::new(GalleryApi::from_config(&config).context("Failed to build HTTP client")?);
    let bus = Arc::new(EventBus::default());
    let feed = Arc::new(FeedController::new(
        Arc::clone(&api),
        ViewingContext::default(),
        config.page_size,
    ));
    let cancel = CancellationToken::new();

    // --- Realtime notifier and live refreshes ---

    let notifier = RealtimeNotifier::start(
        NotifierClient::new(config.ws_url.clone(), config.token.clone()),
        default_reconnect_backoff(),
    );
    let refresher = Arc::new(LiveRefresher::new(Arc::clone(&api), Arc::clone(&bus)));
    let live_updates = refresher.subscribe();
    let refresher_handle = tokio::spawn({
        let refresher = Arc::clone(&refresher);
        let events = notifier.subscribe();
        let cancel = cancel.clone();
        async move { refresher.run(events, cancel).await }
    });
    let live_handle = tokio::spawn(print_live_updates(
        live_updates,
        Arc::clone(&feed),
        cancel.clone(),
    ));

    // --- Sentinel driver ---

    let (sentinel_tx, sentinel_rx) = mpsc::channel(SENTINEL_BUFFER);
    let (report_tx, report_rx) = mpsc::channel(SENTINEL_BUFFER);
    let driver_handle = tokio::spawn(driver::run(
        Arc::clone(&feed),
        sentinel_rx,
        report_tx,
        cancel.clone(),
    ));
    let report_handle = tokio::spawn(print_reports(
        report_rx,
        Arc::clone(&feed),
        Arc::clone(&api),
        sentinel_tx.clone(),
    ));

    let viewer = Viewer {
        api,
        bus,
        feed,
        sentinel: sentinel_tx,
    };
    viewer.edge();

    prompt_loop(&viewer).await?;

    // --- Shutdown ---

    tracing::info!("Shutting down");
    cancel.cancel();
    notifier.shutdown().await;
    drop(viewer);
    for (name, handle) in [
        ("refresher", refresher_handle),
        ("live", live_handle),
        ("driver", driver_handle),
        ("reports", report_handle),
    ] {
        if let Err(e) = handle.await {
            tracing::warn!(task = name, error = %e, "Background task ended abnormally");
        }
    }
    Ok(())
}

async fn prompt_loop(viewer: &Viewer) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT (Ctrl-C)");
                return Ok(());
            }
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };

        // EOF
        let Some(line) = line else {
            return Ok(());
        };

        match line.parse::<Command>() {
            Ok(Command::Quit) => return Ok(()),
            Ok(command) => viewer.handle(command).await,
            Err(CommandError::Empty) => {}
            Err(e) => println!("{e}"),
        }
    }
}

impl Viewer {
    /// Signal that the end of the list is visible.
    fn edge(&self) {
        if self.sentinel.try_send(()).is_err() {
            tracing::debug!("Sentinel buffer full, edge dropped");
        }
    }

    async fn handle(&self, command: Command) {
        if let Some(context) = next_context(&self.feed.context(), &command) {
            self.feed.reset(context);
            self.edge();
            return;
        }

        match command {
            Command::More => {
                if self.feed.has_more() {
                    self.edge();
                } else {
                    println!("{}", render::summary(&self.feed.snapshot()));
                }
            }
            Command::Reload => {
                self.feed.reload();
                self.edge();
            }
            Command::Show => {
                let snapshot = self.feed.snapshot();
                for item in &snapshot.items {
                    println!("{}", render::item_line(item));
                }
                println!("{}", render::summary(&snapshot));
            }
            Command::Open(id) => self.open(id).await,
            Command::Tags(id) => self.show_tags(id).await,
            Command::Tag(item_id, tag_id) => self.toggle_tag(item_id, tag_id).await,
            Command::Help => println!("{HELP}"),
            // Context commands that changed nothing, and Quit, which the
            // prompt loop handles.
            Command::Sort(..) | Command::Search(_) | Command::Filter(_) | Command::Quit => {}
        }
    }

    async fn open(&self, id: ItemId) {
        let item = match self.feed.get(id) {
            Some(item) => item,
            None => match self.api.fetch_item(id).await {
                Ok(item) => item,
                Err(e) => {
                    println!("Could not load item {id}: {e}");
                    return;
                }
            },
        };

        println!("{}", render::item_line(&item));
        if let Some(path) = item.path() {
            println!("  path: {path}");
        }
        let (prev, next) = self.feed.neighbours(id);
        if let Some(prev) = prev {
            println!("  prev: {}", render::item_line(&prev));
        }
        if let Some(next) = next {
            println!("  next: {}", render::item_line(&next));
        }
    }

    async fn show_tags(&self, item_id: ItemId) {
        match self.api.fetch_tags(item_id).await {
            Ok(tags) if tags.is_empty() => println!("Item {item_id} has no tags"),
            Ok(tags) => {
                for tag in &tags {
                    println!("{}", render::tag_line(tag, true));
                }
            }
            Err(e) => println!("Could not load tags for item {item_id}: {e}"),
        }
    }

    async fn toggle_tag(&self, item_id: ItemId, tag_id: TagId) {
        let mut editor = match TagEditor::load(
            Arc::clone(&self.api),
            Arc::clone(&self.bus),
            item_id,
            self.api.is_authenticated(),
        )
        .await
        {
            Ok(editor) => editor,
            Err(e) => {
                println!("Could not load tags for item {item_id}: {e}");
                return;
            }
        };

        match editor.toggle_and_commit(tag_id).await {
            Ok(ToggleOutcome::Applied { active }) => {
                let verb = if active { "added to" } else { "removed from" };
                println!("Tag {tag_id} {verb} item {item_id}");
            }
            Ok(ToggleOutcome::SearchFor(tag_id)) => self.search_for_tag(item_id, tag_id).await,
            Err(e) => println!("{e}"),
        }
    }

    /// Read-only sessions turn a tag click into a search for that tag.
    async fn search_for_tag(&self, item_id: ItemId, tag_id: TagId) {
        let tags = match self.api.fetch_tags(item_id).await {
            Ok(tags) => tags,
            Err(e) => {
                println!("Could not load tags for item {item_id}: {e}");
                return;
            }
        };
        let Some(tag) = tags.iter().find(|t| t.id == tag_id) else {
            println!("Item {item_id} has no tag {tag_id}");
            return;
        };

        let context = self.feed.context().with_search(tag.search_expression());
        println!("Searching for {}", tag.search_expression());
        self.feed.reset(context);
        self.edge();
    }
}

async fn print_reports(
    mut reports: mpsc::Receiver<DriverReport>,
    feed: Arc<Feed>,
    api: Arc<GalleryApi>,
    sentinel: mpsc::Sender<()>,
) {
    while let Some(report) = reports.recv().await {
        match report {
            DriverReport::Fetched(FetchOutcome::Merged { .. }) => {
                println!("{}", render::summary(&feed.snapshot()));
            }
            DriverReport::Fetched(outcome) => {
                tracing::debug!(?outcome, "Fetch produced no page");
            }
            DriverReport::Failed(e) if handle_rejection(&e, &api, &feed) => {
                println!("Session rejected by the backend, browsing anonymously");
                if sentinel.try_send(()).is_err() {
                    tracing::debug!("Sentinel buffer full, edge dropped");
                }
            }
            DriverReport::Failed(e) => {
                println!("{e} (use 'reload' to retry)");
            }
        }
    }
}

async fn print_live_updates(
    mut updates: broadcast::Receiver<LiveUpdate>,
    feed: Arc<Feed>,
    cancel: CancellationToken,
) {
    loop {
        let update = tokio::select! {
            _ = cancel.cancelled() => break,
            update = updates.recv() => update,
        };
        match update {
            Ok(LiveUpdate::Refreshed(item)) if feed.position(item.id).is_some() => {
                println!("updated: {}", render::item_line(&item));
            }
            Ok(LiveUpdate::Refreshed(item)) => {
                tracing::debug!(item_id = item.id, "Refreshed item not in the loaded feed");
            }
            Ok(LiveUpdate::Removed(id)) if feed.position(id).is_some() => {
                println!("removed: #{id}");
            }
            Ok(LiveUpdate::Removed(_)) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Live update printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
