//! Native page runtime.
//!
//! Plays the browser's event loop for one [`PageApp`]: page mutations and
//! messages arrive on a channel, and the watcher's timers are slept on with
//! `tokio::time`. Everything runs on the one task, like a content script.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::app::PageApp;
use crate::dom::{MutationSource, PageDom};
use crate::managers::bookmark_repository::BookmarkRepository;
use crate::message_handler::handle_message;
use crate::types::errors::MessageError;
use crate::types::message::{ExtensionMessage, MessageReply};

type Reply = Result<Option<MessageReply>, MessageError>;

/// Something happening to the page from outside.
pub enum PageEvent<D> {
    /// The host application changes its document.
    Mutate(Box<dyn FnOnce(&mut D) + Send>),
    /// A message from the control surface.
    Message {
        message: ExtensionMessage,
        reply: oneshot::Sender<Reply>,
    },
}

fn elapsed_ms(origin: Instant) -> u64 {
    origin.elapsed().as_millis() as u64
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Runs the page until every event sender is dropped, then hands the app
/// back. Time is measured from the call.
pub async fn run_page<D, R>(mut app: PageApp<D, R>, mut events: mpsc::Receiver<PageEvent<D>>) -> PageApp<D, R>
where
    D: PageDom + MutationSource,
    R: BookmarkRepository,
{
    let origin = Instant::now();
    app.start(0);

    loop {
        let deadline = app
            .next_deadline()
            .map(|ms| origin + Duration::from_millis(ms));

        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let now = elapsed_ms(origin);
                match event {
                    PageEvent::Mutate(change) => {
                        change(app.dom_mut());
                    }
                    PageEvent::Message { message, reply } => {
                        let result = handle_message(&mut app, &message, now);
                        if reply.send(result).is_err() {
                            debug!(action = %message.action, "message sender went away");
                        }
                    }
                }
                app.pump_mutations(now);
            }
            _ = wait_for(deadline) => {
                let now = elapsed_ms(origin);
                app.pump_mutations(now);
                app.tick(now);
            }
        }
    }

    info!("page closed");
    app
}

/// Sending side of a spawned page.
pub struct PageHandle<D> {
    events: mpsc::Sender<PageEvent<D>>,
}

impl<D> Clone for PageHandle<D> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<D> PageHandle<D> {
    /// Applies `change` to the page's document.
    pub async fn mutate(&self, change: impl FnOnce(&mut D) + Send + 'static) -> bool {
        self.events
            .send(PageEvent::Mutate(Box::new(change)))
            .await
            .is_ok()
    }

    /// Delivers a message and waits for the page's answer. `None` means the
    /// page is gone.
    pub async fn send(&self, message: ExtensionMessage) -> Option<Reply> {
        let (reply, answer) = oneshot::channel();
        self.events
            .send(PageEvent::Message { message, reply })
            .await
            .ok()?;
        answer.await.ok()
    }
}

/// Spawns [`run_page`] on the current runtime.
pub fn spawn_page<D, R>(app: PageApp<D, R>) -> (PageHandle<D>, JoinHandle<PageApp<D, R>>)
where
    D: PageDom + MutationSource + Send + 'static,
    D::Node: Send,
    R: BookmarkRepository + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    let join = tokio::spawn(run_page(app, rx));
    (PageHandle { events: tx }, join)
}
