//! Control surface: delivers dispatcher messages into tabs.
//!
//! Delivery is fire-and-forget with one recovery step. The page logic is
//! probed with `ping`; when nothing answers, it is injected and the message is
//! sent once the new instance reports ready (or after the probes run out).
//! A second failure is logged and the message dropped.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::command_dispatcher::{document_url_matches, message_for_command, message_for_menu_click};
use crate::app::PageApp;
use crate::dom::memory::MemoryDocument;
use crate::managers::bookmark_repository::BookmarkRepository;
use crate::message_handler::handle_message;
use crate::types::errors::DeliveryError;
use crate::types::message::{ExtensionMessage, MessageReply};
use crate::types::settings::{SideMarksSettings, TimingSettings};

pub type TabId = u32;

/// Browser-side messaging into tabs.
pub trait PageChannel {
    /// Sends `message` to the page logic of `tab`; returns its reply, if any.
    fn send(&mut self, tab: TabId, message: &ExtensionMessage) -> Result<Option<MessageReply>, DeliveryError>;
    /// Injects the page logic into `tab`.
    fn inject(&mut self, tab: TabId) -> Result<(), DeliveryError>;
    fn open_tab(&mut self, url: &str) -> Result<TabId, DeliveryError>;
}

/// How a delivery ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    DeliveredAfterInjection,
    Dropped(DeliveryError),
}

pub struct ControlSurface<C: PageChannel> {
    channel: C,
    retry_delay: Duration,
    readiness_polls: u32,
}

impl<C: PageChannel> ControlSurface<C> {
    pub fn new(channel: C, timing: &TimingSettings) -> Self {
        Self {
            channel,
            retry_delay: Duration::from_millis(timing.injection_retry_delay_ms),
            readiness_polls: timing.readiness_polls,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    fn is_ready(&mut self, tab: TabId) -> bool {
        matches!(
            self.channel.send(tab, &ExtensionMessage::ping()),
            Ok(Some(reply)) if reply.is_ready()
        )
    }

    /// Delivers `message` to `tab` with the readiness handshake.
    pub async fn deliver(&mut self, tab: TabId, message: &ExtensionMessage) -> DeliveryOutcome {
        if self.is_ready(tab) {
            return match self.channel.send(tab, message) {
                Ok(_) => DeliveryOutcome::Delivered,
                Err(e) => {
                    warn!(tab, action = %message.action, error = %e, "send failed after ready probe");
                    DeliveryOutcome::Dropped(e)
                }
            };
        }

        debug!(tab, "page logic not ready, injecting");
        if let Err(e) = self.channel.inject(tab) {
            warn!(tab, error = %e, "could not inject page logic");
            return DeliveryOutcome::Dropped(e);
        }

        for poll in 0..self.readiness_polls.max(1) {
            tokio::time::sleep(self.retry_delay).await;
            if self.is_ready(tab) {
                debug!(tab, poll, "injected page logic ready");
                break;
            }
        }

        match self.channel.send(tab, message) {
            Ok(_) => DeliveryOutcome::DeliveredAfterInjection,
            Err(e) => {
                warn!(tab, action = %message.action, error = %e, "still could not deliver after injection");
                DeliveryOutcome::Dropped(e)
            }
        }
    }

    /// Context menu click on a link in `tab`.
    pub async fn on_menu_click(
        &mut self,
        tab: TabId,
        menu_item_id: &str,
        link_url: Option<&str>,
    ) -> Option<DeliveryOutcome> {
        let message = message_for_menu_click(menu_item_id, link_url)?;
        Some(self.deliver(tab, &message).await)
    }

    /// Keyboard command fired while `tab` is active.
    pub async fn on_command(&mut self, tab: TabId, command: &str) -> Option<DeliveryOutcome> {
        let message = message_for_command(command)?;
        Some(self.deliver(tab, &message).await)
    }

    /// Opens a list row's conversation in a new tab.
    pub fn open_conversation(&mut self, url: &str) -> Result<TabId, DeliveryError> {
        let tab = self.channel.open_tab(url)?;
        info!(tab, url, "opened conversation");
        Ok(tab)
    }
}

/// A tab of [`LocalTabs`]. `app` is `None` until page logic runs in it.
pub struct LocalTab<R: BookmarkRepository> {
    location: String,
    app: Option<PageApp<MemoryDocument, R>>,
}

impl<R: BookmarkRepository> LocalTab<R> {
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn app(&self) -> Option<&PageApp<MemoryDocument, R>> {
        self.app.as_ref()
    }

    pub fn app_mut(&mut self) -> Option<&mut PageApp<MemoryDocument, R>> {
        self.app.as_mut()
    }
}

/// In-process tabs over [`MemoryDocument`]s sharing one bookmark repository,
/// the way every tab of a browser profile shares one storage area.
pub struct LocalTabs<R: BookmarkRepository + Clone> {
    tabs: BTreeMap<TabId, LocalTab<R>>,
    repo: R,
    settings: SideMarksSettings,
    next_id: TabId,
    now_ms: u64,
    injectable: bool,
}

impl<R: BookmarkRepository + Clone> LocalTabs<R> {
    pub fn new(repo: R, settings: SideMarksSettings) -> Self {
        Self {
            tabs: BTreeMap::new(),
            repo,
            settings,
            next_id: 1,
            now_ms: 0,
            injectable: true,
        }
    }

    /// Opens a tab. With `with_page_logic`, the page logic starts right away
    /// as a declared content script would.
    pub fn open(&mut self, location: &str, with_page_logic: bool) -> TabId {
        let id = self.next_id;
        self.next_id += 1;
        let mut tab = LocalTab {
            location: location.to_string(),
            app: None,
        };
        if with_page_logic {
            tab.app = Some(self.start_app(location));
        }
        self.tabs.insert(id, tab);
        id
    }

    fn start_app(&self, location: &str) -> PageApp<MemoryDocument, R> {
        let mut app = PageApp::new(
            MemoryDocument::new(location),
            self.repo.clone(),
            self.settings.clone(),
        );
        app.start(self.now_ms);
        app
    }

    /// Makes every later injection fail, as on pages scripts cannot run in.
    pub fn set_injectable(&mut self, injectable: bool) {
        self.injectable = injectable;
    }

    pub fn tab(&self, id: TabId) -> Option<&LocalTab<R>> {
        self.tabs.get(&id)
    }

    pub fn tab_mut(&mut self, id: TabId) -> Option<&mut LocalTab<R>> {
        self.tabs.get_mut(&id)
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Advances the shared clock and runs whatever fell due in every tab.
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
        let now = self.now_ms;
        for app in self.tabs.values_mut().filter_map(|t| t.app.as_mut()) {
            app.pump_mutations(now);
            app.tick(now);
        }
    }
}

impl<R: BookmarkRepository + Clone> PageChannel for LocalTabs<R> {
    fn send(&mut self, tab: TabId, message: &ExtensionMessage) -> Result<Option<MessageReply>, DeliveryError> {
        let now = self.now_ms;
        let entry = self.tabs.get_mut(&tab).ok_or(DeliveryError::TabNotFound(tab))?;
        let app = entry.app.as_mut().ok_or(DeliveryError::NoReceiver(tab))?;
        match handle_message(app, message, now) {
            Ok(reply) => Ok(reply),
            Err(e) => {
                debug!(tab, error = %e, "page ignored message");
                Ok(None)
            }
        }
    }

    fn inject(&mut self, tab: TabId) -> Result<(), DeliveryError> {
        if !self.tabs.contains_key(&tab) {
            return Err(DeliveryError::TabNotFound(tab));
        }
        if !self.injectable {
            return Err(DeliveryError::InjectionFailed(format!("scripts are blocked in tab {}", tab)));
        }
        let needs_app = self.tabs.get(&tab).is_some_and(|t| t.app.is_none());
        if needs_app {
            let location = self.tabs.get(&tab).map(|t| t.location.clone()).unwrap_or_default();
            let app = self.start_app(&location);
            if let Some(entry) = self.tabs.get_mut(&tab) {
                entry.app = Some(app);
            }
        }
        Ok(())
    }

    fn open_tab(&mut self, url: &str) -> Result<TabId, DeliveryError> {
        Ok(self.open(url, document_url_matches(url)))
    }
}
