//! Page App for SideMarks.
//!
//! The page-side logic of one tab: holds the DOM, the bookmark repository and
//! the watcher, and ties store operations to DOM reconciliation. Every store
//! mutation is written first; the page is only touched once the write
//! succeeded.

use tracing::{debug, info, warn};

use crate::dom::{AddedNode, MutationSource, PageDom, Selector};
use crate::managers::bookmark_manager::{
    BookmarkManager, BookmarkManagerTrait, SetColorOutcome, ToggleOutcome,
};
use crate::managers::bookmark_repository::BookmarkRepository;
use crate::services::feedback::{FeedbackKind, FeedbackToast};
use crate::services::list_viewer::ListView;
use crate::services::page_watcher::{Observation, PageWatcher, WatchTask};
use crate::services::reconciler::{Reconciler, MARKER_CLASS};
use crate::types::bookmark::{BookmarkColor, ConversationId};
use crate::types::errors::{BookmarkError, StoreError};
use crate::types::platform::Platform;
use crate::types::settings::SideMarksSettings;

/// Page logic bound to one document and one bookmark repository.
pub struct PageApp<D: PageDom, R: BookmarkRepository> {
    dom: D,
    repo: R,
    settings: SideMarksSettings,
    platform: Platform,
    reconciler: Reconciler,
    watcher: PageWatcher,
    feedback: FeedbackToast<D::Node>,
    started: bool,
}

impl<D: PageDom, R: BookmarkRepository> PageApp<D, R> {
    /// Resolves the platform from the document's location. Nothing is
    /// scheduled until [`PageApp::start`].
    pub fn new(dom: D, repo: R, settings: SideMarksSettings) -> Self {
        let platform = Platform::from_location(&dom.location());
        let reconciler = Reconciler::new(platform, settings.appearance.marker_size_px);
        let watcher = PageWatcher::new(&settings.timing);
        Self {
            dom,
            repo,
            settings,
            platform,
            reconciler,
            watcher,
            feedback: FeedbackToast::new(),
            started: false,
        }
    }

    /// Arms the watcher: startup reconciles plus the periodic sweep.
    /// Platforms that render their sidebar early are reconciled right away.
    /// Unsupported pages stay inert.
    pub fn start(&mut self, now: u64) {
        if self.started {
            return;
        }
        if !self.platform.is_supported() {
            info!(location = %self.dom.location(), "unsupported page, staying inactive");
            return;
        }
        self.started = true;

        let deferred = self.platform.profile().is_some_and(|p| p.deferred_startup);
        let startup: Vec<u64> = if deferred {
            self.settings.timing.startup_burst_ms.clone()
        } else {
            vec![0]
        };
        self.watcher.start(now, &self.dom.location(), &startup);
        info!(platform = %self.platform, "SideMarks page logic started");
        self.tick(now);
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Tears the page down, keeping the repository for the next page.
    pub fn into_repo(self) -> R {
        self.repo
    }

    pub fn settings(&self) -> &SideMarksSettings {
        &self.settings
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn watcher(&self) -> &PageWatcher {
        &self.watcher
    }

    /// Markers currently attached to the page.
    pub fn marker_count(&self) -> usize {
        self.dom.query_all(None, &Selector::Class(MARKER_CLASS)).len()
    }

    /// Default-color toggle on the conversation behind `link_url`.
    pub fn toggle(&mut self, link_url: &str) -> Result<(ConversationId, ToggleOutcome), BookmarkError> {
        let (dom, reconciler) = (&self.dom, &self.reconciler);
        let title_of = |id: &ConversationId| reconciler.conversation_title(dom, id);
        let (id, outcome) = BookmarkManager::new(&self.repo).toggle(
            link_url,
            self.platform,
            &self.settings.appearance.default_color,
            &title_of,
        )?;

        match &outcome {
            ToggleOutcome::Added(record) => {
                self.reconciler.apply(&mut self.dom, id.as_str(), &record.color);
            }
            ToggleOutcome::Removed => {
                self.reconciler.retract(&mut self.dom, id.as_str());
            }
        }
        Ok((id, outcome))
    }

    /// Palette color on the conversation behind `link_url`. Applying the
    /// color it already has removes the bookmark.
    pub fn set_color(
        &mut self,
        link_url: &str,
        color: BookmarkColor,
    ) -> Result<(ConversationId, SetColorOutcome), BookmarkError> {
        let (dom, reconciler) = (&self.dom, &self.reconciler);
        let title_of = |id: &ConversationId| reconciler.conversation_title(dom, id);
        let (id, outcome) = BookmarkManager::new(&self.repo).set_color(
            link_url,
            color.hex(),
            color.action_id(),
            self.platform,
            &title_of,
        )?;

        match &outcome {
            SetColorOutcome::Created(record) | SetColorOutcome::Updated(record) => {
                self.reconciler.apply(&mut self.dom, id.as_str(), &record.color);
            }
            SetColorOutcome::Removed => {
                self.reconciler.retract(&mut self.dom, id.as_str());
            }
        }
        Ok((id, outcome))
    }

    pub fn remove(&mut self, conversation_id: &str) -> Result<bool, BookmarkError> {
        let removed = BookmarkManager::new(&self.repo).remove(conversation_id)?;
        self.reconciler.retract(&mut self.dom, conversation_id);
        Ok(removed)
    }

    pub fn clear_all(&mut self) -> Result<(), BookmarkError> {
        BookmarkManager::new(&self.repo).clear_all()?;
        let removed = self.reconciler.clear_markers(&mut self.dom);
        debug!(removed, "cleared markers from page");
        Ok(())
    }

    /// Re-applies the whole stored mapping. Unsupported pages do not read
    /// the store at all.
    pub fn reconcile(&mut self) -> Result<usize, StoreError> {
        if !self.platform.is_supported() {
            return Ok(0);
        }
        let bookmarks = self.repo.load_all()?;
        Ok(self.reconciler.reconcile(&mut self.dom, &bookmarks))
    }

    /// Restores markers that went missing; returns the restored ids.
    pub fn sweep(&mut self) -> Result<Vec<String>, StoreError> {
        if !self.platform.is_supported() {
            return Ok(Vec::new());
        }
        let bookmarks = self.repo.load_all()?;
        Ok(self.reconciler.sweep(&mut self.dom, &bookmarks))
    }

    /// Transient repaint of every marker; storage is left alone.
    pub fn recolor_all(&mut self, color: &str) -> usize {
        self.reconciler.recolor_all(&mut self.dom, color)
    }

    /// Toggle on the conversation in the current location, with a toast
    /// telling the user what happened.
    pub fn keyboard_toggle(&mut self, now: u64) -> Result<FeedbackKind, BookmarkError> {
        let location = self.dom.location();
        if !self.platform.is_supported() {
            return Err(BookmarkError::UnsupportedPlatform(location));
        }

        let kind = match self.toggle(&location) {
            Ok((_, ToggleOutcome::Added(_))) => FeedbackKind::Added,
            Ok((_, ToggleOutcome::Removed)) => FeedbackKind::Removed,
            Err(BookmarkError::NoConversationId(_)) => FeedbackKind::Error,
            Err(e) => return Err(e),
        };
        self.show_feedback(now, kind);
        Ok(kind)
    }

    fn show_feedback(&mut self, now: u64, kind: FeedbackKind) {
        match self.feedback.show(&mut self.dom, kind) {
            Ok(token) => {
                let visible = self.settings.timing.feedback_visible_ms;
                let fade = self.settings.timing.feedback_fade_ms;
                self.watcher.schedule(now, visible, WatchTask::HideFeedback(token));
                self.watcher
                    .schedule(now, visible + fade, WatchTask::RemoveFeedback(token));
            }
            Err(e) => warn!(error = %e, "could not show feedback"),
        }
    }

    /// Current toast token, if a toast is on the page.
    pub fn feedback_token(&self) -> Option<u64> {
        self.feedback.current_token()
    }

    /// Feeds one batch of added nodes to the watcher.
    pub fn on_dom_mutations(&mut self, now: u64, added: &[AddedNode]) -> Observation {
        if !self.started {
            return Observation::default();
        }
        let location = self.dom.location();
        self.watcher.observe(now, &location, added)
    }

    /// Runs every task due at `now`; returns how many ran.
    pub fn tick(&mut self, now: u64) -> usize {
        let due = self.watcher.take_due(now);
        for task in &due {
            match *task {
                WatchTask::Reconcile => {
                    if let Err(e) = self.reconcile() {
                        warn!(error = %e, "reconcile skipped");
                    }
                }
                WatchTask::Sweep => {
                    if let Err(e) = self.sweep() {
                        warn!(error = %e, "sweep skipped");
                    }
                }
                WatchTask::HideFeedback(token) => {
                    self.feedback.hide(&mut self.dom, token);
                }
                WatchTask::RemoveFeedback(token) => {
                    self.feedback.remove(&mut self.dom, token);
                }
            }
        }
        due.len()
    }

    /// Instant of the next scheduled task.
    pub fn next_deadline(&self) -> Option<u64> {
        self.watcher.next_deadline()
    }

    /// The popup list built from the stored mapping.
    pub fn list_view(&self) -> Result<ListView, StoreError> {
        Ok(ListView::from_bookmarks(&self.repo.load_all()?))
    }
}

impl<D: PageDom + MutationSource, R: BookmarkRepository> PageApp<D, R> {
    /// Drains the DOM's pending mutation records into the watcher.
    pub fn pump_mutations(&mut self, now: u64) -> Observation {
        let added = self.dom.take_mutations();
        if added.is_empty() {
            return Observation::default();
        }
        self.on_dom_mutations(now, &added)
    }
}
