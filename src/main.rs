//! SideMarks: color bookmarks for AI chat sidebars.
//!
//! The extension itself runs as WebAssembly in the browser. This binary runs
//! a console demo of the same page logic against in-memory documents.

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    sidemarks::logging::init_logging();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              SideMarks v{} — Demo Mode                    ║", env!("CARGO_PKG_VERSION"));
    println!("║     Color bookmarks for ChatGPT, Claude and Grok sidebars    ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo::platforms();
    demo::context_menu().await;
    demo::keyboard_shortcut();
    demo::navigation().await;
    demo::popup_list();

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All components demonstrated successfully!");
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use sidemarks::app::PageApp;
    use sidemarks::database::kv_store::MemoryKvStore;
    use sidemarks::dom::memory::MemoryDocument;
    use sidemarks::managers::bookmark_repository::{BookmarkRepository, KvBookmarkRepository};
    use sidemarks::managers::shortcut_manager::{
        ShortcutManager, ShortcutManagerTrait, TOGGLE_BOOKMARK_COMMAND,
    };
    use sidemarks::runtime::spawn_page;
    use sidemarks::services::command_dispatcher::{context_menu_items, message_for_command, refresh_message};
    use sidemarks::services::control_surface::{ControlSurface, LocalTabs};
    use sidemarks::services::list_viewer::ListView;
    use sidemarks::types::bookmark::BookmarkColor;
    use sidemarks::types::message::ExtensionMessage;
    use sidemarks::types::platform::Platform;
    use sidemarks::types::settings::SideMarksSettings;

    type Repo = KvBookmarkRepository<MemoryKvStore>;

    fn section(name: &str) {
        println!("───────────────────────────────────────────────────────────────");
        println!("  📦 {}", name);
        println!("───────────────────────────────────────────────────────────────");
    }

    fn repo(settings: &SideMarksSettings) -> Repo {
        KvBookmarkRepository::new(MemoryKvStore::new(), settings.storage.key.clone())
    }

    pub fn platforms() {
        section("Platform Resolution");
        for location in [
            "https://chatgpt.com/c/6650f1a2",
            "https://claude.ai/chat/9e0d2f4c-77aa-4b1e",
            "https://grok.com/chat/k3x9",
            "https://example.com/c/abc",
        ] {
            let platform = Platform::from_location(location);
            let id = platform
                .conversation_id(location)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("  {:<45} → {:<8} id={}", location, platform.display_name(), id);
        }
        println!("  ✓ Platform table OK");
        println!();
    }

    pub async fn context_menu() {
        section("Context Menu → Page");
        let settings = SideMarksSettings::default();
        println!("  Menu entries: {}", context_menu_items().len());

        let mut tabs = LocalTabs::new(repo(&settings), settings.clone());
        let tab = tabs.open("https://chatgpt.com/", true);
        if let Some(app) = tabs.tab_mut(tab).and_then(|t| t.app_mut()) {
            let platform = app.platform();
            let dom = app.dom_mut();
            let nav = dom.sidebar();
            dom.add_conversation_link(nav, platform, "/c/abc123", "Trip planning");
            dom.add_conversation_link(nav, platform, "/c/def456", "Rust lifetimes");
        }

        let mut surface = ControlSurface::new(tabs, &settings.timing);
        let outcome = surface
            .on_menu_click(tab, BookmarkColor::Green.action_id(), Some("https://chatgpt.com/c/def456"))
            .await;
        println!("  Green on 'Rust lifetimes': {:?}", outcome);
        let outcome = surface
            .on_menu_click(tab, "chatgpt-action-1", Some("https://chatgpt.com/c/abc123"))
            .await;
        println!("  Toggle on 'Trip planning': {:?}", outcome);

        let markers = surface
            .channel()
            .tab(tab)
            .and_then(|t| t.app())
            .map(|app| app.marker_count())
            .unwrap_or(0);
        println!("  Markers on page: {}", markers);

        // A tab opened before the extension was installed has no page logic.
        let stale = surface.channel_mut().open("https://claude.ai/chat/1f2e-3d4c", false);
        let outcome = surface.on_command(stale, TOGGLE_BOOKMARK_COMMAND).await;
        println!("  Keyboard toggle in a stale tab: {:?}", outcome);
        println!("  ✓ ControlSurface OK");
        println!();
    }

    pub fn keyboard_shortcut() {
        section("Keyboard Shortcut");
        let settings = SideMarksSettings::default();
        let shortcuts = ShortcutManager::from_settings(&settings);
        let keys = shortcuts.get_shortcut(TOGGLE_BOOKMARK_COMMAND).unwrap_or("-");
        println!("  {} → {}", keys, TOGGLE_BOOKMARK_COMMAND);
        println!("  Dispatches: {:?}", message_for_command(TOGGLE_BOOKMARK_COMMAND).map(|m| m.action));

        let mut app = PageApp::new(
            MemoryDocument::new("https://grok.com/chat/k3x9"),
            repo(&settings),
            settings.clone(),
        );
        app.start(0);
        let first = app.keyboard_toggle(10);
        let second = app.keyboard_toggle(20);
        println!("  First press: {:?}, second press: {:?}", first, second);
        let dismissed_at = 20 + settings.timing.feedback_visible_ms + settings.timing.feedback_fade_ms;
        app.tick(dismissed_at);
        println!("  Toast gone after {} ms: {}", dismissed_at - 20, app.feedback_token().is_none());
        println!("  ✓ Keyboard toggle OK");
        println!();
    }

    pub async fn navigation() {
        section("Page Runtime (tokio)");
        let settings = SideMarksSettings::default();
        let repo = repo(&settings);
        let app = PageApp::new(MemoryDocument::new("https://claude.ai/new"), repo.clone(), settings.clone());
        let (page, join) = spawn_page(app);

        // Claude renders its sidebar late; the startup burst picks it up.
        page.mutate(|dom| {
            let nav = dom.sidebar();
            dom.add_conversation_link(nav, Platform::Claude, "/chat/5b6c-7d8e", "Essay outline");
        })
        .await;
        let reply = page
            .send(
                ExtensionMessage::new(BookmarkColor::Purple.action_id())
                    .with_link_url("https://claude.ai/chat/5b6c-7d8e"),
            )
            .await;
        println!("  Purple bookmark reply: {:?}", reply);

        page.mutate(|dom| dom.navigate("https://claude.ai/chat/5b6c-7d8e")).await;
        tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
        page.send(refresh_message()).await;

        drop(page);
        match join.await {
            Ok(app) => println!("  Markers after navigation: {}", app.marker_count()),
            Err(e) => println!("  Page task failed: {}", e),
        }
        println!("  Stored bookmarks: {}", repo.load_all().map(|m| m.bookmarked_count()).unwrap_or(0));
        println!("  ✓ Runtime OK");
        println!();
    }

    pub fn popup_list() {
        section("Popup List");
        let settings = SideMarksSettings::default();
        let repo = repo(&settings);
        for (origin, path, title, color) in [
            ("https://chatgpt.com", "/c/aa11", "Trip planning", BookmarkColor::Red),
            ("https://claude.ai", "/chat/bb22-cc33", "Essay outline", BookmarkColor::Blue),
            ("https://grok.com", "/chat/dd44", "Physics puzzle", BookmarkColor::Yellow),
        ] {
            let location = format!("{}/", origin);
            let mut app = PageApp::new(MemoryDocument::new(&location), repo.clone(), settings.clone());
            let platform = app.platform();
            let dom = app.dom_mut();
            let nav = dom.sidebar();
            dom.add_conversation_link(nav, platform, path, title);
            if let Err(e) = app.set_color(&format!("{}{}", origin, path), color) {
                println!("  Could not bookmark {}: {}", title, e);
            }
        }

        match repo.load_all() {
            Ok(map) => {
                let view = ListView::from_bookmarks(&map);
                for line in view.filter("").render().lines() {
                    println!("  {}", line);
                }
                println!("  Search 'claude': {} row(s)", view.filter("claude").visible_rows());
                if let Some(message) = view.filter("zebra").no_results_message() {
                    println!("  {}", message);
                }
            }
            Err(e) => println!("  Store unavailable: {}", e),
        }
        println!("  ✓ ListViewer OK");
        println!();
    }
}
