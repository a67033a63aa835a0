//! SideMarks Host: drives a page session over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"page.add_link", "params":{"href":"/c/abc","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr (filter with `SIDEMARKS_LOG`). The database lives in the
//! platform data directory unless `SIDEMARKS_DATA_DIR` points elsewhere; the
//! first page loaded is `SIDEMARKS_LOCATION` or ChatGPT's start page.

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    host::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use std::io::{self, BufRead, Write};
    use std::sync::Mutex;

    use serde_json::{json, Value};
    use tracing::{error, info, warn};

    use sidemarks::host_handler::{handle_method, HostSession};
    use sidemarks::logging::init_logging;
    use sidemarks::paths;
    use sidemarks::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

    const DEFAULT_LOCATION: &str = "https://chatgpt.com/";

    fn respond(value: &Value) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", value);
        let _ = out.flush();
    }

    pub fn run() {
        init_logging();

        let mut settings_engine = SettingsEngine::new(None);
        let settings = settings_engine.load().unwrap_or_else(|e| {
            warn!(error = %e, "settings unreadable, using defaults");
            Default::default()
        });

        let db_path = paths::database_path();
        if let Some(dir) = db_path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!(dir = %dir.display(), error = %e, "could not create data directory");
            }
        }
        let location = std::env::var("SIDEMARKS_LOCATION").unwrap_or_else(|_| DEFAULT_LOCATION.to_string());

        let session = match HostSession::open(&db_path.to_string_lossy(), &location, settings) {
            Ok(session) => Mutex::new(session),
            Err(e) => {
                error!(path = %db_path.display(), error = %e, "failed to open bookmark database");
                std::process::exit(1);
            }
        };
        info!(db = %db_path.display(), %location, "host ready");

        respond(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let req: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    respond(&json!({"id": null, "error": format!("parse error: {}", e)}));
                    continue;
                }
            };

            let id = req.get("id").cloned().unwrap_or(Value::Null);
            let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
            let params = req.get("params").cloned().unwrap_or(json!({}));

            let response = match handle_method(&session, method, &params) {
                Ok(val) => json!({"id": id, "result": val}),
                Err(err) => json!({"id": id, "error": err}),
            };
            respond(&response);
        }
    }
}
