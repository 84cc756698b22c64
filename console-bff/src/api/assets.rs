use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Serves the built console; unknown paths get `index.html` so that
/// client-side routes survive a page reload.
pub fn service(static_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(static_dir.join("index.html")))
}
