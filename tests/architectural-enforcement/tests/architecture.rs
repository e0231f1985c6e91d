//! Architecture rules for the flowmark workspace
//!
//! The renderer core must stay usable from any surface: no terminal
//! crates, no blocking sleeps. These sweeps read the sources directly so
//! a violation fails CI even before anyone notices it in review.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Root of the renderer core sources
fn core_src() -> PathBuf {
    workspace_root().join("renderer/core/src")
}

fn workspace_root() -> PathBuf {
    // tests/architectural-enforcement -> workspace root
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root exists")
        .to_path_buf()
}

fn rust_sources(root: &Path) -> Vec<(PathBuf, String)> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| {
            let content = std::fs::read_to_string(e.path())
                .unwrap_or_else(|err| panic!("read {}: {err}", e.path().display()));
            (e.path().to_path_buf(), content)
        })
        .collect()
}

#[test]
fn core_has_no_ui_dependencies() {
    let sources = rust_sources(&core_src());
    assert!(!sources.is_empty(), "core sources not found");

    for (path, content) in sources {
        // Path references, not prose: the crate docs are allowed to state
        // the rule in words.
        for forbidden in ["ratatui::", "crossterm::", "egui::"] {
            assert!(
                !content.contains(forbidden),
                "{} references {forbidden}: the renderer core must stay surface-agnostic",
                path.display()
            );
        }
    }
}

#[test]
fn core_never_blocks_the_thread() {
    for (path, content) in rust_sources(&core_src()) {
        assert!(
            !content.contains("std::thread::sleep") && !content.contains("thread::sleep"),
            "{} blocks the thread: pacing must suspend via tokio::time::sleep",
            path.display()
        );
    }
}

#[test]
fn core_manifest_stays_ui_free() {
    let manifest = workspace_root().join("renderer/core/Cargo.toml");
    let content = std::fs::read_to_string(&manifest)
        .unwrap_or_else(|err| panic!("read {}: {err}", manifest.display()));
    for forbidden in ["ratatui", "crossterm"] {
        assert!(
            !content.contains(forbidden),
            "core manifest depends on {forbidden}"
        );
    }
}

#[test]
fn only_the_core_owns_streaming_logic() {
    // Surfaces render blocks; they must not grow their own chunkers or
    // pacers behind the core's back.
    let tui_src = workspace_root().join("tui/src");
    for (path, content) in rust_sources(&tui_src) {
        assert!(
            !content.contains("fn chunk("),
            "{} re-implements chunking; use flowmark_core::chunker",
            path.display()
        );
    }
}
