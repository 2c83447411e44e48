use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::document::Document;
use crate::domain::{NodeId, Registry};
use crate::errors::TreeResult;
use crate::infrastructure::memory::MemoryPresentation;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["config"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Empty document over the builtin kinds, rooted at a `scroll`.
pub fn empty_document() -> Document<MemoryPresentation> {
    let registry = Registry::builtin().expect("builtin kinds are distinct");
    Document::new(MemoryPresentation::new(), registry, "scroll")
        .expect("builtin registry has a scroll kind")
}

/// Append a `line` holding one text leaf per entry of `texts`.
pub fn add_line(doc: &mut Document<MemoryPresentation>, texts: &[&str]) -> TreeResult<NodeId> {
    let line = doc.create_node("line", Default::default())?;
    for text in texts {
        let leaf = doc.create_text(text)?;
        doc.append_child(line, leaf)?;
    }
    doc.append_child(doc.root(), line)?;
    Ok(line)
}

/// Markup of everything below the root.
pub fn markup(doc: &Document<MemoryPresentation>) -> String {
    let root = doc.element(doc.root()).expect("root is alive");
    doc.presentation().inner_markup(root)
}
