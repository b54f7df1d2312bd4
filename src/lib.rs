//! Bookshelf application library
//!
//! Wires the application modules into the kernel registry and runs the HTTP
//! server around them.

use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;

pub use modules::books::{models::Book, store::BookStore, BooksModule};

/// Registry holding every application module
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Initialize and start all modules, serve HTTP until shutdown, then stop them.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = registry();
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;
    if let Err(e) = &served {
        tracing::error!("server exited with error: {:#}", e);
    }

    registry.stop_modules().await?;
    served
}
