//! Command handlers

use anyhow::Context;

use quotebox_core::{App, CategoryFilter, Quote};

use crate::cli::Commands;

pub async fn dispatch(app: &App, command: Commands) -> anyhow::Result<()> {
    let store = app.store();

    match command {
        Commands::Show { category, new } => {
            let filter = match category {
                Some(c) => CategoryFilter::parse(Some(c.as_str())),
                None => store.selected_category(),
            };
            let quote = if new {
                store.show_random(&filter)?
            } else {
                store.current_or_random(&filter)?
            };
            print_quote(&quote);
        }
        Commands::Add { text, category } => {
            let quote = app.add_quote(&text, &category)?;
            println!("Added quote {}", quote.id);
            app.wait_for_publishes().await;
        }
        Commands::List { category } => {
            let filter = CategoryFilter::parse(category.as_deref());
            for quote in store.list(&filter) {
                println!("{:>15}  [{}] {}", quote.id, quote.category, quote.text);
            }
        }
        Commands::Categories => {
            let selected = store.selected_category();
            for category in store.categories() {
                let marker = if selected.as_str() == category { "*" } else { " " };
                println!("{marker} {category}");
            }
        }
        Commands::Select { category } => {
            let filter = CategoryFilter::parse(Some(category.as_str()));
            if let CategoryFilter::Only(c) = &filter {
                if !store.categories().contains(c) {
                    tracing::warn!(category = %c, "Selected category has no quotes yet");
                }
            }
            println!("Selected category: {filter}");
            store.select_category(filter);
        }
        Commands::Import { file } => {
            let added = app
                .import_file(&file)
                .with_context(|| format!("importing {}", file.display()))?;
            println!("Imported {added} quotes");
        }
        Commands::Export { file: Some(file) } => {
            app.export_file(&file)
                .with_context(|| format!("exporting to {}", file.display()))?;
            println!("Exported {} quotes to {}", store.len(), file.display());
        }
        Commands::Export { file: None } => {
            println!("{}", store.export_snapshot()?);
        }
        Commands::Sync => {
            let report = app.sync_now().await?;
            println!(
                "Quotes synced with server: {} added, {} updated, {} total",
                report.added, report.replaced, report.total
            );
        }
        Commands::Reset => {
            store.reset();
            println!("Restored {} built-in quotes", store.len());
        }
        Commands::Watch => {
            app.start_periodic_sync();
            println!(
                "Syncing every {}s, press Ctrl-C to stop",
                app.config().sync_interval_secs
            );
            tokio::signal::ctrl_c()
                .await
                .context("waiting for Ctrl-C")?;
            app.shutdown()?;
        }
    }

    if let Some(failure) = store.last_storage_failure() {
        eprintln!("warning: changes are kept in memory only ({failure})");
    }

    Ok(())
}

fn print_quote(quote: &Quote) {
    println!("\"{}\"", quote.text);
    println!("  - {}", quote.category);
}
