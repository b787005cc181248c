use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::aggregate::CharacterAggregator;
use crate::config::Settings;
use crate::render::{assemble_page, Renderer};
use crate::source::{category_members, ContentSource};
use crate::table::{self, BadDatePolicy, CharacterTable};

/// Query each story's character category in order and merge by title.
/// Categories are fetched one at a time; any query failure aborts.
pub async fn gather<S: ContentSource>(
    source: &S,
    settings: &Settings,
    status: &ProgressBar,
) -> Result<CharacterAggregator> {
    let mut aggregator = CharacterAggregator::new();

    for story in &settings.stories {
        status.set_message(format!("Fetching characters for {}...", story));
        let category = settings.category_for(story);
        let documents = category_members(source, &category)
            .await
            .with_context(|| format!("Failed to query {}", category))?;
        info!("{}: {} pages", category, documents.len());
        aggregator.merge(story, documents);
    }

    if aggregator.is_empty() {
        warn!("No characters found in {} categories", settings.stories.len());
    }
    info!("{} unique characters across {} stories", aggregator.len(), settings.stories.len());
    Ok(aggregator)
}

/// Fetch and build the sorted table.
pub async fn build_table<S: ContentSource>(
    source: &S,
    settings: &Settings,
    policy: BadDatePolicy,
    status: &ProgressBar,
) -> Result<CharacterTable> {
    let aggregator = gather(source, settings, status).await?;
    status.set_message("Creating table...");
    let table = table::build(aggregator.into_records(), policy)?;
    Ok(table)
}

/// Full run: fetch, build, render through the wiki and assemble the page.
pub async fn render_page<S: ContentSource, R: Renderer>(
    source: &S,
    renderer: &R,
    settings: &Settings,
    policy: BadDatePolicy,
    debug: bool,
    status: &ProgressBar,
) -> Result<(CharacterTable, String)> {
    let table = build_table(source, settings, policy, status).await?;
    status.set_message("Rendering table...");
    let doc = renderer
        .render(&table.to_wikitext(), debug)
        .await
        .context("Failed to render table")?;
    let page = assemble_page(&doc, settings);
    Ok((table, page))
}
