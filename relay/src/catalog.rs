//! Actor catalog population.
//!
//! The platform has no single reliable "list my actors" call, so the catalog
//! is filled by an ordered cascade of strategies, each absorbed on failure:
//! owned listing, full listing filtered by username, paginated re-query with
//! de-duplication, public actors, and finally a static list of well-known
//! scrapers. Strategies keep running until the configured target size is
//! reached.

use std::collections::HashSet;
use std::sync::Arc;

use shared_types::{ActorDetail, ActorSummary};

use crate::platform::{ActorListQuery, ActorRecord, Platform, UserInfo};

const FULL_LIST_LIMIT: u32 = 1000;
const PAGE_LIMIT: u32 = 100;
const MAX_PAGED_OFFSET: u32 = 500;
const PUBLIC_LIST_LIMIT: u32 = 20;

const DEFAULT_DESCRIPTION: &str = "No description available";

/// Map a platform record into a catalog row, tagged with the strategy that
/// produced it.
fn summarize(record: &ActorRecord, source: &str) -> ActorSummary {
    ActorSummary {
        id: record.id.clone(),
        name: record.name.clone(),
        title: record
            .title
            .clone()
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| record.name.clone()),
        description: record
            .description
            .clone()
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        is_public: record.is_public,
        username: record.username.clone(),
        stats: record.stats.clone(),
        source: Some(source.to_string()),
    }
}

pub fn detail_from_record(record: ActorRecord) -> ActorDetail {
    ActorDetail {
        title: record
            .title
            .clone()
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| record.name.clone()),
        description: record
            .description
            .clone()
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        id: record.id,
        name: record.name,
        is_public: record.is_public,
        stats: record.stats,
        created_at: record.created_at,
        modified_at: record.modified_at,
        username: record.username,
    }
}

fn static_fallback() -> Vec<ActorSummary> {
    [
        (
            "apify/web-scraper",
            "web-scraper",
            "Web Scraper",
            "A versatile web scraper that can extract data from websites",
        ),
        (
            "apify/cheerio-scraper",
            "cheerio-scraper",
            "Cheerio Scraper",
            "Fast HTML scraping with CSS selectors",
        ),
        (
            "apify/puppeteer-scraper",
            "puppeteer-scraper",
            "Puppeteer Scraper",
            "Browser automation with JavaScript execution",
        ),
        (
            "apify/website-content-crawler",
            "website-content-crawler",
            "Website Content Crawler",
            "Comprehensive website crawling",
        ),
    ]
    .into_iter()
    .map(|(id, name, title, description)| ActorSummary {
        id: id.to_string(),
        name: name.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        is_public: true,
        username: None,
        stats: None,
        source: Some("static-fallback".to_string()),
    })
    .collect()
}

/// Run the strategy cascade. Never fails: every strategy error is logged and
/// absorbed, and the static fallback guarantees a last resort.
pub async fn build_catalog(
    platform: &Arc<dyn Platform>,
    user: &UserInfo,
    target: usize,
) -> Vec<ActorSummary> {
    let mut actors: Vec<ActorSummary> = Vec::new();

    // Strategy 1: actors owned by the caller.
    match platform
        .list_actors(ActorListQuery {
            only_mine: true,
            limit: FULL_LIST_LIMIT,
            offset: 0,
        })
        .await
    {
        Ok(page) => {
            actors = page
                .items
                .iter()
                .map(|record| summarize(record, "my-actors"))
                .collect();
            tracing::debug!(count = actors.len(), total = page.total, "owned actor listing");
        }
        Err(e) => tracing::warn!(error = %e, "owned actor listing failed"),
    }

    // Strategy 2: full listing filtered by the caller's username. Only kept
    // when it yields strictly more rows than what we already have.
    if actors.len() < target && !user.username.is_empty() {
        match platform
            .list_actors(ActorListQuery {
                only_mine: false,
                limit: FULL_LIST_LIMIT,
                offset: 0,
            })
            .await
        {
            Ok(page) => {
                let filtered: Vec<ActorSummary> = page
                    .items
                    .iter()
                    .filter(|record| record.username.as_deref() == Some(user.username.as_str()))
                    .map(|record| summarize(record, "filtered-actors"))
                    .collect();
                tracing::debug!(
                    username = %user.username,
                    count = filtered.len(),
                    "filtered actor listing"
                );
                if filtered.len() > actors.len() {
                    actors = filtered;
                }
            }
            Err(e) => tracing::warn!(error = %e, "filtered actor listing failed"),
        }
    }

    // Strategy 3: paginated re-query of owned actors, de-duplicated by id.
    if actors.len() < target {
        let mut seen: HashSet<String> = actors.iter().map(|actor| actor.id.clone()).collect();
        let mut offset = 0;
        while offset < MAX_PAGED_OFFSET {
            let page = match platform
                .list_actors(ActorListQuery {
                    only_mine: true,
                    limit: PAGE_LIMIT,
                    offset,
                })
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(offset, error = %e, "paginated actor listing failed");
                    break;
                }
            };
            if page.items.is_empty() {
                break;
            }
            let short_page = page.items.len() < PAGE_LIMIT as usize;
            for record in &page.items {
                if seen.insert(record.id.clone()) {
                    actors.push(summarize(record, "paginated-actors"));
                }
            }
            tracing::debug!(offset, count = actors.len(), "paginated actor listing");
            if actors.len() >= target || short_page {
                break;
            }
            offset += PAGE_LIMIT;
        }
    }

    // Strategy 4: public actors, only when nothing at all was found.
    if actors.is_empty() {
        match platform
            .list_actors(ActorListQuery {
                only_mine: false,
                limit: PUBLIC_LIST_LIMIT,
                offset: 0,
            })
            .await
        {
            Ok(page) => {
                actors = page
                    .items
                    .iter()
                    .map(|record| {
                        let mut summary = summarize(record, "public-actors");
                        summary.is_public = true;
                        summary.username = None;
                        summary.stats = None;
                        summary
                    })
                    .collect();
            }
            Err(e) => tracing::warn!(error = %e, "public actor listing failed"),
        }
    }

    // Strategy 5: static last resort.
    if actors.is_empty() {
        tracing::info!("using static fallback actor catalog");
        actors = static_fallback();
    }

    actors
}
