// src/services/board.rs

//! HTML job board adapter.
//!
//! Scrapes paginated search result pages using configured CSS selectors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{QueryScope, SourceAdapter};
use crate::error::{AppError, Result};
use crate::models::{BoardConfig, ListingSelectors, RawListing, SearchQuery, SourcePage};
use crate::utils::{fill_search_url, http, resolve_url};

/// Adapter for one configured HTML board.
pub struct BoardAdapter {
    client: Client,
    board: BoardConfig,
    max_pages: u32,
}

impl BoardAdapter {
    /// Create an adapter, checking every selector up front.
    pub fn new(client: Client, board: BoardConfig, default_max_pages: u32) -> Result<Self> {
        for s in board.selectors.all() {
            parse_selector(s)?;
        }
        let max_pages = board.max_pages.unwrap_or(default_max_pages).max(1);
        Ok(Self {
            client,
            board,
            max_pages,
        })
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> String {
        fill_search_url(
            &self.board.search_url,
            &query.term,
            &query.location,
            page,
            self.board.page_size,
        )
    }
}

#[async_trait]
impl SourceAdapter for BoardAdapter {
    fn name(&self) -> &str {
        &self.board.name
    }

    fn scope(&self) -> QueryScope {
        if self.board.search_url.contains("{location}") {
            QueryScope::TermAndLocation
        } else {
            QueryScope::TermOnly
        }
    }

    async fn fetch_page(&self, query: &SearchQuery, cursor: Option<u32>) -> Result<SourcePage> {
        let page_no = cursor.unwrap_or(0);
        if page_no >= self.max_pages {
            return Ok(SourcePage::default());
        }

        let url = self.page_url(query, page_no);
        let body = http::fetch_text(&self.client, &self.board.name, &url).await?;
        let base = Url::parse(&url)?;

        let mut page = parse_board_page(
            &self.board.name,
            &self.board.selectors,
            &body,
            &base,
            query,
            Utc::now(),
        )?;

        let cards = page.listings.len() + page.skipped;
        page.next = if cards > 0 && page_no + 1 < self.max_pages {
            Some(page_no + 1)
        } else {
            None
        };
        log::debug!(
            "[{}] page {} yielded {} listings ({} skipped)",
            self.board.name,
            page_no + 1,
            page.listings.len(),
            page.skipped
        );
        Ok(page)
    }
}

struct CompiledSelectors {
    card: Selector,
    title: Selector,
    company: Option<Selector>,
    location: Option<Selector>,
    salary: Option<Selector>,
    description: Option<Selector>,
    link: Option<Selector>,
    anchor: Selector,
}

impl CompiledSelectors {
    fn compile(s: &ListingSelectors) -> Result<Self> {
        let optional = |o: &Option<String>| o.as_deref().map(parse_selector).transpose();
        Ok(Self {
            card: parse_selector(&s.card_selector)?,
            title: parse_selector(&s.title_selector)?,
            company: optional(&s.company_selector)?,
            location: optional(&s.location_selector)?,
            salary: optional(&s.salary_selector)?,
            description: optional(&s.description_selector)?,
            link: optional(&s.link_selector)?,
            anchor: parse_selector("a[href]")?,
        })
    }
}

/// Parse one result page into raw listings.
///
/// Cards without a title are skipped and counted. The cursor is left unset.
pub fn parse_board_page(
    source: &str,
    selectors: &ListingSelectors,
    body: &str,
    base: &Url,
    query: &SearchQuery,
    now: DateTime<Utc>,
) -> Result<SourcePage> {
    let compiled = CompiledSelectors::compile(selectors)?;
    let document = Html::parse_document(body);
    let mut page = SourcePage::default();

    for card in document.select(&compiled.card) {
        match parse_card(source, &card, &compiled, selectors, base, query, now) {
            Some(listing) => page.listings.push(listing),
            None => {
                log::debug!("[{source}] skipping card without title");
                page.skipped += 1;
            }
        }
    }
    Ok(page)
}

fn parse_card(
    source: &str,
    card: &ElementRef,
    sel: &CompiledSelectors,
    raw: &ListingSelectors,
    base: &Url,
    query: &SearchQuery,
    now: DateTime<Utc>,
) -> Option<RawListing> {
    let title_elem = card.select(&sel.title).next()?;
    let title = raw
        .title_attr
        .as_deref()
        .and_then(|attr| title_elem.value().attr(attr))
        .map(str::to_string)
        .unwrap_or_else(|| element_text(&title_elem));
    if title.trim().is_empty() {
        return None;
    }

    let field = |s: &Option<Selector>| {
        s.as_ref()
            .and_then(|s| card.select(s).next())
            .map(|e| element_text(&e))
            .unwrap_or_default()
    };

    let link = sel
        .link
        .as_ref()
        .and_then(|s| card.select(s).next())
        .or_else(|| card.select(&sel.anchor).next())
        .and_then(|e| e.value().attr("href"))
        .or_else(|| card.value().attr("href"))
        .map(|href| resolve_url(base, href));

    let source_id = raw
        .id_attr
        .as_deref()
        .and_then(|attr| card.value().attr(attr))
        .map(str::to_string);

    Some(RawListing {
        source: source.to_string(),
        source_id,
        title,
        company: field(&sel.company),
        location: field(&sel.location),
        salary: field(&sel.salary),
        description: field(&sel.description),
        url: link,
        job_type: None,
        search_term: query.term.clone(),
        search_location: query.location.clone(),
        retrieved_at: now,
    })
}

fn element_text(elem: &ElementRef) -> String {
    elem.text().collect::<Vec<_>>().join(" ")
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
