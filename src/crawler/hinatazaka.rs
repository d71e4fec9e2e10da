//! Hinatazaka46 blog adapter
//!
//! The listing carries the full post inline. Long posts are lazy-loaded on
//! the listing, so above a threshold the image list is re-read from the
//! article page.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawler::CrawlError;
use crate::crawler::site::{
    BlogDraft, ListingEntry, SiteAdapter, blog_id, compile, home_prefix, image_sources,
    inner_text, parse_home, strip_whitespace,
};
use crate::date::DateFormat;
use crate::models::IdolGroup;
use crate::store::AliasPolicy;

/// Listing image count above which the article page is fetched
pub const DEFAULT_IMAGE_THRESHOLD: usize = 20;

/// Link used by the site when an article has no detail button
const FALLBACK_LINK: &str = "/00000";

struct Selectors {
    article: Selector,
    link: Selector,
    name: Selector,
    title: Selector,
    date: Selector,
    text: Selector,
    image: Selector,
}

impl Selectors {
    fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            article: compile(".p-blog-group > .p-blog-article")?,
            link: compile("a.c-button-blog-detail")?,
            name: compile("div[class=\"c-blog-article__name\"]")?,
            title: compile("div[class=\"c-blog-article__title\"]")?,
            date: compile("div[class=\"c-blog-article__date\"]")?,
            text: compile("div.c-blog-article__text")?,
            image: compile("img")?,
        })
    }
}

/// Parser for `hinatazaka46.com` blog pages
pub struct HinatazakaAdapter {
    home: Url,
    selectors: Selectors,
    image_threshold: usize,
    aliases: AliasPolicy,
}

impl HinatazakaAdapter {
    /// Create an adapter for the given home page
    pub fn new(home_page: &str) -> Result<Self, CrawlError> {
        Ok(Self {
            home: parse_home(home_page)?,
            selectors: Selectors::new()?,
            image_threshold: DEFAULT_IMAGE_THRESHOLD,
            aliases: AliasPolicy::hinatazaka(),
        })
    }

    /// Override the image count that triggers an article re-fetch
    pub fn with_image_threshold(mut self, threshold: usize) -> Self {
        self.image_threshold = threshold;
        self
    }

    fn entry(&self, element: ElementRef<'_>) -> ListingEntry {
        let href = element
            .select(&self.selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or(FALLBACK_LINK);
        let url = self.home.join(href).ok();
        let member = strip_whitespace(&inner_text(element, &self.selectors.name));
        let text = element.select(&self.selectors.text).next();

        let content = if self.aliases.is_aliased(&member) {
            text.map(|node| node.text().collect::<Vec<_>>().join(" "))
        } else {
            None
        };

        ListingEntry {
            id: url.as_ref().and_then(blog_id),
            url: url.map(String::from),
            title: inner_text(element, &self.selectors.title),
            raw_date: Some(inner_text(element, &self.selectors.date)),
            images: text
                .map(|node| image_sources(node, &self.selectors.image))
                .unwrap_or_default(),
            member,
            content,
        }
    }
}

impl SiteAdapter for HinatazakaAdapter {
    fn group(&self) -> IdolGroup {
        IdolGroup::Hinatazaka46
    }

    fn list_url(&self, page: u32) -> String {
        format!(
            "{}/s/official/diary/member/list?page={}",
            home_prefix(&self.home),
            page
        )
    }

    fn extract_entries(&self, document: &Html) -> Vec<ListingEntry> {
        document
            .select(&self.selectors.article)
            .map(|element| self.entry(element))
            .collect()
    }

    fn detail_url<'a>(&self, entry: &'a ListingEntry) -> Option<&'a str> {
        if entry.images.len() > self.image_threshold {
            entry.url.as_deref()
        } else {
            None
        }
    }

    fn parse_blog(&self, entry: ListingEntry, detail: Option<&Html>) -> Option<BlogDraft> {
        let images = detail
            .and_then(|document| document.select(&self.selectors.text).next())
            .map(|node| image_sources(node, &self.selectors.image))
            .unwrap_or(entry.images);

        Some(BlogDraft {
            id: entry.id?,
            name: entry.member,
            title: entry.title,
            raw_date: entry.raw_date.unwrap_or_default(),
            images,
            content: entry.content,
        })
    }

    fn date_format(&self) -> DateFormat {
        DateFormat::DotMinute
    }

    fn japan_time(&self) -> bool {
        true
    }

    fn alias_policy(&self) -> Option<&AliasPolicy> {
        Some(&self.aliases)
    }
}
