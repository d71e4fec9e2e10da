//! Site adapter abstraction shared by all group-specific parsers

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawler::CrawlError;
use crate::crawler::hinatazaka::HinatazakaAdapter;
use crate::crawler::sakurazaka::SakurazakaAdapter;
use crate::date::{self, DateFormat};
use crate::models::{BlogRecord, IdolGroup};
use crate::store::AliasPolicy;

/// Text used when a listing element lacks a field
pub const UNKNOWN: &str = "Unknown";

/// Owned snapshot of one blog element on a listing page
///
/// Documents are not `Send`, so adapters copy everything the scanner needs
/// out of the page before the next fetch is awaited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    /// Blog ID, `None` when the element has no usable link
    pub id: Option<String>,
    /// Absolute article URL
    pub url: Option<String>,
    /// Member name, whitespace removed
    pub member: String,
    /// Post title
    pub title: String,
    /// Raw date text when the listing shows it
    pub raw_date: Option<String>,
    /// Image sources found inline on the listing
    pub images: Vec<String>,
    /// Article text, kept only for relay posts
    pub content: Option<String>,
}

/// Fields extracted for one blog, before date normalisation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogDraft {
    pub id: String,
    pub name: String,
    pub title: String,
    pub raw_date: String,
    pub images: Vec<String>,
    pub content: Option<String>,
}

impl BlogDraft {
    /// Normalise the date and build the record
    pub fn into_record(self, format: DateFormat, japan_time: bool) -> BlogRecord {
        BlogRecord {
            date_time: date::normalize(&self.raw_date, format, japan_time),
            id: self.id,
            name: self.name,
            title: self.title,
            image_list: self.images,
            content: self.content,
        }
    }
}

/// Group-specific parsing strategy
///
/// Adapters never perform I/O. The scanner fetches the listing page, asks
/// for its entries, fetches the article page when `detail_url` asks for
/// one, and hands the result to `parse_blog`.
pub trait SiteAdapter: Send + Sync {
    /// Group served by this adapter
    fn group(&self) -> IdolGroup;

    /// URL of a listing page
    fn list_url(&self, page: u32) -> String;

    /// Blog elements of a listing page, in page order; empty ends the lane
    fn extract_entries(&self, document: &Html) -> Vec<ListingEntry>;

    /// Article page to fetch before parsing this entry, if any
    fn detail_url<'a>(&self, entry: &'a ListingEntry) -> Option<&'a str>;

    /// Build the blog draft; `None` means the article could not be found
    fn parse_blog(&self, entry: ListingEntry, detail: Option<&Html>) -> Option<BlogDraft>;

    /// Layout of the site's date text
    fn date_format(&self) -> DateFormat;

    /// Whether displayed times run one hour ahead of the post time
    fn japan_time(&self) -> bool {
        false
    }

    /// Relay aliases applied when the store is finalized
    fn alias_policy(&self) -> Option<&AliasPolicy> {
        None
    }
}

/// Build the adapter of a group, optionally against another home page
pub fn build_adapter(
    group: IdolGroup,
    home_page: Option<&str>,
) -> Result<Arc<dyn SiteAdapter>, CrawlError> {
    let home = home_page.unwrap_or(group.home_page());
    Ok(match group {
        IdolGroup::Sakurazaka46 => Arc::new(SakurazakaAdapter::new(home)?),
        IdolGroup::Hinatazaka46 => Arc::new(HinatazakaAdapter::new(home)?),
    })
}

pub(crate) fn compile(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector)
        .map_err(|e| CrawlError::Selector(format!("Failed to parse selector '{}': {:?}", selector, e)))
}

/// Trimmed text of the first match, or `Unknown`
pub(crate) fn inner_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|found| found.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub(crate) fn strip_whitespace(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Non-empty `src` attributes of the matching images
pub(crate) fn image_sources(element: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    element
        .select(selector)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect()
}

/// Blog ID: the last segment of the URL path
pub(crate) fn blog_id(url: &Url) -> Option<String> {
    url.path()
        .rsplit('/')
        .next()
        .filter(|tail| !tail.is_empty())
        .map(str::to_string)
}

pub(crate) fn parse_home(home_page: &str) -> Result<Url, CrawlError> {
    Ok(Url::parse(home_page)?)
}

/// Home page without a trailing slash, for building list URLs
pub(crate) fn home_prefix(home: &Url) -> String {
    home.as_str().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_id_is_path_tail() {
        let url = Url::parse("https://example.com/s/s46/diary/detail/59157?ima=0000&cd=blog").unwrap();
        assert_eq!(blog_id(&url).as_deref(), Some("59157"));

        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(blog_id(&url), None);
    }

    #[test]
    fn test_inner_text_defaults_to_unknown() {
        let html = Html::parse_fragment("<div><p class=\"name\"> 山田 花子 </p></div>");
        let root = html.root_element();
        let name = compile("p[class=\"name\"]").unwrap();
        let missing = compile("h3").unwrap();

        assert_eq!(strip_whitespace(&inner_text(root, &name)), "山田花子");
        assert_eq!(inner_text(root, &missing), UNKNOWN);
    }

    #[test]
    fn test_into_record_normalizes_date() {
        let draft = BlogDraft {
            id: "1".to_string(),
            name: "M1".to_string(),
            title: "t".to_string(),
            raw_date: "2023.5.1 09:00".to_string(),
            images: vec![],
            content: None,
        };
        let record = draft.clone().into_record(DateFormat::DotMinute, true);
        assert_eq!(record.date_time.as_deref(), Some("2023-05-01T08:00:00+08:00"));

        let unknown = BlogDraft {
            raw_date: UNKNOWN.to_string(),
            ..draft
        };
        assert_eq!(unknown.into_record(DateFormat::DotMinute, true).date_time, None);
    }

    #[test]
    fn test_build_adapter() {
        let adapter = build_adapter(IdolGroup::Hinatazaka46, Some("http://localhost:1234")).unwrap();
        assert_eq!(adapter.group(), IdolGroup::Hinatazaka46);
        assert!(adapter.list_url(3).starts_with("http://localhost:1234/"));
        assert!(adapter.alias_policy().is_some());
    }
}
