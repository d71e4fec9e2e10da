//! Sakurazaka46 blog adapter
//!
//! The listing shows member, title and link only; date and images come from
//! the article page, which is always fetched.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawler::CrawlError;
use crate::crawler::site::{
    BlogDraft, ListingEntry, SiteAdapter, blog_id, compile, home_prefix, image_sources,
    inner_text, parse_home, strip_whitespace,
};
use crate::date::DateFormat;
use crate::models::IdolGroup;

struct Selectors {
    item: Selector,
    link: Selector,
    name: Selector,
    title: Selector,
    article: Selector,
    foot: Selector,
    date: Selector,
    image: Selector,
}

impl Selectors {
    fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            item: compile("li.box")?,
            link: compile("a")?,
            name: compile("p[class=\"name\"]")?,
            title: compile("h3[class=\"title\"]")?,
            article: compile("div.box-article")?,
            foot: compile("div.blog-foot")?,
            date: compile("p[class=\"date wf-a\"]")?,
            image: compile("img")?,
        })
    }
}

/// Parser for `sakurazaka46.com` blog pages
pub struct SakurazakaAdapter {
    home: Url,
    selectors: Selectors,
}

impl SakurazakaAdapter {
    /// Create an adapter for the given home page
    pub fn new(home_page: &str) -> Result<Self, CrawlError> {
        Ok(Self {
            home: parse_home(home_page)?,
            selectors: Selectors::new()?,
        })
    }

    fn entry(&self, element: ElementRef<'_>) -> ListingEntry {
        let url = element
            .select(&self.selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| self.home.join(href).ok());

        ListingEntry {
            id: url.as_ref().and_then(blog_id),
            url: url.map(String::from),
            member: strip_whitespace(&inner_text(element, &self.selectors.name)),
            title: inner_text(element, &self.selectors.title),
            ..ListingEntry::default()
        }
    }
}

impl SiteAdapter for SakurazakaAdapter {
    fn group(&self) -> IdolGroup {
        IdolGroup::Sakurazaka46
    }

    fn list_url(&self, page: u32) -> String {
        format!(
            "{}/s/s46/diary/blog/list?ima=0000&page={}",
            home_prefix(&self.home),
            page
        )
    }

    /// Only `<li class="box">` counts; `<li class="box other">` siblings are
    /// unrelated widgets and must not be picked up.
    fn extract_entries(&self, document: &Html) -> Vec<ListingEntry> {
        document
            .select(&self.selectors.item)
            .filter(|element| element.value().attr("class") == Some("box"))
            .map(|element| self.entry(element))
            .collect()
    }

    fn detail_url<'a>(&self, entry: &'a ListingEntry) -> Option<&'a str> {
        entry.url.as_deref()
    }

    fn parse_blog(&self, entry: ListingEntry, detail: Option<&Html>) -> Option<BlogDraft> {
        let detail = detail?;
        let article = detail.select(&self.selectors.article).next()?;
        let foot = detail.select(&self.selectors.foot).next()?;

        Some(BlogDraft {
            id: entry.id?,
            name: entry.member,
            title: entry.title,
            raw_date: inner_text(foot, &self.selectors.date),
            images: image_sources(article, &self.selectors.image),
            content: None,
        })
    }

    fn date_format(&self) -> DateFormat {
        DateFormat::SlashMinute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <ul>
          <li class="box">
            <a href="/s/s46/diary/detail/59157?ima=0000&cd=blog">
              <h3 class="title">桜の季節</h3>
              <p class="name">山田 花子</p>
            </a>
          </li>
          <li class="box extra"><a href="/s/s46/diary/detail/1"><p class="name">banner</p></a></li>
          <li class="box">
            <p class="name">no link</p>
          </li>
        </ul>"#;

    const ARTICLE: &str = r#"
        <div class="box-article">
          <p>text</p>
          <img src="/files/14/diary/s46/blog/phone_image/0001.jpg">
          <img src="">
          <img src="/files/14/diary/s46/blog/phone_image/0002.jpg">
        </div>
        <div class="blog-foot"><p class="date wf-a">2023/05/01 21:07</p></div>"#;

    fn adapter() -> SakurazakaAdapter {
        SakurazakaAdapter::new("https://sakurazaka46.com").unwrap()
    }

    #[test]
    fn test_list_url() {
        assert_eq!(
            adapter().list_url(4),
            "https://sakurazaka46.com/s/s46/diary/blog/list?ima=0000&page=4"
        );
    }

    #[test]
    fn test_exact_class_filter_excludes_extra_classes() {
        let entries = adapter().extract_entries(&Html::parse_document(LISTING));

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.member != "banner"));
        assert_eq!(entries[0].id.as_deref(), Some("59157"));
        assert_eq!(entries[0].member, "山田花子");
        assert_eq!(entries[0].title, "桜の季節");
        assert_eq!(
            entries[0].url.as_deref(),
            Some("https://sakurazaka46.com/s/s46/diary/detail/59157?ima=0000&cd=blog")
        );
        assert_eq!(entries[1].id, None);
    }

    #[test]
    fn test_parse_blog_from_article() {
        let adapter = adapter();
        let entry = adapter
            .extract_entries(&Html::parse_document(LISTING))
            .remove(0);
        assert!(adapter.detail_url(&entry).is_some());

        let draft = adapter
            .parse_blog(entry, Some(&Html::parse_document(ARTICLE)))
            .unwrap();
        assert_eq!(draft.id, "59157");
        assert_eq!(draft.raw_date, "2023/05/01 21:07");
        assert_eq!(
            draft.images,
            vec![
                "/files/14/diary/s46/blog/phone_image/0001.jpg",
                "/files/14/diary/s46/blog/phone_image/0002.jpg"
            ]
        );

        let record = draft.into_record(adapter.date_format(), adapter.japan_time());
        assert_eq!(record.date_time.as_deref(), Some("2023-05-01T21:07:00+08:00"));
    }

    #[test]
    fn test_missing_article_is_none() {
        let adapter = adapter();
        let entry = adapter
            .extract_entries(&Html::parse_document(LISTING))
            .remove(0);
        let page = Html::parse_document("<div class=\"box-article\"></div>");

        assert!(adapter.parse_blog(entry.clone(), Some(&page)).is_none());
        assert!(adapter.parse_blog(entry, None).is_none());
    }
}
