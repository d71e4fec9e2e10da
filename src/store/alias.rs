//! Regrouping of store records into persisted member records
//!
//! Some sites publish a rotating relay of members under one nominal name.
//! An `AliasPolicy` lists the real members behind such a name, and
//! `finalize` routes each relay post to one of them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::date;
use crate::models::{BlogRecord, IdolGroup, MemberRecord};

/// Nominal relay names and the members they rotate through
#[derive(Debug, Clone, Default)]
pub struct AliasPolicy {
    relays: HashMap<String, Vec<String>>,
}

impl AliasPolicy {
    /// Create an empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relay name and its alternates, in rotation order
    pub fn with_relay<I, S>(mut self, nominal: impl Into<String>, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relays.insert(
            nominal.into(),
            alternates.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Alternates behind a nominal name, if it is a relay
    pub fn alternates(&self, name: &str) -> Option<&[String]> {
        self.relays
            .get(name)
            .map(Vec::as_slice)
            .filter(|alternates| !alternates.is_empty())
    }

    /// Whether a member name is a relay name
    pub fn is_aliased(&self, name: &str) -> bool {
        self.alternates(name).is_some()
    }

    /// The fifth-generation relay blog of Hinatazaka46
    pub fn hinatazaka() -> Self {
        Self::new().with_relay(
            "五期生リレー",
            [
                "大野愛実",
                "鶴崎仁香",
                "坂井新奈",
                "佐藤優羽",
                "下田衣珠季",
                "片山紗希",
                "大田美月",
                "高井俐香",
                "松尾桜",
                "蔵盛妃那乃",
            ],
        )
    }
}

/// Pick the alternate a relay post belongs to.
///
/// A name in the title wins, then a name in the content, then the rotation
/// by position.
fn assign<'a>(alternates: &'a [String], record: &BlogRecord, position: usize) -> &'a str {
    let in_title = alternates
        .iter()
        .find(|alt| record.title.contains(alt.as_str()));
    let in_content = || {
        record
            .content
            .as_deref()
            .and_then(|content| alternates.iter().find(|alt| content.contains(alt.as_str())))
    };
    in_title
        .or_else(in_content)
        .unwrap_or(&alternates[position % alternates.len()])
}

fn date_key(record: &BlogRecord) -> Option<NaiveDateTime> {
    record.date_time.as_deref().and_then(date::parse_canonical)
}

/// Ascending by date; records without a usable date go last, ties by ID
fn compare_by_date(a: &BlogRecord, b: &BlogRecord) -> Ordering {
    match (date_key(a), date_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Sort a blog list ascending by date
pub fn sort_blogs(blogs: &mut [BlogRecord]) {
    blogs.sort_by(compare_by_date);
}

/// Group records by member name into persistable member records.
///
/// Relay posts are routed to their alternates; records keep their original
/// `Name`, only the member group they are filed under changes. Every output
/// group is sorted ascending by date.
pub fn finalize<I>(records: I, group: IdolGroup, alias: Option<&AliasPolicy>) -> Vec<MemberRecord>
where
    I: IntoIterator<Item = BlogRecord>,
{
    let mut by_name: BTreeMap<String, Vec<BlogRecord>> = BTreeMap::new();
    for record in records {
        by_name.entry(record.name.clone()).or_default().push(record);
    }

    let mut output: BTreeMap<String, Vec<BlogRecord>> = BTreeMap::new();
    for (name, mut blogs) in by_name {
        match alias.and_then(|policy| policy.alternates(&name)) {
            Some(alternates) => {
                sort_blogs(&mut blogs);
                for (position, blog) in blogs.into_iter().enumerate() {
                    let target = assign(alternates, &blog, position);
                    output.entry(target.to_string()).or_default().push(blog);
                }
            }
            None => output.entry(name).or_default().extend(blogs),
        }
    }

    output
        .into_iter()
        .map(|(name, mut blog_list)| {
            sort_blogs(&mut blog_list);
            MemberRecord {
                name,
                group,
                blog_list,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BlogStore;

    fn blog(id: &str, name: &str, title: &str, date_time: Option<&str>) -> BlogRecord {
        BlogRecord {
            id: id.to_string(),
            name: name.to_string(),
            title: title.to_string(),
            date_time: date_time.map(str::to_string),
            image_list: Vec::new(),
            content: None,
        }
    }

    fn relay_policy() -> AliasPolicy {
        AliasPolicy::new().with_relay("Relay", ["Alice", "Bob", "Carol"])
    }

    #[test]
    fn test_new_record_appended_in_date_order() {
        let store = BlogStore::new();
        store.insert(blog("A", "M1", "first", Some("2023-01-02T10:00:00+08:00")));
        store.insert(blog("B", "M1", "second", Some("2023-01-05T10:00:00+08:00")));

        let members = finalize(store.records(), IdolGroup::Hinatazaka46, None);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "M1");
        assert_eq!(members[0].group, IdolGroup::Hinatazaka46);
        let ids: Vec<_> = members[0].blog_list.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_missing_dates_sort_last() {
        let members = finalize(
            vec![
                blog("n", "M1", "t", None),
                blog("late", "M1", "t", Some("2023-02-01T00:00:00+08:00")),
                blog("early", "M1", "t", Some("2023-01-01T00:00:00+08:00")),
            ],
            IdolGroup::Sakurazaka46,
            None,
        );
        let ids: Vec<_> = members[0].blog_list.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "n"]);
    }

    #[test]
    fn test_title_match_wins_over_rotation() {
        let policy = relay_policy();
        let members = finalize(
            vec![
                blog("1", "Relay", "hello", Some("2023-01-01T00:00:00+08:00")),
                blog("2", "Relay", "Carol here", Some("2023-01-02T00:00:00+08:00")),
            ],
            IdolGroup::Hinatazaka46,
            Some(&policy),
        );

        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);
        let carol = members.iter().find(|m| m.name == "Carol").unwrap();
        assert_eq!(carol.blog_list[0].id, "2");
        // record keeps its nominal name
        assert_eq!(carol.blog_list[0].name, "Relay");
    }

    #[test]
    fn test_content_match_and_rotation() {
        let policy = relay_policy();
        let mut by_content = blog("2", "Relay", "no name", Some("2023-01-02T00:00:00+08:00"));
        by_content.content = Some("today Alice wrote".to_string());

        let members = finalize(
            vec![
                blog("1", "Relay", "x", Some("2023-01-01T00:00:00+08:00")),
                by_content,
                blog("3", "Relay", "y", Some("2023-01-03T00:00:00+08:00")),
                blog("4", "Relay", "z", Some("2023-01-04T00:00:00+08:00")),
            ],
            IdolGroup::Hinatazaka46,
            Some(&policy),
        );

        let find = |name: &str| -> Vec<String> {
            members
                .iter()
                .find(|m| m.name == name)
                .map(|m| m.blog_list.iter().map(|b| b.id.clone()).collect())
                .unwrap_or_default()
        };
        // positions 0 and 3 rotate to Alice; position 1 matched Alice by content
        assert_eq!(find("Alice"), vec!["1", "2", "4"]);
        assert_eq!(find("Carol"), vec!["3"]);
        assert!(find("Bob").is_empty());
    }

    #[test]
    fn test_unaliased_groups_pass_through() {
        let policy = relay_policy();
        let members = finalize(
            vec![blog("1", "M1", "Alice", Some("2023-01-01T00:00:00+08:00"))],
            IdolGroup::Hinatazaka46,
            Some(&policy),
        );
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "M1");
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let policy = relay_policy();
        let store = BlogStore::new();
        store.insert(blog("1", "Relay", "Bob", Some("2023-01-01T00:00:00+08:00")));
        store.insert(blog("2", "M1", "t", None));
        store.insert(blog("3", "M1", "t", Some("2023-01-03T00:00:00+08:00")));

        let members = finalize(store.records(), IdolGroup::Hinatazaka46, Some(&policy));
        let reloaded = BlogStore::from_members(members);
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }
}
