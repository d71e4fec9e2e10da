//! In-memory blog store shared by the lanes of one crawl run

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{BlogRecord, MemberRecord};

/// Blog records keyed by blog ID
///
/// Lanes share one store behind an `Arc`. The check and the insert happen
/// under one lock, so two lanes racing on the same ID see exactly one
/// accepted insert.
#[derive(Debug, Default)]
pub struct BlogStore {
    blogs: Mutex<HashMap<String, BlogRecord>>,
}

impl BlogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten persisted member records into an ID-keyed store.
    ///
    /// A later record with the same ID replaces an earlier one.
    pub fn from_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = MemberRecord>,
    {
        let blogs = members
            .into_iter()
            .flat_map(|member| member.blog_list)
            .map(|blog| (blog.id.clone(), blog))
            .collect();
        Self {
            blogs: Mutex::new(blogs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BlogRecord>> {
        self.blogs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a record under its ID.
    ///
    /// Returns `false` without touching the store when the ID is already
    /// present.
    pub fn insert(&self, record: BlogRecord) -> bool {
        let mut blogs = self.lock();
        if blogs.contains_key(&record.id) {
            return false;
        }
        blogs.insert(record.id.clone(), record);
        true
    }

    /// Whether a blog ID is already known
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Look up a record by ID
    pub fn get(&self, id: &str) -> Option<BlogRecord> {
        self.lock().get(id).cloned()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents ordered by ID
    pub fn snapshot(&self) -> BTreeMap<String, BlogRecord> {
        self.lock()
            .iter()
            .map(|(id, blog)| (id.clone(), blog.clone()))
            .collect()
    }

    /// All records, in no particular order
    pub fn records(&self) -> Vec<BlogRecord> {
        self.lock().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdolGroup;

    fn blog(id: &str, name: &str) -> BlogRecord {
        BlogRecord {
            id: id.to_string(),
            name: name.to_string(),
            title: format!("title {id}"),
            date_time: Some("2023-01-02T10:00:00+08:00".to_string()),
            image_list: Vec::new(),
            content: None,
        }
    }

    #[test]
    fn test_insert_twice_keeps_one_record() {
        let store = BlogStore::new();
        assert!(store.insert(blog("x", "M1")));

        let mut changed = blog("x", "M2");
        changed.title = "other".to_string();
        assert!(!store.insert(changed));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("x").unwrap().name, "M1");
    }

    #[test]
    fn test_from_members_flattens() {
        let members = vec![
            MemberRecord {
                name: "M1".to_string(),
                group: IdolGroup::Sakurazaka46,
                blog_list: vec![blog("a", "M1"), blog("b", "M1")],
            },
            MemberRecord {
                name: "M2".to_string(),
                group: IdolGroup::Sakurazaka46,
                blog_list: vec![blog("c", "M2")],
            },
        ];

        let store = BlogStore::from_members(members);
        assert_eq!(store.len(), 3);
        assert!(store.contains("c"));
        assert_eq!(
            store.snapshot().keys().cloned().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_concurrent_inserts_accept_once() {
        let store = std::sync::Arc::new(BlogStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.insert(blog("same", "M1")))
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(store.len(), 1);
    }
}
