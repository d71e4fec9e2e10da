//! # Persisted Data Model
//!
//! Records shared by the crawler, the store and the exporter. Field names
//! follow the on-disk JSON layout (`ID`, `Name`, `BlogList`, ...) so that
//! existing `BlogStatus.JSON` files load without migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Idol groups with a supported blog site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdolGroup {
    Sakurazaka46,
    Hinatazaka46,
}

impl IdolGroup {
    /// Every supported group, in crawl order
    pub const ALL: [IdolGroup; 2] = [IdolGroup::Hinatazaka46, IdolGroup::Sakurazaka46];

    /// Home page of the group's official site
    pub fn home_page(self) -> &'static str {
        match self {
            IdolGroup::Sakurazaka46 => "https://sakurazaka46.com",
            IdolGroup::Hinatazaka46 => "https://hinatazaka46.com",
        }
    }

    /// Folder name used for this group inside an export
    pub fn folder_name(self) -> &'static str {
        match self {
            IdolGroup::Sakurazaka46 => "◢櫻坂46",
            IdolGroup::Hinatazaka46 => "◢日向坂46",
        }
    }

    /// Canonical group name as stored in `MemberRecord::group`
    pub fn as_str(self) -> &'static str {
        match self {
            IdolGroup::Sakurazaka46 => "Sakurazaka46",
            IdolGroup::Hinatazaka46 => "Hinatazaka46",
        }
    }
}

impl fmt::Display for IdolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdolGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sakurazaka" | "sakurazaka46" | "s" => Ok(IdolGroup::Sakurazaka46),
            "hinatazaka" | "hinatazaka46" | "h" => Ok(IdolGroup::Hinatazaka46),
            other => Err(format!("unknown idol group: {other}")),
        }
    }
}

/// One extracted blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogRecord {
    /// Blog ID, the tail of the article URL path
    #[serde(rename = "ID")]
    pub id: String,

    /// Member name with whitespace removed
    #[serde(rename = "Name")]
    pub name: String,

    /// Post title
    #[serde(rename = "Title")]
    pub title: String,

    /// Canonical `+08:00` timestamp, `None` when the site date did not parse
    #[serde(rename = "DateTime")]
    pub date_time: Option<String>,

    /// Image URLs in page order
    #[serde(rename = "ImageList", default)]
    pub image_list: Vec<String>,

    /// Article text, only kept for posts under a relay alias
    #[serde(rename = "Content", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Persisted unit: one member and their blogs sorted by date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Group")]
    pub group: IdolGroup,

    #[serde(rename = "BlogList", default)]
    pub blog_list: Vec<BlogRecord>,
}

/// One photo of a history column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPhoto {
    pub photo_index: usize,
    pub image_src: String,
    pub title: String,
}

/// A Hinatazaka46 history photo column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPhotoColumn {
    pub col_index: u32,
    pub title: String,
    pub code: String,
    #[serde(rename = "imageList", default)]
    pub image_list: Vec<HistoryPhoto>,
}
