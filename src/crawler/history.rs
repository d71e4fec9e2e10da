//! Hinatazaka46 history photo columns
//!
//! Columns are requested one index at a time from a JSON endpoint. Unlike
//! the page lanes, any failed request aborts the whole scan; whatever was
//! collected up to that point is still written back.

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::crawler::CrawlerConfig;
use crate::crawler::site::parse_home;
use crate::http::FetchClient;
use crate::models::{HistoryPhoto, HistoryPhotoColumn, IdolGroup};
use crate::store::Storage;

/// Indices tried past the highest known column
pub const LOOKAHEAD_COLUMNS: u32 = 5;

/// Thumbnail path segment removed from image sources
const THUMBNAIL_SEGMENT: &str = "/750_750_102400";

/// Endpoint payload; a missing or `null` photo list means no column
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history_photo: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    image_src: String,
    #[serde(default)]
    code: String,
}

/// Code string of a column index
pub fn column_code(col_index: u32) -> String {
    format!("fc_photo_{col_index}")
}

fn column_from(col_index: u32, code: String, photos: Vec<HistoryEntry>) -> Option<HistoryPhotoColumn> {
    let title = photos
        .first()?
        .title
        .split('[')
        .next()
        .unwrap_or_default()
        .to_string();

    let image_list = photos
        .into_iter()
        .enumerate()
        .map(|(photo_index, photo)| HistoryPhoto {
            photo_index,
            image_src: photo.image_src.replace(THUMBNAIL_SEGMENT, ""),
            title: format!("{}.jpg", photo.code),
        })
        .collect();

    Some(HistoryPhotoColumn {
        col_index,
        title,
        code,
        image_list,
    })
}

/// Look for new history columns and append them to the persisted list
///
/// Returns the full column list as written to disk.
#[instrument(skip(config, storage))]
pub async fn crawl_history(
    config: &CrawlerConfig,
    storage: &Storage,
) -> crate::Result<Vec<HistoryPhotoColumn>> {
    let home = config
        .home_page
        .as_deref()
        .unwrap_or(IdolGroup::Hinatazaka46.home_page());
    let home = parse_home(home)?;
    let client = FetchClient::new(config)?;

    let mut columns = storage.load_history().await?;
    let max_index = columns.iter().map(|col| col.col_index).max().unwrap_or(0);
    let known = columns.len();

    for col_index in 1..=max_index + LOOKAHEAD_COLUMNS {
        if columns.iter().any(|col| col.col_index == col_index) {
            continue;
        }

        let code = column_code(col_index);
        let url = match home.join(&format!("/s/official/api/list/history?ct={code}")) {
            Ok(url) => url,
            Err(e) => {
                warn!("Error on column {}: {}", col_index, e);
                break;
            }
        };

        let response: Option<HistoryResponse> = match client.fetch_json(url.as_str()).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error on column {}: {}", col_index, e);
                break;
            }
        };

        let photos = response
            .and_then(|response| response.history_photo)
            .unwrap_or_default();
        match column_from(col_index, code, photos) {
            Some(column) => {
                info!(
                    "History column {} [{}] ImgCount:[{}]",
                    col_index,
                    column.title,
                    column.image_list.len()
                );
                columns.push(column);
            }
            None => debug!("History column {} is empty", col_index),
        }
    }

    storage.save_history(&columns).await?;
    info!(
        "Saved {} history columns ({} new)",
        columns.len(),
        columns.len() - known
    );
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use tempfile::tempdir;

    async fn column(server: &mut ServerGuard, index: u32, status: usize, body: &str) -> Mock {
        server
            .mock("GET", "/s/official/api/list/history")
            .match_query(Matcher::UrlEncoded("ct".into(), column_code(index)))
            .with_status(status)
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }

    fn photos(title: &str, codes: &[&str]) -> String {
        let photos: Vec<_> = codes
            .iter()
            .map(|code| {
                serde_json::json!({
                    "title": title,
                    "code": code,
                    "image_src": format!("https://cdn.hinatazaka46.com/images/750_750_102400/{code}.jpg"),
                })
            })
            .collect();
        serde_json::json!({ "history_photo": photos }).to_string()
    }

    fn config(server: &ServerGuard) -> CrawlerConfig {
        CrawlerConfig::builder().home_page(server.url()).build()
    }

    #[test]
    fn test_column_from_response() {
        let response: HistoryResponse =
            serde_json::from_str(&photos("2019 デビュー[1/2]", &["a01", "a02"])).unwrap();
        let column = column_from(3, column_code(3), response.history_photo.unwrap()).unwrap();

        assert_eq!(column.title, "2019 デビュー");
        assert_eq!(column.code, "fc_photo_3");
        assert_eq!(column.image_list[1].photo_index, 1);
        assert_eq!(column.image_list[1].title, "a02.jpg");
        assert_eq!(
            column.image_list[0].image_src,
            "https://cdn.hinatazaka46.com/images/a01.jpg"
        );

        assert!(column_from(4, column_code(4), Vec::new()).is_none());
    }

    #[tokio::test]
    async fn test_empty_store_scans_first_five() {
        let mut server = Server::new_async().await;
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path());

        let mut mocks = vec![
            column(&mut server, 1, 200, &photos("one[x]", &["p1"])).await,
            column(&mut server, 2, 200, r#"{"history_photo": []}"#).await,
        ];
        for index in 3..=5 {
            mocks.push(column(&mut server, index, 200, &photos("more", &["q"])).await);
        }
        let beyond = server
            .mock("GET", "/s/official/api/list/history")
            .match_query(Matcher::UrlEncoded("ct".into(), column_code(6)))
            .expect(0)
            .create_async()
            .await;

        let columns = crawl_history(&config(&server), &storage).await.unwrap();
        let indices: Vec<_> = columns.iter().map(|c| c.col_index).collect();
        assert_eq!(indices, vec![1, 3, 4, 5]);
        assert_eq!(columns[0].title, "one");
        assert_eq!(storage.load_history().await.unwrap(), columns);

        for mock in mocks {
            mock.assert_async().await;
        }
        beyond.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_aborts_scan_and_keeps_progress() {
        let mut server = Server::new_async().await;
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path());
        storage
            .save_history(&[HistoryPhotoColumn {
                col_index: 2,
                title: "known".to_string(),
                code: column_code(2),
                image_list: vec![],
            }])
            .await
            .unwrap();

        let first = column(&mut server, 1, 200, &photos("first", &["f"])).await;
        let failing = column(&mut server, 3, 500, "").await;
        let after = server
            .mock("GET", "/s/official/api/list/history")
            .match_query(Matcher::UrlEncoded("ct".into(), column_code(4)))
            .expect(0)
            .create_async()
            .await;

        let columns = crawl_history(&config(&server), &storage).await.unwrap();
        let indices: Vec<_> = columns.iter().map(|c| c.col_index).collect();
        assert_eq!(indices, vec![2, 1]);
        assert_eq!(storage.load_history().await.unwrap().len(), 2);

        first.assert_async().await;
        failing.assert_async().await;
        after.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_or_sparse_payloads_are_empty_columns() {
        let mut server = Server::new_async().await;
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path());

        let mut mocks = vec![
            column(&mut server, 1, 200, r#"{"history_photo": null}"#).await,
            column(&mut server, 2, 200, r#"{"history_photo": [{"title": "sparse"}]}"#).await,
            column(&mut server, 3, 200, "null").await,
            column(&mut server, 4, 200, "{}").await,
        ];
        mocks.push(column(&mut server, 5, 200, &photos("five", &["p5"])).await);

        let columns = crawl_history(&config(&server), &storage).await.unwrap();
        let indices: Vec<_> = columns.iter().map(|c| c.col_index).collect();
        assert_eq!(indices, vec![2, 5]);
        assert_eq!(columns[0].title, "sparse");
        assert_eq!(columns[0].image_list[0].title, ".jpg");
        assert_eq!(columns[0].image_list[0].image_src, "");

        for mock in mocks {
            mock.assert_async().await;
        }
    }
}
