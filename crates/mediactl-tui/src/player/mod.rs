//! Playback through an external mpv process.

mod launcher;
mod manager;
mod report;
mod status;

#[cfg(all(test, unix))]
pub(crate) mod fake;
#[cfg(all(test, unix))]
mod tests;

pub use launcher::{Launcher, MpvLauncher};
pub use manager::{PlayerManager, PlayerSettings};
pub use report::{ProgressSink, ServerProgressSink};
pub use status::PlayerStatus;

use mediactl_proto::protocol::Metadata;

/// Everything needed to start an item.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub url: String,
    pub title: String,
    pub key: String,
    pub no_report: bool,
    pub compact: bool,
    pub start_offset_ms: u64,
}

impl PlayRequest {
    /// Build the stream request for `item` on the server at `server_url`.
    pub fn for_item(
        item: &Metadata,
        server_url: &str,
        token: &str,
        compact: bool,
        start_offset_ms: u64,
        no_report: bool,
    ) -> anyhow::Result<Self> {
        let part = item
            .stream_part()
            .ok_or_else(|| anyhow::anyhow!("{} has no playable media", item.title))?;
        let sep = if part.key.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}{}X-Plex-Token={}",
            server_url.trim_end_matches('/'),
            part.key,
            sep,
            token
        );
        let mut title = item.display_title();
        if no_report {
            title = format!("Trailer: {title}");
        }
        Ok(Self {
            url,
            title,
            key: item.rating_key.clone(),
            no_report,
            compact,
            start_offset_ms,
        })
    }
}

#[cfg(test)]
mod request_tests {
    use super::*;
    use mediactl_proto::protocol::{Media, Part};

    fn item(part_key: &str) -> Metadata {
        Metadata {
            rating_key: "100".into(),
            kind: "movie".into(),
            title: "Heat".into(),
            year: Some(1995),
            media: vec![Media {
                parts: vec![Part {
                    key: part_key.into(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn url_carries_token() {
        let req =
            PlayRequest::for_item(&item("/library/parts/1/file.mkv"), "http://srv:32400/", "t", false, 0, false)
                .unwrap();
        assert_eq!(req.url, "http://srv:32400/library/parts/1/file.mkv?X-Plex-Token=t");
        assert_eq!(req.title, "Heat (1995)");
        assert_eq!(req.key, "100");
    }

    #[test]
    fn existing_query_uses_ampersand() {
        let req = PlayRequest::for_item(&item("/parts/1?x=1"), "http://srv", "t", true, 5, true).unwrap();
        assert_eq!(req.url, "http://srv/parts/1?x=1&X-Plex-Token=t");
        assert!(req.title.starts_with("Trailer: "));
        assert!(req.compact);
    }

    #[test]
    fn item_without_parts_is_rejected() {
        let mut bare = item("/x");
        bare.media.clear();
        assert!(PlayRequest::for_item(&bare, "http://srv", "t", false, 0, false).is_err());
    }
}
