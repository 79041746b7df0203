//! M3U playlist parsing
//!
//! Converts extended-M3U text into a flat entry list, then into channel and
//! stream records. Pure functions, no I/O.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::models::{Channel, Stream};

lazy_static! {
    /// Regex for key="value" attribute pairs on an EXTINF line
    static ref ATTR_REGEX: Regex = Regex::new(r#"(?i)([a-z-]+)="([^"]*)""#).unwrap();
}

/// One playlist entry: an EXTINF directive paired with its URL line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct M3uEntry {
    pub url: String,
    pub title: Option<String>,
    pub tvg_id: Option<String>,
    pub tvg_name: Option<String>,
    pub logo: Option<String>,
    pub group_title: Option<String>,
}

#[derive(Debug, Default)]
struct PendingEntry {
    title: Option<String>,
    tvg_id: Option<String>,
    tvg_name: Option<String>,
    logo: Option<String>,
    group_title: Option<String>,
}

/// Parse M3U/M3U8 text into entries.
///
/// Blank lines and non-EXTINF comments are skipped. An EXTINF line opens a
/// pending entry; the next http(s) URL line closes it, provided the entry has
/// a non-empty title or tvg-name. The pending state is cleared by a URL line
/// either way.
pub fn parse_m3u(content: &str) -> Vec<M3uEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for raw_line in content.lines() {
        let line = raw_line.trim();

        if line.is_empty() || (line.starts_with('#') && !line.starts_with("#EXTINF")) {
            continue;
        }

        if line.starts_with("#EXTINF") {
            let attrs = parse_attributes(line);
            // Free-text title is everything after the last comma
            let title = line
                .rsplit_once(',')
                .map(|(_, t)| t.trim().to_string())
                .filter(|t| !t.is_empty());

            pending = Some(PendingEntry {
                title,
                tvg_id: attrs.get("tvg-id").cloned(),
                tvg_name: attrs.get("tvg-name").cloned(),
                logo: attrs.get("tvg-logo").cloned(),
                group_title: attrs.get("group-title").cloned(),
            });
        } else if line.starts_with("http://") || line.starts_with("https://") {
            if let Some(entry) = pending.take() {
                if entry.title.is_some() || entry.tvg_name.is_some() {
                    entries.push(M3uEntry {
                        url: line.to_string(),
                        title: entry.title.or_else(|| entry.tvg_name.clone()),
                        tvg_id: entry.tvg_id,
                        tvg_name: entry.tvg_name,
                        logo: entry.logo,
                        group_title: entry.group_title,
                    });
                }
            }
        }
    }

    entries
}

/// Extract key="value" attributes; keys lowercased, empty values dropped
fn parse_attributes(line: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();

    for caps in ATTR_REGEX.captures_iter(line) {
        let key = caps[1].to_lowercase();
        let value = caps[2].to_string();
        if !value.is_empty() {
            attrs.insert(key, value);
        }
    }

    attrs
}

/// Convert entries to channel and stream records.
///
/// Channel identity is `tvg-id`, else the synthetic `m3u-<index>` (not stable
/// across refetches when entry order shifts). The first entry per id wins for
/// the channel record; every entry yields its own stream.
pub fn entries_to_channels_and_streams(entries: &[M3uEntry]) -> (Vec<Channel>, Vec<Stream>) {
    let mut channels = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut streams = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let channel_id = entry
            .tvg_id
            .clone()
            .unwrap_or_else(|| format!("m3u-{index}"));
        let channel_name = entry
            .title
            .clone()
            .or_else(|| entry.tvg_name.clone())
            .unwrap_or_else(|| format!("Channel {}", index + 1));
        let category = entry
            .group_title
            .as_deref()
            .unwrap_or("general")
            .to_lowercase();

        if seen_ids.insert(channel_id.clone()) {
            channels.push(Channel {
                id: channel_id.clone(),
                name: channel_name.clone(),
                network: None,
                // Playlists carry no country signal
                country: "INT".to_string(),
                languages: Vec::new(),
                categories: vec![category],
                is_nsfw: false,
                launched: None,
                closed: None,
                website: None,
                logo: entry.logo.clone(),
            });
        }

        streams.push(Stream {
            channel: Some(channel_id),
            url: entry.url.clone(),
            feed: None,
            title: Some(channel_name),
            quality: None,
            referrer: None,
            user_agent: None,
            status: None,
        });
    }

    (channels, streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_entry() {
        let input = "#EXTINF:-1 tvg-id=\"BBC1\" tvg-logo=\"http://x/l.png\" group-title=\"News\",BBC One\nhttp://stream/bbc1.m3u8";
        let entries = parse_m3u(input);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tvg_id.as_deref(), Some("BBC1"));
        assert_eq!(entries[0].logo.as_deref(), Some("http://x/l.png"));
        assert_eq!(entries[0].group_title.as_deref(), Some("News"));
        assert_eq!(entries[0].title.as_deref(), Some("BBC One"));
        assert_eq!(entries[0].url, "http://stream/bbc1.m3u8");
    }

    #[test]
    fn test_single_entry_to_channel_and_stream() {
        let input = "#EXTINF:-1 tvg-id=\"BBC1\" tvg-logo=\"http://x/l.png\" group-title=\"News\",BBC One\nhttp://stream/bbc1.m3u8";
        let (channels, streams) = entries_to_channels_and_streams(&parse_m3u(input));

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "BBC1");
        assert_eq!(channels[0].name, "BBC One");
        assert_eq!(channels[0].categories, vec!["news"]);
        assert_eq!(channels[0].country, "INT");
        assert!(!channels[0].is_nsfw);

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].channel.as_deref(), Some("BBC1"));
        assert_eq!(streams[0].url, "http://stream/bbc1.m3u8");
    }

    #[test]
    fn test_blank_lines_and_comments_skipped() {
        let input = "#EXTM3U\n\n#EXTVLCOPT:something\n#EXTINF:-1,Channel A\nhttp://a\n";
        let entries = parse_m3u(input);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Channel A"));
    }

    #[test]
    fn test_url_without_extinf_dropped() {
        let entries = parse_m3u("http://orphan/stream.m3u8\n#EXTINF:-1,A\nhttp://a");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "http://a");
    }

    #[test]
    fn test_entry_without_title_or_name_dropped_and_pending_cleared() {
        let input = "#EXTINF:-1 tvg-logo=\"http://x/l.png\",\nhttp://a\nhttp://b";
        // First URL line drops the titleless entry and clears pending, so the
        // second URL line is an orphan too
        assert!(parse_m3u(input).is_empty());
    }

    #[test]
    fn test_tvg_name_stands_in_for_missing_title() {
        let input = "#EXTINF:-1 tvg-name=\"Named\"\nhttp://a";
        let entries = parse_m3u(input);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Named"));
    }

    #[test]
    fn test_title_after_last_comma() {
        let input = "#EXTINF:-1 group-title=\"A,B\",The Title\nhttp://a";
        let entries = parse_m3u(input);

        assert_eq!(entries[0].title.as_deref(), Some("The Title"));
        assert_eq!(entries[0].group_title.as_deref(), Some("A,B"));
    }

    #[test]
    fn test_empty_attribute_values_treated_as_absent() {
        let input = "#EXTINF:-1 tvg-id=\"\" tvg-name=\"\",Title\nhttp://a";
        let (channels, _) = entries_to_channels_and_streams(&parse_m3u(input));

        assert_eq!(channels[0].id, "m3u-0");
    }

    #[test]
    fn test_duplicate_tvg_id_first_entry_wins_for_channel() {
        let input = "#EXTINF:-1 tvg-id=\"X\" group-title=\"News\",First\nhttp://a\n#EXTINF:-1 tvg-id=\"X\" group-title=\"Sports\",Second\nhttp://b";
        let (channels, streams) = entries_to_channels_and_streams(&parse_m3u(input));

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "First");
        assert_eq!(channels[0].categories, vec!["news"]);

        // Every entry still yields its own stream, in source order
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].url, "http://a");
        assert_eq!(streams[1].url, "http://b");
        assert_eq!(streams[1].channel.as_deref(), Some("X"));
    }

    #[test]
    fn test_synthetic_ids_follow_entry_ordinal() {
        let input = "#EXTINF:-1,A\nhttp://a\n#EXTINF:-1,B\nhttp://b";
        let (channels, _) = entries_to_channels_and_streams(&parse_m3u(input));

        assert_eq!(channels[0].id, "m3u-0");
        assert_eq!(channels[1].id, "m3u-1");
    }

    #[test]
    fn test_channel_count_matches_distinct_ids() {
        let input = "#EXTINF:-1 tvg-id=\"X\",A\nhttp://a\n#EXTINF:-1 tvg-id=\"X\",B\nhttp://b\n#EXTINF:-1,C\nhttp://c";
        let entries = parse_m3u(input);
        let (channels, streams) = entries_to_channels_and_streams(&entries);

        assert_eq!(channels.len(), 2); // X and m3u-2
        assert_eq!(streams.len(), 3);
    }
}
