//! Normalization: raw `(channels, streams)` to the indexed snapshot
//!
//! Pure and deterministic for identical inputs. Does not deduplicate, sort
//! or validate cross-references; duplicate channel ids resolve last-write-
//! wins, orphaned streams (no channel reference) are dropped from the
//! per-channel index.

use chrono::Utc;

use crate::models::{Channel, Country, Language, NormalizedData, Stream};
use crate::services::countries::{country_flag, country_name};

/// Build a `NormalizedData` snapshot from raw channel and stream lists
pub fn normalize(channels: Vec<Channel>, streams: Vec<Stream>) -> NormalizedData {
    let mut data = NormalizedData {
        last_updated: Utc::now().timestamp_millis(),
        ..Default::default()
    };

    for channel in channels {
        if !channel.country.is_empty() {
            data.channels_by_country
                .entry(channel.country.clone())
                .or_default()
                .push(channel.id.clone());

            data.countries
                .entry(channel.country.clone())
                .or_insert_with(|| Country {
                    code: channel.country.clone(),
                    name: country_name(&channel.country),
                    flag: country_flag(&channel.country),
                });
        }

        for category in &channel.categories {
            data.categories.insert(category.clone());
            data.channels_by_category
                .entry(category.clone())
                .or_default()
                .push(channel.id.clone());
        }

        for lang in &channel.languages {
            data.channels_by_language
                .entry(lang.clone())
                .or_default()
                .push(channel.id.clone());

            data.languages.entry(lang.clone()).or_insert_with(|| Language {
                code: lang.clone(),
                name: lang.clone(),
            });
        }

        // Last write wins on duplicate ids; the original position is kept
        if data
            .channels
            .insert(channel.id.clone(), channel.clone())
            .is_none()
        {
            data.channel_order.push(channel.id);
        }
    }

    for stream in streams {
        let Some(channel_id) = stream.channel.clone() else {
            continue;
        };
        data.streams_by_channel
            .entry(channel_id)
            .or_default()
            .push(stream);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, country: &str, categories: &[&str], languages: &[&str]) -> Channel {
        Channel {
            id: id.to_string(),
            name: format!("Channel {id}"),
            network: None,
            country: country.to_string(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            is_nsfw: false,
            launched: None,
            closed: None,
            website: None,
            logo: None,
        }
    }

    fn stream(channel: Option<&str>, url: &str) -> Stream {
        Stream {
            channel: channel.map(|s| s.to_string()),
            url: url.to_string(),
            feed: None,
            title: None,
            quality: None,
            referrer: None,
            user_agent: None,
            status: None,
        }
    }

    #[test]
    fn test_indices_point_at_known_channels() {
        let data = normalize(
            vec![
                channel("a", "US", &["news"], &["eng"]),
                channel("b", "UK", &["news", "sports"], &["eng"]),
            ],
            vec![],
        );

        for ids in data
            .channels_by_country
            .values()
            .chain(data.channels_by_category.values())
            .chain(data.channels_by_language.values())
        {
            for id in ids {
                assert!(data.channels.contains_key(id));
            }
        }

        assert_eq!(data.channels_by_category["news"], vec!["a", "b"]);
        assert_eq!(data.channels_by_country["UK"], vec!["b"]);
        assert_eq!(data.channels_by_language["eng"], vec!["a", "b"]);
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let channels = vec![
            channel("a", "US", &["news"], &["eng"]),
            channel("b", "FR", &["general"], &["fra"]),
        ];
        let streams = vec![stream(Some("a"), "http://a/1")];

        let first = normalize(channels.clone(), streams.clone());
        let second = normalize(channels, streams);

        assert_eq!(first.channel_order, second.channel_order);
        assert_eq!(
            first.channels.keys().collect::<std::collections::BTreeSet<_>>(),
            second.channels.keys().collect::<std::collections::BTreeSet<_>>()
        );
        assert_eq!(first.channels_by_country, second.channels_by_country);
        assert_eq!(first.channels_by_category, second.channels_by_category);
        assert_eq!(first.channels_by_language, second.channels_by_language);
    }

    #[test]
    fn test_orphaned_streams_dropped_from_index() {
        let data = normalize(
            vec![channel("a", "US", &[], &[])],
            vec![stream(None, "http://orphan"), stream(Some("a"), "http://a/1")],
        );

        assert_eq!(data.stream_count("a"), 1);
        assert_eq!(data.streams_by_channel.len(), 1);
    }

    #[test]
    fn test_two_streams_same_channel_in_source_order() {
        let data = normalize(
            vec![channel("X", "US", &[], &[])],
            vec![stream(Some("X"), "http://x/1"), stream(Some("X"), "http://x/2")],
        );

        let streams = &data.streams_by_channel["X"];
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].url, "http://x/1");
        assert_eq!(streams[1].url, "http://x/2");
    }

    #[test]
    fn test_duplicate_channel_id_last_write_wins() {
        let mut second = channel("a", "US", &["news"], &[]);
        second.name = "Replacement".to_string();

        let data = normalize(vec![channel("a", "US", &["news"], &[]), second], vec![]);

        assert_eq!(data.channels.len(), 1);
        assert_eq!(data.channels["a"].name, "Replacement");
        assert_eq!(data.channel_order, vec!["a"]);
        // Index lists keep both appends; duplicates are not collapsed here
        assert_eq!(data.channels_by_country["US"].len(), 2);
    }

    #[test]
    fn test_country_metadata_created_on_first_encounter() {
        let data = normalize(vec![channel("a", "US", &[], &[])], vec![]);

        let country = &data.countries["US"];
        assert_eq!(country.name, "United States");
        assert_eq!(country.flag, "\u{1F1FA}\u{1F1F8}");
    }
}
