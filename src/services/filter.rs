//! Filter engine
//!
//! Derives the visible channel subset from a `NormalizedData` snapshot and a
//! set of independent, AND-combined predicates. Evaluation order does not
//! affect the result set; output preserves the snapshot's insertion order.

use crate::models::{Channel, ChannelFilters, NormalizedData, StreamFilter};

/// Apply all active predicates over the snapshot's channels
pub fn filter_channels<'a>(
    data: &'a NormalizedData,
    filters: &ChannelFilters,
) -> Vec<&'a Channel> {
    data.channels_in_order()
        .filter(|channel| matches(channel, data.stream_count(&channel.id), filters))
        .collect()
}

/// Whether a single channel passes every active predicate
pub fn matches(channel: &Channel, stream_count: usize, filters: &ChannelFilters) -> bool {
    if filters.hide_nsfw && channel.is_nsfw {
        return false;
    }

    if let Some(country) = &filters.country {
        if &channel.country != country {
            return false;
        }
    }

    if let Some(category) = &filters.category {
        if !channel.categories.iter().any(|c| c == category) {
            return false;
        }
    }

    if let Some(language) = &filters.language {
        if !channel.languages.iter().any(|l| l == language) {
            return false;
        }
    }

    match filters.stream_filter {
        StreamFilter::All => {}
        StreamFilter::WithStreams => {
            if stream_count == 0 {
                return false;
            }
        }
        StreamFilter::NoStreams => {
            if stream_count > 0 {
                return false;
            }
        }
    }

    if let Some(query) = &filters.query {
        let q = query.to_lowercase();
        let matches_name = channel.name.to_lowercase().contains(&q);
        let matches_network = channel
            .network
            .as_ref()
            .map(|n| n.to_lowercase().contains(&q))
            .unwrap_or(false);
        let matches_category = channel
            .categories
            .iter()
            .any(|c| c.to_lowercase().contains(&q));

        if !matches_name && !matches_network && !matches_category {
            return false;
        }
    }

    true
}

/// Mixed-content classification for a stream URL relative to the protocol
/// the client app is served over
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedContentInfo {
    pub stream_protocol: String,
    pub is_mixed_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// An HTTP stream under an HTTPS app is mixed content and likely blocked
pub fn detect_mixed_content(stream_url: &str, app_protocol: &str) -> MixedContentInfo {
    let stream_protocol = if stream_url.starts_with("https://") {
        "https:"
    } else {
        "http:"
    };
    let is_mixed_content = app_protocol == "https:" && stream_protocol == "http:";

    MixedContentInfo {
        stream_protocol: stream_protocol.to_string(),
        is_mixed_content,
        warning: is_mixed_content.then(|| {
            "This stream uses HTTP and may be blocked by your browser on HTTPS. \
             Run locally on http://localhost for best compatibility."
                .to_string()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::normalize;
    use crate::models::Stream;

    fn channel(id: &str, country: &str, categories: &[&str]) -> Channel {
        Channel {
            id: id.to_string(),
            name: format!("Channel {id}"),
            network: None,
            country: country.to_string(),
            languages: vec!["eng".to_string()],
            categories: categories.iter().map(|s| s.to_string()).collect(),
            is_nsfw: false,
            launched: None,
            closed: None,
            website: None,
            logo: None,
        }
    }

    fn stream(channel: &str) -> Stream {
        Stream {
            channel: Some(channel.to_string()),
            url: format!("http://stream/{channel}.m3u8"),
            feed: None,
            title: None,
            quality: None,
            referrer: None,
            user_agent: None,
            status: None,
        }
    }

    #[test]
    fn test_country_filter_exact_match() {
        let data = normalize(
            vec![channel("1", "US", &["news"]), channel("2", "UK", &["sports"])],
            vec![],
        );

        let filters = ChannelFilters {
            country: Some("US".to_string()),
            ..Default::default()
        };
        let result = filter_channels(&data, &filters);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }

    #[test]
    fn test_no_active_predicates_returns_all() {
        let data = normalize(
            vec![channel("1", "US", &["news"]), channel("2", "UK", &["sports"])],
            vec![],
        );

        let filters = ChannelFilters {
            hide_nsfw: false,
            ..Default::default()
        };
        assert_eq!(filter_channels(&data, &filters).len(), 2);
    }

    #[test]
    fn test_nsfw_exclusion() {
        let mut adult = channel("x", "US", &["general"]);
        adult.is_nsfw = true;

        let data = normalize(vec![channel("1", "US", &["news"]), adult], vec![]);

        let filters = ChannelFilters::default();
        let result = filter_channels(&data, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");

        let show_all = ChannelFilters {
            hide_nsfw: false,
            ..Default::default()
        };
        assert_eq!(filter_channels(&data, &show_all).len(), 2);
    }

    #[test]
    fn test_stream_presence_tri_state() {
        let data = normalize(
            vec![channel("with", "US", &[]), channel("without", "US", &[])],
            vec![stream("with")],
        );

        let with = ChannelFilters {
            stream_filter: StreamFilter::WithStreams,
            ..Default::default()
        };
        let without = ChannelFilters {
            stream_filter: StreamFilter::NoStreams,
            ..Default::default()
        };

        assert_eq!(filter_channels(&data, &with)[0].id, "with");
        assert_eq!(filter_channels(&data, &without)[0].id, "without");
        assert_eq!(filter_channels(&data, &ChannelFilters::default()).len(), 2);
    }

    #[test]
    fn test_search_matches_name_network_or_category() {
        let mut by_network = channel("n", "US", &["general"]);
        by_network.network = Some("Paramount".to_string());
        by_network.name = "Some Channel".to_string();

        let data = normalize(
            vec![
                channel("1", "US", &["news"]),
                by_network,
                channel("2", "US", &["paranormal"]),
            ],
            vec![],
        );

        let filters = ChannelFilters {
            query: Some("PARA".to_string()),
            ..Default::default()
        };
        let result = filter_channels(&data, &filters);

        // Matches network "Paramount" and category "paranormal", not "news"
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let data = normalize(
            vec![channel("1", "US", &["news"]), channel("2", "US", &["sports"])],
            vec![],
        );

        let filters = ChannelFilters {
            country: Some("US".to_string()),
            category: Some("sports".to_string()),
            ..Default::default()
        };
        let result = filter_channels(&data, &filters);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "2");
    }

    #[test]
    fn test_output_preserves_insertion_order() {
        let data = normalize(
            vec![
                channel("z", "US", &[]),
                channel("a", "US", &[]),
                channel("m", "US", &[]),
            ],
            vec![],
        );

        let ids: Vec<&str> = filter_channels(&data, &ChannelFilters::default())
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_mixed_content_detection() {
        let info = detect_mixed_content("http://stream/a.m3u8", "https:");
        assert!(info.is_mixed_content);
        assert!(info.warning.is_some());

        let info = detect_mixed_content("https://stream/a.m3u8", "https:");
        assert!(!info.is_mixed_content);

        let info = detect_mixed_content("http://stream/a.m3u8", "http:");
        assert!(!info.is_mixed_content);
    }
}
