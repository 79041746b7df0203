//! Core data models

pub mod channel;
pub mod source;

pub use channel::{
    AppSettings, CacheMetadata, Channel, ChannelFilters, ChannelsQuery, ChannelsResponse, Country,
    Favorite, Language, NormalizedData, RecentlyPlayed, SettingsUpdate, Stream, StreamFilter,
    StreamStatus,
};
pub use source::DataSource;
