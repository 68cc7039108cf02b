use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Upstream sends ids as strings most of the time, but numbers and nulls
/// show up too. Everything is normalised to a string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(D::Error::custom("expected string or number")),
    }
}

// ── Local channel metadata ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    #[serde(rename = "issue-id", default)]
    pub issue_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "tvg-id", default)]
    pub tvg_id: String,
    #[serde(rename = "tvg-name", default)]
    pub tvg_name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub logo: String,
}

/// Root of the channels JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelList {
    #[serde(default)]
    pub channels: Vec<ChannelMetadata>,
}

// ── Upstream catalog ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEntry {
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_media_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_prod_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub start_datetime: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_start: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_end: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_duration: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_position: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub epg_progress: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub start_time_unix: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub end_time_unix: String,
}

/// One variant of a live channel as listed by upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveChannel {
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_media: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_group_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_file_tag: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_name: String,
    #[serde(rename = "issues_name", default, deserialize_with = "string_or_number")]
    pub issue_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub media_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub media_file_tag: String,
    #[serde(rename = "issues_id", default, deserialize_with = "string_or_number")]
    pub issue_id: String,
    #[serde(rename = "issues_prod_id", default, deserialize_with = "string_or_number")]
    pub issue_prod_id: String,
    #[serde(rename = "issues_url", default, deserialize_with = "string_or_number")]
    pub issue_url: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub dvr: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub dvr_duration: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub hls_url: String,
    #[serde(default)]
    pub program: Vec<ProgramEntry>,
}

/// Channel variants grouped by logical channel, in upstream order.
pub type CatalogGroups = Vec<Vec<LiveChannel>>;

/// The live catalog body. Upstream wraps the groups in an object; a bare
/// array of groups is accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LiveCatalog {
    Wrapped {
        tv_choice_result: CatalogGroups,
    },
    Bare(CatalogGroups),
}

impl LiveCatalog {
    pub fn into_groups(self) -> CatalogGroups {
        match self {
            LiveCatalog::Wrapped { tv_choice_result } => tv_choice_result,
            LiveCatalog::Bare(groups) => groups,
        }
    }
}

// ── Stream resolution ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PlayLink {
    #[serde(rename = "play_link", default)]
    pub link: Option<String>,
}
