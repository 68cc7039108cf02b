use std::fmt::Write;

use tracing::debug;

use super::registry::ChannelRegistry;
use super::types::LiveChannel;

pub const PLAYLIST_HEADER: &str = "#EXTM3U";
pub const PLAYLIST_PATH: &str = "/playlist.m3u8";

/// Render the M3U playlist for a live catalog.
///
/// Each upstream group contributes its first variant only. Registry
/// metadata wins over the upstream name; channels the registry does not
/// know keep the upstream name and get blank tvg/group/logo attributes.
/// Stream URLs point back at this proxy so resolution happens on demand.
pub fn build_playlist(
    groups: &[Vec<LiveChannel>],
    registry: &ChannelRegistry,
    host: &str,
    port: &str,
) -> String {
    let mut playlist = format!("{PLAYLIST_HEADER}\n");

    for group in groups {
        let Some(channel) = group.first() else {
            debug!("skipping empty catalog group");
            continue;
        };

        let entry = PlaylistEntry::resolve(channel, registry);
        // Writing into a String cannot fail.
        let _ = write!(
            playlist,
            "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}\n{}\n",
            attribute(entry.tvg_id),
            attribute(entry.tvg_name),
            attribute(entry.logo),
            attribute(entry.group),
            single_line(entry.name),
            channel_url(host, port, entry.id, entry.name),
        );
    }

    playlist
}

/// URL of this proxy's single-channel resolution endpoint.
pub fn channel_url(host: &str, port: &str, channel_id: &str, name: &str) -> String {
    format!(
        "http://{host}:{port}{PLAYLIST_PATH}?ch={}&name={}",
        urlencoding::encode(channel_id),
        urlencoding::encode(name)
    )
}

/// Keeps a display value on its `#EXTINF` line.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Like [`single_line`], and a `"` cannot close the quoted attribute early.
fn attribute(value: &str) -> String {
    single_line(value).replace('"', "'")
}

struct PlaylistEntry<'a> {
    id: &'a str,
    name: &'a str,
    tvg_id: &'a str,
    tvg_name: &'a str,
    group: &'a str,
    logo: &'a str,
}

impl<'a> PlaylistEntry<'a> {
    fn resolve(channel: &'a LiveChannel, registry: &'a ChannelRegistry) -> Self {
        match registry.get(&channel.issue_id) {
            Some(meta) => Self {
                id: &channel.issue_id,
                name: &meta.name,
                tvg_id: &meta.tvg_id,
                tvg_name: &meta.tvg_name,
                group: &meta.group,
                logo: &meta.logo,
            },
            None => Self {
                id: &channel.issue_id,
                name: &channel.issue_name,
                tvg_id: "",
                tvg_name: "",
                group: "",
                logo: "",
            },
        }
    }
}
