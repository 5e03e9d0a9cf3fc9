use std::sync::Arc;

use anyhow::Context;
use strand::fetch::{BandwidthMeter, HttpFetcher};
use strand::loader::PlaylistLoader;
use strand::playlist::Playlist;
use url::Url;

pub async fn run(url: Url) -> anyhow::Result<()> {
	let meter = Arc::new(BandwidthMeter::new());
	let fetcher = Arc::new(HttpFetcher::new(meter));
	let mut loader = PlaylistLoader::new(url, fetcher);

	match loader.load().await.context("failed to load playlist")? {
		Playlist::Master(master) => {
			println!(
				"master playlist: {} stream(s), byte ranges {}",
				master.streams.len(),
				if loader.supports_ranges() { "supported" } else { "unsupported" },
			);

			for stream in &master.streams {
				println!(
					"  {:>9}  {:>9} bps  codecs {:<24}  {}",
					stream.resolution.as_ref().map(|r| r.raw.as_str()).unwrap_or("unsized"),
					stream.bandwidth.unwrap_or(0),
					stream.codecs.as_deref().unwrap_or("?"),
					stream.uri.as_deref().unwrap_or("?"),
				);
			}

			for media in &master.media {
				println!(
					"  rendition {:?} group {:?} name {:?}{}  {}",
					media.media_type,
					media.group_id.as_deref().unwrap_or("?"),
					media.name.as_deref().unwrap_or("?"),
					if media.default { " (default)" } else { "" },
					media.uri.as_deref().unwrap_or("-"),
				);
			}
		}
		Playlist::Media(media) => {
			println!(
				"media playlist: {} segment(s), {:.1}s total, endlist {}",
				media.segments.len(),
				media.total_duration(),
				media.endlist,
			);
		}
	}

	Ok(())
}
