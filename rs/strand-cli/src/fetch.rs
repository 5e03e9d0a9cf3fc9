use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use strand::fetch::{BandwidthMeter, HttpFetcher, SegmentFetcher};
use strand::loader::PlaylistLoader;
use strand::playlist::Playlist;
use strand::session::DownloadSession;
use strand::store::BlobStore;
use tracing::{info, warn};
use url::Url;

/// How long to wait for any single segment before giving up.
const SEGMENT_TIMEOUT: Duration = Duration::from_secs(60);

pub async fn run(url: Url, height: u32, seek: f64) -> anyhow::Result<()> {
	let meter = Arc::new(BandwidthMeter::new());
	let fetcher: Arc<dyn SegmentFetcher> = Arc::new(HttpFetcher::new(meter.clone()));
	let store = Arc::new(BlobStore::new());
	let mut loader = PlaylistLoader::new(url.clone(), fetcher.clone());

	let (media, media_url) = match loader.load().await.context("failed to load playlist")? {
		Playlist::Master(master) => {
			let stream = master
				.streams
				.iter()
				.filter(|s| s.uri.is_some())
				.min_by_key(|s| {
					s.resolution
						.as_ref()
						.map(|r| r.height.abs_diff(height))
						.unwrap_or(u32::MAX)
				})
				.context("master playlist has no streams")?;

			let uri = stream.uri.clone().expect("streams are pre-filtered for a URI");
			info!(
				resolution = stream.resolution.as_ref().map(|r| r.raw.as_str()).unwrap_or("unsized"),
				%uri,
				"selected rendition"
			);

			let playlist = loader.load_media(&uri).await.context("failed to load media playlist")?;
			let media_url = loader.resolve(&uri)?;
			(playlist, media_url)
		}
		Playlist::Media(media) => (media, url),
	};

	let seek = Duration::from_secs_f64(seek.max(0.0));
	let (session, mut results) = DownloadSession::new(
		&media,
		&media_url,
		seek,
		loader.supports_ranges(),
		fetcher,
		store,
	);

	let expected = session.segment_count() - session.skip();
	info!(segments = expected, skip = session.skip(), "starting download session");
	session.start();

	let mut done = 0usize;
	while done < expected {
		match tokio::time::timeout(SEGMENT_TIMEOUT, results.recv()).await {
			Ok(Some(ready)) => {
				done += 1;
				println!(
					"[{done}/{expected}] segment {} ({:.1}s at {:.1}s) -> {}",
					ready.index,
					ready.duration.as_secs_f64(),
					ready.offset.as_secs_f64(),
					ready.file.display(),
				);
			}
			Ok(None) => break,
			Err(_) => {
				warn!("no segment completed within {SEGMENT_TIMEOUT:?}, giving up");
				break;
			}
		}
	}

	if let Some(bandwidth) = meter.estimate() {
		println!("observed bandwidth: ~{} kbit/s", bandwidth / 1000);
	}

	Ok(())
}
