//! Playback orchestration and adaptive bitrate control.
//!
//! The player owns the whole pipeline: it loads the master playlist, picks a
//! rendition, runs one download session per rendition (video, and audio when
//! the stream names a separate audio group), splices completed segments into
//! the render queues in index order, and binds both render drivers to one
//! presentation clock.
//!
//! Playback health feeds the adaptive controller: when the video driver
//! reports a waiting interval longer than the threshold, the player drops to
//! the next lower resolution and re-enters playback at the current clock
//! time.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::clock::PlaybackClock;
use crate::fetch::{BandwidthMeter, HttpFetcher, SegmentFetcher};
use crate::loader::PlaylistLoader;
use crate::playlist::{MasterPlaylist, MediaTag, MediaTagType, Playlist, Resolution, Stream};
use crate::render::{DriverStatus, RenderDriver, RenderQueue, SampleSink, WaitingCallback};
use crate::session::{DownloadSession, Resequencer, SegmentReady};
use crate::store::BlobStore;
use crate::{MediaKind, PlayerError, Timestamp};

/// A waiting interval longer than this asks for a resolution downshift.
const ABR_WAITING_THRESHOLD: Duration = Duration::from_secs(4);

/// The rendition height preferred when a master playlist first loads.
const DEFAULT_HEIGHT: u32 = 720;

/// Coarse playback state reported to the embedding facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
	Playing,
	Buffering,
	Finished,
}

/// One selectable rendition: the cheapest variant stream at its resolution.
#[derive(Debug, Clone)]
pub struct Rendition {
	pub resolution: Option<Resolution>,
	pub stream: Stream,
}

impl Rendition {
	fn height(&self) -> u32 {
		self.resolution.as_ref().map(|r| r.height).unwrap_or(0)
	}

	fn label(&self) -> Option<&str> {
		self.resolution.as_ref().map(|r| r.raw.as_str())
	}
}

enum Control {
	Downshift,
}

/// The HLS playback engine.
///
/// Cheap to clone; clones share the same underlying player.
#[derive(Clone)]
pub struct Player {
	inner: Arc<PlayerInner>,
}

struct PlayerInner {
	fetcher: Arc<dyn SegmentFetcher>,
	store: Arc<BlobStore>,
	meter: Arc<BandwidthMeter>,
	video_sink: Arc<dyn SampleSink>,
	audio_sink: Arc<dyn SampleSink>,
	clock: PlaybackClock,

	status: watch::Sender<PlayerStatus>,
	error: watch::Sender<Option<PlayerError>>,
	control: mpsc::UnboundedSender<Control>,

	/// `(start, end)` of the contiguous buffered range. Shared with the
	/// feeding task rather than through `self` so playback tasks never keep
	/// the player alive.
	buffered: Arc<std::sync::Mutex<(Duration, Duration)>>,

	state: tokio::sync::Mutex<PlayState>,
}

struct PlayState {
	master: Option<MasterPlaylist>,
	base: Option<Url>,
	supports_ranges: bool,

	/// Renditions in descending height order.
	ladder: Vec<Rendition>,
	current: usize,
	automatic: bool,

	volume: f32,
	playback: Option<Playback>,
}

/// Everything owned by one play-from invocation, torn down as a unit.
struct Playback {
	video_session: DownloadSession,
	audio_session: Option<DownloadSession>,
	video_driver: RenderDriver,
	audio_driver: RenderDriver,
	tasks: Vec<JoinHandle<()>>,
}

impl Playback {
	fn shutdown(self) {
		for task in &self.tasks {
			task.abort();
		}
		self.video_driver.stop();
		self.audio_driver.stop();
		self.video_session.stop();
		if let Some(audio) = &self.audio_session {
			audio.stop();
		}
	}
}

impl Player {
	/// A player fetching over HTTP and caching in the system temp directory.
	pub fn new(video_sink: Arc<dyn SampleSink>, audio_sink: Arc<dyn SampleSink>) -> Self {
		let meter = Arc::new(BandwidthMeter::new());
		let fetcher = Arc::new(HttpFetcher::new(meter.clone()));
		Self::with_transport(video_sink, audio_sink, fetcher, Arc::new(BlobStore::new()), meter)
	}

	/// A player with a custom transport and blob store.
	pub fn with_transport(
		video_sink: Arc<dyn SampleSink>,
		audio_sink: Arc<dyn SampleSink>,
		fetcher: Arc<dyn SegmentFetcher>,
		store: Arc<BlobStore>,
		meter: Arc<BandwidthMeter>,
	) -> Self {
		let (status, _) = watch::channel(PlayerStatus::Buffering);
		let (error, _) = watch::channel(None);
		let (control, control_rx) = mpsc::unbounded_channel();

		let inner = Arc::new(PlayerInner {
			fetcher,
			store,
			meter,
			video_sink,
			audio_sink,
			clock: PlaybackClock::new(),
			status,
			error,
			control,
			buffered: Arc::new(std::sync::Mutex::new((Duration::ZERO, Duration::ZERO))),
			state: tokio::sync::Mutex::new(PlayState {
				master: None,
				base: None,
				supports_ranges: false,
				ladder: Vec::new(),
				current: 0,
				automatic: true,
				volume: 1.0,
				playback: None,
			}),
		});

		// The control loop holds only a weak handle; it winds down once the
		// last player clone is dropped.
		tokio::spawn(control_loop(Arc::downgrade(&inner), control_rx));

		Self { inner }
	}

	/// Load a master playlist and start playback from the beginning.
	pub async fn play(&self, url: Url) -> Result<(), PlayerError> {
		self.inner.play(url).await
	}

	/// Tear down playback and restart it at `position`.
	pub async fn seek(&self, position: Duration) -> Result<(), PlayerError> {
		self.inner.play_from(position).await
	}

	pub fn pause(&self) {
		self.inner.clock.pause();
	}

	pub fn resume(&self) {
		self.inner.clock.resume();
	}

	/// Stop playback entirely, keeping the loaded master for a later seek.
	pub async fn stop(&self) {
		let mut state = self.inner.state.lock().await;
		if let Some(playback) = state.playback.take() {
			playback.shutdown();
		}
		self.inner.clock.pause();
	}

	/// Drop every cached segment blob.
	pub async fn purge(&self) {
		self.inner.store.purge().await;
	}

	/// Observe coarse playback state transitions.
	pub fn status(&self) -> watch::Receiver<PlayerStatus> {
		self.inner.status.subscribe()
	}

	/// Observe asynchronous player errors.
	pub fn errors(&self) -> watch::Receiver<Option<PlayerError>> {
		self.inner.error.subscribe()
	}

	/// The current presentation time.
	pub fn position(&self) -> Duration {
		self.inner.clock.now().into()
	}

	/// The `(start, end)` of the contiguously buffered range.
	pub fn buffered(&self) -> (Duration, Duration) {
		*self.inner.buffered.lock().unwrap()
	}

	pub fn rate(&self) -> f64 {
		self.inner.clock.rate()
	}

	pub fn set_rate(&self, rate: f64) {
		self.inner.clock.set_rate(rate);
	}

	pub async fn volume(&self) -> f32 {
		self.inner.state.lock().await.volume
	}

	pub async fn set_volume(&self, volume: f32) {
		let mut state = self.inner.state.lock().await;
		state.volume = volume.clamp(0.0, 1.0);
		self.inner.audio_sink.set_volume(state.volume);
	}

	/// The most recent bandwidth estimate, in bits per second.
	pub fn bandwidth(&self) -> Option<u64> {
		self.inner.meter.estimate()
	}

	/// Resolutions available in the loaded master, highest first.
	pub async fn available_resolutions(&self) -> Vec<String> {
		let state = self.inner.state.lock().await;
		state
			.ladder
			.iter()
			.filter_map(|r| r.label().map(str::to_string))
			.collect()
	}

	pub async fn current_resolution(&self) -> Option<String> {
		let state = self.inner.state.lock().await;
		state
			.ladder
			.get(state.current)
			.and_then(|r| r.label().map(str::to_string))
	}

	/// Pin playback to one resolution, disabling the adaptive controller.
	/// Playback continues from the current clock time.
	pub async fn set_resolution(&self, resolution: &str) -> Result<(), PlayerError> {
		{
			let mut state = self.inner.state.lock().await;
			let index = state
				.ladder
				.iter()
				.position(|r| r.label() == Some(resolution))
				.ok_or_else(|| PlayerError::MediaLoadFailed(format!("no rendition at {resolution}")))?;
			state.automatic = false;
			state.current = index;
		}

		let position = self.position();
		self.inner.play_from(position).await
	}

	/// Re-enable the adaptive controller.
	pub async fn set_automatic_resolution(&self) {
		self.inner.state.lock().await.automatic = true;
	}
}

impl PlayerInner {
	async fn play(self: &Arc<Self>, url: Url) -> Result<(), PlayerError> {
		let mut loader = PlaylistLoader::new(url.clone(), self.fetcher.clone());
		let master = match loader.load().await? {
			Playlist::Master(master) => master,
			Playlist::Media(_) => return Err(PlayerError::UnsupportedPlaylistShape),
		};

		let ladder = build_ladder(&master);
		if ladder.is_empty() {
			return Err(PlayerError::MediaLoadFailed(
				"master playlist has no playable streams".to_string(),
			));
		}
		let current = default_rendition(&ladder);

		info!(
			renditions = ladder.len(),
			selected = ladder[current].label().unwrap_or("unsized"),
			%url,
			"selected master playlist renditions"
		);

		{
			let mut state = self.state.lock().await;
			state.master = Some(master);
			state.base = Some(url);
			state.supports_ranges = loader.supports_ranges();
			state.ladder = ladder;
			state.current = current;
			state.automatic = true;
		}

		self.play_from(Duration::ZERO).await
	}

	/// Tear down any active playback and start again at `start`.
	async fn play_from(self: &Arc<Self>, start: Duration) -> Result<(), PlayerError> {
		let mut state = self.state.lock().await;

		if let Some(playback) = state.playback.take() {
			playback.shutdown();
		}

		let master = state
			.master
			.clone()
			.ok_or_else(|| PlayerError::MediaLoadFailed("no master playlist loaded".to_string()))?;
		let base = state
			.base
			.clone()
			.ok_or_else(|| PlayerError::MediaLoadFailed("no master playlist loaded".to_string()))?;
		let rendition = state
			.ladder
			.get(state.current)
			.cloned()
			.ok_or_else(|| PlayerError::MediaLoadFailed("no rendition selected".to_string()))?;
		let stream_uri = rendition
			.stream
			.uri
			.clone()
			.ok_or_else(|| PlayerError::MediaLoadFailed("selected stream has no URI".to_string()))?;

		let mut loader = PlaylistLoader::new(base, self.fetcher.clone());
		let video_playlist = loader.load_media(&stream_uri).await?;
		let video_url = loader.resolve(&stream_uri)?;
		let supports_ranges = state.supports_ranges || loader.supports_ranges();

		// A separate audio rendition, when the stream names an audio group
		// with a URI. Its failure drops the rendition, not the playback.
		let audio = match rendition
			.stream
			.audio
			.as_deref()
			.and_then(|group| select_audio_tag(&master, group))
		{
			Some(tag) => {
				let uri = tag.uri.clone().expect("audio tags are pre-filtered for a URI");
				match loader.load_media(&uri).await {
					Ok(playlist) => Some((playlist, loader.resolve(&uri)?)),
					Err(err) => {
						warn!(%err, "audio rendition failed to load, continuing without it");
						None
					}
				}
			}
			None => None,
		};

		let (video_session, video_results) = DownloadSession::new(
			&video_playlist,
			&video_url,
			start,
			supports_ranges,
			self.fetcher.clone(),
			self.store.clone(),
		);

		let video_queue = Arc::new(RenderQueue::new());
		let audio_queue = Arc::new(RenderQueue::new());

		// Reset before any completion can land, not after.
		*self.buffered.lock().unwrap() = (start, start);

		// The adaptive controller: a long stall on the video driver asks the
		// control loop for a downshift.
		let control = self.control.clone();
		let on_waiting: WaitingCallback = Box::new(move |waited| {
			if waited > ABR_WAITING_THRESHOLD {
				debug!(?waited, "waiting interval exceeded threshold");
				let _ = control.send(Control::Downshift);
			}
		});

		let video_driver = RenderDriver::start(
			video_queue.clone(),
			self.video_sink.clone(),
			self.clock.clone(),
			Some(on_waiting),
		);
		let audio_driver = RenderDriver::start(
			audio_queue.clone(),
			self.audio_sink.clone(),
			self.clock.clone(),
			None,
		);

		let mut tasks = Vec::new();
		tasks.push(tokio::spawn(mirror_status(
			video_driver.status(),
			self.status.clone(),
		)));

		let audio_session = match audio {
			Some((playlist, url)) => {
				let (session, results) = DownloadSession::new(
					&playlist,
					&url,
					start,
					supports_ranges,
					self.fetcher.clone(),
					self.store.clone(),
				);
				tasks.push(tokio::spawn(feed_queues(
					results,
					session.skip(),
					session.segment_count(),
					start,
					vec![(audio_queue.clone(), MediaKind::Audio)],
					None,
				)));
				session.start();
				Some(session)
			}
			None => None,
		};

		// Video segments also carry the audio track when no separate audio
		// rendition exists.
		let mut video_targets = vec![(video_queue.clone(), MediaKind::Video)];
		if audio_session.is_none() {
			video_targets.push((audio_queue.clone(), MediaKind::Audio));
		}
		tasks.push(tokio::spawn(feed_queues(
			video_results,
			video_session.skip(),
			video_session.segment_count(),
			start,
			video_targets,
			Some(self.buffered.clone()),
		)));

		video_session.start();

		self.clock.set_time(start.into());
		self.clock.resume();
		self.audio_sink.set_volume(state.volume);

		state.playback = Some(Playback {
			video_session,
			audio_session,
			video_driver,
			audio_driver,
			tasks,
		});

		Ok(())
	}

	/// Drop to the next lower resolution and re-enter playback at the
	/// current clock time. No-op in manual mode or at the bottom rung.
	async fn downshift(self: &Arc<Self>) -> Result<(), PlayerError> {
		{
			let mut state = self.state.lock().await;
			if !state.automatic {
				return Ok(());
			}
			if state.current + 1 >= state.ladder.len() {
				debug!("already at the lowest resolution, staying put");
				return Ok(());
			}

			state.current += 1;
			info!(
				resolution = state.ladder[state.current].label().unwrap_or("unsized"),
				"buffering too long, downshifting"
			);
		}

		let position: Duration = self.clock.now().into();
		self.play_from(position).await
	}
}

/// Append completed segments, in index order, to the target render queues.
async fn feed_queues(
	mut results: mpsc::UnboundedReceiver<SegmentReady>,
	skip: usize,
	segment_count: usize,
	start: Duration,
	targets: Vec<(Arc<RenderQueue>, MediaKind)>,
	buffered: Option<Arc<std::sync::Mutex<(Duration, Duration)>>>,
) {
	// Nothing to play (a seek past the end): complete immediately.
	if skip >= segment_count {
		for (queue, _) in &targets {
			queue.complete();
		}
		return;
	}

	let mut resequencer = Resequencer::new(skip);

	while let Some(ready) = results.recv().await {
		for ready in resequencer.push(ready) {
			// A seek landing inside the first segment trims its samples.
			let time_offset = if ready.index == skip && start > ready.offset {
				Timestamp::from(start - ready.offset)
			} else {
				Timestamp::ZERO
			};

			debug!(index = ready.index, file = %ready.file.display(), "segment ready for rendering");
			for (queue, kind) in &targets {
				queue.enqueue_asset(ready.file.clone(), *kind, time_offset).await;
			}

			if let Some(buffered) = &buffered {
				buffered.lock().unwrap().1 = ready.offset + ready.duration;
			}
		}

		if resequencer.next_index() >= segment_count {
			for (queue, _) in &targets {
				queue.complete();
			}
			return;
		}
	}
}

/// Report the video driver's health as the player's status.
async fn mirror_status(mut driver: watch::Receiver<DriverStatus>, player: watch::Sender<PlayerStatus>) {
	loop {
		let status = match *driver.borrow_and_update() {
			DriverStatus::Playing => PlayerStatus::Playing,
			DriverStatus::Waiting => PlayerStatus::Buffering,
			DriverStatus::Finished => PlayerStatus::Finished,
		};

		player.send_if_modified(|current| {
			if *current == status {
				return false;
			}
			*current = status;
			true
		});

		if status == PlayerStatus::Finished || driver.changed().await.is_err() {
			return;
		}
	}
}

async fn control_loop(inner: Weak<PlayerInner>, mut control: mpsc::UnboundedReceiver<Control>) {
	while let Some(message) = control.recv().await {
		let Some(inner) = inner.upgrade() else {
			return;
		};

		match message {
			Control::Downshift => {
				if let Err(err) = inner.downshift().await {
					warn!(%err, "downshift failed");
					let _ = inner.error.send(Some(err));
				}
			}
		}
	}
}

/// Group variant streams by resolution, keeping the cheapest per size, and
/// order the result by height descending.
fn build_ladder(master: &MasterPlaylist) -> Vec<Rendition> {
	let mut by_resolution: HashMap<Option<&str>, &Stream> = HashMap::new();

	for stream in &master.streams {
		if stream.uri.is_none() {
			continue;
		}

		let key = stream.resolution.as_ref().map(|r| r.raw.as_str());
		let bandwidth = stream.average_bandwidth.or(stream.bandwidth).unwrap_or(0);

		match by_resolution.entry(key) {
			std::collections::hash_map::Entry::Vacant(entry) => {
				entry.insert(stream);
			}
			std::collections::hash_map::Entry::Occupied(mut entry) => {
				let existing = entry.get();
				let existing_bandwidth = existing.average_bandwidth.or(existing.bandwidth).unwrap_or(0);
				if bandwidth < existing_bandwidth {
					entry.insert(stream);
				}
			}
		}
	}

	let mut ladder: Vec<Rendition> = by_resolution
		.into_values()
		.map(|stream| Rendition {
			resolution: stream.resolution.clone(),
			stream: stream.clone(),
		})
		.collect();

	ladder.sort_by(|a, b| b.height().cmp(&a.height()));
	ladder
}

/// Prefer the rendition at the default height, else the highest.
fn default_rendition(ladder: &[Rendition]) -> usize {
	ladder
		.iter()
		.position(|r| r.height() == DEFAULT_HEIGHT)
		.unwrap_or(0)
}

/// The audio rendition for a group: the default entry if any, else the first
/// one carrying a URI.
fn select_audio_tag<'a>(master: &'a MasterPlaylist, group_id: &str) -> Option<&'a MediaTag> {
	let mut first = None;

	for tag in master.media.iter().filter(|tag| {
		tag.media_type == MediaTagType::Audio && tag.group_id.as_deref() == Some(group_id) && tag.uri.is_some()
	}) {
		if tag.default {
			return Some(tag);
		}
		if first.is_none() {
			first = Some(tag);
		}
	}

	first
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;

	use crate::fetch::testing::MapFetcher;
	use crate::render::SampleSink;
	use crate::SampleBuffer;

	use super::*;

	/// Always-ready sink that drops everything.
	struct NullSink;

	impl SampleSink for NullSink {
		fn is_ready_for_more(&self) -> bool {
			true
		}

		fn enqueue(&self, _buffer: SampleBuffer) {}

		fn flush(&self) {}
	}

	const MASTER: &str = "#EXTM3U\n\
		#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
		1080.m3u8\n\
		#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720\n\
		720.m3u8\n\
		#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720\n\
		720-alt.m3u8\n\
		#EXT-X-STREAM-INF:BANDWIDTH=1000000,RESOLUTION=640x480\n\
		480.m3u8\n";

	fn media(prefix: &str) -> String {
		format!(
			"#EXTM3U\n#EXT-X-TARGETDURATION:4\n\
			#EXTINF:4.0,\n{prefix}_0.mp4\n\
			#EXTINF:4.0,\n{prefix}_1.mp4\n\
			#EXT-X-ENDLIST\n"
		)
	}

	fn resources() -> Vec<(String, Bytes)> {
		let mut out = vec![("master.m3u8".to_string(), Bytes::from_static(MASTER.as_bytes()))];
		for prefix in ["1080", "720", "720-alt", "480"] {
			out.push((format!("{prefix}.m3u8"), Bytes::from(media(prefix))));
			// Not real fMP4; producers fail quietly and queues drain.
			out.push((format!("{prefix}_0.mp4"), Bytes::from_static(b"stub segment zero")));
			out.push((format!("{prefix}_1.mp4"), Bytes::from_static(b"stub segment one")));
		}
		out
	}

	fn test_player(store: Arc<BlobStore>) -> (Player, Arc<MapFetcher>) {
		let resources = resources();
		let borrowed: Vec<(&str, Bytes)> = resources
			.iter()
			.map(|(name, bytes)| (name.as_str(), bytes.clone()))
			.collect();
		let fetcher = MapFetcher::new(&borrowed);
		let meter = Arc::new(BandwidthMeter::new());

		let player = Player::with_transport(
			Arc::new(NullSink),
			Arc::new(NullSink),
			fetcher.clone(),
			store,
			meter,
		);
		(player, fetcher)
	}

	fn master_url() -> Url {
		Url::parse("https://cdn.example.com/show/master.m3u8").unwrap()
	}

	fn parse_master() -> MasterPlaylist {
		MasterPlaylist::parse(MASTER.as_bytes()).unwrap()
	}

	#[test]
	fn ladder_groups_by_resolution_and_keeps_the_cheapest() {
		let ladder = build_ladder(&parse_master());

		let labels: Vec<_> = ladder.iter().filter_map(|r| r.label()).collect();
		assert_eq!(labels, ["1920x1080", "1280x720", "640x480"]);

		// Of the two 720p variants, the cheaper one won.
		let chosen = &ladder[1];
		assert_eq!(chosen.stream.bandwidth, Some(2_500_000));
	}

	#[test]
	fn default_rendition_prefers_720() {
		let ladder = build_ladder(&parse_master());
		assert_eq!(ladder[default_rendition(&ladder)].label(), Some("1280x720"));

		// Without a 720p rung the highest wins.
		let body = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1,RESOLUTION=640x480\na.m3u8\n\
			#EXT-X-STREAM-INF:BANDWIDTH=2,RESOLUTION=1920x1080\nb.m3u8\n";
		let ladder = build_ladder(&MasterPlaylist::parse(body.as_bytes()).unwrap());
		assert_eq!(ladder[default_rendition(&ladder)].label(), Some("1920x1080"));
	}

	#[test]
	fn audio_tag_selection_prefers_the_default() {
		let body = "#EXTM3U\n\
			#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"French\",URI=\"fr.m3u8\"\n\
			#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"English\",DEFAULT=YES,URI=\"en.m3u8\"\n\
			#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"other\",NAME=\"Other\",URI=\"other.m3u8\"\n";
		let master = MasterPlaylist::parse(body.as_bytes()).unwrap();

		let tag = select_audio_tag(&master, "aud").unwrap();
		assert_eq!(tag.name.as_deref(), Some("English"));

		let tag = select_audio_tag(&master, "other").unwrap();
		assert_eq!(tag.name.as_deref(), Some("Other"));

		assert!(select_audio_tag(&master, "missing").is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn play_selects_720_and_finishes_on_stub_media() {
		let dir = tempfile::tempdir().unwrap();
		let (player, fetcher) = test_player(Arc::new(BlobStore::with_root(dir.path())));

		player.play(master_url()).await.unwrap();

		assert_eq!(player.current_resolution().await.as_deref(), Some("1280x720"));
		assert_eq!(
			player.available_resolutions().await,
			["1920x1080", "1280x720", "640x480"]
		);

		// Only the chosen rendition's segments were fetched.
		let mut status = player.status();
		loop {
			if *status.borrow_and_update() == PlayerStatus::Finished {
				break;
			}
			status.changed().await.unwrap();
		}
		assert_eq!(fetcher.fetch_count("720_0.mp4"), 1);
		assert_eq!(fetcher.fetch_count("1080_0.mp4"), 0);

		// Both stub segments were assembled and buffered through.
		assert_eq!(player.buffered().1, Duration::from_secs(8));
	}

	#[tokio::test(start_paused = true)]
	async fn media_url_at_the_top_level_is_rejected() {
		let media_body = media("solo");
		let fetcher = MapFetcher::new(&[("master.m3u8", Bytes::from(media_body))]);
		let meter = Arc::new(BandwidthMeter::new());
		let dir = tempfile::tempdir().unwrap();
		let player = Player::with_transport(
			Arc::new(NullSink),
			Arc::new(NullSink),
			fetcher,
			Arc::new(BlobStore::with_root(dir.path())),
			meter,
		);

		assert!(matches!(
			player.play(master_url()).await,
			Err(PlayerError::UnsupportedPlaylistShape)
		));
	}

	#[tokio::test(start_paused = true)]
	async fn downshift_steps_down_the_ladder_and_stops_at_the_bottom() {
		let dir = tempfile::tempdir().unwrap();
		let (player, _fetcher) = test_player(Arc::new(BlobStore::with_root(dir.path())));

		player.play(master_url()).await.unwrap();
		assert_eq!(player.current_resolution().await.as_deref(), Some("1280x720"));

		player.inner.downshift().await.unwrap();
		assert_eq!(player.current_resolution().await.as_deref(), Some("640x480"));

		// Bottom rung: a further downshift is a no-op.
		player.inner.downshift().await.unwrap();
		assert_eq!(player.current_resolution().await.as_deref(), Some("640x480"));
	}

	#[tokio::test(start_paused = true)]
	async fn manual_resolution_disables_the_adaptive_controller() {
		let dir = tempfile::tempdir().unwrap();
		let (player, _fetcher) = test_player(Arc::new(BlobStore::with_root(dir.path())));

		player.play(master_url()).await.unwrap();
		player.set_resolution("1920x1080").await.unwrap();
		assert_eq!(player.current_resolution().await.as_deref(), Some("1920x1080"));

		// The adaptive controller must not override a manual choice.
		player.inner.downshift().await.unwrap();
		assert_eq!(player.current_resolution().await.as_deref(), Some("1920x1080"));

		player.set_automatic_resolution().await;
		player.inner.downshift().await.unwrap();
		assert_eq!(player.current_resolution().await.as_deref(), Some("1280x720"));
	}

	#[tokio::test(start_paused = true)]
	async fn seek_restarts_from_the_new_position() {
		let dir = tempfile::tempdir().unwrap();
		let (player, _fetcher) = test_player(Arc::new(BlobStore::with_root(dir.path())));

		player.play(master_url()).await.unwrap();
		player.seek(Duration::from_secs(5)).await.unwrap();

		// The clock re-enters at the seek position.
		let position = player.position();
		assert!(position >= Duration::from_secs(5));
	}
}
