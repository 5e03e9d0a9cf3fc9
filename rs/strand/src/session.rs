//! Segment download session.
//!
//! Given a media playlist and a seek time, a session fetches every segment
//! from the first one covering the seek time onward, reassembles each with
//! its initialization section prepended, writes the result to the blob
//! store, and emits one [`SegmentReady`] per segment.
//!
//! Fetches are deduplicated three ways: an initialization section is fetched
//! once per distinct [`BytesKey`] and shared by every segment referencing
//! it; byte-ranged segments of the same resource share one streaming fetch;
//! and a `loaded` set makes chunk processing idempotent so a cancelled or
//! racing fetch can never emit twice.
//!
//! Completions are not ordered by index, since cached segments deliver
//! before the network does. [`Resequencer`] restores index order for the
//! layer appending sample producers.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use tokio::sync::{mpsc, Mutex, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::fetch::{ByteSpan, SegmentFetcher};
use crate::loader::resolve_uri;
use crate::playlist::MediaPlaylist;
use crate::store::{BlobStore, BytesKey};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(0);

/// Emitted once per segment when its assembled file is ready.
#[derive(Debug, Clone)]
pub struct SegmentReady {
	pub index: usize,

	/// The assembled file in the blob store, initialization section included.
	pub file: PathBuf,

	/// Where this segment starts on the presentation timeline.
	pub offset: Duration,

	pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
	Init,
	Segment { index: usize },
}

/// One unit of fetch work: a byte span of a resource plus what to do with it.
#[derive(Debug, Clone)]
struct ChunkJob {
	url: Url,
	key: BytesKey,
	span: Option<ByteSpan>,
	payload: Payload,

	/// For segments, the initialization section to prepend.
	init: Option<BytesKey>,
}

struct Plan {
	/// Whole-resource and closed-range jobs, one fetch each.
	file_jobs: Vec<ChunkJob>,

	/// Byte-carving jobs grouped per resource, offset-ordered, served by a
	/// single open-ended stream each.
	stream_groups: Vec<(Url, u64, Vec<ChunkJob>)>,

	/// Segments already present in the blob store, emitted without fetching.
	cached: Vec<SegmentReady>,
}

struct Shared {
	id: u64,
	fetcher: Arc<dyn SegmentFetcher>,
	store: Arc<BlobStore>,

	/// Serializes whole-file loads so burst segment fetches do not contend.
	admission: Semaphore,

	/// One copy of each distinct initialization section, shared by every
	/// segment that references it.
	init_sections: Mutex<HashMap<BytesKey, Bytes>>,
	init_ready: Notify,

	/// Chunks that have already been processed; the idempotence guard.
	loaded: Mutex<HashSet<BytesKey>>,

	results: mpsc::UnboundedSender<SegmentReady>,
	offsets: Vec<Duration>,
	durations: Vec<Duration>,
}

/// Downloads the segments of one media playlist rendition.
pub struct DownloadSession {
	shared: Arc<Shared>,
	plan: std::sync::Mutex<Option<Plan>>,
	tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
	skip: usize,
	segment_count: usize,
}

impl DownloadSession {
	/// Build a session over `playlist`, skipping segments that end at or
	/// before `seek`.
	///
	/// `prefer_range_requests` selects how byte-ranged segments are fetched:
	/// closed-range one-shot requests when the server supports them, or
	/// carving from a shared open-ended stream otherwise.
	pub fn new(
		playlist: &MediaPlaylist,
		base: &Url,
		seek: Duration,
		prefer_range_requests: bool,
		fetcher: Arc<dyn SegmentFetcher>,
		store: Arc<BlobStore>,
	) -> (Self, mpsc::UnboundedReceiver<SegmentReady>) {
		let (results, receiver) = mpsc::unbounded_channel();

		let skip = Self::skip_count(playlist, seek);
		let durations: Vec<Duration> = playlist
			.segments
			.iter()
			.map(|s| Duration::from_secs_f64(s.duration.unwrap_or(0.0).max(0.0)))
			.collect();
		let mut offsets = Vec::with_capacity(durations.len());
		let mut elapsed = Duration::ZERO;
		for duration in &durations {
			offsets.push(elapsed);
			elapsed += *duration;
		}

		let shared = Arc::new(Shared {
			id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
			fetcher,
			store,
			admission: Semaphore::new(1),
			init_sections: Mutex::new(HashMap::new()),
			init_ready: Notify::new(),
			loaded: Mutex::new(HashSet::new()),
			results,
			offsets,
			durations,
		});

		let plan = Self::plan(&shared, playlist, base, skip, prefer_range_requests);

		let session = Self {
			shared,
			plan: std::sync::Mutex::new(Some(plan)),
			tasks: std::sync::Mutex::new(Vec::new()),
			skip,
			segment_count: playlist.segments.len(),
		};

		(session, receiver)
	}

	/// Number of leading segments whose cumulative duration ends at or
	/// before the seek time. The segment straddling the seek time is kept.
	pub fn skip_count(playlist: &MediaPlaylist, seek: Duration) -> usize {
		let seek = seek.as_secs_f64();
		let mut elapsed = 0.0;
		let mut count = 0;

		for segment in &playlist.segments {
			let duration = segment.duration.unwrap_or(0.0);
			if elapsed + duration > seek {
				break;
			}
			elapsed += duration;
			count += 1;
		}

		count
	}

	/// Where segment `index` starts on the presentation timeline.
	pub fn presentation_offset(&self, index: usize) -> Option<Duration> {
		self.shared.offsets.get(index).copied()
	}

	pub fn skip(&self) -> usize {
		self.skip
	}

	pub fn segment_count(&self) -> usize {
		self.segment_count
	}

	fn plan(
		shared: &Arc<Shared>,
		playlist: &MediaPlaylist,
		base: &Url,
		skip: usize,
		prefer_range_requests: bool,
	) -> Plan {
		// Resolve implicit byte-range offsets over the whole playlist; a
		// range without an offset continues the previous range of the same
		// resource, including ranges in the skipped prefix.
		let mut next_offset: HashMap<String, u64> = HashMap::new();
		let mut spans: Vec<Option<ByteSpan>> = Vec::with_capacity(playlist.segments.len());
		for segment in &playlist.segments {
			let span = segment.byte_range.map(|range| {
				let offset = range
					.offset
					.unwrap_or_else(|| *next_offset.get(segment.uri.as_str()).unwrap_or(&0));
				next_offset.insert(segment.uri.clone(), offset + range.length);
				ByteSpan {
					offset,
					length: range.length,
				}
			});
			spans.push(span);
		}

		let mut plan = Plan {
			file_jobs: Vec::new(),
			stream_groups: Vec::new(),
			cached: Vec::new(),
		};
		let mut planned: HashSet<BytesKey> = HashSet::new();
		let mut groups: HashMap<String, Vec<ChunkJob>> = HashMap::new();

		let mut push_job = |job: ChunkJob, groups: &mut HashMap<String, Vec<ChunkJob>>, plan: &mut Plan| {
			if job.span.is_some() && !prefer_range_requests {
				groups.entry(job.url.as_str().to_string()).or_default().push(job);
			} else {
				plan.file_jobs.push(job);
			}
		};

		for (index, segment) in playlist.segments.iter().enumerate().skip(skip) {
			let url = match resolve_uri(base, &segment.uri) {
				Ok(url) => url,
				Err(err) => {
					warn!(uri = %segment.uri, %err, "skipping segment with unresolvable URI");
					continue;
				}
			};

			let span = spans[index];
			let key = match span {
				Some(span) => BytesKey::range(basename(&url), span.offset, span.length),
				None => BytesKey::whole(basename(&url)),
			};

			// Cached segments deliver immediately, no fetch.
			if let Some(file) = shared.store.get(&key) {
				plan.cached.push(SegmentReady {
					index,
					file,
					offset: shared.offsets[index],
					duration: shared.durations[index],
				});
				continue;
			}

			// The initialization section goes first, deduplicated by its
			// own key across the whole session.
			let init_key = match &segment.init_section {
				Some(init) => match resolve_uri(base, &init.uri) {
					Ok(init_url) => {
						let init_span = init.byte_range.map(|range| ByteSpan {
							offset: range.offset.unwrap_or(0),
							length: range.length,
						});
						let init_key = match init_span {
							Some(span) => BytesKey::range(basename(&init_url), span.offset, span.length),
							None => BytesKey::whole(basename(&init_url)),
						};

						if planned.insert(init_key.clone()) {
							push_job(
								ChunkJob {
									url: init_url,
									key: init_key.clone(),
									span: init_span,
									payload: Payload::Init,
									init: None,
								},
								&mut groups,
								&mut plan,
							);
						}

						Some(init_key)
					}
					Err(err) => {
						warn!(uri = %init.uri, %err, "skipping unresolvable initialization section");
						None
					}
				},
				None => None,
			};

			if planned.insert(key.clone()) {
				push_job(
					ChunkJob {
						url,
						key,
						span,
						payload: Payload::Segment { index },
						init: init_key,
					},
					&mut groups,
					&mut plan,
				);
			}
		}

		// Each resource with carved ranges gets one stream, reading from the
		// first offset it needs and serving its jobs in offset order.
		for (_, mut jobs) in groups {
			jobs.sort_by_key(|job| job.span.map(|s| s.offset).unwrap_or(0));
			let url = jobs[0].url.clone();
			let start = jobs[0].span.map(|s| s.offset).unwrap_or(0);
			plan.stream_groups.push((url, start, jobs));
		}

		plan
	}

	/// Spawn the fetch tasks. Cached segments are emitted first.
	pub fn start(&self) {
		let Some(plan) = self.plan.lock().unwrap().take() else {
			return;
		};

		for ready in plan.cached {
			debug!(index = ready.index, "segment served from cache");
			let _ = self.shared.results.send(ready);
		}

		let mut tasks = self.tasks.lock().unwrap();

		for job in plan.file_jobs {
			let shared = self.shared.clone();
			tasks.push(tokio::spawn(async move {
				shared.run_file_job(job).await;
			}));
		}

		for (url, start, jobs) in plan.stream_groups {
			let shared = self.shared.clone();
			tasks.push(tokio::spawn(async move {
				shared.run_stream_group(url, start, jobs).await;
			}));
		}
	}

	/// Cancel all outstanding fetchers. In-flight chunk processing may still
	/// complete once; the loaded set keeps it from emitting twice.
	pub fn stop(&self) {
		for task in self.tasks.lock().unwrap().drain(..) {
			task.abort();
		}
	}
}

impl Drop for DownloadSession {
	fn drop(&mut self) {
		self.stop();
	}
}

impl Shared {
	async fn run_file_job(self: Arc<Self>, job: ChunkJob) {
		// Hold the admission permit only across the network transfer;
		// assembly may need to wait on an init section fetched by a peer.
		let payload = {
			let _permit = self.admission.acquire().await.expect("admission semaphore closed");
			match self.fetcher.fetch(&job.url, job.span).await {
				Ok(payload) => payload,
				Err(err) => {
					warn!(url = %job.url, %err, "fetch failed, dropping chunk");
					return;
				}
			}
		};

		self.process(job, payload).await;
	}

	async fn run_stream_group(self: Arc<Self>, url: Url, start: u64, jobs: Vec<ChunkJob>) {
		let mut stream = match self.fetcher.open_stream(&url, start).await {
			Ok(stream) => stream,
			Err(err) => {
				warn!(%url, %err, "stream open failed, dropping {} chunks", jobs.len());
				return;
			}
		};

		// Absolute offset of the first buffered byte.
		let mut position = start;
		let mut buffer = BytesMut::new();

		'jobs: for job in jobs {
			let span = job.span.expect("stream jobs always carry a span");

			// Discard up to the job's offset, then gather exactly its
			// length. Bounded per iteration, yielding between chunks.
			while position < span.offset {
				let gap = (span.offset - position) as usize;
				if buffer.len() >= gap {
					buffer.advance(gap);
					position += gap as u64;
					break;
				}

				position += buffer.len() as u64;
				buffer.clear();

				match stream.next_chunk().await {
					Ok(Some(chunk)) => buffer.extend_from_slice(&chunk),
					Ok(None) => {
						warn!(%url, "stream ended before offset {}", span.offset);
						return;
					}
					Err(err) => {
						warn!(%url, %err, "stream failed, dropping remaining chunks");
						return;
					}
				}
				tokio::task::yield_now().await;
			}

			while (buffer.len() as u64) < span.length {
				match stream.next_chunk().await {
					Ok(Some(chunk)) => buffer.extend_from_slice(&chunk),
					Ok(None) => {
						warn!(%url, "stream ended inside a segment range");
						break 'jobs;
					}
					Err(err) => {
						warn!(%url, %err, "stream failed, dropping remaining chunks");
						return;
					}
				}
			}

			let payload = buffer.split_to(span.length as usize).freeze();
			position += span.length;

			self.process(job, payload).await;
		}
	}

	async fn process(&self, job: ChunkJob, payload: Bytes) {
		// Idempotence: a chunk is processed at most once, no matter how many
		// fetch paths race to deliver it.
		if !self.loaded.lock().await.insert(job.key.clone()) {
			return;
		}

		match job.payload {
			Payload::Init => {
				debug!(name = %job.key.name, bytes = payload.len(), "initialization section loaded");
				self.init_sections.lock().await.insert(job.key, payload);
				self.init_ready.notify_waiters();
			}
			Payload::Segment { index } => {
				let mut blob = BytesMut::new();
				if let Some(init_key) = &job.init {
					let init = self.init_bytes(init_key).await;
					blob.extend_from_slice(&init);
				}
				blob.extend_from_slice(&payload);

				let file_name = format!(
					"{}_{:016x}_{}_{}_{}.mp4",
					self.id,
					hash_url(&job.url),
					index,
					job.key.offset,
					job.key.length_label(),
				);

				match self.store.insert(job.key, &file_name, &blob).await {
					Ok(file) => {
						let _ = self.results.send(SegmentReady {
							index,
							file,
							offset: self.offsets[index],
							duration: self.durations[index],
						});
					}
					Err(err) => warn!(index, %err, "failed to store segment blob"),
				}
			}
		}
	}

	/// The bytes of an initialization section, waiting until its fetch has
	/// landed if necessary.
	async fn init_bytes(&self, key: &BytesKey) -> Bytes {
		loop {
			let ready = self.init_ready.notified();
			if let Some(bytes) = self.init_sections.lock().await.get(key).cloned() {
				return bytes;
			}
			ready.await;
		}
	}
}

/// Reorders unordered segment completions into index order.
pub struct Resequencer {
	next: usize,
	pending: HashMap<usize, SegmentReady>,
}

impl Resequencer {
	pub fn new(start: usize) -> Self {
		Self {
			next: start,
			pending: HashMap::new(),
		}
	}

	/// Absorb one completion; returns every completion now releasable in
	/// index order.
	pub fn push(&mut self, ready: SegmentReady) -> Vec<SegmentReady> {
		self.pending.insert(ready.index, ready);

		let mut released = Vec::new();
		while let Some(next) = self.pending.remove(&self.next) {
			self.next += 1;
			released.push(next);
		}

		released
	}

	/// The next index still owed to the consumer.
	pub fn next_index(&self) -> usize {
		self.next
	}
}

fn basename(url: &Url) -> String {
	url.path_segments()
		.and_then(|segments| segments.last())
		.unwrap_or_default()
		.to_string()
}

fn hash_url(url: &Url) -> u64 {
	let mut hasher = std::collections::hash_map::DefaultHasher::new();
	url.as_str().hash(&mut hasher);
	hasher.finish()
}

#[cfg(test)]
mod tests {
	use crate::fetch::testing::MapFetcher;
	use crate::playlist::MediaPlaylist;

	use super::*;

	fn base() -> Url {
		Url::parse("https://cdn.example.com/show/video.m3u8").unwrap()
	}

	fn playlist(body: &str) -> MediaPlaylist {
		MediaPlaylist::parse(body.as_bytes()).unwrap()
	}

	async fn collect(
		receiver: &mut mpsc::UnboundedReceiver<SegmentReady>,
		expected: usize,
	) -> Vec<SegmentReady> {
		let mut out = Vec::new();
		for _ in 0..expected {
			let ready = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
				.await
				.expect("timed out waiting for a segment")
				.expect("session closed early");
			out.push(ready);
		}
		out
	}

	const DURATIONS: &str = "#EXTM3U\n\
		#EXT-X-TARGETDURATION:4\n\
		#EXTINF:4.0,\nseg0.mp4\n\
		#EXTINF:4.0,\nseg1.mp4\n\
		#EXTINF:4.0,\nseg2.mp4\n\
		#EXTINF:2.0,\nseg3.mp4\n\
		#EXT-X-ENDLIST\n";

	#[test]
	fn skip_count_keeps_the_straddling_segment() {
		let playlist = playlist(DURATIONS);
		assert_eq!(DownloadSession::skip_count(&playlist, Duration::from_secs_f64(5.0)), 1);
		assert_eq!(DownloadSession::skip_count(&playlist, Duration::ZERO), 0);
		assert_eq!(DownloadSession::skip_count(&playlist, Duration::from_secs_f64(4.0)), 1);
		assert_eq!(DownloadSession::skip_count(&playlist, Duration::from_secs_f64(100.0)), 4);
	}

	#[tokio::test]
	async fn presentation_offsets_are_cumulative() {
		let playlist = playlist(DURATIONS);
		let fetcher = MapFetcher::new(&[]);
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(BlobStore::with_root(dir.path()));

		let (session, _rx) =
			DownloadSession::new(&playlist, &base(), Duration::from_secs_f64(5.0), true, fetcher, store);

		assert_eq!(session.skip(), 1);
		assert_eq!(session.presentation_offset(1), Some(Duration::from_secs(4)));
		assert_eq!(session.presentation_offset(3), Some(Duration::from_secs(12)));
	}

	#[tokio::test]
	async fn init_section_is_fetched_once_and_shared() {
		let body = "#EXTM3U\n\
			#EXT-X-MAP:URI=\"init.mp4\"\n\
			#EXTINF:4.0,\nseg0.mp4\n\
			#EXTINF:4.0,\nseg1.mp4\n\
			#EXT-X-ENDLIST\n";

		let init = Bytes::from_static(b"INIT");
		let fetcher = MapFetcher::new(&[
			("init.mp4", init.clone()),
			("seg0.mp4", Bytes::from_static(b"segment-zero")),
			("seg1.mp4", Bytes::from_static(b"segment-one")),
		]);
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(BlobStore::with_root(dir.path()));

		let (session, mut rx) = DownloadSession::new(
			&playlist(body),
			&base(),
			Duration::ZERO,
			true,
			fetcher.clone(),
			store,
		);
		session.start();

		let mut ready = collect(&mut rx, 2).await;
		ready.sort_by_key(|r| r.index);

		assert_eq!(fetcher.fetch_count("init.mp4"), 1);

		// Both assembled blobs begin with the shared init section.
		for r in &ready {
			let blob = std::fs::read(&r.file).unwrap();
			assert_eq!(&blob[..init.len()], init.as_ref());
		}
		assert_eq!(std::fs::read(&ready[0].file).unwrap()[init.len()..], *b"segment-zero");
	}

	#[tokio::test]
	async fn byte_ranges_are_carved_from_a_single_stream() {
		let body = "#EXTM3U\n\
			#EXT-X-MAP:URI=\"media.mp4\",BYTERANGE=\"4@0\"\n\
			#EXTINF:4.0,\n#EXT-X-BYTERANGE:6@4\nmedia.mp4\n\
			#EXTINF:4.0,\n#EXT-X-BYTERANGE:6\nmedia.mp4\n\
			#EXT-X-ENDLIST\n";

		let fetcher = MapFetcher::new(&[("media.mp4", Bytes::from_static(b"INITaaaaaabbbbbb"))]);
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(BlobStore::with_root(dir.path()));

		let (session, mut rx) = DownloadSession::new(
			&playlist(body),
			&base(),
			Duration::ZERO,
			false,
			fetcher.clone(),
			store,
		);
		session.start();

		let mut ready = collect(&mut rx, 2).await;
		ready.sort_by_key(|r| r.index);

		// One open-ended stream serves the init section and both segments.
		assert_eq!(fetcher.streams_opened.load(Ordering::Relaxed), 1);

		assert_eq!(std::fs::read(&ready[0].file).unwrap(), b"INITaaaaaa");
		assert_eq!(std::fs::read(&ready[1].file).unwrap(), b"INITbbbbbb");
	}

	#[tokio::test]
	async fn cached_segments_complete_without_fetching() {
		let body = "#EXTM3U\n\
			#EXTINF:4.0,\nseg0.mp4\n\
			#EXT-X-ENDLIST\n";

		let fetcher = MapFetcher::new(&[("seg0.mp4", Bytes::from_static(b"payload"))]);
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(BlobStore::with_root(dir.path()));

		let (session, mut rx) = DownloadSession::new(
			&playlist(body),
			&base(),
			Duration::ZERO,
			true,
			fetcher.clone(),
			store.clone(),
		);
		session.start();
		let first = collect(&mut rx, 1).await;
		assert_eq!(fetcher.fetch_count("seg0.mp4"), 1);

		// A second session over the same store serves from cache.
		let (session2, mut rx2) = DownloadSession::new(
			&playlist(body),
			&base(),
			Duration::ZERO,
			true,
			fetcher.clone(),
			store.clone(),
		);
		session2.start();
		let second = collect(&mut rx2, 1).await;
		assert_eq!(fetcher.fetch_count("seg0.mp4"), 1);
		assert_eq!(first[0].file, second[0].file);

		// After a purge the same request fetches again.
		store.purge().await;
		let (session3, mut rx3) = DownloadSession::new(
			&playlist(body),
			&base(),
			Duration::ZERO,
			true,
			fetcher.clone(),
			store,
		);
		session3.start();
		collect(&mut rx3, 1).await;
		assert_eq!(fetcher.fetch_count("seg0.mp4"), 2);
	}

	#[tokio::test]
	async fn each_key_completes_at_most_once() {
		let body = "#EXTM3U\n\
			#EXTINF:4.0,\nseg0.mp4\n\
			#EXTINF:4.0,\nseg1.mp4\n\
			#EXT-X-ENDLIST\n";

		let fetcher = MapFetcher::new(&[
			("seg0.mp4", Bytes::from_static(b"zero")),
			("seg1.mp4", Bytes::from_static(b"one")),
		]);
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(BlobStore::with_root(dir.path()));

		let (session, mut rx) =
			DownloadSession::new(&playlist(body), &base(), Duration::ZERO, true, fetcher, store);
		session.start();

		let ready = collect(&mut rx, 2).await;
		let mut seen = HashSet::new();
		for r in &ready {
			assert!(seen.insert(r.index), "segment {} completed twice", r.index);
		}

		// The channel holds nothing further.
		assert!(rx.try_recv().is_err());
	}

	#[tokio::test]
	async fn failed_fetches_are_dropped_not_retried() {
		let body = "#EXTM3U\n\
			#EXTINF:4.0,\nmissing.mp4\n\
			#EXTINF:4.0,\nseg1.mp4\n\
			#EXT-X-ENDLIST\n";

		let fetcher = MapFetcher::new(&[("seg1.mp4", Bytes::from_static(b"one"))]);
		let dir = tempfile::tempdir().unwrap();
		let store = Arc::new(BlobStore::with_root(dir.path()));

		let (session, mut rx) =
			DownloadSession::new(&playlist(body), &base(), Duration::ZERO, true, fetcher, store);
		session.start();

		// Only the healthy segment completes.
		let ready = collect(&mut rx, 1).await;
		assert_eq!(ready[0].index, 1);
		assert!(rx.try_recv().is_err());
	}

	#[test]
	fn resequencer_releases_in_index_order() {
		let ready = |index: usize| SegmentReady {
			index,
			file: PathBuf::from(format!("{index}.mp4")),
			offset: Duration::ZERO,
			duration: Duration::ZERO,
		};

		let mut seq = Resequencer::new(1);
		assert!(seq.push(ready(3)).is_empty());
		assert!(seq.push(ready(2)).is_empty());

		let released = seq.push(ready(1));
		let indices: Vec<_> = released.iter().map(|r| r.index).collect();
		assert_eq!(indices, [1, 2, 3]);
		assert_eq!(seq.next_index(), 4);
	}
}
