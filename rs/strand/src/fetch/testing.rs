//! In-memory fetcher for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use url::Url;

use crate::FetchError;

use super::{BoxFuture, ByteSpan, ByteStream, Document, SegmentFetcher};

/// Serves resources keyed by the URL's final path component, recording every
/// request so tests can assert on fetch counts and stream reuse.
pub(crate) struct MapFetcher {
	resources: HashMap<String, Bytes>,
	pub(crate) fetches: Mutex<Vec<String>>,
	pub(crate) streams_opened: AtomicUsize,
}

impl MapFetcher {
	pub(crate) fn new(resources: &[(&str, Bytes)]) -> std::sync::Arc<Self> {
		std::sync::Arc::new(Self {
			resources: resources
				.iter()
				.map(|(name, bytes)| (name.to_string(), bytes.clone()))
				.collect(),
			fetches: Mutex::new(Vec::new()),
			streams_opened: AtomicUsize::new(0),
		})
	}

	pub(crate) fn fetch_count(&self, name: &str) -> usize {
		self.fetches
			.lock()
			.unwrap()
			.iter()
			.filter(|fetched| fetched.as_str() == name)
			.count()
	}

	fn resource(&self, url: &Url) -> Result<Bytes, FetchError> {
		let name = basename(url);
		self.resources
			.get(&name)
			.cloned()
			.ok_or_else(|| FetchError::Network(format!("no such resource: {name}")))
	}
}

impl SegmentFetcher for MapFetcher {
	fn fetch(&self, url: &Url, span: Option<ByteSpan>) -> BoxFuture<'_, Result<Bytes, FetchError>> {
		let result = self.resource(url);
		self.fetches.lock().unwrap().push(basename(url));

		Box::pin(async move {
			let bytes = result?;
			Ok(match span {
				Some(span) => bytes.slice(span.offset as usize..span.end() as usize),
				None => bytes,
			})
		})
	}

	fn fetch_document(&self, url: &Url) -> BoxFuture<'_, Result<Document, FetchError>> {
		let result = self.resource(url);
		self.fetches.lock().unwrap().push(basename(url));

		Box::pin(async move {
			Ok(Document {
				body: result?,
				accepts_ranges: true,
			})
		})
	}

	fn open_stream(&self, url: &Url, start: u64) -> BoxFuture<'_, Result<Box<dyn ByteStream>, FetchError>> {
		let result = self.resource(url);
		self.streams_opened.fetch_add(1, Ordering::Relaxed);

		Box::pin(async move {
			let bytes = result?;
			Ok(Box::new(MapStream {
				data: bytes.slice(start as usize..),
			}) as Box<dyn ByteStream>)
		})
	}
}

struct MapStream {
	data: Bytes,
}

impl ByteStream for MapStream {
	fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, FetchError>> {
		// Deliberately tiny chunks so carving loops get exercised.
		let chunk = if self.data.is_empty() {
			None
		} else {
			let take = self.data.len().min(7);
			Some(self.data.split_to(take))
		};

		Box::pin(async move { Ok(chunk) })
	}
}

fn basename(url: &Url) -> String {
	url.path_segments()
		.and_then(|segments| segments.last())
		.unwrap_or_default()
		.to_string()
}
