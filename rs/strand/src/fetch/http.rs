use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use reqwest::header;
use reqwest::Client;
use url::Url;

use crate::FetchError;

use super::{BandwidthMeter, BoxFuture, ByteSpan, ByteStream, Document, SegmentFetcher};

fn network(err: reqwest::Error) -> FetchError {
	FetchError::Network(err.to_string())
}

/// The reqwest-backed [`SegmentFetcher`].
///
/// Every transfer is reported to the shared [`BandwidthMeter`]; streaming
/// responses report per chunk, one-shot fetches report once on completion.
#[derive(Clone)]
pub struct HttpFetcher {
	client: Client,
	meter: Arc<BandwidthMeter>,
}

impl HttpFetcher {
	pub fn new(meter: Arc<BandwidthMeter>) -> Self {
		let client = Client::builder()
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()
			.expect("failed to build HTTP client");

		Self { client, meter }
	}

	pub fn with_client(client: Client, meter: Arc<BandwidthMeter>) -> Self {
		Self { client, meter }
	}
}

impl SegmentFetcher for HttpFetcher {
	fn fetch(&self, url: &Url, span: Option<ByteSpan>) -> BoxFuture<'_, Result<Bytes, FetchError>> {
		let client = self.client.clone();
		let meter = self.meter.clone();
		let url = url.clone();

		Box::pin(async move {
			let started = Instant::now();

			let mut request = client.get(url);
			if let Some(span) = span {
				request = request.header(header::RANGE, span.header_value());
			}

			let response = request.send().await.map_err(network)?;
			let response = response.error_for_status().map_err(network)?;
			let bytes = response.bytes().await.map_err(network)?;

			meter.add(started.elapsed(), bytes.len());
			Ok(bytes)
		})
	}

	fn fetch_document(&self, url: &Url) -> BoxFuture<'_, Result<Document, FetchError>> {
		let client = self.client.clone();
		let meter = self.meter.clone();
		let url = url.clone();

		Box::pin(async move {
			let started = Instant::now();

			let response = client.get(url).send().await.map_err(network)?;
			let response = response.error_for_status().map_err(network)?;

			// Header names are matched case-insensitively; the value still
			// needs its own case-insensitive comparison.
			let accepts_ranges = response
				.headers()
				.get(header::ACCEPT_RANGES)
				.and_then(|value| value.to_str().ok())
				.map(|value| value.eq_ignore_ascii_case("bytes"))
				.unwrap_or(false);

			let body = response.bytes().await.map_err(network)?;
			meter.add(started.elapsed(), body.len());

			Ok(Document { body, accepts_ranges })
		})
	}

	fn open_stream(&self, url: &Url, start: u64) -> BoxFuture<'_, Result<Box<dyn ByteStream>, FetchError>> {
		let client = self.client.clone();
		let meter = self.meter.clone();
		let url = url.clone();

		Box::pin(async move {
			let mut request = client.get(url);
			// An open-ended range from zero is just the whole resource.
			if start > 0 {
				request = request.header(header::RANGE, format!("bytes={start}-"));
			}

			let response = request.send().await.map_err(network)?;
			let response = response.error_for_status().map_err(network)?;

			Ok(Box::new(HttpByteStream {
				response,
				meter,
				last_chunk: Instant::now(),
			}) as Box<dyn ByteStream>)
		})
	}
}

struct HttpByteStream {
	response: reqwest::Response,
	meter: Arc<BandwidthMeter>,
	last_chunk: Instant,
}

impl ByteStream for HttpByteStream {
	fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, FetchError>> {
		Box::pin(async move {
			let chunk = self.response.chunk().await.map_err(network)?;

			if let Some(chunk) = &chunk {
				self.meter.add(self.last_chunk.elapsed(), chunk.len());
				self.last_chunk = Instant::now();
			}

			Ok(chunk)
		})
	}
}
