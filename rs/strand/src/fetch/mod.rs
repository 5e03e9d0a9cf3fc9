//! Byte-range fetching.
//!
//! The engine never talks to the network directly; everything goes through
//! the [`SegmentFetcher`] trait so the download session and playlist loader
//! stay independent of any particular HTTP client. [`HttpFetcher`] is the
//! reqwest-backed implementation used in production.
//!
//! Two consumption shapes are supported, matching how HLS servers lay out
//! segments:
//!
//! - whole-resource or closed-range fetches ([`SegmentFetcher::fetch`]),
//!   where the payload arrives in one piece, and
//! - open-ended ranged streams ([`SegmentFetcher::open_stream`]), where many
//!   byte-ranged segments are carved out of a single response as chunks
//!   arrive.

mod bandwidth;
mod http;

#[cfg(test)]
pub(crate) mod testing;

pub use bandwidth::*;
pub use http::*;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use url::Url;

use crate::FetchError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A closed byte range: `length` bytes starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
	pub offset: u64,
	pub length: u64,
}

impl ByteSpan {
	/// The inclusive `Range` header value for this span.
	pub fn header_value(&self) -> String {
		format!("bytes={}-{}", self.offset, self.end().saturating_sub(1))
	}

	/// End of the span, exclusive.
	pub fn end(&self) -> u64 {
		self.offset + self.length
	}
}

/// A fetched document plus the transport metadata the loader cares about.
#[derive(Debug, Clone)]
pub struct Document {
	pub body: Bytes,

	/// Whether the server advertised `Accept-Ranges: bytes`.
	pub accepts_ranges: bool,
}

/// Asynchronous byte fetcher used by the playlist loader and the download
/// session.
pub trait SegmentFetcher: Send + Sync {
	/// Fetch a whole resource, or a closed byte range of it, in one piece.
	fn fetch(&self, url: &Url, span: Option<ByteSpan>) -> BoxFuture<'_, Result<Bytes, FetchError>>;

	/// Fetch a document and report range support.
	fn fetch_document(&self, url: &Url) -> BoxFuture<'_, Result<Document, FetchError>>;

	/// Open an open-ended ranged stream starting at byte `start`.
	fn open_stream(&self, url: &Url, start: u64) -> BoxFuture<'_, Result<Box<dyn ByteStream>, FetchError>>;
}

/// A stream of payload chunks from an in-flight request.
pub trait ByteStream: Send {
	/// The next chunk, or `None` once the response body is exhausted.
	fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, FetchError>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn span_header_is_inclusive() {
		let span = ByteSpan { offset: 4096, length: 15000 };
		assert_eq!(span.header_value(), "bytes=4096-19095");
		assert_eq!(span.end(), 19096);
	}
}
