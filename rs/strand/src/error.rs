/// Errors produced while parsing an M3U8 playlist.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
	/// The playlist body was not valid UTF-8.
	#[error("invalid encoding")]
	InvalidEncoding,

	#[error("invalid format: {0}")]
	InvalidFormat(String),

	/// A media-only tag appeared while parsing as a master playlist.
	///
	/// The playlist loader uses this as the signal to retry the same
	/// document as a media playlist.
	#[error("media playlist encountered during master parse")]
	MediaInsteadOfMaster,
}

/// Errors produced by the playlist loader.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum LoaderError {
	#[error("network: {0}")]
	Network(String),

	#[error("invalid url")]
	InvalidUrl,

	#[error(transparent)]
	Parse(#[from] ParseError),
}

/// Errors produced by the byte-range fetchers.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum FetchError {
	#[error("network: {0}")]
	Network(String),

	#[error("cancelled")]
	Cancelled,
}

/// Errors produced while opening a media asset for sample production.
///
/// These never cross the render queue boundary; the producer reports them
/// once and then behaves as finished.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum ProducerError {
	#[error("asset unopenable: {0}")]
	AssetUnopenable(String),

	#[error("no track of the requested media kind")]
	NoMatchingTrack,
}

/// Errors surfaced through the player.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum PlayerError {
	/// The top-level URL resolved to a media playlist.
	#[error("only master-based HLS is supported")]
	UnsupportedPlaylistShape,

	#[error("media load failed: {0}")]
	MediaLoadFailed(String),
}

impl From<LoaderError> for PlayerError {
	fn from(err: LoaderError) -> Self {
		Self::MediaLoadFailed(err.to_string())
	}
}
