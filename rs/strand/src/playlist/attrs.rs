/// One `KEY=VALUE` pair from a tag's attribute list, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub key: String,
	pub value: String,
}

/// An ordered attribute list, as it appeared after the tag's colon.
///
/// Order is preserved so tags the engine only passes through (session data,
/// session keys) can be re-serialized without reshuffling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeList(pub Vec<Attribute>);

impl AttributeList {
	/// Parse the parameter segment of a tag.
	///
	/// Scanned left to right: a `"` toggles quoted mode, `=` outside quotes
	/// switches from key to value accumulation, `,` outside quotes commits
	/// the current pair. A synthetic trailing comma flushes the last pair.
	/// Quote characters themselves are not retained.
	pub fn parse(params: &str) -> Self {
		let mut attributes = Vec::new();
		let mut key = String::new();
		let mut value = String::new();
		let mut in_value = false;
		let mut quoted = false;

		for c in params.chars().chain(std::iter::once(',')) {
			match c {
				'"' => quoted = !quoted,
				'=' if !quoted && !in_value => in_value = true,
				',' if !quoted => {
					if !key.is_empty() || !value.is_empty() {
						attributes.push(Attribute {
							key: std::mem::take(&mut key),
							value: std::mem::take(&mut value),
						});
					}
					in_value = false;
				}
				_ if in_value => value.push(c),
				_ => key.push(c),
			}
		}

		Self(attributes)
	}

	/// The value of the first attribute with the given key.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|attr| attr.key == key)
			.map(|attr| attr.value.as_str())
	}

	/// A boolean attribute, where only the literal `YES` is true.
	pub fn get_flag(&self, key: &str) -> bool {
		self.get(key) == Some("YES")
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_unquoted_pairs() {
		let attrs = AttributeList::parse("BANDWIDTH=1280000,RESOLUTION=1280x720");
		assert_eq!(attrs.get("BANDWIDTH"), Some("1280000"));
		assert_eq!(attrs.get("RESOLUTION"), Some("1280x720"));
	}

	#[test]
	fn quoted_values_may_contain_commas_and_equals() {
		let attrs = AttributeList::parse(r#"CODECS="avc1.4d401f,mp4a.40.2",AUDIO="aac=hi""#);
		assert_eq!(attrs.get("CODECS"), Some("avc1.4d401f,mp4a.40.2"));
		assert_eq!(attrs.get("AUDIO"), Some("aac=hi"));
	}

	#[test]
	fn trailing_pair_is_flushed() {
		let attrs = AttributeList::parse("TYPE=AUDIO");
		assert_eq!(attrs.0.len(), 1);
		assert_eq!(attrs.get("TYPE"), Some("AUDIO"));
	}

	#[test]
	fn empty_params_yield_no_attributes() {
		assert!(AttributeList::parse("").is_empty());
	}

	#[test]
	fn order_is_preserved() {
		let attrs = AttributeList::parse("B=2,A=1,C=3");
		let keys: Vec<_> = attrs.0.iter().map(|a| a.key.as_str()).collect();
		assert_eq!(keys, ["B", "A", "C"]);
	}

	#[test]
	fn yes_flags() {
		let attrs = AttributeList::parse("DEFAULT=YES,AUTOSELECT=NO");
		assert!(attrs.get_flag("DEFAULT"));
		assert!(!attrs.get_flag("AUTOSELECT"));
		assert!(!attrs.get_flag("FORCED"));
	}
}
