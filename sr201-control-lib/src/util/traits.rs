use serde::Serialize;

/// A raw device reply, together with its decoded form if it had one.
///
/// The board gives no framing or status codes, so a reply that does not
/// match the expected layout is not an error: the raw text is still
/// returned to the caller for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply<T> {
    /// The reply with surrounding whitespace stripped.
    pub raw: String,
    /// `None` if the reply did not match the expected layout.
    pub decoded: Option<T>,
}

impl<T> Reply<T> {
    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }
}

/// Trait for values carried in a fixed-format device reply.
pub trait DecodeResponse: Sized {
    /// Decode a reply.
    /// # Returns
    /// The decoded value, or `None` if `raw` does not have the expected layout.
    fn decode(raw: &str) -> Option<Self>;

    /// Wrap `raw` in a [`Reply`], decoding it on the way.
    fn into_reply(raw: String) -> Reply<Self> {
        let decoded = Self::decode(&raw);
        Reply { raw, decoded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Digit(u32);

    impl DecodeResponse for Digit {
        fn decode(raw: &str) -> Option<Self> {
            raw.parse().ok().map(Digit)
        }
    }

    #[test]
    fn test_into_reply_keeps_raw() {
        let reply = Digit::into_reply("garbage".to_string());
        assert_eq!(reply.raw, "garbage");
        assert!(!reply.is_decoded());

        let reply = Digit::into_reply("7".to_string());
        assert_eq!(reply.decoded.map(|d| d.0), Some(7));
    }
}
