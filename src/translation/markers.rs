/*!
 * Tagged payload codec.
 *
 * Each submitted string is wrapped as `<translate i="N">text</translate>` and
 * the backend is expected to answer with the same tags around the
 * translations. Everything that knows about this text format lives behind
 * `ResponseDecoder`, so a backend with structured output only needs a new
 * implementation of that trait.
 */

use log::debug;

/// One item of a request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedItem<'a> {
    pub index: usize,
    pub text: &'a str,
}

/// Encodes request payloads and locates answers in backend responses
pub trait ResponseDecoder: Send + Sync + std::fmt::Debug {
    /// Render items as a single message
    fn encode(&self, items: &[TaggedItem<'_>]) -> String;

    /// The answer addressed to `index`, if the response contains one
    fn decode(&self, response: &str, index: usize) -> Option<String>;
}

/// The `<translate i="N">` text format
#[derive(Debug, Clone, Copy, Default)]
pub struct TagDecoder;

const CLOSE_TAG: &str = "</translate>";

impl TagDecoder {
    fn open_tag(index: usize) -> String {
        format!("<translate i=\"{}\">", index)
    }

    /// Wrap one string in its tag
    pub fn wrap(index: usize, text: &str) -> String {
        format!("{}{}{}", Self::open_tag(index), text, CLOSE_TAG)
    }
}

impl ResponseDecoder for TagDecoder {
    fn encode(&self, items: &[TaggedItem<'_>]) -> String {
        items
            .iter()
            .map(|item| Self::wrap(item.index, item.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn decode(&self, response: &str, index: usize) -> Option<String> {
        let open = Self::open_tag(index);
        let start = response.find(&open)? + open.len();
        let Some(length) = response[start..].find(CLOSE_TAG) else {
            debug!("Tag {} is opened but never closed", index);
            return None;
        };
        Some(response[start..start + length].to_string())
    }
}
