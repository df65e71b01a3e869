/*!
 * Prompt templates for catalog translation.
 *
 * A request is a short scripted conversation: the system instructions, the
 * user's translation instruction and an acknowledgement, an optional
 * glossary exchange, and finally the tagged payload.
 */

use crate::providers::{ChatMessage, ChatRequest};
use crate::translation::markers::{ResponseDecoder, TaggedItem};

/// Default content of `systemprompt.txt`
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a professional translator working on software localization catalogs.

Every string to translate is wrapped in a tag such as <translate i="1">text</translate>.
- Translate only the text inside the tags.
- Reply with every tag you received, keeping its i attribute unchanged, and nothing else.
- Keep placeholders (%s, %d, {name}, {{count}}), HTML/XML markup, escape sequences and keyboard accelerators (_File, &Open) exactly as they are.
- Keep leading and trailing whitespace and line breaks.
- Use the terminology you were given earlier in the conversation."#;

/// Default user instruction; `{source}` and `{target}` are replaced by language names
pub const DEFAULT_USER_PROMPT: &str = "Translate the {source} content I will post later into {target}, and keep the untranslated parts such as symbols in the result.";

/// Fixed acknowledgement that closes the instruction exchange
pub const ASSISTANT_ACKNOWLEDGEMENT: &str = "Sure, please send me the content that needs to be translated.";

/// Prompt texts for one translation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    system_prompt: String,
    user_prompt: String,
    context: Option<String>,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl PromptSet {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
            context: None,
        }
    }

    /// Replace the user instruction template
    pub fn with_user_prompt(mut self, user_prompt: impl Into<String>) -> Self {
        let user_prompt = user_prompt.into();
        if !user_prompt.trim().is_empty() {
            self.user_prompt = user_prompt;
        }
        self
    }

    /// Append static context (e.g. a product description) to the system prompt
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.trim().is_empty()).then_some(context);
        self
    }

    /// System content with context and developer notes appended
    pub fn system_content(&self, developer_notes: &[&str]) -> String {
        let mut content = self.system_prompt.trim_end().to_string();
        if let Some(context) = &self.context {
            content.push_str("\n\n");
            content.push_str(context.trim());
        }
        let notes: Vec<&str> = developer_notes
            .iter()
            .map(|note| note.trim())
            .filter(|note| !note.is_empty())
            .collect();
        if !notes.is_empty() {
            content.push_str("\n\nNotes from the developers about these strings:\n");
            content.push_str(&notes.join("\n"));
        }
        content
    }

    /// The user instruction for the given language names
    pub fn render_user_prompt(&self, source: &str, target: &str) -> String {
        self.user_prompt
            .replace("{source}", source)
            .replace("{target}", target)
    }
}

/// A request ready to send, plus the index each payload string was tagged with
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub request: ChatRequest,
    /// Tag index of the n-th payload string
    pub indices: Vec<usize>,
}

/// Builder for one batch request
#[derive(Debug)]
pub struct BatchPromptBuilder<'a> {
    prompts: &'a PromptSet,
    decoder: &'a dyn ResponseDecoder,
    source_language: String,
    target_language: String,
    glossary: Vec<(&'a str, &'a str)>,
    notes: Vec<&'a str>,
}

impl<'a> BatchPromptBuilder<'a> {
    pub fn new(
        prompts: &'a PromptSet,
        decoder: &'a dyn ResponseDecoder,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        Self {
            prompts,
            decoder,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            glossary: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Glossary terms relevant to this batch, as (term, rendering)
    pub fn with_glossary(mut self, terms: Vec<(&'a str, &'a str)>) -> Self {
        self.glossary = terms;
        self
    }

    /// Extracted comments of the batch entries
    pub fn with_notes(mut self, notes: Vec<&'a str>) -> Self {
        self.notes = notes;
        self
    }

    /// Build the request. Glossary terms take indices `1..=n`, payload
    /// strings continue from `n + 1`.
    pub fn build(&self, model: &str, payload: &[&str]) -> PreparedRequest {
        let mut request = ChatRequest::new(model)
            .add_message(ChatMessage::system(self.prompts.system_content(&self.notes)))
            .add_message(ChatMessage::user(
                self.prompts
                    .render_user_prompt(&self.source_language, &self.target_language),
            ))
            .add_message(ChatMessage::assistant(ASSISTANT_ACKNOWLEDGEMENT));

        if !self.glossary.is_empty() {
            let terms: Vec<TaggedItem<'_>> = self
                .glossary
                .iter()
                .enumerate()
                .map(|(i, (term, _))| TaggedItem { index: i + 1, text: term })
                .collect();
            let renderings: Vec<TaggedItem<'_>> = self
                .glossary
                .iter()
                .enumerate()
                .map(|(i, (_, rendering))| TaggedItem {
                    index: i + 1,
                    text: rendering,
                })
                .collect();
            request = request
                .add_message(ChatMessage::user(self.decoder.encode(&terms)))
                .add_message(ChatMessage::assistant(self.decoder.encode(&renderings)));
        }

        let first = self.glossary.len() + 1;
        let items: Vec<TaggedItem<'_>> = payload
            .iter()
            .enumerate()
            .map(|(i, text)| TaggedItem { index: first + i, text })
            .collect();
        let indices = items.iter().map(|item| item.index).collect();
        request = request.add_message(ChatMessage::user(self.decoder.encode(&items)));

        PreparedRequest { request, indices }
    }
}
