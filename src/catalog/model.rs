/*!
 * In-memory catalog model.
 *
 * A catalog is a set of headers plus entries grouped by message context.
 * The default (no `msgctxt`) group is keyed by the empty string, and the
 * catalog's own header lives in that group as the entry with an empty `msgid`.
 * Both levels are insertion ordered so serialization keeps the file layout.
 */

use indexmap::IndexMap;

/// Entries of one message context, keyed by `msgid`
pub type Context = IndexMap<String, Entry>;

/// Comment lines attached to an entry. Multi-line comments are joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryComments {
    /// `# ` translator comments
    pub translator: String,
    /// `#.` comments extracted from the source code
    pub extracted: String,
    /// `#:` source references
    pub reference: String,
    /// `#,` flags such as `fuzzy, c-format`
    pub flag: String,
    /// `#|` previous msgid/msgctxt
    pub previous: String,
}

impl EntryComments {
    pub fn is_empty(&self) -> bool {
        self.translator.is_empty()
            && self.extracted.is_empty()
            && self.reference.is_empty()
            && self.flag.is_empty()
            && self.previous.is_empty()
    }
}

/// One translatable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub msgctxt: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    /// Plural forms; index 0 is the singular form
    pub msgstr: Vec<String>,
    pub comments: EntryComments,
    /// Entry was written with `#~` markers
    pub obsolete: bool,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            msgctxt: None,
            msgid: String::new(),
            msgid_plural: None,
            msgstr: vec![String::new()],
            comments: EntryComments::default(),
            obsolete: false,
        }
    }
}

impl Entry {
    /// Create an untranslated entry
    pub fn new(msgid: impl Into<String>) -> Self {
        Self {
            msgid: msgid.into(),
            ..Default::default()
        }
    }

    /// Set the singular translation (builder style)
    pub fn with_msgstr(mut self, msgstr: impl Into<String>) -> Self {
        self.set_translation(msgstr);
        self
    }

    /// Set the message context (builder style)
    pub fn with_context(mut self, msgctxt: impl Into<String>) -> Self {
        self.msgctxt = Some(msgctxt.into());
        self
    }

    /// Set the flag comment (builder style)
    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.comments.flag = flags.into();
        self
    }

    /// Set the reference comment (builder style)
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.comments.reference = reference.into();
        self
    }

    /// Set the extracted comment (builder style)
    pub fn with_extracted_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.extracted = comment.into();
        self
    }

    /// The context group this entry belongs to
    pub fn context_key(&self) -> &str {
        self.msgctxt.as_deref().unwrap_or("")
    }

    /// Whether this is the catalog header pseudo-entry
    pub fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.msgctxt.is_none()
    }

    /// The singular translation, empty when untranslated
    pub fn translation(&self) -> &str {
        self.msgstr.first().map(String::as_str).unwrap_or("")
    }

    /// Replace the singular translation, keeping other plural forms
    pub fn set_translation(&mut self, value: impl Into<String>) {
        match self.msgstr.first_mut() {
            Some(first) => *first = value.into(),
            None => self.msgstr.push(value.into()),
        }
    }

    /// All plural forms joined with newlines
    pub fn joined_msgstr(&self) -> String {
        self.msgstr.join("\n")
    }

    /// Whether the joined plural forms are non-empty.
    ///
    /// Forms are joined with `\n`, so an entry with two empty plural forms
    /// counts as translated.
    pub fn is_translated(&self) -> bool {
        !self.joined_msgstr().is_empty()
    }

    /// Whether the flag comment contains `token` as a whole word
    pub fn has_flag(&self, token: &str) -> bool {
        self.comments
            .flag
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| word == token)
    }

    pub fn is_fuzzy(&self) -> bool {
        self.has_flag("fuzzy")
    }

    /// Add a flag if it is not already present
    pub fn add_flag(&mut self, token: &str) {
        if self.has_flag(token) {
            return;
        }
        if self.comments.flag.is_empty() {
            self.comments.flag = token.to_string();
        } else {
            self.comments.flag = format!("{}, {}", self.comments.flag, token);
        }
    }
}

/// A parsed PO/POT catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Charset used to decode the catalog
    pub charset: String,
    /// Header fields in file order
    pub headers: IndexMap<String, String>,
    /// Entries grouped by message context
    pub contexts: IndexMap<String, Context>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create an empty UTF-8 catalog
    pub fn new() -> Self {
        Self {
            charset: "utf-8".to_string(),
            headers: IndexMap::new(),
            contexts: IndexMap::new(),
        }
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Set a header value, appending it when new
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// The `Language` header, if present and non-empty
    pub fn language(&self) -> Option<&str> {
        self.header("Language")
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
    }

    /// Insert an entry into its context group, replacing any entry with the same msgid
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        let context = entry.context_key().to_string();
        self.contexts
            .entry(context)
            .or_default()
            .insert(entry.msgid.clone(), entry)
    }

    pub fn get(&self, context: &str, msgid: &str) -> Option<&Entry> {
        self.contexts.get(context).and_then(|entries| entries.get(msgid))
    }

    pub fn get_mut(&mut self, context: &str, msgid: &str) -> Option<&mut Entry> {
        self.contexts
            .get_mut(context)
            .and_then(|entries| entries.get_mut(msgid))
    }

    /// Remove an entry, preserving the order of the remaining ones
    pub fn remove(&mut self, context: &str, msgid: &str) -> Option<Entry> {
        self.contexts
            .get_mut(context)
            .and_then(|entries| entries.shift_remove(msgid))
    }

    /// The header pseudo-entry, if the catalog has one
    pub fn header_entry(&self) -> Option<&Entry> {
        self.get("", "")
    }

    /// Iterate over all entries except the header, in catalog order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.contexts
            .values()
            .flat_map(|entries| entries.values())
            .filter(|entry| !entry.is_header())
    }

    /// Mutable iteration over all entries except the header, in catalog order
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.contexts
            .values_mut()
            .flat_map(|entries| entries.values_mut())
            .filter(|entry| !entry.is_header())
    }

    /// Number of entries, not counting the header
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
