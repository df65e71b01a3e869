/*!
 * PO/POT text codec.
 *
 * Messages are read with `polib` and lifted into a [`Catalog`]. A line scan
 * in front of it reports malformed input by line number and unwraps `#~`
 * obsolete entries, which polib skips.
 *
 * Writing stays local: polib folds at a fixed width, rewrites the header
 * from its own field list and drops obsolete entries and `#|` comments.
 * Serialization here can fold long strings, sort entries and skip escaping.
 */

use log::debug;
use polib::po_file;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::CatalogError;

use super::model::{Catalog, Entry, EntryComments};

/// Options used when writing a catalog back to text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Fold strings longer than this many characters, `None` disables folding
    pub fold_length: Option<usize>,
    /// Sort entries by msgid
    pub sort_entries: bool,
    /// Escape quotes, backslashes and control characters
    pub escape_special_characters: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fold_length: Some(120),
            sort_entries: false,
            escape_special_characters: true,
        }
    }
}

/// Encodings a catalog can be read and written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Latin1,
}

impl Encoding {
    /// Map a declared charset name onto an encoding
    fn from_charset(name: &str) -> Result<Self, CatalogError> {
        match name.trim().to_ascii_lowercase().as_str() {
            // `CHARSET` is the placeholder xgettext leaves in fresh templates.
            // ASCII is a subset of UTF-8.
            "" | "charset" | "utf-8" | "utf8" | "ascii" | "us-ascii" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            other => Err(CatalogError::UnsupportedCharset(other.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<String, CatalogError> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).map_err(|e| CatalogError::Format {
                    line: 1 + bytes[..e.utf8_error().valid_up_to()]
                        .iter()
                        .filter(|b| **b == b'\n')
                        .count(),
                    message: "invalid UTF-8".to_string(),
                })
            }
            Self::Latin1 => Ok(bytes.iter().map(|b| *b as char).collect()),
        }
    }

    fn encode(self, text: &str) -> Result<Vec<u8>, CatalogError> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        CatalogError::UnsupportedCharset(format!("{} cannot encode {:?}", self.name(), c))
                    })
                })
                .collect(),
        }
    }
}

/// Charset named by the header's Content-Type, looked up before decoding
///
/// Header lines are plain ASCII in every supported encoding, so a lossy view
/// of the first block is enough.
fn sniff_charset(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let header: Vec<&str> = text
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty())
        .collect();
    if !header.iter().any(|line| line.starts_with("msgid \"\"")) {
        return None;
    }

    header.iter().find_map(|line| {
        let (_, rest) = line.split_once("charset=")?;
        Some(
            rest.chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect(),
        )
    })
}

/// Highest `msgstr[N]` index polib reads
const MAX_PLURAL_INDEX: usize = 9;

/// Placeholder metadata put in front of every block, polib reads the first
/// message of its input as the catalog header
const METADATA_STUB: &str = "msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
    MsgstrPlural(usize),
}

impl Keyword {
    /// Recognize a keyword, `None` when the word is not one
    fn parse(word: &str, line: usize) -> Result<Option<Self>, CatalogError> {
        let keyword = match word {
            "msgctxt" => Self::Msgctxt,
            "msgid" => Self::Msgid,
            "msgid_plural" => Self::MsgidPlural,
            "msgstr" => Self::Msgstr,
            _ => {
                let Some(index) = word.strip_prefix("msgstr[").and_then(|rest| rest.strip_suffix(']')) else {
                    return Ok(None);
                };
                let index = index
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index <= MAX_PLURAL_INDEX)
                    .ok_or_else(|| CatalogError::Format {
                        line,
                        message: format!("invalid plural index in {:?}", word),
                    })?;
                Self::MsgstrPlural(index)
            }
        };
        Ok(Some(keyword))
    }

    fn render(self, token: &str) -> String {
        match self {
            Self::Msgctxt => format!("msgctxt {}", token),
            Self::Msgid => format!("msgid {}", token),
            Self::MsgidPlural => format!("msgid_plural {}", token),
            Self::Msgstr => format!("msgstr {}", token),
            Self::MsgstrPlural(index) => format!("msgstr[{}] {}", index, token),
        }
    }
}

/// Check that a token is one complete quoted string
fn quoted(token: &str, line: usize) -> Result<&str, CatalogError> {
    let token = token.trim();
    let inner = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| CatalogError::Format {
            line,
            message: format!("expected a quoted string, found {:?}", token),
        })?;

    // A trailing quote preceded by an odd number of backslashes is escaped
    if inner.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1 {
        return Err(CatalogError::Format {
            line,
            message: "unterminated string".to_string(),
        });
    }

    Ok(token)
}

/// The lines of one message, rewritten into the layout polib reads
#[derive(Debug, Default)]
struct Block {
    start_line: usize,
    lines: Vec<String>,
    flags: Vec<String>,
    previous: Vec<String>,
    last_keyword: Option<Keyword>,
    has_msgid: bool,
    has_context: bool,
    obsolete: bool,
}

impl Block {
    fn starting_at(line: usize) -> Self {
        Self {
            start_line: line,
            ..Default::default()
        }
    }

    fn has_keywords(&self) -> bool {
        self.last_keyword.is_some()
    }

    /// Whether this line opens the next message once keywords were seen
    fn is_boundary(&self, line: &str) -> bool {
        self.has_keywords()
            && (line.starts_with('#')
                || line.starts_with("msgctxt")
                || (line.starts_with("msgid")
                    && !line.starts_with("msgid_plural")
                    && self.last_keyword != Some(Keyword::Msgctxt)))
    }

    fn push_comment(&mut self, comment: &str) {
        match comment.chars().next() {
            Some('.') => self.lines.push(format!("#. {}", comment[1..].trim_start())),
            Some(':') => self.lines.push(format!("#: {}", comment[1..].trim_start())),
            Some(',') => self.flags.extend(
                comment[1..]
                    .split(',')
                    .map(str::trim)
                    .filter(|flag| !flag.is_empty())
                    .map(str::to_string),
            ),
            Some('|') => self.previous.push(comment[1..].trim_start().to_string()),
            _ => self
                .lines
                .push(format!("# {}", comment.strip_prefix(' ').unwrap_or(comment))),
        }
    }

    fn push_keyword(&mut self, keyword: Keyword, token: &str) {
        match keyword {
            Keyword::Msgid => self.has_msgid = true,
            Keyword::Msgctxt => self.has_context = true,
            _ => {}
        }
        self.last_keyword = Some(keyword);
        self.lines.push(keyword.render(token));
    }

    /// Read the block through polib and lift the message into an [`Entry`]
    fn into_entry(self) -> Result<Entry, CatalogError> {
        let line = self.start_line;
        let format_error = |message: String| CatalogError::Format { line, message };

        let mut source = String::from(METADATA_STUB);
        if !self.flags.is_empty() {
            source.push_str(&format!("#, {}\n", self.flags.join(", ")));
        }
        for text in &self.lines {
            source.push_str(text);
            source.push('\n');
        }

        let parsed = po_file::parse_from_reader(source.as_bytes()).map_err(|e| format_error(e.to_string()))?;
        let message = parsed
            .messages()
            .next()
            .ok_or_else(|| format_error("entry without msgid".to_string()))?;

        let mut entry = Entry::new(message.msgid());
        entry.msgctxt = match message.msgctxt() {
            Some(context) => Some(context.to_string()),
            None if self.has_context => Some(String::new()),
            None => None,
        };
        if message.is_plural() {
            entry.msgid_plural = message.msgid_plural().ok().map(str::to_string);
            entry.msgstr = message.msgstr_plural().cloned().unwrap_or_default();
        } else {
            entry.msgstr = vec![message.msgstr().unwrap_or_default().to_string()];
        }
        if entry.msgstr.is_empty() {
            entry.msgstr.push(String::new());
        }
        entry.comments = EntryComments {
            translator: message.translator_comments().to_string(),
            extracted: message.extracted_comments().to_string(),
            reference: message.source().to_string(),
            flag: message.flags().to_string(),
            previous: self.previous.join("\n"),
        };
        entry.obsolete = self.obsolete;
        Ok(entry)
    }
}

/// Close the current block and start the next one at `next_line`
fn flush(blocks: &mut Vec<Block>, block: &mut Block, next_line: usize) -> Result<(), CatalogError> {
    let done = std::mem::replace(block, Block::starting_at(next_line));
    if !done.has_keywords() {
        // Comment block without any message, nothing to keep
        return Ok(());
    }
    if !done.has_msgid {
        return Err(CatalogError::Format {
            line: done.start_line,
            message: "entry without msgid".to_string(),
        });
    }
    blocks.push(done);
    Ok(())
}

/// Split catalog text into message blocks
///
/// Validates every line so malformed input is reported with its line number,
/// and unwraps `#~` markers so obsolete entries read like live ones.
fn split_blocks(text: &str) -> Result<Vec<Block>, CatalogError> {
    let mut blocks = Vec::new();
    let mut block = Block::starting_at(1);

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let mut line = raw_line.trim();

        if line.is_empty() {
            flush(&mut blocks, &mut block, line_no + 1)?;
            continue;
        }

        let mut obsolete = false;
        if let Some(rest) = line.strip_prefix("#~") {
            obsolete = true;
            line = rest.trim_start();
            if line.is_empty() {
                continue;
            }
            // `#~|` is the previous-msgid comment of an obsolete entry
            if let Some(previous) = line.strip_prefix('|') {
                if block.has_keywords() {
                    flush(&mut blocks, &mut block, line_no)?;
                }
                block.obsolete = true;
                block.previous.push(previous.trim_start().to_string());
                continue;
            }
        }

        if block.is_boundary(line) {
            flush(&mut blocks, &mut block, line_no)?;
        }
        if obsolete {
            block.obsolete = true;
        }

        if let Some(comment) = line.strip_prefix('#') {
            block.push_comment(comment);
            continue;
        }

        if line.starts_with('"') {
            if !block.has_keywords() {
                return Err(CatalogError::Format {
                    line: line_no,
                    message: "string continuation without a keyword".to_string(),
                });
            }
            let token = quoted(line, line_no)?;
            block.lines.push(token.to_string());
            continue;
        }

        let (word, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], &line[pos..]),
            None => (line, ""),
        };
        match Keyword::parse(word, line_no)? {
            Some(keyword) => {
                let token = quoted(rest, line_no)?;
                block.push_keyword(keyword, token);
            }
            None => {
                return Err(CatalogError::Format {
                    line: line_no,
                    message: format!("unexpected content {:?}", line),
                });
            }
        }
    }

    let next_line = text.lines().count() + 1;
    flush(&mut blocks, &mut block, next_line)?;
    Ok(blocks)
}

fn insert_entry(catalog: &mut Catalog, entry: Entry) {
    match catalog.get(entry.context_key(), &entry.msgid) {
        // An obsolete duplicate never shadows a live entry
        Some(existing) if entry.obsolete && !existing.obsolete => {
            debug!("Skipping obsolete duplicate of {:?}", entry.msgid);
        }
        _ => {
            catalog.insert(entry);
        }
    }
}

/// Parse catalog text from raw bytes in the given charset
pub fn parse(bytes: &[u8], charset: &str) -> Result<Catalog, CatalogError> {
    let text = Encoding::from_charset(charset)?.decode(bytes)?;
    parse_str(&text, charset)
}

/// Parse catalog text that is already decoded
///
/// A charset declared in the header replaces `charset`.
pub fn parse_str(text: &str, charset: &str) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new();
    catalog.charset = Encoding::from_charset(charset)?.name().to_string();

    for block in split_blocks(text)? {
        insert_entry(&mut catalog, block.into_entry()?);
    }

    let header_text = catalog.header_entry().map(|entry| entry.translation().to_string());
    if let Some(header_text) = header_text {
        catalog.headers = parse_headers(&header_text);
        if let Some(declared) = declared_charset(&catalog) {
            catalog.charset = Encoding::from_charset(&declared)?.name().to_string();
        }
    }

    Ok(catalog)
}

/// Parse `Name: value` header lines
pub fn parse_headers(text: &str) -> indexmap::IndexMap<String, String> {
    text.lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn declared_charset(catalog: &Catalog) -> Option<String> {
    let content_type = catalog.header("Content-Type")?;
    let (_, charset) = content_type.split_once("charset=")?;
    let charset = charset.split(';').next()?.trim();
    (!charset.is_empty()).then(|| charset.to_lowercase())
}

fn render_headers(catalog: &Catalog) -> String {
    catalog
        .headers
        .iter()
        .map(|(name, value)| format!("{}: {}\n", name, value))
        .collect()
}

/// Escape the characters polib unescapes when reading
fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            _ => result.push(c),
        }
    }
    result
}

/// Split an escaped string into output lines
fn fold(value: &str, fold_length: Option<usize>) -> Vec<String> {
    let Some(max) = fold_length.filter(|max| *max > 0) else {
        return vec![value.to_string()];
    };

    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    let mut lines = Vec::new();
    let mut pos = 0;

    while pos < len {
        let mut end = (pos + max).min(len);

        // Never cut an escape sequence in half
        while end < len && ends_with_open_escape(&chars[pos..end]) {
            end += 1;
        }

        if let Some(newline) = newline_break(&chars[pos..end]) {
            end = pos + newline;
        } else if end < len {
            if let Some(space) = chars[pos..end].iter().rposition(|c| c.is_whitespace()) {
                if space > 0 {
                    end = pos + space + 1;
                }
            }
        }

        lines.push(chars[pos..end].iter().collect());
        pos = end;
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn ends_with_open_escape(chars: &[char]) -> bool {
    chars.iter().rev().take_while(|c| **c == '\\').count() % 2 == 1
}

/// Position just after the first newline (escaped or raw)
fn newline_break(chars: &[char]) -> Option<usize> {
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if chars.get(i + 1) == Some(&'n') => return Some(i + 2),
            '\\' => i += 2,
            '\n' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn write_string(out: &mut String, prefix: &str, keyword: &str, value: &str, options: &CompileOptions) {
    let value = if options.escape_special_characters {
        escape(value)
    } else {
        value.to_string()
    };
    let lines = fold(&value, options.fold_length);

    if lines.len() <= 1 {
        out.push_str(&format!("{}{} \"{}\"\n", prefix, keyword, value));
        return;
    }

    out.push_str(&format!("{}{} \"\"\n", prefix, keyword));
    for line in lines {
        out.push_str(&format!("{}\"{}\"\n", prefix, line));
    }
}

fn write_comments(out: &mut String, marker: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    for line in text.split('\n') {
        if line.is_empty() {
            out.push_str(marker.trim_end());
        } else {
            out.push_str(marker);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn write_entry(out: &mut String, entry: &Entry, msgstr_override: Option<&str>, options: &CompileOptions) {
    let comments = &entry.comments;
    write_comments(out, "# ", &comments.translator);
    write_comments(out, "#. ", &comments.extracted);
    write_comments(out, "#: ", &comments.reference);
    write_comments(out, "#, ", &comments.flag);
    write_comments(out, "#| ", &comments.previous);

    let prefix = if entry.obsolete { "#~ " } else { "" };

    if let Some(msgctxt) = &entry.msgctxt {
        write_string(out, prefix, "msgctxt", msgctxt, options);
    }
    write_string(out, prefix, "msgid", &entry.msgid, options);

    if let Some(plural) = &entry.msgid_plural {
        write_string(out, prefix, "msgid_plural", plural, options);
        for (index, form) in entry.msgstr.iter().enumerate() {
            write_string(out, prefix, &format!("msgstr[{}]", index), form, options);
        }
    } else {
        let msgstr = msgstr_override.unwrap_or_else(|| entry.translation());
        write_string(out, prefix, "msgstr", msgstr, options);
    }
}

/// Serialize a catalog to text
pub fn serialize_to_string(catalog: &Catalog, options: &CompileOptions) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if !catalog.headers.is_empty() || catalog.header_entry().is_some() {
        let header_entry = catalog.header_entry().cloned().unwrap_or_else(|| Entry::new(""));
        let header_text = render_headers(catalog);
        let mut block = String::new();
        write_entry(&mut block, &header_entry, Some(&header_text), options);
        blocks.push(block);
    }

    let mut entries: Vec<&Entry> = catalog.entries().collect();
    if options.sort_entries {
        entries.sort_by(|a, b| {
            a.msgid
                .cmp(&b.msgid)
                .then_with(|| a.context_key().cmp(b.context_key()))
        });
    }

    // Obsolete entries go last, as gettext tools write them
    let (active, obsolete): (Vec<&Entry>, Vec<&Entry>) =
        entries.into_iter().partition(|entry| !entry.obsolete);

    for entry in active.into_iter().chain(obsolete) {
        let mut block = String::new();
        write_entry(&mut block, entry, None, options);
        blocks.push(block);
    }

    blocks.join("\n")
}

/// Serialize a catalog to bytes in its charset
pub fn serialize(catalog: &Catalog, options: &CompileOptions) -> Result<Vec<u8>, CatalogError> {
    Encoding::from_charset(&catalog.charset)?.encode(&serialize_to_string(catalog, options))
}

/// Read and parse a catalog file in the charset its header declares
///
/// Files without a declared charset are read as UTF-8.
pub fn read_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let bytes = fs::read(path.as_ref())?;
    let charset = sniff_charset(&bytes).unwrap_or_default();
    parse(&bytes, &charset)
}

/// Serialize and write a catalog file
pub fn write_catalog<P: AsRef<Path>>(
    catalog: &Catalog,
    path: P,
    options: &CompileOptions,
) -> Result<(), CatalogError> {
    let bytes = serialize(catalog, options)?;
    fs::write(path.as_ref(), bytes)?;
    Ok(())
}
