//! Legacy charset handling.
//!
//! The portal is a GB-era ASP application: response bodies arrive in
//! GB2312/GBK with unreliable charset headers, and the login form must be
//! percent-encoded as GB18030 bytes or non-ASCII usernames are garbled on
//! the server side.

use encoding_rs::{Encoding, GB18030};
use url::form_urlencoded;

/// How many leading bytes are searched for a `<meta charset>` declaration.
const SNIFF_WINDOW: usize = 1024;

/// Charset labels that effectively mean "the server didn't say".
const UNRELIABLE_LABELS: &[&str] = &["iso-8859-1", "ascii", "us-ascii"];

/// Decode a response body.
///
/// The header charset wins when it names a real encoding; otherwise the
/// head of the document is sniffed for a meta declaration, and GB18030 is
/// the final fallback. Decoding is always lossy, never fallible.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some(label) = content_type.and_then(charset_label) {
        if !UNRELIABLE_LABELS.contains(&label.as_str()) {
            if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
                return encoding.decode(bytes).0.into_owned();
            }
        }
    }

    let head = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    if let Some(encoding) = sniff_meta_charset(head) {
        return encoding.decode(bytes).0.into_owned();
    }

    GB18030.decode(bytes).0.into_owned()
}

/// Percent-encode form pairs as GB18030 bytes.
pub fn encode_form(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .encoding_override(Some(&|s| GB18030.encode(s).0))
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

fn charset_label(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let idx = lower.find("charset=")?;
    let rest = lower[idx + "charset=".len()..].trim_start_matches(['"', '\'']);
    let label: String = rest
        .chars()
        .take_while(|c| !matches!(c, ';' | ' ' | '"' | '\'' | '>' | '/'))
        .collect();
    (!label.is_empty()).then_some(label)
}

fn sniff_meta_charset(head: &[u8]) -> Option<&'static Encoding> {
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    let label = charset_label(&text)?;
    Encoding::for_label(label.as_bytes())
}
