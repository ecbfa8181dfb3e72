//! RTF to text, by way of a minimal HTML rendering

use super::markup::{decode_entities, normalize_whitespace, strip_tags};

/// Destinations whose content is never document text
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "fldinst",
    "themedata",
    "colorschememapping",
    "datastore",
    "latentstyles",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "mmathPr",
    "filetbl",
    "revtbl",
];

#[derive(Debug, Clone, Copy)]
struct GroupState {
    skip: bool,
    unicode_skip: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        GroupState {
            skip: false,
            unicode_skip: 1,
        }
    }
}

struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    fn new() -> Self {
        HtmlWriter {
            out: String::from("<html><body><p>"),
        }
    }

    fn text(&mut self, c: char) {
        match c {
            '<' => self.out.push_str("&lt;"),
            '>' => self.out.push_str("&gt;"),
            '&' => self.out.push_str("&amp;"),
            _ => self.out.push(c),
        }
    }

    fn paragraph(&mut self) {
        self.out.push_str("</p><p>");
    }

    fn line_break(&mut self) {
        self.out.push_str("<br>");
    }

    fn finish(mut self) -> String {
        self.out.push_str("</p></body></html>");
        self.out
    }
}

/// Render the text content of an RTF document as simple HTML
pub fn rtf_to_html(rtf: &str) -> String {
    let chars: Vec<char> = rtf.chars().collect();
    let mut html = HtmlWriter::new();
    let mut stack: Vec<GroupState> = Vec::new();
    let mut state = GroupState::default();
    // characters still to drop after a \u escape
    let mut pending_skip = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => {
                stack.push(state);
                i += 1;
            }
            '}' => {
                state = stack.pop().unwrap_or_default();
                pending_skip = 0;
                i += 1;
            }
            '\\' => {
                i += 1;
                let Some(&next) = chars.get(i) else { break };
                if next.is_ascii_alphabetic() {
                    let (word, param, consumed) = control_word(&chars[i..]);
                    i += consumed;
                    if pending_skip > 0 {
                        pending_skip -= 1;
                        continue;
                    }
                    apply_control_word(word.as_str(), param, &mut state, &mut html, &mut pending_skip);
                    continue;
                }
                i += 1;
                let emitted = match next {
                    '\'' => {
                        let hex: String = chars.iter().skip(i).take(2).collect();
                        i += hex.chars().count();
                        hex_byte(&hex).map(cp1252_char)
                    }
                    '*' => {
                        state.skip = true;
                        None
                    }
                    '\\' | '{' | '}' => Some(next),
                    '~' => Some(' '),
                    '_' => Some('-'),
                    '\n' | '\r' => {
                        if !state.skip {
                            html.paragraph();
                        }
                        None
                    }
                    _ => None,
                };
                if let Some(ch) = emitted {
                    if pending_skip > 0 {
                        pending_skip -= 1;
                    } else if !state.skip {
                        html.text(ch);
                    }
                }
            }
            '\r' | '\n' => i += 1,
            _ => {
                if pending_skip > 0 {
                    pending_skip -= 1;
                } else if !state.skip {
                    html.text(c);
                }
                i += 1;
            }
        }
    }

    html.finish()
}

/// Windows-1252 code points for 0x80..=0x9F; unassigned bytes keep their Latin-1 value
const CP1252_HIGH: [u16; 32] = [
    0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160,
    0x2039, 0x0152, 0x008D, 0x017D, 0x008F, 0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022,
    0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
];

fn hex_byte(hex: &str) -> Option<u8> {
    if hex.len() != 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(hex, 16).ok()
}

/// Character for a `\'hh` escape under the ANSI code page
fn cp1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => char::from_u32(u32::from(CP1252_HIGH[usize::from(byte - 0x80)]))
            .unwrap_or(char::REPLACEMENT_CHARACTER),
        _ => char::from(byte),
    }
}

/// Parse `word[-]digits[ ]` at the start of `chars`
fn control_word(chars: &[char]) -> (String, Option<i32>, usize) {
    let mut pos = 0;
    let mut word = String::new();
    while let Some(&c) = chars.get(pos) {
        if !c.is_ascii_alphabetic() {
            break;
        }
        word.push(c);
        pos += 1;
    }

    let mut digits = String::new();
    if chars.get(pos) == Some(&'-') {
        digits.push('-');
        pos += 1;
    }
    while let Some(&c) = chars.get(pos) {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        pos += 1;
    }
    if digits == "-" {
        pos -= 1;
        digits.clear();
    }

    if chars.get(pos) == Some(&' ') {
        pos += 1;
    }
    (word, digits.parse().ok(), pos)
}

fn apply_control_word(
    word: &str,
    param: Option<i32>,
    state: &mut GroupState,
    html: &mut HtmlWriter,
    pending_skip: &mut usize,
) {
    if SKIPPED_DESTINATIONS.contains(&word) {
        state.skip = true;
        return;
    }
    if state.skip {
        return;
    }

    let literal = match word {
        "par" | "sect" | "page" | "row" => {
            html.paragraph();
            None
        }
        "line" => {
            html.line_break();
            None
        }
        "tab" | "cell" => Some(' '),
        "emdash" => Some('\u{2014}'),
        "endash" => Some('\u{2013}'),
        "bullet" => Some('\u{2022}'),
        "lquote" => Some('\u{2018}'),
        "rquote" => Some('\u{2019}'),
        "ldblquote" => Some('\u{201C}'),
        "rdblquote" => Some('\u{201D}'),
        "uc" => {
            state.unicode_skip = param.map_or(1, |n| n.max(0) as usize);
            None
        }
        "u" => {
            let code = param.map(|n| if n < 0 { n + 65536 } else { n });
            *pending_skip = state.unicode_skip;
            code.and_then(|n| u32::try_from(n).ok()).and_then(char::from_u32)
        }
        _ => None,
    };

    if let Some(c) = literal {
        html.text(c);
    }
}

/// Plain text of an RTF document
///
/// The document is rendered to HTML, tags are stripped and entities decoded,
/// then a space is re-inserted before each remaining `<` so literal
/// comparisons in the text stay separate tokens.
pub fn rtf_to_text(rtf: &str) -> String {
    let html = rtf_to_html(rtf);
    let text = decode_entities(&strip_tags(&html));
    normalize_whitespace(&text.replace('<', " <"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"{\rtf1\ansi\deff0{\fonttbl{\f0 Times New Roman;}}{\colortbl;\red0\green0\blue0;}
{\*\generator Writer}\f0\fs24 Project \b plan\b0\par
Costs x<y and caf\'e9\par
Quote: \ldblquote ok\rdblquote  \u8364?5\par}";

    #[test]
    fn test_rtf_to_text() {
        assert_eq!(
            rtf_to_text(SAMPLE),
            "Project plan Costs x <y and café Quote: \u{201C}ok\u{201D} €5"
        );
    }

    #[test]
    fn test_html_escapes_literal_markup() {
        let html = rtf_to_html(r"{\rtf1 a<b & c}");
        assert!(html.contains("a&lt;b &amp; c"));
    }

    #[test]
    fn test_skipped_destinations() {
        let text = rtf_to_text(r"{\rtf1{\info{\title Secret}}{\*\unknown hidden}visible}");
        assert_eq!(text, "visible");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(rtf_to_text(r"{\rtf1 \{literal\}}"), "{literal}");
    }

    #[test]
    fn test_unbalanced_input_does_not_panic() {
        assert_eq!(rtf_to_text(r"}}{\rtf1 text\"), "text");
    }

    #[test]
    fn test_hex_escapes_use_windows_code_page() {
        assert_eq!(
            rtf_to_text(r"{\rtf1 \'93ok\'94 \'80 5 \'96 caf\'e9}"),
            "\u{201C}ok\u{201D} \u{20AC} 5 \u{2013} caf\u{e9}"
        );
    }

    #[test]
    fn test_malformed_hex_escape_skips_two_chars() {
        assert_eq!(rtf_to_text("{\\rtf1 x\\'\u{e9}yz}"), "xz");
    }
}
