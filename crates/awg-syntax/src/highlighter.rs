//! Single-pass highlighter for tunnel configuration text.

use crate::field::{Field, Section};
use crate::validate;
use crate::{Category, Highlight, Span};
use tracing::trace;

/// What the scanner is in the middle of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Start of a line, or nothing but whitespace so far.
    None,
    /// Reading a key, before `=`.
    Key,
    /// Reading a value, after `=`.
    Value,
    /// Inside `# ...`.
    Comment,
    /// Reading a `[...]` header line.
    Section,
}

/// The token being accumulated.
///
/// `start` moves forward over leading whitespace. `len` counts every byte
/// since `start`, while `len_at_last_space` stops at the last non-blank byte
/// so trailing whitespace is trimmed without a second pass.
#[derive(Debug, Clone, Copy)]
struct Pending {
    start: usize,
    len: usize,
    len_at_last_space: usize,
}

impl Pending {
    fn at(start: usize) -> Self {
        Self {
            start,
            len: 0,
            len_at_last_space: 0,
        }
    }

    /// Account for a blank byte at `pos`.
    #[inline]
    fn blank(&mut self, pos: usize) {
        if pos == self.start && self.len == 0 {
            self.start += 1;
        } else {
            self.len += 1;
        }
    }

    /// Account for a visible byte.
    #[inline]
    fn visible(&mut self) {
        self.len += 1;
        self.len_at_last_space = self.len;
    }

    /// The trimmed token.
    #[inline]
    fn trimmed(&self) -> (usize, usize) {
        (self.start, self.len_at_last_space)
    }
}

/// Produces [`Highlight`]s from configuration text.
///
/// This is the lexical and per-value pass only; cross-field checks live in
/// [`crate::reconcile`].
pub struct Highlighter<'src> {
    /// The source text being highlighted.
    source: &'src [u8],
    /// Highlights emitted so far, in source order.
    highlights: Vec<Highlight>,
}

impl<'src> Highlighter<'src> {
    /// Create a new highlighter for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            highlights: Vec::new(),
        }
    }

    /// Scan the whole document.
    pub fn highlight(mut self) -> Vec<Highlight> {
        let src = self.source;
        let len = src.len();

        let mut state = State::None;
        let mut section = Section::Invalid;
        let mut field = Field::Invalid;
        let mut pending = Pending::at(0);
        let mut equals = 0;

        for i in 0..=len {
            let c = src.get(i).copied();
            let ends_token = match c {
                None | Some(b'\n') => true,
                Some(b'#') => state != State::Comment,
                Some(_) => false,
            };

            if ends_token {
                match state {
                    State::Key => {
                        let (start, len) = pending.trimmed();
                        self.emit(Category::Error, start, len);
                    }
                    State::Value => {
                        if pending.len != 0 {
                            self.emit(Category::Delimiter, equals, 1);
                            let (start, len) = pending.trimmed();
                            self.highlight_value(start, len, field);
                        } else {
                            self.emit(Category::Error, equals, 1);
                        }
                    }
                    State::Section => {
                        let (start, len) = pending.trimmed();
                        section = Section::from_header(&src[start..start + len]);
                        self.emit(
                            Category::validated(section != Section::Invalid, Category::Section),
                            start,
                            len,
                        );
                    }
                    State::Comment => {
                        self.emit(Category::Comment, pending.start, pending.len);
                    }
                    State::None => {}
                }

                let Some(c) = c else { break };
                field = Field::Invalid;
                if c == b'#' {
                    pending = Pending::at(i);
                    pending.len = 1;
                    state = State::Comment;
                } else {
                    pending = Pending::at(i + 1);
                    state = State::None;
                }
                continue;
            }

            // `ends_token` is false only for bytes inside the input.
            let c = src[i];
            if state == State::Comment {
                pending.len += 1;
            } else if is_blank(src, i) {
                pending.blank(i);
            } else if c == b'=' && state == State::Key {
                let (start, len) = pending.trimmed();
                field = Field::from_key(&src[start..start + len]);
                let in_place = field != Field::Invalid && field.section() == section;
                self.emit(Category::validated(in_place, Category::Field), start, len);
                equals = i;
                pending = Pending::at(i + 1);
                state = State::Value;
            } else {
                if state == State::None {
                    state = if c == b'[' { State::Section } else { State::Key };
                }
                pending.visible();
            }
        }

        self.highlights
    }

    /// Push a highlight for `len` bytes at `start`. Empty ranges are dropped.
    fn emit(&mut self, category: Category, start: usize, len: usize) {
        if len == 0 {
            return;
        }
        let span = Span::at(start, len);
        trace!(
            "Highlight {:?} at {:?}: {:?}",
            category,
            span,
            String::from_utf8_lossy(&self.source[start..start + len])
        );
        self.highlights.push(Highlight::new(category, span));
    }

    /// Route a finished value to the predicate for `field`.
    fn highlight_value(&mut self, start: usize, len: usize, field: Field) {
        let src = self.source;
        let value = &src[start..start + len];
        let valid = Category::validated;
        let category = match field {
            Field::PrivateKey => valid(validate::is_valid_key(value), Category::PrivateKey),
            Field::PublicKey => valid(validate::is_valid_key(value), Category::PublicKey),
            Field::PresharedKey => valid(validate::is_valid_key(value), Category::PresharedKey),
            Field::Mtu => valid(validate::is_valid_mtu(value), Category::Mtu),
            Field::Table => valid(validate::is_valid_table(value), Category::Table),
            Field::PreUp | Field::PostUp | Field::PreDown | Field::PostDown => {
                valid(validate::is_valid_command(value), Category::Command)
            }
            Field::ListenPort => valid(validate::is_valid_port(value), Category::Port),
            Field::PersistentKeepalive => {
                valid(validate::is_valid_keepalive(value), Category::KeepAlive)
            }
            Field::Jc => valid(validate::is_valid_uint(value, 0, 65_535), Category::Jc),
            Field::Jmin => valid(validate::is_valid_uint(value, 0, 65_535), Category::Jmin),
            Field::Jmax => valid(validate::is_valid_uint(value, 0, 65_535), Category::Jmax),
            Field::S1 => valid(validate::is_valid_uint(value, 0, 65_535), Category::S1),
            Field::S2 => valid(validate::is_valid_uint(value, 0, 65_535), Category::S2),
            Field::H1 => valid(validate::is_valid_uint(value, 0, MAX_HEADER), Category::H1),
            Field::H2 => valid(validate::is_valid_uint(value, 0, MAX_HEADER), Category::H2),
            Field::H3 => valid(validate::is_valid_uint(value, 0, MAX_HEADER), Category::H3),
            Field::H4 => valid(validate::is_valid_uint(value, 0, MAX_HEADER), Category::H4),
            Field::Endpoint => return self.highlight_endpoint(start, len),
            Field::Address | Field::Dns | Field::AllowedIps => {
                return self.highlight_multivalue(start, len, field);
            }
            Field::Invalid => Category::Error,
        };
        self.emit(category, start, len);
    }

    /// `host`, `:`, `port`, with `[` and `]` around a bracketed host.
    fn highlight_endpoint(&mut self, start: usize, len: usize) {
        let Some(parts) = validate::parse_endpoint(&self.source[start..start + len]) else {
            self.emit(Category::Error, start, len);
            return;
        };
        let host_category = if parts.host_is_ip {
            Category::IpAddress
        } else {
            Category::Hostname
        };
        if parts.bracketed {
            self.emit(Category::Delimiter, start, 1);
        }
        self.emit(host_category, start + parts.host.start, parts.host.len());
        if parts.bracketed {
            self.emit(Category::Delimiter, start + parts.host.end, 1);
        }
        self.emit(Category::Delimiter, start + parts.colon, 1);
        let port = parts.colon + 1;
        self.emit(Category::Port, start + port, len - port);
    }

    /// Split a comma-separated list, trimming blanks around each element.
    fn highlight_multivalue(&mut self, start: usize, len: usize, field: Field) {
        let mut element = Pending::at(start);
        for i in start..start + len {
            match self.source[i] {
                b',' => {
                    let (el_start, el_len) = element.trimmed();
                    self.highlight_multivalue_element(el_start, el_len, field);
                    self.emit(Category::Delimiter, i, 1);
                    element = Pending::at(i + 1);
                }
                b' ' | b'\t' => element.blank(i),
                _ => element.visible(),
            }
        }

        let (el_start, el_len) = element.trimmed();
        if el_len != 0 {
            self.highlight_multivalue_element(el_start, el_len, field);
        } else if let Some(last) = self.highlights.last_mut()
            && last.category == Category::Delimiter
        {
            // Dangling comma.
            last.category = Category::Error;
        }
    }

    fn highlight_multivalue_element(&mut self, start: usize, len: usize, field: Field) {
        let src = self.source;
        let element = &src[start..start + len];
        match field {
            Field::Dns => {
                let category = if validate::is_valid_ipv4(element) || validate::is_valid_ipv6(element) {
                    Category::IpAddress
                } else if validate::is_valid_hostname(element) {
                    Category::Hostname
                } else {
                    Category::Error
                };
                self.emit(category, start, len);
            }
            Field::Address | Field::AllowedIps => {
                if !validate::is_valid_network(element) {
                    self.emit(Category::Error, start, len);
                    return;
                }
                match element.iter().position(|&c| c == b'/') {
                    None => self.emit(Category::IpAddress, start, len),
                    Some(slash) => {
                        self.emit(Category::IpAddress, start, slash);
                        self.emit(Category::Delimiter, start + slash, 1);
                        self.emit(Category::CidrSuffix, start + slash + 1, len - slash - 1);
                    }
                }
            }
            _ => self.emit(Category::Error, start, len),
        }
    }
}

/// Largest accepted `H1`..`H4` value.
pub(crate) const MAX_HEADER: u64 = i32::MAX as u64;

/// Spaces and tabs, plus a carriage return that ends a line.
#[inline]
fn is_blank(src: &[u8], i: usize) -> bool {
    match src[i] {
        b' ' | b'\t' => true,
        b'\r' => matches!(src.get(i + 1), None | Some(b'\n')),
        _ => false,
    }
}
