//! Registry of section headers and keys.

/// A configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `[Interface]`
    Interface,
    /// `[Peer]`
    Peer,
    /// No header seen yet, or an unrecognised one.
    Invalid,
}

impl Section {
    /// Look up a complete header line, brackets included.
    pub fn from_header(text: &[u8]) -> Section {
        if eq_ignore_ascii_case(text, b"[Peer]") {
            Section::Peer
        } else if eq_ignore_ascii_case(text, b"[Interface]") {
            Section::Interface
        } else {
            Section::Invalid
        }
    }

    /// The canonical header text.
    pub fn header(self) -> &'static str {
        match self {
            Section::Interface => "[Interface]",
            Section::Peer => "[Peer]",
            Section::Invalid => "",
        }
    }
}

/// A recognised configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // [Interface]
    PrivateKey,
    ListenPort,
    Address,
    Dns,
    Mtu,
    Table,
    PreUp,
    PostUp,
    PreDown,
    PostDown,
    Jc,
    Jmin,
    Jmax,
    S1,
    S2,
    H1,
    H2,
    H3,
    H4,

    // [Peer]
    PublicKey,
    PresharedKey,
    AllowedIps,
    Endpoint,
    PersistentKeepalive,

    /// Anything else.
    Invalid,
}

/// Canonical spelling of every recognised key.
const FIELDS: [(&str, Field); 24] = [
    ("PrivateKey", Field::PrivateKey),
    ("ListenPort", Field::ListenPort),
    ("Address", Field::Address),
    ("DNS", Field::Dns),
    ("MTU", Field::Mtu),
    ("Table", Field::Table),
    ("PreUp", Field::PreUp),
    ("PostUp", Field::PostUp),
    ("PreDown", Field::PreDown),
    ("PostDown", Field::PostDown),
    ("Jc", Field::Jc),
    ("Jmin", Field::Jmin),
    ("Jmax", Field::Jmax),
    ("S1", Field::S1),
    ("S2", Field::S2),
    ("H1", Field::H1),
    ("H2", Field::H2),
    ("H3", Field::H3),
    ("H4", Field::H4),
    ("PublicKey", Field::PublicKey),
    ("PresharedKey", Field::PresharedKey),
    ("AllowedIPs", Field::AllowedIps),
    ("Endpoint", Field::Endpoint),
    ("PersistentKeepalive", Field::PersistentKeepalive),
];

impl Field {
    /// Look up a key. Exact length, ASCII case-insensitive.
    pub fn from_key(text: &[u8]) -> Field {
        FIELDS
            .iter()
            .find(|(name, _)| eq_ignore_ascii_case(text, name.as_bytes()))
            .map_or(Field::Invalid, |&(_, field)| field)
    }

    /// The section this key may appear in.
    pub fn section(self) -> Section {
        match self {
            Field::PrivateKey
            | Field::ListenPort
            | Field::Address
            | Field::Dns
            | Field::Mtu
            | Field::Table
            | Field::PreUp
            | Field::PostUp
            | Field::PreDown
            | Field::PostDown
            | Field::Jc
            | Field::Jmin
            | Field::Jmax
            | Field::S1
            | Field::S2
            | Field::H1
            | Field::H2
            | Field::H3
            | Field::H4 => Section::Interface,
            Field::PublicKey
            | Field::PresharedKey
            | Field::AllowedIps
            | Field::Endpoint
            | Field::PersistentKeepalive => Section::Peer,
            Field::Invalid => Section::Invalid,
        }
    }

    /// The canonical spelling of this key.
    pub fn name(self) -> &'static str {
        FIELDS
            .iter()
            .find(|&&(_, field)| field == self)
            .map_or("", |&(name, _)| name)
    }
}

/// Fold `a-z` onto `A-Z` by clearing bit 5. Every other byte is left alone.
#[inline]
fn fold(b: u8) -> u8 {
    if b.wrapping_sub(b'a') < 26 { b & 0x5f } else { b }
}

fn eq_ignore_ascii_case(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| fold(x) == fold(y))
}
