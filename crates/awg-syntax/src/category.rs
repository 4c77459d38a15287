//! Highlight categories for configuration text.

use crate::Span;

/// The role of a highlighted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum Category {
    // Lexical roles
    /// `[Interface]` or `[Peer]`
    Section,
    /// A recognised key in its own section: `PrivateKey`, `Endpoint`
    Field,
    /// `=`, `,`, `/`, the endpoint `:` and endpoint brackets
    Delimiter,
    /// `# ...` up to end of line
    Comment,

    // Value roles
    /// Value of `PrivateKey`
    PrivateKey,
    /// Value of `PublicKey`
    PublicKey,
    /// Value of `PresharedKey`
    PresharedKey,
    /// IPv4 or IPv6 address
    IpAddress,
    /// Prefix length after `/`
    CidrSuffix,
    /// DNS name
    Hostname,
    /// UDP port
    Port,
    /// Value of `MTU`
    Mtu,
    /// Value of `Table`
    Table,
    /// Value of `PersistentKeepalive`
    KeepAlive,
    /// Value of `PreUp`, `PostUp`, `PreDown` or `PostDown`
    Command,
    /// Junk packet count
    Jc,
    /// Junk packet minimum size
    Jmin,
    /// Junk packet maximum size
    Jmax,
    /// Init message padding
    S1,
    /// Response message padding
    S2,
    /// Init message header id
    H1,
    /// Response message header id
    H2,
    /// Cookie message header id
    H3,
    /// Transport message header id
    H4,

    // Diagnostic roles
    /// Valid on its own, but likely to misbehave at runtime
    Warning,
    /// Malformed or inconsistent
    Error,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 26] = [
        Category::Section,
        Category::Field,
        Category::Delimiter,
        Category::Comment,
        Category::PrivateKey,
        Category::PublicKey,
        Category::PresharedKey,
        Category::IpAddress,
        Category::CidrSuffix,
        Category::Hostname,
        Category::Port,
        Category::Mtu,
        Category::Table,
        Category::KeepAlive,
        Category::Command,
        Category::Jc,
        Category::Jmin,
        Category::Jmax,
        Category::S1,
        Category::S2,
        Category::H1,
        Category::H2,
        Category::H3,
        Category::H4,
        Category::Warning,
        Category::Error,
    ];

    /// `category` when `valid`, [`Category::Error`] otherwise.
    #[inline]
    pub fn validated(valid: bool, category: Category) -> Category {
        if valid { category } else { Category::Error }
    }

    /// Whether this is [`Category::Warning`] or [`Category::Error`].
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Category::Warning | Category::Error)
    }

    /// Whether the consistency pass reads (and may rewrite) this category.
    pub fn is_obfuscation(&self) -> bool {
        matches!(
            self,
            Category::Jc
                | Category::Jmin
                | Category::Jmax
                | Category::S1
                | Category::S2
                | Category::H1
                | Category::H2
                | Category::H3
                | Category::H4
        )
    }

    /// Stable lowercase name, used by the CLI and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Section => "section",
            Category::Field => "field",
            Category::Delimiter => "delimiter",
            Category::Comment => "comment",
            Category::PrivateKey => "private-key",
            Category::PublicKey => "public-key",
            Category::PresharedKey => "preshared-key",
            Category::IpAddress => "ip",
            Category::CidrSuffix => "cidr",
            Category::Hostname => "host",
            Category::Port => "port",
            Category::Mtu => "mtu",
            Category::Table => "table",
            Category::KeepAlive => "keepalive",
            Category::Command => "command",
            Category::Jc => "jc",
            Category::Jmin => "jmin",
            Category::Jmax => "jmax",
            Category::S1 => "s1",
            Category::S2 => "s2",
            Category::H1 => "h1",
            Category::H2 => "h2",
            Category::H3 => "h3",
            Category::H4 => "h4",
            Category::Warning => "warning",
            Category::Error => "error",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A classified, non-empty byte range of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Highlight {
    /// What the range is.
    pub category: Category,
    /// Where it is.
    pub span: Span,
}

impl Highlight {
    /// Create a new highlight.
    pub fn new(category: Category, span: Span) -> Self {
        Self { category, span }
    }

    /// Byte offset of the first byte.
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start as usize
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.span.len() as usize
    }

    /// Always false: empty ranges are never emitted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// The source text this highlight covers.
    #[inline]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }
}
