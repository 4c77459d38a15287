//! Cross-field checks for the obfuscation parameters.
//!
//! These run after [`crate::classify`] and only rewrite categories. Offsets and
//! lengths are never touched and no highlight is added or removed.

use crate::validate::parse_uint;
use crate::{Category, Highlight};
use tracing::debug;

/// Protocol constants the consistency rules are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObfuscationLimits {
    /// MTU assumed when the document has no `MTU` line.
    pub default_mtu: i64,
    /// Largest packet the rules allow regardless of MTU.
    pub max_mtu: i64,
    /// How far above the MTU a junk or padded packet may go.
    pub mtu_slack: i64,
    /// Size of a handshake initiation message before `S1` padding.
    pub initiation_size: i64,
    /// Size of a handshake response message before `S2` padding.
    pub response_size: i64,
}

impl Default for ObfuscationLimits {
    fn default() -> Self {
        Self {
            default_mtu: 1420,
            max_mtu: 1500,
            mtu_slack: 80,
            initiation_size: 148,
            response_size: 92,
        }
    }
}

/// `Jc` values above this are flagged.
const MAX_JUNK_COUNT: i64 = 128;

/// Header ids up to this value are the protocol defaults.
const RESERVED_HEADER: i64 = 4;

/// Numeric values re-read from the highlighted text.
#[derive(Debug, Default, Clone, Copy)]
struct Params {
    mtu: i64,
    jc: i64,
    jmin: i64,
    jmax: i64,
    s1: i64,
    s2: i64,
    h: [i64; 4],
}

impl Params {
    /// Collect every parameter. `None` if the document already has an error.
    fn collect(highlights: &[Highlight], source: &[u8], limits: &ObfuscationLimits) -> Option<Self> {
        let mut params = Params::default();
        for highlight in highlights {
            let slot = match highlight.category {
                Category::Error => return None,
                Category::Mtu => &mut params.mtu,
                Category::Jc => &mut params.jc,
                Category::Jmin => &mut params.jmin,
                Category::Jmax => &mut params.jmax,
                Category::S1 => &mut params.s1,
                Category::S2 => &mut params.s2,
                Category::H1 => &mut params.h[0],
                Category::H2 => &mut params.h[1],
                Category::H3 => &mut params.h[2],
                Category::H4 => &mut params.h[3],
                _ => continue,
            };
            let value = parse_uint(highlight.span.bytes(source), false)?;
            *slot = i64::try_from(value).ok()?;
        }

        if params.mtu == 0 {
            params.mtu = limits.default_mtu;
        }
        for (ordinal, h) in (1..).zip(params.h.iter_mut()) {
            if *h <= RESERVED_HEADER {
                *h = ordinal;
            }
        }
        Some(params)
    }

    fn junk_enabled(&self) -> bool {
        self.jc != 0 || self.jmin != 0 || self.jmax != 0
    }

    fn sizes_collide(&self, limits: &ObfuscationLimits) -> bool {
        self.s1 + limits.initiation_size == self.s2 + limits.response_size
    }

    /// Whether header `index` repeats another header's non-default id.
    fn header_collides(&self, index: usize) -> bool {
        let h = self.h[index];
        h > RESERVED_HEADER
            && self
                .h
                .iter()
                .enumerate()
                .any(|(other, &value)| other != index && value == h)
    }

    /// The category `category` should carry under these parameters.
    fn escalate(&self, category: Category, limits: &ObfuscationLimits) -> Category {
        let ceiling = self.mtu + limits.mtu_slack;
        let flagged = match category {
            Category::Jc => {
                return if self.jc > MAX_JUNK_COUNT {
                    Category::Warning
                } else {
                    category
                };
            }
            Category::Jmin => {
                self.junk_enabled()
                    && (self.jmin >= self.jmax
                        || self.jmin >= ceiling
                        || self.jmin >= limits.max_mtu)
            }
            Category::Jmax => {
                self.junk_enabled()
                    && (self.jmax <= self.jmin
                        || self.jmax > ceiling
                        || self.jmax > limits.max_mtu)
            }
            Category::S1 | Category::S2 => {
                if self.sizes_collide(limits) {
                    return Category::Error;
                }
                let (padding, header) = if category == Category::S1 {
                    (self.s1, limits.initiation_size)
                } else {
                    (self.s2, limits.response_size)
                };
                padding > ceiling - header || padding > limits.max_mtu - header
            }
            Category::H1 | Category::H2 | Category::H3 | Category::H4 => {
                let index = match category {
                    Category::H1 => 0,
                    Category::H2 => 1,
                    Category::H3 => 2,
                    _ => 3,
                };
                return if self.header_collides(index) {
                    Category::Error
                } else {
                    category
                };
            }
            _ => return category,
        };
        if flagged { Category::Warning } else { category }
    }
}

/// Apply the consistency rules with the default protocol limits.
pub fn reconcile(highlights: Vec<Highlight>, source: &str) -> Vec<Highlight> {
    reconcile_with(highlights, source, &ObfuscationLimits::default())
}

/// Apply the consistency rules.
///
/// Returns `highlights` unchanged if any of them is already an error, since
/// cross-field checks over invalid values say nothing useful.
pub fn reconcile_with(
    mut highlights: Vec<Highlight>,
    source: &str,
    limits: &ObfuscationLimits,
) -> Vec<Highlight> {
    let Some(params) = Params::collect(&highlights, source.as_bytes(), limits) else {
        debug!("Skipping obfuscation checks on a document with errors");
        return highlights;
    };

    for highlight in highlights.iter_mut().filter(|h| h.category.is_obfuscation()) {
        let category = params.escalate(highlight.category, limits);
        if category != highlight.category {
            debug!(
                "Escalating {:?} at {:?} to {:?}",
                highlight.category, highlight.span, category
            );
            highlight.category = category;
        }
    }
    highlights
}
