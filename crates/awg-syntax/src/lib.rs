//! Syntax highlighting and validation for AmneziaWG tunnel configuration files.
//!
//! [`classify`] turns a document into an ordered list of [`Highlight`]s: every
//! section header, key, delimiter, value and comment gets a [`Category`], with
//! [`Category::Error`] standing in for anything malformed. [`reconcile`] then
//! looks at the obfuscation parameters together and flags combinations that
//! are individually valid but inconsistent. [`analyze`] does both.
//!
//! ```
//! use awg_syntax::{Category, analyze};
//!
//! let source = "[Peer]\nEndpoint = vpn.example.com:51820\n";
//! let categories: Vec<_> = analyze(source).iter().map(|h| h.category).collect();
//! assert_eq!(
//!     categories,
//!     [
//!         Category::Section,
//!         Category::Field,
//!         Category::Delimiter,
//!         Category::Hostname,
//!         Category::Delimiter,
//!         Category::Port,
//!     ]
//! );
//! ```

mod span;
pub use span::Span;

mod category;
pub use category::{Category, Highlight};

mod field;
pub use field::{Field, Section};

pub mod validate;

mod highlighter;
pub use highlighter::Highlighter;

mod obfuscation;
pub use obfuscation::{ObfuscationLimits, reconcile, reconcile_with};

mod diagnostic;
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity, diagnose};

/// Highlight `source` without the cross-field obfuscation checks.
///
/// Offsets are `u32`, so `source` must be under 4 GiB.
pub fn classify(source: &str) -> Vec<Highlight> {
    Highlighter::new(source).highlight()
}

/// Highlight `source` and apply the obfuscation checks with default limits.
pub fn analyze(source: &str) -> Vec<Highlight> {
    reconcile(classify(source), source)
}

/// Highlight `source` and apply the obfuscation checks with custom limits.
pub fn analyze_with(source: &str, limits: &ObfuscationLimits) -> Vec<Highlight> {
    reconcile_with(classify(source), source, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    const PRIVATE_KEY: &str = "yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=";
    const PUBLIC_KEY: &str = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";

    fn table(source: &str, highlights: &[Highlight]) -> String {
        highlights
            .iter()
            .map(|h| format!("{:<4}{:<3}{:<12}{}", h.start(), h.len(), h.category, h.text(source)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_full_document() {
        let source = format!(
            "[Interface]\n\
             PrivateKey = {PRIVATE_KEY}\n\
             Address = 10.8.0.2/32, fd00::2/128\n\
             DNS = 1.1.1.1\n\
             Jc = 4\n\
             Jmin = 40\n\
             Jmax = 70\n\
             H1 = 1234567\n\
             \n\
             [Peer] # server\n\
             PublicKey = {PUBLIC_KEY}\n\
             AllowedIPs = 0.0.0.0/0\n\
             Endpoint = [2001:db8::1]:51820\n\
             PersistentKeepalive = 25\n"
        );
        let highlights = analyze(&source);
        assert!(highlights.iter().all(|h| !h.category.is_diagnostic()));
        insta::assert_snapshot!(table(&source, &highlights), @r"
        0   11 section     [Interface]
        12  10 field       PrivateKey
        23  1  delimiter   =
        25  44 private-key yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=
        70  7  field       Address
        78  1  delimiter   =
        80  8  ip          10.8.0.2
        88  1  delimiter   /
        89  2  cidr        32
        91  1  delimiter   ,
        93  7  ip          fd00::2
        100 1  delimiter   /
        101 3  cidr        128
        105 3  field       DNS
        109 1  delimiter   =
        111 7  ip          1.1.1.1
        119 2  field       Jc
        122 1  delimiter   =
        124 1  jc          4
        126 4  field       Jmin
        131 1  delimiter   =
        133 2  jmin        40
        136 4  field       Jmax
        141 1  delimiter   =
        143 2  jmax        70
        146 2  field       H1
        149 1  delimiter   =
        151 7  h1          1234567
        160 6  section     [Peer]
        167 8  comment     # server
        176 9  field       PublicKey
        186 1  delimiter   =
        188 44 public-key  xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=
        233 10 field       AllowedIPs
        244 1  delimiter   =
        246 7  ip          0.0.0.0
        253 1  delimiter   /
        254 1  cidr        0
        256 8  field       Endpoint
        265 1  delimiter   =
        267 1  delimiter   [
        268 11 ip          2001:db8::1
        279 1  delimiter   ]
        280 1  delimiter   :
        281 5  port        51820
        287 19 field       PersistentKeepalive
        307 1  delimiter   =
        309 2  keepalive   25
        ");
    }

    #[test]
    fn test_analyze_flags_inconsistent_obfuscation() {
        let source = "[Interface]\nS1 = 0\nS2 = 56\n";
        let flagged: Vec<_> = analyze(source)
            .into_iter()
            .filter(|h| h.category.is_diagnostic())
            .map(|h| h.text(source))
            .collect();
        assert_eq!(flagged, ["0", "56"]);
        assert!(classify(source).iter().all(|h| !h.category.is_diagnostic()));
    }

    #[test]
    fn test_analyze_with_limits() {
        let source = "[Interface]\nJmin = 10\nJmax = 1450\n";
        assert!(analyze(source).iter().all(|h| h.category != Category::Warning));
        let tight = ObfuscationLimits {
            default_mtu: 1280,
            ..ObfuscationLimits::default()
        };
        assert_eq!(
            analyze_with(source, &tight)
                .iter()
                .filter(|h| h.category == Category::Warning)
                .count(),
            1
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Arbitrary text over the characters the scanner treats specially.
    fn noise() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9 \t\r\n=#\\[\\]:,./%_+-]{0,80}").unwrap()
    }

    fn key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("PrivateKey".to_string()),
            Just("ListenPort".to_string()),
            Just("Address".to_string()),
            Just("DNS".to_string()),
            Just("MTU".to_string()),
            Just("Jc".to_string()),
            Just("Jmin".to_string()),
            Just("Jmax".to_string()),
            Just("S1".to_string()),
            Just("S2".to_string()),
            Just("H1".to_string()),
            Just("H3".to_string()),
            Just("PublicKey".to_string()),
            Just("AllowedIPs".to_string()),
            Just("Endpoint".to_string()),
            Just("PersistentKeepalive".to_string()),
            prop::string::string_regex("[A-Za-z][A-Za-z0-9]{0,8}").unwrap(),
        ]
    }

    fn value() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u32..70_000).prop_map(|n| n.to_string()),
            (any::<[u8; 4]>(), 0u8..40).prop_map(|(ip, cidr)| {
                format!("{}.{}.{}.{}/{cidr}", ip[0], ip[1], ip[2], ip[3])
            }),
            Just("fd00::1, 10.0.0.1/24,".to_string()),
            Just("[fe80::1%eth0]:51820".to_string()),
            Just("vpn.example.com:443".to_string()),
            Just("yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=".to_string()),
            prop::string::string_regex("[a-z0-9 .:,/]{0,20}").unwrap(),
        ]
    }

    fn line() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => (key(), value()).prop_map(|(k, v)| format!("{k} = {v}")),
            1 => prop_oneof![
                Just("[Interface]".to_string()),
                Just("[Peer]".to_string()),
                Just("[Other]".to_string()),
            ],
            1 => prop::string::string_regex("#[a-z =]{0,20}").unwrap(),
            1 => Just(String::new()),
        ]
    }

    /// Something shaped like a real configuration file.
    fn document() -> impl Strategy<Value = String> {
        prop::collection::vec(line(), 0..16).prop_map(|lines| lines.join("\n"))
    }

    fn any_input() -> impl Strategy<Value = String> {
        prop_oneof![noise(), document()]
    }

    fn is_blank(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\n' | b'\r')
    }

    proptest! {
        /// Highlights are sorted, disjoint and inside the source
        #[test]
        fn highlights_are_ordered(input in any_input()) {
            let highlights = analyze(&input);
            let mut end = 0;
            for h in &highlights {
                prop_assert!(!h.is_empty(), "empty highlight {:?} in {:?}", h, input);
                prop_assert!(h.start() >= end, "overlap at {:?} in {:?}", h, input);
                end = h.start() + h.len();
                prop_assert!(end <= input.len());
            }
        }

        /// Every visible byte belongs to exactly one highlight
        #[test]
        fn visible_bytes_are_covered(input in any_input()) {
            let mut covered = vec![0u8; input.len()];
            for h in classify(&input) {
                for slot in &mut covered[h.start()..h.start() + h.len()] {
                    *slot += 1;
                }
            }
            for (i, (&b, &count)) in input.as_bytes().iter().zip(&covered).enumerate() {
                prop_assert!(count <= 1, "byte {} covered {} times in {:?}", i, count, input);
                if !is_blank(b) {
                    prop_assert_eq!(count, 1, "byte {} not covered in {:?}", i, input);
                }
            }
        }

        /// The scanner keeps no state between calls
        #[test]
        fn classify_is_deterministic(input in any_input()) {
            prop_assert_eq!(classify(&input), classify(&input));
        }

        /// The consistency pass only recategorises obfuscation values
        #[test]
        fn reconcile_keeps_spans(input in document()) {
            let before = classify(&input);
            let after = reconcile(before.clone(), &input);
            prop_assert_eq!(before.len(), after.len());
            for (b, a) in before.iter().zip(&after) {
                prop_assert_eq!(b.span, a.span);
                if b.category != a.category {
                    prop_assert!(b.category.is_obfuscation());
                    prop_assert!(a.category.is_diagnostic());
                }
            }
        }

        /// Every flagged highlight gets a diagnostic
        #[test]
        fn diagnostics_match_flags(input in any_input()) {
            let highlights = analyze(&input);
            let flagged = highlights.iter().filter(|h| h.category.is_diagnostic()).count();
            prop_assert_eq!(diagnose(&input, &highlights).len(), flagged);
        }
    }
}
