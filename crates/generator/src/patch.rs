//! Per-locale metadata patching of a built entry document.
//!
//! The template text is rewritten with a fixed sequence of first-match
//! substitutions. Fields the template does not carry are left alone, so a
//! sparse template patches cleanly instead of failing.

use regex::{Captures, Regex};
use snapshot_kit_core::LocaleBundle;
use std::sync::OnceLock;

use crate::escape::{html_escape, json_string};

/// Id of the script element carrying the initial locale for the client
/// bootstrap. Its content is a JSON string, e.g. `"fr"`.
pub const LOCALE_MARKER_ID: &str = "initial-locale";

/// A metadata slot in the entry document, in patch order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Lang,
    Title,
    Description,
    Canonical,
    OgTitle,
    OgDescription,
    OgUrl,
    OgLocale,
    TwitterTitle,
    TwitterDescription,
    TwitterUrl,
    StructuredDescription,
}

impl MetadataField {
    pub const ALL: [MetadataField; 12] = [
        MetadataField::Lang,
        MetadataField::Title,
        MetadataField::Description,
        MetadataField::Canonical,
        MetadataField::OgTitle,
        MetadataField::OgDescription,
        MetadataField::OgUrl,
        MetadataField::OgLocale,
        MetadataField::TwitterTitle,
        MetadataField::TwitterDescription,
        MetadataField::TwitterUrl,
        MetadataField::StructuredDescription,
    ];

    /// Human-readable name used in reports
    pub fn label(self) -> &'static str {
        match self {
            MetadataField::Lang => "<html lang>",
            MetadataField::Title => "<title>",
            MetadataField::Description => "meta description",
            MetadataField::Canonical => "canonical link",
            MetadataField::OgTitle => "og:title",
            MetadataField::OgDescription => "og:description",
            MetadataField::OgUrl => "og:url",
            MetadataField::OgLocale => "og:locale",
            MetadataField::TwitterTitle => "twitter:title",
            MetadataField::TwitterDescription => "twitter:description",
            MetadataField::TwitterUrl => "twitter:url",
            MetadataField::StructuredDescription => "structured data description",
        }
    }

    // Group 1 is the text kept before the value, group 2 the text kept after.
    fn source(self) -> &'static str {
        match self {
            MetadataField::Lang => r#"(<html\b[^>]*?\slang=")[^"]*(")"#,
            MetadataField::Title => r"(<title>).*?(</title>)",
            MetadataField::Description => r#"(<meta name="description" content=")[^"]*(")"#,
            MetadataField::Canonical => r#"(<link rel="canonical" href=")[^"]*(")"#,
            MetadataField::OgTitle => r#"(<meta property="og:title" content=")[^"]*(")"#,
            MetadataField::OgDescription => {
                r#"(<meta property="og:description" content=")[^"]*(")"#
            }
            MetadataField::OgUrl => r#"(<meta property="og:url" content=")[^"]*(")"#,
            MetadataField::OgLocale => r#"(<meta property="og:locale" content=")[^"]*(")"#,
            MetadataField::TwitterTitle => r#"(<meta name="twitter:title" content=")[^"]*(")"#,
            MetadataField::TwitterDescription => {
                r#"(<meta name="twitter:description" content=")[^"]*(")"#
            }
            MetadataField::TwitterUrl => r#"(<meta name="twitter:url" content=")[^"]*(")"#,
            MetadataField::StructuredDescription => {
                r#"(?s)(<script[^>]*type="application/ld\+json"[^>]*>)(.*?</script>)"#
            }
        }
    }

    fn pattern(self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            MetadataField::ALL
                .iter()
                .map(|field| Regex::new(field.source()).unwrap())
                .collect()
        });
        &patterns[self as usize]
    }

    /// Whether the template carries this field at all
    pub fn present_in(self, template: &str) -> bool {
        match self {
            MetadataField::StructuredDescription => self
                .pattern()
                .captures(template)
                .is_some_and(|caps| structured_description_pattern().is_match(&caps[2])),
            _ => self.pattern().is_match(template),
        }
    }

    /// Escaped replacement value for this field
    fn value(self, locale: &str, bundle: &LocaleBundle) -> String {
        match self {
            MetadataField::Lang => html_escape(locale),
            MetadataField::Title => html_escape(&bundle.title),
            MetadataField::Description => html_escape(&bundle.description),
            MetadataField::Canonical => html_escape(&bundle.canonical),
            MetadataField::OgTitle | MetadataField::TwitterTitle => html_escape(&bundle.og_title),
            MetadataField::OgDescription | MetadataField::TwitterDescription => {
                html_escape(&bundle.og_description)
            }
            MetadataField::OgUrl | MetadataField::TwitterUrl => html_escape(bundle.social_url()),
            MetadataField::OgLocale => html_escape(&bundle.og_locale),
            MetadataField::StructuredDescription => json_string(&bundle.structured_description),
        }
    }

    fn apply(self, html: &str, locale: &str, bundle: &LocaleBundle) -> String {
        let value = self.value(locale, bundle);

        if self == MetadataField::StructuredDescription {
            return self
                .pattern()
                .replacen(html, 1, |caps: &Captures| {
                    let body = structured_description_pattern().replacen(
                        &caps[2],
                        1,
                        |inner: &Captures| format!("{}{}", &inner[1], value),
                    );
                    format!("{}{}", &caps[1], body)
                })
                .into_owned();
        }

        self.pattern()
            .replacen(html, 1, |caps: &Captures| {
                format!("{}{}{}", &caps[1], value, &caps[2])
            })
            .into_owned()
    }
}

fn structured_description_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"("description"\s*:\s*)"(?:[^"\\]|\\.)*""#).unwrap())
}

fn locale_marker_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r#"<script id="{}"[^>]*>[^<]*</script>"#,
            regex::escape(LOCALE_MARKER_ID)
        ))
        .unwrap()
    })
}

/// Script element declaring the initial locale
pub fn locale_marker(locale: &str) -> String {
    format!(
        r#"<script id="{}" type="application/json">{}</script>"#,
        LOCALE_MARKER_ID,
        json_string(locale)
    )
}

/// Produce the entry document for one locale from the built template.
///
/// Every field in [`MetadataField::ALL`] is rewritten at its first match, then
/// the initial-locale marker is placed before `</head>`. An existing marker is
/// replaced instead, so patching a patched document gives the same text.
pub fn patch_template(template: &str, locale: &str, bundle: &LocaleBundle) -> String {
    let mut html = template.to_string();
    for field in MetadataField::ALL {
        html = field.apply(&html, locale, bundle);
    }

    let marker = locale_marker(locale);
    if locale_marker_pattern().is_match(&html) {
        locale_marker_pattern()
            .replacen(&html, 1, |_: &Captures| marker.clone())
            .into_owned()
    } else {
        html.replacen("</head>", &format!("{}\n  </head>", marker), 1)
    }
}
