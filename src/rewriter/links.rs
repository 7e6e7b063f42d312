//! Pure string rewriting over HTML and CSS markup.
//!
//! Rewriting is deliberately pattern-based rather than DOM-based: the rules
//! below mirror the reference markup the snapshot pipeline was written
//! against, and anything that does not match a rule passes through unchanged.
//! Keeping the transforms behind this module means a tree-based rewriter can
//! be swapped in later without touching the export pipeline.

use regex::{NoExpand, Regex, RegexBuilder};
use std::sync::OnceLock;

/// Web root prefix used when matching the bundled JS reference. The bundler
/// reports its JS path relative to the deployment root, while the page links
/// it relative to the web root; joining this prefix with the linked URL must
/// reproduce the bundler path for the reference to be recognized. This
/// convention comes from the deployment layout the pipeline snapshots and is
/// not derived from anything else in the configuration.
const LOCAL_WEB_ROOT: &str = "www";

/// Literal marker removed from exported pages so relative links resolve
/// against the snapshot directory instead of the server root.
const BASE_HREF_MARKER: &str = "<base href=\"/\">";

fn css_url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r#"url\s*\(\s*['"]?([^)\s'"]+)['"]?\s*\)"#)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}

fn link_href_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r#"<\s*link[^>]*?href\s*=\s*["']?(?P<url>[^"'\s>]*)"#)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}

fn script_src_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r#"<\s*script[^>]*?src\s*=\s*["']?(?P<url>[^"'\s>]*)"#)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}

fn img_src_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(r#"<\s*img[^>]*?src\s*=\s*["']?(?P<url>[^"'\s>]*)"#)
            .case_insensitive(true)
            .build()
            .unwrap()
    })
}

/// Rewrite every `url(...)` reference in a stylesheet so it resolves relative
/// to the new asset root: one leading `../` segment and any leading `/` are
/// stripped, and the reference is normalized to double quotes.
///
/// References that do not match the expected pattern (embedded whitespace,
/// unbalanced quotes) are left untouched. Applying the function to an already
/// rewritten stylesheet is a no-op.
pub fn rewrite_css_urls(css: &str) -> String {
    css_url_pattern()
        .replace_all(css, |caps: &regex::Captures<'_>| {
            let raw = &caps[1];
            let stripped = raw.strip_prefix("../").unwrap_or(raw);
            format!("url(\"{}\")", stripped.trim_start_matches('/'))
        })
        .into_owned()
}

/// Replace the page's reference to the bundled stylesheet with `style.css`.
///
/// Scans `<link ... href=...>` occurrences in order; the first one whose URL
/// exactly equals `original_css_href` is replaced, and scanning stops. Pages
/// without a matching reference pass through unchanged.
pub fn rewrite_bundled_css_link(html: &str, original_css_href: &str) -> String {
    for caps in link_href_pattern().captures_iter(html) {
        let url = &caps["url"];
        if url == original_css_href {
            return html.replacen(url, "style.css", 1);
        }
    }
    html.to_string()
}

/// Replace the page's reference to the bundled script with `index.js`.
///
/// Scans `<script ... src=...>` occurrences in order; a reference is treated
/// as the bundled script when the local web root prefix joined with its URL
/// equals the bundler's reported JS path. Only the first match is replaced.
pub fn rewrite_bundled_js_link(html: &str, original_js_path: &str) -> String {
    for caps in script_src_pattern().captures_iter(html) {
        let url = &caps["url"];
        if format!("{}{}", LOCAL_WEB_ROOT, url) == original_js_path {
            return html.replacen(url, "index.js", 1);
        }
    }
    html.to_string()
}

/// Rewrite every `<img src=...>` URL to an absolute filesystem-relative path:
/// the matched URL is replaced (case-insensitively, as a literal substring)
/// with `public_path_prefix` joined to the URL minus its leading slash.
pub fn rewrite_image_srcs(html: &str, public_path_prefix: &str) -> String {
    let mut urls: Vec<String> = Vec::new();
    for caps in img_src_pattern().captures_iter(html) {
        let url = caps["url"].to_string();
        if !url.is_empty() && !urls.contains(&url) {
            urls.push(url);
        }
    }

    let mut result = html.to_string();
    for url in urls {
        let replacement = format!("{}{}", public_path_prefix, url.trim_start_matches('/'));
        let literal = RegexBuilder::new(&regex::escape(&url))
            .case_insensitive(true)
            .build()
            .unwrap();
        result = literal
            .replace_all(&result, NoExpand(&replacement))
            .into_owned();
    }
    result
}

/// Remove the literal `<base href="/">` marker, if present. Exactly one
/// occurrence is removed; everything else is byte-identical.
pub fn strip_base_href(html: &str) -> String {
    html.replacen(BASE_HREF_MARKER, "", 1)
}

/// Apply all page-level rewrites in their fixed order: bundled CSS link,
/// bundled JS link, image sources, base-href marker. Rules without input
/// (no bundle of that type) are skipped; rules without a match are no-ops.
pub fn rewrite_page(
    html: &str,
    css_href: Option<&str>,
    js_path: Option<&str>,
    public_path_prefix: &str,
) -> String {
    let mut page = html.to_string();
    if let Some(css_href) = css_href {
        page = rewrite_bundled_css_link(&page, css_href);
    }
    if let Some(js_path) = js_path {
        page = rewrite_bundled_js_link(&page, js_path);
    }
    page = rewrite_image_srcs(&page, public_path_prefix);
    strip_base_href(&page)
}
