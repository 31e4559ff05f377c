//! Representative-image extraction.
//!
//! Runs once, when a board entry is created. The first image attachment
//! wins; otherwise the first inline image link in the text. Anything that
//! does not parse as a URL is skipped without error.

use crate::models::ContentItem;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Accepted image extensions, lower case.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

fn inline_image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)https?://[^\s<>,]+\.(?:png|jpe?g|gif|webp)\b")
            .expect("inline image pattern is valid")
    })
}

/// True if the URL path ends in an allowlisted image extension.
pub fn has_image_extension(url: &Url) -> bool {
    let file = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

fn parse_image_url(candidate: &str) -> Option<String> {
    let url = Url::parse(candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    has_image_extension(&url).then(|| url.to_string())
}

/// Derive the image shown on the board post, if any.
pub fn extract_image(item: &ContentItem) -> Option<String> {
    item.attachments
        .iter()
        .find_map(|attachment| parse_image_url(&attachment.url))
        .or_else(|| {
            inline_image_pattern()
                .find_iter(&item.text)
                .find_map(|m| parse_image_url(m.as_str()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attachment;

    fn item(text: &str) -> ContentItem {
        ContentItem::new("m1", "c1", "u1", text, 0)
    }

    #[test]
    fn first_image_attachment_wins() {
        let it = item("see https://example.com/inline.png")
            .with_attachment(Attachment::new("https://cdn.example.com/a/report.pdf"))
            .with_attachment(Attachment::new("https://cdn.example.com/a/cat.JPG"))
            .with_attachment(Attachment::new("https://cdn.example.com/a/dog.png"));
        assert_eq!(
            extract_image(&it).as_deref(),
            Some("https://cdn.example.com/a/cat.JPG")
        );
    }

    #[test]
    fn attachment_query_string_is_ignored_for_extension() {
        let it = item("").with_attachment(Attachment::new(
            "https://cdn.example.com/a/cat.webp?width=400",
        ));
        assert!(extract_image(&it).is_some());
    }

    #[test]
    fn falls_back_to_inline_link() {
        let it = item("look (https://i.example.org/pics/sunset.jpeg) wow")
            .with_attachment(Attachment::new("https://cdn.example.com/notes.txt"));
        assert_eq!(
            extract_image(&it).as_deref(),
            Some("https://i.example.org/pics/sunset.jpeg")
        );
    }

    #[test]
    fn first_inline_match_wins() {
        let it = item("https://a.example/1.gif and https://b.example/2.png");
        assert_eq!(extract_image(&it).as_deref(), Some("https://a.example/1.gif"));
    }

    #[test]
    fn comma_separated_links_stay_separate() {
        let it = item("https://a.example/1.png,https://b.example/2.png");
        assert_eq!(extract_image(&it).as_deref(), Some("https://a.example/1.png"));

        let it = item("https://a.example/page,https://b.example/2.png");
        assert_eq!(extract_image(&it).as_deref(), Some("https://b.example/2.png"));
    }

    #[test]
    fn malformed_candidates_are_skipped() {
        let it = item("broken http://exa mple.com/x.png then https://ok.example/y.png")
            .with_attachment(Attachment::new("not a url.png"));
        assert_eq!(extract_image(&it).as_deref(), Some("https://ok.example/y.png"));
    }

    #[test]
    fn nothing_to_extract() {
        assert_eq!(extract_image(&item("")), None);
        assert_eq!(extract_image(&item("just words, https://example.com/page")), None);
        assert_eq!(extract_image(&item("https://example.com/x.pngs")), None);
    }

    #[test]
    fn non_http_schemes_rejected() {
        let it = item("").with_attachment(Attachment::new("file:///tmp/cat.png"));
        assert_eq!(extract_image(&it), None);
    }

    #[test]
    fn extension_check_uses_last_path_segment() {
        let url = Url::parse("https://example.com/images.png/readme").unwrap();
        assert!(!has_image_extension(&url));
        let url = Url::parse("https://example.com/.png").unwrap();
        assert!(!has_image_extension(&url));
    }
}
