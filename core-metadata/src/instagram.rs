//! Instagram post helpers
//!
//! URL validation, embed markup and the mapping from provider responses to
//! [`ImageMetadata`].

use core_library::models::ImageMetadata;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

pub const PROVIDER: &str = "instagram";
pub const LICENSE_TYPE: &str = "instagram";
pub const LICENSE_URL: &str = "https://help.instagram.com/581066165581870";
pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const EMBED_SCRIPT: &str = r#"<script async src="//www.instagram.com/embed.js"></script>"#;

static POST_URL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)?instagram\.com/p/[A-Za-z0-9_-]+/?$").ok());

static WELL_FORMED_URL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^https?://[^/?#\s]+").ok());

static META_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").ok());

static ATTRIBUTE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).ok()
});

/// Whether `url` is an Instagram post permalink.
///
/// ```
/// use core_metadata::instagram::is_valid_instagram_url;
///
/// assert!(is_valid_instagram_url("https://www.instagram.com/p/CxYz_12-a/"));
/// assert!(!is_valid_instagram_url("https://www.instagram.com/reel/abc/"));
/// ```
pub fn is_valid_instagram_url(url: &str) -> bool {
    POST_URL.as_ref().is_some_and(|re| re.is_match(url))
}

/// Whether `url` is an absolute `http`/`https` URL with a host. Anything
/// passing this can go through the fetch chain.
pub fn is_well_formed_url(url: &str) -> bool {
    WELL_FORMED_URL.as_ref().is_some_and(|re| re.is_match(url))
}

/// Script tag that renders Instagram embed blockquotes.
pub fn embed_script() -> &'static str {
    EMBED_SCRIPT
}

/// Standard embed markup for a post.
pub fn embed_blockquote(url: &str) -> String {
    format!(
        r#"<blockquote class="instagram-media" data-instgrm-permalink="{}" data-instgrm-version="14"></blockquote>"#,
        url
    )
}

pub fn attribution(author: &str) -> String {
    format!("Photo by {} on Instagram", author)
}

/// oEmbed endpoint response. Every field is optional in practice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OEmbedResponse {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Fields read from a post page's meta tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub author_name: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn record(url: &str) -> ImageMetadata {
    ImageMetadata {
        source_provider: PROVIDER.to_string(),
        original_url: url.to_string(),
        embed_html: embed_blockquote(url),
        license_type: LICENSE_TYPE.to_string(),
        license_url: LICENSE_URL.to_string(),
        commercial_allowed: true,
        attribution_text: attribution(UNKNOWN_AUTHOR),
        provider_attribution_required: true,
        author_name: UNKNOWN_AUTHOR.to_string(),
        author_url: String::new(),
        image_url: String::new(),
        thumbnail_url: String::new(),
        title: String::new(),
        description: String::new(),
    }
}

/// Metadata built from an oEmbed response alone.
pub fn from_oembed(url: &str, oembed: OEmbedResponse) -> ImageMetadata {
    let author = non_empty(oembed.author_name).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let title = non_empty(oembed.title).unwrap_or_default();
    let thumbnail = non_empty(oembed.thumbnail_url).unwrap_or_default();

    ImageMetadata {
        embed_html: non_empty(oembed.html).unwrap_or_else(|| embed_blockquote(url)),
        attribution_text: attribution(&author),
        author_name: author,
        author_url: non_empty(oembed.author_url).unwrap_or_default(),
        image_url: thumbnail.clone(),
        thumbnail_url: thumbnail,
        description: title.clone(),
        title,
        ..record(url)
    }
}

/// Metadata from page meta tags, enriched by an oEmbed response when one
/// was obtained. oEmbed values win where present.
pub fn from_page(url: &str, page: PageMeta, oembed: Option<OEmbedResponse>) -> ImageMetadata {
    let oembed = oembed.unwrap_or_default();
    let author = non_empty(oembed.author_name).unwrap_or(page.author_name);
    let image = non_empty(oembed.thumbnail_url).unwrap_or(page.image_url);
    let oembed_title = non_empty(oembed.title);

    ImageMetadata {
        embed_html: non_empty(oembed.html).unwrap_or_else(|| embed_blockquote(url)),
        attribution_text: attribution(&author),
        author_name: author,
        author_url: non_empty(oembed.author_url).unwrap_or_default(),
        image_url: image.clone(),
        thumbnail_url: image,
        title: oembed_title.clone().unwrap_or(page.title),
        description: oembed_title.unwrap_or(page.description),
        ..record(url)
    }
}

/// Record returned when every strategy failed.
pub fn default_metadata(url: &str) -> ImageMetadata {
    ImageMetadata {
        title: "Instagram Post".to_string(),
        description: "Instagram post".to_string(),
        ..record(url)
    }
}

/// Extract the post fields from raw page HTML.
pub fn parse_page_meta(html: &str) -> PageMeta {
    let tags = meta_tags(html);
    let lookup = |key: &str| tags.get(key).filter(|v| !v.is_empty()).cloned();

    PageMeta {
        title: lookup("og:title")
            .or_else(|| lookup("description"))
            .unwrap_or_default(),
        description: lookup("og:description").unwrap_or_default(),
        image_url: lookup("og:image").unwrap_or_default(),
        author_name: lookup("article:author")
            .or_else(|| lookup("author"))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
    }
}

/// `property`/`name` → `content` for every meta tag. The first tag wins.
fn meta_tags(html: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    let (Some(meta_tag), Some(attribute)) = (META_TAG.as_ref(), ATTRIBUTE.as_ref()) else {
        return tags;
    };

    for tag in meta_tag.find_iter(html) {
        let mut key = None;
        let mut content = None;

        for caps in attribute.captures_iter(tag.as_str()) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            match caps[1].to_ascii_lowercase().as_str() {
                "property" | "name" if key.is_none() => key = Some(value.to_ascii_lowercase()),
                "content" => content = Some(value),
                _ => {}
            }
        }

        if let (Some(key), Some(content)) = (key, content) {
            tags.entry(key).or_insert(content);
        }
    }

    tags
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
