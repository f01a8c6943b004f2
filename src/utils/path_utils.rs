//! Output-tree path helpers
//!
//! Every file the run writes is placed under
//! `<root>/<category>/<topic_slug>/...`; these helpers are the only place
//! that layout is spelled out.

use std::path::{Path, PathBuf};

use super::constants::{DEFAULT_IMAGE_EXTENSION, KNOWN_IMAGE_EXTENSIONS};

/// Filesystem-safe directory name for a topic.
///
/// Spaces become underscores first so that "dark academia" maps to
/// `dark_academia`, then anything the platform's filesystem rejects is
/// stripped by `sanitize_filename`.
#[must_use]
pub fn topic_slug(topic: &str) -> String {
    let underscored = topic.trim().replace(' ', "_");
    let slug = sanitize_filename::sanitize_with_options(
        &underscored,
        sanitize_filename::Options {
            windows: true,
            truncate: true,
            replacement: "_",
        },
    );
    if slug.is_empty() {
        "topic".to_string()
    } else {
        slug
    }
}

/// Directory holding one topic's metadata file and `images/` folder.
#[must_use]
pub fn topic_dir(root: &Path, category: &str, topic: &str) -> PathBuf {
    root.join(sanitize_filename::sanitize(category))
        .join(topic_slug(topic))
}

/// Extension for a downloaded image, taken from the URL path.
///
/// Query strings and fragments are ignored. Unknown or missing extensions
/// fall back to `jpg`.
#[must_use]
pub fn image_extension(image_url: &str) -> &'static str {
    let path = match url::Url::parse(image_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => image_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let Some(ext) = path.rsplit('/').next().and_then(|name| {
        name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
    }) else {
        return DEFAULT_IMAGE_EXTENSION;
    };

    KNOWN_IMAGE_EXTENSIONS
        .iter()
        .find(|known| **known == ext)
        .copied()
        .unwrap_or(DEFAULT_IMAGE_EXTENSION)
}

/// Path of `path` relative to `root`, with `/` separators.
///
/// Falls back to the full path when `path` is not under `root`.
#[must_use]
pub fn relative_to(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_replaces_spaces() {
        assert_eq!(topic_slug("dark academia"), "dark_academia");
        assert_eq!(topic_slug("study desk setup"), "study_desk_setup");
    }

    #[test]
    fn slug_strips_path_separators() {
        let slug = topic_slug("coffee/tea art");
        assert!(!slug.contains('/'));
        assert!(slug.starts_with("coffee"));
    }

    #[test]
    fn extension_from_url_path() {
        assert_eq!(
            image_extension("https://i.pinimg.com/originals/ab/cd/ef.png"),
            "png"
        );
        assert_eq!(
            image_extension("https://i.pinimg.com/originals/ab/cd/ef.WEBP?x=1"),
            "webp"
        );
        assert_eq!(image_extension("https://i.pinimg.com/originals/ab/cd/ef"), "jpg");
        assert_eq!(image_extension("https://i.pinimg.com/x/y.tiff"), "jpg");
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/tmp/out");
        let file = root.join("TRAVEL").join("paris").join("images").join("1.jpg");
        assert_eq!(relative_to(&file, root), "TRAVEL/paris/images/1.jpg");
    }
}
