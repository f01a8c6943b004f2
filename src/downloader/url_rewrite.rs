//! Thumbnail → full-resolution image URL rewriting

const THUMBNAIL_SEGMENTS: &[&str] = &["/236x/", "/564x/"];
const ORIGINALS_SEGMENT: &str = "/originals/";

/// Point a CDN thumbnail URL at the original upload.
///
/// Only the first size segment is replaced; URLs without one are returned
/// unchanged.
#[must_use]
pub fn full_resolution_url(image_url: &str) -> String {
    for segment in THUMBNAIL_SEGMENTS {
        if image_url.contains(segment) {
            return image_url.replacen(segment, ORIGINALS_SEGMENT, 1);
        }
    }
    image_url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnails_become_originals() {
        assert_eq!(
            full_resolution_url("https://i.pinimg.com/236x/aa/bb/cc.jpg"),
            "https://i.pinimg.com/originals/aa/bb/cc.jpg"
        );
        assert_eq!(
            full_resolution_url("https://i.pinimg.com/564x/aa/bb/cc.png"),
            "https://i.pinimg.com/originals/aa/bb/cc.png"
        );
    }

    #[test]
    fn other_urls_pass_through() {
        let url = "https://i.pinimg.com/originals/aa/bb/cc.jpg";
        assert_eq!(full_resolution_url(url), url);
        assert_eq!(full_resolution_url("https://example.com/a.jpg"), "https://example.com/a.jpg");
    }
}
