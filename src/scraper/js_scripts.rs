//! JavaScript evaluated inside result pages
//!
//! Each script is a self-invoking expression whose value is returned to
//! Rust through `EvaluationResult::into_value`.

/// Read every pin card currently in the DOM.
///
/// Returns an array of `{pin_id, title, description, image_url, pin_url}`
/// matching `RawPin`. The id is the path segment after `/pin/`; the pin URL
/// is made absolute against the platform origin.
pub const EXTRACT_PINS_SCRIPT: &str = r#"
    (() => {
        const text = (root, selector) => {
            const el = root.querySelector(selector);
            return el ? (el.innerText || '').trim() : '';
        };

        return Array.from(document.querySelectorAll('div[data-test-id="pin"]')).map(card => {
            const img = card.querySelector('img[src*="pinimg.com"]');
            const link = card.querySelector('a[href*="/pin/"]');
            const href = link ? (link.getAttribute('href') || '') : '';
            let pinId = '';
            if (href.includes('/pin/')) {
                pinId = href.split('/pin/').pop().split('/')[0] || '';
            }
            let pinUrl = null;
            if (href) {
                pinUrl = href.startsWith('http') ? href : 'https://www.pinterest.com' + href;
            }

            return {
                pin_id: pinId,
                title: text(card, 'div[data-test-id="pin-title"]'),
                description: text(card, 'div[data-test-id="pin-description"]'),
                image_url: img ? img.getAttribute('src') : null,
                pin_url: pinUrl
            };
        });
    })()
"#;

/// Current document height, used for stall detection.
pub const SCROLL_HEIGHT_SCRIPT: &str = r#"
    (() => document.body ? document.body.scrollHeight : 0)()
"#;

/// Best-effort click on a consent banner's accept button.
///
/// Returns true when a button was clicked.
pub const DISMISS_COOKIE_BANNER_SCRIPT: &str = r#"
    (() => {
        const wanted = ['accept all', 'accept cookies', 'allow all'];
        const buttons = Array.from(document.querySelectorAll('button, [role="button"]'));
        const button = buttons.find(b => wanted.includes((b.innerText || '').trim().toLowerCase()));
        if (button) {
            button.click();
            return true;
        }
        return false;
    })()
"#;

/// Scroll the window by a number of pixels.
#[must_use]
pub fn scroll_by_script(pixels: u32) -> String {
    format!("window.scrollBy(0, {pixels})")
}
