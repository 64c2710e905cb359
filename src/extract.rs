// HTML extraction for the Google Images results page.
//
// This depends entirely on the markup Google currently serves; when that
// changes, this is the only place that needs to follow.

use scraper::{Html, Selector};

/// Attributes of the first `<img>` element in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstImage {
    pub alt: Option<String>,
    pub src: Option<String>,
}

/// Return the `alt` and `src` attributes of the first `<img>` anywhere in
/// `html`, or `None` when the document has no image at all.
pub fn extract_first_image(html: &str) -> Option<FirstImage> {
    let document = Html::parse_document(html);
    let img_selector = Selector::parse("img").ok()?;

    document.select(&img_selector).next().map(|img| FirstImage {
        alt: img.value().attr("alt").map(|s| s.to_string()),
        src: img.value().attr("src").map(|s| s.to_string()),
    })
}
