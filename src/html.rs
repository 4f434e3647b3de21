//! HTML meta-tag lookups and text cleanup built on `scraper`.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[content]").unwrap());

/// A parsed page with helpers for the metadata extractors care about.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Content of the first `<meta>` tag whose `property`, `name` or
    /// `itemprop` equals one of `names`, in order of preference.
    ///
    /// Empty values are treated as missing.
    pub fn meta_content(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|wanted| {
            self.document.select(&META_SELECTOR).find_map(|element| {
                let el = element.value();
                let matches = ["property", "name", "itemprop"]
                    .iter()
                    .any(|attr| el.attr(attr).is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted)));
                if !matches {
                    return None;
                }
                el.attr("content")
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
        })
    }

    pub fn og_title(&self) -> Option<String> {
        self.meta_content(&["og:title"])
    }

    pub fn og_description(&self) -> Option<String> {
        self.meta_content(&["og:description"])
    }

    pub fn og_thumbnail(&self) -> Option<String> {
        self.meta_content(&["og:image"])
    }
}

/// Strip tags from an HTML fragment, decode entities and collapse whitespace.
pub fn clean_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
