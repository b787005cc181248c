use std::sync::LazyLock;

use regex::Regex;

use crate::config::Settings;
use crate::error::WikiError;

static ICON_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<link rel="icon" .+?>"#).unwrap());
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<title>.*?</title>").unwrap());

/// Parsed wikitext as returned by the wiki: the full document head (up to and
/// including the opening `<body>` tag) and the content fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub head_html: String,
    pub body_html: String,
}

/// Turns wikitext into HTML.
pub trait Renderer {
    async fn render(&self, wikitext: &str, debug: bool) -> Result<RenderedDocument, WikiError>;
}

/// Stitch the rendered fragments into a standalone page that loads the
/// wiki's styles and scripts relative to the wiki itself.
pub fn assemble_page(doc: &RenderedDocument, settings: &Settings) -> String {
    let head = doc
        .head_html
        .replacen("<head>", &format!("<head><base href=\"{}\">", settings.wiki_base), 1);
    let head = ICON_LINK_RE.replace(&head, "");
    let title = format!("<title>{}</title>", escape_html(&settings.page_title));
    let head = TITLE_RE.replace(&head, regex::NoExpand(&title));

    format!(
        "{}\n<div id=\"mw-content-text\" class=\"mw-body-content\">{}</div>\n</body>\n</html>\n",
        head, doc.body_html
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> RenderedDocument {
        RenderedDocument {
            head_html: "<!DOCTYPE html>\n<html><head>\n<meta charset=\"UTF-8\">\n\
                <title>API - Rainverse Wiki</title>\n\
                <link rel=\"icon\" href=\"/favicon.ico\">\n\
                <link rel=\"stylesheet\" href=\"/w/load.php\">\n</head>\n<body class=\"skin-vector\">"
                .into(),
            body_html: "<table class=\"wikitable sortable\"></table>".into(),
        }
    }

    #[test]
    fn standalone_page() {
        let page = assemble_page(&doc(), &Settings::default());
        assert!(page.starts_with("<!DOCTYPE html>\n<html><head><base href=\"https://rainverse.wiki\">\n"));
        assert!(!page.contains("favicon"));
        assert!(!page.contains("API - Rainverse Wiki"));
        assert!(page.contains("<title>Rainverse character birthdays</title>"));
        assert!(page.contains("<link rel=\"stylesheet\" href=\"/w/load.php\">"));
        assert!(page.contains(
            "<body class=\"skin-vector\">\n<div id=\"mw-content-text\" class=\"mw-body-content\">\
             <table class=\"wikitable sortable\"></table></div>"
        ));
        assert!(page.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn title_is_escaped() {
        let settings = Settings { page_title: "A & B <birthdays>".into(), ..Settings::default() };
        let page = assemble_page(&doc(), &settings);
        assert!(page.contains("<title>A &amp; B &lt;birthdays&gt;</title>"));
    }
}
