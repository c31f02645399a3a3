use perch::error::{Chainable, Result};
use perch::markup::{parse_element, parse_wrapped, replace_all, Element, Node};
use perch::error;

const CODE_LINE_START: &str = "<div class=\"code-line\">";
const CODE_LINE_BREAK: &str = "</div><div class=\"code-line\">";

/// One rewrite of a rendered README.
#[derive(Debug, Clone)]
pub enum Fixup<'a> {
    /// Replaces permalink anchors with their content, minus icons.
    UnwrapAnchors,
    /// Removes headings whose whole text is the project's name.
    DropTitle(&'a str),
    /// Removes `data-*`, `id` and `itemprop` attributes.
    StripAttributes,
    /// Wraps every source line of a `<pre>` block in its own element.
    CodeLines,
}

impl Fixup<'_> {
    pub fn apply(&self, root: &mut Element) -> Result<()> {
        match self {
            Fixup::UnwrapAnchors => root.splice(&mut |e| {
                let is_anchor = e.name == "a" && e.attr("class") == Some("anchor");
                is_anchor.then(|| std::mem::take(&mut e.children).into_iter()
                    .filter(|child| child.as_element().map_or(true, |e| e.name != "svg"))
                    .collect())
            }),
            Fixup::DropTitle(name) => root.splice(&mut |e| {
                let is_heading = e.name.len() == 2 && e.name.starts_with('h');
                (is_heading && e.text_content() == *name).then(Vec::new)
            }),
            Fixup::StripAttributes => root.walk_mut(&mut |e| e.retain_attrs(|attr| {
                !attr.name.starts_with("data-") && attr.name != "id" && attr.name != "itemprop"
            })),
            Fixup::CodeLines => {
                let mut result = Ok(());
                root.splice(&mut |e| {
                    if e.name != "pre" || result.is_err() {
                        return None;
                    }

                    match code_lines(e) {
                        Ok(pre) => Some(vec![Node::Element(pre)]),
                        Err(error) => {
                            result = Err(error);
                            None
                        }
                    }
                });

                return result;
            }
        }

        Ok(())
    }
}

/// Rewrites the serialized `<pre>` so each line is its own `code-line`
/// element, then parses it back.
fn code_lines(pre: &mut Element) -> Result<Element> {
    pre.attrs.clear();
    let markup = pre.to_string();
    let wrapped = replace_all(&markup, &[
        ("<pre>\r\n  ", "<pre>"),
        ("<pre>", &format!("<pre>{CODE_LINE_START}")),
        ("</pre>", "</div></pre>"),
        ("\r\n", CODE_LINE_BREAK),
        ("\n", CODE_LINE_BREAK),
        ("\r", ""),
    ]);

    let mut pre = parse_element(&wrapped).chain_with(|| "failed to split code block into lines")?;
    pre.set_attr("class", "code");
    Ok(pre)
}

/// Cleans up GitHub's rendering of the README of the project `name`.
pub fn fix_readme(html: &str, name: &str) -> Result<Element> {
    let mut root = parse_wrapped(html).chain_with(|| error! {
        "failed to parse rendered README",
        "project" => name,
    })?;

    let fixups = [
        Fixup::UnwrapAnchors,
        Fixup::DropTitle(name),
        Fixup::StripAttributes,
        Fixup::CodeLines,
    ];

    for fixup in &fixups {
        fixup.apply(&mut root)?;
    }

    Ok(root)
}

/// License text with copyright markers replaced by the symbol.
pub fn fix_license(text: &str) -> String {
    text.replace("(c)", "©").replace("(C)", "©")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(html: &str) -> String {
        fix_readme(html, "Alpha").unwrap().to_string()
    }

    #[test]
    fn unwraps_permalink_anchors() {
        let html = r##"<div><h2><a class="anchor" href="#usage"><svg class="octicon"><path d="M0"/></svg></a>Usage</h2><a class="anchor"><svg></svg>#</a><a class="link" href="/x">x</a></div>"##;
        assert_eq!(fixed(html), r#"<div><h2>Usage</h2>#<a class="link" href="/x">x</a></div>"#);
    }

    #[test]
    fn drops_only_the_project_title() {
        let html = r##"<div><h1><a class="anchor" href="#alpha"></a>Alpha</h1><h3>Alpha</h3><h1>Alpha tool</h1><p>Alpha</p><hr/></div>"##;
        assert_eq!(fixed(html), "<div><h1>Alpha tool</h1><p>Alpha</p><hr/></div>");
    }

    #[test]
    fn strips_identifying_attributes() {
        let html = r#"<div id="readme" class="md" data-path="README.md"><p itemprop="text" data-x="1" title="t">x</p></div>"#;
        assert_eq!(fixed(html), r#"<div class="md"><p title="t">x</p></div>"#);
    }

    #[test]
    fn splits_code_blocks_into_lines() {
        let html = "<div><pre lang=\"cs\">var a;\nvar b;</pre></div>";
        assert_eq!(fixed(html), concat!(
            "<div><pre class=\"code\">",
            "<div class=\"code-line\">var a;</div>",
            "<div class=\"code-line\">var b;</div>",
            "</pre></div>",
        ));

        let crlf = "<div><pre>\r\n  first\r\nsecond</pre></div>";
        assert_eq!(fixed(crlf), concat!(
            "<div><pre class=\"code\">",
            "<div class=\"code-line\">first</div>",
            "<div class=\"code-line\">second</div>",
            "</pre></div>",
        ));
    }

    #[test]
    fn keeps_highlighting_inside_lines() {
        let html = r#"<div class="highlight highlight-source-cs"><pre><span class="pl-k">var</span> x = 1;</pre></div>"#;
        assert_eq!(fixed(html), concat!(
            r#"<div class="highlight highlight-source-cs"><pre class="code">"#,
            r#"<div class="code-line"><span class="pl-k">var</span> x = 1;</div>"#,
            "</pre></div>",
        ));
    }

    #[test]
    fn replaces_copyright_markers() {
        assert_eq!(fix_license("Copyright (c) 2016 (C) Nerven"), "Copyright © 2016 © Nerven");
    }
}
