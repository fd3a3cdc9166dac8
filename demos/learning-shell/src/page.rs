//! Sample learning page

use std::collections::HashMap;

use ui_dispatch::{Document, DocumentError, ElementSpec, NodeId};

/// Names for the nodes the script interacts with
#[derive(Debug, Default)]
pub struct Handles(HashMap<&'static str, NodeId>);

impl Handles {
    pub fn node(&self, handle: &str) -> Option<NodeId> {
        self.0.get(handle).copied()
    }

    fn insert(&mut self, handle: &'static str, node: NodeId) {
        self.0.insert(handle, node);
    }
}

fn button(action: &str, label: &str) -> ElementSpec {
    ElementSpec::new("button")
        .attr("data-action", action)
        .child(ElementSpec::new("span").class("label").text(label))
}

/// Build the page. Handles name the innermost node a user would click.
pub fn build() -> Result<(Document, Handles), DocumentError> {
    let mut doc = Document::new();
    let mut handles = Handles::default();
    let root = doc.root();

    let header = doc.insert(root, ElementSpec::new("header"))?;
    let reload = doc.insert(header, button("page-reload", "Reload"))?;
    handles.insert("reload", label_of(&doc, reload));
    let theme = doc.insert(header, button("theme-toggle", "Dark mode").attr("data-theme", "dark"))?;
    handles.insert("theme", theme);

    let banner = doc.insert(
        root,
        ElementSpec::new("aside")
            .id("banner-1")
            .class("banner")
            .child(ElementSpec::new("span").text("New quizzes are available!")),
    )?;
    let dismiss = doc.insert(
        banner,
        button("dismiss-by-id", "Dismiss").attr("data-target-id", "banner-1"),
    )?;
    handles.insert("dismiss", label_of(&doc, dismiss));

    let modules = doc.insert(root, ElementSpec::new("section").id("modules"))?;
    // Re-rendered without its marker
    let fractions = doc.insert(
        modules,
        ElementSpec::new("div")
            .role("button")
            .class("module-card")
            .attr("data-module-id", "m1")
            .child(ElementSpec::new("h3").text("Fractions")),
    )?;
    handles.insert("fractions-title", first_child(&doc, fractions));
    let algebra = doc.insert(
        modules,
        ElementSpec::new("div")
            .role("button")
            .class("module-card")
            .attr("data-action", "module-modal-show")
            .attr("data-module-id", "m3")
            .child(ElementSpec::new("h3").text("Algebra")),
    )?;
    handles.insert("algebra", algebra);

    let jokes = doc.insert(root, ElementSpec::new("section").id("jokes"))?;
    let next = doc.insert(jokes, button("joke-next", "Next joke"))?;
    handles.insert("joke-next", next);
    let rate = doc.insert(jokes, button("joke-rate", "★★★★").attr("data-rating", "4"))?;
    handles.insert("rate-4", rate);
    let rate_bad = doc.insert(jokes, button("joke-rate", "★×9").attr("data-rating", "9"))?;
    handles.insert("rate-9", rate_bad);

    let tools = doc.insert(root, ElementSpec::new("section").id("tools"))?;
    let help = doc.insert(tools, button("call-function", "Help").attr("data-fn", "show-help"))?;
    handles.insert("help", help);
    let wipe = doc.insert(tools, button("call-function", "Wipe").attr("data-fn", "wipeStorage"))?;
    handles.insert("wipe", wipe);
    let placement = doc.insert(tools, button("placement-open", "Find my level"))?;
    handles.insert("placement", placement);
    let feedback = doc.insert(tools, button("feedback-submit", "Send feedback"))?;
    handles.insert("feedback", feedback);
    let unknown = doc.insert(tools, button("warp-drive", "Engage"))?;
    handles.insert("unknown", unknown);
    let locked = doc.insert(
        tools,
        button("quiz-start", "Start quiz")
            .attr("data-quiz-id", "q1")
            .attr("disabled", ""),
    )?;
    handles.insert("locked-quiz", locked);

    let footer = doc.insert(root, ElementSpec::new("footer").text("© Learning app"))?;
    handles.insert("footer", footer);

    Ok((doc, handles))
}

/// Insert the placement test markup, as the placement module does on navigation
pub fn render_placement(doc: &mut Document) -> Result<(), DocumentError> {
    if doc.element_by_id("placement-test").is_some() {
        return Ok(());
    }
    let root = doc.root();
    doc.insert(
        root,
        ElementSpec::new("section")
            .id("placement-test")
            .child(ElementSpec::new("h2").id("placement-question").text("2 + 2 = ?"))
            .child(ElementSpec::new("ul").id("placement-options"))
            .child(ElementSpec::new("progress").id("placement-progress")),
    )?;
    Ok(())
}

fn first_child(doc: &Document, id: NodeId) -> NodeId {
    doc.node(id)
        .and_then(|node| node.children().first().copied())
        .unwrap_or(id)
}

fn label_of(doc: &Document, button: NodeId) -> NodeId {
    first_child(doc, button)
}
