// SPDX-License-Identifier: MPL-2.0
//! Dashboard page layout.
//!
//! Builds the page skeleton (heading, header, navigation, main area and
//! footer) and the process table into a [`Document`]. Every user-visible
//! string is bound with a translation directive and seeded with its English
//! text, so the markup reads correctly even before a localizer runs.
//!
//! Labels sitting next to icons get their own `<span>`: a text directive
//! replaces all children of its element.

use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Default icon edge, in pixels.
const ICON_SIZE: u8 = 24;

/// A top-level dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    System,
    Process,
    Software,
    Service,
    Management,
    Terminal,
    Browser,
}

impl Page {
    /// Navigation order.
    pub const ALL: [Page; 7] = [
        Page::System,
        Page::Process,
        Page::Software,
        Page::Service,
        Page::Management,
        Page::Terminal,
        Page::Browser,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Page::System => "/system",
            Page::Process => "/process",
            Page::Software => "/software",
            Page::Service => "/service",
            Page::Management => "/management",
            Page::Terminal => "/terminal",
            Page::Browser => "/browser",
        }
    }

    /// Message key of the navigation label.
    #[must_use]
    pub fn message_key(self) -> &'static str {
        match self {
            Page::System => "nav_system",
            Page::Process => "nav_process",
            Page::Software => "nav_software",
            Page::Service => "nav_service",
            Page::Management => "nav_management",
            Page::Terminal => "nav_terminal",
            Page::Browser => "nav_browser",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Page::System => "System",
            Page::Process => "Processes",
            Page::Software => "Software",
            Page::Service => "Services",
            Page::Management => "Management",
            Page::Terminal => "Terminal",
            Page::Browser => "File Browser",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Page::System => "fa6-solid-gauge",
            Page::Process => "fa6-solid-microchip",
            Page::Software => "fa6-solid-database",
            Page::Service => "fa6-solid-list",
            Page::Management => "fa6-solid-user",
            Page::Terminal => "fa6-solid-terminal",
            Page::Browser => "fa6-solid-folder",
        }
    }
}

/// A backend the header can switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub addr: String,
    pub name: String,
}

/// What the layout shows.
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    /// Dashboard version shown in the footer.
    pub version: String,
    pub current_page: Page,
    pub backends: Vec<Backend>,
    /// Address of the selected backend.
    pub current_backend: Option<String>,
    /// DietPi version the selected backend can update to.
    pub dietpi_update: Option<String>,
}

/// Handles to the regions of a built layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    pub heading: NodeId,
    pub header: NodeId,
    pub messages: NodeId,
    /// Empty list item reserved for the dashboard update notice.
    pub update_notice: NodeId,
    pub nav: NodeId,
    pub main: NodeId,
    pub footer: NodeId,
}

/// Builds the page layout under the document body.
///
/// # Errors
///
/// Returns [`crate::error::Error::Dom`] if the document rejects an insertion.
pub fn build(doc: &mut Document, options: &ShellOptions) -> Result<Shell> {
    let body = doc.body();
    doc.set_title("DietPi Dashboard");

    let heading = text_element(doc, body, "h1", &[("data-i18n", "app_name")], "DietPi Dashboard")?;
    let header = header(doc, body, options)?;
    let (messages, update_notice) = messages(doc, body, options)?;
    let nav = nav(doc, body, options.current_page)?;
    element(
        doc,
        body,
        "button",
        &[
            ("id", "nav-overlay"),
            ("type", "button"),
            ("aria-label", "Close navigation"),
            ("data-i18n-aria-label", "nav_close"),
        ],
    )?;
    let main = element(doc, body, "main", &[])?;
    let footer = footer(doc, body, &options.version)?;

    Ok(Shell {
        heading,
        header,
        messages,
        update_notice,
        nav,
        main,
        footer,
    })
}

fn header(doc: &mut Document, parent: NodeId, options: &ShellOptions) -> Result<NodeId> {
    let header = element(doc, parent, "header", &[])?;

    let toggle = element(
        doc,
        header,
        "button",
        &[
            ("class", "nav-toggle"),
            ("aria-controls", "nav"),
            ("aria-label", "Toggle navigation"),
            ("data-i18n-aria-label", "nav_toggle"),
        ],
    )?;
    icon(doc, toggle, "fa6-solid-bars", 30)?;

    let switch = element(doc, header, "label", &[("class", "backend-switch")])?;
    text_element(doc, switch, "span", &[("data-i18n", "backend")], "Backend")?;
    let select = element(doc, switch, "select", &[])?;
    for backend in &options.backends {
        let option = element(doc, select, "option", &[("value", backend.addr.as_str())])?;
        if options.current_backend.as_deref() == Some(backend.addr.as_str()) {
            doc.set_attribute(option, "selected", "");
        }
        doc.set_text_content(option, &format!("{} ({})", backend.name, backend.addr));
    }

    let msg_button = element(
        doc,
        header,
        "button",
        &[
            ("class", "msg-btn"),
            ("aria-controls", "msgs"),
            ("title", "Messages"),
            ("data-i18n-title", "messages"),
            ("aria-label", "Messages"),
            ("data-i18n-aria-label", "messages"),
        ],
    )?;
    icon(doc, msg_button, "fa6-solid-envelope", ICON_SIZE)?;

    let language = element(
        doc,
        header,
        "button",
        &[
            ("class", "lang-switch"),
            ("title", "Switch language"),
            ("data-i18n-title", "language_switch"),
            ("aria-label", "Switch language"),
            ("data-i18n-aria-label", "language_switch"),
        ],
    )?;
    text_element(doc, language, "span", &[("data-i18n-lang", "")], "EN")?;

    let theme = element(doc, header, "span", &[("class", "theme-switch")])?;
    let theme_button = element(
        doc,
        theme,
        "button",
        &[
            ("class", "theme-toggle"),
            ("aria-label", "Toggle dark mode"),
            ("data-i18n-aria-label", "theme_toggle"),
        ],
    )?;
    icon(doc, theme_button, "fa6-solid-sun", ICON_SIZE)?;

    Ok(header)
}

fn messages(doc: &mut Document, parent: NodeId, options: &ShellOptions) -> Result<(NodeId, NodeId)> {
    let container = element(doc, parent, "div", &[("id", "msgs")])?;
    let list = element(doc, container, "ul", &[])?;
    let update_notice = element(doc, list, "li", &[("class", "update-notice")])?;
    if let Some(version) = &options.dietpi_update {
        text_element(
            doc,
            list,
            "li",
            &[("data-i18n-template", "dietpi_update"), ("data-version", version.as_str())],
            &format!("DietPi Update Available: {version}"),
        )?;
    }
    Ok((container, update_notice))
}

fn nav(doc: &mut Document, parent: NodeId, current: Page) -> Result<NodeId> {
    let nav = element(doc, parent, "nav", &[("id", "nav")])?;
    for page in Page::ALL {
        let active = page == current;
        let link = element(
            doc,
            nav,
            "a",
            &[
                ("href", page.path()),
                ("class", if active { "active" } else { "" }),
                ("aria-current", if active { "page" } else { "false" }),
            ],
        )?;
        icon(doc, link, page.icon(), ICON_SIZE)?;
        text_element(doc, link, "span", &[("data-i18n", page.message_key())], page.label())?;
    }
    Ok(nav)
}

fn footer(doc: &mut Document, parent: NodeId, version: &str) -> Result<NodeId> {
    let footer = element(doc, parent, "footer", &[])?;
    text_element(
        doc,
        footer,
        "span",
        &[
            ("data-i18n-template", "footer_credit"),
            ("data-version", version),
            ("data-author", "ravenclaw900"),
        ],
        &format!("DietPi Dashboard v{version} by ravenclaw900"),
    )?;
    let link = element(
        doc,
        footer,
        "a",
        &[
            ("href", "https://github.com/ravenclaw900/DietPi-Dashboard"),
            ("target", "_blank"),
        ],
    )?;
    icon(doc, link, "cib-github", 32)?;
    Ok(footer)
}

// =============================================================================
// Process table
// =============================================================================

/// Scheduling state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Paused,
    Sleeping,
    Other,
}

impl ProcessStatus {
    /// `(data-status value, message key, English label)`.
    fn badge(self) -> (&'static str, &'static str, &'static str) {
        match self {
            ProcessStatus::Running => ("running", "status_running", "Running"),
            ProcessStatus::Paused => ("paused", "status_paused", "Paused"),
            ProcessStatus::Sleeping => ("sleeping", "status_sleeping", "Sleeping"),
            ProcessStatus::Other => ("other", "status_other", "Other"),
        }
    }
}

/// One row of the process table.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub pid: u32,
    pub name: String,
    pub status: ProcessStatus,
    /// CPU usage in percent.
    pub cpu: f32,
    /// Resident memory in bytes.
    pub mem: u64,
}

/// Handles to a built process section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTable {
    pub section: NodeId,
    pub table: NodeId,
    pub count: NodeId,
    pub pager: NodeId,
}

/// Builds the process section (heading, filter, header row, count and pager)
/// under `parent`. Rows are added separately with [`process_row`].
///
/// # Errors
///
/// Returns [`crate::error::Error::Dom`] if the document rejects an insertion.
pub fn process_table(doc: &mut Document, parent: NodeId) -> Result<ProcessTable> {
    let section = element(doc, parent, "section", &[("id", "process-swap")])?;
    text_element(doc, section, "h2", &[("data-i18n", "process_title")], "Processes")?;
    element(
        doc,
        section,
        "input",
        &[
            ("type", "search"),
            ("placeholder", "Filter processes"),
            ("data-i18n-placeholder", "process_filter"),
        ],
    )?;

    let table = element(doc, section, "table", &[("class", "process-table")])?;
    let head = element(doc, table, "tr", &[])?;
    for (key, label) in [
        ("col_pid", "PID"),
        ("col_name", "Name"),
        ("col_status", "Status"),
        ("col_cpu", "CPU Usage"),
        ("col_ram", "RAM Usage"),
        ("col_actions", "Actions"),
    ] {
        text_element(doc, head, "th", &[("data-i18n", key)], label)?;
    }

    let count = text_element(
        doc,
        section,
        "p",
        &[("data-i18n-template", "process_count"), ("data-count", "0")],
        "Processes: 0",
    )?;
    let pager = text_element(
        doc,
        section,
        "span",
        &[
            ("class", "pager"),
            ("data-i18n-template", "page_of"),
            ("data-page", "1"),
            ("data-total-pages", "1"),
        ],
        "Page 1 / 1",
    )?;

    Ok(ProcessTable {
        section,
        table,
        count,
        pager,
    })
}

/// Builds a detached table row for `process`.
///
/// Appending it to a watched table translates it on the next frame.
///
/// # Errors
///
/// Returns [`crate::error::Error::Dom`] if the document rejects an insertion.
pub fn process_row(doc: &mut Document, process: &Process) -> Result<NodeId> {
    let row = doc.create_element("tr");
    text_element(doc, row, "td", &[], &process.pid.to_string())?;
    text_element(doc, row, "td", &[], &process.name)?;

    let status_cell = element(doc, row, "td", &[])?;
    let (status, key, label) = process.status.badge();
    text_element(
        doc,
        status_cell,
        "span",
        &[("class", "status-badge"), ("data-status", status), ("data-i18n", key)],
        label,
    )?;

    text_element(doc, row, "td", &[], &format!("{:.1}%", process.cpu))?;
    text_element(doc, row, "td", &[], &format_bytes(process.mem))?;

    let pid = process.pid.to_string();
    let actions_cell = element(doc, row, "td", &[("data-pid", pid.as_str())])?;
    let actions = element(doc, actions_cell, "div", &[("class", "actions-cell")])?;
    let toggle = if process.status == ProcessStatus::Paused {
        ("resume", "signal_resume", "Resume process", "fa6-solid-play")
    } else {
        ("pause", "signal_pause", "Pause process", "fa6-solid-pause")
    };
    for (signal, key, label, glyph) in [
        ("kill", "signal_kill", "Kill process", "fa6-solid-skull"),
        ("term", "signal_term", "Terminate process", "fa6-solid-ban"),
        toggle,
    ] {
        let button = element(
            doc,
            actions,
            "button",
            &[
                ("data-signal", signal),
                ("title", label),
                ("data-i18n-title", key),
                ("aria-label", label),
                ("data-i18n-aria-label", key),
            ],
        )?;
        icon(doc, button, glyph, ICON_SIZE)?;
    }

    Ok(row)
}

/// Removes every process row (the header row stays) and releases them.
/// Returns how many rows were removed.
///
/// # Errors
///
/// Returns [`crate::error::Error::Dom`] if a row cannot be removed.
pub fn clear_rows(doc: &mut Document, table: NodeId) -> Result<usize> {
    let rows: Vec<NodeId> = doc.children(table).iter().skip(1).copied().collect();
    for row in &rows {
        doc.remove(*row)?;
    }
    Ok(rows.len())
}

/// Updates the pager parameters. The caller retranslates the element.
pub fn set_page(doc: &mut Document, pager: NodeId, page: usize, total_pages: usize) {
    doc.set_attribute(pager, "data-page", &page.to_string());
    doc.set_attribute(pager, "data-total-pages", &total_pages.to_string());
}

/// Updates the process count parameter. The caller retranslates the element.
pub fn set_count(doc: &mut Document, count: NodeId, processes: usize) {
    doc.set_attribute(count, "data-count", &processes.to_string());
}

/// Binary units, no decimals: `1600` becomes `2 KiB`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.0} {}", UNITS[unit])
}

// =============================================================================
// Element helpers
// =============================================================================

fn element(doc: &mut Document, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> Result<NodeId> {
    let node = doc.create_element(tag);
    for (name, value) in attributes {
        doc.set_attribute(node, name, value);
    }
    doc.append_child(parent, node)?;
    Ok(node)
}

fn text_element(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<NodeId> {
    let node = element(doc, parent, tag, attributes)?;
    doc.set_text_content(node, text);
    Ok(node)
}

fn icon(doc: &mut Document, parent: NodeId, name: &str, size: u8) -> Result<NodeId> {
    let size = size.to_string();
    let href = format!("/static/icons.svg#{name}");
    let svg = element(doc, parent, "svg", &[("width", size.as_str()), ("height", size.as_str())])?;
    element(doc, svg, "use", &[("href", href.as_str())])?;
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{directive, Directive};

    fn options() -> ShellOptions {
        ShellOptions {
            version: "0.3.0".to_string(),
            current_page: Page::Process,
            backends: vec![Backend {
                addr: "127.0.0.1:5252".to_string(),
                name: "pi".to_string(),
            }],
            current_backend: Some("127.0.0.1:5252".to_string()),
            dietpi_update: Some("9.8".to_string()),
        }
    }

    #[test]
    fn layout_seeds_english_text() {
        let mut doc = Document::new();
        let shell = build(&mut doc, &options()).unwrap();

        assert_eq!(doc.title(), "DietPi Dashboard");
        assert_eq!(doc.text_content(shell.heading), "DietPi Dashboard");
        assert_eq!(
            doc.text_content(shell.footer),
            "DietPi Dashboard v0.3.0 by ravenclaw900"
        );
        assert!(doc.text_content(shell.messages).contains("DietPi Update Available: 9.8"));
    }

    #[test]
    fn every_page_has_a_navigation_label() {
        let mut doc = Document::new();
        let shell = build(&mut doc, &options()).unwrap();

        let labels = directive::collect(&doc, shell.nav, Directive::Text);
        let keys: Vec<_> = labels
            .iter()
            .filter_map(|node| Directive::Text.key(&doc, *node))
            .collect();
        let expected: Vec<_> = Page::ALL.iter().map(|page| page.message_key()).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn current_page_is_marked_active() {
        let mut doc = Document::new();
        let shell = build(&mut doc, &options()).unwrap();

        let active: Vec<_> = doc
            .children(shell.nav)
            .iter()
            .filter(|link| doc.get_attribute(**link, "aria-current") == Some("page"))
            .filter_map(|link| doc.get_attribute(*link, "href"))
            .collect();
        assert_eq!(active, vec!["/process"]);
    }

    #[test]
    fn process_row_is_detached_with_signal_buttons() {
        let mut doc = Document::new();
        let row = process_row(
            &mut doc,
            &Process {
                pid: 42,
                name: "nginx".to_string(),
                status: ProcessStatus::Paused,
                cpu: 1.25,
                mem: 3 * 1024 * 1024,
            },
        )
        .unwrap();

        assert_eq!(doc.parent(row), None);
        let text = doc.text_content(row);
        assert!(text.starts_with("42nginxPaused"));
        assert!(text.contains("3 MiB"));
        let signals: Vec<_> = directive::collect(&doc, row, Directive::Title)
            .iter()
            .filter_map(|button| doc.get_attribute(*button, "data-signal"))
            .collect();
        assert_eq!(signals, vec!["kill", "term", "resume"]);
    }

    #[test]
    fn clearing_rows_keeps_header_and_reuses_storage() {
        let mut doc = Document::new();
        let body = doc.body();
        let table = process_table(&mut doc, body).unwrap();
        let process = Process {
            pid: 7,
            name: "cron".to_string(),
            status: ProcessStatus::Sleeping,
            cpu: 0.0,
            mem: 2048,
        };
        let mut allocated = None;
        for _ in 0..50 {
            for _ in 0..3 {
                let row = process_row(&mut doc, &process).unwrap();
                doc.append_child(table.table, row).unwrap();
            }
            let nodes = doc.allocated_nodes();
            assert_eq!(*allocated.get_or_insert(nodes), nodes);
            assert_eq!(clear_rows(&mut doc, table.table).unwrap(), 3);
        }

        assert_eq!(doc.children(table.table).len(), 1);
        assert_eq!(doc.text_content(table.table), "PIDNameStatusCPU UsageRAM UsageActions");
    }

    #[test]
    fn pager_parameters_update() {
        let mut doc = Document::new();
        let body = doc.body();
        let table = process_table(&mut doc, body).unwrap();
        set_page(&mut doc, table.pager, 3, 10);

        let params = directive::template_params(&doc, table.pager);
        assert_eq!(params.get("page").map(String::as_str), Some("3"));
        assert_eq!(params.get("totalPages").map(String::as_str), Some("10"));
    }

    #[test]
    fn format_bytes_uses_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1600), "2 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5 GiB");
    }
}
