//! Parse tree pane rendering
//!
//! The tree is shown in pre-order, one node per row, indented by depth.
//! Each row shows the node kind, its payload and its position; error and
//! warning nodes also show their message.

use crate::parser::tree::{NodeId, NodeKind, ParseTree};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// One visible row of the tree pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub id: NodeId,
}

impl TreeRow {
    /// Flatten a tree into rows in pre-order.
    pub fn collect(tree: &ParseTree) -> Vec<TreeRow> {
        tree.pre_order()
            .map(|(depth, id)| TreeRow { depth, id })
            .collect()
    }
}

fn kind_style(kind: NodeKind) -> Style {
    match kind {
        NodeKind::Error => Style::default()
            .fg(DEFAULT_THEME.error)
            .add_modifier(Modifier::BOLD),
        NodeKind::Warning => Style::default().fg(DEFAULT_THEME.warning),
        NodeKind::HeaderUnit | NodeKind::SourceUnit => Style::default()
            .fg(DEFAULT_THEME.primary)
            .add_modifier(Modifier::BOLD),
        NodeKind::BlockComment | NodeKind::LineComment => {
            Style::default().fg(DEFAULT_THEME.comment)
        }
        NodeKind::Directive
        | NodeKind::Include
        | NodeKind::IncludeFilename
        | NodeKind::Define
        | NodeKind::DefineIdentifier
        | NodeKind::DefineExpression
        | NodeKind::Pragma
        | NodeKind::PragmaText => Style::default().fg(DEFAULT_THEME.directive),
        NodeKind::Datatype
        | NodeKind::PrimitiveType
        | NodeKind::UserDefinedType
        | NodeKind::Union
        | NodeKind::Enum
        | NodeKind::Struct => Style::default().fg(DEFAULT_THEME.type_name),
        NodeKind::Specifier | NodeKind::Qualifier | NodeKind::Modifier => {
            Style::default().fg(DEFAULT_THEME.keyword)
        }
        NodeKind::Identifier => Style::default().fg(DEFAULT_THEME.identifier),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Build the styled line for one row.
fn tree_line(tree: &ParseTree, row: TreeRow) -> Line<'static> {
    let node = tree.node(row.id);
    let mut spans = vec![
        Span::raw("  ".repeat(row.depth)),
        Span::styled(node.kind.name(), kind_style(node.kind)),
    ];
    if let Some(payload) = &node.payload {
        spans.push(Span::styled(
            format!(" {:?}", payload),
            Style::default().fg(DEFAULT_THEME.string),
        ));
    }
    if !node.kind.is_unit() {
        spans.push(Span::styled(
            format!(" @{}", node.location),
            Style::default().fg(DEFAULT_THEME.comment),
        ));
    }
    if let Some(message) = &node.diagnostic {
        spans.push(Span::styled(format!(" ({})", message), kind_style(node.kind)));
    }
    Line::from(spans)
}

/// Render the tree pane, keeping the selected row visible.
pub fn render_tree_pane(
    frame: &mut Frame,
    area: Rect,
    tree: &ParseTree,
    rows: &[TreeRow],
    selected: usize,
    scroll: &mut usize,
) {
    let block = Block::default()
        .title(format!(" Parse Tree ({} nodes) ", rows.len()))
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(DEFAULT_THEME.border_focused)
                .add_modifier(Modifier::BOLD),
        );

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    if selected < *scroll {
        *scroll = selected;
    } else if selected >= *scroll + visible_height {
        *scroll = selected + 1 - visible_height;
    }

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, &row)| {
            let mut line = tree_line(tree, row);
            if idx == selected {
                for span in &mut line.spans {
                    span.style = span
                        .style
                        .bg(DEFAULT_THEME.current_line_bg)
                        .add_modifier(Modifier::BOLD);
                }
            }
            line
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
