use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::view::{FlatItem, ItemKind, TreeState};

/// Tree widget that renders the browser rows with box-drawing characters.
pub struct TreeWidget<'a> {
    tree_state: &'a TreeState,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(tree_state: &'a TreeState, theme: &'a ThemeColors) -> Self {
        Self {
            tree_state,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the prefix string for tree indentation using box-drawing characters.
    ///
    /// We need to know the ancestor chain to draw continuation lines correctly.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();

        // Walk backwards to the ancestor at each depth to see if it was the
        // last of its siblings.
        for d in 1..item.depth {
            let mut ancestor_is_last = false;
            for j in (0..item_index).rev() {
                if items[j].depth == d {
                    ancestor_is_last = items[j].is_last_sibling;
                    break;
                }
                if items[j].depth < d {
                    break;
                }
            }
            if ancestor_is_last {
                parts.push("   ");
            } else {
                parts.push("│  ");
            }
        }

        if item.is_last_sibling {
            parts.push("└──");
        } else {
            parts.push("├──");
        }

        parts.join("")
    }

    /// Expand marker for containers, blank for leaves.
    fn item_indicator(item: &FlatItem) -> &'static str {
        match item.kind {
            ItemKind::Placeholder => "… ",
            _ if item.is_expanded => "▾ ",
            _ if item.has_children => "▸ ",
            _ => "  ",
        }
    }

    fn item_style(&self, item: &FlatItem) -> Style {
        match item.kind {
            ItemKind::Connection => Style::default()
                .fg(self.theme.accent_fg)
                .add_modifier(Modifier::BOLD),
            ItemKind::Category => Style::default()
                .fg(self.theme.tree_container_fg)
                .add_modifier(Modifier::BOLD),
            ItemKind::Entry { meta: true } => Style::default()
                .fg(self.theme.tree_meta_fg)
                .add_modifier(Modifier::ITALIC),
            ItemKind::Entry { meta: false } if item.has_children => {
                Style::default().fg(self.theme.tree_container_fg)
            }
            ItemKind::Entry { meta: false } | ItemKind::SearchResult => {
                Style::default().fg(self.theme.tree_leaf_fg)
            }
            ItemKind::Search | ItemKind::Bookmark => Style::default().fg(self.theme.info_fg),
            ItemKind::Page => Style::default().fg(self.theme.tree_page_fg),
            ItemKind::Placeholder => Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let items = &self.tree_state.flat_items;
        let selected = self.tree_state.selected_index;
        let visible_height = inner_area.height as usize;

        if items.is_empty() || visible_height == 0 {
            return;
        }

        let scroll = self.tree_state.scroll_offset;
        let visible_items = items.iter().enumerate().skip(scroll).take(visible_height);

        for (i, (idx, item)) in visible_items.enumerate() {
            let y = inner_area.y + i as u16;
            if y >= inner_area.y + inner_area.height {
                break;
            }

            let prefix = Self::build_prefix(item, items, idx);
            let indicator = Self::item_indicator(item);

            let style = if idx == selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                self.item_style(item)
            };

            let line_content = format!("{}{}{}", prefix, indicator, item.label);
            let line = Line::from(Span::styled(line_content, style));
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
