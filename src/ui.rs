use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    // Update scroll offset to keep selected item visible
    let visible_height = chunks[0].height.saturating_sub(2) as usize; // account for border
    app.tree_state.update_scroll(visible_height);

    let block = Block::default()
        .title(" LDAP Browser ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focused_fg))
        .style(Style::default().bg(app.theme.tree_bg).fg(app.theme.tree_fg));

    let tree_widget = TreeWidget::new(&app.tree_state, &app.theme).block(block);
    frame.render_widget(tree_widget, chunks[0]);

    let title = app.selection_title();
    let info = app.selection_info();
    let sort_info = app.sort_info();
    let mut status = StatusBarWidget::new(&title, &info, &app.theme).sort_info(&sort_info);
    if app.selection_has_more() {
        status = status.more_hint("+more");
    }
    if let Some((msg, is_error, _)) = &app.status_message {
        status = status.status_message(msg, *is_error);
    }
    frame.render_widget(status, chunks[1]);
}
