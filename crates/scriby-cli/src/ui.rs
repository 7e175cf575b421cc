use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use scriby_engine::export::markup_to_markdown;
use scriby_engine::{BlockStyle, Marks, RenderedBlock, Store, Theme, UNTITLED};
use std::ops::Range;

use crate::app::{App, Mode, Pane, RenameTarget};
use crate::editor::EditBuffer;

struct Palette {
    base: Style,
    muted: Style,
    accent: Color,
    code: Color,
    highlight: Style,
    selected: Style,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                muted: Style::default().fg(Color::DarkGray),
                accent: Color::Blue,
                code: Color::Magenta,
                highlight: Style::default().bg(Color::Yellow).fg(Color::Black),
                selected: Style::default().bg(Color::LightBlue).fg(Color::Black),
            },
            Theme::Dark => Self {
                base: Style::default()
                    .fg(Color::Rgb(220, 220, 220))
                    .bg(Color::Rgb(24, 24, 27)),
                muted: Style::default().fg(Color::Gray),
                accent: Color::Cyan,
                code: Color::LightMagenta,
                highlight: Style::default().bg(Color::Yellow).fg(Color::Black),
                selected: Style::default().bg(Color::Blue).fg(Color::White),
            },
        }
    }
}

fn mark_style(marks: Marks, code: Color) -> Style {
    let mut style = Style::default();
    if marks.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if marks.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if marks.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if marks.code {
        style = style.fg(code);
    }
    style
}

/// Split `text` (starting at character `start` of the block) into spans,
/// giving characters inside `matches` the highlight style.
fn push_highlighted(
    line: &mut Line<'static>,
    text: &str,
    start: usize,
    matches: &[Range<usize>],
    style: Style,
    highlight: Style,
) {
    let mut current = String::new();
    let mut current_hit = false;
    for (i, c) in text.chars().enumerate() {
        let hit = matches.iter().any(|m| m.contains(&(start + i)));
        if hit != current_hit && !current.is_empty() {
            let style = if current_hit { style.patch(highlight) } else { style };
            line.spans.push(Span::styled(std::mem::take(&mut current), style));
        }
        current_hit = hit;
        current.push(c);
    }
    if !current.is_empty() {
        let style = if current_hit { style.patch(highlight) } else { style };
        line.spans.push(Span::styled(current, style));
    }
}

fn block_base_style(style: BlockStyle, palette: &Palette) -> Style {
    match style {
        BlockStyle::Plain => Style::default(),
        BlockStyle::Quote => palette.muted.add_modifier(Modifier::ITALIC),
        BlockStyle::Code => Style::default().fg(palette.code),
    }
}

/// Display lines for one stored block.
fn block_lines(rendered: &RenderedBlock, palette: &Palette) -> Vec<Line<'static>> {
    let base = block_base_style(rendered.rich.style, palette);
    let mut lines = vec![Line::default()];
    let mut offset = 0;
    for span in rendered.rich.spans() {
        let style = base.patch(mark_style(span.marks, palette.code));
        for (i, piece) in span.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::default());
                offset += 1;
            }
            if let Some(line) = lines.last_mut() {
                push_highlighted(
                    line,
                    piece,
                    offset,
                    &rendered.matches,
                    style,
                    palette.highlight,
                );
            }
            offset += piece.chars().count();
        }
    }
    lines
}

/// Display lines for the block being edited, with the cursor drawn as a
/// reversed cell.
fn editing_lines(buffer: &EditBuffer, palette: &Palette) -> Vec<Line<'static>> {
    let selection = buffer.selection().unwrap_or(0..0);
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
    let mut lines = vec![Line::default()];
    for (i, c) in buffer.text().chars().enumerate() {
        let style = if i == buffer.cursor() {
            cursor_style
        } else if selection.contains(&i) {
            palette.selected
        } else {
            Style::default()
        };
        if c == '\n' {
            if i == buffer.cursor()
                && let Some(line) = lines.last_mut()
            {
                line.spans.push(Span::styled(" ", cursor_style));
            }
            lines.push(Line::default());
        } else if let Some(line) = lines.last_mut() {
            line.spans.push(Span::styled(c.to_string(), style));
        }
    }
    if buffer.cursor() >= buffer.text().chars().count()
        && let Some(line) = lines.last_mut()
    {
        line.spans.push(Span::styled(" ", cursor_style));
    }
    lines
}

fn with_prefix(
    mut lines: Vec<Line<'static>>,
    first: Vec<Span<'static>>,
    rest: Span<'static>,
) -> Vec<Line<'static>> {
    for (i, line) in lines.iter_mut().enumerate() {
        let mut spans = if i == 0 {
            first.clone()
        } else {
            vec![rest.clone()]
        };
        spans.append(&mut line.spans);
        line.spans = spans;
    }
    lines
}

pub fn draw<S: Store>(f: &mut Frame, app: &mut App<S>) {
    let palette = Palette::for_theme(app.session.workspace().theme);
    f.render_widget(Block::default().style(palette.base), f.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let editor_area = if app.sidebar_collapsed {
        rows[0]
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
            .split(rows[0]);
        draw_sidebar(f, app, columns[0], &palette);
        columns[1]
    };

    draw_editor(f, app, editor_area, &palette);
    draw_status(f, app, rows[1], &palette);

    match &app.mode {
        Mode::History { selected } => draw_history(f, app, *selected, &palette),
        Mode::ConfirmDelete(index) => {
            let title = app
                .session
                .workspace()
                .page(*index)
                .map(|page| page.title.clone())
                .unwrap_or_default();
            let area = centered(f.area(), 50, 3);
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(format!("Delete \"{title}\"? (y/n)")).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Confirm")
                        .style(palette.base),
                ),
                area,
            );
        }
        _ => {}
    }
}

fn pane_block(title: String, focused: bool, palette: &Palette) -> Block<'static> {
    let border = if focused {
        Style::default().fg(palette.accent)
    } else {
        palette.muted
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

fn draw_sidebar<S: Store>(f: &mut Frame, app: &App<S>, area: Rect, palette: &Palette) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let searching = matches!(app.mode, Mode::Search);
    let mut search_line = vec![Span::styled("Search: ", palette.muted), Span::raw(app.search.clone())];
    if searching {
        search_line.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
    }
    f.render_widget(
        Paragraph::new(Line::from(search_line)).block(pane_block(String::new(), searching, palette)),
        parts[0],
    );

    let items: Vec<ListItem> = app
        .page_entries()
        .into_iter()
        .map(|entry| {
            let indent = if entry.is_nested { "    " } else { "" };
            let marker = if entry.is_current { "● " } else { "  " };
            let title = match &app.mode {
                Mode::Rename(RenameTarget::Page(index), buffer) if *index == entry.index => {
                    let mut spans = vec![Span::raw(format!("{indent}{marker}"))];
                    spans.extend(editing_lines(buffer, palette).into_iter().flat_map(|l| l.spans));
                    return ListItem::new(Line::from(spans));
                }
                _ => entry.title,
            };
            ListItem::new(Line::from(format!("{indent}{marker}{title}")))
        })
        .collect();

    let list = List::new(items)
        .block(pane_block("Pages".to_string(), app.pane == Pane::Sidebar, palette))
        .highlight_style(palette.selected);
    let mut state = ListState::default().with_selected(Some(app.sidebar_selected));
    f.render_stateful_widget(list, parts[1], &mut state);
}

fn draw_editor<S: Store>(f: &mut Frame, app: &mut App<S>, area: Rect, palette: &Palette) {
    let title = {
        let page = app.session.workspace().current_page();
        if page.title.is_empty() {
            UNTITLED.to_string()
        } else {
            page.title.clone()
        }
    };
    let rendered = app.session.render_blocks(&app.search);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut selected_span = 0..0;
    for block in &rendered {
        let selected = block.index == app.block_selected && app.pane == Pane::Editor;
        let body = match &app.mode {
            Mode::Editing(buffer) if block.index == app.block_selected => editing_lines(buffer, palette),
            _ => block_lines(block, palette),
        };
        let gutter = if selected {
            Span::styled("▌ ", Style::default().fg(palette.accent))
        } else {
            Span::raw("  ")
        };
        let mut first = vec![gutter.clone()];
        match block.rich.checkbox {
            Some(true) => first.push(Span::styled("[x] ", palette.muted)),
            Some(false) => first.push(Span::raw("[ ] ")),
            None => {}
        }
        if block.rich.style == BlockStyle::Quote {
            first.push(Span::styled("│ ", palette.muted));
        }
        let rest = if selected { gutter } else { Span::raw("  ") };

        let start = lines.len();
        lines.extend(with_prefix(body, first, rest));
        if block.index == app.block_selected {
            selected_span = start..lines.len();
        }
    }

    let height = area.height.saturating_sub(2) as usize;
    let scroll = selected_span.end.saturating_sub(height);

    let editing = matches!(app.mode, Mode::Editing(_));
    let heading = if editing { format!("{title} (editing)") } else { title };
    let editor = Paragraph::new(lines)
        .block(pane_block(heading, app.pane == Pane::Editor, palette))
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    f.render_widget(editor, area);
}

fn hint(mode: &Mode, pane: Pane) -> &'static str {
    match (mode, pane) {
        (Mode::Editing(_), _) => "Esc: done | Enter: new block | Shift+Enter: line break | Ctrl+B/I/U: format",
        (Mode::Search, _) => "Enter: keep | Esc: clear",
        (Mode::Rename(RenameTarget::Page(_), _), _) => "Enter: save title | Esc: cancel",
        (Mode::Rename(RenameTarget::Workspace, _), _) => "Enter: save name | Esc: cancel",
        (Mode::ConfirmDelete(_), _) => "y: delete | any key: cancel",
        (Mode::History { .. }, _) => "↑/↓: choose | Enter: restore | Esc: close",
        (Mode::Normal, Pane::Sidebar) => "↑/↓: open | n: new | c: duplicate | r: rename | R: rename workspace | d: delete | J/K: reorder | q: quit",
        (Mode::Normal, Pane::Editor) => "Enter: edit | o: new block | x: checkbox | J/K: move | Ctrl+H: history | q: quit",
    }
}

fn draw_status<S: Store>(f: &mut Frame, app: &App<S>, area: Rect, palette: &Palette) {
    let name_style = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let mut spans = match &app.mode {
        Mode::Rename(RenameTarget::Workspace, buffer) => {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(
                editing_lines(buffer, palette)
                    .into_iter()
                    .flat_map(|line| line.spans)
                    .map(|span| span.patch_style(name_style)),
            );
            spans.push(Span::raw(" "));
            spans
        }
        _ => vec![Span::styled(
            format!(" {} ", app.session.workspace().app_name),
            name_style,
        )],
    };
    if app.session.is_saving() {
        spans.push(Span::styled("Saving… ", palette.muted));
    }
    match app.session.toast() {
        Some(toast) => spans.push(Span::styled(
            format!("{toast} "),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::styled(hint(&app.mode, app.pane), palette.muted)),
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_history<S: Store>(f: &mut Frame, app: &App<S>, selected: usize, palette: &Palette) {
    let area = centered(f.area(), 70, 20);
    f.render_widget(Clear, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let page = app.session.workspace().current_page();
    let items: Vec<ListItem> = app
        .session
        .history_entries()
        .into_iter()
        .map(|entry| {
            let marker = if entry.ordinal - 1 == page.history.index() { "● " } else { "  " };
            ListItem::new(format!("{marker}{}", entry.label))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("History")
                .style(palette.base),
        )
        .highlight_style(palette.selected);
    let mut state = ListState::default().with_selected(Some(selected));
    f.render_stateful_widget(list, parts[0], &mut state);

    let preview = page
        .history
        .get(selected)
        .map(|snapshot| markup_to_markdown(&snapshot.content))
        .unwrap_or_default();
    f.render_widget(
        Paragraph::new(preview)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Preview")
                    .style(palette.base),
            ),
        parts[1],
    );
}

/// A rect `percent_x` wide and `height` rows tall, centered in `area`.
fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = u32::from(area.width) * u32::from(percent_x.min(100)) / 100;
    let width = u16::try_from(width).unwrap_or(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scriby_engine::Page;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn rendered(markup: &str, query: &str) -> RenderedBlock {
        let mut page = Page::from_content("Test", markup);
        page.render_blocks(query).remove(0)
    }

    #[test]
    fn test_block_lines_split_on_line_breaks() {
        let palette = Palette::for_theme(Theme::Light);
        let lines = block_lines(&rendered("one<br><b>two</b>", ""), &palette);

        assert_eq!(lines.iter().map(text_of).collect::<Vec<_>>(), vec!["one", "two"]);
        assert!(lines[1].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_block_lines_highlight_matches() {
        let palette = Palette::for_theme(Theme::Dark);
        let lines = block_lines(&rendered("find <i>me</i> here", "d m"), &palette);

        let spans: Vec<&str> = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(spans, vec!["fin", "d ", "m", "e", " here"]);
        assert_eq!(lines[0].spans[1].style.bg, Some(Color::Yellow));
        assert_eq!(lines[0].spans[2].style.bg, Some(Color::Yellow));
        assert_eq!(lines[0].spans[3].style.bg, None);
    }

    #[test]
    fn test_editing_lines_draw_cursor() {
        let palette = Palette::for_theme(Theme::Light);
        let mut buffer = EditBuffer::new("ab");
        buffer.move_left(false);

        let lines = editing_lines(&buffer, &palette);
        assert_eq!(text_of(&lines[0]), "ab");
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::REVERSED));

        buffer.end(false);
        let lines = editing_lines(&buffer, &palette);
        assert_eq!(text_of(&lines[0]), "ab ");
    }

    #[test]
    fn test_hint_for_workspace_rename() {
        let mode = Mode::Rename(RenameTarget::Workspace, EditBuffer::new("Scriby"));
        assert_eq!(hint(&mode, Pane::Sidebar), "Enter: save name | Esc: cancel");
    }

    #[test]
    fn test_centered_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 10);
        let rect = centered(area, 50, 20);
        assert_eq!(rect, Rect::new(25, 0, 50, 10));
    }

    #[test]
    fn test_centered_on_very_wide_terminal() {
        let area = Rect::new(0, 0, 2000, 50);
        let rect = centered(area, 60, 12);
        assert_eq!(rect, Rect::new(400, 19, 1200, 12));
    }
}
