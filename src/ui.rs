use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::domain::PeekConfig;
use crate::model::{Model, UIData, page_summary};
use crate::pipeline::PipelineView;
use crate::table::SortDirection;

pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const CMDLINE_HEIGH: u16 = 1;

pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(cfg: &PeekConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [table_area, cmdline_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(CMDLINE_HEIGH)])
                .areas(frame.area());

        self.draw_table(uidata, frame, table_area);
        self.draw_cmdline(uidata, frame, cmdline_area);

        if uidata.show_popup {
            let area = popup_area(frame.area(), 60, 70);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(uidata.popup_message.as_str())
                    .block(Block::bordered().title(" Help ".bold())),
                area,
            );
        }
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let headers = decorated_headers(&uidata.headers, uidata.sort_column, uidata.sort_direction);
        let widths = column_widths(&headers, &uidata.rows, self.max_column_width);

        let header = Row::new(
            headers
                .iter()
                .zip(widths.iter())
                .map(|(h, &w)| Cell::from(get_visible_name(h, w))),
        )
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

        let rows = uidata.rows.iter().map(|row| {
            Row::new(
                widths
                    .iter()
                    .enumerate()
                    .map(|(idx, &w)| Cell::from(get_visible_name(cell(row, idx), w))),
            )
        });

        let mut title = format!(" {} ", uidata.name);
        if !uidata.search_term.is_empty() {
            title.push_str(&format!("[/{}] ", uidata.search_term));
        }

        let table = Table::new(
            rows,
            widths
                .iter()
                .map(|&w| Constraint::Length((w + COLUMN_WIDTH_MARGIN) as u16)),
        )
        .header(header)
        .block(
            Block::bordered()
                .title(Line::from(title.bold()))
                .title_bottom(Line::from(uidata.footer.as_str()).centered()),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .cell_highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow));

        let mut state = TableState::default()
            .with_selected(Some(uidata.selected_row))
            .with_selected_column(Some(uidata.selected_column));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = "/";
            let line = Line::from(vec![prompt.yellow().bold(), uidata.cmdinput.input.as_str().into()]);
            frame.render_widget(Paragraph::new(line), area);
            let curser_x = area.x
                + (prompt.len() + visible_width(&uidata.cmdinput.input, uidata.cmdinput.curser_pos))
                    as u16;
            frame.set_cursor_position(Position::new(curser_x, area.y));
        } else {
            frame.render_widget(
                Paragraph::new(Line::from(uidata.status_message.as_str().italic())),
                area,
            );
        }
    }
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

// Display columns taken by the first `chars` characters of `s`.
fn visible_width(s: &str, chars: usize) -> usize {
    s.chars().take(chars).map(char_width).sum()
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

fn text_width(s: &str) -> usize {
    s.width()
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Header names with a marker on the sorted column.
pub fn decorated_headers(
    headers: &[String],
    sort_column: Option<usize>,
    direction: SortDirection,
) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, h)| match (sort_column, direction) {
            (Some(c), SortDirection::Ascending) if c == idx => format!("{h} ▲"),
            (Some(c), SortDirection::Descending) if c == idx => format!("{h} ▼"),
            _ => h.clone(),
        })
        .collect()
}

/// Widest value per column, capped at `max_column_width`.
pub fn column_widths(headers: &[String], rows: &[Vec<String>], max_column_width: usize) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let widest = rows
                .iter()
                .map(|r| text_width(cell(r, idx)))
                .fold(text_width(h), usize::max);
            widest.min(max_column_width)
        })
        .collect()
}

/// Cut `name` to `width` display columns, marking the cut with `...`.
pub fn get_visible_name(name: &str, width: usize) -> String {
    if text_width(name) <= width {
        return name.to_string();
    }
    if width < 3 {
        return ".".repeat(width);
    }
    let mut reduced_name = String::new();
    let mut used = 0;
    for c in name.chars() {
        let w = char_width(c);
        if used + w > width - 3 {
            break;
        }
        used += w;
        reduced_name.push(c);
    }
    reduced_name.push_str("...");
    reduced_name
}

fn pad(s: &str, width: usize) -> String {
    let visible = get_visible_name(s, width);
    let fill = width.saturating_sub(text_width(&visible));
    format!("{visible}{}", " ".repeat(fill))
}

/// Plain text rendering of one page, used when printing to stdout.
pub fn render_text(
    view: &PipelineView,
    sort_column: Option<usize>,
    sort_direction: SortDirection,
    total_rows: usize,
    max_column_width: usize,
) -> String {
    let headers = decorated_headers(&view.table.headers, sort_column, sort_direction);
    let widths = column_widths(&headers, &view.table.rows, max_column_width);
    let separator = " ".repeat(COLUMN_WIDTH_MARGIN);

    let render_row = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, &w)| pad(c, w))
            .collect::<Vec<String>>()
            .join(separator.as_str())
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(view.table.rows.len() + 3);
    if !headers.is_empty() {
        lines.push(render_row(headers.iter().map(String::as_str).collect()));
        lines.push(
            widths
                .iter()
                .map(|&w| "-".repeat(w))
                .collect::<Vec<String>>()
                .join(separator.as_str()),
        );
    }
    for row in view.table.rows.iter() {
        lines.push(render_row((0..widths.len()).map(|idx| cell(row, idx)).collect()));
    }
    lines.push(page_summary(view, total_rows));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::pipeline::{PipelineParams, run};

    #[test]
    fn visible_names() {
        assert_eq!(get_visible_name("short", 10), "short");
        assert_eq!(get_visible_name("a long header", 8), "a lon...");
        assert_eq!(get_visible_name("abcdef", 2), "..");
        assert_eq!(get_visible_name("業務部門經理", 7), "業務...");
    }

    #[test]
    fn terminal_widths() {
        assert_eq!(text_width("abc"), 3);
        assert_eq!(text_width("業務"), 4);
        assert_eq!(text_width("𠮷"), 2);
        assert_eq!(text_width("😀"), 2);
        assert_eq!(text_width("e\u{301}"), 1);
        assert_eq!(visible_width("𠮷a", 1), 2);
        assert_eq!(get_visible_name("𠮷𠮷𠮷𠮷", 7), "𠮷𠮷...");
    }

    #[test]
    fn widths_are_capped() {
        let headers = vec!["id".to_string(), "text".to_string()];
        let rows = vec![vec!["1".to_string(), "x".repeat(100)]];
        assert_eq!(column_widths(&headers, &rows, 20), vec![2, 20]);
        assert_eq!(column_widths(&headers, &[], 20), vec![2, 4]);
    }

    #[test]
    fn sort_marker() {
        let headers = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            decorated_headers(&headers, Some(1), SortDirection::Descending),
            vec!["a", "b ▼"]
        );
        assert_eq!(decorated_headers(&headers, None, SortDirection::Ascending), headers);
    }

    #[test]
    fn render_page() {
        let table = parse("name,age\nann,30\nbob,4\ncid,25\n");
        let params = PipelineParams::new(2)
            .with_sort_column(Some(1))
            .with_page(2);
        let view = run(&table, &params);
        let text = render_text(&view, params.sort_column, params.sort_direction, 3, 40);
        assert_eq!(
            text,
            "name age ▲\n---- -----\nann  30\nPage 2/2 · rows 3-3 of 3 (of 3 total)"
        );
    }

    #[test]
    fn render_empty_table() {
        let view = run(&parse(""), &PipelineParams::default());
        let text = render_text(&view, None, SortDirection::Ascending, 0, 40);
        assert_eq!(text, "Page 1/1 · no rows (of 0 total)");
    }
}
