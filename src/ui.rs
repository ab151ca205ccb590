use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};

use crate::export::{DataAmount, ExportDialog, ExportFormat, SELECT_FORMAT_NOTICE};
use crate::model::{Model, Modus, UIData};
use crate::records::OPERATORS;
use crate::schedule::{MAX_MESSAGE_LEN, ScheduleField};
use crate::stats::group_thousands;

pub const HEADER_HEIGHT: usize = 2;
pub const FOOTER_HEIGHT: usize = 2;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const MIN_PARTIAL_COLUMN_WIDTH: usize = 3;
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DashUI {
    table_state: TableState,
    list_state: ListState,
}

impl DashUI {
    pub fn new() -> Self {
        Self {
            table_state: TableState::default(),
            list_state: ListState::default(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [header, table, footer] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT as u16),
            Constraint::Min(TABLE_HEADER_HEIGHT as u16 + 2),
            Constraint::Length(FOOTER_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.draw_header(uidata, frame, header);
        self.draw_table(uidata, frame, table);
        self.draw_footer(model, uidata, frame, footer);

        let modus = match model.modus() {
            Modus::Input => model.previous_modus(),
            m => m,
        };
        match modus {
            Modus::Table | Modus::Input => {}
            Modus::Operators => self.draw_operators(model, frame),
            Modus::Columns => self.draw_drawer(model, frame),
            Modus::Export => self.draw_export(model, frame),
            Modus::Schedules => self.draw_schedules(model, frame),
            Modus::Reports => self.draw_reports(model, frame),
            Modus::Popup => self.draw_popup(model, frame),
        }
    }

    fn draw_header(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let kpis = Line::from(vec![
            " Revenue ".into(),
            uidata.revenue.clone().bold().green(),
            "   Transactions ".into(),
            uidata.transactions.clone().bold(),
            format!("   of {}", group_thousands(uidata.total_rows as u64)).dark_gray(),
        ]);

        let mut filters = vec![
            " Operators: ".into(),
            uidata.operators.clone().yellow(),
        ];
        for badge in &uidata.operator_badges {
            filters.push(" ".into());
            filters.push(format!("[{badge}]").cyan());
        }
        filters.push("   Date: ".into());
        filters.push(uidata.date_range.clone().yellow());

        frame.render_widget(Paragraph::new(vec![kpis, Line::from(filters)]), area);
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(Line::from(format!(" {} ", uidata.name).bold()).centered())
            .border_set(border::PLAIN);

        let nrows = uidata.table.first().map_or(0, |c| c.data.len());
        if nrows == 0 {
            let text = if uidata.table.is_empty() {
                "No columns visible. Press c to choose columns."
            } else {
                "No transactions match the current filter."
            };
            frame.render_widget(Paragraph::new(text).centered().block(block), area);
            return;
        }

        let header = Row::new(uidata.table.iter().map(|c| {
            let name = fit(&c.name, c.width);
            if c.sticky {
                Cell::from(name).bold().underlined()
            } else {
                Cell::from(name).bold()
            }
        }));

        let selected_cell = Style::new().fg(Color::Black).bg(Color::Yellow);
        let rows = (0..nrows).map(|r| {
            Row::new(uidata.table.iter().enumerate().map(|(ci, c)| {
                let cell = Cell::from(fit(&c.data[r], c.width));
                if r == uidata.selected_row && uidata.selected_column == Some(ci) {
                    cell.style(selected_cell)
                } else {
                    cell
                }
            }))
        });
        let widths = uidata.table.iter().map(|c| Constraint::Length(c.width as u16));

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .block(block);

        self.table_state.select(Some(uidata.selected_row));
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_footer(&self, model: &Model, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [pages, status] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

        let control = |label: &'static str, enabled: bool| -> Span<'static> {
            if enabled { label.bold() } else { label.dark_gray() }
        };
        let range = if uidata.nrows == 0 {
            "0".to_string()
        } else {
            let first = (uidata.page - 1) * uidata.page_size + 1;
            let last = std::cmp::min(uidata.page * uidata.page_size, uidata.nrows);
            format!("{first}-{last}")
        };
        let pagination = Line::from(vec![
            " ".into(),
            control("« First", uidata.can_first),
            "  ".into(),
            control("‹ Prev", uidata.can_prev),
            format!("   Page {} of {}   ", uidata.page, uidata.total_pages).into(),
            control("Next ›", uidata.can_next),
            "  ".into(),
            control("Last »", uidata.can_last),
            format!("   Rows per page: {}", uidata.page_size).into(),
            format!("   Showing {} of {}", range, group_thousands(uidata.nrows as u64)).dark_gray(),
        ]);
        frame.render_widget(Paragraph::new(pagination), pages);

        let line = if model.last_status_message_update().elapsed() < STATUS_MESSAGE_TIMEOUT
            && !model.status_message().is_empty()
        {
            Line::from(format!(" {}", model.status_message()).yellow())
        } else {
            Line::from(" ? help  q quit".dark_gray())
        };
        frame.render_widget(Paragraph::new(line), status);
    }

    fn draw_operators(&self, model: &Model, frame: &mut Frame) {
        let lines: Vec<Line> = OPERATORS
            .iter()
            .enumerate()
            .map(|(idx, op)| {
                let check = if model.filter().is_selected(op.value) { "[x]" } else { "[ ]" };
                highlight(Line::from(format!(" {check} {}", op.label)), idx == model.operator_curser())
            })
            .collect();
        let area = popup_area(frame.area(), 40, OPERATORS.len() as u16 + 2);
        let block = dialog_block(" Operators ", " space toggle  x clear  esc close ");
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_drawer(&mut self, model: &Model, frame: &mut Frame) {
        let drawer = model.drawer();
        let items: Vec<ListItem> = drawer
            .columns()
            .iter()
            .map(|c| {
                let check = if c.visible { "[x]" } else { "[ ]" };
                let pinned = if c.sticky { " (pinned)" } else { "" };
                ListItem::new(format!("{check} {}{pinned}", c.label))
            })
            .collect();

        let [_, area] = Layout::horizontal([Constraint::Min(0), Constraint::Length(44)]).areas(frame.area());
        let block = dialog_block(" Column settings ", " space toggle  a apply  esc cancel ");
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        self.list_state.select(Some(drawer.curser()));
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_export(&self, model: &Model, frame: &mut Frame) {
        let dialog = model.export_dialog();
        let nrows = model.filtered_rows().len();
        let mut lines = vec![Line::from(" Format".bold())];
        for (idx, format) in ExportFormat::ALL.iter().enumerate() {
            let check = if dialog.is_selected(*format) { "[x]" } else { "[ ]" };
            lines.push(highlight(
                Line::from(format!("  {check} {}", format.label())),
                idx == dialog.curser(),
            ));
        }

        let all = ExportFormat::ALL.len();
        let (all_mark, limited_mark) = match dialog.amount() {
            DataAmount::All => ("(•)", "( )"),
            DataAmount::Limited(_) => ("( )", "(•)"),
        };
        lines.push(Line::from(""));
        lines.push(Line::from(" Data amount".bold()));
        lines.push(highlight(
            Line::from(format!("  {all_mark} All transactions ({})", group_thousands(nrows as u64))),
            dialog.curser() == all,
        ));
        lines.push(highlight(
            Line::from(format!(
                "  {limited_mark} First {} transactions",
                group_thousands(dialog.row_limit() as u64)
            )),
            dialog.curser() == ExportDialog::ROWS - 1,
        ));
        lines.push(Line::from(""));
        if dialog.can_download() {
            lines.push(Line::from(" enter download".green()));
        } else {
            lines.push(Line::from(format!(" {SELECT_FORMAT_NOTICE}").red()));
        }

        let area = popup_area(frame.area(), 46, lines.len() as u16 + 2);
        let block = dialog_block(" Download ", " space toggle  a/A all/none  esc close ");
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_schedules(&self, model: &Model, frame: &mut Frame) {
        let editor = model.editor();
        let area = popup_area(frame.area(), 72, 18);
        frame.render_widget(Clear, area);

        let Some(draft) = editor.draft() else {
            let mut lines: Vec<Line> = model
                .schedules()
                .list()
                .iter()
                .enumerate()
                .map(|(idx, s)| {
                    let line = format!(
                        " {}  ({} to {} recipient(s), created {})",
                        s.summary(),
                        s.format,
                        s.recipients.len(),
                        s.created.format("%b %d, %Y")
                    );
                    highlight(Line::from(line), idx == editor.list_curser())
                })
                .collect();
            if model.schedules().is_empty() {
                lines.push(Line::from(" No delivery schedules yet. Press n to create one.".dark_gray()));
            }
            let block = dialog_block(" Delivery schedules ", " n new  e edit  D delete  esc close ");
            frame.render_widget(Paragraph::new(lines).block(block), area);
            return;
        };

        let input = (model.modus() == Modus::Input)
            .then(|| model.input_field())
            .flatten();
        let mut lines = Vec::new();
        let mut curser = None;
        for (row, field) in ScheduleField::ALL.iter().enumerate() {
            let value = match field {
                ScheduleField::Format => format!("‹ {} ›", draft.format),
                ScheduleField::Recurrence => format!("‹ {} ›", draft.recurrence.label()),
                ScheduleField::Time => format!("‹ {} ›", draft.time.label()),
                ScheduleField::TimeZone => format!("‹ {} ›", draft.time_zone.label()),
                ScheduleField::IncludeLinks => {
                    (if draft.include_links { "[x]" } else { "[ ]" }).to_string()
                }
                ScheduleField::Message => format!(
                    "{}  ({}/{MAX_MESSAGE_LEN})",
                    editor.text(*field),
                    editor.text(*field).chars().count()
                ),
                _ => editor.text(*field).to_string(),
            };
            let label = format!(" {:<20}", field.label());
            let line = if input == Some(*field) {
                let result = model.input();
                curser = Some((label.chars().count() + result.curser_pos, row));
                Line::from(vec![label.into(), result.input.clone().underlined()])
            } else {
                Line::from(format!("{label}{value}"))
            };
            lines.push(highlight(line, editor.field() == Some(*field) && input.is_none()));
        }

        let title = if editor.editing_id().is_some() {
            " Edit delivery schedule "
        } else {
            " New delivery schedule "
        };
        let block = dialog_block(title, " enter edit  ←/→ change  ctrl-s save  ctrl-t test  esc cancel ");
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);

        if let Some((x, y)) = curser {
            frame.set_cursor_position((area.x + 1 + x as u16, area.y + 1 + y as u16));
        }
    }

    fn draw_reports(&self, model: &Model, frame: &mut Frame) {
        let reports = model.reports();
        let mut lines = vec![
            Line::from(vec![" Month: ".into(), format!("‹ {} ›", reports.month_label()).yellow()]),
            Line::from(""),
        ];
        for (idx, report) in reports.reports().iter().enumerate() {
            let formats: Vec<String> = report
                .formats
                .iter()
                .map(|f| {
                    if reports.is_downloading(report.id, *f) {
                        format!("{f} (downloading…)")
                    } else {
                        f.to_string()
                    }
                })
                .collect();
            let title = format!(" {:<22}{}", report.title, formats.join(" | "));
            lines.push(highlight(Line::from(title), idx == reports.curser()));
            lines.push(Line::from(format!("   {}", report.description).dark_gray()));
        }

        let area = popup_area(frame.area(), 70, lines.len() as u16 + 2);
        let block = dialog_block(" Reports ", " ←/→ month  x excel  p pdf  esc close ");
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_popup(&self, model: &Model, frame: &mut Frame) {
        let text = Text::from(model.popup_message());
        let area = popup_area(frame.area(), 84, text.height() as u16 + 2);
        let block = dialog_block(" Help ", " esc close ");
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(text).block(block), area);
    }
}

fn dialog_block<'a>(title: &'a str, hint: &'a str) -> Block<'a> {
    Block::bordered()
        .title(Line::from(title.bold()).centered())
        .title_bottom(Line::from(hint.dark_gray()).centered())
        .border_set(border::ROUNDED)
}

fn highlight(line: Line<'_>, selected: bool) -> Line<'_> {
    if selected { line.reversed() } else { line }
}

/// Centered area of at most `width` x `height` cells.
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}

/// Cuts `s` to `width` characters, marking the cut with an ellipsis.
fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::RecordShape;
    use crate::domain::{DashConfig, Message};
    use crate::records::RecordStore;
    use chrono::NaiveDate;
    use ratatui::{Terminal, backend::TestBackend};

    fn render(model: &Model, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let mut ui = DashUI::new();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn model(rows: usize) -> Model {
        let today = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
        let normal = RecordStore::generate(RecordShape::Normal, rows, 5, today);
        let reservation = RecordStore::empty();
        Model::init(&DashConfig::default(), normal, reservation, today, 140, 30).unwrap()
    }

    #[test]
    fn fit_cuts_long_cells() {
        assert_eq!(fit("Stockholm", 20), "Stockholm");
        assert_eq!(fit("Stockholm", 6), "Stock…");
    }

    #[test]
    fn renders_pagination_and_kpis() {
        let screen = render(&model(23), 140, 30);
        assert!(screen.contains("Page 1 of 3"));
        assert!(screen.contains("Revenue"));
        assert!(screen.contains("Supplier name"));
        assert!(screen.contains("Sep 08, 2025 - Sep 15, 2025"));
    }

    #[test]
    fn renders_empty_table_message() {
        let screen = render(&model(0), 140, 30);
        assert!(screen.contains("No transactions match"));
        assert!(screen.contains("Page 1 of 1"));
    }

    #[test]
    fn renders_export_notice_without_formats() {
        let mut model = model(3);
        model.update(Some(Message::Export)).unwrap();
        model.update(Some(Message::DeselectAll)).unwrap();
        let screen = render(&model, 140, 30);
        assert!(screen.contains(SELECT_FORMAT_NOTICE));
    }
}
