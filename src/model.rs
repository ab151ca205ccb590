use arboard::Clipboard;
use chrono::NaiveDate;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::columns::{ColumnDescriptor, ColumnRegistry, RecordShape};
use crate::domain::{DashConfig, DashError, HELP_TEXT, Message};
use crate::drawer::ColumnDrawer;
use crate::export::{self, ExportDialog, ExportFormat, ExportIntent};
use crate::filter::{self, DateRange, FilterState};
use crate::inputter::{InputResult, Inputter};
use crate::pagination::Pager;
use crate::records::{OPERATORS, RecordStore, operator_label};
use crate::reports::ReportsView;
use crate::schedule::{ScheduleEditor, ScheduleField, ScheduleRegistry};
use crate::stats::{Summary, group_thousands};
use crate::ui::{
    COLUMN_WIDTH_MARGIN, FOOTER_HEIGHT, HEADER_HEIGHT, MIN_PARTIAL_COLUMN_WIDTH,
    TABLE_HEADER_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modus {
    Table,
    Operators,
    Columns,
    Export,
    Schedules,
    Reports,
    Popup,
    Input,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub sticky: bool,
    pub data: Vec<String>,
}

/// Everything the UI needs to draw the transaction table.
#[derive(Clone, Debug)]
pub struct UIData {
    pub name: String,
    pub table: Vec<ColumnView>,
    /// Index into `table` of the selected column, if it is rendered.
    pub selected_column: Option<usize>,
    pub selected_row: usize,
    pub nrows: usize,
    pub total_rows: usize,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub can_first: bool,
    pub can_prev: bool,
    pub can_next: bool,
    pub can_last: bool,
    pub operators: String,
    pub operator_badges: Vec<&'static str>,
    pub date_range: String,
    pub revenue: String,
    pub transactions: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            table: Vec::new(),
            selected_column: None,
            selected_row: 0,
            nrows: 0,
            total_rows: 0,
            page: 1,
            total_pages: 1,
            page_size: 0,
            can_first: false,
            can_prev: false,
            can_next: false,
            can_last: false,
            operators: String::new(),
            operator_badges: Vec::new(),
            date_range: String::new(),
            revenue: String::new(),
            transactions: String::new(),
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_width: ui_width.saturating_sub(2),
            table_height: ui_height
                .saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT + TABLE_HEADER_HEIGHT + 2),
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

/// Store and column registry of one record shape.
struct ShapeData {
    store: RecordStore,
    registry: ColumnRegistry,
}

pub struct Model {
    config: DashConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    today: NaiveDate,
    shape: RecordShape,
    normal: ShapeData,
    reservation: ShapeData,
    filter: FilterState,
    rows: Vec<usize>, // Store indices of the filtered records
    pager: Pager,
    curser_row: usize,    // Row within the current page
    curser_column: usize, // Index into the visible columns
    offset_column: usize, // First scrolled (non pinned) visible column
    operator_curser: usize,
    drawer: ColumnDrawer,
    export: ExportDialog,
    export_log: Vec<ExportIntent>,
    schedules: ScheduleRegistry,
    editor: ScheduleEditor,
    reports: ReportsView,
    input: Inputter,
    input_field: Option<ScheduleField>,
    last_input: InputResult,
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    popup_message: String,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: &DashConfig,
        normal: RecordStore,
        reservation: RecordStore,
        today: NaiveDate,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, DashError> {
        let mut model = Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            today,
            shape: config.shape,
            normal: ShapeData {
                store: normal,
                registry: ColumnRegistry::for_shape(RecordShape::Normal)?,
            },
            reservation: ShapeData {
                store: reservation,
                registry: ColumnRegistry::for_shape(RecordShape::Reservation)?,
            },
            filter: FilterState::new(Some(DateRange::last_week(today))),
            rows: Vec::new(),
            pager: Pager::new(config.page_size),
            curser_row: 0,
            curser_column: 0,
            offset_column: 0,
            operator_curser: 0,
            drawer: ColumnDrawer::default(),
            export: ExportDialog::new(config.export_row_limit),
            export_log: Vec::new(),
            schedules: ScheduleRegistry::default(),
            editor: ScheduleEditor::default(),
            reports: ReportsView::new(Duration::from_millis(config.download_delay_ms)),
            input: Inputter::default(),
            input_field: None,
            last_input: InputResult::default(),
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard: None,
            popup_message: String::new(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.apply_filter();
        let total = model.active().store.len();
        model.set_status_message(format!("Loaded {} {} transactions", total, model.shape));
        Ok(model)
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DashError> {
        if let Some(done) = self.reports.tick(Instant::now()) {
            self.set_status_message(format!(
                "Report {} for {} downloaded as {}",
                done.report, done.month, done.format
            ));
        }

        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);

        if let Message::Resize(width, height) = msg {
            self.ui_resize(width, height);
            return Ok(());
        }

        match self.modus {
            Modus::Table => match msg {
                Message::Quit => self.quit(),
                Message::Help => self.show_help(),
                Message::MoveUp => self.move_table_selection_up(),
                Message::MoveDown => self.move_table_selection_down(),
                Message::MoveLeft => self.move_table_selection_left(),
                Message::MoveRight => self.move_table_selection_right(),
                Message::FirstPage => self.change_page(|p, _| p.first()),
                Message::PrevPage => self.change_page(|p, n| p.prev(n)),
                Message::NextPage => self.change_page(|p, n| p.next(n)),
                Message::LastPage => self.change_page(|p, n| p.last(n)),
                Message::CyclePageSize => self.cycle_page_size(),
                Message::ToggleShape => self.toggle_shape(),
                Message::Operators => self.enter_modus(Modus::Operators),
                Message::Columns => {
                    let registry = self.active().registry.clone();
                    self.drawer.open(&registry);
                    self.enter_modus(Modus::Columns);
                }
                Message::Export => {
                    self.export.open();
                    self.enter_modus(Modus::Export);
                }
                Message::Schedules => {
                    self.editor.open();
                    self.enter_modus(Modus::Schedules);
                }
                Message::Reports => self.enter_modus(Modus::Reports),
                Message::QuickCsv => {
                    let intent = export::quick_csv(self.rows.len());
                    self.record_exports(vec![intent]);
                }
                Message::CopyCell => self.copy_table_cell(),
                Message::CopyRow => self.copy_table_row(),
                _ => (),
            },
            Modus::Operators => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.operator_curser = self.operator_curser.saturating_sub(1),
                Message::MoveDown => {
                    self.operator_curser = std::cmp::min(self.operator_curser + 1, OPERATORS.len() - 1)
                }
                Message::Toggle | Message::Enter => {
                    self.filter.toggle_operator(OPERATORS[self.operator_curser].value);
                    self.apply_filter();
                }
                Message::ClearOperators => {
                    self.filter.clear_operators();
                    self.apply_filter();
                }
                Message::Exit => self.exit(),
                _ => (),
            },
            Modus::Columns => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.drawer.move_up(),
                Message::MoveDown => self.drawer.move_down(),
                Message::Toggle => self.drawer.toggle_selected(),
                Message::Apply | Message::Enter => self.apply_columns(),
                Message::Exit => self.exit(),
                _ => (),
            },
            Modus::Export => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.export.move_up(),
                Message::MoveDown => self.export.move_down(),
                Message::Toggle => self.export.toggle_selected(),
                Message::SelectAll => self.export.select_all(),
                Message::DeselectAll => self.export.deselect_all(),
                Message::Enter => self.confirm_export(),
                Message::Exit => self.exit(),
                _ => (),
            },
            Modus::Schedules => self.update_schedules(msg),
            Modus::Reports => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.reports.move_up(),
                Message::MoveDown => self.reports.move_down(),
                Message::MoveLeft => self.reports.step_month(false),
                Message::MoveRight => self.reports.step_month(true),
                Message::DownloadExcel => self.download_report(ExportFormat::Excel),
                Message::DownloadPdf => self.download_report(ExportFormat::Pdf),
                Message::Exit => self.exit(),
                _ => (),
            },
            Modus::Popup => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter => self.exit(),
                _ => (),
            },
            Modus::Input => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key)
                }
            }
        }

        self.update_table_data();
        Ok(())
    }

    // -------------------- Accessors for the UI and controller ---------------------- //

    pub fn modus(&self) -> Modus {
        self.modus
    }

    /// Mode underneath a popup or the text input.
    pub fn previous_modus(&self) -> Modus {
        self.previous_modus
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::Input
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    #[cfg(test)]
    pub fn shape(&self) -> RecordShape {
        self.shape
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn filtered_rows(&self) -> &[usize] {
        &self.rows
    }

    #[cfg(test)]
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    #[cfg(test)]
    pub fn registry(&self) -> &ColumnRegistry {
        &self.active().registry
    }

    pub fn operator_curser(&self) -> usize {
        self.operator_curser
    }

    pub fn drawer(&self) -> &ColumnDrawer {
        &self.drawer
    }

    pub fn export_dialog(&self) -> &ExportDialog {
        &self.export
    }

    pub fn export_log(&self) -> &[ExportIntent] {
        &self.export_log
    }

    pub fn schedules(&self) -> &ScheduleRegistry {
        &self.schedules
    }

    pub fn editor(&self) -> &ScheduleEditor {
        &self.editor
    }

    pub fn reports(&self) -> &ReportsView {
        &self.reports
    }

    pub fn input(&self) -> &InputResult {
        &self.last_input
    }

    pub fn input_field(&self) -> Option<ScheduleField> {
        self.input_field
    }

    pub fn popup_message(&self) -> &str {
        &self.popup_message
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    // -------------------- Table state ---------------------- //

    fn active(&self) -> &ShapeData {
        match self.shape {
            RecordShape::Normal => &self.normal,
            RecordShape::Reservation => &self.reservation,
        }
    }

    fn active_mut(&mut self) -> &mut ShapeData {
        match self.shape {
            RecordShape::Normal => &mut self.normal,
            RecordShape::Reservation => &mut self.reservation,
        }
    }

    fn visible_columns(&self) -> Vec<&ColumnDescriptor> {
        filter::visible_columns(&self.active().registry)
    }

    /// Recomputes the filtered rows. The page resets because the old index may not exist anymore.
    fn apply_filter(&mut self) {
        let start_time = Instant::now();
        self.rows = filter::filter_rows(&self.active().store, &self.filter);
        self.pager.reset();
        self.curser_row = 0;
        debug!(
            "Filter {:?} matched {} of {} rows in {}us",
            self.filter.operators(),
            self.rows.len(),
            self.active().store.len(),
            start_time.elapsed().as_micros()
        );
        self.update_table_data();
    }

    fn page_len(&self) -> usize {
        self.pager.range(self.rows.len()).len()
    }

    fn clamp_curser_row(&mut self) {
        self.curser_row = std::cmp::min(self.curser_row, self.page_len().saturating_sub(1));
    }

    fn change_page(&mut self, step: impl FnOnce(&mut Pager, usize)) {
        step(&mut self.pager, self.rows.len());
        self.clamp_curser_row();
    }

    fn cycle_page_size(&mut self) {
        let size = self.pager.page_size().cycle();
        self.pager.set_page_size(size, self.rows.len());
        self.clamp_curser_row();
        self.set_status_message(format!("{} rows per page", size));
    }

    fn toggle_shape(&mut self) {
        self.shape = self.shape.toggle();
        self.curser_column = 0;
        self.offset_column = 0;
        self.apply_filter();
        let total = self.active().store.len();
        self.set_status_message(format!("{} transactions ({})", self.shape, total));
    }

    fn apply_columns(&mut self) {
        let mut drawer = std::mem::take(&mut self.drawer);
        if drawer.apply(&mut self.active_mut().registry) {
            let visible = self.visible_columns().len();
            self.curser_column = std::cmp::min(self.curser_column, visible.saturating_sub(1));
            self.offset_column = std::cmp::min(self.offset_column, self.curser_column);
            self.set_status_message(format!("Showing {} columns", visible));
        }
        self.drawer = drawer;
        self.close_modus();
    }

    fn confirm_export(&mut self) {
        match self.export.confirm(self.rows.len()) {
            Ok(intents) => {
                self.record_exports(intents);
                self.close_modus();
            }
            Err(notice) => self.set_status_message(notice),
        }
    }

    fn record_exports(&mut self, intents: Vec<ExportIntent>) {
        let formats = intents
            .iter()
            .map(|i| i.format.label())
            .collect::<Vec<&str>>()
            .join(", ");
        let amount = match intents.first().and_then(|i| i.row_cap) {
            Some(cap) => format!("first {}", group_thousands(cap as u64)),
            None => "all".to_string(),
        };
        self.set_status_message(format!("Exporting {amount} transactions as {formats}"));
        self.export_log.extend(intents);
    }

    fn download_report(&mut self, format: ExportFormat) {
        match self.reports.download(format, Instant::now()) {
            Ok(d) => {
                let message = format!("Downloading report {} for {} ...", d.report, d.month);
                self.set_status_message(message);
            }
            Err(notice) => self.set_status_message(notice),
        }
    }

    // -------------------- Schedules ---------------------- //

    fn update_schedules(&mut self, msg: Message) {
        if self.editor.is_editing() {
            match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.editor.move_up(),
                Message::MoveDown => self.editor.move_down(&self.schedules),
                Message::MoveLeft => self.editor.cycle_field(false),
                Message::MoveRight | Message::Toggle => self.editor.cycle_field(true),
                Message::Enter => self.enter_text_field(),
                Message::Save => match self.editor.save(&mut self.schedules, self.today) {
                    Ok(id) => {
                        let summary = self
                            .schedules
                            .get(id)
                            .map(|s| s.summary())
                            .unwrap_or_default();
                        self.set_status_message(format!("Delivery schedule saved: {summary}"));
                    }
                    Err(notice) => self.set_status_message(notice.to_string()),
                },
                Message::TestNow => {
                    if let Some(delivery) = self.editor.test_now() {
                        self.set_status_message(format!(
                            "Test email sent to {} address(es)",
                            delivery.recipients.len()
                        ));
                    }
                }
                Message::Exit => self.editor.cancel(),
                _ => (),
            }
        } else {
            match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.editor.move_up(),
                Message::MoveDown => self.editor.move_down(&self.schedules),
                Message::New => self.editor.create_new(),
                Message::Edit | Message::Enter => {
                    self.editor.edit_selected(&self.schedules);
                }
                Message::Delete => {
                    if let Some(id) = self.editor.delete_selected(&mut self.schedules) {
                        self.set_status_message(format!("Deleted schedule {id}"));
                    }
                }
                Message::Exit => self.exit(),
                _ => (),
            }
        }
    }

    fn enter_text_field(&mut self) {
        let Some(field) = self.editor.field().filter(|f| f.is_text()) else {
            return;
        };
        trace!("Editing schedule field {:?}", field);
        self.input.start(self.editor.text(field), field.max_len());
        self.last_input = self.input.get();
        self.input_field = Some(field);
        self.previous_modus = self.modus;
        self.modus = Modus::Input;
    }

    fn raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            if let Some(field) = self.input_field.take()
                && !self.last_input.canceled
            {
                self.editor.set_text(field, self.last_input.input.clone());
            }
            self.input.clear();
            self.modus = self.previous_modus;
            self.previous_modus = Modus::Input;
        }
    }

    // -------------------- Modus handling ---------------------- //

    fn enter_modus(&mut self, modus: Modus) {
        self.previous_modus = self.modus;
        self.modus = modus;
    }

    fn close_modus(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Table;
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::Table | Modus::Input => {}
            Modus::Operators => self.close_modus(),
            Modus::Columns => {
                self.drawer.cancel();
                self.close_modus();
            }
            Modus::Export => self.close_modus(),
            Modus::Schedules => {
                self.editor.close();
                self.close_modus();
            }
            Modus::Reports => {
                self.reports.teardown();
                self.close_modus();
            }
            Modus::Popup => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::Popup;
            }
        }
    }

    fn show_help(&mut self) {
        self.popup_message = HELP_TEXT.to_string();
        self.enter_modus(Modus::Popup);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        info!("{}", self.status_message);
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.update_table_data();
    }

    // -------------------- Navigation ---------------------- //

    fn move_table_selection_up(&mut self) {
        self.curser_row = self.curser_row.saturating_sub(1);
    }

    fn move_table_selection_down(&mut self) {
        if self.curser_row + 1 < self.page_len() {
            self.curser_row += 1;
        }
    }

    fn move_table_selection_left(&mut self) {
        if self.curser_column == 0 {
            return;
        }
        self.curser_column -= 1;
        let pinned = self
            .visible_columns()
            .get(self.curser_column)
            .is_some_and(|c| c.sticky);
        if self.curser_column < self.offset_column && !pinned {
            self.offset_column = self.curser_column;
        }
    }

    fn move_table_selection_right(&mut self) {
        if self.curser_column + 1 < self.visible_columns().len() {
            self.curser_column += 1;
        }
    }

    // -------------------- Clipboard ---------------------- //

    fn selected_record_cells(&self) -> Option<Vec<&str>> {
        let page = self.pager.page(&self.rows);
        let record = self.active().store.get(*page.get(self.curser_row)?)?;
        Some(
            self.visible_columns()
                .iter()
                .map(|c| record.cell(&c.id))
                .collect(),
        )
    }

    fn copy_table_cell(&mut self) {
        let cell = self
            .selected_record_cells()
            .and_then(|cells| cells.get(self.curser_column).map(|c| c.to_string()));
        if let Some(cell) = cell {
            trace!("Cell content: {}", cell);
            self.copy_to_clipboard(cell);
        }
    }

    fn copy_table_row(&mut self) {
        let row = self.selected_record_cells().map(|cells| {
            cells
                .iter()
                .map(|c| wrap_cell_content(c))
                .collect::<Vec<String>>()
                .join(",")
        });
        if let Some(row) = row {
            self.copy_to_clipboard(row);
        }
    }

    fn copy_to_clipboard(&mut self, content: String) {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(c) => self.clipboard = Some(c),
                Err(e) => {
                    debug!("No clipboard available: {:?}", e);
                    self.set_status_message("Clipboard not available");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(content) {
                Ok(_) => self.set_status_message("Copied to clipboard"),
                Err(e) => {
                    trace!("Error copying to clipboard: {:?}", e);
                    self.set_status_message("Copy failed");
                }
            }
        }
    }

    // -------------------- View building ---------------------- //

    fn update_table_data(&mut self) {
        let visible = self.visible_columns();
        let range = self.pager.range(self.rows.len());
        let page_rows = &self.rows[range];
        let store = &self.active().store;

        // Full width of every visible column over the rows of this page
        let columns: Vec<(usize, ColumnView)> = visible
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let data: Vec<String> = page_rows
                    .iter()
                    .filter_map(|&r| store.get(r))
                    .map(|r| r.cell(&c.id).to_string())
                    .collect();
                let content = data.iter().map(|d| d.chars().count()).max().unwrap_or(0);
                let width = std::cmp::max(c.label.chars().count(), content) + COLUMN_WIDTH_MARGIN;
                let view = ColumnView {
                    name: c.label.clone(),
                    width: std::cmp::min(width, self.config.max_column_width),
                    sticky: c.sticky,
                    data,
                };
                (idx, view)
            })
            .collect();

        let nrows = self.rows.len();
        let total_rows = store.len();
        let summary = Summary::of(store, &self.rows, self.shape.amount_field());

        // Scroll until the selected column is rendered
        let mut offset = std::cmp::min(self.offset_column, self.curser_column);
        let mut fitted = fit_columns(&columns, offset, self.uilayout.table_width);
        while !fitted.iter().any(|&(idx, _)| idx == self.curser_column) && offset < self.curser_column {
            offset += 1;
            fitted = fit_columns(&columns, offset, self.uilayout.table_width);
        }

        let selected_column = fitted.iter().position(|&(idx, _)| idx == self.curser_column);
        let table: Vec<ColumnView> = fitted
            .into_iter()
            .map(|(idx, width)| {
                let mut view = columns[idx].1.clone();
                view.width = width;
                view
            })
            .collect();

        let operators = match self.filter.operators().len() {
            0 => "All operators".to_string(),
            n => format!("{n} selected"),
        };

        self.offset_column = offset;
        self.uidata = UIData {
            name: format!("{} transactions", self.shape),
            table,
            selected_column,
            selected_row: self.curser_row,
            nrows,
            total_rows,
            page: self.pager.current_page(),
            total_pages: self.pager.total_pages(nrows),
            page_size: self.pager.page_size().rows(),
            can_first: self.pager.can_first(),
            can_prev: self.pager.can_prev(),
            can_next: self.pager.can_next(nrows),
            can_last: self.pager.can_last(nrows),
            operators,
            operator_badges: self
                .filter
                .operators()
                .iter()
                .filter_map(|o| operator_label(o))
                .collect(),
            date_range: self
                .filter
                .date_range()
                .map(|r| r.label())
                .unwrap_or_else(|| "Select date range".to_string()),
            revenue: summary.revenue(),
            transactions: summary.count(),
        };
    }
}

/// Picks the columns to render: sticky columns scrolled past `offset` stay pinned in
/// front, followed by the columns from `offset` on. The last column may be cut.
/// Returns (index, render width) pairs.
fn fit_columns(columns: &[(usize, ColumnView)], offset: usize, table_width: usize) -> Vec<(usize, usize)> {
    let mut fitted = Vec::new();
    let mut used = 0;
    let pinned = columns[..std::cmp::min(offset, columns.len())]
        .iter()
        .filter(|(_, c)| c.sticky);
    let scrolled = columns.iter().skip(offset);

    for (idx, column) in pinned.chain(scrolled) {
        if used + column.width + 1 <= table_width {
            fitted.push((*idx, column.width));
            used += column.width + 1;
        } else {
            let remaining = table_width.saturating_sub(used + 1);
            if remaining >= MIN_PARTIAL_COLUMN_WIDTH {
                fitted.push((*idx, remaining));
            }
            break;
        }
    }
    fitted
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping || needs_escaping {
        out = format!("\"{out}\"");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageSize;
    use crate::schedule::ScheduleNotice;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    fn model_with(rows: usize) -> Model {
        let config = DashConfig::default().with_page_size(PageSize::Five);
        let normal = RecordStore::generate(RecordShape::Normal, rows, 3, today());
        let reservation = RecordStore::generate(RecordShape::Reservation, 12, 4, today());
        Model::init(&config, normal, reservation, today(), 160, 40).unwrap()
    }

    fn send(model: &mut Model, messages: &[Message]) {
        for m in messages {
            model.update(Some(m.clone())).unwrap();
        }
    }

    fn type_text(model: &mut Model, text: &str) {
        for c in text.chars() {
            send(model, &[Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))]);
        }
        send(model, &[Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))]);
    }

    #[test]
    fn starts_on_first_page_with_all_rows() {
        let model = model_with(23);
        let ui = model.get_uidata();
        assert_eq!(ui.nrows, 23);
        assert_eq!(ui.page, 1);
        assert_eq!(ui.total_pages, 5);
        assert!(!ui.can_first && !ui.can_prev && ui.can_next && ui.can_last);
        assert_eq!(ui.table[0].data.len(), 5);
        assert_eq!(ui.operators, "All operators");
    }

    #[test]
    fn filter_change_resets_page() {
        let mut model = model_with(60);
        send(&mut model, &[Message::LastPage]);
        assert_eq!(model.pager().current_page(), 12);

        send(&mut model, &[Message::Operators, Message::Toggle]);
        assert_eq!(model.modus(), Modus::Operators);
        assert_eq!(model.pager().current_page(), 1);
        assert_eq!(model.filter().operators(), [OPERATORS[0].value]);
        let matching = model
            .filtered_rows()
            .iter()
            .all(|&r| model.active().store.get(r).unwrap().operator() == OPERATORS[0].value);
        assert!(matching);

        send(&mut model, &[Message::ClearOperators, Message::Exit]);
        assert_eq!(model.filtered_rows().len(), 60);
        assert_eq!(model.modus(), Modus::Table);
    }

    #[test]
    fn page_size_change_keeps_page_in_range() {
        let mut model = model_with(23);
        send(&mut model, &[Message::LastPage]);
        assert_eq!(model.pager().current_page(), 5);
        send(&mut model, &[Message::CyclePageSize]); // 10 rows per page
        assert_eq!(model.pager().current_page(), 3);
        assert_eq!(model.get_uidata().table[0].data.len(), 3);
        send(&mut model, &[Message::CyclePageSize]); // 20
        assert_eq!(model.pager().current_page(), 2);
    }

    #[test]
    fn row_curser_stays_on_the_page() {
        let mut model = model_with(7);
        send(&mut model, &[Message::NextPage]);
        for _ in 0..10 {
            send(&mut model, &[Message::MoveDown]);
        }
        assert_eq!(model.get_uidata().selected_row, 1);
        send(&mut model, &[Message::PrevPage, Message::MoveUp, Message::MoveUp]);
        assert_eq!(model.get_uidata().selected_row, 0);
    }

    #[test]
    fn drawer_apply_and_cancel_through_messages() {
        let mut model = model_with(10);
        let before = model.registry().clone();

        send(&mut model, &[Message::Columns, Message::Toggle, Message::Exit]);
        assert_eq!(model.registry(), &before);

        send(&mut model, &[Message::Columns, Message::MoveDown, Message::Toggle, Message::Apply]);
        assert_eq!(model.modus(), Modus::Table);
        assert!(!model.registry().get("zone").unwrap().visible);
        assert!(model.registry().get("supplier").unwrap().visible);
        assert!(model.get_uidata().table.iter().all(|c| c.name != "Zone description"));
    }

    #[test]
    fn export_dialog_emits_one_intent_per_format() {
        let mut model = model_with(10);
        send(&mut model, &[Message::Export, Message::DeselectAll, Message::Enter]);
        assert_eq!(model.modus(), Modus::Export);
        assert!(model.export_log().is_empty());

        send(&mut model, &[Message::MoveDown, Message::Toggle, Message::MoveDown, Message::MoveDown]);
        send(&mut model, &[Message::Toggle, Message::Enter]);
        assert_eq!(model.modus(), Modus::Table);
        let formats: Vec<ExportFormat> = model.export_log().iter().map(|i| i.format).collect();
        assert_eq!(formats, vec![ExportFormat::Csv, ExportFormat::Pdf]);

        send(&mut model, &[Message::QuickCsv]);
        assert_eq!(model.export_log().len(), 3);
        assert_eq!(model.export_log()[2].rows, 10);
    }

    #[test]
    fn escape_closes_export_and_keeps_selection() {
        let mut model = model_with(10);
        send(&mut model, &[Message::Export, Message::MoveDown, Message::Toggle, Message::Exit]);
        assert_eq!(model.modus(), Modus::Table);
        assert!(model.export_log().is_empty());

        send(&mut model, &[Message::Export]);
        assert_eq!(model.modus(), Modus::Export);
        assert_eq!(model.export_dialog().curser(), 0);
        assert!(model.export_dialog().is_selected(ExportFormat::Csv));
        assert!(model.export_dialog().is_selected(ExportFormat::Excel));
    }

    #[test]
    fn schedule_create_edit_delete_through_messages() {
        let mut model = model_with(5);
        send(&mut model, &[Message::Schedules, Message::New, Message::Save]);
        assert_eq!(model.status_message(), ScheduleNotice::MissingName.to_string());
        assert!(model.editor().is_editing());

        send(&mut model, &[Message::MoveDown, Message::Enter]);
        assert_eq!(model.modus(), Modus::Input);
        type_text(&mut model, "Daily");
        assert_eq!(model.modus(), Modus::Schedules);
        send(&mut model, &[Message::MoveDown, Message::MoveDown, Message::MoveDown, Message::Enter]);
        type_text(&mut model, "a@b.com");
        send(&mut model, &[Message::Save]);
        assert_eq!(model.schedules().len(), 1);
        assert!(!model.editor().is_editing());
        let id = model.schedules().list()[0].id;

        send(&mut model, &[Message::Edit, Message::MoveDown, Message::Enter]);
        type_text(&mut model, " report");
        send(&mut model, &[Message::Save]);
        assert_eq!(model.schedules().len(), 1);
        assert_eq!(model.schedules().list()[0].id, id);
        assert_eq!(model.schedules().list()[0].name, "Daily report");

        send(&mut model, &[Message::Delete]);
        assert!(model.schedules().is_empty());
        send(&mut model, &[Message::Exit]);
        assert_eq!(model.modus(), Modus::Table);
    }

    #[test]
    fn escape_in_text_input_keeps_old_value() {
        let mut model = model_with(5);
        send(&mut model, &[Message::Schedules, Message::New, Message::MoveDown, Message::Enter]);
        send(&mut model, &[Message::RawKey(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE))]);
        send(&mut model, &[Message::RawKey(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))]);
        assert_eq!(model.modus(), Modus::Schedules);
        assert_eq!(model.editor().draft().unwrap().name, "");
    }

    #[test]
    fn shape_toggle_switches_registry_and_keeps_operators() {
        let mut model = model_with(10);
        send(&mut model, &[Message::Operators, Message::Toggle, Message::Exit, Message::ToggleShape]);
        assert_eq!(model.shape(), RecordShape::Reservation);
        assert_eq!(model.registry().shape(), RecordShape::Reservation);
        assert_eq!(model.filter().operators().len(), 1);
        assert_eq!(model.get_uidata().table[0].name, "Microsite ID");
    }

    #[test]
    fn horizontal_scroll_pins_sticky_columns() {
        let config = DashConfig::default();
        let normal = RecordStore::generate(RecordShape::Normal, 10, 3, today());
        let reservation = RecordStore::empty();
        let mut model = Model::init(&config, normal, reservation, today(), 80, 30).unwrap();

        let visible = model.visible_columns().len();
        for _ in 0..visible {
            send(&mut model, &[Message::MoveRight]);
        }
        let ui = model.get_uidata();
        assert_eq!(ui.table[0].name, "Supplier name");
        assert!(ui.table[0].sticky);
        let selected = ui.selected_column.unwrap();
        assert_eq!(ui.table[selected].name, "Time zone");
        assert!(ui.table.iter().map(|c| c.width + 1).sum::<usize>() <= 80);
    }

    #[test]
    fn report_download_completes_on_tick() {
        let config = DashConfig::default().with_download_delay_ms(0);
        let normal = RecordStore::generate(RecordShape::Normal, 3, 3, today());
        let mut model = Model::init(&config, normal, RecordStore::empty(), today(), 120, 40).unwrap();
        send(&mut model, &[Message::Reports, Message::DownloadExcel]);
        model.update(None).unwrap();
        assert!(!model.reports().is_downloading("1", ExportFormat::Excel));
        assert!(model.status_message().contains("downloaded"));
    }

    #[test]
    fn help_popup_returns_to_previous_modus() {
        let mut model = model_with(5);
        send(&mut model, &[Message::Help]);
        assert_eq!(model.modus(), Modus::Popup);
        assert!(!model.popup_message().is_empty());
        send(&mut model, &[Message::Exit]);
        assert_eq!(model.modus(), Modus::Table);
        send(&mut model, &[Message::Quit]);
        assert_eq!(model.status, Status::Quitting);
    }

    #[test]
    fn cell_wrapping_for_row_copy() {
        assert_eq!(wrap_cell_content("ORD-1"), "ORD-1");
        assert_eq!(wrap_cell_content("1,2,3"), "\"1,2,3\"");
        assert_eq!(wrap_cell_content("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn empty_store_renders_one_empty_page() {
        let config = DashConfig::default();
        let model = Model::init(
            &config,
            RecordStore::empty(),
            RecordStore::empty(),
            today(),
            120,
            40,
        )
        .unwrap();
        let ui = model.get_uidata();
        assert_eq!((ui.page, ui.total_pages), (1, 1));
        assert!(!ui.can_next && !ui.can_last);
        assert!(ui.table.iter().all(|c| c.data.is_empty()));
        assert_eq!(ui.revenue, "€0.00");
    }
}
