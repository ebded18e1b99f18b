use arboard::Clipboard;
use tracing::{debug, info, trace, warn};

use crate::domain::{CMDMode, HELP_TEXT, Message, PeekError};
use crate::inputter::{InputResult, Inputter};
use crate::pipeline::{PipelineParams, PipelineView, run};
use crate::table::{SortDirection, Table};

const PAGE_SIZE_STEP: usize = 5;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// Everything the ui needs to draw one frame.
#[derive(Clone)]
pub struct UIData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub sort_column: Option<usize>,
    pub sort_direction: SortDirection,
    pub search_term: String,
    pub selected_row: usize,
    pub selected_column: usize,
    pub footer: String,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            sort_column: None,
            sort_direction: SortDirection::Ascending,
            search_term: String::new(),
            selected_row: 0,
            selected_column: 0,
            footer: String::new(),
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
        }
    }
}

/// Footer line shared by the terminal view and `--print`.
pub fn page_summary(view: &PipelineView, total_rows: usize) -> String {
    let rows = match view.row_range() {
        Some((first, last)) => format!("rows {first}-{last} of {}", view.filtered_row_count()),
        None => "no rows".to_string(),
    };
    format!(
        "Page {}/{} · {} (of {} total)",
        view.page,
        view.total_pages.max(1),
        rows,
        total_rows
    )
}

/// Quote a cell so that it reads back as the same value.
fn wrap_cell_content(c: &str) -> String {
    let needs_wrapping = c.chars().any(|c| c == '"' || c == ',' || c.is_whitespace());
    if needs_wrapping {
        format!("\"{}\"", c.replace('"', "\"\""))
    } else {
        c.to_string()
    }
}

pub struct Model {
    name: String,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    data: Table,
    params: PipelineParams,
    view: PipelineView,
    curser_row: usize,
    curser_column: usize,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
}

impl Model {
    pub fn init(name: impl Into<String>, data: Table, params: PipelineParams) -> Self {
        let view = run(&data, &params);
        let mut model = Self {
            name: name.into(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            data,
            params,
            view,
            curser_row: 0,
            curser_column: 0,
            uidata: UIData::empty(),
            clipboard: None,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
        };
        let message = format!(
            "Loaded {} rows, press ? for help",
            model.data.total_row_count
        );
        model.set_status_message(message);
        model.update_uidata();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn view(&self) -> &PipelineView {
        &self.view
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// Apply one message. No message fails today: clipboard errors end up in
    /// the status line. The `Result` matches `Controller::handle_event` so the
    /// event loop propagates both with `?`.
    pub fn update(&mut self, message: Option<Message>) -> Result<(), PeekError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);

        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(),
                Message::MoveDown => self.move_selection_down(),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::NextPage => {
                    self.params.next_page(self.view.total_pages);
                    self.recompute();
                }
                Message::PrevPage => {
                    self.params.prev_page();
                    self.recompute();
                }
                Message::FirstPage => {
                    self.params.first_page();
                    self.recompute();
                }
                Message::LastPage => {
                    self.params.last_page(self.view.total_pages);
                    self.recompute();
                }
                Message::GrowPage => {
                    self.params
                        .set_page_size(self.params.page_size + PAGE_SIZE_STEP);
                    self.recompute();
                }
                Message::ShrinkPage => {
                    self.params
                        .set_page_size(self.params.page_size.saturating_sub(PAGE_SIZE_STEP));
                    self.recompute();
                }
                Message::Search => self.enter_cmd_mode(CMDMode::Search),
                Message::ClearSearch => {
                    self.params.set_search_term("");
                    self.recompute();
                }
                Message::ToggleSort => self.toggle_sort(),
                Message::ClearSort => {
                    self.params.clear_sort();
                    self.recompute();
                }
                Message::CopyCell => {
                    if let Some(cell) = self.selected_cell() {
                        self.copy_to_clipboard(cell);
                    }
                }
                Message::CopyRow => {
                    if let Some(line) = self.selected_row_line() {
                        self.copy_to_clipboard(line);
                    }
                }
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::CMDINPUT => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        Ok(())
    }

    // -------------------- Pipeline ---------------------- //

    fn recompute(&mut self) {
        self.view = run(&self.data, &self.params);
        let nrows = self.view.table.rows.len();
        if self.curser_row >= nrows {
            self.curser_row = nrows.saturating_sub(1);
        }
        debug!(
            "View: page {}/{}, {} rows on page, {} matching",
            self.view.page,
            self.view.total_pages,
            nrows,
            self.view.filtered_row_count()
        );
        self.update_uidata();
    }

    fn toggle_sort(&mut self) {
        if self.data.ncolumns() == 0 {
            return;
        }
        self.params.toggle_sort(self.curser_column);
        self.recompute();
        let message = format!(
            "Sorted by \"{}\" {}",
            self.data.headers[self.curser_column], self.params.sort_direction
        );
        self.set_status_message(message);
    }

    fn apply_search(&mut self, term: &str) {
        self.params.set_search_term(term);
        self.curser_row = 0;
        self.recompute();
        let message = if term.trim().is_empty() {
            "Search cleared".to_string()
        } else {
            format!("Found {} matching rows", self.view.filtered_row_count())
        };
        self.set_status_message(message);
    }

    // -------------------- Selection ---------------------- //

    fn move_selection_up(&mut self) {
        if self.curser_row > 0 {
            self.curser_row -= 1;
        } else if self.params.page > 1 {
            // Wrap onto the bottom of the previous page
            self.params.prev_page();
            self.recompute();
            self.curser_row = self.view.table.rows.len().saturating_sub(1);
        }
        self.update_uidata();
    }

    fn move_selection_down(&mut self) {
        if self.curser_row + 1 < self.view.table.rows.len() {
            self.curser_row += 1;
        } else if self.params.page < self.view.total_pages {
            self.params.next_page(self.view.total_pages);
            self.curser_row = 0;
            self.recompute();
        }
        self.update_uidata();
    }

    fn move_selection_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
        self.update_uidata();
    }

    fn move_selection_right(&mut self) {
        if self.curser_column + 1 < self.data.ncolumns() {
            self.curser_column += 1;
        }
        self.update_uidata();
    }

    pub fn selected_cell(&self) -> Option<String> {
        self.view
            .table
            .rows
            .get(self.curser_row)
            .map(|row| row.get(self.curser_column).cloned().unwrap_or_default())
    }

    /// Selected row as a comma separated line.
    pub fn selected_row_line(&self) -> Option<String> {
        self.view.table.rows.get(self.curser_row).map(|row| {
            row.iter()
                .map(|c| wrap_cell_content(c))
                .collect::<Vec<String>>()
                .join(",")
        })
    }

    // The clipboard is opened on first use, headless sessions never need one.
    fn set_clipboard_text(&mut self, content: String) -> Result<(), PeekError> {
        if self.clipboard.is_none() {
            self.clipboard = Some(Clipboard::new()?);
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard.set_text(content)?;
        }
        Ok(())
    }

    fn copy_to_clipboard(&mut self, content: String) {
        trace!("Copy content: {}", content);
        match self.set_clipboard_text(content) {
            Ok(_) => self.set_status_message("Copied to clipboard"),
            Err(e) => {
                warn!("Error copying to clipboard: {}", e);
                self.set_status_message(format!("{e}"));
            }
        }
    }

    // -------------------- Modes ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn exit(&mut self) {
        if self.modus == Modus::POPUP {
            trace!("Close popup ...");
            self.modus = self.previous_modus;
            self.previous_modus = Modus::POPUP;
            self.uidata.show_popup = false;
            }
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);

        self.active_cmdinput = true;
        self.input.clear();
        self.input.set(&self.params.search_term);
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
            self.update_uidata();
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let cmd_input = self.last_input.input.clone();
        match self.cmd_mode {
            Some(CMDMode::Search) if !self.last_input.canceled => self.apply_search(&cmd_input),
            Some(CMDMode::Search) => info!("Search canceled"),
            None => info!("Cmd mode is none!"),
        }
        self.cmd_mode = None;
        self.last_input = InputResult::default();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!("UI was resized! w:{}, h:{}", width, height);
        self.update_uidata();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
    }

    fn update_uidata(&mut self) {
        let show_popup = self.uidata.show_popup;
        let popup_message = std::mem::take(&mut self.uidata.popup_message);
        self.uidata = UIData {
            name: self.name.clone(),
            headers: self.data.headers.clone(),
            rows: self.view.table.rows.clone(),
            sort_column: self.params.sort_column,
            sort_direction: self.params.sort_direction,
            search_term: self.params.search_term.clone(),
            selected_row: self.curser_row,
            selected_column: self.curser_column,
            footer: page_summary(&self.view, self.data.total_row_count),
            show_popup,
            popup_message,
            cmdinput: self.last_input.clone(),
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
        };
    }
}
