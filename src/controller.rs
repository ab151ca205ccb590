use std::time::Duration;
use tracing::trace;

use crate::domain::{DashConfig, DashError, Message};
use crate::model::{Model, Modus};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DashConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DashError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    return Ok(self.handle_key(model, key));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, model: &Model, key: KeyEvent) -> Option<Message> {
        if model.raw_keyevents() {
            return Some(Message::RawKey(key));
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.handle_control_key(model, key.code);
        }

        let message = match model.modus() {
            Modus::Table => table_key(key.code),
            Modus::Operators => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => Some(Message::Toggle),
                KeyCode::Char('x') => Some(Message::ClearOperators),
                code => common_key(code),
            },
            Modus::Columns => match key.code {
                KeyCode::Char(' ') => Some(Message::Toggle),
                KeyCode::Char('a') | KeyCode::Enter => Some(Message::Apply),
                code => common_key(code),
            },
            Modus::Export => match key.code {
                KeyCode::Char(' ') => Some(Message::Toggle),
                KeyCode::Char('a') => Some(Message::SelectAll),
                KeyCode::Char('A') => Some(Message::DeselectAll),
                KeyCode::Enter => Some(Message::Enter),
                code => common_key(code),
            },
            Modus::Schedules if model.editor().is_editing() => match key.code {
                KeyCode::Char(' ') => Some(Message::Toggle),
                KeyCode::Enter => Some(Message::Enter),
                KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
                KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
                code => common_key(code),
            },
            Modus::Schedules => match key.code {
                KeyCode::Char('n') => Some(Message::New),
                KeyCode::Char('e') => Some(Message::Edit),
                KeyCode::Enter => Some(Message::Enter),
                KeyCode::Char('D') => Some(Message::Delete),
                code => common_key(code),
            },
            Modus::Reports => match key.code {
                KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
                KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
                KeyCode::Char('x') => Some(Message::DownloadExcel),
                KeyCode::Char('p') => Some(Message::DownloadPdf),
                code => common_key(code),
            },
            Modus::Popup => match key.code {
                KeyCode::Enter => Some(Message::Exit),
                code => common_key(code),
            },
            Modus::Input => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_control_key(&self, model: &Model, code: KeyCode) -> Option<Message> {
        match code {
            KeyCode::Char('c') => Some(Message::Quit),
            KeyCode::Char('s') if model.editor().is_editing() => Some(Message::Save),
            KeyCode::Char('t') if model.editor().is_editing() => Some(Message::TestNow),
            _ => None,
        }
    }
}

fn table_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
        KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
        KeyCode::Char('p') | KeyCode::PageUp => Some(Message::PrevPage),
        KeyCode::Char('g') | KeyCode::Home => Some(Message::FirstPage),
        KeyCode::Char('G') | KeyCode::End => Some(Message::LastPage),
        KeyCode::Char('z') => Some(Message::CyclePageSize),
        KeyCode::Char('t') => Some(Message::ToggleShape),
        KeyCode::Char('o') => Some(Message::Operators),
        KeyCode::Char('c') => Some(Message::Columns),
        KeyCode::Char('e') => Some(Message::Export),
        KeyCode::Char('d') => Some(Message::QuickCsv),
        KeyCode::Char('s') => Some(Message::Schedules),
        KeyCode::Char('r') => Some(Message::Reports),
        KeyCode::Char('y') => Some(Message::CopyCell),
        KeyCode::Char('Y') => Some(Message::CopyRow),
        KeyCode::Char('?') => Some(Message::Help),
        code => common_key(code),
    }
}

/// Keys that mean the same in every mode.
fn common_key(code: KeyCode) -> Option<Message> {
    match code {
        KeyCode::Char('q') => Some(Message::Quit),
        KeyCode::Esc => Some(Message::Exit),
        KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::RecordShape;
    use crate::records::RecordStore;
    use chrono::NaiveDate;

    fn model() -> Model {
        let today = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
        let normal = RecordStore::generate(RecordShape::Normal, 20, 1, today);
        let reservation = RecordStore::empty();
        Model::init(&DashConfig::default(), normal, reservation, today, 120, 40).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn table_keys() {
        let controller = Controller::new(&DashConfig::default());
        let model = model();
        let cases = [
            (KeyCode::Char('n'), Message::NextPage),
            (KeyCode::Char('G'), Message::LastPage),
            (KeyCode::Char('z'), Message::CyclePageSize),
            (KeyCode::Char('o'), Message::Operators),
            (KeyCode::Char('c'), Message::Columns),
            (KeyCode::Char('e'), Message::Export),
            (KeyCode::Char('d'), Message::QuickCsv),
            (KeyCode::Char('Y'), Message::CopyRow),
            (KeyCode::Down, Message::MoveDown),
            (KeyCode::Char('q'), Message::Quit),
        ];
        for (code, message) in cases {
            assert_eq!(controller.handle_key(&model, key(code)), Some(message));
        }
        assert_eq!(controller.handle_key(&model, key(KeyCode::Char('x'))), None);
        assert_eq!(controller.handle_key(&model, ctrl('c')), Some(Message::Quit));
    }

    #[test]
    fn same_key_maps_per_modus() {
        let controller = Controller::new(&DashConfig::default());
        let mut model = model();

        model.update(Some(Message::Export)).unwrap();
        assert_eq!(controller.handle_key(&model, key(KeyCode::Char('a'))), Some(Message::SelectAll));
        model.update(Some(Message::Exit)).unwrap();

        model.update(Some(Message::Columns)).unwrap();
        assert_eq!(controller.handle_key(&model, key(KeyCode::Char('a'))), Some(Message::Apply));
        assert_eq!(controller.handle_key(&model, key(KeyCode::Esc)), Some(Message::Exit));
        model.update(Some(Message::Exit)).unwrap();

        model.update(Some(Message::Reports)).unwrap();
        assert_eq!(controller.handle_key(&model, key(KeyCode::Char('p'))), Some(Message::DownloadPdf));
        assert_eq!(controller.handle_key(&model, key(KeyCode::Right)), Some(Message::MoveRight));
    }

    #[test]
    fn schedule_form_keys_and_raw_input() {
        let controller = Controller::new(&DashConfig::default());
        let mut model = model();
        model.update(Some(Message::Schedules)).unwrap();
        assert_eq!(controller.handle_key(&model, key(KeyCode::Char('n'))), Some(Message::New));
        assert_eq!(controller.handle_key(&model, ctrl('s')), None);

        model.update(Some(Message::New)).unwrap();
        assert_eq!(controller.handle_key(&model, ctrl('s')), Some(Message::Save));
        assert_eq!(controller.handle_key(&model, ctrl('t')), Some(Message::TestNow));

        model.update(Some(Message::MoveDown)).unwrap();
        model.update(Some(Message::Enter)).unwrap();
        let event = key(KeyCode::Char('q'));
        assert_eq!(controller.handle_key(&model, event), Some(Message::RawKey(event)));
    }
}
