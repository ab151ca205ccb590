use std::fmt;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::export::ExportFormat;

pub const MAX_MESSAGE_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId(Uuid);

impl ScheduleId {
    fn generate() -> Self {
        ScheduleId(Uuid::new_v4())
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recurrence {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    const ALL: [Recurrence; 3] = [Recurrence::Daily, Recurrence::Weekly, Recurrence::Monthly];

    pub fn label(self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSlot {
    SixAm,
    #[default]
    EightAm,
    Noon,
    ThreePm,
    SixPm,
}

impl TimeSlot {
    const ALL: [TimeSlot; 5] = [
        TimeSlot::SixAm,
        TimeSlot::EightAm,
        TimeSlot::Noon,
        TimeSlot::ThreePm,
        TimeSlot::SixPm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeSlot::SixAm => "6:00 am",
            TimeSlot::EightAm => "8:00 am",
            TimeSlot::Noon => "12:00 pm",
            TimeSlot::ThreePm => "3:00 pm",
            TimeSlot::SixPm => "6:00 pm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryTimeZone {
    #[default]
    UsNewYork,
    UsLosAngeles,
    EuropeLondon,
    EuropeStockholm,
}

impl DeliveryTimeZone {
    const ALL: [DeliveryTimeZone; 4] = [
        DeliveryTimeZone::UsNewYork,
        DeliveryTimeZone::UsLosAngeles,
        DeliveryTimeZone::EuropeLondon,
        DeliveryTimeZone::EuropeStockholm,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DeliveryTimeZone::UsNewYork => "us-new-york",
            DeliveryTimeZone::UsLosAngeles => "us-los-angeles",
            DeliveryTimeZone::EuropeLondon => "europe-london",
            DeliveryTimeZone::EuropeStockholm => "europe-stockholm",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliveryTimeZone::UsNewYork => "U.S. - New York",
            DeliveryTimeZone::UsLosAngeles => "U.S. - Los Angeles",
            DeliveryTimeZone::EuropeLondon => "Europe - London",
            DeliveryTimeZone::EuropeStockholm => "Europe - Stockholm",
        }
    }
}

/// Steps `current` through `all`, wrapping at both ends.
fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let pos = all.iter().position(|&v| v == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % all.len()
    } else {
        (pos + all.len() - 1) % all.len()
    };
    all[next]
}

/// Reasons a draft cannot be saved. Shown as a notice; the form stays open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleNotice {
    MissingName,
    MissingRecipients,
    MessageTooLong(usize),
    UnknownSchedule(ScheduleId),
    NotEditing,
}

impl fmt::Display for ScheduleNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleNotice::MissingName => write!(f, "Please enter a schedule name"),
            ScheduleNotice::MissingRecipients => write!(f, "Please enter at least one email address"),
            ScheduleNotice::MessageTooLong(len) => {
                write!(f, "Custom message is {len}/{MAX_MESSAGE_LEN} characters")
            }
            ScheduleNotice::UnknownSchedule(id) => write!(f, "Schedule {id} no longer exists"),
            ScheduleNotice::NotEditing => write!(f, "No schedule draft is open"),
        }
    }
}

/// Splits a comma separated address list, dropping blanks.
pub fn parse_recipients(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Form contents of the schedule dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDraft {
    pub format: ExportFormat,
    pub name: String,
    pub recurrence: Recurrence,
    pub time: TimeSlot,
    pub recipients: String,
    pub subject: String,
    pub custom_message: String,
    pub include_links: bool,
    pub time_zone: DeliveryTimeZone,
}

impl Default for ScheduleDraft {
    fn default() -> Self {
        Self {
            format: ExportFormat::Excel,
            name: String::new(),
            recurrence: Recurrence::default(),
            time: TimeSlot::default(),
            recipients: String::new(),
            subject: String::new(),
            custom_message: String::new(),
            include_links: false,
            time_zone: DeliveryTimeZone::default(),
        }
    }
}

impl ScheduleDraft {
    /// Checks the draft and returns the parsed recipient list.
    pub fn validate(&self) -> Result<Vec<String>, ScheduleNotice> {
        if self.name.trim().is_empty() {
            return Err(ScheduleNotice::MissingName);
        }
        let recipients = parse_recipients(&self.recipients);
        if recipients.is_empty() {
            return Err(ScheduleNotice::MissingRecipients);
        }
        let len = self.custom_message.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(ScheduleNotice::MessageTooLong(len));
        }
        Ok(recipients)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDefinition {
    pub id: ScheduleId,
    pub name: String,
    pub format: ExportFormat,
    pub recurrence: Recurrence,
    pub time: TimeSlot,
    pub recipients: Vec<String>,
    pub subject: String,
    pub custom_message: String,
    pub include_links: bool,
    pub time_zone: DeliveryTimeZone,
    pub created: NaiveDate,
}

impl ScheduleDefinition {
    fn from_draft(id: ScheduleId, draft: &ScheduleDraft, recipients: Vec<String>, created: NaiveDate) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            format: draft.format,
            recurrence: draft.recurrence,
            time: draft.time,
            recipients,
            subject: draft.subject.clone(),
            custom_message: draft.custom_message.clone(),
            include_links: draft.include_links,
            time_zone: draft.time_zone,
            created,
        }
    }

    pub fn to_draft(&self) -> ScheduleDraft {
        ScheduleDraft {
            format: self.format,
            name: self.name.clone(),
            recurrence: self.recurrence,
            time: self.time,
            recipients: self.recipients.join(", "),
            subject: self.subject.clone(),
            custom_message: self.custom_message.clone(),
            include_links: self.include_links,
            time_zone: self.time_zone,
        }
    }

    pub fn summary(&self) -> String {
        format!("{} will be delivered {} at {}", self.name, self.recurrence.label(), self.time.label())
    }
}

/// Saved delivery schedules of this session.
#[derive(Debug, Default)]
pub struct ScheduleRegistry {
    entries: Vec<ScheduleDefinition>,
}

impl ScheduleRegistry {
    pub fn list(&self) -> &[ScheduleDefinition] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ScheduleId) -> Option<&ScheduleDefinition> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn create(&mut self, draft: &ScheduleDraft, created: NaiveDate) -> Result<ScheduleId, ScheduleNotice> {
        let recipients = draft.validate()?;
        let id = ScheduleId::generate();
        let schedule = ScheduleDefinition::from_draft(id, draft, recipients, created);
        info!("Delivery schedule saved: {} ({})", schedule.summary(), schedule.time_zone.key());
        self.entries.push(schedule);
        Ok(id)
    }

    /// Replaces the schedule `id` in place, keeping its position and creation date.
    pub fn update(&mut self, id: ScheduleId, draft: &ScheduleDraft) -> Result<ScheduleId, ScheduleNotice> {
        let recipients = draft.validate()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ScheduleNotice::UnknownSchedule(id))?;
        *entry = ScheduleDefinition::from_draft(id, draft, recipients, entry.created);
        info!("Delivery schedule updated: {} ({})", entry.summary(), entry.time_zone.key());
        Ok(id)
    }

    pub fn delete(&mut self, id: ScheduleId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.id != id);
        let removed = self.entries.len() != before;
        debug!("Delete schedule {id}: removed={removed}");
        removed
    }
}

/// Fields of the schedule form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleField {
    Format,
    Name,
    Recurrence,
    Time,
    Recipients,
    Subject,
    Message,
    IncludeLinks,
    TimeZone,
}

impl ScheduleField {
    pub const ALL: [ScheduleField; 9] = [
        ScheduleField::Format,
        ScheduleField::Name,
        ScheduleField::Recurrence,
        ScheduleField::Time,
        ScheduleField::Recipients,
        ScheduleField::Subject,
        ScheduleField::Message,
        ScheduleField::IncludeLinks,
        ScheduleField::TimeZone,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScheduleField::Format => "Format",
            ScheduleField::Name => "Schedule name",
            ScheduleField::Recurrence => "Recurrence",
            ScheduleField::Time => "Time",
            ScheduleField::Recipients => "Email addresses",
            ScheduleField::Subject => "Subject",
            ScheduleField::Message => "Custom message",
            ScheduleField::IncludeLinks => "Include links",
            ScheduleField::TimeZone => "Delivery time zone",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            ScheduleField::Name | ScheduleField::Recipients | ScheduleField::Subject | ScheduleField::Message
        )
    }

    /// Maximum characters accepted by a text field.
    pub fn max_len(self) -> Option<usize> {
        match self {
            ScheduleField::Message => Some(MAX_MESSAGE_LEN),
            _ => None,
        }
    }
}

/// A "Test now" request. Sent independently of whether the draft was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDelivery {
    pub format: ExportFormat,
    pub recipients: Vec<String>,
    pub subject: String,
}

#[derive(Debug, Clone)]
struct Draft {
    editing_id: Option<ScheduleId>,
    draft: ScheduleDraft,
    field: usize,
}

/// Schedule dialog: the saved list, or a draft being created or edited.
#[derive(Debug, Default)]
pub struct ScheduleEditor {
    list_curser: usize,
    editing: Option<Draft>,
}

impl ScheduleEditor {
    pub fn open(&mut self) {
        self.editing = None;
        self.list_curser = 0;
    }

    pub fn close(&mut self) {
        self.editing = None;
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_id(&self) -> Option<ScheduleId> {
        self.editing.as_ref().and_then(|d| d.editing_id)
    }

    pub fn draft(&self) -> Option<&ScheduleDraft> {
        self.editing.as_ref().map(|d| &d.draft)
    }

    pub fn list_curser(&self) -> usize {
        self.list_curser
    }

    pub fn field(&self) -> Option<ScheduleField> {
        self.editing.as_ref().map(|d| ScheduleField::ALL[d.field])
    }

    pub fn move_up(&mut self) {
        match self.editing.as_mut() {
            Some(d) => d.field = d.field.saturating_sub(1),
            None => self.list_curser = self.list_curser.saturating_sub(1),
        }
    }

    pub fn move_down(&mut self, registry: &ScheduleRegistry) {
        match self.editing.as_mut() {
            Some(d) => d.field = std::cmp::min(d.field + 1, ScheduleField::ALL.len() - 1),
            None => {
                if self.list_curser + 1 < registry.len() {
                    self.list_curser += 1;
                }
            }
        }
    }

    pub fn create_new(&mut self) {
        self.editing = Some(Draft {
            editing_id: None,
            draft: ScheduleDraft::default(),
            field: 0,
        });
    }

    /// Opens the schedule under the list curser for editing.
    pub fn edit_selected(&mut self, registry: &ScheduleRegistry) -> bool {
        match registry.list().get(self.list_curser) {
            Some(schedule) => {
                self.editing = Some(Draft {
                    editing_id: Some(schedule.id),
                    draft: schedule.to_draft(),
                    field: 0,
                });
                true
            }
            None => false,
        }
    }

    pub fn delete_selected(&mut self, registry: &mut ScheduleRegistry) -> Option<ScheduleId> {
        let id = registry.list().get(self.list_curser)?.id;
        registry.delete(id);
        self.list_curser = std::cmp::min(self.list_curser, registry.len().saturating_sub(1));
        Some(id)
    }

    /// Drops the draft and returns to the list.
    pub fn cancel(&mut self) {
        self.editing = None;
    }

    /// Creates or replaces the schedule. The draft stays open when validation fails.
    pub fn save(&mut self, registry: &mut ScheduleRegistry, today: NaiveDate) -> Result<ScheduleId, ScheduleNotice> {
        let Some(editing) = self.editing.as_ref() else {
            return Err(ScheduleNotice::NotEditing);
        };
        let id = match editing.editing_id {
            Some(id) => registry.update(id, &editing.draft)?,
            None => registry.create(&editing.draft, today)?,
        };
        self.editing = None;
        Ok(id)
    }

    pub fn test_now(&self) -> Option<TestDelivery> {
        let draft = self.draft()?;
        let delivery = TestDelivery {
            format: draft.format,
            recipients: parse_recipients(&draft.recipients),
            subject: draft.subject.clone(),
        };
        info!("Test delivery to {:?}", delivery.recipients);
        Some(delivery)
    }

    /// Steps an enumerated field or flips "Include links".
    pub fn cycle_field(&mut self, forward: bool) {
        let Some(d) = self.editing.as_mut() else {
            return;
        };
        let draft = &mut d.draft;
        match ScheduleField::ALL[d.field] {
            ScheduleField::Format => draft.format = cycle(&ExportFormat::ALL, draft.format, forward),
            ScheduleField::Recurrence => {
                draft.recurrence = cycle(&Recurrence::ALL, draft.recurrence, forward)
            }
            ScheduleField::Time => draft.time = cycle(&TimeSlot::ALL, draft.time, forward),
            ScheduleField::TimeZone => {
                draft.time_zone = cycle(&DeliveryTimeZone::ALL, draft.time_zone, forward)
            }
            ScheduleField::IncludeLinks => draft.include_links = !draft.include_links,
            _ => {}
        }
    }

    pub fn text(&self, field: ScheduleField) -> &str {
        let Some(draft) = self.draft() else {
            return "";
        };
        match field {
            ScheduleField::Name => &draft.name,
            ScheduleField::Recipients => &draft.recipients,
            ScheduleField::Subject => &draft.subject,
            ScheduleField::Message => &draft.custom_message,
            _ => "",
        }
    }

    pub fn set_text(&mut self, field: ScheduleField, value: String) {
        let Some(d) = self.editing.as_mut() else {
            return;
        };
        match field {
            ScheduleField::Name => d.draft.name = value,
            ScheduleField::Recipients => d.draft.recipients = value,
            ScheduleField::Subject => d.draft.subject = value,
            ScheduleField::Message => {
                d.draft.custom_message = value.chars().take(MAX_MESSAGE_LEN).collect()
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    fn draft(name: &str, recipients: &str) -> ScheduleDraft {
        ScheduleDraft {
            name: name.to_string(),
            recipients: recipients.to_string(),
            ..ScheduleDraft::default()
        }
    }

    #[test]
    fn empty_name_is_rejected_and_registry_unchanged() {
        let mut registry = ScheduleRegistry::default();
        assert_eq!(
            registry.create(&draft("   ", "a@b.com"), today()),
            Err(ScheduleNotice::MissingName)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn missing_recipients_are_rejected() {
        let mut registry = ScheduleRegistry::default();
        assert_eq!(
            registry.create(&draft("Daily", " , "), today()),
            Err(ScheduleNotice::MissingRecipients)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn long_message_is_rejected() {
        let mut d = draft("Daily", "a@b.com");
        d.custom_message = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert_eq!(d.validate(), Err(ScheduleNotice::MessageTooLong(MAX_MESSAGE_LEN + 1)));
        d.custom_message.pop();
        assert!(d.validate().is_ok());
    }

    #[test]
    fn create_then_delete_touches_only_that_entry() {
        let mut registry = ScheduleRegistry::default();
        let keep = registry.create(&draft("Weekly", "f@c.com, m@c.com"), today()).unwrap();
        let id = registry.create(&draft("Daily", "a@b.com"), today()).unwrap();
        assert_ne!(keep, id);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(id).unwrap().recipients, vec!["a@b.com"]);
        assert_eq!(registry.get(keep).unwrap().recipients, vec!["f@c.com", "m@c.com"]);

        assert!(registry.delete(id));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(keep).is_some());
        assert!(!registry.delete(id));
    }

    #[test]
    fn editing_replaces_by_id_without_growing() {
        let mut registry = ScheduleRegistry::default();
        registry.create(&draft("First", "a@b.com"), today()).unwrap();
        registry.create(&draft("Second", "c@d.com"), today()).unwrap();

        let mut editor = ScheduleEditor::default();
        editor.open();
        editor.move_down(&registry);
        assert!(editor.edit_selected(&registry));
        let id = editor.editing_id().unwrap();
        editor.set_text(ScheduleField::Name, "Renamed".to_string());
        assert_eq!(editor.save(&mut registry, today()), Ok(id));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list()[1].name, "Renamed");
        assert_eq!(registry.list()[1].id, id);
        assert_eq!(registry.list()[0].name, "First");
        assert!(!editor.is_editing());
    }

    #[test]
    fn cancelled_edit_keeps_saved_entry() {
        let mut registry = ScheduleRegistry::default();
        let id = registry.create(&draft("Daily", "a@b.com"), today()).unwrap();
        let mut editor = ScheduleEditor::default();
        editor.open();
        editor.edit_selected(&registry);
        editor.set_text(ScheduleField::Name, "Changed".to_string());
        editor.cancel();
        assert_eq!(registry.get(id).unwrap().name, "Daily");
        assert!(!editor.is_editing());
    }

    #[test]
    fn failed_save_leaves_form_open() {
        let mut registry = ScheduleRegistry::default();
        let mut editor = ScheduleEditor::default();
        editor.open();
        editor.create_new();
        editor.set_text(ScheduleField::Recipients, "a@b.com".to_string());
        assert_eq!(editor.save(&mut registry, today()), Err(ScheduleNotice::MissingName));
        assert!(editor.is_editing());
        assert!(registry.is_empty());

        editor.set_text(ScheduleField::Name, "Daily".to_string());
        assert!(editor.save(&mut registry, today()).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn save_without_a_draft_is_rejected() {
        let mut registry = ScheduleRegistry::default();
        let mut editor = ScheduleEditor::default();
        editor.open();
        assert_eq!(editor.save(&mut registry, today()), Err(ScheduleNotice::NotEditing));
        assert!(registry.is_empty());

        editor.create_new();
        editor.cancel();
        assert_eq!(editor.save(&mut registry, today()), Err(ScheduleNotice::NotEditing));
    }

    #[test]
    fn test_now_does_not_need_a_saved_schedule() {
        let registry = ScheduleRegistry::default();
        let mut editor = ScheduleEditor::default();
        editor.open();
        editor.create_new();
        editor.set_text(ScheduleField::Recipients, "x@y.com".to_string());
        let delivery = editor.test_now().unwrap();
        assert_eq!(delivery.recipients, vec!["x@y.com"]);
        assert!(registry.is_empty());
        assert!(editor.is_editing());
    }

    #[test]
    fn enumerated_fields_cycle_and_wrap() {
        let mut editor = ScheduleEditor::default();
        editor.create_new();
        editor.cycle_field(false);
        assert_eq!(editor.draft().unwrap().format, ExportFormat::Pdf);

        let registry = ScheduleRegistry::default();
        for _ in 0..3 {
            editor.move_down(&registry);
        }
        assert_eq!(editor.field(), Some(ScheduleField::Time));
        editor.cycle_field(true);
        assert_eq!(editor.draft().unwrap().time, TimeSlot::Noon);

        for _ in 0..10 {
            editor.move_down(&registry);
        }
        assert_eq!(editor.field(), Some(ScheduleField::TimeZone));
        editor.cycle_field(true);
        assert_eq!(editor.draft().unwrap().time_zone.key(), "us-los-angeles");
    }

    #[test]
    fn message_text_is_truncated() {
        let mut editor = ScheduleEditor::default();
        editor.create_new();
        editor.set_text(ScheduleField::Message, "y".repeat(600));
        assert_eq!(editor.text(ScheduleField::Message).chars().count(), MAX_MESSAGE_LEN);
    }
}
