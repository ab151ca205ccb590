use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::export::ExportFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub formats: &'static [ExportFormat],
}

pub const REPORTS: [Report; 7] = [
    Report {
        id: "1",
        title: "Remittance advice",
        description: "Displays the amount owed by EasyPark",
        formats: &[ExportFormat::Excel],
    },
    Report {
        id: "2",
        title: "Date overview",
        description: "Displays all transactions by date",
        formats: &[ExportFormat::Excel],
    },
    Report {
        id: "3",
        title: "Zone overview",
        description: "Displays all transactions per Parking Area",
        formats: &[ExportFormat::Excel],
    },
    Report {
        id: "4",
        title: "Transaction overview",
        description: "Displays each individual parking transaction",
        formats: &[ExportFormat::Excel],
    },
    Report {
        id: "5",
        title: "Commission report",
        description: "Displays parking transactions based on different roles",
        formats: &[ExportFormat::Excel],
    },
    Report {
        id: "6",
        title: "Self-invoice",
        description: "Displays parking fees invoiced to EasyPark",
        formats: &[ExportFormat::Excel, ExportFormat::Pdf],
    },
    Report {
        id: "7",
        title: "Fines overview",
        description: "Displays all parking fines that were paid",
        formats: &[ExportFormat::Excel],
    },
];

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const YEARS: [u16; 4] = [2025, 2024, 2023, 2022];

// September 2025
const DEFAULT_MONTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub report: &'static str,
    pub format: ExportFormat,
    pub month: String,
    until: Instant,
}

/// Reports catalog with a month selector and simulated downloads.
#[derive(Debug)]
pub struct ReportsView {
    curser: usize,
    month: usize,
    delay: Duration,
    downloading: Option<Download>,
}

impl ReportsView {
    pub fn new(delay: Duration) -> Self {
        Self {
            curser: 0,
            month: DEFAULT_MONTH,
            delay,
            downloading: None,
        }
    }

    pub fn reports(&self) -> &'static [Report] {
        &REPORTS
    }

    pub fn curser(&self) -> usize {
        self.curser
    }

    pub fn selected(&self) -> &'static Report {
        &REPORTS[self.curser]
    }

    /// Selected month, e.g. "September 2025". Options run newest year first.
    pub fn month_label(&self) -> String {
        let year = YEARS[self.month / MONTHS.len()];
        format!("{} {}", MONTHS[self.month % MONTHS.len()], year)
    }

    pub fn move_up(&mut self) {
        self.curser = self.curser.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.curser = std::cmp::min(self.curser + 1, REPORTS.len() - 1);
    }

    /// Moves the month selector; `forward` goes to the next option in the list.
    pub fn step_month(&mut self, forward: bool) {
        let total = MONTHS.len() * YEARS.len();
        self.month = if forward {
            std::cmp::min(self.month + 1, total - 1)
        } else {
            self.month.saturating_sub(1)
        };
    }

    pub fn is_downloading(&self, report: &str, format: ExportFormat) -> bool {
        self.downloading
            .as_ref()
            .is_some_and(|d| d.report == report && d.format == format)
    }

    /// Starts a download of the selected report. It returns to idle after the delay.
    pub fn download(&mut self, format: ExportFormat, now: Instant) -> Result<&Download, String> {
        let report = self.selected();
        if !report.formats.contains(&format) {
            return Err(format!("{} is not available as {}", report.title, format));
        }
        if self.is_downloading(report.id, format) {
            return Err(format!("{} is already downloading", report.title));
        }
        let month = self.month_label();
        info!("Downloading report {} ({}) for {} as {}", report.id, report.title, month, format);
        Ok(self.downloading.insert(Download {
            report: report.id,
            format,
            month,
            until: now + self.delay,
        }))
    }

    /// Ends a finished download. Returns it once, when it completes.
    pub fn tick(&mut self, now: Instant) -> Option<Download> {
        if self.downloading.as_ref().is_some_and(|d| now >= d.until) {
            return self.downloading.take();
        }
        None
    }

    /// Leaving the view discards a pending download without completing it.
    pub fn teardown(&mut self) {
        if let Some(d) = self.downloading.take() {
            debug!("Dropping pending report download {}", d.report);
        }
    }
}
