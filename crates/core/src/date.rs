use crate::source::SourceFile;
use chrono::{DateTime, Local};

pub fn format_date(date: DateTime<Local>) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> String {
    format_date(Local::now())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateResolver {
    global_date: String,
    use_same_date_for_all: bool,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DateResolver {
    pub fn new(use_same_date_for_all: bool) -> Self {
        Self {
            global_date: today(),
            use_same_date_for_all,
        }
    }

    pub fn global_date(&self) -> &str {
        &self.global_date
    }

    pub fn use_same_date_for_all(&self) -> bool {
        self.use_same_date_for_all
    }

    pub fn effective<'a>(&'a self, entry_date: &'a str) -> &'a str {
        if self.use_same_date_for_all {
            &self.global_date
        } else {
            entry_date
        }
    }

    pub(crate) fn set_global_date(&mut self, date: String) -> bool {
        if self.global_date == date {
            return false;
        }
        self.global_date = date;
        true
    }

    pub(crate) fn set_mode(&mut self, use_same_date_for_all: bool) -> bool {
        if self.use_same_date_for_all == use_same_date_for_all {
            return false;
        }
        self.use_same_date_for_all = use_same_date_for_all;
        true
    }

    pub(crate) fn seed_from(&mut self, first: &SourceFile) {
        self.global_date = format_date(first.last_modified);
    }

    pub(crate) fn initial_entry_date(&self, file: &SourceFile) -> String {
        if self.use_same_date_for_all {
            self.global_date.clone()
        } else {
            format_date(file.last_modified)
        }
    }

    pub(crate) fn date_after_toggle(&self, file: &SourceFile) -> String {
        self.initial_entry_date(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file_at(y: i32, m: u32, d: u32) -> SourceFile {
        let modified = Local
            .with_ymd_and_hms(y, m, d, 12, 0, 0)
            .single()
            .expect("valid local time");
        SourceFile::new("a.jpg", "image/jpeg", modified, b"x".to_vec())
    }

    #[test]
    fn format_date_is_iso_day() {
        let date = Local
            .with_ymd_and_hms(2024, 3, 5, 23, 59, 0)
            .single()
            .expect("valid local time");
        assert_eq!(format_date(date), "2024-03-05");
    }

    #[test]
    fn effective_follows_mode() {
        let mut resolver = DateResolver::new(true);
        resolver.set_global_date("2024-01-01".to_string());
        assert_eq!(resolver.effective("2023-05-05"), "2024-01-01");

        resolver.set_mode(false);
        assert_eq!(resolver.effective("2023-05-05"), "2023-05-05");
    }

    #[test]
    fn initial_date_in_per_file_mode_uses_file_timestamp() {
        let mut resolver = DateResolver::new(false);
        resolver.set_global_date("2024-01-01".to_string());
        assert_eq!(resolver.initial_entry_date(&file_at(2022, 7, 8)), "2022-07-08");

        resolver.set_mode(true);
        assert_eq!(resolver.initial_entry_date(&file_at(2022, 7, 8)), "2024-01-01");
    }

    #[test]
    fn setters_report_changes_only() {
        let mut resolver = DateResolver::new(true);
        assert!(resolver.set_global_date("2024-01-01".to_string()));
        assert!(!resolver.set_global_date("2024-01-01".to_string()));
        assert!(!resolver.set_mode(true));
        assert!(resolver.set_mode(false));
    }
}
