use crate::config::AppConfig;
use crate::date::DateResolver;
use crate::naming::{compute_name, NamingRule};
use crate::preview::{PreviewHandle, PreviewManager, PreviewStats};
use crate::source::SourceFile;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug)]
pub struct Entry {
    file: SourceFile,
    computed_name: String,
    entry_date: String,
    preview: Option<PreviewHandle>,
}

impl Entry {
    pub fn original_file(&self) -> &SourceFile {
        &self.file
    }

    pub fn computed_name(&self) -> &str {
        &self.computed_name
    }

    pub fn entry_date(&self) -> &str {
        &self.entry_date
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub index: usize,
    pub original_name: String,
    pub size: u64,
    pub content_type: String,
    pub computed_name: String,
    pub entry_date: String,
    pub effective_date: String,
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    pub rule: NamingRule,
    pub codename: String,
    pub global_date: String,
    pub use_same_date_for_all: bool,
    pub entries: Vec<EntryView>,
}

/// Every setter for `rule`, `codename`, the global date or the date mode, and every change of
/// the entry count, re-runs [`FileCollection::recompute_names`] over all entries. Direct edits
/// through [`FileCollection::set_entry_name`] survive only until that next sweep.
#[derive(Debug)]
pub struct FileCollection {
    entries: Vec<Entry>,
    rule: NamingRule,
    codename: String,
    dates: DateResolver,
    previews: PreviewManager,
}

impl Default for FileCollection {
    fn default() -> Self {
        Self::new(NamingRule::default(), "", true)
    }
}

impl FileCollection {
    pub fn new(rule: NamingRule, codename: impl Into<String>, use_same_date_for_all: bool) -> Self {
        Self {
            entries: Vec::new(),
            rule,
            codename: codename.into(),
            dates: DateResolver::new(use_same_date_for_all),
            previews: PreviewManager::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            NamingRule::from_id(&config.rule),
            config.codename.clone(),
            config.use_same_date_for_all,
        )
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rule(&self) -> NamingRule {
        self.rule
    }

    pub fn codename(&self) -> &str {
        &self.codename
    }

    pub fn global_date(&self) -> &str {
        self.dates.global_date()
    }

    pub fn use_same_date_for_all(&self) -> bool {
        self.dates.use_same_date_for_all()
    }

    pub fn effective_date(&self, index: usize) -> Option<&str> {
        self.entries
            .get(index)
            .map(|entry| self.dates.effective(&entry.entry_date))
    }

    pub fn previews(&self) -> &PreviewManager {
        &self.previews
    }

    pub fn preview_stats(&self) -> Arc<PreviewStats> {
        self.previews.stats()
    }

    pub fn ingest<I>(&mut self, files: I) -> usize
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let files: Vec<SourceFile> = files.into_iter().collect();
        let Some(first) = files.first() else {
            return 0;
        };

        if self.entries.is_empty() {
            self.dates.seed_from(first);
        }

        let added = files.len();
        self.entries.reserve(added);
        for file in files {
            let entry_date = self.dates.initial_entry_date(&file);
            let preview = self.previews.allocate(&file);
            self.entries.push(Entry {
                file,
                computed_name: String::new(),
                entry_date,
                preview,
            });
        }

        log::info!("{} file(s) staged, {} total", added, self.entries.len());
        self.recompute_names();
        added
    }

    pub fn recompute_names(&mut self) {
        for entry in &mut self.entries {
            let date = self.dates.effective(&entry.entry_date);
            entry.computed_name = compute_name(self.rule, &self.codename, date, &entry.file.name);
        }
        log::debug!(
            "names recomputed: rule={} entries={}",
            self.rule,
            self.entries.len()
        );
    }

    pub fn set_rule(&mut self, rule: NamingRule) {
        if self.rule == rule {
            return;
        }
        self.rule = rule;
        self.recompute_names();
    }

    pub fn set_codename(&mut self, codename: impl Into<String>) {
        let codename = codename.into();
        if self.codename == codename {
            return;
        }
        self.codename = codename;
        self.recompute_names();
    }

    pub fn set_global_date(&mut self, date: impl Into<String>) {
        if self.dates.set_global_date(date.into()) {
            self.recompute_names();
        }
    }

    pub fn set_use_same_date_for_all(&mut self, enabled: bool) {
        if !self.dates.set_mode(enabled) {
            return;
        }
        for entry in &mut self.entries {
            entry.entry_date = self.dates.date_after_toggle(&entry.file);
        }
        self.recompute_names();
    }

    pub fn set_entry_name(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.computed_name = value.into();
                true
            }
            None => false,
        }
    }

    pub fn set_entry_date(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.entry_date = value.into();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        for entry in self.entries.drain(..) {
            if let Some(handle) = entry.preview.as_ref() {
                self.previews.release(handle);
            }
        }
        log::info!("staged files cleared");
        self.recompute_names();
    }

    pub fn teardown(mut self) {
        self.previews.release_all();
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            rule: self.rule,
            codename: self.codename.clone(),
            global_date: self.dates.global_date().to_string(),
            use_same_date_for_all: self.dates.use_same_date_for_all(),
            entries: self
                .entries
                .iter()
                .enumerate()
                .map(|(index, entry)| EntryView {
                    index,
                    original_name: entry.file.name.clone(),
                    size: entry.file.size,
                    content_type: entry.file.content_type.clone(),
                    computed_name: entry.computed_name.clone(),
                    entry_date: entry.entry_date.clone(),
                    effective_date: self.dates.effective(&entry.entry_date).to_string(),
                    preview: entry.preview.as_ref().map(PreviewHandle::uri),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn file(name: &str, content_type: &str, y: i32, m: u32, d: u32) -> SourceFile {
        let modified = Local
            .with_ymd_and_hms(y, m, d, 10, 0, 0)
            .single()
            .expect("valid local time");
        SourceFile::new(name, content_type, modified, name.as_bytes().to_vec())
    }

    fn names(collection: &FileCollection) -> Vec<String> {
        collection
            .entries()
            .iter()
            .map(|e| e.computed_name().to_string())
            .collect()
    }

    fn staged() -> FileCollection {
        let mut collection = FileCollection::new(NamingRule::DateCodenameName, "DRAFT", true);
        collection.ingest(vec![
            file("a.png", "image/png", 2024, 3, 5),
            file("b.pdf", "application/pdf", 2024, 6, 7),
        ]);
        collection
    }

    #[test]
    fn first_ingest_seeds_global_date_from_first_file() {
        let collection = staged();
        assert_eq!(collection.global_date(), "2024-03-05");
        assert_eq!(
            names(&collection),
            vec!["20240305_DRAFT_a.png", "20240305_DRAFT_b.pdf"]
        );
    }

    #[test]
    fn later_ingest_does_not_reseed_and_appends_in_order() {
        let mut collection = staged();
        collection.ingest(vec![
            file("c.jpg", "image/jpeg", 2020, 1, 1),
            file("d.txt", "text/plain", 2021, 1, 1),
        ]);
        assert_eq!(collection.global_date(), "2024-03-05");
        let originals: Vec<_> = collection
            .entries()
            .iter()
            .map(|e| e.original_file().name.clone())
            .collect();
        assert_eq!(originals, vec!["a.png", "b.pdf", "c.jpg", "d.txt"]);
    }

    #[test]
    fn empty_ingest_is_a_no_op() {
        let mut collection = staged();
        collection.set_entry_name(0, "manual.png");
        assert_eq!(collection.ingest(Vec::new()), 0);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.entries()[0].computed_name(), "manual.png");
    }

    #[test]
    fn ingest_after_clear_reseeds() {
        let mut collection = staged();
        collection.clear();
        collection.ingest(vec![file("z.png", "image/png", 2019, 9, 9)]);
        assert_eq!(collection.global_date(), "2019-09-09");
    }

    #[test]
    fn toggling_to_per_file_resets_dates_to_file_timestamps() {
        let mut collection = staged();
        collection.set_global_date("2030-12-31");
        collection.set_use_same_date_for_all(false);

        let dates: Vec<_> = collection
            .entries()
            .iter()
            .map(|e| e.entry_date().to_string())
            .collect();
        assert_eq!(dates, vec!["2024-03-05", "2024-06-07"]);
        assert_eq!(
            names(&collection),
            vec!["20240305_DRAFT_a.png", "20240607_DRAFT_b.pdf"]
        );
    }

    #[test]
    fn toggling_back_to_global_overwrites_per_file_edits() {
        let mut collection = staged();
        collection.set_use_same_date_for_all(false);
        collection.set_entry_date(1, "1999-01-01");
        collection.set_global_date("2025-05-05");
        collection.set_use_same_date_for_all(true);

        for entry in collection.entries() {
            assert_eq!(entry.entry_date(), "2025-05-05");
        }
        assert_eq!(
            names(&collection),
            vec!["20250505_DRAFT_a.png", "20250505_DRAFT_b.pdf"]
        );
    }

    #[test]
    fn toggling_to_per_file_discards_earlier_per_file_edits() {
        let mut collection = staged();
        collection.set_use_same_date_for_all(false);
        collection.set_entry_date(0, "2001-01-01");
        collection.set_use_same_date_for_all(true);
        collection.set_use_same_date_for_all(false);
        assert_eq!(collection.entries()[0].entry_date(), "2024-03-05");
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut collection = staged();
        collection.recompute_names();
        let first = names(&collection);
        collection.recompute_names();
        assert_eq!(first, names(&collection));
    }

    #[test]
    fn entry_date_edit_does_not_recompute_by_itself() {
        let mut collection = staged();
        collection.set_use_same_date_for_all(false);
        assert!(collection.set_entry_date(0, "2011-11-11"));
        assert_eq!(collection.entries()[0].computed_name(), "20240305_DRAFT_a.png");
        assert_eq!(collection.effective_date(0), Some("2011-11-11"));

        collection.set_codename("FINAL");
        assert_eq!(collection.entries()[0].computed_name(), "20111111_FINAL_a.png");
    }

    #[test]
    fn manual_name_edit_is_overwritten_by_next_sweep() {
        let mut collection = staged();
        assert!(collection.set_entry_name(1, "keep-me.pdf"));
        assert_eq!(collection.entries()[1].computed_name(), "keep-me.pdf");

        collection.set_rule(NamingRule::NameDate);
        assert_eq!(collection.entries()[1].computed_name(), "b_20240305.pdf");
    }

    #[test]
    fn manual_name_edit_is_overwritten_by_ingest() {
        let mut collection = staged();
        collection.set_entry_name(0, "keep-me.png");
        collection.ingest(vec![file("c.jpg", "image/jpeg", 2020, 1, 1)]);
        assert_eq!(collection.entries()[0].computed_name(), "20240305_DRAFT_a.png");
    }

    #[test]
    fn unchanged_setter_value_keeps_manual_edit() {
        let mut collection = staged();
        collection.set_entry_name(0, "keep-me.png");
        collection.set_codename("DRAFT");
        collection.set_rule(NamingRule::DateCodenameName);
        collection.set_use_same_date_for_all(true);
        assert_eq!(collection.entries()[0].computed_name(), "keep-me.png");
    }

    #[test]
    fn global_date_change_in_per_file_mode_still_sweeps() {
        let mut collection = staged();
        collection.set_use_same_date_for_all(false);
        collection.set_entry_name(0, "keep-me.png");
        collection.set_global_date("2000-01-01");
        assert_eq!(collection.entries()[0].computed_name(), "20240305_DRAFT_a.png");
    }

    #[test]
    fn out_of_range_edits_are_ignored() {
        let mut collection = staged();
        assert!(!collection.set_entry_name(9, "x"));
        assert!(!collection.set_entry_date(9, "2020-01-01"));
        assert_eq!(collection.effective_date(9), None);
    }

    #[test]
    fn previews_only_for_images_and_released_on_clear() {
        let mut collection = staged();
        let stats = collection.preview_stats();
        assert!(collection.entries()[0].preview().is_some());
        assert!(collection.entries()[1].preview().is_none());
        assert_eq!(stats.outstanding(), 1);

        collection.clear();
        assert!(collection.is_empty());
        assert_eq!(stats.allocated(), 1);
        assert_eq!(stats.outstanding(), 0);
    }

    #[test]
    fn teardown_releases_previews_of_live_entries() {
        let mut collection = staged();
        collection.ingest(vec![file("c.jpg", "image/jpeg", 2020, 1, 1)]);
        let stats = collection.preview_stats();
        assert_eq!(stats.outstanding(), 2);

        collection.teardown();
        assert_eq!(stats.allocated(), 2);
        assert_eq!(stats.released(), 2);
    }

    #[test]
    fn drop_releases_previews() {
        let collection = staged();
        let stats = collection.preview_stats();
        drop(collection);
        assert_eq!(stats.outstanding(), 0);
    }

    #[test]
    fn snapshot_serializes_entries() {
        let collection = staged();
        let value = serde_json::to_value(collection.snapshot()).expect("serialize");
        assert_eq!(value["rule"], "date_codename_name");
        assert_eq!(value["entries"][0]["computed_name"], "20240305_DRAFT_a.png");
        assert_eq!(value["entries"][1]["preview"], serde_json::Value::Null);
    }

    #[test]
    fn per_file_mode_ingest_uses_file_dates() {
        let mut collection = FileCollection::new(NamingRule::DateName, "", false);
        collection.ingest(vec![
            file("a.png", "image/png", 2024, 3, 5),
            file("b.png", "image/png", 2023, 1, 2),
        ]);
        assert_eq!(collection.global_date(), "2024-03-05");
        assert_eq!(names(&collection), vec!["20240305_a.png", "20230102_b.png"]);
    }
}
