mod collection;
mod config;
mod date;
mod export;
mod naming;
mod preview;
mod sanitize;
mod schedule;
mod source;

pub use collection::{CollectionSnapshot, Entry, EntryView, FileCollection};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use date::{format_date, today, DateResolver};
pub use export::{
    DirectorySink, DownloadBlob, ExportSchedule, ExportSequencer, SaveError, SaveSink,
    ScheduledExport, DEFAULT_EXPORT_INTERVAL_MS,
};
pub use naming::{
    compact_date, compute_name, compute_name_with_id, sample_name, NamingRule, RuleError,
    DEFAULT_CODENAME,
};
pub use preview::{PreviewHandle, PreviewManager, PreviewStats};
pub use sanitize::sanitize_filename;
pub use schedule::{Scheduler, Task, TokioScheduler, VirtualScheduler};
pub use source::{collect_input_files, content_type_for_path, load_sources, SourceFile};
