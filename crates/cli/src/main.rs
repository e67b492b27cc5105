use anyhow::{Context, Result};
use batch_renamer_core::{
    app_paths, collect_input_files, load_config, load_sources, sample_name, save_config, today,
    AppConfig, DirectorySink, ExportSequencer, FileCollection, NamingRule, TokioScheduler,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "batch-renamer-cli")]
#[command(about = "ファイルを命名ルールでまとめてリネームし、新しい名前で書き出します")]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Rules(RulesArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[arg(long, default_value_t = false)]
    recursive: bool,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long)]
    rule: Option<NamingRule>,
    #[arg(long)]
    codename: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value_t = false, conflicts_with = "same_date")]
    per_file_dates: bool,
    #[arg(long, default_value_t = false)]
    same_date: bool,
    #[arg(long = "set-date", value_parser = parse_index_value)]
    set_date: Vec<(usize, String)>,
    #[arg(long = "set-name", value_parser = parse_index_value)]
    set_name: Vec<(usize, String)>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    apply: bool,
    #[arg(long)]
    interval_ms: Option<u64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Args)]
struct RulesArgs {
    #[arg(long)]
    codename: Option<String>,
    #[arg(long)]
    date: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Rename(args) => cmd_rename(args).await,
        Commands::Rules(args) => cmd_rules(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        std::env::var("RUST_LOG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LevelFilter::Warn)
    };

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();

    if let Err(err) = result {
        eprintln!("ログ設定に失敗しました: {err}");
    }
}

async fn cmd_rename(args: RenameArgs) -> Result<()> {
    let config = load_config()?;
    let recursive = args.recursive || config.recursive_default;
    let include_hidden = args.include_hidden || config.include_hidden_default;

    let paths = collect_input_files(&args.inputs, recursive, include_hidden)?;
    let sources = load_sources(&paths)?;

    let mut collection = FileCollection::from_config(&config);
    collection.ingest(sources);
    apply_inputs(&args, &mut collection)?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&collection.snapshot())?);
        }
        OutputFormat::Table => {
            print_table(&collection);
        }
    }

    if args.apply {
        let out_dir = args
            .out_dir
            .context("--apply を指定する場合は --out-dir も指定してください")?;
        let interval = Duration::from_millis(args.interval_ms.unwrap_or(config.export_interval_ms));

        let scheduler = TokioScheduler::from_current()?;
        let sink = Arc::new(DirectorySink::new(&out_dir));
        let schedule =
            ExportSequencer::new(interval).export_all(collection.entries(), &scheduler, sink);
        scheduler.wait_idle().await;

        eprintln!(
            "書き出し完了: {}件 (空の名前でスキップ {}件) -> {}",
            schedule.scheduled.len(),
            schedule.skipped.len(),
            out_dir.display()
        );
    } else {
        eprintln!("dry-runモード: ファイルは書き出していません。書き出すには --apply と --out-dir を指定してください。");
    }

    collection.teardown();
    Ok(())
}

fn apply_inputs(args: &RenameArgs, collection: &mut FileCollection) -> Result<()> {
    if let Some(rule) = args.rule {
        collection.set_rule(rule);
    }
    if let Some(codename) = &args.codename {
        collection.set_codename(codename.clone());
    }
    if args.per_file_dates {
        collection.set_use_same_date_for_all(false);
    } else if args.same_date {
        collection.set_use_same_date_for_all(true);
    }
    if let Some(date) = &args.date {
        warn_if_not_date(date);
        collection.set_global_date(date.clone());
    }

    for (index, date) in &args.set_date {
        warn_if_not_date(date);
        ensure_index(collection, *index)?;
        collection.set_entry_date(*index, date.clone());
    }
    // Per-entry dates only reach the names on the next sweep.
    if !args.set_date.is_empty() {
        collection.recompute_names();
    }
    for (index, name) in &args.set_name {
        ensure_index(collection, *index)?;
        collection.set_entry_name(*index, name.clone());
    }
    Ok(())
}

fn cmd_rules(args: RulesArgs) -> Result<()> {
    let config = load_config()?;
    let codename = args.codename.unwrap_or(config.codename);
    let date = args.date.unwrap_or_else(today);

    for rule in NamingRule::ALL {
        println!("{:<20} {}", rule.id(), sample_name(rule, &codename, &date));
    }
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() {
        println!("設定ファイルは既に存在します: {}", paths.config_path.display());
        return Ok(());
    }
    save_config(&AppConfig::default())?;
    println!("設定ファイルを作成しました: {}", paths.config_path.display());
    Ok(())
}

fn print_table(collection: &FileCollection) {
    println!("# 元ファイル -> 新ファイル (日付)");
    for (index, entry) in collection.entries().iter().enumerate() {
        println!(
            "{} {} -> {} ({}){}",
            index,
            entry.original_file().name,
            entry.computed_name(),
            collection.effective_date(index).unwrap_or_default(),
            if entry.preview().is_some() { " [preview]" } else { "" }
        );
    }

    println!(
        "\n集計: files={} rule={} codename={} global_date={} same_date_for_all={}",
        collection.len(),
        collection.rule(),
        collection.codename(),
        collection.global_date(),
        collection.use_same_date_for_all()
    );
}

fn ensure_index(collection: &FileCollection, index: usize) -> Result<()> {
    if index >= collection.len() {
        anyhow::bail!(
            "インデックスが範囲外です: {} (ファイル数 {})",
            index,
            collection.len()
        );
    }
    Ok(())
}

fn warn_if_not_date(value: &str) {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        log::warn!("YYYY-MM-DD 形式ではない日付です: {value}");
    }
}

fn parse_index_value(raw: &str) -> Result<(usize, String), String> {
    let (index, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("INDEX=VALUE の形式で指定してください: {raw}"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("インデックスが数値ではありません: {index}"))?;
    Ok((index, value.to_string()))
}
