use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tidyfs_core::{
    app_paths, apply_plan, flatten, format_stat_line, load_config, plan_batch_rename,
    plan_option_rename, remove_empty_dirs, remove_empty_files, sort_files, stats_to_json,
    traverse, AppConfig, BatchRenameRequest, CleanupOptions, FlattenOptions, OperationReport,
    RenameOptions, RenameRequest, SortCriteria,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RULE_HELP: &str = "\
Placeholders:
  {F}                   file name without extension
  {D}                   current date/time (ISO 8601)
  {0} / {1}             position in the list, starting at 0 / 1
  {F,aaa:bbb,ccc:ddd}   file name with \"aaa\" -> \"bbb\", then \"ccc\" -> \"ddd\"
  {F,/a.*a/bb/}         file name with regex \"a.*a\" replaced by \"bb\"
The extension is always kept. Example: \"{1}_{F}\" renames [a.txt, b.txt] to [1_a.txt, 2_b.txt].";

#[derive(Debug, Parser)]
#[command(name = "tidyfs", version)]
#[command(about = "ファイルの一括リネーム・空ファイル/空フォルダ削除・並べ替え・フォルダ平坦化を行います")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 空ファイルを削除します
    RemoveEmptyFile(MutateArgs),
    /// 空フォルダを削除します
    RemoveEmptyDirs(MutateArgs),
    /// オプション指定でファイル名を一括変更します
    Rename(RenameArgs),
    /// テンプレートルールでファイル名を一括変更します
    #[command(after_help = RULE_HELP)]
    RenameWith(RenameWithArgs),
    /// ファイルを並べ替えて表示します
    Sort(SortArgs),
    /// サブフォルダのファイルを最上位フォルダへ移動します
    Flatten(MutateArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct MutateArgs {
    dir: PathBuf,
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,
    #[arg(short, long, default_value_t = false)]
    recursive: bool,
    #[arg(short, long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Args)]
struct RenameArgs {
    dir: PathBuf,
    #[arg(short, long)]
    prefix: Option<String>,
    #[arg(short, long)]
    suffix: Option<String>,
    /// old,new
    #[arg(short = 'c', long, value_parser = parse_replace)]
    replace: Vec<(String, String)>,
    /// text,index
    #[arg(short, long, value_parser = parse_insert)]
    insert: Vec<(String, i64)>,
    /// pattern,replacement
    #[arg(short = 'x', long, value_parser = parse_regex)]
    regex: Vec<(String, String)>,
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,
    #[arg(short, long, default_value_t = false)]
    recursive: bool,
    #[arg(short, long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Args)]
struct SortFlags {
    #[arg(short, long, default_value_t = false)]
    size: bool,
    #[arg(short, long, default_value_t = false)]
    created: bool,
    #[arg(short, long, default_value_t = false)]
    modified: bool,
}

impl SortFlags {
    fn criteria(&self) -> SortCriteria {
        SortCriteria {
            size: self.size,
            created: self.created,
            modified: self.modified,
        }
    }
}

#[derive(Debug, Args)]
struct RenameWithArgs {
    rule: String,
    dir: PathBuf,
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,
    #[arg(short, long, default_value_t = false)]
    recursive: bool,
    #[command(flatten)]
    sort: SortFlags,
    #[arg(short, long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Args)]
struct SortArgs {
    dir: PathBuf,
    #[command(flatten)]
    sort: SortFlags,
    #[arg(short, long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Commands::RemoveEmptyFile(args) => {
            let report = remove_empty_files(&args.dir, &cleanup_options(&args, &config))?;
            finish(&report, args.json)
        }
        Commands::RemoveEmptyDirs(args) => {
            let report = remove_empty_dirs(&args.dir, &cleanup_options(&args, &config))?;
            finish(&report, args.json)
        }
        Commands::Rename(args) => cmd_rename(args, &config),
        Commands::RenameWith(args) => cmd_rename_with(args, &config),
        Commands::Sort(args) => cmd_sort(args, &config),
        Commands::Flatten(args) => {
            let options = FlattenOptions {
                recursive: args.recursive || config.recursive_default,
                dry_run: args.dry_run || config.dry_run_default,
            };
            let report = flatten(&args.dir, &options)?;
            finish(&report, args.json)
        }
        Commands::Config(config_args) => match config_args.action {
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn cleanup_options(args: &MutateArgs, config: &AppConfig) -> CleanupOptions {
    CleanupOptions {
        recursive: args.recursive || config.recursive_default,
        dry_run: args.dry_run || config.dry_run_default,
    }
}

fn cmd_rename(args: RenameArgs, config: &AppConfig) -> Result<()> {
    let request = RenameRequest {
        root: args.dir,
        recursive: args.recursive || config.recursive_default,
        options: RenameOptions {
            prefix: args.prefix,
            suffix: args.suffix,
            replace: args.replace,
            insert: args.insert,
            regex: args.regex,
        },
    };
    if request.options.is_empty() {
        eprintln!("リネームオプションが指定されていません。ファイル名は変更されません。");
    }

    let plan = plan_option_rename(&request)?;
    let report = apply_plan(&plan, args.dry_run || config.dry_run_default);
    finish(&report, args.json)
}

fn cmd_rename_with(args: RenameWithArgs, config: &AppConfig) -> Result<()> {
    let request = BatchRenameRequest {
        root: args.dir,
        recursive: args.recursive || config.recursive_default,
        rule: args.rule,
        sort: args.sort.criteria().key().or(config.default_sort),
    };

    let plan = plan_batch_rename(&request)?;
    let report = apply_plan(&plan, args.dry_run || config.dry_run_default);
    finish(&report, args.json)
}

fn cmd_sort(args: SortArgs, config: &AppConfig) -> Result<()> {
    let scanned = traverse(&args.dir, false)?;
    let key = args.sort.criteria().key().or(config.default_sort);
    let stats = sort_files(&scanned.files, key);

    if args.json {
        println!("{}", stats_to_json(&stats)?);
    } else {
        for stat in &stats {
            println!("{}", format_stat_line(stat, &config.date_format));
        }
    }
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn finish(report: &OperationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for record in &report.records {
            println!("{record}");
        }
    }

    let summary = report.summary();
    eprintln!("\n{summary}");
    if report.dry_run {
        eprintln!("dry-runモード: 実ファイルは変更していません。");
    }
    if summary.failed > 0 {
        bail!("{}件の操作に失敗しました", summary.failed);
    }
    Ok(())
}

fn parse_replace(value: &str) -> Result<(String, String), String> {
    value
        .split_once(',')
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .ok_or_else(|| format!("\"old,new\" の形式で指定してください: {value}"))
}

/// The pattern may itself contain commas, so split at the last one.
fn parse_regex(value: &str) -> Result<(String, String), String> {
    value
        .rsplit_once(',')
        .map(|(pattern, replacement)| (pattern.to_string(), replacement.to_string()))
        .ok_or_else(|| format!("\"pattern,replacement\" の形式で指定してください: {value}"))
}

fn parse_insert(value: &str) -> Result<(String, i64), String> {
    let (text, index) = value
        .rsplit_once(',')
        .ok_or_else(|| format!("\"text,index\" の形式で指定してください: {value}"))?;
    let index = index
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("位置が数値ではありません: {index}: {err}"))?;
    Ok((text.to_string(), index))
}
