use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use stac_tiles::builder::DEFAULT_ITEM_PATTERN;
use stac_tiles::time::DEFAULT_TIME_PATTERN;
use stac_tiles::{
    build_hierarchy, filter_catalog, filter_collection_ids, Bbox, BuildOptions, Catalog,
    CollectionPattern, FilteredItems, ItemErrorPolicy, StacNode, TimeRange,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// タイルごとのアイテム数や読み飛ばしたファイルを表示
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// STACアイテムからカタログを構築し、コレクションの一覧を表示
    Build(BuildArgs),
    /// カタログを範囲と期間で絞り込む
    Filter(FilterArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// タイルディレクトリを含むルートディレクトリ
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// STACアイテムを探すglobパターン
    #[arg(long, default_value = DEFAULT_ITEM_PATTERN)]
    item_pattern: String,

    /// タイル名の正規表現（デフォルト: [SN]\d{2}[EW]\d{3}）
    #[arg(long, conflicts_with = "fixed_length")]
    collection_pattern: Option<String>,

    /// 名前の文字数でタイルを判定
    #[arg(long)]
    fixed_length: Option<usize>,

    /// 読めないアイテムがあれば処理を中断
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[command(flatten)]
    build: BuildArgs,

    /// 検索範囲
    #[arg(
        long,
        num_args = 4,
        value_names = ["WEST", "SOUTH", "EAST", "NORTH"],
        allow_negative_numbers = true
    )]
    bbox: Option<Vec<f64>>,

    /// 開始日時
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// 終了日時
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// 日時のフォーマット（デフォルト: %Y-%m-%d）
    #[arg(long)]
    time_pattern: Option<String>,

    /// コレクションIDのみ出力（期間はコレクションの範囲で判定）
    #[arg(long)]
    ids_only: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ログの初期化
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    // 処理開始時間を記録
    let start_time = Instant::now();

    match &cli.command {
        Command::Build(args) => run_build(args, cli.verbose)?,
        Command::Filter(args) => run_filter(args, cli.verbose)?,
    }

    // 処理時間を表示
    info!("Total processing time: {:?}", start_time.elapsed());

    Ok(())
}

fn build_options(args: &BuildArgs, verbose: bool) -> BuildOptions {
    let collection_pattern = match (&args.collection_pattern, args.fixed_length) {
        (_, Some(len)) => CollectionPattern::FixedLength(len),
        (Some(pattern), None) => CollectionPattern::Regex(pattern.clone()),
        (None, None) => CollectionPattern::default(),
    };

    BuildOptions {
        item_pattern: args.item_pattern.clone(),
        collection_pattern,
        on_item_error: if args.strict {
            ItemErrorPolicy::Fail
        } else {
            ItemErrorPolicy::Skip
        },
        verbose,
    }
}

fn load_catalog(args: &BuildArgs, verbose: bool) -> Result<Catalog> {
    info!("Building catalog from: {:?}", args.root);

    let catalog = build_hierarchy(&args.root, &build_options(args, verbose))
        .with_context(|| format!("Failed to build catalog from {:?}", args.root))?;

    info!(
        "Built {} with {} collections",
        catalog.id,
        catalog.children().len()
    );

    Ok(catalog)
}

fn run_build(args: &BuildArgs, verbose: bool) -> Result<()> {
    let catalog = load_catalog(args, verbose)?;

    for collection in catalog.children() {
        let extent = serde_json::to_string(&collection.extent)?;
        println!(
            "{}\t{}\t{}",
            collection.id,
            collection.items().len(),
            extent
        );
    }

    Ok(())
}

fn run_filter(args: &FilterArgs, verbose: bool) -> Result<()> {
    let catalog = load_catalog(&args.build, verbose)?;

    let bbox = args
        .bbox
        .as_deref()
        .map(|values| {
            Bbox::from_slice(values).context("--bbox expects WEST SOUTH EAST NORTH")
        })
        .transpose()?;
    let time_range = args.start.as_deref().zip(args.end.as_deref());

    if args.ids_only {
        // コレクションの範囲・期間のみで判定
        let range = time_range
            .map(|(start, end)| {
                TimeRange::parse(
                    start,
                    end,
                    args.time_pattern.as_deref().unwrap_or(DEFAULT_TIME_PATTERN),
                )
            })
            .transpose()?;

        for id in filter_collection_ids(catalog.children(), bbox.as_ref(), range.as_ref()) {
            println!("{}", id);
        }
        return Ok(());
    }

    let result = filter_catalog(
        &catalog,
        bbox.as_ref(),
        time_range,
        args.time_pattern.as_deref(),
    )?;

    info!(
        "Matched {} collections and {} items",
        result.collections.len(),
        result.items.len()
    );

    match &result.items {
        FilteredItems::Grouped(groups) => {
            for (collection, items) in result.collections.iter().zip(groups) {
                println!("{}\t{} items", collection.id, items.len());
                for item in items {
                    println!("  {}", item.id);
                }
            }
        }
        FilteredItems::Flat(items) => {
            for item in items {
                let datetime = item
                    .datetime()
                    .map(|time| time.to_rfc3339())
                    .unwrap_or_default();
                println!(
                    "{}\t{}\t{}",
                    item.collection.as_deref().unwrap_or(""),
                    item.id,
                    datetime
                );
            }
        }
    }

    Ok(())
}
