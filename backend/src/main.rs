//! Stocktransfer CLI - build store-to-store transfer manifests
//!
//! # Main Commands
//!
//! ```bash
//! stocktransfer load --styles styles.txt --master master.csv   # Add rows
//! stocktransfer from 1 AL && stocktransfer to 1 BR              # Route a row
//! stocktransfer process --yes -o manifest.csv                   # Export manifest
//! stocktransfer stats                                           # Sender × receiver matrix
//! ```
//!
//! # Table Commands
//!
//! ```bash
//! stocktransfer list --filter nike --column brand --sort style
//! stocktransfer note 1 Other --custom "fragile"
//! stocktransfer duplicate 1
//! stocktransfer bulk --ids 1,2,3 --to CW
//! stocktransfer store add kst
//! stocktransfer progress --mode all -o progress.csv
//! ```
//!
//! The working table is kept in the data directory and saved after every
//! command that changes it.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stocktransfer::config::{AppConfig, NOTE_OPTIONS};
use stocktransfer::models::OTHER_NOTE;
use stocktransfer::scan::LineDecoder;
use stocktransfer::sources::read_master_file;
use stocktransfer::transform::grouper::group_manifest;
use stocktransfer::transform::view::{
    filter_rows, progress_view, row_status, sort_rows, FilterColumn, RowStatus, SortConfig, SortDirection,
    SortKey, ViewMode,
};
use stocktransfer::{
    manifest_to_string, parse_master_data, progress_to_string, BulkEdit, FileStore,
    KeyValueStore, ProcessOptions, ProcessOutcome, StatisticsSnapshot, TransferSession,
};

#[derive(Parser)]
#[command(name = "stocktransfer")]
#[command(about = "Build store-to-store inventory transfer manifests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a master data file and output its records as JSON
    ParseMaster {
        /// Master data CSV/TSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add rows from a style list (one code per line, or #CSV mode)
    Load {
        /// Style list file (default: stdin)
        #[arg(short, long)]
        styles: Option<PathBuf>,

        #[command(flatten)]
        master: MasterArgs,
    },

    /// Add rows from a barcode scanner that types one code per line
    Scan {
        #[command(flatten)]
        master: MasterArgs,
    },

    /// Show the working table
    List {
        /// Case-insensitive text filter
        #[arg(short, long)]
        filter: Option<String>,

        /// Column the filter applies to
        #[arg(short, long, value_enum, default_value = "all")]
        column: ColumnArg,

        /// Sort column
        #[arg(short, long, value_enum)]
        sort: Option<SortArg>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Select the sending store of a row (selecting it again clears it)
    From {
        id: u64,
        code: String,
    },

    /// Select the receiving store of a row (selecting it again clears it)
    To {
        id: u64,
        code: String,
    },

    /// Set the note of a row
    Note {
        id: u64,
        note: String,

        /// Free text for the "Other" note
        #[arg(long)]
        custom: Option<String>,
    },

    /// Insert an unassigned copy of a row right after it
    Duplicate {
        id: u64,
    },

    /// Delete a row
    Delete {
        id: u64,
    },

    /// Remove every row and the saved table
    Clear,

    /// Apply stores and note to several rows
    Bulk {
        /// Row ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<u64>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Build the sorted transfer manifest
    Process {
        /// Include rows that miss a store
        #[arg(short, long)]
        yes: bool,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show sender statistics for the working table
    Stats,

    /// Show or export the saved progress
    Progress {
        #[arg(short, long, value_enum, default_value = "default")]
        mode: ModeArg,

        /// Style codes to look for, comma or newline separated
        #[arg(short, long)]
        search: Option<String>,

        /// Print statistics of the saved progress instead of the table
        #[arg(long)]
        stats: bool,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage store codes
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(clap::Args)]
struct MasterArgs {
    /// Master data file used to fill brand and description
    #[arg(long, conflicts_with = "master_url")]
    master: Option<PathBuf>,

    /// Master data URL (default: STOCKTRANSFER_MASTER_URL)
    #[arg(long)]
    master_url: Option<String>,
}

#[derive(Subcommand)]
enum StoreAction {
    /// List store codes
    List,

    /// Add a store code
    Add {
        name: String,
    },

    /// Remove a store code no row uses
    Remove {
        code: String,
    },

    /// Rename a store code no row uses
    Rename {
        old: String,
        new: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ColumnArg {
    All,
    Brand,
    Style,
    Description,
    From,
    To,
}

impl From<ColumnArg> for FilterColumn {
    fn from(arg: ColumnArg) -> Self {
        match arg {
            ColumnArg::All => FilterColumn::All,
            ColumnArg::Brand => FilterColumn::Brand,
            ColumnArg::Style => FilterColumn::Style,
            ColumnArg::Description => FilterColumn::Description,
            ColumnArg::From => FilterColumn::From,
            ColumnArg::To => FilterColumn::To,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Id,
    Brand,
    Style,
    Description,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Id => SortKey::DisplayId,
            SortArg::Brand => SortKey::Brand,
            SortArg::Style => SortKey::Style,
            SortArg::Description => SortKey::Description,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Default,
    Original,
    All,
}

impl From<ModeArg> for ViewMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Default => ViewMode::Default,
            ModeArg::Original => ViewMode::Original,
            ModeArg::All => ViewMode::All,
        }
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::ParseMaster { input, output } => cmd_parse_master(&input, output.as_deref()).await,
        command => run_session(command, &config).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Open the working table, run one command, save if it changed anything.
async fn run_session(command: Commands, config: &AppConfig) -> CmdResult {
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.data_dir));
    let mut session = TransferSession::new(Arc::clone(&storage));

    session.resume_saved();

    let mutated = match command {
        Commands::ParseMaster { .. } => false,

        Commands::Load { styles, master } => {
            import_master(&mut session, &master, config).await?;
            let text = match styles {
                Some(path) => fs::read_to_string(&path)?,
                None => {
                    let mut text = String::new();
                    io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            session.set_input(text);
            session.load_styles()?;
            true
        }

        Commands::Scan { master } => {
            import_master(&mut session, &master, config).await?;
            eprintln!("📷 Scanning from stdin, one code per line (Ctrl-D to finish)");
            let stream = session.start_scan(LineDecoder::new(BufReader::new(io::stdin())))?;
            let count = session.collect_scans(stream, None).await?;
            eprintln!("   {} code(s) scanned", count);
            session.load_styles()?;
            true
        }

        Commands::List { filter, column, sort, desc } => {
            cmd_list(&session, filter.as_deref(), column, sort, desc);
            false
        }

        Commands::From { id, code } => {
            session.select_from(id, &code.to_uppercase())?;
            true
        }

        Commands::To { id, code } => {
            session.select_to(id, &code.to_uppercase())?;
            true
        }

        Commands::Note { id, note, custom } => {
            let note = resolve_note(&note)?;
            session.set_note(id, note)?;
            if let Some(text) = custom {
                session.set_custom_note(id, &text)?;
            }
            true
        }

        Commands::Duplicate { id } => {
            let new_id = session.duplicate_row(id)?;
            eprintln!("✅ Row {} duplicated as {}", id, new_id);
            true
        }

        Commands::Delete { id } => {
            let row = session.delete_row(id)?;
            eprintln!("🗑️  Row {} ({}) deleted", id, row.style);
            true
        }

        Commands::Clear => {
            session.clear_all();
            session.discard_saved_progress()?;
            false
        }

        Commands::Bulk { ids, from, to, note } => {
            let note = note.as_deref().map(resolve_note).transpose()?;
            let edit = BulkEdit {
                from: from.map(|c| c.to_uppercase()),
                to: to.map(|c| c.to_uppercase()),
                note: note.map(str::to_string),
            };
            let report = session.apply_bulk(&ids, &edit);
            if report.missing > 0 {
                eprintln!("   {} id(s) did not match any row", report.missing);
            }
            report.updated > 0
        }

        Commands::Process { yes, output } => {
            cmd_process(&session, yes, output.as_deref(), config).await?;
            false
        }

        Commands::Stats => {
            if let Some(stats) = session.statistics() {
                print_statistics(&stats);
            }
            false
        }

        Commands::Progress { mode, search, stats, output } => {
            cmd_progress(&session, mode, search.as_deref(), stats, output.as_deref())?;
            false
        }

        Commands::Store { action } => cmd_store(&mut session, action)?,
    };

    if mutated {
        session.save_progress()?;
    }
    Ok(())
}

async fn cmd_parse_master(input: &Path, output: Option<&Path>) -> CmdResult {
    eprintln!("📄 Parsing master data: {}", input.display());

    let text = read_master_file(input).await?;
    let result = parse_master_data(&text)?;

    eprintln!(
        "   Delimiter: '{}'",
        match result.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        }
    );
    eprintln!("✅ {}", result.summary());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)
}

async fn import_master(session: &mut TransferSession, args: &MasterArgs, config: &AppConfig) -> CmdResult {
    if let Some(path) = &args.master {
        session.import_master_file(path).await?;
    } else if let Some(url) = args.master_url.as_ref().or(config.master_url.as_ref()) {
        session.import_master_url(url).await?;
    }
    Ok(())
}

/// Match a note against the known options, case-insensitively.
fn resolve_note(note: &str) -> Result<&'static str, String> {
    NOTE_OPTIONS
        .iter()
        .find(|option| option.eq_ignore_ascii_case(note.trim()))
        .copied()
        .ok_or_else(|| {
            format!(
                "Unknown note \"{}\". Use one of: {}, or \"{}\" with --custom",
                note,
                NOTE_OPTIONS[1..NOTE_OPTIONS.len() - 1].join(", "),
                OTHER_NOTE
            )
        })
}

fn cmd_list(
    session: &TransferSession,
    filter: Option<&str>,
    column: ColumnArg,
    sort: Option<SortArg>,
    desc: bool,
) {
    let rows = session.rows();
    if rows.is_empty() {
        eprintln!("📋 The table is empty.");
        eprintln!("   Use 'stocktransfer load' to add styles.");
        return;
    }

    let mut view = filter_rows(&rows, column.into(), filter.unwrap_or(""));
    let config = SortConfig {
        key: sort.map(SortKey::from),
        direction: if desc { SortDirection::Descending } else { SortDirection::Ascending },
    };
    sort_rows(&mut view, config);

    eprintln!("📋 {} of {} rows\n", view.len(), rows.len());
    println!(
        "{:>4} {:>4}  {:<12} {:<14} {:<28} {:<6} {:<6} NOTE",
        "ID", "#", "BRAND", "STYLE", "DESCRIPTION", "FROM", "TO"
    );
    for row in view {
        let marker = match row_status(&rows, row) {
            RowStatus::PartiallyAssigned => "!".to_string(),
            RowStatus::DuplicateGroup(slot) => format!("{}", slot + 1),
            RowStatus::Plain => String::new(),
        };
        println!(
            "{:>4} {:>4}  {:<12} {:<14} {:<28} {:<6} {:<6} {} {}",
            row.id,
            row.display_id,
            row.brand,
            row.style,
            row.description,
            row.from,
            row.to,
            row.resolved_note(),
            marker
        );
    }
}

async fn cmd_process(session: &TransferSession, yes: bool, output: Option<&Path>, config: &AppConfig) -> CmdResult {
    let options = ProcessOptions {
        proceed_with_incomplete: yes,
        pacing: config.processing_delay,
    };

    match session.process(&options).await {
        ProcessOutcome::Empty => Ok(()),
        ProcessOutcome::NeedsConfirmation { display_ids } => {
            let ids: Vec<String> = display_ids.iter().map(u64::to_string).collect();
            Err(format!(
                "Rows {} are missing a store. Re-run with --yes to include them.",
                ids.join(", ")
            )
            .into())
        }
        ProcessOutcome::Manifest(manifest) => {
            for group in group_manifest(&manifest) {
                let sender = if group.sender.is_empty() { "(none)" } else { group.sender.as_str() };
                eprintln!("   📦 {}: {} request(s)", sender, group.request_count());
                for receiver in &group.receivers {
                    eprintln!("      → {}: {}", receiver.receiver, receiver.requests.len());
                }
            }
            write_output(&manifest_to_string(&manifest)?, output)
        }
    }
}

fn cmd_progress(
    session: &TransferSession,
    mode: ModeArg,
    search: Option<&str>,
    stats: bool,
    output: Option<&Path>,
) -> CmdResult {
    if stats {
        print_statistics(&session.progress_statistics()?);
        return Ok(());
    }

    let saved = session.saved_progress()?;
    let search = search.unwrap_or("").replace(',', "\n");
    let view = progress_view(&saved, mode.into(), &search);

    eprintln!("📋 {} of {} saved rows", view.len(), saved.len());
    write_output(&progress_to_string(&view)?, output)
}

fn cmd_store(session: &mut TransferSession, action: StoreAction) -> Result<bool, Box<dyn std::error::Error>> {
    match action {
        StoreAction::List => {
            eprintln!("🏬 Stores ({}):", session.stores().len());
            for code in session.stores().codes() {
                println!("  {}", code);
            }
            Ok(false)
        }
        StoreAction::Add { name } => {
            session.add_store(&name)?;
            Ok(false)
        }
        StoreAction::Remove { code } => {
            session.remove_store(&code.to_uppercase())?;
            Ok(false)
        }
        StoreAction::Rename { old, new } => {
            session.rename_store(&old.to_uppercase(), &new)?;
            Ok(false)
        }
    }
}

fn print_statistics(stats: &StatisticsSnapshot) {
    println!("Total unique styles: {}\n", stats.total_unique_styles);

    println!("{:<8} {:>8} {:>8}", "SENDER", "SENT", "UNIQUE");
    for (sender, s) in &stats.sender_stats {
        println!("{:<8} {:>8} {:>8}", sender, s.total_styles_sent, s.unique_styles_sent_count);
    }

    let receivers = stats.receivers();
    if receivers.is_empty() {
        return;
    }

    print!("\n{:<8}", "FROM\\TO");
    for receiver in &receivers {
        print!(" {:>6}", receiver);
    }
    println!(" {:>6}", "TOTAL");

    for sender in stats.senders() {
        print!("{:<8}", sender);
        let mut total = 0;
        for receiver in &receivers {
            let count = stats.count(sender, receiver);
            total += count;
            print!(" {:>6}", count);
        }
        println!(" {:>6}", total);
    }

    print!("{:<8}", "TOTAL");
    for receiver in &receivers {
        print!(" {:>6}", stats.receiver_total(receiver));
    }
    println!(" {:>6}", stats.total_routed());
}

fn write_output(content: &str, path: Option<&Path>) -> CmdResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
