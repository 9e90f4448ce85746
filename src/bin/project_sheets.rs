use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use project_sheets::app::{App, CheckResult, CommitteesResult, FilesResult, ProjectsResult};
use project_sheets::config::{ConfigLoader, ResolvedConfig};
use project_sheets::domain::parse_number_list;
use project_sheets::downloads::{Downloads, SavedArtifact};
use project_sheets::drive::DriveHttpClient;
use project_sheets::error::SheetsError;
use project_sheets::output::{JsonOutput, OutputMode, empty_listing_message};
use project_sheets::tui::Tui;

#[derive(Parser)]
#[command(name = "project-sheets")]
#[command(about = "Project sheet dashboard over CSV files in a Google Drive folder")]
#[command(version, author)]
struct Cli {
    /// Config file (default: ./project-sheets.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Where saved artifacts are written
    #[arg(long, global = true)]
    download_dir: Option<Utf8PathBuf>,

    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List the CSV files of the Drive folder, newest first")]
    Files(FilesArgs),
    #[command(about = "Print the project identifiers of a CSV file")]
    Projects(ProjectsArgs),
    #[command(about = "Build a committee roster from a CSV file or typed-in numbers")]
    Committees(CommitteesArgs),
    #[command(about = "Check which project numbers have a sheet in the folder")]
    Check(CheckArgs),
}

#[derive(Args)]
struct FilesArgs {
    /// Every entry, not only CSV files
    #[arg(long)]
    all: bool,
}

#[derive(Args)]
struct ProjectsArgs {
    /// File id or exact file name
    file: String,

    #[arg(long)]
    column: Option<String>,

    #[arg(long)]
    save: bool,
}

#[derive(Args)]
struct CommitteesArgs {
    /// File id or exact file name
    #[arg(required_unless_present = "manual")]
    file: Option<String>,

    /// Read project numbers from a file, or `-` for stdin
    #[arg(long, conflicts_with_all = ["file", "column"])]
    manual: Option<String>,

    #[arg(long)]
    column: Option<String>,

    #[arg(long)]
    save: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// File with one project number per line; stdin when omitted or `-`
    input: Option<String>,

    #[arg(long)]
    save: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SheetsError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SheetsError) -> u8 {
    if error.is_configuration() {
        return 2;
    }
    if error.is_remote() {
        return 3;
    }
    match error {
        SheetsError::Parse(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let resolved = ConfigLoader::resolve(cli.config.as_deref())?;
    let folder_summary = resolved.folder_summary();
    let app = build_app(resolved, cli.download_dir)?;

    match cli.command {
        Some(Commands::Files(args)) => run_files(args, &app, output_mode),
        Some(Commands::Projects(args)) => run_projects(args, &app, output_mode),
        Some(Commands::Committees(args)) => run_committees(args, &app, output_mode),
        Some(Commands::Check(args)) => run_check(args, &app, output_mode),
        None => {
            if matches!(output_mode, OutputMode::Interactive) {
                Tui::run_dashboard(&app, folder_summary)
            } else {
                Err(miette::Report::msg(
                    "command required (try `project-sheets --help`)",
                ))
            }
        }
    }
}

fn build_app(
    resolved: ResolvedConfig,
    download_dir: Option<Utf8PathBuf>,
) -> miette::Result<App<DriveHttpClient>> {
    let downloads = Downloads::resolve(download_dir.or(resolved.download_dir))?;
    let drive = DriveHttpClient::new(resolved.credentials)?;
    Ok(App::new(drive, resolved.folder_id, downloads)
        .with_folder_problem(resolved.folder_id_problem))
}

fn run_files(
    args: FilesArgs,
    app: &App<DriveHttpClient>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let result = app.files(args.all, &JsonOutput)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_files(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_files(&result, args.all);
            Ok(())
        }
    }
}

fn run_projects(
    args: ProjectsArgs,
    app: &App<DriveHttpClient>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let result = app.projects(&args.file, args.column.as_deref(), args.save, &JsonOutput)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_projects(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_projects(&result);
            Ok(())
        }
    }
}

fn run_committees(
    args: CommitteesArgs,
    app: &App<DriveHttpClient>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let result = match (args.manual, args.file) {
        (Some(source), _) => {
            let numbers = read_numbers(Some(&source))?;
            app.committees_manual(&numbers, args.save, &JsonOutput)?
        }
        (None, Some(file)) => {
            app.committees_from_csv(&file, args.column.as_deref(), args.save, &JsonOutput)?
        }
        (None, None) => {
            return Err(miette::Report::msg(
                "committees needs a CSV file or --manual <PATH|->",
            ));
        }
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_committees(&result).into_diagnostic(),
        OutputMode::Interactive => print_committees(&result),
    }
}

fn run_check(
    args: CheckArgs,
    app: &App<DriveHttpClient>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let numbers = read_numbers(args.input.as_deref())?;
    let result = app.check(&numbers, args.save, &JsonOutput)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_check(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_check(&result);
            Ok(())
        }
    }
}

fn read_numbers(source: Option<&str>) -> miette::Result<Vec<String>> {
    let text = match source {
        None | Some("-") => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).into_diagnostic()?;
            buffer
        }
        Some(path) => fs::read_to_string(path)
            .map_err(|err| SheetsError::Filesystem(format!("{path}: {err}")))?,
    };
    Ok(parse_number_list(&text))
}

fn print_files(result: &FilesResult, all: bool) {
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";
    println!("{cyan}Drive folder {}{reset}", result.folder_id);
    if result.files.is_empty() {
        println!("{}", empty_listing_message(all));
    }
    for entry in &result.files {
        println!("{}", entry.label());
    }
}

fn print_projects(result: &ProjectsResult) {
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";
    let how = if result.detected { "detected" } else { "chosen" };
    println!(
        "{cyan}{} · {} rows · column {} ({how}){reset}",
        result.file.name, result.rows, result.list.column
    );
    println!("{}", result.list.render());
    print_saved(&result.saved);
}

fn print_committees(result: &CommitteesResult) -> miette::Result<()> {
    let bytes = result.roster.table.to_csv_bytes()?;
    print!("{}", String::from_utf8_lossy(&bytes));
    print_saved(&result.saved);
    Ok(())
}

fn print_check(result: &CheckResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let reset = "\x1b[0m";
    println!("{green}Proiecte cu fișă: {}{reset}", result.result.matched.len());
    for item in &result.result.matched {
        println!("{green}- {} → {}{reset}", item.number, item.files.join(", "));
    }
    println!("{yellow}Proiecte fără fișă: {}{reset}", result.result.missing.len());
    for number in &result.result.missing {
        println!("{yellow}- {number}{reset}");
    }
    print_saved(&result.saved);
}

fn print_saved(saved: &[SavedArtifact]) {
    for artifact in saved {
        println!("saved {} ({} bytes)", artifact.path, artifact.bytes);
    }
}
