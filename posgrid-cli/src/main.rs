mod error;
mod paths;
mod rows;

use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use posgrid_lib::DataTable;
use posgrid_lib::column::SELECTION_COLUMN_ID;
use posgrid_lib::config::EngineConfig;
use posgrid_lib::config::TableFeatures;
use posgrid_lib::identity::StaticSession;
use posgrid_lib::presets::PresetScope;
use posgrid_lib::state::ColumnSort;
use posgrid_lib::store::SqliteStore;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use crate::error::CliError;
use crate::rows::JsonRow;
use crate::rows::RowFile;

/// Browse a JSON row file through the table engine.
///
/// Column layout and presets persist per table, tenant and user.
#[derive(Debug, Parser)]
#[command(name = "posgrid", version)]
struct Cli {
    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// Preference database (defaults to the platform data directory).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[arg(long, global = true, default_value = "default")]
    tenant: String,

    #[arg(long, global = true, default_value = "anonymous")]
    user: String,

    /// Role used to authorize ROLE presets.
    #[arg(long, global = true)]
    role: Option<String>,
}

#[derive(Debug, Args)]
struct TableArgs {
    /// JSON file holding an array of row objects.
    file: PathBuf,

    /// Field used as the stable row key.
    #[arg(long, default_value = "id")]
    key: String,

    /// Columns to show, in order (defaults to every field).
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Explicit table id instead of one derived from the file name and columns.
    #[arg(long)]
    table_id: Option<String>,
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// Global search.
    #[arg(long, short)]
    search: Option<String>,

    /// Sort by `column` or `column:desc`. Repeat for multi-column sorting.
    #[arg(long, value_parser = parse_sort)]
    sort: Vec<ColumnSort>,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long)]
    page_size: Option<usize>,

    /// Hide a column. Persists as a preference.
    #[arg(long)]
    hide: Vec<String>,

    /// Show a previously hidden column. Persists as a preference.
    #[arg(long)]
    show: Vec<String>,

    /// Forget the stored column layout.
    #[arg(long)]
    reset_layout: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print one page of rows.
    Show {
        #[command(flatten)]
        table: TableArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Manage saved views.
    Presets {
        #[command(subcommand)]
        command: PresetCommand,
    },
}

#[derive(Debug, Subcommand)]
enum PresetCommand {
    /// List presets visible to the current user.
    List {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Save the view described by the options as a preset.
    Save {
        #[command(flatten)]
        table: TableArgs,
        name: String,
        #[arg(long, value_enum, default_value_t = ScopeArg::User)]
        scope: ScopeArg,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Apply a preset by name and print the first page.
    Apply {
        #[command(flatten)]
        table: TableArgs,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    User,
    Role,
}

impl From<ScopeArg> for PresetScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::User => PresetScope::User,
            ScopeArg::Role => PresetScope::Role,
        }
    }
}

fn parse_sort(value: &str) -> Result<ColumnSort, String> {
    match value.split_once(':') {
        None => Ok(ColumnSort::asc(value)),
        Some((id, "asc")) => Ok(ColumnSort::asc(id)),
        Some((id, "desc")) => Ok(ColumnSort::desc(id)),
        Some((_, direction)) => Err(format!("unknown sort direction: {direction}")),
    }
}

fn init_logging() {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else { return };
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        eprintln!("could not create log directory: {e}");
        return;
    }
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(LevelFilter::Debug, Config::default(), file) {
                eprintln!("could not initialize logger: {e}");
            }
        }
        Err(e) => eprintln!("could not create {}: {e}", path.display()),
    }
}

async fn open_store(db: Option<&Path>) -> Result<SqliteStore, CliError> {
    let path = match db {
        Some(path) => path.to_path_buf(),
        None => paths::store_db().ok_or(CliError::NoDataDir)?,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    log::info!("Opening store at {}", path.display());
    Ok(SqliteStore::open(&path).await?)
}

async fn open_table(session: &SessionArgs, args: &TableArgs) -> Result<DataTable<JsonRow>, CliError> {
    let file = RowFile::load(&args.file, &args.key)?;
    let columns = file.columns(&args.columns)?;
    let store = Arc::new(open_store(session.db.as_deref()).await?);

    let mut identity = StaticSession::new(&session.tenant, &session.user);
    if let Some(role) = &session.role {
        identity = identity.with_role(role);
    }

    let stem = args
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut builder = DataTable::builder(columns)
        .data(file.rows)
        .config(EngineConfig::default())
        .features(TableFeatures::default().with_multi_sort(true))
        .route(format!("/files/{stem}"))
        .session(Arc::new(identity))
        .store(store);
    if let Some(table_id) = &args.table_id {
        builder = builder.table_id(table_id);
    }

    let mut table = builder.build()?;
    table.mount().await;
    Ok(table)
}

fn apply_view(table: &mut DataTable<JsonRow>, view: &ViewArgs) -> Result<(), CliError> {
    if view.reset_layout {
        table.reset_layout();
    }
    for id in view.hide.iter().chain(&view.show).chain(view.sort.iter().map(|sort| &sort.id)) {
        if !table.columns().is_leaf(id) {
            return Err(CliError::UnknownColumn(id.clone()));
        }
    }

    for id in &view.hide {
        table.set_column_visibility(id, false);
    }
    for id in &view.show {
        table.set_column_visibility(id, true);
    }
    if let Some(size) = view.page_size {
        table.set_page_size(size);
    }
    if let Some(search) = &view.search {
        table.set_search(search.as_str());
    }
    if !view.sort.is_empty() {
        table.set_sorting(view.sort.clone());
    }
    table.set_page_index(view.page.saturating_sub(1));
    Ok(())
}

fn print_page(table: &DataTable<JsonRow>) {
    let columns: Vec<String> = table
        .visible_columns()
        .into_iter()
        .filter(|id| id != SELECTION_COLUMN_ID)
        .collect();
    let labels: Vec<String> = columns
        .iter()
        .map(|id| {
            table
                .columns()
                .node(id)
                .map(|node| node.label().to_string())
                .unwrap_or_else(|| id.clone())
        })
        .collect();
    let cells: Vec<Vec<String>> = table
        .page_rows()
        .into_iter()
        .map(|row| columns.iter().map(|id| table.render_cell(row, id)).collect())
        .collect();

    let mut widths: Vec<usize> = labels.iter().map(|label| label.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(&labels));
    println!(
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &cells {
        println!("{}", line(row));
    }

    let pages = table.page_count().unwrap_or(1);
    println!(
        "\npage {} of {} ({} matching rows)",
        table.state().page_index + 1,
        pages,
        table.filtered_count(),
    );
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Show { table: args, view } => {
            let mut table = open_table(&cli.session, &args).await?;
            apply_view(&mut table, &view)?;
            print_page(&table);
            table.flush().await;
        }
        Command::Presets { command } => match command {
            PresetCommand::List { table: args } => {
                let table = open_table(&cli.session, &args).await?;
                if table.presets().is_empty() {
                    println!("no presets for {}", table.table_id());
                }
                for preset in table.presets() {
                    println!(
                        "{:<24} {:<5} {:<12} {}",
                        preset.name,
                        preset.scope,
                        preset.owner,
                        preset.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            PresetCommand::Save {
                table: args,
                name,
                scope,
                view,
            } => {
                let mut table = open_table(&cli.session, &args).await?;
                apply_view(&mut table, &view)?;
                let preset = table.save_preset(&name, scope.into()).await?;
                println!("saved {} preset {:?} ({})", preset.scope, preset.name, preset.id);
                table.flush().await;
            }
            PresetCommand::Apply { table: args, name } => {
                let mut table = open_table(&cli.session, &args).await?;
                let id = table
                    .presets()
                    .iter()
                    .rev()
                    .find(|preset| preset.name == name)
                    .map(|preset| preset.id.clone())
                    .ok_or_else(|| CliError::PresetNotFound(name.clone()))?;
                table.apply_preset(&id);
                print_page(&table);
                table.flush().await;
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("price").unwrap(), ColumnSort::asc("price"));
        assert_eq!(parse_sort("price:desc").unwrap(), ColumnSort::desc("price"));
        assert!(parse_sort("price:up").is_err());
    }

    #[test]
    fn test_show_arguments() {
        let cli = Cli::parse_from([
            "posgrid", "show", "menu.json", "--key", "sku", "--sort", "price:desc", "--sort",
            "name", "--hide", "stock", "--user", "ana",
        ]);
        let Command::Show { table, view } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(table.key, "sku");
        assert_eq!(view.sort, [ColumnSort::desc("price"), ColumnSort::asc("name")]);
        assert_eq!(view.hide, ["stock"]);
        assert_eq!(cli.session.user, "ana");
    }
}
