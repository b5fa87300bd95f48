use clap::{Args, Parser, Subcommand};
use tasklist::config::{TasklistConfig, default_config_path};
use tasklist::core::query::{SortOrder, TaskField, TaskView};
use tasklist::render::render_list;
use tasklist::storage::{FileStore, TaskStorage};
use tasklist::store::{TaskDraft, TaskStore};
use tasklist::sync::RemoteLoader;

#[derive(Parser, Debug)]
#[command(
    name = "tasklist",
    version,
    about = "Keep a task list in sync with a remote feed and your local edits"
)]
struct Cli {
    /// Skip the remote feed and only restore saved tasks
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Show tasks (the default)
    List(ListArgs),
    /// Add a task
    Add(AddArgs),
    /// Remove a task by id
    Remove { id: String },
    /// Mark a task as done
    Check { id: String },
    /// Mark a task as not done
    Uncheck { id: String },
}

#[derive(Args, Debug, Default, PartialEq, Eq)]
struct ListArgs {
    /// Only show tasks whose field equals the value exactly
    #[arg(long, value_name = "FIELD=VALUE", value_parser = parse_filter)]
    filter: Option<(TaskField, String)>,

    /// Sort by one field: id, category, urgency, date, content, user or checked
    #[arg(long, value_name = "FIELD[:asc|:desc]", value_parser = parse_order)]
    order: Option<(TaskField, SortOrder)>,
}

impl From<ListArgs> for TaskView {
    fn from(args: ListArgs) -> Self {
        TaskView {
            filter: args.filter,
            order: args.order,
        }
    }
}

#[derive(Args, Debug, PartialEq, Eq)]
struct AddArgs {
    #[arg(long)]
    content: String,

    #[arg(long)]
    user: String,

    /// unurgent, low, medium, high or urgent (default low)
    #[arg(long, default_value = "")]
    urgency: String,

    /// 1-based category index (default 1)
    #[arg(long, default_value = "")]
    category: String,

    /// Due date, e.g. 2025-01-08
    #[arg(long, default_value = "")]
    date: String,
}

impl From<AddArgs> for TaskDraft {
    fn from(args: AddArgs) -> Self {
        TaskDraft {
            content: args.content,
            user: args.user,
            urgency: args.urgency,
            category: args.category,
            date: args.date,
        }
    }
}

fn parse_filter(value: &str) -> Result<(TaskField, String), String> {
    let (field, wanted) = value
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {}", value))?;
    Ok((field.parse::<TaskField>()?, wanted.to_string()))
}

fn parse_order(value: &str) -> Result<(TaskField, SortOrder), String> {
    let (field, order) = match value.split_once(':') {
        Some((field, order)) => (field, order.parse::<SortOrder>()?),
        None => (value, SortOrder::Ascending),
    };
    Ok((field.parse::<TaskField>()?, order))
}

fn init_logging(debug: bool) {
    use log::Log as _;

    // Logs go to the systemd user journal (`journalctl --user -t tasklist -f`).
    // tasklist targets at info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("tasklist") {
                let max = if tasklist::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    tasklist::set_debug_logging(debug);

    match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => {
            let journal = journal.with_syslog_identifier("tasklist".to_string());
            if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
                // Global max must be Debug so the debug toggle can take effect
                log::set_max_level(log::LevelFilter::Debug);
            }
        }
        Err(e) => {
            if debug {
                eprintln!("tasklist: journal logging unavailable: {}", e);
            }
        }
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = default_config_path();
    let (config, config_error) = match TasklistConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (TasklistConfig::default(), Some(e)),
    };
    let config = config.with_env();

    init_logging(config.debug_logging);
    if let Some(e) = config_error {
        log::warn!("Ignoring config at {}: {}", config_path.display(), e);
    }

    log::debug!("Using task storage at {}", config.storage_path().display());
    let storage = TaskStorage::new(
        FileStore::new(&config.data_directory),
        config.storage_key.clone(),
    );
    let mut store = TaskStore::new(storage);

    match config.remote_url().filter(|_| !cli.offline) {
        Some(url) => match RemoteLoader::new(url) {
            Ok(loader) => store.load(&loader, now()).await,
            Err(e) => {
                log::error!("Failed to set up remote loader: {}", e);
                store.load_offline(now());
            }
        },
        None => store.load_offline(now()),
    }

    let command = cli.command.unwrap_or(Command::List(ListArgs::default()));
    if let Command::List(args) = command {
        store.set_view(args.into());
        print!("{}", render_list(&store.visible()));
        return;
    }

    store.set_listener(|tasks| print!("{}", render_list(tasks)));

    match command {
        Command::Add(args) => match store.add_task(args.into(), now()) {
            Ok(id) => println!("Added task {}", id),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        Command::Remove { id } => exit_unless_found(store.remove_task(id.as_str()), &id),
        Command::Check { id } => exit_unless_found(store.set_checked(id.as_str(), true), &id),
        Command::Uncheck { id } => exit_unless_found(store.set_checked(id.as_str(), false), &id),
        Command::List(_) => {}
    }
}

fn exit_unless_found(found: bool, id: &str) {
    if !found {
        eprintln!("No task with id {}", id);
        std::process::exit(1);
    }
}
