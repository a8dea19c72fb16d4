//! Memapps CLI - manage the applications registered with a memory service

use clap::{Parser, Subcommand, ValueEnum};
use memapps::badge;
use memapps::config::expand_path;
use memapps::dialog::SubmitOutcome;
use memapps::models::{
    parse_timestamp, AppMemory, AppStatusUpdate, FetchAppsParams, PageRequest, SortBy,
    SortDirection, DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
};
use memapps::notify::TracingNotifier;
use memapps::{Config, Core};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "memapps")]
#[command(version)]
#[command(about = "Memapps - manage applications of a memory service", long_about = None)]
struct Args {
    /// Path to configuration file (default: ~/.memapps/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Override user id
    #[arg(long)]
    user_id: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults
    #[arg(long)]
    init: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List applications
    List {
        /// Filter by name (substring)
        #[arg(long)]
        name: Option<String>,

        /// Only active (true) or inactive (false) applications
        #[arg(long)]
        active: Option<bool>,

        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort_by: SortArg,

        #[arg(long)]
        desc: bool,

        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show one application
    Show { id: String },
    /// Memories created by an application
    Memories {
        id: String,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Memories read by an application
    Accessed {
        id: String,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Mark an application active
    Activate { id: String },
    /// Mark an application inactive
    Deactivate { id: String },
    /// Register a new application
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show how a source application is labelled
    Badge { key: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Name,
    Memories,
    MemoriesAccessed,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortBy::Name,
            SortArg::Memories => SortBy::Memories,
            SortArg::MemoriesAccessed => SortBy::MemoriesAccessed,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("memapps={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = args
        .config
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(Config::default_path);

    // Handle --init flag
    if args.init {
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
            return Ok(());
        }
        Config::create_default(&config_path)?;
        tracing::info!("Created default config at: {}", config_path.display());
        return Ok(());
    }

    // Load configuration
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        tracing::debug!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };
    config.apply_env_overrides();
    for name in Config::active_env_overrides() {
        tracing::debug!("Environment override active: {}", name);
    }

    // Apply CLI overrides
    if let Some(url) = args.api_url {
        config.api.base_url = url;
    }
    if let Some(user_id) = args.user_id {
        config.user.user_id = user_id;
    }

    let Some(command) = args.command else {
        tracing::warn!("No command given; see --help");
        return Ok(());
    };

    // Badges need no server
    if let Command::Badge { key } = &command {
        let badge = badge::source_app(key);
        println!("{}  ({})", badge.render_plain(), badge.icon);
        return Ok(());
    }

    let core = Core::new(config)?;
    run(&core, command).await
}

async fn run(core: &Core, command: Command) -> anyhow::Result<()> {
    let api = core.api();

    match command {
        Command::List {
            name,
            active,
            sort_by,
            desc,
            page,
            page_size,
        } => {
            let params = FetchAppsParams {
                name,
                is_active: active,
                sort_by: sort_by.into(),
                sort_direction: if desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
                page,
                page_size,
            };
            let listing = api.fetch_apps(params).await?;
            println!("{} application(s)", listing.total);
            for app in &listing.apps {
                println!(
                    "{:<36}  {:<24} {:<8} created {:>5}  accessed {:>5}",
                    app.id,
                    badge::source_app(&app.name).render_plain(),
                    if app.is_active { "active" } else { "paused" },
                    app.total_memories_created,
                    app.total_memories_accessed
                );
            }
        }
        Command::Show { id } => {
            let details = api.fetch_app_details(&id).await?;
            println!("id:                {}", id);
            println!("active:            {}", details.is_active);
            println!("memories created:  {}", details.total_memories_created);
            println!("memories accessed: {}", details.total_memories_accessed);
            println!("first accessed:    {}", format_time(details.first_accessed.as_deref()));
            println!("last accessed:     {}", format_time(details.last_accessed.as_deref()));
        }
        Command::Memories {
            id,
            page,
            page_size,
        } => {
            let memories = api
                .fetch_app_memories(&id, PageRequest::new(page, page_size))
                .await?;
            println!(
                "page {}/{} ({} total)",
                memories.page,
                memories.page_count(page_size),
                memories.total
            );
            for memory in &memories.items {
                print_memory(memory, None);
            }
        }
        Command::Accessed {
            id,
            page,
            page_size,
        } => {
            let accessed = api
                .fetch_app_accessed_memories(&id, PageRequest::new(page, page_size))
                .await?;
            println!(
                "page {}/{} ({} total)",
                accessed.page,
                accessed.page_count(page_size),
                accessed.total
            );
            for entry in &accessed.items {
                print_memory(&entry.memory, Some(entry.access_count));
            }
        }
        Command::Activate { id } => {
            api.update_app_details(&id, AppStatusUpdate { is_active: true })
                .await?;
        }
        Command::Deactivate { id } => {
            api.update_app_details(&id, AppStatusUpdate { is_active: false })
                .await?;
        }
        Command::Create { name, description } => {
            let mut dialog = core.dialog(Arc::new(TracingNotifier));
            dialog.open();
            dialog.set_name(name);
            if let Some(description) = description {
                dialog.set_description(description);
            }
            if let Some(hint) = dialog.name_hint() {
                tracing::warn!("{}", hint);
            }
            match dialog.submit(api).await {
                SubmitOutcome::Created(app) => println!("{}", app.id),
                SubmitOutcome::Rejected(reason) => {
                    anyhow::bail!("Create rejected: {:?}", reason)
                }
                SubmitOutcome::Failed(message) => anyhow::bail!(message),
            }
        }
        Command::Badge { .. } => {}
    }

    Ok(())
}

fn print_memory(memory: &AppMemory, access_count: Option<u64>) {
    let source = memory
        .app_name
        .as_deref()
        .map(|name| badge::source_app(name).render_plain())
        .unwrap_or_default();
    let count = access_count
        .map(|n| format!(" x{}", n))
        .unwrap_or_default();
    println!(
        "{}  {}{}  {}",
        format_time(memory.created_at.as_deref()),
        source,
        count,
        memory.content
    );
}

fn format_time(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => parse_timestamp(raw)
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| raw.to_string()),
        None => "-".to_string(),
    }
}
