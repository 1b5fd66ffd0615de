//! Binary entrypoint for the `sololevel` CLI.
//!
//! Every command loads the game store named by the config, runs one operation
//! and prints the result as JSON on stdout. Logs go to stderr and, when
//! configured, to a log file.
//!
//! See the library crate docs for module-level details: `sololevel::`.
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use serde::Serialize;

use sololevel::backup::{BackupKind, BackupManager, RetentionPolicy};
use sololevel::config::{Config, DEFAULT_CONFIG_PATH};
use sololevel::game::{
    effective_stats, xp_progress_percentage, GameService, GameState, NewQuest, QuestType,
    SledGameStore, SledGameStoreBuilder, Stats, TaskCompletionEvent, TaskType,
};
use sololevel::metrics;
use sololevel::validation::parse_completion_time;

#[derive(Parser)]
#[command(name = "sololevel")]
#[command(about = "Level up by getting things done: quests, streaks and dungeon runs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file and create the data directory
    Init,
    /// Create the starter game state for a new user
    Register { user_id: u64, username: String },
    /// Print a user's game state
    Show { user_id: u64 },
    /// Complete a quest task, streak or dungeon run
    Complete {
        user_id: u64,
        /// quest, streak or dungeon
        #[arg(long = "type")]
        task_type: String,
        /// Quest, streak or dungeon run id
        #[arg(long)]
        id: String,
        /// Quest task id (quests only)
        #[arg(long)]
        task: Option<String>,
        /// Completion time as RFC 3339; defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Grant XP directly
    AddXp {
        user_id: u64,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Create a custom quest
    CreateQuest {
        user_id: u64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// daily, weekly, achievement or storyline
        #[arg(long = "type", default_value = "daily")]
        quest_type: String,
        /// Task description; repeat for each task
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
        #[arg(long, allow_negative_numbers = true)]
        xp: i64,
        /// Deadline as RFC 3339
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Create a dungeon run (timed focus session)
    CreateDungeon {
        user_id: u64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        #[arg(long, allow_negative_numbers = true)]
        xp: i64,
    },
    /// Create a daily streak habit
    CreateStreak {
        user_id: u64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Equip or unequip an inventory item
    Equip { user_id: u64, item_id: String },
    /// Activate or deactivate a skill
    ToggleSkill { user_id: u64, skill_id: String },
    /// Discard all progress and start over
    Reset {
        user_id: u64,
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Print a user's progress analytics
    Analytics { user_id: u64 },
    /// Print store status
    Status,
    /// Manage backups of the game store
    Backup {
        #[command(subcommand)]
        action: BackupCommand,
    },
}

#[derive(Subcommand)]
enum BackupCommand {
    /// Archive the game store
    Create {
        #[arg(long)]
        name: Option<String>,
        /// Mark as automatic so `prune` may remove it later
        #[arg(long)]
        automatic: bool,
    },
    /// List backups, newest first
    List,
    /// Check a backup's checksum
    Verify { id: String },
    /// Restore a backup into the configured data directory
    Restore {
        id: String,
        /// Replace an existing store
        #[arg(long)]
        force: bool,
    },
    /// Delete automatic backups beyond the retention count
    Prune,
}

/// `show` output: the stored snapshot plus derived display values.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateView {
    game_state: GameState,
    xp_progress: u32,
    effective_stats: Stats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    version: &'static str,
    data_dir: String,
    users: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            // Init runs before a config exists
            init_logging(&None, cli.verbose);
            init(&cli.config).await
        }
        Commands::Backup { action } => {
            let config = load_config(&cli.config, cli.verbose).await?;
            run_backup(&config, action)
        }
        command => {
            let config = load_config(&cli.config, cli.verbose).await?;
            let service = GameService::new(open_store(&config)?);
            run_game_command(&service, &config, command)?;
            // Counters only live for this process
            debug!("engine counters: {}", serde_json::to_string(&metrics::snapshot())?);
            Ok(())
        }
    }
}

async fn load_config(path: &str, verbosity: u8) -> Result<Config> {
    let config = Config::load_or_default(path).await?;
    init_logging(&Some(config.clone()), verbosity);
    Ok(config)
}

async fn init(config_path: &str) -> Result<()> {
    if tokio::fs::try_exists(config_path).await.unwrap_or(false) {
        warn!("{} already exists; leaving it unchanged", config_path);
    } else {
        Config::create_default(config_path).await?;
        info!("Wrote default configuration to {}", config_path);
    }
    let config = Config::load(config_path).await?;
    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .with_context(|| format!("creating {}", config.storage.data_dir))?;
    println!("Initialized. Data directory: {}", config.storage.data_dir);
    Ok(())
}

fn open_store(config: &Config) -> Result<SledGameStore> {
    let path = config.storage.gamestate_path();
    SledGameStoreBuilder::new(&path)
        .max_update_attempts(config.storage.max_update_attempts)
        .open()
        .with_context(|| format!("opening game store at {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_game_command(service: &GameService<SledGameStore>, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Register { user_id, username } => print_json(&service.register(user_id, &username)?),
        Commands::Show { user_id } => {
            let state = service.game_data(user_id)?;
            print_json(&StateView {
                xp_progress: xp_progress_percentage(state.current_xp, state.required_xp),
                effective_stats: effective_stats(&state),
                game_state: state,
            })
        }
        Commands::Complete {
            user_id,
            task_type,
            id,
            task,
            at,
        } => {
            let completion_time = match at {
                Some(raw) => parse_completion_time(&raw)?,
                None => chrono::Utc::now(),
            };
            let task_type = TaskType::from(task_type.trim().to_ascii_lowercase());
            if task_type == TaskType::Unknown {
                warn!("unknown task type; the event will not change anything");
            }
            let event = TaskCompletionEvent {
                task_type,
                id,
                task_id: task,
                completion_time,
            };
            print_json(&service.complete_task(user_id, event)?)
        }
        Commands::AddXp { user_id, amount } => print_json(&service.add_experience(user_id, amount)?),
        Commands::CreateQuest {
            user_id,
            name,
            description,
            quest_type,
            tasks,
            xp,
            deadline,
        } => {
            let quest_type = QuestType::parse(&quest_type)
                .with_context(|| format!("unknown quest type '{}'", quest_type))?;
            let deadline = deadline.as_deref().map(parse_completion_time).transpose()?;
            let quest = NewQuest {
                name,
                description,
                quest_type,
                tasks,
                xp_reward: xp,
                deadline,
            };
            print_json(&service.create_quest(user_id, quest)?)
        }
        Commands::CreateDungeon {
            user_id,
            name,
            description,
            duration,
            xp,
        } => print_json(&service.create_dungeon(user_id, &name, &description, duration, xp)?),
        Commands::CreateStreak {
            user_id,
            name,
            description,
        } => print_json(&service.create_streak(user_id, &name, &description)?),
        Commands::Equip { user_id, item_id } => print_json(&service.toggle_equip(user_id, &item_id)?),
        Commands::ToggleSkill { user_id, skill_id } => print_json(&service.toggle_skill(user_id, &skill_id)?),
        Commands::Reset { user_id, yes } => {
            if !yes {
                anyhow::bail!("reset discards all progress; re-run with --yes to confirm");
            }
            print_json(&service.reset(user_id)?)
        }
        Commands::Analytics { user_id } => print_json(&service.analytics(user_id)?),
        Commands::Status => print_json(&StatusView {
            version: env!("CARGO_PKG_VERSION"),
            data_dir: config.storage.data_dir.clone(),
            users: service.user_count()?,
        }),
        Commands::Init | Commands::Backup { .. } => anyhow::bail!("not a game command"),
    }
}

fn run_backup(config: &Config, action: BackupCommand) -> Result<()> {
    let mut manager = BackupManager::new(
        config.storage.gamestate_path(),
        config.backup.dir.clone().into(),
        RetentionPolicy::from(&config.backup),
    )?;

    match action {
        BackupCommand::Create { name, automatic } => {
            let kind = if automatic {
                BackupKind::Automatic
            } else {
                BackupKind::Manual
            };
            print_json(&manager.create_backup(name, kind)?)
        }
        BackupCommand::List => print_json(&manager.list_backups()),
        BackupCommand::Verify { id } => {
            let valid = manager.verify_backup(&id)?;
            print_json(&serde_json::json!({ "id": id, "valid": valid }))?;
            if !valid {
                anyhow::bail!("backup {} failed verification", id);
            }
            Ok(())
        }
        BackupCommand::Restore { id, force } => {
            let restored = manager.restore_backup(&id, Path::new(&config.storage.data_dir), force)?;
            print_json(&serde_json::json!({ "id": id, "restoredTo": restored }))
        }
        BackupCommand::Prune => print_json(&manager.apply_retention_policy()?),
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when someone is watching stderr
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_only_persistent_facts() {
        let view = StatusView {
            version: "0.0.0",
            data_dir: "./data".to_string(),
            users: 3,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["dataDir"], "./data");
        assert_eq!(json["users"], 3);
        assert_eq!(json.as_object().unwrap().len(), 3);
    }
}
