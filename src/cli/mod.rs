//! SH-018: CLI subcommands — init, validate, install, commands, schema, hash, list, history, completions.

use crate::collaborators::config_store::YamlConfigStore;
use crate::collaborators::fs::LocalFilesystem;
use crate::collaborators::library::{GameLibrary, LibraryEntry};
use crate::collaborators::runner::SystemRunner;
use crate::core::context::InstallContext;
use crate::core::error::{InstallError, Severity};
use crate::core::interpreter::ScriptInterpreter;
use crate::core::registry::CommandRegistry;
use crate::core::settings::Settings;
use crate::core::types::{RunResult, Validation};
use crate::journal::eventlog;
use crate::journal::hasher::{self, DigestAlgorithm};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::Write;
use std::path::{Path, PathBuf};

const RECIPE_FILE: &str = "install.yml";

#[derive(Parser, Debug)]
#[command(
    name = "stagehand",
    version,
    about = "Declarative game installer — validated recipes, closed command set, ordered steps"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter install recipe
    Init {
        /// Directory to write install.yml into (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Game slug for the template
        #[arg(long, default_value = "my-game")]
        slug: String,
    },

    /// Check a recipe's metadata and step parameters without installing
    Validate {
        /// Path to the recipe
        #[arg(short, long, default_value = RECIPE_FILE)]
        file: PathBuf,
    },

    /// Run a recipe
    Install {
        /// Path to the recipe
        #[arg(short, long, default_value = RECIPE_FILE)]
        file: PathBuf,

        /// Settings file (default: $XDG_CONFIG_HOME/stagehand/settings.toml)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Install here instead of <games_dir>/<game_slug>
        #[arg(long)]
        game_dir: Option<PathBuf>,

        /// Do not append to the install journal
        #[arg(long)]
        no_journal: bool,
    },

    /// List the commands a recipe step may use
    Commands,

    /// Print the JSON schema of a command's parameters
    Schema {
        /// Command name, e.g. move
        command: String,
    },

    /// Print a file's digest in the form a checksum step expects
    Hash {
        /// File to hash
        file: PathBuf,

        /// sha256, blake3, or md5
        #[arg(short, long, default_value = "sha256")]
        algorithm: String,
    },

    /// List installed games
    List {
        /// Settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Show the install journal of a game
    History {
        /// Game slug
        slug: String,

        /// Settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path, slug } => cmd_init(&path, &slug),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Install {
            file,
            settings,
            game_dir,
            no_journal,
        } => cmd_install(&file, settings.as_deref(), game_dir.as_deref(), no_journal),
        Commands::Commands => cmd_commands(),
        Commands::Schema { command } => cmd_schema(&command),
        Commands::Hash { file, algorithm } => cmd_hash(&file, &algorithm),
        Commands::List { settings } => cmd_list(settings.as_deref()),
        Commands::History { slug, settings } => cmd_history(&slug, settings.as_deref()),
        Commands::Completions { shell } => {
            write_completions(shell, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_init(path: &Path, slug: &str) -> Result<(), String> {
    let recipe_path = path.join(RECIPE_FILE);
    if recipe_path.exists() {
        return Err(format!("{} already exists", recipe_path.display()));
    }
    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;

    let template = format!(
        r#"name: "My Game"
game_slug: {slug}
runner: linux

steps:
  - checksum:
      file: {slug}.tar.gz
      hash: "sha256:0000000000000000000000000000000000000000000000000000000000000000"
  - extract:
      file: {slug}.tar.gz
  - mkdir: $GAMEDIR/saves
  - write_config: $GAMEDIR/{slug}/start.sh
"#
    );
    std::fs::write(&recipe_path, template)
        .map_err(|e| format!("cannot write {}: {}", recipe_path.display(), e))?;

    println!("Created {}", recipe_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let mut interp = ScriptInterpreter::from_file(file).map_err(|e| e.to_string())?;
    match interp.validate() {
        Validation::Valid => {
            let game = interp.game();
            println!(
                "OK: {} ({}, {} steps)",
                game.name,
                game.runner,
                interp.recipe().steps.len()
            );
            Ok(())
        }
        Validation::Invalid(_) | Validation::Aborted(_) => {
            print_errors(interp.errors());
            Err(format!("{} validation error(s)", interp.errors().len()))
        }
    }
}

fn cmd_install(
    file: &Path,
    settings_path: Option<&Path>,
    game_dir: Option<&Path>,
    no_journal: bool,
) -> Result<(), String> {
    let settings = load_settings(settings_path)?;
    let mut interp = ScriptInterpreter::from_file(file).map_err(|e| e.to_string())?;
    if !interp.validate().is_valid() {
        return Err(rejected(&interp));
    }
    let game = interp.game();

    let game_dir = match game_dir {
        Some(dir) => dir.to_path_buf(),
        None => settings.game_dir(&game.slug).map_err(|e| e.to_string())?,
    };
    let cache_dir = settings
        .game_cache(&game.slug)
        .map_err(|e| e.to_string())?;
    for dir in [&game_dir, &cache_dir] {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("cannot create {}: {}", dir.display(), e))?;
    }

    let fs = LocalFilesystem;
    let runner = SystemRunner::lookup(&game.runner).with_elevate(settings.elevate_command());
    let store = YamlConfigStore::new(&settings.config_dir);
    let mut ctx = InstallContext::new(&game_dir, &fs, &runner, &store).with_cache_dir(&cache_dir);
    if settings.journal && !no_journal {
        ctx = ctx.with_journal(&settings.state_dir);
    }

    match interp.install(&ctx) {
        RunResult::Succeeded { steps } => {
            print_errors(interp.errors());
            let library = GameLibrary::open(&settings.library_path).map_err(|e| e.to_string())?;
            library
                .record(&LibraryEntry {
                    slug: game.slug.clone(),
                    name: game.name.clone(),
                    runner: game.runner.clone(),
                    directory: game_dir.clone(),
                    installed_at: eventlog::now_iso8601(),
                })
                .map_err(|e| e.to_string())?;
            println!(
                "Installed {} ({} steps) into {}",
                game.name,
                steps,
                game_dir.display()
            );
            Ok(())
        }
        RunResult::Rejected(_) => Err(rejected(&interp)),
        RunResult::Failed { error, errors } => {
            print_errors(&errors);
            Err(format!("install failed: {}", error))
        }
        RunResult::Abandoned { completed } => Err(format!(
            "install abandoned after {} step(s); completed steps were not undone",
            completed
        )),
    }
}

fn rejected(interp: &ScriptInterpreter) -> String {
    print_errors(interp.errors());
    format!("recipe rejected: {} error(s)", interp.errors().len())
}

fn cmd_commands() -> Result<(), String> {
    let registry = CommandRegistry::new();
    for name in registry.names() {
        let command = registry.resolve(name).map_err(|e| e.to_string())?;
        println!("  {:<14} {}", name, command.summary());
    }
    Ok(())
}

fn cmd_schema(name: &str) -> Result<(), String> {
    let command = CommandRegistry::new()
        .resolve(name)
        .map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&command.params_schema())
        .map_err(|e| format!("JSON serialize error: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn cmd_hash(file: &Path, algorithm: &str) -> Result<(), String> {
    let algorithm = DigestAlgorithm::from_prefix(algorithm)
        .ok_or_else(|| format!("unknown digest algorithm '{}'", algorithm))?;
    println!("{}", hasher::hash_file(algorithm, file)?);
    Ok(())
}

fn cmd_list(settings_path: Option<&Path>) -> Result<(), String> {
    let settings = load_settings(settings_path)?;
    let entries = installed_games(&settings)?;
    if entries.is_empty() {
        println!("No games installed.");
        return Ok(());
    }
    for e in &entries {
        println!(
            "  {:<20} {:<10} {} ({})",
            e.slug,
            e.runner,
            e.directory.display(),
            e.installed_at
        );
    }
    Ok(())
}

fn installed_games(settings: &Settings) -> Result<Vec<LibraryEntry>, String> {
    if !settings.library_path.exists() {
        return Ok(Vec::new());
    }
    GameLibrary::open(&settings.library_path)
        .and_then(|lib| lib.list())
        .map_err(|e| e.to_string())
}

fn cmd_history(slug: &str, settings_path: Option<&Path>) -> Result<(), String> {
    let settings = load_settings(settings_path)?;
    let events = eventlog::read_events(&settings.state_dir, slug)?;
    if events.is_empty() {
        println!("No journal for {}.", slug);
        return Ok(());
    }
    for e in &events {
        let line = serde_json::to_string(&e.event)
            .map_err(|err| format!("JSON serialize error: {}", err))?;
        println!("{}  {}", e.ts, line);
    }
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "stagehand", out);
}

fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    match path {
        Some(p) => Settings::load(p),
        None => Settings::load_or_default(&Settings::default_path()),
    }
    .map_err(|e| e.to_string())
}

fn print_errors(errors: &[InstallError]) {
    for e in errors {
        let label = match e.severity() {
            Severity::Advisory => "WARNING",
            Severity::Fatal => "ERROR",
        };
        eprintln!("  {}: {}", label, e);
    }
}
