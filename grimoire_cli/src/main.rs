use clap::{Parser, Subcommand};
use grimoire_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grimoire")]
#[command(about = "Spell progression engine debug console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Spellbook definition file (defaults to the built-in demo catalog)
    #[arg(long, global = true)]
    spellbook: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant XP to a spell through a source
    Grant {
        /// Spell name or id (hex with 0x prefix, or decimal)
        spell: String,
        amount: f64,

        /// XP source id
        #[arg(long, default_value = "direct")]
        source: String,
    },

    /// Grant raw XP, bypassing multipliers and caps
    Raw { spell: String, amount: f64 },

    /// Override a spell's accumulated XP
    Set { spell: String, xp: f64 },

    /// Show progress for one spell, or the whole ledger
    Progress { spell: Option<String> },

    /// Learning target control
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },

    /// XP source registry control
    Sources {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Export ledger progress to CSV
    Export {
        /// Output file (defaults to <data-dir>/progress.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TargetAction {
    /// Select a learning target (school inferred from the spell)
    Set { spell: String },
    /// Clear one school's target
    Clear { school: String },
    /// Clear every target
    ClearAll,
    /// Show current targets
    Show,
}

#[derive(Subcommand)]
enum SourceAction {
    /// List known sources
    List,
    /// Register a source with a display name
    Register { id: String, name: String },
    /// Set a source's multiplier
    Mult { id: String, value: f64 },
    /// Set a source's cap percent
    Cap { id: String, percent: f64 },
}

fn main() -> Result<()> {
    grimoire_core::logging::init();

    let cli = Cli::parse();

    let settings = Settings::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| settings.data.data_dir.clone());

    let spellbook_path = cli
        .spellbook
        .clone()
        .or_else(|| settings.data.spellbook_file.clone());
    let spellbook = match &spellbook_path {
        Some(path) => Spellbook::load_from_file(path)?,
        None => demo_spellbook().clone(),
    };

    // A broken spellbook file is a configuration error here, not a
    // live-gameplay condition, so refuse to run on one.
    let errors = spellbook.validate();
    if !errors.is_empty() {
        eprintln!("Spellbook validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::SpellbookValidation("Invalid spellbook".into()));
    }

    let mut engine = Engine::new(settings, spellbook);
    engine.subscribe(print_event);

    let state_path = data_dir.join("state.json");
    persist::load_engine(&mut engine, &state_path)?;

    match cli.command {
        Commands::Grant {
            spell,
            amount,
            source,
        } => {
            let id = parse_spell(engine.spellbook(), &spell)?;
            let granted = engine.add_sourced_xp(id, amount, &source)?;
            println!(
                "Granted {:.1} XP to {} via '{}'",
                granted,
                spell_label(&engine, id),
                source
            );
            persist::save_engine(&engine, &state_path)?;
        }

        Commands::Raw { spell, amount } => {
            let id = parse_spell(engine.spellbook(), &spell)?;
            let granted = engine.add_raw_xp(id, amount)?;
            println!("Granted {:.1} raw XP to {}", granted, spell_label(&engine, id));
            persist::save_engine(&engine, &state_path)?;
        }

        Commands::Set { spell, xp } => {
            let id = parse_spell(engine.spellbook(), &spell)?;
            engine.set_spell_xp(id, xp)?;
            println!(
                "{} set to {:.1}/{:.1} XP",
                spell_label(&engine, id),
                engine.current_xp(id),
                engine.required_xp(id)
            );
            persist::save_engine(&engine, &state_path)?;
        }

        Commands::Progress { spell } => match spell {
            Some(spell) => {
                let id = parse_spell(engine.spellbook(), &spell)?;
                print_spell_progress(&engine, id);
            }
            None => print_ledger(&engine),
        },

        Commands::Target { action } => {
            match action {
                TargetAction::Set { spell } => {
                    let id = parse_spell(engine.spellbook(), &spell)?;
                    engine.set_target(id)?;
                }
                TargetAction::Clear { school } => {
                    engine.clear_target(parse_school(&school)?);
                }
                TargetAction::ClearAll => engine.clear_all_targets(),
                TargetAction::Show => {}
            }
            print_targets(&engine);
            persist::save_engine(&engine, &state_path)?;
        }

        Commands::Sources { action } => {
            match action {
                SourceAction::List => {}
                SourceAction::Register { id, name } => engine.register_xp_source(&id, &name),
                SourceAction::Mult { id, value } => engine.set_source_multiplier(&id, value),
                SourceAction::Cap { id, percent } => engine.set_source_cap(&id, percent),
            }
            print_sources(&engine);
            persist::save_engine(&engine, &state_path)?;
        }

        Commands::Export { out } => {
            let out = out.unwrap_or_else(|| data_dir.join("progress.csv"));
            let rows = write_progress_csv(&engine, &out)?;
            println!("Exported {} rows to {}", rows, out.display());
        }
    }

    Ok(())
}

/// Resolve a spell argument: record name (case-insensitive), 0x-prefixed
/// hex id, or decimal id.
fn parse_spell(book: &Spellbook, input: &str) -> Result<SpellId> {
    if let Some(record) = book.iter().find(|r| r.name.eq_ignore_ascii_case(input)) {
        return Ok(record.id);
    }

    let parsed = if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        input.parse::<u32>().ok()
    };

    parsed
        .map(SpellId)
        .ok_or_else(|| Error::Other(format!("Unknown spell '{}'", input)))
}

fn parse_school(input: &str) -> Result<School> {
    School::ALL
        .into_iter()
        .find(|s| s.to_string().eq_ignore_ascii_case(input))
        .ok_or_else(|| Error::Other(format!("Unknown school '{}'", input)))
}

fn spell_label(engine: &Engine, id: SpellId) -> String {
    match engine.spellbook().get(id) {
        Some(record) => format!("{} ({})", record.name, id),
        None => id.to_string(),
    }
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::XpGained {
            spell,
            source,
            amount,
        } => println!("  [event] +{:.1} XP on {} via '{}'", amount, spell, source),
        EngineEvent::SpellMastered { school, spell } => {
            println!("  [event] {} spell {} mastered", school, spell)
        }
        EngineEvent::EarlyGranted { spell } => {
            println!("  [event] {} granted early by host", spell)
        }
        EngineEvent::TargetChanged { school, target } => match target {
            Some(spell) => println!("  [event] {} target -> {}", school, spell),
            None => println!("  [event] {} target cleared", school),
        },
        EngineEvent::MilestoneReached { spell, percent } => {
            println!("  [event] {} reached {}%", spell, percent)
        }
        EngineEvent::SourceRegistered { source } => {
            println!("  [event] source '{}' registered", source)
        }
    }
}

fn print_spell_progress(engine: &Engine, id: SpellId) {
    println!(
        "{}: {:.1}/{:.1} XP ({:.0}%){}{}",
        spell_label(engine, id),
        engine.current_xp(id),
        engine.required_xp(id),
        engine.progress_percent(id),
        if engine.is_mastered(id) { " [mastered]" } else { "" },
        if engine.is_available_to_learn(id) {
            " [available]"
        } else {
            ""
        },
    );
}

fn print_ledger(engine: &Engine) {
    let mut ids: Vec<SpellId> = engine.ledger().entries().map(|(id, _)| id).collect();
    if ids.is_empty() {
        println!("No spells trained yet.");
        return;
    }
    ids.sort_unstable();
    for id in ids {
        print_spell_progress(engine, id);
    }
}

fn print_targets(engine: &Engine) {
    println!("Learning mode: {}", engine.mode());
    let targets = engine.get_all_targets();
    if targets.is_empty() {
        println!("No learning targets set.");
        return;
    }
    for (school, spell) in targets {
        println!("  {}: {}", school, spell_label(engine, spell));
    }
}

fn print_sources(engine: &Engine) {
    let mut sources: Vec<(&str, &XpSourceDescriptor)> = engine.sources().iter().collect();
    sources.sort_by_key(|(id, _)| *id);
    for (id, descriptor) in sources {
        println!(
            "  {:<12} '{}' x{:.2}, cap {:.0}%",
            id, descriptor.display_name, descriptor.multiplier, descriptor.cap_percent
        );
    }
}
