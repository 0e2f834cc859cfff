//! Command line front end
//!
//! Each invocation bootstraps a session, runs one command against it and
//! exits; `run` keeps the rotation loop going until interrupted.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::color::HexColor;
use crate::config::AppConfig;
use crate::draft::{SettingChange, SettingsDraft};
use crate::presets::PresetStore;
use crate::rotation::{RotationConfig, RotationScheduler};
use crate::session::Session;
use crate::state::ConfigState;
use crate::storage::KeyValueStore;
use crate::types::{BackgroundPatch, BackgroundRepeat, BackgroundSize, Rotation};

#[derive(Parser, Debug)]
#[command(name = "tabboard", version, about = "Dashboard settings and preset manager")]
pub struct Cli {
    /// Directory holding storage.json (overrides config.json)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Ignore the saved session and start from the newest preset
    #[arg(long, global = true)]
    pub fresh: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the live settings
    Show,
    /// Manage presets
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },
    /// Change a setting
    Set {
        #[command(subcommand)]
        field: SetField,
    },
    /// Adjust one background's tunables
    Background(BackgroundArgs),
    /// Rotate background and quote once
    Next,
    /// Run the rotation timer
    Run {
        /// Stop after this many rotations
        #[arg(long)]
        ticks: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PresetAction {
    List,
    Load { id: Uuid },
    /// Save the live settings as a new preset
    Save { name: String },
    /// Overwrite the selected preset with the live settings
    Update,
    Delete { id: Uuid },
    /// Write the live settings to a JSON file
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SetField {
    TimeColor { color: HexColor },
    QuoteColor { color: HexColor },
    /// Seconds between rotations (5-300)
    Interval { seconds: u32 },
    Paused {
        #[arg(action = ArgAction::Set)]
        paused: bool,
    },
    /// Replace quotes from a text file (text/author pairs, blank line between)
    Quotes { file: PathBuf },
    /// Replace backgrounds from a text file (url/name pairs, blank line between)
    Backgrounds { file: PathBuf },
}

#[derive(Args, Debug)]
pub struct BackgroundArgs {
    /// Background id (defaults to the one on screen)
    pub id: Option<Uuid>,
    #[arg(long)]
    pub scale: Option<f32>,
    #[arg(long)]
    pub rotation: Option<Rotation>,
    #[arg(long)]
    pub size: Option<BackgroundSize>,
    #[arg(long)]
    pub repeat: Option<BackgroundRepeat>,
    /// Advance the repeat mode to the next option
    #[arg(long, conflicts_with = "repeat")]
    pub cycle_repeat: bool,
    #[arg(long)]
    pub blur: Option<u8>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
}

impl BackgroundArgs {
    fn patch(&self) -> BackgroundPatch {
        BackgroundPatch {
            url: self.url.clone(),
            name: self.name.clone(),
            scale: self.scale,
            rotation: self.rotation,
            size: self.size.clone(),
            repeat: self.repeat,
            blur: self.blur,
        }
    }
}

/// Bootstrap the session for one invocation
///
/// Each invocation is its own process, so edits only survive into the next
/// one through the stored snapshot; resuming is the default.
pub fn open_session<S: KeyValueStore + Clone>(
    store: S,
    config: &AppConfig,
    fresh: bool,
) -> Session<S> {
    let presets = PresetStore::new(store.clone()).with_presets_dir(config.presets_dir.clone());
    let resume = config.resume_session && !fresh;
    Session::bootstrap(store, presets, resume)
}

pub async fn execute<S: KeyValueStore>(
    command: Command,
    session: &mut Session<S>,
    config: &AppConfig,
) -> Result<()> {
    match command {
        Command::Show => print_state(session.state()),
        Command::Presets { action } => execute_preset_action(action, session, config)?,
        Command::Set { field } => execute_set(field, session)?,
        Command::Background(args) => execute_background(&args, session)?,
        Command::Next => {
            session.update(rotate)?;
            print_state(session.state());
        }
        Command::Run { ticks } => run_rotation(session, ticks).await?,
    }
    Ok(())
}

fn execute_preset_action<S: KeyValueStore>(
    action: PresetAction,
    session: &mut Session<S>,
    config: &AppConfig,
) -> Result<()> {
    match action {
        PresetAction::List => {
            let current = session.state().current_preset_id();
            for preset in session.presets().load_presets()? {
                let marker = if Some(preset.id) == current { "*" } else { " " };
                println!(
                    "{} {}  {:<24} {:<8} {}",
                    marker,
                    preset.id,
                    preset.name,
                    if preset.is_premade() { "premade" } else { "user" },
                    preset.last_modified.format("%Y-%m-%d %H:%M")
                );
            }
        }
        PresetAction::Load { id } => {
            if !session.load_preset_by_id(id)? {
                bail!("No preset with id {id}");
            }
            print_state(session.state());
        }
        PresetAction::Save { name } => {
            let preset = session.save_as_preset(&name)?;
            println!("Saved preset {} ({})", preset.name, preset.id);
        }
        PresetAction::Update => {
            if !session.save_to_current_preset()? {
                bail!("The selected preset cannot be updated; save a new one instead");
            }
            println!("Preset updated");
        }
        PresetAction::Delete { id } => {
            if !session.delete_preset(id)? {
                bail!("Preset {id} is premade or does not exist");
            }
            println!("Preset deleted");
        }
        PresetAction::Export { out } => {
            let dir = out.unwrap_or_else(|| config.export_dir());
            let path = session.export_current(&dir)?;
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

fn execute_set<S: KeyValueStore>(field: SetField, session: &mut Session<S>) -> Result<()> {
    let change = match field {
        SetField::TimeColor { color } => SettingChange::TimeColor(color),
        SetField::QuoteColor { color } => SettingChange::QuoteColor(color),
        SetField::Interval { seconds } => SettingChange::RotationInterval(seconds),
        SetField::Paused { paused } => SettingChange::RotationPaused(paused),
        SetField::Quotes { file } => {
            let mut draft = SettingsDraft::from_settings(session.state().settings());
            draft.quotes_text = read_text(&file)?;
            return commit_draft(session, &draft);
        }
        SetField::Backgrounds { file } => {
            let mut draft = SettingsDraft::from_settings(session.state().settings());
            draft.backgrounds_text = read_text(&file)?;
            return commit_draft(session, &draft);
        }
    };

    session.update(|state| state.apply(change))?;
    print_state(session.state());
    Ok(())
}

fn commit_draft<S: KeyValueStore>(session: &mut Session<S>, draft: &SettingsDraft) -> Result<()> {
    let pending = draft.changes(session.state()).len();
    let accepted = session.update(|state| state.apply_draft(draft))?;

    if accepted < pending {
        bail!("No valid entries found; entries are two lines separated by a blank line");
    }
    info!(changes = accepted, "Committed settings draft");
    print_state(session.state());
    Ok(())
}

fn execute_background<S: KeyValueStore>(
    args: &BackgroundArgs,
    session: &mut Session<S>,
) -> Result<()> {
    let id = args
        .id
        .unwrap_or_else(|| session.state().current_background().id);
    if !session.state().settings().backgrounds.iter().any(|b| b.id == id) {
        bail!("No background with id {id}");
    }

    let patch = args.patch();
    if patch.is_empty() && !args.cycle_repeat {
        bail!("Nothing to change; pass at least one option");
    }

    session.update(|state| {
        if !patch.is_empty() {
            state.set_background_config(id, &patch);
        }
        if args.cycle_repeat {
            state.next_background_repeat(id);
        }
    })?;

    print_state(session.state());
    Ok(())
}

fn rotate(state: &mut ConfigState) {
    state.randomize_background();
    state.randomize_quote();
}

async fn run_rotation<S: KeyValueStore>(
    session: &mut Session<S>,
    max_ticks: Option<u64>,
) -> Result<()> {
    let config = RotationConfig::from_settings(session.state().settings());
    if config.is_paused() {
        warn!("Rotation is paused; waiting for Ctrl-C");
    }
    info!(period_secs = config.period().as_secs(), "Rotation loop running");

    let (mut scheduler, mut ticks) = RotationScheduler::spawn(config);

    loop {
        tokio::select! {
            tick = ticks.recv() => {
                let Some(tick) = tick else {
                    break;
                };
                session.update(rotate)?;
                let state = session.state();
                info!(
                    sequence = tick.sequence,
                    background = %state.current_background().name,
                    quote = ?state.current_quote().map(|q| q.author.as_str()),
                    "Rotated"
                );
                scheduler.reconfigure(RotationConfig::from_settings(state.settings()));

                if max_ticks.is_some_and(|max| tick.sequence >= max) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping rotation");
                break;
            }
        }
    }

    scheduler.shutdown();
    Ok(())
}

fn print_state(state: &ConfigState) {
    let settings = state.settings();
    let background = state.current_background();

    match state.current_preset_id() {
        Some(id) => println!(
            "Preset:      {}{}",
            id,
            if state.is_modified() { " (modified)" } else { "" }
        ),
        None => println!("Preset:      none"),
    }
    println!("Time color:  {}", settings.time_color);
    println!("Quote color: {}", settings.quote_color);
    println!(
        "Rotation:    every {}s{}",
        settings.rotation_interval,
        if settings.is_rotation_paused { " (paused)" } else { "" }
    );

    if let Some(quote) = state.current_quote() {
        println!();
        println!("  \"{}\"", quote.text);
        println!("    - {}", quote.author);
    }

    println!();
    println!("Backgrounds:");
    for entry in &settings.backgrounds {
        let marker = if entry.id == background.id { "*" } else { " " };
        println!(
            "{} {}  {}  scale={} rotate={}deg size={} repeat={} blur={}px",
            marker,
            entry.id,
            entry.name,
            entry.scale,
            entry.rotation.degrees(),
            entry.size.as_css(),
            entry.repeat.as_css(),
            entry.blur
        );
        println!("      {}", entry.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::storage::MemoryStore;
    use tempfile::tempdir;

    fn session(store: &MemoryStore) -> Session<MemoryStore> {
        open_session(store.clone(), &AppConfig::default(), false)
    }

    fn cycle_args(id: Option<Uuid>) -> BackgroundArgs {
        BackgroundArgs {
            id,
            scale: None,
            rotation: None,
            size: None,
            repeat: None,
            cycle_repeat: true,
            blur: None,
            url: None,
            name: None,
        }
    }

    fn repeat_of(session: &Session<MemoryStore>, id: Uuid) -> BackgroundRepeat {
        session
            .state()
            .settings()
            .backgrounds
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.repeat)
            .unwrap()
    }

    #[test]
    fn test_cycle_repeat_targets_named_background() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        let shown = session.state().current_background().id;
        let other = session
            .state()
            .settings()
            .backgrounds
            .iter()
            .find(|b| b.id != shown)
            .map(|b| b.id)
            .unwrap();

        execute_background(&cycle_args(Some(other)), &mut session).unwrap();

        assert_eq!(repeat_of(&session, other), BackgroundRepeat::Repeat);
        assert_eq!(repeat_of(&session, shown), BackgroundRepeat::NoRepeat);
        assert_eq!(session.state().current_background().repeat, BackgroundRepeat::NoRepeat);
    }

    #[test]
    fn test_background_defaults_to_shown_background_across_runs() {
        let store = MemoryStore::new();
        let shown = session(&store).state().current_background().id;

        let mut next_run = session(&store);
        assert_eq!(next_run.state().current_background().id, shown);
        execute_background(&cycle_args(None), &mut next_run).unwrap();

        assert_eq!(repeat_of(&session(&store), shown), BackgroundRepeat::Repeat);
    }

    #[test]
    fn test_background_unknown_id_changes_nothing() {
        let store = MemoryStore::new();
        let mut session = session(&store);

        assert!(execute_background(&cycle_args(Some(Uuid::new_v4())), &mut session).is_err());
        assert!(!session.state().is_modified());
    }

    #[test]
    fn test_set_quotes_file_restating_current_list() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("quotes.txt");
        let store = MemoryStore::new();
        let mut session = session(&store);
        let quotes = session.state().settings().quotes.clone();
        fs::write(&file, codec::encode_quotes(&quotes) + "\n").unwrap();

        execute_set(SetField::Quotes { file }, &mut session).unwrap();

        assert_eq!(session.state().settings().quotes, quotes);
    }

    #[test]
    fn test_set_quotes_file_without_entries_is_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("quotes.txt");
        fs::write(&file, "just one line\n").unwrap();
        let store = MemoryStore::new();
        let mut session = session(&store);
        let quotes = session.state().settings().quotes.clone();

        assert!(execute_set(SetField::Quotes { file }, &mut session).is_err());
        assert_eq!(session.state().settings().quotes, quotes);
        assert!(!session.state().is_modified());
    }

    #[test]
    fn test_edit_survives_into_next_invocation() {
        let store = MemoryStore::new();
        {
            let mut first = session(&store);
            execute_set(SetField::Interval { seconds: 120 }, &mut first).unwrap();
        }

        let mut second = session(&store);
        assert_eq!(second.state().settings().rotation_interval, 120);
        assert!(second.state().is_modified());

        let saved = second.save_as_preset("Slow").unwrap();
        assert_eq!(saved.settings.rotation_interval, 120);

        let fresh = open_session(store.clone(), &AppConfig::default(), true);
        assert_ne!(fresh.state().settings().rotation_interval, 120);
    }

    #[test]
    fn test_rotate_advances_quote_and_shows_listed_background() {
        let mut state = ConfigState::default();
        let mut expected = state.settings().quotes.clone();
        expected.rotate_left(1);

        rotate(&mut state);

        assert_eq!(state.settings().quotes, expected);
        assert!(state.settings().backgrounds.contains(state.current_background()));
        assert!(!state.is_modified());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_rotation_applies_each_tick() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        let mut expected = session.state().settings().quotes.clone();
        let len = expected.len();
        expected.rotate_left(2 % len);

        run_rotation(&mut session, Some(2)).await.unwrap();

        let state = session.state();
        assert_eq!(state.settings().quotes, expected);
        assert!(state.settings().backgrounds.contains(state.current_background()));
        assert!(!state.is_modified());
    }
}
