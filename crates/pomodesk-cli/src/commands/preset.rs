use clap::Subcommand;
use pomodesk_core::ipc;
use pomodesk_core::storage::Paths;
use pomodesk_core::{Command, Preset, PresetList, Settings, ValidationError};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List presets
    List,
    /// Add a preset; invalid minutes fall back to 25/5
    Add {
        name: String,
        /// Work minutes
        #[arg(long, default_value = "25")]
        work: String,
        /// Rest minutes
        #[arg(long, default_value = "5")]
        rest: String,
    },
    /// Edit a preset
    Edit {
        /// Current name (case-insensitive)
        name: String,
        /// New name
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        work: Option<String>,
        #[arg(long)]
        rest: Option<String>,
    },
    /// Delete a preset (the last one cannot be deleted)
    Delete { name: String },
    /// Switch the running timer to a preset
    Select { name: String },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let paths = Paths::resolve()?;
    let path = paths.presets();

    match action {
        PresetAction::List => {
            let presets = PresetList::load(&path);
            println!("{}", serde_json::to_string_pretty(presets.as_slice())?);
        }
        PresetAction::Add { name, work, rest } => {
            let mut presets = PresetList::load(&path);
            let preset = Preset::from_input(&name, &work, &rest);
            presets.add(preset.clone());
            presets.try_save(&path)?;
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
        PresetAction::Edit {
            name,
            rename,
            work,
            rest,
        } => {
            let mut presets = PresetList::load(&path);
            let index = presets
                .position(&name)
                .ok_or_else(|| ValidationError::PresetNotFound(name.clone()))?;
            let existing = presets.as_slice()[index].clone();
            let updated = Preset::from_input(
                rename.as_deref().unwrap_or(&existing.name),
                &work.unwrap_or_else(|| existing.work_minutes.to_string()),
                &rest.unwrap_or_else(|| existing.rest_minutes.to_string()),
            );
            presets.update(&name, updated.clone())?;
            presets.try_save(&path)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        PresetAction::Delete { name } => {
            let mut presets = PresetList::load(&path);
            let removed = presets.remove(&name)?;
            presets.try_save(&path)?;
            println!("deleted preset: {}", removed.name);
        }
        PresetAction::Select { name } => {
            let presets = PresetList::load(&path);
            let index = presets
                .position(&name)
                .ok_or_else(|| ValidationError::PresetNotFound(name.clone()))?;
            let command = Command::Preset(presets.as_slice()[index].name.clone());
            let addr = Settings::load(&paths.settings()).command_addr();
            if let Err(e) = ipc::send_command(addr, &command.to_string()) {
                tracing::warn!(%addr, error = %e, "no running instance received the command");
            }
        }
    }
    Ok(())
}
