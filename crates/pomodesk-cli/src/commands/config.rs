use clap::Subcommand;
use pomodesk_core::storage::Paths;
use pomodesk_core::Settings;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a setting value
    Get {
        /// Setting key (e.g. "timer.auto_continue", "ipc.port")
        key: String,
    },
    /// Set a setting value
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let path = Paths::resolve()?.settings();
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load(&path);
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load(&path);
            settings.set(&key, &value)?;
            settings.save(&path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let settings = Settings::load(&path);
            let json = serde_json::to_string_pretty(&settings)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            Settings::default().save(&path)?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
