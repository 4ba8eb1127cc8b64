use clap::Subcommand;
use pomodesk_core::storage::Paths;
use pomodesk_core::{ButtonSet, TimerButtonDefinition, ValidationError};

#[derive(Subcommand)]
pub enum ButtonAction {
    /// List timer buttons
    List,
    /// Add a timer button
    Add {
        name: String,
        /// Background color, e.g. "#2196F3"
        #[arg(long)]
        color: Option<String>,
        /// Run the rest phase when activated
        #[arg(long)]
        rest: bool,
    },
    /// Remove a timer button by id
    Remove { id: String },
    /// Restore the default buttons
    Reset,
}

pub fn run(action: ButtonAction) -> Result<(), Box<dyn std::error::Error>> {
    let path = Paths::resolve()?.buttons();

    match action {
        ButtonAction::List => {
            let buttons = ButtonSet::load(&path);
            println!("{}", serde_json::to_string_pretty(buttons.as_slice())?);
        }
        ButtonAction::Add { name, color, rest } => {
            let mut buttons = ButtonSet::load(&path);
            let button = TimerButtonDefinition::new(name, color.unwrap_or_default(), rest);
            buttons.add(button.clone());
            buttons.try_save(&path)?;
            println!("{}", serde_json::to_string_pretty(&button)?);
        }
        ButtonAction::Remove { id } => {
            let mut buttons = ButtonSet::load(&path);
            if !buttons.remove(&id) {
                return Err(ValidationError::ButtonNotFound(id).into());
            }
            buttons.try_save(&path)?;
            println!("removed button: {id}");
        }
        ButtonAction::Reset => {
            ButtonSet::default().try_save(&path)?;
            println!("buttons reset to defaults");
        }
    }
    Ok(())
}
