use pomodesk_core::ipc;
use pomodesk_core::storage::Paths;
use pomodesk_core::{Command, Settings};

pub fn run(command: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let line = command.join(" ");
    if Command::parse(&line).is_none() {
        return Err(format!("unknown command: {line}").into());
    }

    let settings = Settings::load(&Paths::resolve()?.settings());
    let addr = settings.command_addr();
    // No listener means no running instance; the command is dropped.
    if let Err(e) = ipc::send_command(addr, &line) {
        tracing::warn!(%addr, error = %e, "no running instance received the command");
    }
    Ok(())
}
