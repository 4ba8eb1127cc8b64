//! The primary instance: owns the session and drives it from one select
//! loop (second ticks, the day check, forwarded commands, Ctrl-C).

use std::future::Future;
use std::time::Duration;

use chrono::Local;
use pomodesk_core::ipc::{self, CommandServer, Instance};
use pomodesk_core::storage::Paths;
use pomodesk_core::{Command, CommandRouter, Directive, Event, Session, Settings};
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);
const DAY_CHECK: Duration = Duration::from_secs(60);

pub fn run(command: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(command.join(" ")))
}

async fn serve(initial: String) -> Result<(), Box<dyn std::error::Error>> {
    let paths = Paths::resolve()?;
    let addr = Settings::load(&paths.settings()).command_addr();

    let server = match ipc::claim_or_forward(addr, &initial).await? {
        Instance::Primary(server) => server,
        Instance::Secondary => {
            tracing::info!("another instance is running; exiting");
            return Ok(());
        }
    };

    let session = Session::open(paths);
    drive(session, server, Command::parse(&initial), tokio::signal::ctrl_c()).await;
    Ok(())
}

/// Apply `initial`, then run the session until a `quit` command, the
/// listener closing, or `interrupt` resolving. The command port is released
/// before the session is handed back.
async fn drive<F: Future>(
    mut session: Session,
    server: CommandServer,
    initial: Option<Command>,
    interrupt: F,
) -> Session {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = server.spawn(tx);

    let mut quit = false;
    if let Some(command) = initial {
        quit = apply(&mut session, command) == Directive::Quit;
    }

    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut day_check = interval(DAY_CHECK);
    tokio::pin!(interrupt);

    while !quit {
        tokio::select! {
            _ = ticker.tick() => {
                for event in session.tick() {
                    report(&session, &event);
                }
            }
            _ = day_check.tick() => {
                if let Some(event) = session.ensure_current_day(Local::now().date_naive()) {
                    report(&session, &event);
                }
            }
            received = rx.recv() => match received {
                Some(command) => quit = apply(&mut session, command) == Directive::Quit,
                None => break,
            },
            _ = &mut interrupt => {
                tracing::info!("interrupted");
                session.shutdown();
                break;
            }
        }
    }

    listener.shutdown().await;
    session
}

fn apply(session: &mut Session, command: Command) -> Directive {
    let dispatch = CommandRouter::dispatch(session, command, Local::now().naive_local());
    for event in &dispatch.events {
        report(session, event);
    }
    if dispatch.directive == Directive::Show {
        tracing::info!("show window");
    }
    dispatch.directive
}

/// Print each event as one JSON line and log the presentation intents the
/// desktop shell would act on.
fn report(session: &Session, event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    }

    if let Event::PeriodCompleted { period, .. } = event {
        tracing::info!(
            button = %period.button_name,
            minutes = period.duration_minutes,
            totals = %session.summary_totals().display(),
            "notify: period finished"
        );
        if session.settings().timer.restore_window_on_finish {
            tracing::info!("show window");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn bind() -> (CommandServer, SocketAddr) {
        let server = CommandServer::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        (server, addr)
    }

    async fn send(addr: SocketAddr, line: &'static str) {
        tokio::task::spawn_blocking(move || ipc::send_command(addr, line))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn forwarded_quit_ends_loop_and_releases_port() {
        let dir = TempDir::new().unwrap();
        let (server, addr) = bind().await;
        let session = Session::open(Paths::new(dir.path()));

        let running = tokio::spawn(drive(
            session,
            server,
            Command::parse("start"),
            std::future::pending::<()>(),
        ));
        send(addr, "pause").await;
        send(addr, "quit").await;

        let session = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("loop did not stop on quit")
            .unwrap();
        assert!(session.engine().has_active_period());
        assert!(!session.engine().is_running());
        assert!(dir.path().join("stats.json").exists());

        // The port is free again for the next primary instance.
        CommandServer::bind(addr).await.unwrap();
    }

    #[tokio::test]
    async fn initial_quit_returns_without_waiting() {
        let dir = TempDir::new().unwrap();
        let (server, _) = bind().await;
        let session = Session::open(Paths::new(dir.path()));
        let session = tokio::time::timeout(
            Duration::from_secs(5),
            drive(session, server, Command::parse("quit"), std::future::pending::<()>()),
        )
        .await
        .unwrap();
        assert!(!session.engine().is_running());
    }

    #[tokio::test]
    async fn interrupt_saves_and_stops() {
        let dir = TempDir::new().unwrap();
        let (server, addr) = bind().await;
        let session = Session::open(Paths::new(dir.path()));
        let session = tokio::time::timeout(
            Duration::from_secs(5),
            drive(session, server, Command::parse("start"), async {}),
        )
        .await
        .unwrap();
        assert!(session.engine().is_running());
        assert!(dir.path().join("stats.json").exists());
        CommandServer::bind(addr).await.unwrap();
    }
}
