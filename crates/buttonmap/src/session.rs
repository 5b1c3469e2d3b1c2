use std::sync::Arc;

use buttonmap_engine::{CommitError, EngineHandle, UiEvent};
use mac_eventtap::EventTap;
use relaykey::Relay;
use tokio::{
    io::{AsyncBufReadExt, BufReader, stdin},
    signal,
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
};
use tracing::{debug, info, warn};

use crate::{commands::Context, error::Result};

/// A live engine wired to the event tap and the action relay.
struct Live {
    /// Engine shared with the tap thread.
    handle: EngineHandle,
    /// The installed tap.
    tap: EventTap,
    /// Notifications from the engine.
    rx: UnboundedReceiver<UiEvent>,
}

/// Check permissions, load the engine and install the tap.
fn start(ctx: &Context) -> Result<Live> {
    if !permissions::accessibility_ok() {
        if ctx.settings.prompt_accessibility {
            permissions::prompt_accessibility();
        }
        warn!("accessibility_not_granted");
    }
    let (tx, rx) = unbounded_channel::<UiEvent>();
    let engine = ctx.engine_with(Arc::new(tx));
    let handle = EngineHandle::new(engine, Arc::new(Relay::new()));
    let tap = EventTap::start(handle.tap_handler())?;
    info!("event_tap_started");
    Ok(Live { handle, tap, rx })
}

/// Render a notification for the terminal.
fn describe(handle: &EngineHandle, ev: &UiEvent) -> String {
    match ev {
        UiEvent::Highlight { id } => {
            let name = handle.with(|e| e.table().entry(id).map(|x| x.name().to_string()));
            format!("pressed {}", name.as_deref().unwrap_or(id))
        }
        other => other.to_string(),
    }
}

/// Route events until Ctrl-C, `quit`, or end of input.
///
/// Typing `restart` reinstalls the tap.
pub async fn run(ctx: &Context) -> Result<()> {
    let Live {
        handle,
        mut tap,
        mut rx,
    } = start(ctx)?;
    let count = handle.with(|e| e.table().entries().len());
    println!("buttonmap running with {count} entries. Type `restart` to reinstall the tap, Ctrl-C to quit.");

    let mut lines = BufReader::new(stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            Some(ev) = rx.recv() => println!("{}", describe(&handle, &ev)),
            line = lines.next_line(), if stdin_open => match line? {
                Some(l) => match l.trim() {
                    "restart" | "r" => {
                        tap.restart()?;
                        println!("event tap restarted");
                    }
                    "quit" | "q" => break,
                    "" => {}
                    other => println!("unknown command: {other}"),
                },
                None => stdin_open = false,
            },
            _ = signal::ctrl_c() => break,
        }
    }
    tap.stop();
    debug!("run_finished");
    Ok(())
}

/// Capture one trigger and add it as an entry.
///
/// Escape cancels. Once a trigger is staged, plain typing reaches the
/// terminal again, so a name can be typed and committed with Return.
pub async fn learn(ctx: &Context, name: Option<&str>) -> Result<()> {
    let Live {
        handle,
        mut tap,
        mut rx,
    } = start(ctx)?;
    handle.with(|e| {
        e.begin_capture(None);
        if let Some(n) = name {
            e.set_capture_name(n);
        }
    });
    println!("Press the mouse button, shortcut or media key to learn. Escape cancels.");

    let mut lines = BufReader::new(stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            Some(ev) = rx.recv() => match ev {
                UiEvent::CaptureUpdated { trigger } => {
                    let suggested = handle
                        .with(|e| e.capture().and_then(|c| c.resolved_name()))
                        .unwrap_or_else(|| trigger.fallback_name());
                    println!("Pressed event: {trigger}");
                    println!("Type a name and press Return to add it (blank keeps \"{suggested}\").");
                }
                UiEvent::CaptureClosed { committed } => {
                    if !committed {
                        println!("Learn cancelled.");
                    }
                    break;
                }
                UiEvent::Alert { title, text } => eprintln!("{title}: {text}"),
                other => debug!(event = %other, "learn_ui_event"),
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(l) => {
                    let typed = l.trim().to_string();
                    let res = handle.with(|e| {
                        if !typed.is_empty() {
                            e.set_capture_name(&typed);
                        }
                        e.commit_capture()
                    });
                    match res {
                        Ok(entry) => println!(
                            "Added \"{}\" ({}) as {}.",
                            entry.name(),
                            entry.trigger().debug_label(),
                            entry.id()
                        ),
                        Err(CommitError::NothingCaptured) => println!("Press a trigger first."),
                        Err(CommitError::Rejected(_)) => {}
                        Err(CommitError::NotCapturing) => break,
                    }
                }
                None => stdin_open = false,
            },
            _ = signal::ctrl_c() => {
                handle.with(|e| e.cancel_capture());
                break;
            }
        }
    }
    tap.stop();
    Ok(())
}
