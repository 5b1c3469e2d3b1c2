use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    sync::Arc,
};

use buttonmap_engine::{Engine, JsonFileStore, MapError, MappingTable, NullSink, UiSink};
use buttonmap_protocol::{MappedAction, SECTIONS};
use config::Settings;
use tracing::debug;

use crate::error::{Error, Result};

/// Resolved settings and state location shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded settings.
    pub settings: Settings,
    /// Directory holding the entry and mapping tables.
    pub state_dir: PathBuf,
}

impl Context {
    /// Load settings and pick the state directory.
    pub fn resolve(config_path: Option<&Path>, state_dir: Option<&Path>) -> Result<Self> {
        let settings = config::load_settings(config_path)?;
        let state_dir = config::resolve_state_dir(state_dir, &settings);
        debug!(state_dir = %state_dir.display(), "context_resolved");
        Ok(Self {
            settings,
            state_dir,
        })
    }

    /// An engine over the stored tables that reports to `ui`.
    pub fn engine_with(&self, ui: Arc<dyn UiSink>) -> Engine {
        Engine::load(
            Box::new(JsonFileStore::new(&self.state_dir)),
            ui,
            self.settings.engine_config(),
        )
    }

    /// An engine with nobody listening.
    pub fn engine(&self) -> Engine {
        self.engine_with(Arc::new(NullSink))
    }
}

/// Entries, one per line, with their current action.
pub fn format_list(table: &MappingTable) -> String {
    if table.entries().is_empty() {
        return "No entries. Use `buttonmap learn` to add one.\n".to_string();
    }
    let mut out = String::new();
    for e in table.entries() {
        let action = table.action_for(e.id());
        let _ignored = writeln!(
            out,
            "{}  {:<20} {:<28} -> {} ({})",
            e.id(),
            e.name(),
            e.trigger().debug_label(),
            action.title(),
            action.id()
        );
    }
    out
}

/// Every action id grouped by section.
pub fn format_actions() -> String {
    let mut out = String::new();
    for section in SECTIONS {
        let _ignored = writeln!(out, "{}:", section.title);
        for a in section.actions {
            let _ignored = writeln!(out, "  {:<22} {}", a.id(), a.title());
        }
    }
    out
}

/// Assign `action` to the entry named by `needle`.
pub fn map(ctx: &Context, needle: &str, action: &str) -> Result<String> {
    let action: MappedAction = action.parse()?;
    let mut engine = ctx.engine();
    let entry = engine.set_action(needle, action).map_err(|e| match e {
        MapError::UnknownEntry(n) => Error::UnknownEntry(n),
        other => Error::Mapping(other),
    })?;
    Ok(format!("{} -> {}", entry.name(), action.title()))
}

/// Remove the entry named by `needle`.
pub fn remove(ctx: &Context, needle: &str) -> Result<String> {
    let mut engine = ctx.engine();
    let entry = engine
        .remove_entry(needle)
        .ok_or_else(|| Error::UnknownEntry(needle.to_string()))?;
    Ok(format!("Removed {} ({})", entry.name(), entry.trigger().debug_label()))
}

/// Load the stored state (sanitizing and migrating it on the way) and
/// describe what is there.
pub fn check(ctx: &Context) -> String {
    let engine = ctx.engine();
    let table = engine.table();
    let perms = permissions::check_permissions();
    let mut out = String::new();
    let _ignored = writeln!(out, "State directory: {}", ctx.state_dir.display());
    let _ignored = writeln!(
        out,
        "Entries: {}  Mapped: {}",
        table.entries().len(),
        table.mappings().values().filter(|a| !a.is_pass_through()).count()
    );
    let _ignored = writeln!(
        out,
        "Accessibility: {}  Input Monitoring: {}",
        yes_no(perms.accessibility_ok),
        yes_no(perms.input_ok)
    );
    out.push_str(&format_list(table));
    out
}

/// Render a grant flag.
fn yes_no(ok: bool) -> &'static str {
    if ok { "granted" } else { "missing" }
}

#[cfg(test)]
mod tests {
    use buttonmap_engine::Trigger;
    use mac_keycode::{Key, Modifiers};

    use super::*;

    fn ctx_in(dir: &Path) -> Context {
        Context {
            settings: Settings::default(),
            state_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn actions_are_grouped_by_section() {
        let out = format_actions();
        assert!(out.starts_with("Basic:\n  passThrough"));
        assert!(out.contains("Media:\n"));
        assert!(out.contains("  missionControl"));
    }

    #[test]
    fn map_and_remove_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());
        ctx.engine()
            .add_entry("Thumb", Trigger::mouse(3))
            .unwrap();

        assert_eq!(map(&ctx, "Thumb", "copy").unwrap(), "Thumb -> Copy");
        let listed = format_list(ctx.engine().table());
        assert!(listed.contains("Mouse button 3"));
        assert!(listed.contains("-> Copy (copy)"));

        assert!(matches!(
            map(&ctx, "Thumb", "teleport"),
            Err(Error::UnknownAction(_))
        ));
        assert!(matches!(
            map(&ctx, "Nope", "copy"),
            Err(Error::UnknownEntry(_))
        ));

        assert_eq!(
            remove(&ctx, "Thumb").unwrap(),
            "Removed Thumb (Mouse button 3)"
        );
        assert!(ctx.engine().table().entries().is_empty());
    }

    #[test]
    fn map_refuses_action_that_types_the_trigger() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());
        let ctrl_right =
            Trigger::shortcut(i64::from(Key::RightArrow.scancode()), Modifiers::CONTROL);
        ctx.engine().add_entry("Next", ctrl_right).unwrap();

        let err = map(&ctx, "Next", "moveSpaceRight").unwrap_err();
        assert!(matches!(err, Error::Mapping(MapError::SelfTriggering { .. })));
        assert!(err.to_string().contains("Shortcut Ctrl+Right"));
        assert!(format_list(ctx.engine().table()).contains("(passThrough)"));

        assert_eq!(map(&ctx, "Next", "copy").unwrap(), "Next -> Copy");
    }

    #[test]
    fn check_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());
        let mut engine = ctx.engine();
        engine
            .add_entry(
                "",
                Trigger::shortcut(i64::from(Key::C.scancode()), Modifiers::COMMAND),
            )
            .unwrap();
        engine.add_entry("Fwd", Trigger::mouse(4)).unwrap();
        engine.set_action("Fwd", MappedAction::NavigateForward).unwrap();

        let out = check(&ctx);
        assert!(out.contains("Entries: 2  Mapped: 1"));
        assert!(out.contains("Button Cmd+C"));
    }

    #[test]
    fn empty_list_hints_at_learn() {
        let dir = tempfile::tempdir().unwrap();
        let out = format_list(ctx_in(dir.path()).engine().table());
        assert!(out.contains("buttonmap learn"));
    }
}
