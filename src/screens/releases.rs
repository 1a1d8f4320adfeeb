use crate::app::{
    Ctx, ExternalMode, Input, KeyAction, Menu, Screen, ScreenError, Selection, Signal,
    handle_mapped, leave, menu_activate, menu_down, menu_up,
};
use crate::domain::Catalog;
use crate::infra::{CatalogError, DownloadProgress};
use crate::ui::{self, ListRow, theme};
use humansize::{DECIMAL, format_size};
use ratatui::Frame;
use std::io::{self, Write};
use tracing::{info, warn};

const COMMON_TEXT: &str =
    "Please pick the version you wish to install (↑↓ to navigate, Enter to select, Left/Right to undo/select)";

fn render_fetching(ctx: &mut Ctx<'_>, message: &str) -> Result<(), ScreenError> {
    ctx.console
        .render(&mut |frame: &mut Frame| ui::render_bottom(frame, message))?;
    Ok(())
}

/// Lists the version groups of the release catalog.
#[derive(Debug, Default)]
pub struct GroupPicker {
    catalog: Catalog,
    selection: Selection,
}

impl GroupPicker {
    const KEYS: &'static [(Input, KeyAction<Self>)] = &[
        (Input::Up, menu_up::<Self>),
        (Input::Down, menu_down::<Self>),
        (Input::Left, leave::<Self>),
        (Input::Confirm, menu_activate::<Self>),
        (Input::Right, menu_activate::<Self>),
        (Input::Char('r'), Self::refresh),
    ];

    pub fn new() -> Self {
        Self::default()
    }

    fn load(&mut self, ctx: &mut Ctx<'_>, force: bool) -> Result<(), ScreenError> {
        render_fetching(ctx, "Fetching repository list...")?;
        self.catalog = ctx
            .services
            .releases
            .catalog(force)
            .map_err(|error| ScreenError::Setup(format!("Failed to fetch versions: {error}")))?;
        self.selection.clamp(self.catalog.version_groups.len());
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        self.load(ctx, true)?;
        ctx.status.set("Version list refreshed");
        Ok(Signal::Continue)
    }
}

impl Menu for GroupPicker {
    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn entry_count(&self) -> usize {
        self.catalog.version_groups.len()
    }

    fn activate(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        let Some(group) = self.catalog.version_groups.get(self.selection.index()) else {
            return Ok(Signal::Continue);
        };
        ctx.status.reset();
        let versions = self.catalog.versions_in(group);
        Ok(Signal::Push(Box::new(VersionPicker::new(group.clone(), versions))))
    }
}

impl Screen for GroupPicker {
    fn title(&self) -> &str {
        "version groups"
    }

    fn should_init(&self) -> bool {
        true
    }

    fn init(&mut self, ctx: &mut Ctx<'_>) -> Result<(), ScreenError> {
        ctx.status.reset();
        self.load(ctx, false)
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let rows: Vec<ListRow> = self
            .catalog
            .version_groups
            .iter()
            .map(|group| ListRow::new(group.as_str()))
            .collect();
        let selected = self.selection.index();
        let status = &*ctx.status;

        ctx.console.render(&mut |frame: &mut Frame| {
            ui::render_line(frame, 0, COMMON_TEXT, theme::plain());
            ui::render_line(frame, 1, "Press r to refresh the version list.", theme::plain());
            if rows.is_empty() {
                ui::render_line(frame, ui::LIST_TOP_TALL, "No versions available.", theme::plain());
            } else {
                ui::render_list(frame, ui::LIST_TOP_TALL, &rows, selected);
            }
            ui::render_status(frame, status);
        })?;
        Ok(None)
    }

    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        handle_mapped(self, Self::KEYS, input, ctx)
    }
}

/// Concrete versions inside one group.
#[derive(Debug)]
pub struct VersionPicker {
    group: String,
    versions: Vec<String>,
    selection: Selection,
}

impl VersionPicker {
    const KEYS: &'static [(Input, KeyAction<Self>)] = &[
        (Input::Up, menu_up::<Self>),
        (Input::Down, menu_down::<Self>),
        (Input::Left, leave::<Self>),
        (Input::Confirm, menu_activate::<Self>),
        (Input::Right, menu_activate::<Self>),
    ];

    pub fn new(group: String, versions: Vec<String>) -> Self {
        Self {
            group,
            versions,
            selection: Selection::default(),
        }
    }
}

impl Menu for VersionPicker {
    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn entry_count(&self) -> usize {
        self.versions.len()
    }

    fn activate(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        let Some(version) = self.versions.get(self.selection.index()) else {
            return Ok(Signal::Continue);
        };
        ctx.status.reset();
        Ok(Signal::Push(Box::new(BuildPicker::new(version.clone()))))
    }
}

impl Screen for VersionPicker {
    fn title(&self) -> &str {
        "versions"
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let rows: Vec<ListRow> = self
            .versions
            .iter()
            .map(|version| ListRow::new(version.as_str()))
            .collect();
        let selected = self.selection.index();
        let header = format!("Selected: {}", self.group);
        let status = &*ctx.status;

        ctx.console.render(&mut |frame: &mut Frame| {
            ui::render_line(frame, 0, COMMON_TEXT, theme::plain());
            ui::render_line(frame, 1, &header, theme::plain());
            if rows.is_empty() {
                ui::render_line(frame, ui::LIST_TOP_TALL, "No versions in this group.", theme::plain());
            } else {
                ui::render_list(frame, ui::LIST_TOP_TALL, &rows, selected);
            }
            ui::render_status(frame, status);
        })?;
        Ok(None)
    }

    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        handle_mapped(self, Self::KEYS, input, ctx)
    }
}

/// Builds of one version, newest first. Confirm downloads the selected build.
#[derive(Debug)]
pub struct BuildPicker {
    version: String,
    builds: Vec<u32>,
    selection: Selection,
}

impl BuildPicker {
    const KEYS: &'static [(Input, KeyAction<Self>)] = &[
        (Input::Up, menu_up::<Self>),
        (Input::Down, menu_down::<Self>),
        (Input::Left, leave::<Self>),
        (Input::Confirm, menu_activate::<Self>),
        (Input::Right, menu_activate::<Self>),
    ];

    pub fn new(version: String) -> Self {
        Self {
            version,
            builds: Vec::new(),
            selection: Selection::default(),
        }
    }

    fn install(&self, build: u32, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        let dest_dir = ctx.services.layout.bin_dir();
        let result = {
            let _external = ExternalMode::enter(&mut *ctx.console)?;
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "Installing: PaperMC {}/{build}", self.version);
            let _ = out.flush();
            drop(out);

            let mut report = |progress: DownloadProgress| {
                let mut out = io::stdout().lock();
                let _ = write!(out, "\r{}", progress_line(progress));
                let _ = out.flush();
            };
            let result = ctx.services.releases.download(
                &self.version,
                build,
                &dest_dir,
                &mut report,
                &ctx.services.interrupt,
            );
            let mut out = io::stdout().lock();
            let _ = writeln!(out);
            result
        };

        match result {
            Ok(path) => {
                info!(path = %path.display(), "installed build");
                ctx.status
                    .set(format!("Installed PaperMC {}-{build}", self.version));
                Ok(Signal::ReturnToRoot)
            }
            Err(CatalogError::Interrupted) => {
                ctx.status.set("Download aborted");
                Ok(Signal::ReturnToRoot)
            }
            Err(error) => {
                warn!(version = %self.version, build, error = %error, "install failed");
                ctx.status.set(error.to_string());
                Ok(Signal::ErrorBack)
            }
        }
    }
}

impl Menu for BuildPicker {
    fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn entry_count(&self) -> usize {
        self.builds.len()
    }

    fn activate(&mut self, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        match self.builds.get(self.selection.index()).copied() {
            Some(build) => self.install(build, ctx),
            None => Ok(Signal::Continue),
        }
    }
}

impl Screen for BuildPicker {
    fn title(&self) -> &str {
        "builds"
    }

    fn should_init(&self) -> bool {
        true
    }

    fn init(&mut self, ctx: &mut Ctx<'_>) -> Result<(), ScreenError> {
        ctx.status.reset();
        render_fetching(ctx, "Fetching build info...")?;
        let builds = ctx
            .services
            .releases
            .builds(&self.version, false)
            .map_err(|error| ScreenError::Setup(format!("Failed to fetch builds: {error}")))?;
        self.builds = builds.newest_first();
        Ok(())
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let rows: Vec<ListRow> = self
            .builds
            .iter()
            .map(|build| ListRow::new(build.to_string()))
            .collect();
        let selected = self.selection.index();
        let header = match self.builds.get(selected) {
            Some(build) => format!(
                "Selected: {} / {build}. Newer builds (higher numbers) are listed first",
                self.version
            ),
            None => format!("No builds published for {}", self.version),
        };
        let status = &*ctx.status;

        ctx.console.render(&mut |frame: &mut Frame| {
            ui::render_line(frame, 0, COMMON_TEXT, theme::plain());
            ui::render_line(frame, 1, &header, theme::plain());
            ui::render_list(frame, ui::LIST_TOP_TALL, &rows, selected);
            ui::render_status(frame, status);
        })?;
        Ok(None)
    }

    fn handle_key(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        handle_mapped(self, Self::KEYS, input, ctx)
    }
}

fn progress_line(progress: DownloadProgress) -> String {
    let received = format_size(progress.received, DECIMAL);
    match progress.total {
        Some(total) if total > 0 => {
            let percent = progress.received.saturating_mul(100) / total;
            format!(
                "Downloaded {received} / {} ({percent}%)",
                format_size(total, DECIMAL)
            )
        }
        _ => format!("Downloaded {received}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{
        DownloadOutcome, FakeReleases, Harness, ScriptedInput, TestServices, headless,
    };
    use crate::app::{Flow, Runner};
    use crate::screens::RootMenu;

    fn picker_with_builds(harness: &mut Harness, version: &str) -> BuildPicker {
        let mut picker = BuildPicker::new(version.to_string());
        picker.init(&mut harness.ctx()).expect("init");
        picker
    }

    #[test]
    fn group_picker_fetches_once_and_refreshes_on_r() {
        let mut harness = Harness::new();
        let calls = harness.fixture.releases.calls.clone();
        let mut picker = GroupPicker::new();
        picker.init(&mut harness.ctx()).expect("init");
        picker
            .handle_key(Input::Char('r'), &mut harness.ctx())
            .expect("refresh");
        assert_eq!(
            calls.borrow().as_slice(),
            ["catalog force=false", "catalog force=true"]
        );
        assert_eq!(harness.status.get(), "Version list refreshed");
    }

    #[test]
    fn unreachable_api_pops_the_group_picker_with_a_message() {
        let mut fixture = TestServices::new();
        fixture.releases = FakeReleases::unreachable();
        let mut services = fixture.build();
        let mut console = headless(80, 20);
        let mut runner = Runner::new(Box::new(RootMenu::new()));
        let mut source = ScriptedInput::new([Input::Confirm, Input::Down]);

        for _ in 0..2 {
            let flow = runner
                .tick(&mut console, &mut source, &mut services)
                .expect("tick");
            assert_eq!(flow, Flow::Continue);
        }
        assert_eq!(runner.stack().titles(), vec!["root"]);
        assert!(
            runner
                .status()
                .get()
                .starts_with("Failed to fetch versions:")
        );
    }

    #[test]
    fn group_picker_pushes_filtered_versions() {
        let mut harness = Harness::new();
        let mut picker = GroupPicker::new();
        picker.init(&mut harness.ctx()).expect("init");
        picker.handle_key(Input::Down, &mut harness.ctx()).expect("down");
        let signal = picker
            .handle_key(Input::Right, &mut harness.ctx())
            .expect("activate");
        let Signal::Push(screen) = signal else {
            panic!("expected a pushed screen, got {signal:?}");
        };
        assert_eq!(screen.title(), "versions");
    }

    #[test]
    fn version_picker_lists_only_its_group() {
        let mut harness = Harness::new();
        let catalog = harness.fixture.releases.catalog.clone();
        let mut picker = VersionPicker::new("1.21".to_string(), catalog.versions_in("1.21"));
        picker.draw(&mut harness.ctx()).expect("draw");
        let lines = harness.lines();
        assert_eq!(lines[1], "Selected: 1.21");
        assert_eq!(lines[3], "-> 1.21");
        assert_eq!(lines[4], "-> 1.21.1");
        assert_eq!(lines[5], "");
    }

    #[test]
    fn build_picker_lists_newest_first() {
        let mut harness = Harness::new();
        let mut picker = picker_with_builds(&mut harness, "1.21.1");
        picker.draw(&mut harness.ctx()).expect("draw");
        let lines = harness.lines();
        assert!(lines[1].starts_with("Selected: 1.21.1 / 102."));
        assert_eq!(&lines[3..6], ["-> 102", "-> 101", "-> 100"]);
    }

    #[test]
    fn empty_build_list_draws_and_ignores_confirm() {
        let mut fixture = TestServices::new();
        fixture.releases.builds.insert("1.21".to_string(), Vec::new());
        let mut harness = Harness::with(fixture);
        let mut picker = picker_with_builds(&mut harness, "1.21");
        picker.draw(&mut harness.ctx()).expect("draw");
        assert_eq!(harness.lines()[1], "No builds published for 1.21");
        let signal = picker
            .handle_key(Input::Confirm, &mut harness.ctx())
            .expect("confirm");
        assert!(matches!(signal, Signal::Continue));
    }

    #[test]
    fn failed_build_fetch_is_a_setup_error() {
        let mut harness = Harness::new();
        let mut picker = BuildPicker::new("0.0.1".to_string());
        let result = picker.init(&mut harness.ctx());
        assert!(matches!(result, Err(ScreenError::Setup(message)) if message.contains("404")));
    }

    #[test]
    fn successful_install_returns_to_root() {
        let mut harness = Harness::new();
        let mut picker = picker_with_builds(&mut harness, "1.21.1");
        let signal = picker
            .handle_key(Input::Confirm, &mut harness.ctx())
            .expect("install");
        assert!(matches!(signal, Signal::ReturnToRoot));
        assert_eq!(harness.status.get(), "Installed PaperMC 1.21.1-102");
        assert!(
            harness
                .services
                .layout
                .bin_dir()
                .join("paper-1.21.1-102.jar")
                .is_file()
        );
        assert!(!harness.console.is_released());
    }

    #[test]
    fn interrupted_install_aborts_to_root() {
        let mut fixture = TestServices::new();
        fixture.releases.outcome = DownloadOutcome::Interrupt;
        let mut harness = Harness::with(fixture);
        let mut picker = picker_with_builds(&mut harness, "1.21.1");
        let signal = picker
            .handle_key(Input::Confirm, &mut harness.ctx())
            .expect("install");
        assert!(matches!(signal, Signal::ReturnToRoot));
        assert_eq!(harness.status.get(), "Download aborted");
    }

    #[test]
    fn failed_install_reports_error_back() {
        let mut fixture = TestServices::new();
        fixture.releases.outcome = DownloadOutcome::Fail;
        let mut harness = Harness::with(fixture);
        let mut picker = picker_with_builds(&mut harness, "1.21.1");
        let signal = picker
            .handle_key(Input::Confirm, &mut harness.ctx())
            .expect("install");
        assert!(matches!(signal, Signal::ErrorBack));
        assert!(harness.status.get().contains("connection reset"));
        assert!(!harness.console.is_released());
    }

    #[test]
    fn progress_line_reports_percentage_when_size_known() {
        let line = progress_line(DownloadProgress {
            received: 500_000,
            total: Some(1_000_000),
        });
        assert!(line.starts_with("Downloaded "), "{line}");
        assert!(line.ends_with("(50%)"), "{line}");
        let line = progress_line(DownloadProgress {
            received: 2_000,
            total: None,
        });
        assert!(!line.contains('%'), "{line}");
    }
}
