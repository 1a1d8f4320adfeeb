use crate::app::{Ctx, Input, InputSource, Services, StatusLine, Tui};
use crate::domain::{AppConfig, BuildList, Catalog, LaunchCommand, artifact_file_name};
use crate::infra::{
    CatalogError, DownloadProgress, ExitReport, InterruptFlag, LaunchError, ProcessLauncher,
    ReleaseSource, ServerLayout,
};
use ratatui::backend::TestBackend;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

pub fn headless(width: u16, height: u16) -> Tui<TestBackend> {
    Tui::headless(TestBackend::new(width, height)).expect("headless terminal")
}

/// Every visible line of the last frame, trailing spaces trimmed.
pub fn screen_lines(tui: &Tui<TestBackend>) -> Vec<String> {
    let buffer = tui.terminal().backend().buffer();
    let area = buffer.area;
    (0..area.height)
        .map(|y| {
            let line: String = (0..area.width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect();
            line.trim_end().to_string()
        })
        .collect()
}

/// Replays a fixed sequence of events.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    pending: VecDeque<Input>,
}

impl ScriptedInput {
    pub fn new(inputs: impl IntoIterator<Item = Input>) -> Self {
        Self {
            pending: inputs.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn next_input(&mut self) -> io::Result<Input> {
        self.pending.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "input script exhausted")
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DownloadOutcome {
    Succeed,
    Interrupt,
    Fail,
}

#[derive(Clone, Debug)]
pub struct FakeReleases {
    pub catalog: Catalog,
    pub builds: BTreeMap<String, Vec<u32>>,
    pub outcome: DownloadOutcome,
    /// Every metadata call fails as if the API were down.
    pub offline: bool,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl FakeReleases {
    pub fn unreachable() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }
}

impl Default for FakeReleases {
    fn default() -> Self {
        let catalog = Catalog {
            version_groups: vec!["1.20".to_string(), "1.21".to_string()],
            versions: vec![
                "1.20.4".to_string(),
                "1.20.6".to_string(),
                "1.21".to_string(),
                "1.21.1".to_string(),
            ],
        };
        let builds = BTreeMap::from([
            ("1.21.1".to_string(), vec![100, 101, 102]),
            ("1.20.4".to_string(), vec![496, 497, 499]),
        ]);
        Self {
            catalog,
            builds,
            outcome: DownloadOutcome::Succeed,
            offline: false,
            calls: Rc::default(),
        }
    }
}

impl ReleaseSource for FakeReleases {
    fn catalog(&self, force: bool) -> Result<Catalog, CatalogError> {
        self.calls.borrow_mut().push(format!("catalog force={force}"));
        if self.offline {
            return Err(CatalogError::Http {
                url: "fake://catalog".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.catalog.clone())
    }

    fn builds(&self, version: &str, force: bool) -> Result<BuildList, CatalogError> {
        self.calls
            .borrow_mut()
            .push(format!("builds {version} force={force}"));
        match self.builds.get(version) {
            Some(builds) => Ok(BuildList {
                builds: builds.clone(),
            }),
            None => Err(CatalogError::Http {
                url: format!("fake://versions/{version}"),
                message: "404 Not Found".to_string(),
            }),
        }
    }

    fn download(
        &self,
        version: &str,
        build: u32,
        dest_dir: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
        _interrupt: &InterruptFlag,
    ) -> Result<PathBuf, CatalogError> {
        self.calls
            .borrow_mut()
            .push(format!("download {version}-{build}"));
        match self.outcome {
            DownloadOutcome::Succeed => {}
            DownloadOutcome::Interrupt => return Err(CatalogError::Interrupted),
            DownloadOutcome::Fail => {
                return Err(CatalogError::Http {
                    url: "fake://download".to_string(),
                    message: "connection reset".to_string(),
                });
            }
        }
        progress(DownloadProgress {
            received: 4,
            total: Some(4),
        });
        let path = dest_dir.join(artifact_file_name(version, build));
        std::fs::write(&path, b"jar!").map_err(|source| CatalogError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakeLauncher {
    pub report: Option<ExitReport>,
    pub runs: Rc<RefCell<Vec<(LaunchCommand, PathBuf)>>>,
    pub pauses: Rc<RefCell<Vec<String>>>,
}

impl FakeLauncher {
    pub fn exiting_with(code: i32) -> Self {
        Self {
            report: Some(ExitReport {
                code: Some(code),
                interrupted: false,
            }),
            ..Self::default()
        }
    }

    /// A launcher whose program can never be started.
    pub fn unspawnable() -> Self {
        Self::default()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn run(
        &self,
        command: &LaunchCommand,
        cwd: &Path,
        _interrupt: &InterruptFlag,
    ) -> Result<ExitReport, LaunchError> {
        self.runs
            .borrow_mut()
            .push((command.clone(), cwd.to_path_buf()));
        self.report.ok_or_else(|| LaunchError::Spawn {
            program: command.program.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        })
    }

    fn pause(&self, message: &str) {
        self.pauses.borrow_mut().push(message.to_string());
    }
}

/// Temporary server root plus fake collaborators; `build` hands out a fresh
/// `Services` that shares the fakes' call logs.
pub struct TestServices {
    pub dir: TempDir,
    pub releases: FakeReleases,
    pub launcher: FakeLauncher,
}

impl TestServices {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            releases: FakeReleases::default(),
            launcher: FakeLauncher::exiting_with(0),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("server")
    }

    pub fn build(&self) -> Services {
        let layout = ServerLayout::new(self.root());
        layout.ensure().expect("server layout");
        Services {
            config: AppConfig::with_path(self.root()),
            config_path: self.dir.path().join("config.json"),
            layout,
            releases: Box::new(self.releases.clone()),
            launcher: Box::new(self.launcher.clone()),
            interrupt: InterruptFlag::default(),
        }
    }

    /// Drops an artifact into `bin/` as if it had been downloaded.
    pub fn install(&self, artifact: &str) {
        let bin = self.root().join("bin");
        std::fs::create_dir_all(&bin).expect("bin dir");
        std::fs::write(bin.join(artifact), b"jar!").expect("artifact");
    }
}

/// A screen's-eye view of one turn: everything needed to build a `Ctx`.
pub struct Harness {
    pub fixture: TestServices,
    pub services: Services,
    pub console: Tui<TestBackend>,
    pub status: StatusLine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(TestServices::new())
    }

    pub fn with(fixture: TestServices) -> Self {
        let services = fixture.build();
        Self {
            fixture,
            services,
            console: headless(80, 20),
            status: StatusLine::default(),
        }
    }

    pub fn ctx(&mut self) -> Ctx<'_> {
        Ctx {
            console: &mut self.console,
            status: &mut self.status,
            services: &mut self.services,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        screen_lines(&self.console)
    }
}
