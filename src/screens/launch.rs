use crate::app::{Ctx, ExternalMode, Input, Screen, ScreenError, Signal};
use crate::domain::LaunchCommand;
use crate::infra::{ExitReport, LaunchError, LayoutError, default_shell};
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

const MISMATCH_MESSAGE: &str = "Server mismatch, please manage your server~";

/// Runs `command` with the terminal released, then holds the plain terminal
/// until the user acknowledges the exit code.
fn run_foreground(
    ctx: &mut Ctx<'_>,
    command: &LaunchCommand,
    cwd: &Path,
    banner: Option<&str>,
) -> Result<Result<ExitReport, LaunchError>, ScreenError> {
    let _external = ExternalMode::enter(&mut *ctx.console)?;
    if let Some(banner) = banner {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{banner}");
        let _ = out.flush();
    }

    let launcher = &ctx.services.launcher;
    let report = launcher.run(command, cwd, &ctx.services.interrupt);
    let code = match &report {
        Ok(report) => report.code_label(),
        Err(error) => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{error}");
            "-1".to_string()
        }
    };
    launcher.pause(&format!("[Return code {code}] Press enter to return to app... "));
    Ok(report)
}

/// Runs the active server in the foreground. Everything happens during
/// draw; the screen pops itself before any key is read.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerLaunch;

impl Screen for ServerLaunch {
    fn title(&self) -> &str {
        "run server"
    }

    fn should_clear(&self) -> bool {
        false
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        if let Err(error) = ctx.services.layout.check_profile() {
            warn!(error = %error, "refusing to launch");
            match error {
                LayoutError::ProfileMismatch { .. } => ctx.status.set(MISMATCH_MESSAGE),
                other => ctx.status.set(other.to_string()),
            }
            return Ok(Some(Signal::ErrorBack));
        }

        let command = match LaunchCommand::for_server(&ctx.services.config) {
            Ok(command) => command,
            Err(error) => {
                ctx.status.set(format!("Invalid launch settings: {error}"));
                return Ok(Some(Signal::ErrorBack));
            }
        };

        let cwd = ctx.services.layout.default_profile();
        let banner = format!("Running Minecraft with this args:\n{}", command.display());
        let report = run_foreground(ctx, &command, &cwd, Some(&banner))?;
        let signal = match report {
            Ok(report) if report.interrupted => {
                ctx.status.set("Server stopped (CTRL+C)");
                Signal::Back
            }
            Ok(report) if report.success() => {
                ctx.status.set("Server exited normally");
                Signal::Back
            }
            Ok(report) => {
                ctx.status
                    .set(format!("Server exited with code {}", report.code_label()));
                Signal::ErrorBack
            }
            Err(error) => {
                ctx.status.set(error.to_string());
                Signal::ErrorBack
            }
        };
        info!(signal = ?signal, "server launch finished");
        Ok(Some(signal))
    }

    fn handle_key(&mut self, _input: Input, _ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        Ok(Signal::Continue)
    }
}

/// Opens the user's shell inside the server directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellLaunch;

impl Screen for ShellLaunch {
    fn title(&self) -> &str {
        "shell"
    }

    fn should_clear(&self) -> bool {
        false
    }

    fn draw(&mut self, ctx: &mut Ctx<'_>) -> Result<Option<Signal>, ScreenError> {
        let command = LaunchCommand::shell(default_shell());
        let cwd = ctx.services.layout.root().to_path_buf();
        match run_foreground(ctx, &command, &cwd, None)? {
            Ok(_) => Ok(Some(Signal::Back)),
            Err(error) => {
                ctx.status.set(error.to_string());
                Ok(Some(Signal::ErrorBack))
            }
        }
    }

    fn handle_key(&mut self, _input: Input, _ctx: &mut Ctx<'_>) -> Result<Signal, ScreenError> {
        Ok(Signal::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{FakeLauncher, Harness, ScriptedInput, TestServices, headless};
    use crate::app::{Flow, Runner};
    use crate::screens::RootMenu;

    fn draw_signal(harness: &mut Harness, screen: &mut dyn Screen) -> Signal {
        screen
            .draw(&mut harness.ctx())
            .expect("draw")
            .expect("launch screens always finish during draw")
    }

    #[cfg(unix)]
    fn activated(launcher: FakeLauncher) -> Harness {
        let mut fixture = TestServices::new();
        fixture.launcher = launcher;
        fixture.install("paper-1.21.1-102.jar");
        let harness = Harness::with(fixture);
        harness
            .services
            .layout
            .set_active("paper-1.21.1-102.jar")
            .expect("activate");
        harness
    }

    #[test]
    fn refuses_to_launch_without_an_active_profile() {
        let mut harness = Harness::new();
        let runs = harness.fixture.launcher.runs.clone();
        let signal = draw_signal(&mut harness, &mut ServerLaunch);
        assert!(matches!(signal, Signal::ErrorBack));
        assert!(!harness.status.is_blank());
        assert!(runs.borrow().is_empty());
    }

    #[test]
    fn failed_launch_pops_back_to_root_with_a_status() {
        let fixture = TestServices::new();
        let mut services = fixture.build();
        let mut runner = Runner::new(Box::new(RootMenu::new()));
        let mut console = headless(80, 20);
        let mut source = ScriptedInput::new([Input::Down, Input::Down, Input::Confirm]);
        for _ in 0..3 {
            let flow = runner
                .tick(&mut console, &mut source, &mut services)
                .expect("tick");
            assert_eq!(flow, Flow::Continue);
        }
        assert_eq!(runner.stack().titles(), vec!["root", "run server"]);
        assert!(runner.status().is_blank());

        let flow = runner
            .tick(&mut console, &mut source, &mut services)
            .expect("draw-time pop reads no input");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(runner.stack().titles(), vec!["root"]);
        assert!(!runner.status().is_blank());
        assert!(fixture.launcher.runs.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn refuses_to_launch_on_profile_mismatch() {
        let mut harness = activated(FakeLauncher::exiting_with(0));
        let other = harness.services.layout.profiles_dir().join("paper-1.20.4-499");
        std::fs::create_dir_all(&other).expect("other profile");
        let jar = harness.services.layout.bin_dir().join("paper-1.21.1-102.jar");
        std::os::unix::fs::symlink(&jar, other.join("server.jar")).expect("link jar");
        let default = harness.services.layout.default_profile();
        std::fs::remove_file(&default).expect("unlink default");
        std::os::unix::fs::symlink(&other, &default).expect("relink default");

        let signal = draw_signal(&mut harness, &mut ServerLaunch);
        assert!(matches!(signal, Signal::ErrorBack));
        assert_eq!(harness.status.get(), MISMATCH_MESSAGE);
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_goes_back_from_the_profile_dir() {
        let mut harness = activated(FakeLauncher::exiting_with(0));
        let runs = harness.fixture.launcher.runs.clone();
        let pauses = harness.fixture.launcher.pauses.clone();

        let signal = draw_signal(&mut harness, &mut ServerLaunch);
        assert!(matches!(signal, Signal::Back));
        let runs = runs.borrow();
        let (command, cwd) = &runs[0];
        assert_eq!(command.program, "java");
        let tail: Vec<&str> = command.args.iter().rev().take(3).rev().map(String::as_str).collect();
        assert_eq!(tail, ["-jar", "./server.jar", "--nogui"]);
        assert_eq!(cwd, &harness.services.layout.default_profile());
        assert_eq!(
            pauses.borrow().as_slice(),
            ["[Return code 0] Press enter to return to app... "]
        );
        assert!(!harness.console.is_released());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_error_back() {
        let mut harness = activated(FakeLauncher::exiting_with(1));
        let signal = draw_signal(&mut harness, &mut ServerLaunch);
        assert!(matches!(signal, Signal::ErrorBack));
        assert_eq!(harness.status.get(), "Server exited with code 1");
    }

    #[cfg(unix)]
    #[test]
    fn invalid_memory_refuses_launch() {
        let mut harness = activated(FakeLauncher::exiting_with(0));
        harness.services.config.memory.min = 8;
        harness.services.config.memory.max = 2;
        let signal = draw_signal(&mut harness, &mut ServerLaunch);
        assert!(matches!(signal, Signal::ErrorBack));
        assert!(harness.status.get().starts_with("Invalid launch settings"));
    }

    #[test]
    fn shell_runs_in_server_root_and_reports_spawn_failures() {
        let mut harness = Harness::new();
        let runs = harness.fixture.launcher.runs.clone();
        let signal = draw_signal(&mut harness, &mut ShellLaunch);
        assert!(matches!(signal, Signal::Back));
        assert_eq!(runs.borrow()[0].1, harness.fixture.root());

        let mut fixture = TestServices::new();
        fixture.launcher = FakeLauncher::unspawnable();
        let mut harness = Harness::with(fixture);
        let signal = draw_signal(&mut harness, &mut ShellLaunch);
        assert!(matches!(signal, Signal::ErrorBack));
        assert!(harness.status.get().starts_with("failed to start"));
    }
}
