//! eframe GUI: widgets over the core scanner, builder and runner.
//!
//! All build work happens on the runner's worker thread; results come back
//! over an mpsc channel drained once per frame in `update()`, so interface
//! state is only ever touched from the foreground thread.

use eframe::egui;
use pyfreeze_core::command::{self, BuildSelection, Flag};
use pyfreeze_core::imports;
use pyfreeze_core::runner::{BuildEvent, BuildOutcome, BuildRunner};
use std::path::PathBuf;
use std::sync::mpsc;

/// One detected (or carried-over) module with its hidden-import checkbox.
struct ModuleChoice {
    name: String,
    selected: bool,
}

/// Where the current/last build stands.
enum BuildPhase {
    Idle,
    Running,
    Finished(BuildOutcome),
}

/// Main application struct
pub struct FreezeApp {
    script_input: String,
    /// Checkbox state per recognized flag, in declaration order.
    flag_enabled: Vec<(Flag, bool)>,
    name_input: String,
    icon_input: String,
    add_data_input: String,
    dist_input: String,
    modules: Vec<ModuleChoice>,
    /// Message shown when the last scan failed.
    scan_notice: Option<String>,
    log: Vec<String>,
    phase: BuildPhase,
    runner: BuildRunner,
    /// Channel for receiving build events from the worker (Some while a
    /// build is in flight).
    build_rx: Option<mpsc::Receiver<BuildEvent>>,
}

impl FreezeApp {
    pub fn new() -> Self {
        FreezeApp {
            script_input: String::new(),
            flag_enabled: Flag::ALL.iter().map(|&f| (f, false)).collect(),
            name_input: String::new(),
            icon_input: String::new(),
            add_data_input: String::new(),
            dist_input: String::new(),
            modules: Vec::new(),
            scan_notice: None,
            log: Vec::new(),
            phase: BuildPhase::Idle,
            runner: BuildRunner::new(),
            build_rx: None,
        }
    }

    /// The current widget state as a core selection.
    fn selection(&self) -> BuildSelection {
        BuildSelection {
            script: PathBuf::from(self.script_input.trim()),
            flags: self
                .flag_enabled
                .iter()
                .filter_map(|&(flag, enabled)| enabled.then_some(flag))
                .collect(),
            name: Some(self.name_input.clone()),
            icon: (!self.icon_input.trim().is_empty())
                .then(|| PathBuf::from(self.icon_input.trim())),
            add_data: Some(self.add_data_input.clone()),
            dist_path: (!self.dist_input.trim().is_empty())
                .then(|| PathBuf::from(self.dist_input.trim())),
            hidden_imports: self
                .modules
                .iter()
                .filter(|m| m.selected)
                .map(|m| m.name.clone())
                .collect(),
        }
    }

    fn browse_script(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Python scripts", &["py", "pyw"])
            .pick_file()
        {
            self.script_input = path.display().to_string();
            self.rescan();
        }
    }

    fn browse_icon(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["ico", "png", "jpg", "jpeg", "bmp"])
            .pick_file()
        {
            self.icon_input = path.display().to_string();
        }
    }

    fn browse_dist(&mut self) {
        if let Some(path) = rfd::FileDialog::new().pick_folder() {
            self.dist_input = path.display().to_string();
        }
    }

    /// Rescan the selected script and rebuild the module checkbox list.
    ///
    /// A scan failure is reported and leaves the list empty rather than
    /// blocking anything else.
    fn rescan(&mut self) {
        self.modules.clear();
        self.scan_notice = None;

        let script = self.script_input.trim();
        if script.is_empty() {
            return;
        }

        match imports::scan_file(std::path::Path::new(script)) {
            Ok(names) => {
                self.modules = names
                    .into_iter()
                    .map(|name| ModuleChoice {
                        name,
                        selected: false,
                    })
                    .collect();
            }
            Err(e) => {
                self.scan_notice = Some(format!("Import scan failed: {}", e));
            }
        }
    }

    fn start_build(&mut self) {
        let prepared = match command::prepare(&self.selection()) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.log.push(format!("Cannot build: {}", e));
                return;
            }
        };

        for warning in &prepared.warnings {
            self.log.push(format!("Warning: {}", warning));
        }
        self.log.push(format!("$ {}", prepared.argv.join(" ")));

        let (tx, rx) = mpsc::channel();
        match self.runner.start(prepared.argv, tx) {
            Ok(()) => {
                self.build_rx = Some(rx);
                self.phase = BuildPhase::Running;
            }
            Err(e) => {
                self.log.push(format!("Cannot build: {}", e));
            }
        }
    }

    fn process_build_events(&mut self) {
        // Collect messages first to avoid borrow issues
        let events: Vec<_> = self
            .build_rx
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();

        for event in events {
            match event {
                BuildEvent::Output(line) => self.log.push(line),
                BuildEvent::Finished(outcome) => {
                    self.log.push(match &outcome {
                        BuildOutcome::Success => "Build completed successfully.".to_string(),
                        BuildOutcome::Failed { exit_code, .. } => match exit_code {
                            Some(code) => format!("Build failed (exit code {}).", code),
                            None => "Build terminated by signal.".to_string(),
                        },
                        BuildOutcome::LaunchFailed { message } => format!("Error: {}", message),
                    });
                    self.phase = BuildPhase::Finished(outcome);
                    self.build_rx = None;
                }
            }
        }
    }

    /// Render a scrollable log area with fixed height
    fn render_log(ui: &mut egui::Ui, log: &[String]) {
        let height = 160.0;
        egui::Frame::new()
            .fill(egui::Color32::from_gray(245))
            .corner_radius(4.0)
            .inner_margin(4.0)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(height)
                    .min_scrolled_height(height)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        ui.set_min_height(height);
                        for line in log {
                            ui.label(egui::RichText::new(line).monospace().small());
                        }
                    });
            });
    }

    fn render_script_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Python script:");
            ui.add(
                egui::TextEdit::singleline(&mut self.script_input)
                    .hint_text("/path/to/app.py")
                    .desired_width(320.0),
            );
            if ui.button("Browse...").clicked() {
                self.browse_script();
            }
            if ui.button("Scan").clicked() {
                self.rescan();
            }
        });
    }

    fn render_flags(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("Options").strong());
            for (flag, enabled) in &mut self.flag_enabled {
                ui.checkbox(enabled, format!("{} - {}", flag.token(), flag.describe()));
            }
        });
    }

    fn render_value_options(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("Value options").strong());

            ui.horizontal(|ui| {
                ui.label("--name");
                ui.add(
                    egui::TextEdit::singleline(&mut self.name_input)
                        .hint_text("executable name")
                        .desired_width(280.0),
                );
            });

            ui.horizontal(|ui| {
                ui.label("--icon");
                ui.add(
                    egui::TextEdit::singleline(&mut self.icon_input)
                        .hint_text("icon file (ico/png/jpg)")
                        .desired_width(280.0),
                );
                if ui.button("Browse...").clicked() {
                    self.browse_icon();
                }
            });

            ui.horizontal(|ui| {
                ui.label("--add-data");
                ui.add(
                    egui::TextEdit::singleline(&mut self.add_data_input)
                        .hint_text("data.txt;data")
                        .desired_width(280.0),
                );
            });

            ui.horizontal(|ui| {
                ui.label("--distpath");
                ui.add(
                    egui::TextEdit::singleline(&mut self.dist_input)
                        .hint_text("output directory (defaults to script's)")
                        .desired_width(280.0),
                );
                if ui.button("Browse...").clicked() {
                    self.browse_dist();
                }
            });
        });
    }

    fn render_modules(&mut self, ui: &mut egui::Ui) {
        ui.label("Hidden imports (check modules the tool won't detect on its own):");
        if let Some(notice) = &self.scan_notice {
            ui.label(egui::RichText::new(notice).color(egui::Color32::DARK_RED));
        }

        egui::ScrollArea::vertical()
            .id_salt("modules")
            .max_height(140.0)
            .show(ui, |ui| {
                for module in &mut self.modules {
                    ui.checkbox(&mut module.selected, &module.name);
                }
            });
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        match &self.phase {
            BuildPhase::Idle => {}
            BuildPhase::Running => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Build in progress...");
                });
            }
            BuildPhase::Finished(BuildOutcome::Success) => {
                ui.label(
                    egui::RichText::new("\u{2713} Build completed")
                        .color(egui::Color32::from_rgb(34, 197, 94)),
                );
            }
            BuildPhase::Finished(BuildOutcome::Failed { exit_code, .. }) => {
                let text = match exit_code {
                    Some(code) => format!("\u{2717} Build failed (exit code {})", code),
                    None => "\u{2717} Build terminated by signal".to_string(),
                };
                ui.label(egui::RichText::new(text).color(egui::Color32::from_rgb(239, 68, 68)));
            }
            BuildPhase::Finished(BuildOutcome::LaunchFailed { message }) => {
                ui.label(
                    egui::RichText::new(format!("\u{2717} {}", message))
                        .color(egui::Color32::from_rgb(239, 68, 68)),
                );
            }
        }
    }
}

impl Default for FreezeApp {
    fn default() -> Self {
        FreezeApp::new()
    }
}

impl eframe::App for FreezeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process any pending build events
        self.process_build_events();

        // Request repaint while a build streams output
        if matches!(self.phase, BuildPhase::Running) {
            ctx.request_repaint();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            ui.heading("PyFreeze Builder");
            ui.add_space(8.0);

            self.render_script_row(ui);
            ui.add_space(8.0);
            self.render_flags(ui);
            ui.add_space(8.0);
            self.render_value_options(ui);
            ui.add_space(8.0);
            self.render_modules(ui);
            ui.add_space(12.0);

            let running = self.runner.is_running();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!running, egui::Button::new("Build Executable"))
                    .clicked()
                {
                    self.start_build();
                }
                self.render_status(ui);
            });

            ui.add_space(8.0);
            Self::render_log(ui, &self.log);
        });
    }
}

/// Run the GUI application
pub fn run() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 760.0])
            .with_min_inner_size([520.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PyFreeze Builder",
        options,
        Box::new(|cc| {
            // Use light theme
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Ok(Box::new(FreezeApp::new()))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_reflects_widget_state() {
        let mut app = FreezeApp::new();
        app.script_input = " /tmp/app.py ".to_string();
        app.flag_enabled[0].1 = true; // --onefile
        app.name_input = "MyApp".to_string();
        app.modules = vec![
            ModuleChoice { name: "os".to_string(), selected: true },
            ModuleChoice { name: "requests".to_string(), selected: false },
            ModuleChoice { name: "zlib".to_string(), selected: true },
        ];

        let sel = app.selection();
        assert_eq!(sel.script, PathBuf::from("/tmp/app.py"));
        assert_eq!(sel.flags, vec![Flag::OneFile]);
        assert_eq!(sel.hidden_imports, vec!["os", "zlib"]);
        assert!(sel.icon.is_none());
        assert!(sel.dist_path.is_none());
    }

    #[test]
    fn blank_script_is_rejected_before_assembly() {
        let app = FreezeApp::new();
        assert!(command::prepare(&app.selection()).is_err());
    }
}
