mod commands;

pub use commands::{parse_command, StudioCommand};

use crate::assets::{ConfigError, StudioConfig};
use crate::render::{ImageTextureLoader, OrbitCamera, TextureLoader};
use crate::session::EditorSession;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Upper bound on camera ticks run for one console command.
const MAX_SETTLE_TICKS: usize = 2000;

enum CommandOutcome {
    None,
    Message(String),
    Quit,
}

pub struct App {
    session: EditorSession,
    config: StudioConfig,
}

impl App {
    pub fn new(config: StudioConfig, loader: Arc<dyn TextureLoader>) -> Self {
        let session = EditorSession::new(&config, loader);
        Self { session, config }
    }

    /// Reads the studio config and runs the boot sequence.
    pub fn boot(config_path: &Path, model_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = StudioConfig::load(config_path)?;
        if let Some(model) = model_override {
            config.model = model;
        }
        let mut app = Self::new(config, Arc::new(ImageTextureLoader));
        app.start();
        Ok(app)
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Camera, then materials, then environment, then the model. Each step
    /// falls back on its own; a failure never stops the sequence.
    pub fn start(&mut self) {
        if !self.session.load_camera() {
            log::info!("Using default camera");
        }
        self.session.load_catalog();
        log::info!(
            "Environment intensity {:.2}",
            self.config.env_intensity()
        );
        let model = self.config.model.clone();
        if let Err(err) = self.session.load_model(&model) {
            log::warn!("Model not loaded: {}", err);
        }
        self.session.refresh_textures();
    }

    /// Parses and runs one console line. Returns false once the user quits.
    pub fn execute_line(&mut self, line: &str) -> bool {
        match parse_command(line) {
            Ok(Some(command)) => match self.execute(command) {
                CommandOutcome::None => true,
                CommandOutcome::Message(message) => {
                    println!("{}", message);
                    true
                }
                CommandOutcome::Quit => false,
            },
            Ok(None) => true,
            Err(err) => {
                println!("{}", err);
                true
            }
        }
    }

    fn execute(&mut self, command: StudioCommand) -> CommandOutcome {
        let session = &mut self.session;
        match command {
            StudioCommand::Help => CommandOutcome::Message(commands::HELP.to_string()),
            StudioCommand::Quit => CommandOutcome::Quit,
            StudioCommand::Objects => {
                let current = session.objects().current_key();
                let lines: Vec<String> = session
                    .objects()
                    .objects()
                    .iter()
                    .map(|object| {
                        let marker = if current == Some(object.key.as_str()) { "*" } else { " " };
                        let slots: Vec<String> = object
                            .slot_materials
                            .iter()
                            .map(|(slot, material)| format!("{}={}", slot, material))
                            .collect();
                        format!(
                            "{} {:<10} {:<12} mesh={} [{}]",
                            marker,
                            object.key,
                            object.display_name,
                            object.mesh_name,
                            slots.join(", ")
                        )
                    })
                    .collect();
                CommandOutcome::Message(lines.join("\n"))
            }
            StudioCommand::Switch { key } => {
                if session.switch_to(&key) {
                    CommandOutcome::None
                } else {
                    CommandOutcome::Message(format!("cannot switch to '{}'", key))
                }
            }
            StudioCommand::Slots => {
                let rows = session.slot_report();
                if rows.is_empty() {
                    return CommandOutcome::Message("no slots resolved".to_string());
                }
                let lines: Vec<String> = rows.iter().map(ToString::to_string).collect();
                CommandOutcome::Message(lines.join("\n"))
            }
            StudioCommand::Assign { key, slot, material } => {
                if !session.catalog().contains(&material) {
                    log::warn!("Material '{}' is not in the catalog", material);
                }
                if session.set_object_material_slot(&key, slot, &material) {
                    CommandOutcome::None
                } else {
                    CommandOutcome::Message(format!("unknown object '{}'", key))
                }
            }
            StudioCommand::Materials => {
                let names: Vec<&str> = session.catalog().names().collect();
                CommandOutcome::Message(names.join("\n"))
            }
            StudioCommand::Show { material } => match session.catalog().get(&material) {
                Some(definition) => match serde_json::to_string_pretty(definition) {
                    Ok(json) => CommandOutcome::Message(json),
                    Err(err) => CommandOutcome::Message(err.to_string()),
                },
                None => CommandOutcome::Message(format!("unknown material '{}'", material)),
            },
            StudioCommand::Set {
                material,
                field,
                value,
            } => {
                let mut result = Ok(());
                let found = session.edit_material(&material, |definition| {
                    result = field.apply(definition, &value);
                });
                match (found, result) {
                    (false, _) => CommandOutcome::Message(format!("unknown material '{}'", material)),
                    (true, Err(err)) => CommandOutcome::Message(err.to_string()),
                    (true, Ok(())) => CommandOutcome::None,
                }
            }
            StudioCommand::Map {
                material,
                kind,
                url,
            } => {
                if session.set_texture_map(&material, kind, url.as_deref()) {
                    CommandOutcome::None
                } else {
                    CommandOutcome::Message(format!("unknown material '{}'", material))
                }
            }
            StudioCommand::Textures => {
                let lines: Vec<String> = session
                    .refresh_textures()
                    .iter()
                    .map(|(label, value)| format!("{:<24} {}", label, value))
                    .collect();
                CommandOutcome::Message(lines.join("\n"))
            }
            StudioCommand::Rename { old, new } => {
                if session.rename_material(&old, &new) {
                    CommandOutcome::None
                } else {
                    CommandOutcome::Message(format!("cannot rename '{}' to '{}'", old, new))
                }
            }
            StudioCommand::Delete { material } => {
                if session.delete_material(&material) {
                    CommandOutcome::None
                } else {
                    CommandOutcome::Message(format!("unknown material '{}'", material))
                }
            }
            StudioCommand::Export => match session.export_catalog() {
                Ok(count) => CommandOutcome::Message(format!("exported {} material(s)", count)),
                Err(err) => {
                    log::warn!("Failed to export materials: {}", err);
                    CommandOutcome::Message(format!("export failed: {}", err))
                }
            },
            StudioCommand::LoadModel { path } => match session.load_model(&path) {
                Ok(()) => CommandOutcome::None,
                Err(err) => {
                    log::warn!("Failed to load model {}: {}", path.display(), err);
                    CommandOutcome::Message(err.to_string())
                }
            },
            StudioCommand::Camera => {
                match serde_json::to_string_pretty(&session.camera().current_config()) {
                    Ok(json) => CommandOutcome::Message(json),
                    Err(err) => CommandOutcome::Message(err.to_string()),
                }
            }
            StudioCommand::CameraSave => match session.export_camera() {
                Ok(()) => CommandOutcome::None,
                Err(err) => CommandOutcome::Message(format!("camera save failed: {}", err)),
            },
            StudioCommand::CameraLoad => {
                if session.load_camera() {
                    CommandOutcome::None
                } else {
                    CommandOutcome::Message("camera config unavailable".to_string())
                }
            }
            StudioCommand::Zoom { steps } => {
                let camera = session.camera_mut();
                for _ in 0..steps.unsigned_abs() {
                    camera.wheel(steps.signum() as f32);
                }
                settle(camera);
                CommandOutcome::Message(format!("distance {:.3}", camera.distance()))
            }
            StudioCommand::Orbit {
                yaw_deg,
                pitch_deg,
                hold,
            } => {
                let camera = session.camera_mut();
                camera.orbit(yaw_deg.to_radians(), pitch_deg.to_radians());
                if !hold {
                    camera.release();
                }
                settle(camera);
                let (yaw, pitch) = camera.yaw_pitch();
                CommandOutcome::Message(format!(
                    "yaw {:.1} pitch {:.1}",
                    yaw.to_degrees(),
                    pitch.to_degrees()
                ))
            }
        }
    }

    /// Interactive loop over stdin until `quit` or end of input.
    pub fn run_console(&mut self) {
        println!("material-studio: type 'help' for commands");
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            print!("> ");
            let _ = std::io::stdout().flush();
            let Some(line) = lines.next() else {
                break;
            };
            match line {
                Ok(line) => {
                    if !self.execute_line(&line) {
                        break;
                    }
                }
                Err(err) => {
                    log::warn!("Console input error: {}", err);
                    break;
                }
            }
        }
    }
}

/// Runs camera ticks until the camera rests, as frames would.
fn settle(camera: &mut OrbitCamera) {
    let mut ticks = 0;
    while camera.update() {
        ticks += 1;
        if ticks >= MAX_SETTLE_TICKS {
            log::warn!("Camera still moving after {} ticks", ticks);
            break;
        }
    }
}
