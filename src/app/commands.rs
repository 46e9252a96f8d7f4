use crate::materials::{MapKind, MaterialDefinition};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid number '{0}'")]
    Number(String),
    #[error("unknown material field '{0}'")]
    Field(String),
    #[error("unknown map kind '{0}' (albedo, normal, roughness, metalness, alpha)")]
    MapKind(String),
}

/// Editable scalar or color field of a material definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialField {
    Color,
    Emissive,
    Roughness,
    Metalness,
    Alpha,
    BackfaceCulling,
    NormalIntensity,
    ScaleX,
    ScaleY,
    OffsetX,
    OffsetY,
    Rotation,
}

impl MaterialField {
    pub fn parse(value: &str) -> Option<Self> {
        let field = match value.to_ascii_lowercase().as_str() {
            "color" => Self::Color,
            "emissive" => Self::Emissive,
            "roughness" => Self::Roughness,
            "metalness" => Self::Metalness,
            "alpha" => Self::Alpha,
            "backface" | "backfaceculling" => Self::BackfaceCulling,
            "normal" | "normalintensity" => Self::NormalIntensity,
            "scalex" => Self::ScaleX,
            "scaley" => Self::ScaleY,
            "offsetx" => Self::OffsetX,
            "offsety" => Self::OffsetY,
            "rotation" => Self::Rotation,
            _ => return None,
        };
        Some(field)
    }

    /// Writes `value` into `definition`. Colors are stored verbatim; numeric
    /// fields must parse.
    pub fn apply(self, definition: &mut MaterialDefinition, value: &str) -> Result<(), CommandError> {
        let number = || {
            value
                .parse::<f32>()
                .map_err(|_| CommandError::Number(value.to_string()))
        };
        match self {
            Self::Color => definition.color = Some(value.to_string()),
            Self::Emissive => definition.emissive = Some(value.to_string()),
            Self::Roughness => definition.roughness = Some(number()?.clamp(0.0, 1.0)),
            Self::Metalness => definition.metalness = Some(number()?.clamp(0.0, 1.0)),
            Self::Alpha => definition.alpha = Some(number()?.clamp(0.0, 1.0)),
            Self::BackfaceCulling => {
                definition.backface_culling = Some(matches!(
                    value.to_ascii_lowercase().as_str(),
                    "true" | "on" | "1" | "yes"
                ))
            }
            Self::NormalIntensity => definition.normal_intensity = Some(number()?),
            Self::ScaleX | Self::ScaleY | Self::OffsetX | Self::OffsetY | Self::Rotation => {
                let mut transform = definition.texture_transform();
                let number = number()?;
                match self {
                    Self::ScaleX => transform.scale_x = number,
                    Self::ScaleY => transform.scale_y = number,
                    Self::OffsetX => transform.offset_x = number,
                    Self::OffsetY => transform.offset_y = number,
                    _ => transform.rotation = number,
                }
                definition.set_texture_transform(transform);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudioCommand {
    Help,
    Quit,
    Objects,
    Switch { key: String },
    Slots,
    Assign { key: String, slot: u32, material: String },
    Materials,
    Show { material: String },
    Set { material: String, field: MaterialField, value: String },
    Map { material: String, kind: MapKind, url: Option<String> },
    Textures,
    Rename { old: String, new: String },
    Delete { material: String },
    Export,
    LoadModel { path: PathBuf },
    Camera,
    CameraSave,
    CameraLoad,
    Zoom { steps: i32 },
    Orbit { yaw_deg: f32, pitch_deg: f32, hold: bool },
}

pub const HELP: &str = "\
objects                          list logical objects
switch <key>                     show one object
slots                            slot map report
assign <key> <slot> <material>   set an object's slot material
materials                        list catalog entries
show <material>                  print a definition
set <material> <field> <value>   edit a field (color, emissive, roughness, metalness,
                                 alpha, backface, normal, scalex, scaley, offsetx,
                                 offsety, rotation)
map <material> <kind> [url]      set or clear a texture map
textures                         refresh the texture list
rename <old> <new>               rename a material
delete <material>                remove a material
export                           write the catalog and reload it
load <path>                      load a .gltf/.glb model
camera [save|load]               show, save or reload the camera
zoom <in|out> [steps]            smooth wheel zoom
orbit <yaw_deg> <pitch_deg> [hold]
                                 orbit around the target; without 'hold' the
                                 pitch eases back to the horizon
quit";

fn number<T: std::str::FromStr>(value: &str) -> Result<T, CommandError> {
    value
        .parse()
        .map_err(|_| CommandError::Number(value.to_string()))
}

/// Parses one console line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<StudioCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        ["help"] | ["?"] => StudioCommand::Help,
        ["quit"] | ["exit"] => StudioCommand::Quit,
        ["objects"] => StudioCommand::Objects,
        ["switch", key] => StudioCommand::Switch {
            key: key.to_string(),
        },
        ["switch", ..] => return Err(CommandError::Usage("switch <key>")),
        ["slots"] => StudioCommand::Slots,
        ["assign", key, slot, material] => StudioCommand::Assign {
            key: key.to_string(),
            slot: number(slot)?,
            material: material.to_string(),
        },
        ["assign", ..] => return Err(CommandError::Usage("assign <key> <slot> <material>")),
        ["materials"] => StudioCommand::Materials,
        ["show", material] => StudioCommand::Show {
            material: material.to_string(),
        },
        ["show", ..] => return Err(CommandError::Usage("show <material>")),
        ["set", material, field, value @ ..] if !value.is_empty() => StudioCommand::Set {
            material: material.to_string(),
            field: MaterialField::parse(field)
                .ok_or_else(|| CommandError::Field(field.to_string()))?,
            value: value.join(" "),
        },
        ["set", ..] => return Err(CommandError::Usage("set <material> <field> <value>")),
        ["map", material, kind, rest @ ..] if rest.len() <= 1 => StudioCommand::Map {
            material: material.to_string(),
            kind: MapKind::parse(kind).ok_or_else(|| CommandError::MapKind(kind.to_string()))?,
            url: rest
                .first()
                .filter(|url| !url.eq_ignore_ascii_case("none"))
                .map(|url| url.to_string()),
        },
        ["map", ..] => return Err(CommandError::Usage("map <material> <kind> [url]")),
        ["textures"] => StudioCommand::Textures,
        ["rename", old, new] => StudioCommand::Rename {
            old: old.to_string(),
            new: new.to_string(),
        },
        ["rename", ..] => return Err(CommandError::Usage("rename <old> <new>")),
        ["delete", material] => StudioCommand::Delete {
            material: material.to_string(),
        },
        ["delete", ..] => return Err(CommandError::Usage("delete <material>")),
        ["export"] => StudioCommand::Export,
        ["load", path] => StudioCommand::LoadModel {
            path: PathBuf::from(path),
        },
        ["load", ..] => return Err(CommandError::Usage("load <path>")),
        ["camera"] => StudioCommand::Camera,
        ["camera", "save"] => StudioCommand::CameraSave,
        ["camera", "load"] => StudioCommand::CameraLoad,
        ["camera", ..] => return Err(CommandError::Usage("camera [save|load]")),
        ["zoom", direction, rest @ ..] if rest.len() <= 1 => {
            let steps: i32 = match rest.first() {
                Some(steps) => number(steps)?,
                None => 1,
            };
            match *direction {
                "in" => StudioCommand::Zoom { steps: -steps },
                "out" => StudioCommand::Zoom { steps },
                _ => return Err(CommandError::Usage("zoom <in|out> [steps]")),
            }
        }
        ["zoom", ..] => return Err(CommandError::Usage("zoom <in|out> [steps]")),
        ["orbit", yaw, pitch] => StudioCommand::Orbit {
            yaw_deg: number(yaw)?,
            pitch_deg: number(pitch)?,
            hold: false,
        },
        ["orbit", yaw, pitch, "hold"] => StudioCommand::Orbit {
            yaw_deg: number(yaw)?,
            pitch_deg: number(pitch)?,
            hold: true,
        },
        ["orbit", ..] => return Err(CommandError::Usage("orbit <yaw_deg> <pitch_deg> [hold]")),
        [other, ..] => return Err(CommandError::Unknown(other.to_string())),
        [] => return Ok(None),
    };
    Ok(Some(command))
}
