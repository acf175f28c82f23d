//! CLI tool for velocity-driven PTZ cameras.
//!
//! Subcommands:
//! - `pan` / `tilt`: timed directional moves
//! - `move`: combined pan + tilt (+ optional zoom)
//! - `zoom` / `zoom-in` / `zoom-out`: absolute or stepped zoom
//! - `reset` / `stop`: re-home or halt the actuator
//! - `status`: show the estimated position and discovered limits
//! - `setup` / `devices` / `controls`: discovery and introspection
//! - `preset`: save/recall/list/delete named positions

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use swivel::{
    ControlBackend, ControllerOptions, ExecBackend, PtzController, UvcBackend, V4lFrameSource,
};

/// Velocity-PTZ camera control tool.
#[derive(Parser, Debug)]
#[command(name = "ptz_tool")]
#[command(about = "Control velocity-driven PTZ cameras")]
#[command(version)]
struct Args {
    /// V4L2 device path (defaults to the configured device)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Issue controls through v4l2-ctl instead of in-process ioctls
    #[arg(long, global = true)]
    exec: bool,

    /// Verify moves against the video feed and discover limits
    #[arg(long, global = true)]
    verify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PanDirection {
    Left,
    Right,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TiltDirection {
    Up,
    Down,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pan the camera for a timed hold
    Pan {
        direction: PanDirection,

        /// Hold duration in seconds (defaults to the configured duration)
        #[arg(short = 't', long)]
        duration: Option<f64>,
    },

    /// Tilt the camera for a timed hold
    Tilt {
        direction: TiltDirection,

        /// Hold duration in seconds (defaults to the configured duration)
        #[arg(short = 't', long)]
        duration: Option<f64>,
    },

    /// Combined pan + tilt move
    Move {
        /// Pan direction: -1 (left), 0, or 1 (right)
        #[arg(allow_hyphen_values = true)]
        pan: i32,

        /// Tilt direction: -1 (down), 0, or 1 (up)
        #[arg(allow_hyphen_values = true)]
        tilt: i32,

        /// Hold duration in seconds (defaults to the configured duration)
        #[arg(short = 't', long)]
        duration: Option<f64>,

        /// Absolute zoom target to apply alongside the move
        #[arg(long)]
        zoom: Option<i32>,
    },

    /// Set zoom to an absolute value (100-500)
    Zoom { value: i32 },

    /// Zoom in by the configured step
    ZoomIn,

    /// Zoom out by the configured step
    ZoomOut,

    /// Re-home the camera and reset the position estimate
    Reset,

    /// Zero both axis speeds
    Stop,

    /// Show the estimated position, limits, and hardware zoom
    Status,

    /// Detect a PTZ-capable camera and persist it to the config
    Setup,

    /// List video devices
    Devices,

    /// List the controls the active device exposes
    Controls,

    /// Manage named position presets
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },
}

#[derive(Subcommand, Debug)]
enum PresetAction {
    /// Save the current position under a name
    Save { name: String },

    /// Drive the camera to a saved position
    Recall { name: String },

    /// Delete a saved position
    Delete { name: String },

    /// List saved positions
    List,
}

fn describe_move(moved: bool) -> &'static str {
    if moved {
        "moved"
    } else {
        "no motion detected (mechanical limit recorded)"
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let backend: Arc<dyn ControlBackend> = if args.exec {
        Arc::new(ExecBackend)
    } else {
        Arc::new(UvcBackend::new())
    };

    let mut controller = PtzController::with_options(
        backend,
        ControllerOptions {
            device: args.device,
            ..ControllerOptions::default()
        },
    )?;

    if args.verify {
        let source = V4lFrameSource::open(&controller.device())?;
        controller.attach_video(Box::new(source));
    }

    let default_duration = controller.default_duration();
    let hold = |seconds: Option<f64>| {
        seconds.map_or(default_duration, Duration::from_secs_f64)
    };

    match args.command {
        Command::Pan {
            direction,
            duration,
        } => {
            let moved = match direction {
                PanDirection::Left => controller.pan_left(hold(duration))?,
                PanDirection::Right => controller.pan_right(hold(duration))?,
            };
            println!("pan {direction:?}: {}", describe_move(moved));
        }

        Command::Tilt {
            direction,
            duration,
        } => {
            let moved = match direction {
                TiltDirection::Up => controller.tilt_up(hold(duration))?,
                TiltDirection::Down => controller.tilt_down(hold(duration))?,
            };
            println!("tilt {direction:?}: {}", describe_move(moved));
        }

        Command::Move {
            pan,
            tilt,
            duration,
            zoom,
        } => {
            let (pan_moved, tilt_moved) = match zoom {
                Some(target) => {
                    controller.move_with_zoom(pan, tilt, target, hold(duration))?
                }
                None => controller.move_by(pan, tilt, hold(duration))?,
            };
            println!(
                "move pan={pan} tilt={tilt}: pan {}, tilt {}",
                describe_move(pan_moved),
                describe_move(tilt_moved)
            );
        }

        Command::Zoom { value } => {
            let applied = controller.zoom_to(value)?;
            println!("zoom set to {applied}");
        }

        Command::ZoomIn => {
            let applied = controller.zoom_in()?;
            println!("zoom set to {applied}");
        }

        Command::ZoomOut => {
            let applied = controller.zoom_out()?;
            println!("zoom set to {applied}");
        }

        Command::Reset => {
            controller.reset_position()?;
            println!("camera re-homed: {}", controller.position());
        }

        Command::Stop => {
            controller.stop()?;
            println!("stopped");
        }

        Command::Status => {
            println!("device: {}", controller.device());
            println!("position: {}", controller.position());
            match controller.get_zoom() {
                Ok(zoom) => println!("hardware zoom: {zoom}"),
                Err(e) => println!("hardware zoom: unavailable ({e})"),
            }
        }

        Command::Setup => match controller.find_camera()? {
            Some(device) => {
                println!("found PTZ camera at {device}");
                println!("PTZ support: {}", controller.has_ptz_support());
            }
            None => {
                println!("no PTZ-capable camera found");
                std::process::exit(1);
            }
        },

        Command::Devices => {
            print!("{}", controller.list_devices()?);
        }

        Command::Controls => {
            print!("{}", controller.list_controls()?);
        }

        Command::Preset { action } => match action {
            PresetAction::Save { name } => {
                controller.save_preset(&name)?;
                println!("saved preset: {name}");
            }
            PresetAction::Recall { name } => {
                if controller.recall_preset(&name)? {
                    println!("recalled preset: {name}");
                } else {
                    println!("preset not found: {name}");
                    std::process::exit(1);
                }
            }
            PresetAction::Delete { name } => {
                if controller.delete_preset(&name)? {
                    println!("deleted preset: {name}");
                } else {
                    println!("preset not found: {name}");
                    std::process::exit(1);
                }
            }
            PresetAction::List => {
                let names = controller.list_presets();
                if names.is_empty() {
                    println!("no presets saved");
                } else {
                    for name in names {
                        println!("{name}");
                    }
                }
            }
        },
    }

    Ok(())
}
