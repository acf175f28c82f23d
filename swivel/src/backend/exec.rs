//! Control backend that shells out to `v4l2-ctl`.
//!
//! Useful where the binary is run without direct device permissions being
//! plumbed through, or for debugging against the same tool an operator
//! would use interactively. List-style argument passing only, no shell.

use std::process::Command;

use crate::backend::ControlBackend;
use crate::error::{Error, Result};

/// Backend implementation invoking the `v4l2-ctl` utility per operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecBackend;

impl ExecBackend {
    /// Run `v4l2-ctl` with the given arguments and return its stdout.
    fn run(&self, device: &str, args: &[&str]) -> Result<String> {
        let output = Command::new("v4l2-ctl").args(args).output().map_err(|e| {
            Error::Backend {
                device: device.to_string(),
                message: format!("failed to invoke v4l2-ctl: {e}"),
            }
        })?;

        if !output.status.success() {
            return Err(Error::Backend {
                device: device.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse the value out of `v4l2-ctl --get-ctrl` output.
///
/// The tool prints either `name: value` or `name=value` depending on
/// version.
fn parse_control_value(output: &str) -> Result<i64> {
    let line = output.trim();
    for separator in [':', '='] {
        if let Some((_, value)) = line.rsplit_once(separator) {
            return value
                .trim()
                .parse()
                .map_err(|_| Error::Parse(line.to_string()));
        }
    }
    Err(Error::Parse(line.to_string()))
}

impl ControlBackend for ExecBackend {
    fn set_control(&self, device: &str, control: &str, value: i64) -> Result<()> {
        self.run(device, &["-d", device, "-c", &format!("{control}={value}")])?;
        Ok(())
    }

    fn get_control(&self, device: &str, control: &str) -> Result<i64> {
        let output = self.run(device, &["-d", device, &format!("--get-ctrl={control}")])?;
        parse_control_value(&output)
    }

    fn list_controls(&self, device: &str) -> Result<String> {
        self.run(device, &["-d", device, "--list-ctrls"])
    }

    fn list_devices(&self) -> Result<String> {
        self.run("", &["--list-devices"])
    }
}
