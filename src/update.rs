//! Firmware update over HTTP, backed by the `esp-ota` crate.
//!
//! Flow: `POST <update_path>` with Basic credentials and the raw image as
//! body → [`FirmwareUpdater::begin`] → N × [`FirmwareUpdater::write_chunk`]
//! → [`FirmwareUpdater::finalize`] → reboot.
//!
//! The upload runs on the HTTP server's task, not in the scheduling loop.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};

use crate::error::UpdateError;

/// Largest image accepted; matches the OTA partition size.
pub const MAX_FIRMWARE_SIZE: u32 = 4 * 1024 * 1024;

/// Upload form served on `GET <update_path>`.  The script posts the file
/// body as-is so the server never parses multipart.
pub const UPDATE_FORM_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Firmware update</title></head>
<body>
<h1>Firmware update</h1>
<input type="file" id="fw" accept=".bin">
<button onclick="up()">Upload</button>
<pre id="out"></pre>
<script>
function up(){
  var f=document.getElementById('fw').files[0];
  if(!f){return;}
  var x=new XMLHttpRequest();
  x.open('POST',location.pathname);
  x.onload=function(){document.getElementById('out').textContent=x.status+' '+x.responseText;};
  x.send(f);
}
</script>
</body></html>"#;

// ── State machine ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Receiving { expected_size: u32, bytes_written: u32 },
    ReadyToReboot,
    Failed,
}

/// Staged firmware writer.
///
/// On ESP-IDF targets the bytes go to the inactive OTA partition; on the
/// host they are only counted.
pub struct FirmwareUpdater {
    state: UpdateState,
    #[cfg(target_os = "espidf")]
    ota_update: Option<esp_ota::OtaUpdate>,
}

impl Default for FirmwareUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl FirmwareUpdater {
    pub fn new() -> Self {
        Self {
            state: UpdateState::Idle,
            #[cfg(target_os = "espidf")]
            ota_update: None,
        }
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Open the inactive partition for an image of `firmware_size` bytes.
    pub fn begin(&mut self, firmware_size: u32) -> Result<(), UpdateError> {
        if matches!(self.state, UpdateState::Receiving { .. }) {
            return Err(UpdateError::AlreadyInProgress);
        }
        if firmware_size == 0 || firmware_size > MAX_FIRMWARE_SIZE {
            return Err(UpdateError::InvalidSize);
        }

        #[cfg(target_os = "espidf")]
        {
            let update = esp_ota::OtaUpdate::begin().map_err(|e| {
                warn!("esp-ota begin failed: {:?}", e);
                UpdateError::BeginFailed
            })?;
            self.ota_update = Some(update);
        }

        self.state = UpdateState::Receiving {
            expected_size: firmware_size,
            bytes_written: 0,
        };
        info!("Update: receiving {} bytes", firmware_size);
        Ok(())
    }

    /// Append `data` at `offset`.  Returns the total written so far.
    pub fn write_chunk(&mut self, offset: u32, data: &[u8]) -> Result<u32, UpdateError> {
        let UpdateState::Receiving {
            expected_size,
            bytes_written,
        } = self.state
        else {
            return Err(UpdateError::NotReceiving);
        };

        if offset != bytes_written {
            return Err(UpdateError::NonSequential);
        }
        let len = u32::try_from(data.len()).map_err(|_| UpdateError::Overflow)?;
        let new_written = bytes_written
            .checked_add(len)
            .filter(|&n| n <= expected_size)
            .ok_or(UpdateError::Overflow)?;

        #[cfg(target_os = "espidf")]
        {
            let Some(update) = self.ota_update.as_mut() else {
                return Err(UpdateError::NotReceiving);
            };
            if let Err(e) = update.write(data) {
                warn!("esp-ota write failed: {:?}", e);
                self.abort();
                self.state = UpdateState::Failed;
                return Err(UpdateError::WriteFailed);
            }
        }

        self.state = UpdateState::Receiving {
            expected_size,
            bytes_written: new_written,
        };
        Ok(new_written)
    }

    /// Verify the image and make it the boot partition.
    pub fn finalize(&mut self) -> Result<(), UpdateError> {
        match self.state {
            UpdateState::Receiving {
                expected_size,
                bytes_written,
            } if bytes_written == expected_size => {}
            UpdateState::Receiving { .. } => return Err(UpdateError::IncompleteTransfer),
            _ => return Err(UpdateError::NotReceiving),
        }

        #[cfg(target_os = "espidf")]
        {
            let Some(update) = self.ota_update.take() else {
                self.state = UpdateState::Failed;
                return Err(UpdateError::NotReceiving);
            };
            let mut completed = update.finalize().map_err(|e| {
                warn!("esp-ota finalize failed: {:?}", e);
                self.state = UpdateState::Failed;
                UpdateError::VerifyFailed
            })?;
            completed.set_as_boot_partition().map_err(|e| {
                warn!("esp-ota set_as_boot_partition failed: {:?}", e);
                self.state = UpdateState::Failed;
                UpdateError::BootSetFailed
            })?;
        }

        self.state = UpdateState::ReadyToReboot;
        info!("Update: image verified, ready to reboot");
        Ok(())
    }

    /// Drop the partially written image and return to `Idle`.
    pub fn abort(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            // esp-ota aborts when the handle is dropped.
            self.ota_update.take();
        }
        self.state = UpdateState::Idle;
        warn!("Update: aborted");
    }
}

/// Restart into the new image.
#[cfg(target_os = "espidf")]
pub fn reboot() -> ! {
    info!("Update: rebooting into new firmware");
    esp_ota::restart();
}

/// Mark the running image valid so the bootloader does not roll back.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("Update: running image marked valid"),
        Err(e) => warn!("Update: mark_app_valid failed: {:?}", e),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn check_rollback() {
    info!("Update: rollback check skipped on host");
}

// ── Credentials ───────────────────────────────────────────────

fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check an `Authorization` header against the update credentials.
///
/// Only the `Basic` scheme is accepted.  An empty configured password
/// locks the route entirely.
pub fn authorize(header: Option<&str>, user: &str, password: &str) -> bool {
    if password.is_empty() {
        return false;
    }
    let Some(header) = header.map(str::trim) else {
        return false;
    };
    let Some((scheme, encoded)) = header.split_once(' ') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return false;
    }
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Some(colon) = decoded.iter().position(|&b| b == b':') else {
        return false;
    };
    let (given_user, given_pass) = (&decoded[..colon], &decoded[colon + 1..]);
    // Evaluate both so a wrong user costs the same as a wrong password.
    let user_ok = ct_eq(given_user, user.as_bytes());
    let pass_ok = ct_eq(given_pass, password.as_bytes());
    user_ok & pass_ok
}

// ── Tests ─────────────────────────────────────────────────────
