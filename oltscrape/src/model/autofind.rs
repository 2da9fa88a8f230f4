//! Unprovisioned units reported by the autofind table.

use std::fmt;

use secrecy::SecretString;
use serde::Serialize;

/// PON technology of a discovered unit, from its NNI type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PonType {
    #[default]
    #[serde(rename = "GPON")]
    Gpon,
    #[serde(rename = "XG-PON")]
    XgPon,
    #[serde(rename = "EPON")]
    Epon,
}

impl PonType {
    /// Classify an NNI type string such as `2.5G/1.25G`.
    pub fn from_nni(nni: &str) -> Self {
        if nni.contains("2.5G/1.25G") {
            PonType::Gpon
        } else if nni.contains("10G") {
            PonType::XgPon
        } else {
            PonType::Epon
        }
    }

    /// Name as shown in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            PonType::Gpon => "GPON",
            PonType::XgPon => "XG-PON",
            PonType::Epon => "EPON",
        }
    }
}

impl fmt::Display for PonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit the OLT has seen on a port but that is not provisioned.
///
/// Query scoped; the password never leaves the process through `Debug`
/// or serialization.
#[derive(Debug, Serialize)]
pub struct AutofindCandidate {
    /// Sequence number in the autofind table.
    pub number: String,
    /// `frame/board/port` as printed.
    pub fsp: String,
    /// Frame part of the location.
    pub frame: String,
    /// Board part of the location.
    pub board: String,
    /// Port part of the location.
    pub port: String,
    /// `Ont NNI type` as printed.
    pub nni_type: Option<String>,
    /// PON flavour derived from the NNI type.
    pub pon_type: PonType,
    /// Serial number in hex form (`4750544600D35288`).
    pub serial_hex: String,
    /// Serial number in vendor form (`GPTF-00D35288`).
    pub serial: String,
    /// Vendor code (`HWTC`, `GPTF`).
    pub vendor_id: String,
    /// Hardware version.
    pub ont_version: Option<String>,
    /// Software version.
    pub software_version: Option<String>,
    /// Equipment id as printed.
    pub equipment_id: Option<String>,
    /// Equipment id, or "Unknown".
    pub equipment_type: String,
    /// When the OLT first saw the unit.
    pub autofind_time: Option<String>,
    /// Registration password; never serialized.
    #[serde(skip)]
    pub password: Option<SecretString>,
    /// Logical id, when the unit sent one.
    pub loid: Option<String>,
}

impl AutofindCandidate {
    /// Whether the unit reported a registration password.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}
