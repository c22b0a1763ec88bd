//! Ubiquiti EdgeSwitch platform definition.
//!
//! ```text
//! (UBNT EdgeSwitch) >            # exec
//! (UBNT EdgeSwitch) #            # privilege_exec
//! (UBNT EdgeSwitch) (Config)#    # configuration (and its sub-modes)
//! ```
//!
//! `enable` asks for the enable secret; the login password is used.

use crate::platform::{PlatformDefinition, PrivilegeLevel};

pub const NAME: &str = "ubiquiti_edgeswitch";

/// Create the EdgeSwitch platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"(?:^|\n)\([^)\r\n]{1,64}\)[ \t]*>[ \t]*$").unwrap();

    let privilege_exec =
        PrivilegeLevel::new("privilege_exec", r"(?:^|\n)\([^)\r\n]{1,64}\)[ \t]*#[ \t]*$")
            .unwrap()
            .with_parent("exec")
            .with_escalate("enable")
            .with_deescalate("disable")
            .with_auth(r"[Pp]assword:[ \t]*$")
            .unwrap()
            .with_not_contains("(Config");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?:^|\n)\([^)\r\n]{1,64}\)[ \t]*\([^)\r\n]{1,32}\)[ \t]*#[ \t]*$",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure")
    .with_deescalate("exit");

    PlatformDefinition::new(NAME)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("An invalid")
        .with_failure_pattern("Command not found")
        .with_on_open_command("terminal length 0")
}
