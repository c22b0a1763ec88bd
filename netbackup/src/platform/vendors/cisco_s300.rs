//! Cisco Small Business (SG300 family) platform definition.
//!
//! Logins usually land directly in privileged exec. Paging is turned off
//! with `terminal datadump`, not `terminal length 0`.

use crate::platform::{PlatformDefinition, PrivilegeLevel};

pub const NAME: &str = "cisco_s300";

/// Create the Cisco SG300 platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"(?:^|\n)[\w.\-@/:]{1,63}>[ \t]*$").unwrap();

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?:^|\n)[\w.\-@/:]{1,63}#[ \t]*$")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"[Pp]assword:[ \t]*$")
        .unwrap()
        .with_not_contains("(config");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?:^|\n)[\w.\-@/:]{1,63}\(config[\w.\-@/:+]{0,32}\)#[ \t]*$",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    PlatformDefinition::new(NAME)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Unrecognized command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_on_open_command("terminal datadump")
        .with_on_open_command("terminal width 0")
}
