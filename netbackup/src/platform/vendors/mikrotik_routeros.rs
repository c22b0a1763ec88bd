//! MikroTik RouterOS platform definition.
//!
//! RouterOS has a single privilege level. Terminal options are passed as a
//! suffix on the login name (`admin+ct511w4098h`: no colours, no terminal
//! detection, 511 columns, 4098 rows), which keeps the console from
//! redrawing and paging the output of `export`.
//!
//! ```text
//! [admin@MikroTik] >
//! [admin@MikroTik] /interface>
//! [admin@MikroTik] <SAFE>
//! ```

use crate::platform::{PlatformDefinition, PrivilegeLevel};

pub const NAME: &str = "mikrotik_routeros";

/// Create the RouterOS platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new(
        "exec",
        r"(?:^|\n)\[[^\]\r\n]{1,128}\][^>\r\n]{0,64}>[ \t]*$",
    )
    .unwrap();

    PlatformDefinition::new(NAME)
        .with_privilege(exec)
        .with_default_privilege("exec")
        .with_failure_pattern("bad command name")
        .with_failure_pattern("syntax error")
        .with_failure_pattern("expected end of command")
        .with_failure_pattern("failure:")
        .with_on_close_command("/quit")
        .with_return_char("\r\n")
        .with_username_suffix("+ct511w4098h")
        .with_terminal_size(511, 4098)
}
