//! Fallback platform for shell kinds without a dedicated definition.
//!
//! One privilege level, any line ending in `>`, `#`, `$` or `%`. No paging
//! control: pair it with the timed read strategy unless the device prints
//! its whole configuration without a pager.

use crate::platform::{PlatformDefinition, PrivilegeLevel};

pub const NAME: &str = "generic";

pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"(?:^|\n)[^\r\n]{0,128}[>#$%][ \t]*$").unwrap();

    PlatformDefinition::new(NAME)
        .with_privilege(exec)
        .with_default_privilege("exec")
}
