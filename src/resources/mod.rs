//! Embedded resources and templates
//!
//! Shell text that ends up inside the installed system. It is treated as an
//! opaque asset: placeholders are substituted, nothing else is interpreted.

/// Post-install hook that pulls the LishaLinux user environment.
///
/// Placeholders: `@USER@`, `@REPO@`, `@SCRIPT@` (all substituted shell-quoted).
pub const COMPANION_HOOK: &str = r#"#!/bin/bash
# LishaLinux post-installation hook
set -e

echo ">>> Installing LishaLinux user environment"

home="$(getent passwd @USER@ | cut -d: -f6)"
cd "$home"
rm -rf lishalinux
runuser -u @USER@ -- git clone @REPO@ lishalinux

cd lishalinux
chmod +x @SCRIPT@
runuser -u @USER@ -- env HOME="$home" ./@SCRIPT@

echo ">>> LishaLinux user environment installed"
"#;

/// File name used when staging scripts inside the target root
pub const HOOK_FILE_NAME: &str = "lishalinux_post_install.sh";

/// Quote a value for safe interpolation into a POSIX shell script
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Fill in the companion hook template
pub fn render_companion_hook(user: &str, repo: &str, script: &str) -> String {
    COMPANION_HOOK
        .replace("@USER@", &shell_quote(user))
        .replace("@REPO@", &shell_quote(repo))
        .replace("@SCRIPT@", &shell_quote(script))
}
