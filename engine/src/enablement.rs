use crate::context::{EnvContext, Platform};
use crate::options::OptionMap;

/// Decide whether a block is disabled. `None` means enabled; `Some` carries
/// the human-readable reason.
///
/// Total and pure: depends only on the options and the injected context,
/// never on filesystem or process state. Checked in order, first match wins;
/// a `when` value other than the known platform guards is unconstrained by
/// design, not an error.
pub fn evaluate(options: &OptionMap, ctx: &EnvContext) -> Option<String> {
    if options.disabled() {
        return Some("disabled=true".to_string());
    }
    match options.when() {
        Some("os.darwin") if ctx.platform != Platform::Darwin => {
            Some("when!=os.darwin".to_string())
        }
        Some("os.win32") if ctx.platform != Platform::Win32 => {
            Some("when!=os.win32".to_string())
        }
        _ => None,
    }
}
