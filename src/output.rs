use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Status lines are suppressed when `REGTAGS_QUIET` is set; data still prints.
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("REGTAGS_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
