use console_core::config::ConsoleConfig;

/// Settings baked in at `trunk build` time.
pub fn load() -> ConsoleConfig {
    ConsoleConfig::default().with_overrides(
        option_env!("CONSOLE_API_BASE"),
        option_env!("CONSOLE_TOAST_MS"),
        option_env!("CONSOLE_PAGE_SIZE"),
        option_env!("CONSOLE_COMMIT_CAP"),
    )
}
