use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use hymnbook::auth::StoredAuth;
use hymnbook::config::AppConfig;
use hymnbook::notice::{Notice, NoticeQueue};
use hymnbook::settings::SettingsController;
use hymnbook::store::{JsonFileStore, SharedStore};
use hymnbook::theme::{
    DeviceClass, ResolvedTheme, ThemeResolver, ANIMATION_PROFILES, COLOR_SETS, VARIANTS,
};
use hymnbook::trial::{load_or_create_device_id, TrialManager};
use hymnbook::usage::{UsageLimits, UsageTracker};

#[derive(Parser, Debug)]
#[command(
    name = "hymnbook",
    about = "Theme, usage and trial tooling for the hymnbook app",
    version
)]
struct Cli {
    /// Verbose logging (hymnbook=debug)
    #[arg(long, global = true)]
    debug: bool,

    /// Directory holding usage, trial and account documents
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a theme and print it. Flags override saved preferences
    Theme {
        #[command(flatten)]
        prefs: ThemeFlags,

        /// Print the full resolved theme as JSON
        #[arg(long)]
        json: bool,

        /// List the available palettes, variants and animation profiles
        #[arg(long)]
        list: bool,
    },
    /// AI usage counters and limits
    #[command(subcommand)]
    Usage(UsageCommand),
    /// Weekly premium trial
    #[command(subcommand)]
    Trial(TrialCommand),
    /// Premium, trial and version status
    Settings {
        #[arg(long)]
        json: bool,
    },
    /// Saved preferences
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Default)]
struct ThemeFlags {
    #[arg(long, conflicts_with = "light")]
    dark: bool,

    #[arg(long)]
    light: bool,

    /// Palette name, e.g. Blue, Teal
    #[arg(long)]
    color: Option<String>,

    /// standard, vibrant, muted, highContrast or pastel
    #[arg(long)]
    variant: Option<String>,

    /// default, smooth, snappy or reduced
    #[arg(long)]
    animation: Option<String>,

    #[arg(long)]
    font: Option<String>,

    /// mobile, tablet, desktop or large-desktop
    #[arg(long, conflicts_with = "width")]
    device: Option<DeviceClass>,

    /// Logical screen width, classified into a device class
    #[arg(long)]
    width: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum UsageCommand {
    /// Count one AI call against today's totals
    Record {
        provider: String,
        #[arg(long, default_value_t = 0)]
        tokens: u64,
        /// Estimated cost in USD
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        /// Record even if a limit has been reached
        #[arg(long)]
        force: bool,
    },
    /// Today's totals
    Today {
        #[arg(long)]
        json: bool,
    },
    /// Limit flags for the current usage
    Limits {
        #[arg(long)]
        json: bool,
    },
    /// Change limits (0 disables a check)
    SetLimits {
        #[arg(long)]
        daily_requests: Option<u64>,
        #[arg(long)]
        hourly_requests: Option<u64>,
        #[arg(long)]
        daily_tokens: Option<u64>,
        /// USD per calendar month
        #[arg(long)]
        monthly_cost: Option<f64>,
        /// Fraction of a limit that counts as "near"
        #[arg(long)]
        near_ratio: Option<f64>,
    },
    /// Per-day totals, newest first
    History {
        #[arg(long, default_value_t = 7)]
        days: u32,
        #[arg(long)]
        json: bool,
    },
    /// Clear one day's counters (defaults to today, UTC)
    Reset { date: Option<NaiveDate> },
}

#[derive(Subcommand, Debug)]
enum TrialCommand {
    Status {
        #[arg(long)]
        json: bool,
    },
    Start,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the config file location and contents
    Show,
    /// Save theme preferences
    SetTheme {
        #[command(flatten)]
        prefs: ThemeFlags,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = AppConfig::load();
    setup_logging(cli.debug, config.log_filter.as_deref());

    let mut notices = NoticeQueue::new();
    let action = command_name(&cli.command);
    let result = run(cli, config, &mut notices);
    let failed = finish(action, result, &mut notices);

    for notice in notices.drain() {
        eprintln!("  [{}] {}", notice.kind.label(), notice.message);
    }
    if failed {
        std::process::exit(1);
    }
}

/// Turn a failed command into a notice. Only the command's own result
/// decides the exit status; warnings queued along the way do not.
fn finish(action: &str, result: Result<()>, notices: &mut NoticeQueue) -> bool {
    match result {
        Ok(()) => false,
        Err(err) => {
            notices.push(Notice::from_error(action, &err));
            true
        }
    }
}

fn setup_logging(debug: bool, configured: Option<&str>) {
    let filter = if debug {
        EnvFilter::new("hymnbook=debug")
    } else if let Some(directive) = configured {
        EnvFilter::new(directive)
    } else {
        EnvFilter::new("hymnbook=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Theme { .. } => "Theme",
        Command::Usage(_) => "Usage",
        Command::Trial(_) => "Trial",
        Command::Settings { .. } => "Settings",
        Command::Config(_) => "Config",
    }
}

fn open_store(cli_data_dir: Option<&std::path::Path>, config: &AppConfig) -> SharedStore {
    let dir = config.data_dir(cli_data_dir);
    tracing::debug!(data_dir = %dir.display(), "opening document store");
    Arc::new(JsonFileStore::new(dir))
}

fn trial_manager(store: &SharedStore) -> Result<TrialManager> {
    let device_id = load_or_create_device_id(store.as_ref())?;
    Ok(TrialManager::new(store.clone(), device_id))
}

/// Trial manager for read-only views. An unreadable device identity only
/// costs the trial status, so it is logged and skipped.
fn trial_manager_for_status(store: &SharedStore) -> Option<TrialManager> {
    match trial_manager(store) {
        Ok(trial) => Some(trial),
        Err(err) => {
            let reason = format!("{:#}", err);
            tracing::warn!(error = %reason, "device identity unavailable, trial status skipped");
            None
        }
    }
}

fn run(cli: Cli, mut config: AppConfig, notices: &mut NoticeQueue) -> Result<()> {
    match cli.command {
        Command::Theme { prefs, json, list } => {
            if list {
                print_catalog();
                return Ok(());
            }
            apply_theme_flags(&mut config, &prefs);
            let mut resolver = ThemeResolver::with_capacity(config.theme_cache_capacity);
            let theme = resolver.resolve(&config.theme_request());
            if json {
                println!("{}", serde_json::to_string_pretty(theme.as_ref())?);
            } else {
                print_theme(&theme);
            }
        }
        Command::Usage(command) => {
            let store = open_store(cli.data_dir.as_deref(), &config);
            run_usage(UsageTracker::new(store), command, notices)?;
        }
        Command::Trial(command) => {
            let store = open_store(cli.data_dir.as_deref(), &config);
            match command {
                TrialCommand::Status { json } => {
                    let trial = trial_manager_for_status(&store);
                    let info = trial
                        .as_ref()
                        .map(TrialManager::get_trial_info)
                        .unwrap_or_default();
                    if json {
                        println!("{}", serde_json::to_string_pretty(&info)?);
                    } else {
                        println!("  {}", info.display());
                        if !info.has_active_trial && trial.as_ref().is_some_and(|t| t.is_trial_eligible()) {
                            println!("  Run `hymnbook trial start` to try premium for 7 days.");
                        }
                    }
                }
                TrialCommand::Start => match trial_manager(&store)?.start_weekly_trial()? {
                    Some(session) => notices.push(Notice::success(format!(
                        "Trial started, ends {}",
                        session.expires_at.format("%Y-%m-%d %H:%M UTC")
                    ))),
                    None => notices.push(Notice::info(
                        "This device has already used its weekly trial",
                    )),
                },
            }
        }
        Command::Settings { json } => {
            let store = open_store(cli.data_dir.as_deref(), &config);
            let trial = trial_manager_for_status(&store);
            let auth = Arc::new(StoredAuth::new(store.clone()));
            let settings = SettingsController::load(store, auth, trial);
            if json {
                let snapshot = serde_json::json!({
                    "user": settings.current_user().map(|u| u.uid),
                    "isPremium": settings.is_premium(),
                    "hasPremiumAccess": settings.has_premium_access(),
                    "trial": settings.trial_info(),
                    "version": settings.version_info(),
                });
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_settings(&settings);
            }
        }
        Command::Config(ConfigCommand::Show) => {
            println!("  {}", AppConfig::config_location());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Config(ConfigCommand::SetTheme { prefs }) => {
            apply_theme_flags(&mut config, &prefs);
            warn_unknown_theme_keys(&config, notices);
            config.save().map_err(anyhow::Error::msg)?;
            notices.push(Notice::success("Theme preferences saved"));
        }
    }
    Ok(())
}

fn run_usage(tracker: UsageTracker, command: UsageCommand, notices: &mut NoticeQueue) -> Result<()> {
    match command {
        UsageCommand::Record {
            provider,
            tokens,
            cost,
            force,
        } => {
            if !force {
                tracker.allow_request()?;
            }
            let day = tracker.record_call(&provider, tokens, cost)?;
            println!("  {}", day.display());
            if let Some(warning) = Notice::for_limits(&tracker.check_usage_limits()) {
                notices.push(warning);
            }
        }
        UsageCommand::Today { json } => {
            let day = tracker.today_usage();
            if json {
                println!("{}", serde_json::to_string_pretty(&day)?);
            } else {
                println!("  {}", day.display());
            }
        }
        UsageCommand::Limits { json } => {
            let limits = tracker.limits();
            let flags = tracker.check_usage_limits();
            if json {
                let out = serde_json::json!({ "limits": limits, "flags": flags.as_map() });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "  daily requests {} · hourly requests {} · daily tokens {} · monthly ${:.2} · near at {:.0}%",
                    limits.daily_request_limit,
                    limits.hourly_request_limit,
                    limits.daily_token_limit,
                    limits.monthly_cost_limit,
                    limits.near_limit_ratio * 100.0
                );
                for (name, set) in flags.as_map() {
                    println!("  {:<26} {}", name, if set { "yes" } else { "no" });
                }
            }
        }
        UsageCommand::SetLimits {
            daily_requests,
            hourly_requests,
            daily_tokens,
            monthly_cost,
            near_ratio,
        } => {
            let current = tracker.limits();
            let limits = UsageLimits {
                daily_request_limit: daily_requests.unwrap_or(current.daily_request_limit),
                hourly_request_limit: hourly_requests.unwrap_or(current.hourly_request_limit),
                daily_token_limit: daily_tokens.unwrap_or(current.daily_token_limit),
                monthly_cost_limit: monthly_cost.unwrap_or(current.monthly_cost_limit),
                near_limit_ratio: near_ratio.unwrap_or(current.near_limit_ratio),
            };
            tracker.update_limits(&limits)?;
            notices.push(Notice::success("Usage limits updated"));
        }
        UsageCommand::History { days, json } => {
            let history = tracker.usage_history(days);
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                for day in history {
                    println!("  {}", day.display());
                }
            }
        }
        UsageCommand::Reset { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            tracker
                .reset_day(date)
                .with_context(|| format!("Could not reset usage for {}", date))?;
            notices.push(Notice::success(format!("Usage for {} cleared", date)));
        }
    }
    Ok(())
}

fn apply_theme_flags(config: &mut AppConfig, flags: &ThemeFlags) {
    let prefs = &mut config.theme;
    if flags.dark {
        prefs.dark_mode = true;
    } else if flags.light {
        prefs.dark_mode = false;
    }
    if let Some(color) = &flags.color {
        prefs.color_key = color.clone();
    }
    if let Some(variant) = &flags.variant {
        prefs.variant = variant.clone();
    }
    if let Some(animation) = &flags.animation {
        prefs.animation_profile = animation.clone();
    }
    if let Some(font) = &flags.font {
        prefs.font_family = Some(font.clone());
    }
    if let Some(device) = flags.device {
        prefs.device_class = device;
    } else if let Some(width) = flags.width {
        prefs.device_class = DeviceClass::from_width(width);
    }
}

fn warn_unknown_theme_keys(config: &AppConfig, notices: &mut NoticeQueue) {
    let resolved = hymnbook::theme::resolve_theme(&config.theme_request());
    if !resolved.color_key.eq_ignore_ascii_case(config.theme.color_key.trim()) {
        notices.push(Notice::info(format!(
            "Unknown palette '{}', {} will be used",
            config.theme.color_key, resolved.color_key
        )));
    }
    if !resolved.variant.eq_ignore_ascii_case(config.theme.variant.trim()) {
        notices.push(Notice::info(format!(
            "Unknown variant '{}', {} will be used",
            config.theme.variant, resolved.variant
        )));
    }
    if !resolved
        .animation
        .profile
        .eq_ignore_ascii_case(config.theme.animation_profile.trim())
    {
        notices.push(Notice::info(format!(
            "Unknown animation profile '{}', {} will be used",
            config.theme.animation_profile, resolved.animation.profile
        )));
    }
}

fn print_catalog() {
    println!("  Palettes:");
    for set in COLOR_SETS {
        println!(
            "    {:<8} {} {} {}  {}",
            set.name,
            set.primary,
            set.secondary,
            set.accent,
            set.personality.label()
        );
    }
    println!("  Variants:");
    for variant in VARIANTS {
        println!(
            "    {:<13} contrast x{:.2}  saturation x{:.2}",
            variant.name, variant.contrast_multiplier, variant.saturation_multiplier
        );
    }
    println!("  Animation profiles:");
    for profile in ANIMATION_PROFILES {
        println!(
            "    {:<8} {}/{}/{} ms  {}",
            profile.name, profile.short_ms, profile.medium_ms, profile.long_ms, profile.curve
        );
    }
}

fn print_theme(theme: &ResolvedTheme) {
    let colors = &theme.colors;
    println!(
        "  {} · {} · {:?} · {}",
        theme.color_key,
        theme.variant,
        theme.brightness,
        theme.device_class
    );
    println!("  personality  {}", theme.personality.label());
    println!("  primary      {}", colors.primary.to_hex());
    println!("  secondary    {}", colors.secondary.to_hex());
    println!("  accent       {}", colors.accent.to_hex());
    println!("  background   {}", colors.background.to_hex());
    println!("  surface      {}", colors.surface.to_hex());
    println!(
        "  font         {} (x{:.2})",
        theme.typography.font_family, theme.typography.scale
    );
    println!(
        "  button       {:.0}px high, radius {:.0}",
        theme.components.button.height, theme.components.button.border_radius
    );
    println!("  icons        {:.0}px", theme.components.icon.size);
    println!(
        "  animation    {} ({}/{}/{} ms, {})",
        theme.animation.profile,
        theme.animation.short_ms,
        theme.animation.medium_ms,
        theme.animation.long_ms,
        theme.animation.curve
    );
}

fn print_settings(settings: &SettingsController) {
    match settings.current_user() {
        Some(user) => println!("  Signed in as {} ({})", user.greeting_name(), user.uid),
        None => println!("  Not signed in"),
    }
    println!(
        "  Premium      {}",
        if settings.is_premium() { "yes" } else { "no" }
    );
    println!("  Trial        {}", settings.trial_info().display());
    println!(
        "  Access       {}",
        if settings.has_premium_access() {
            "premium features unlocked"
        } else {
            "free tier"
        }
    );

    let version = settings.version_info();
    print!("  Version      {}", version.current);
    if version.update_required {
        println!(
            " (update required, minimum {})",
            version.minimum_supported.as_deref().unwrap_or("?")
        );
    } else if version.update_available {
        println!(
            " (update available: {})",
            version.latest.as_deref().unwrap_or("?")
        );
    } else {
        println!();
    }
}
