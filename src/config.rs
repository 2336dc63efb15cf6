use std::path::PathBuf;

use crate::world_records::{DEFAULT_WR_URL, WorldRecordSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampStyle {
    #[default]
    Utc,
    /// `<t:EPOCH:f>` markup for pasting into Discord.
    Discord,
}

impl TimestampStyle {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "utc" => Some(Self::Utc),
            "discord" => Some(Self::Discord),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Folder holding `TextAsset/`, `MonoBehaviour/` and the metadata folder.
    pub asset_dir: PathBuf,
    pub debug: bool,
    /// Show raw car ids in showdown listings instead of translated names.
    pub crdb: bool,
    pub timestamps: TimestampStyle,
    pub world_records: WorldRecordSource,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("."),
            debug: false,
            crdb: false,
            timestamps: TimestampStyle::default(),
            world_records: WorldRecordSource::Remote(DEFAULT_WR_URL.to_string()),
        }
    }
}

impl RunConfig {
    /// Defaults, then `APP_*` environment variables, then command-line flags.
    pub fn load(args: &[String]) -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_args(args);
        config
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("APP_ASSET_DIR").as_deref().and_then(non_empty) {
            self.asset_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("APP_WR_URL").as_deref().and_then(non_empty) {
            self.world_records = WorldRecordSource::Remote(url.to_string());
        }
        if let Some(path) = lookup("APP_WR_FILE").as_deref().and_then(non_empty) {
            self.world_records = WorldRecordSource::File(PathBuf::from(path));
        }
        if let Some(flag) = lookup("APP_DEBUG").as_deref().and_then(parse_flag) {
            self.debug = flag;
        }
        if let Some(flag) = lookup("APP_CRDB").as_deref().and_then(parse_flag) {
            self.crdb = flag;
        }
        if let Some(style) = lookup("APP_TIMESTAMPS")
            .as_deref()
            .and_then(TimestampStyle::parse)
        {
            self.timestamps = style;
        }
    }

    pub fn apply_args(&mut self, args: &[String]) {
        for arg in args {
            match arg.as_str() {
                "--debug" | "-debug" => self.debug = true,
                "--crdb" | "-crdb" => self.crdb = true,
                "--no-wr" => self.world_records = WorldRecordSource::Disabled,
                _ => {}
            }
        }
        if let Some(dir) = arg_value(args, "--dir") {
            self.asset_dir = PathBuf::from(dir);
        }
        if let Some(url) = arg_value(args, "--wr-url") {
            self.world_records = WorldRecordSource::Remote(url);
        }
        if let Some(path) = arg_value(args, "--wr-file") {
            self.world_records = WorldRecordSource::File(PathBuf::from(path));
        }
        if let Some(style) = arg_value(args, "--timestamps")
            .as_deref()
            .and_then(TimestampStyle::parse)
        {
            self.timestamps = style;
        }
    }
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix)
            && let Some(value) = non_empty(raw)
        {
            return Some(value.to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Some(value) = non_empty(next)
        {
            return Some(value.to_string());
        }
    }
    None
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
