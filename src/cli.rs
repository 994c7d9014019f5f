use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use yomu_meta::Holder;
use yomu_settings::{ReadingMode, SettingsDomain, TapZoneLayout};

#[derive(Parser, Debug)]
#[command(name = "yomu", version)]
#[command(about = "Inspect and edit manga reader settings, and find duplicate library entries")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "YOMU_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite metadata database, overriding the configuration
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Reader server base URL; metadata is then read from and written to the server
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Show what would be written without writing it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Raw metadata of one holder
    #[command(subcommand)]
    Meta(MetaCommand),
    /// Typed settings resolved from metadata
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Which action a tap at a point triggers
    TapZone(TapZoneArgs),
    /// How pages pair up in double-page mode
    Spreads(SpreadArgs),
    /// Find duplicate entries in a library export
    Duplicates(DuplicatesArgs),
}

#[derive(Subcommand, Debug)]
pub enum MetaCommand {
    /// Print every metadata entry of a holder
    Get {
        #[arg(value_parser = parse_holder)]
        holder: Holder,
    },
    /// Write one entry; the value is stored verbatim
    Set {
        #[arg(value_parser = parse_holder)]
        holder: Holder,
        key: String,
        value: String,
        /// Use the key as stored, without the application prefix
        #[arg(long)]
        raw: bool,
    },
    /// Delete one entry
    Delete {
        #[arg(value_parser = parse_holder)]
        holder: Holder,
        key: String,
        /// Use the key as stored, without the application prefix
        #[arg(long)]
        raw: bool,
    },
    /// List holders with metadata in the local database
    Holders,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Fully resolved reader settings of a manga
    Reader {
        #[arg(long)]
        manga: i64,
        /// Genre or tag of the manga, repeatable; used to detect webtoons
        #[arg(long = "genre")]
        genres: Vec<String>,
    },
    /// One settings domain of a holder (reader, download, chapter-list, library)
    Show {
        #[arg(value_parser = parse_domain)]
        domain: SettingsDomain,
        #[arg(value_parser = parse_holder, default_value = "global")]
        holder: Holder,
    },
    /// Set one setting; the value is parsed as JSON, falling back to a string
    Set {
        #[arg(value_parser = parse_holder)]
        holder: Holder,
        key: String,
        value: String,
    },
    /// Delete one setting so the next layer applies again
    Reset {
        #[arg(value_parser = parse_holder)]
        holder: Holder,
        key: String,
    },
    /// Set one reader setting of a reading-mode profile
    Profile {
        #[arg(value_parser = parse_reading_mode)]
        mode: ReadingMode,
        key: String,
        value: String,
    },
}

#[derive(Args, Debug)]
pub struct TapZoneArgs {
    #[arg(value_parser = parse_layout)]
    pub layout: TapZoneLayout,
    pub x: f64,
    pub y: f64,
    #[arg(long, default_value = "100")]
    pub width: f64,
    #[arg(long, default_value = "100")]
    pub height: f64,
    /// Right-to-left reading
    #[arg(long)]
    pub rtl: bool,
    /// Mirror the layout horizontally
    #[arg(long)]
    pub invert_h: bool,
    /// Mirror the layout vertically
    #[arg(long)]
    pub invert_v: bool,
}

#[derive(Args, Debug)]
pub struct SpreadArgs {
    /// Page sizes as WIDTHxHEIGHT, in reading order
    #[arg(required = true, value_parser = parse_page_size)]
    pub pages: Vec<(u32, u32)>,
    /// Show the first page on its own
    #[arg(long)]
    pub offset: bool,
    /// Right-to-left reading
    #[arg(long)]
    pub rtl: bool,
}

#[derive(Args, Debug)]
pub struct DuplicatesArgs {
    /// JSON array of `{ id, title, description?, alternativeTitles? }`
    pub library: PathBuf,
    /// Also compare alternative titles (slow)
    #[arg(long)]
    pub alternative_titles: bool,
    /// Entries per worker chunk, overriding the configuration
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

fn parse_holder(s: &str) -> Result<Holder, String> {
    s.parse().map_err(|e: yomu_meta::error::Error| e.to_string())
}

fn parse_domain(s: &str) -> Result<SettingsDomain, String> {
    s.parse().map_err(|e: yomu_settings::error::Error| e.to_string())
}

fn parse_reading_mode(s: &str) -> Result<ReadingMode, String> {
    s.parse().map_err(|e: yomu_settings::error::Error| e.to_string())
}

fn parse_layout(s: &str) -> Result<TapZoneLayout, String> {
    s.parse().map_err(|e: yomu_settings::error::Error| e.to_string())
}

fn parse_page_size(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s.split_once(['x', 'X']).ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |n: &str| n.trim().parse::<u32>().map_err(|e| format!("{n:?}: {e}"));
    Ok((parse(width)?, parse(height)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["yomu", "meta", "get", "manga:3", "--dry-run", "-v"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Meta(MetaCommand::Get { holder: Holder::Manga(3) })));
    }

    #[test]
    fn test_settings_reader_genres() {
        let cli =
            Cli::try_parse_from(["yomu", "settings", "reader", "--manga", "7", "--genre", "Action", "--genre", "Webtoon"])
                .unwrap();
        let Command::Settings(SettingsCommand::Reader { manga, genres }) = cli.command else {
            panic!("unexpected command");
        };
        assert_eq!(manga, 7);
        assert_eq!(genres, vec!["Action", "Webtoon"]);
    }

    #[test]
    fn test_show_defaults_to_global() {
        let cli = Cli::try_parse_from(["yomu", "settings", "show", "download"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Settings(SettingsCommand::Show { domain: SettingsDomain::Download, holder: Holder::Global })
        ));
    }

    #[rstest]
    #[case(&["yomu", "meta", "get", "book:1"])]
    #[case(&["yomu", "settings", "profile", "sideways", "pageGap", "0"])]
    #[case(&["yomu", "tap-zone", "zigzag", "1", "1"])]
    #[case(&["yomu", "spreads", "800by1200"])]
    fn test_rejects_bad_values(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case("800x1200", (800, 1200))]
    #[case("1600X1200", (1600, 1200))]
    fn test_parse_page_size(#[case] input: &str, #[case] expected: (u32, u32)) {
        assert_eq!(parse_page_size(input).unwrap(), expected);
    }
}
