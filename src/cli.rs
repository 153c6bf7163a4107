use crate::core::stats::{MAX_DAYS, SortOrder};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chanscope")]
#[command(about = "Find breakout videos and rank channel growth, with AI summaries of what viewers say")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reload API and access keys from the key sheet and show the pools
    Keys,

    /// Unlock the tool with an access key
    Login {
        /// Access key issued by the administrator
        key: String,
    },

    /// Forget stored keys, login and results
    Logout,

    /// Find each channel's outlier videos and summarize their comments
    Analyze {
        /// Channel URLs, @handles, channel IDs or names. Pass each as its own
        /// argument or comma separated; names may contain spaces
        #[arg(required = true)]
        channels: Vec<String>,

        /// Look back this many days
        #[arg(short, long, env = "CHANSCOPE_DAYS", value_parser = days_parser())]
        days: Option<u32>,

        /// Ordering of the result table
        #[arg(short, long, value_enum, default_value_t = SortOrder::Ratio)]
        sort: SortOrder,

        /// Hide videos below this many views
        #[arg(long)]
        min_views: Option<u64>,
    },

    /// Rank channels by growth of average views between two periods
    Growth {
        #[arg(required = true)]
        channels: Vec<String>,

        /// Length of each period in days
        #[arg(short, long, value_parser = days_parser())]
        days: Option<u32>,
    },

    /// Fetch details and all comments of each video and ask AI for audience insight
    Videos {
        /// Video URLs or IDs
        urls: Vec<String>,

        /// Read URLs from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Write a plaintext report per completed video into this directory
        #[arg(short, long)]
        report_dir: Option<PathBuf>,
    },

    /// Summarize a video's transcript and attach it to the last analysis
    Summarize {
        /// YouTube video URL or video ID
        video: String,

        /// Use this transcript file instead of downloading captions
        #[arg(short, long)]
        transcript: Option<PathBuf>,
    },

    /// Export the last results
    Export {
        #[arg(value_enum)]
        kind: ExportKind,

        /// Output file (CSV) or directory (reports)
        output: PathBuf,
    },

    /// Open TUI interface
    Tui,
}

fn days_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_DAYS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// Outlier videos as CSV
    Videos,
    /// Channel growth ranking as CSV
    Growth,
    /// One plaintext report per completed video of the last video-list run
    Reports,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::parse_identifier_list;

    #[test]
    fn analyze_takes_many_channels() {
        let cli = Cli::try_parse_from([
            "chanscope", "analyze", "@a", "@b", "--days", "7", "--sort", "views",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Analyze {
                channels,
                days,
                sort,
                min_views,
            }) => {
                assert_eq!(channels, vec!["@a", "@b"]);
                assert_eq!(days, Some(7));
                assert_eq!(sort, SortOrder::Views);
                assert_eq!(min_views, None);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn days_outside_the_supported_range_are_rejected() {
        for days in ["0", "3651", "200000000"] {
            assert!(Cli::try_parse_from(["chanscope", "analyze", "@a", "--days", days]).is_err());
            assert!(Cli::try_parse_from(["chanscope", "growth", "@a", "--days", days]).is_err());
        }
        assert!(Cli::try_parse_from(["chanscope", "growth", "@a", "--days", "3650"]).is_ok());
    }

    #[test]
    fn channel_names_with_spaces_stay_whole() {
        let cli = Cli::try_parse_from(["chanscope", "growth", "Linus Tech Tips", "@mkbhd"]).unwrap();
        let Some(Commands::Growth { channels, .. }) = cli.command else {
            panic!("expected growth");
        };
        let identifiers = parse_identifier_list(&channels.join("\n")).unwrap();
        assert_eq!(identifiers, vec!["Linus Tech Tips", "@mkbhd"]);
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["chanscope"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn export_kind_is_required() {
        assert!(Cli::try_parse_from(["chanscope", "export", "out.csv"]).is_err());
        assert!(Cli::try_parse_from(["chanscope", "export", "growth", "out.csv"]).is_ok());
    }
}
